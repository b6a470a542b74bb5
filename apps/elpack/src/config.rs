//! # Configuration
//!
//! Parser options for the CLI, layered:
//! 1. built-in defaults
//! 2. a TOML file (`--config path`)
//! 3. environment overrides (`ELPACK_MAX_FILE_SIZE`, `ELPACK_LANGUAGE`)

use elpack_core::{PackageError, ParserOptions};
use std::path::Path;

/// Environment variable overriding `max_file_size` (bytes).
pub const ENV_MAX_FILE_SIZE: &str = "ELPACK_MAX_FILE_SIZE";

/// Environment variable overriding `preferred_language`.
pub const ENV_LANGUAGE: &str = "ELPACK_LANGUAGE";

/// Load options from an optional TOML file, then apply process environment
/// overrides.
pub fn load(path: Option<&Path>) -> Result<ParserOptions, PackageError> {
    let options = match path {
        Some(path) => from_file(path)?,
        None => ParserOptions::default(),
    };
    apply_env_overrides(options, |key| std::env::var(key).ok())
}

/// Read options from a TOML file. Missing keys keep their defaults.
pub fn from_file(path: &Path) -> Result<ParserOptions, PackageError> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        PackageError::Config(format!("Cannot read config '{}': {}", path.display(), e))
    })?;
    from_toml(&text)
        .map_err(|e| PackageError::Config(format!("Invalid config '{}': {}", path.display(), e)))
}

/// Parse options from TOML text.
pub fn from_toml(text: &str) -> Result<ParserOptions, toml::de::Error> {
    toml::from_str(text)
}

/// Apply environment overrides; `lookup` returns a variable's value.
pub fn apply_env_overrides(
    mut options: ParserOptions,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<ParserOptions, PackageError> {
    if let Some(raw) = lookup(ENV_MAX_FILE_SIZE) {
        options.max_file_size = raw.trim().parse().map_err(|_| {
            PackageError::Config(format!(
                "{} must be a byte count, got '{}'",
                ENV_MAX_FILE_SIZE, raw
            ))
        })?;
    }
    if let Some(language) = lookup(ENV_LANGUAGE).filter(|l| !l.trim().is_empty()) {
        options.preferred_language = language.trim().to_string();
    }
    tracing::debug!(?options, "parser options");
    Ok(options)
}
