//! # CLI Command Implementations
//!
//! Each command returns the text it would print, so the binary and the
//! tests share one code path.

use elpack_core::duration::format_iso8601;
use elpack_core::{
    FormatDetails, LocalFileAccess, ModuleMetadata, ModuleParserFactory, ModuleTypeDetector,
    PackageError, ParserOptions, PrerequisiteExpression,
};
use std::path::Path;

/// Open a package directory with the configured size limit.
pub fn open_package(path: &Path, options: &ParserOptions) -> Result<LocalFileAccess, PackageError> {
    Ok(LocalFileAccess::new(path)?.with_max_file_size(options.max_file_size))
}

fn parse_metadata(path: &Path, options: &ParserOptions) -> Result<ModuleMetadata, PackageError> {
    let access = open_package(path, options)?;
    let parsed = ModuleParserFactory::new(options.clone()).parse(&access)?;
    Ok(parsed.metadata)
}

// =============================================================================
// DETECT COMMAND
// =============================================================================

/// Name of the standard the package follows.
pub fn cmd_detect(path: &Path, options: &ParserOptions) -> Result<String, PackageError> {
    let access = open_package(path, options)?;
    let module_type = ModuleTypeDetector::detect(&access)?;
    tracing::info!(path = %path.display(), %module_type, "detected");
    Ok(module_type.to_string())
}

// =============================================================================
// INSPECT COMMAND
// =============================================================================

/// Package metadata as a text report or pretty JSON.
pub fn cmd_inspect(path: &Path, options: &ParserOptions, json: bool) -> Result<String, PackageError> {
    let metadata = parse_metadata(path, options)?;
    if json {
        return serde_json::to_string_pretty(&metadata).map_err(|e| PackageError::Json {
            file: "<output>".to_string(),
            message: e.to_string(),
        });
    }
    Ok(render_metadata(&metadata))
}

/// Human-readable metadata report.
pub fn render_metadata(metadata: &ModuleMetadata) -> String {
    let optional = |value: Option<&str>| value.unwrap_or("-").to_string();
    let duration = metadata
        .duration
        .map(format_iso8601)
        .unwrap_or_else(|| "-".to_string());
    let size = metadata
        .size_on_disk
        .map(|bytes| format!("{} bytes", bytes))
        .unwrap_or_else(|| "-".to_string());

    let mut lines = vec![
        "Package Metadata".to_string(),
        "================".to_string(),
        format!("Type:         {}", metadata.module_type),
        format!("Title:        {}", metadata.title),
        format!("Description:  {}", optional(metadata.description.as_deref())),
        format!("Launch URL:   {}", metadata.launch_url),
        format!("Identifier:   {}", optional(metadata.identifier.as_deref())),
        format!("Version:      {}", optional(metadata.version.as_deref())),
        format!("Duration:     {}", duration),
        format!("Size on disk: {}", size),
        format!("xAPI enabled: {}", metadata.xapi_enabled),
        format!("Units:        {}", metadata.launchable_ids().len()),
    ];

    match &metadata.details {
        FormatDetails::Scorm2004(details) => {
            lines.push(format!("Edition:      {}", details.edition));
            lines.push(format!("Sequencing:   {}", details.has_sequencing));
        }
        FormatDetails::Scorm12(_) => {
            lines.push(format!("Prerequisites: {}", metadata.has_prerequisites()));
        }
        FormatDetails::Aicc(details) => {
            lines.push(format!("Prerequisites: {}", metadata.has_prerequisites()));
            for id in &details.au_ids {
                if let Some(title) = details.titles.get(id) {
                    lines.push(format!("  {} {}", id, title));
                }
            }
        }
        FormatDetails::Cmi5(details) => {
            for id in &details.au_ids {
                if let Some(move_on) = metadata.move_on(id) {
                    lines.push(format!("  {} moveOn={}", id, move_on));
                }
            }
        }
        FormatDetails::Xapi(_) => {}
    }
    lines.join("\n")
}

// =============================================================================
// LAUNCH COMMAND
// =============================================================================

/// Launch URL of the package.
pub fn cmd_launch(path: &Path, options: &ParserOptions) -> Result<String, PackageError> {
    Ok(parse_metadata(path, options)?.launch_url)
}

// =============================================================================
// PREREQ COMMAND
// =============================================================================

/// Parse and evaluate a prerequisite expression.
pub fn cmd_prereq(expression: &str, completed: &[String]) -> Result<String, PackageError> {
    let parsed = PrerequisiteExpression::parse(expression)?;
    let completed: Vec<&str> = completed
        .iter()
        .map(|id| id.trim())
        .filter(|id| !id.is_empty())
        .collect();
    let satisfied = parsed.evaluate(|id| completed.iter().any(|done| done.eq_ignore_ascii_case(id)));
    tracing::debug!(expression = %parsed, satisfied, "evaluated prerequisite");

    Ok([
        format!("Expression: {}", parsed),
        format!("References: {}", parsed.references().join(", ")),
        format!(
            "Result:     {}",
            if satisfied { "satisfied" } else { "not satisfied" }
        ),
    ]
    .join("\n"))
}
