//! Declarative helpers shared by the schema models.

/// Declare a closed vocabulary of schema tokens.
///
/// Generates the enum with serde names equal to the tokens, a `parse`
/// constructor (ASCII case-insensitive, unknown tokens are
/// `PackageError::InvalidManifest`), `as_token` and `Display`.
macro_rules! vocabulary {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident ($label:literal) {
            $( $(#[$vmeta:meta])* $variant:ident => $token:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        $vis enum $name {
            $( $(#[$vmeta])* #[serde(rename = $token)] $variant, )+
        }

        impl $name {
            /// Parse a schema token.
            pub fn parse(value: &str) -> Result<Self, $crate::PackageError> {
                let value = value.trim();
                $(
                    if value.eq_ignore_ascii_case($token) {
                        return Ok(Self::$variant);
                    }
                )+
                Err($crate::PackageError::InvalidManifest(format!(
                    "unknown {} '{}'",
                    $label, value
                )))
            }

            /// The token as written in the schema.
            #[must_use]
            pub const fn as_token(self) -> &'static str {
                match self {
                    $( Self::$variant => $token, )+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_token())
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use crate::PackageError;

    vocabulary! {
        /// Test vocabulary.
        #[derive(Default)]
        pub enum Colour ("colour") {
            #[default]
            Red => "red",
            DarkBlue => "darkBlue",
        }
    }

    #[test]
    fn parses_tokens_case_insensitively() {
        assert_eq!(Colour::parse(" DARKBLUE ").expect("parse"), Colour::DarkBlue);
        assert_eq!(Colour::default(), Colour::Red);
        assert_eq!(Colour::DarkBlue.to_string(), "darkBlue");
    }

    #[test]
    fn unknown_token_names_the_vocabulary() {
        let err = Colour::parse("green").expect_err("unknown");
        assert!(matches!(err, PackageError::InvalidManifest(m) if m == "unknown colour 'green'"));
    }

    #[test]
    fn serde_uses_tokens() {
        let json = serde_json::to_string(&Colour::DarkBlue).expect("serialize");
        assert_eq!(json, "\"darkBlue\"");
    }
}
