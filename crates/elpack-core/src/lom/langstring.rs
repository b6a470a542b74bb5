//! Localized strings.

use crate::xml::XmlElement;
use serde::{Deserialize, Serialize};

/// A string tagged with an optional language code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LangString {
    pub language: Option<String>,
    pub value: String,
}

impl LangString {
    /// Create a language-tagged string.
    #[must_use]
    pub fn new(language: Option<&str>, value: impl Into<String>) -> Self {
        Self {
            language: language.map(str::to_string),
            value: value.into(),
        }
    }

    /// Read a single string element. The language comes from `xml:lang`,
    /// `lang` or `language`; blank values yield `None`.
    #[must_use]
    pub fn from_element(element: &XmlElement) -> Option<Self> {
        let value = element.text()?;
        let language = element
            .attr_trimmed("lang")
            .or_else(|| element.attr_trimmed("language"));
        Some(Self::new(language, value))
    }
}

/// A set of translations of the same string.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LangStrings(pub Vec<LangString>);

impl LangStrings {
    /// Read the translations held by a container element.
    ///
    /// Handles `<title><langstring>..</langstring></title>` (IMS MD, cmi5),
    /// `<title><string>..</string></title>` (LOMv1.0) and a container that
    /// carries its text directly.
    #[must_use]
    pub fn from_container(element: &XmlElement) -> Self {
        let strings: Vec<LangString> = element
            .children
            .iter()
            .filter(|child| child.is("langstring") || child.is("string"))
            .filter_map(LangString::from_element)
            .collect();
        if !strings.is_empty() {
            return Self(strings);
        }
        Self(LangString::from_element(element).into_iter().collect())
    }

    /// Whether no translation is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Best value for `language`.
    ///
    /// Preference order: exact tag match, same primary subtag
    /// (`en` ~ `en-US`), untagged or `x-none`, then the first entry.
    #[must_use]
    pub fn best(&self, language: &str) -> Option<&str> {
        let primary = |tag: &str| tag.split(['-', '_']).next().unwrap_or("").to_ascii_lowercase();
        let wanted = primary(language);

        self.0
            .iter()
            .find(|s| {
                s.language
                    .as_deref()
                    .is_some_and(|l| l.eq_ignore_ascii_case(language))
            })
            .or_else(|| {
                self.0
                    .iter()
                    .find(|s| s.language.as_deref().is_some_and(|l| primary(l) == wanted))
            })
            .or_else(|| {
                self.0.iter().find(|s| {
                    s.language
                        .as_deref()
                        .is_none_or(|l| l.eq_ignore_ascii_case("x-none"))
                })
            })
            .or_else(|| self.0.first())
            .map(|s| s.value.as_str())
    }
}
