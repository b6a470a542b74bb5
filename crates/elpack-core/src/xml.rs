//! # XML Element Tree
//!
//! A small, read-only element tree built from `quick-xml` events.
//!
//! Package manifests mix several namespaces (`imscp`, `adlcp`, `imsss`,
//! `adlseq`, `lom`, ...) and real-world packages are inconsistent about
//! prefixes and letter case. The tree therefore:
//! - matches element and attribute names by local name, ignoring ASCII case
//! - keeps the resolved namespace URI of every element for the few places
//!   where two vocabularies share a local name
//! - keeps `xml:base` / `xml:lang` under their local names (`base`, `lang`)

use crate::PackageError;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use std::collections::BTreeMap;
use std::fmt::Display;

/// One element of a parsed XML document.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct XmlElement {
    /// Local name (prefix stripped).
    pub name: String,
    /// Prefix as written in the document, if any.
    pub prefix: Option<String>,
    /// Resolved namespace URI.
    pub namespace: Option<String>,
    /// Namespace declarations made on this element (`""` is the default namespace).
    pub namespaces: BTreeMap<String, String>,
    /// Attributes keyed by local name.
    pub attributes: BTreeMap<String, String>,
    /// Child elements in document order.
    pub children: Vec<XmlElement>,
    /// Concatenated character data (text and CDATA).
    pub text: String,
}

/// Parse a complete XML document and return its root element.
///
/// `file` is only used to label errors.
pub fn parse_document(source: &str, file: &str) -> Result<XmlElement, PackageError> {
    let source = source.strip_prefix('\u{feff}').unwrap_or(source);
    let mut reader = Reader::from_str(source);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(start)) => {
                let element = element_from_start(&start, &stack, file)?;
                stack.push(element);
            }
            Ok(Event::Empty(start)) => {
                let element = element_from_start(&start, &stack, file)?;
                attach(&mut stack, &mut root, element, file)?;
            }
            Ok(Event::End(_)) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| xml_error(file, "unexpected closing tag"))?;
                attach(&mut stack, &mut root, element, file)?;
            }
            Ok(Event::Text(text)) => {
                if let Some(current) = stack.last_mut() {
                    let text = text.unescape().map_err(|e| xml_error(file, e))?;
                    current.text.push_str(&text);
                }
            }
            Ok(Event::CData(data)) => {
                if let Some(current) = stack.last_mut() {
                    current
                        .text
                        .push_str(&String::from_utf8_lossy(&data.into_inner()));
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(xml_error(
                    file,
                    format!("{} (at byte {})", e, reader.buffer_position()),
                ));
            }
        }
    }

    if let Some(open) = stack.last() {
        return Err(xml_error(file, format!("unclosed element <{}>", open.name)));
    }

    root.ok_or_else(|| xml_error(file, "document has no root element"))
}

fn element_from_start(
    start: &BytesStart<'_>,
    stack: &[XmlElement],
    file: &str,
) -> Result<XmlElement, PackageError> {
    let qname = start.name();
    let mut element = XmlElement {
        name: String::from_utf8_lossy(qname.local_name().as_ref()).into_owned(),
        prefix: qname
            .prefix()
            .map(|p| String::from_utf8_lossy(p.as_ref()).into_owned()),
        ..XmlElement::default()
    };

    for attr in start.attributes() {
        let attr = attr.map_err(|e| xml_error(file, e))?;
        let value = attr
            .unescape_value()
            .map_err(|e| xml_error(file, e))?
            .into_owned();
        let key = attr.key.as_ref();

        if key == b"xmlns" {
            element.namespaces.insert(String::new(), value);
        } else if let Some(prefix) = key.strip_prefix(b"xmlns:") {
            element
                .namespaces
                .insert(String::from_utf8_lossy(prefix).into_owned(), value);
        } else {
            let local = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
            element.attributes.insert(local, value);
        }
    }

    let prefix = element.prefix.clone().unwrap_or_default();
    element.namespace = element
        .namespaces
        .get(&prefix)
        .or_else(|| {
            stack
                .iter()
                .rev()
                .find_map(|ancestor| ancestor.namespaces.get(&prefix))
        })
        .cloned();

    Ok(element)
}

fn attach(
    stack: &mut [XmlElement],
    root: &mut Option<XmlElement>,
    element: XmlElement,
    file: &str,
) -> Result<(), PackageError> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(element);
        return Ok(());
    }
    if root.is_some() {
        return Err(xml_error(file, "document has more than one root element"));
    }
    *root = Some(element);
    Ok(())
}

fn xml_error(file: &str, message: impl Display) -> PackageError {
    PackageError::Xml {
        file: file.to_string(),
        message: message.to_string(),
    }
}

// =============================================================================
// ACCESSORS
// =============================================================================

impl XmlElement {
    /// Whether this element has the given local name (ASCII case-insensitive).
    #[must_use]
    pub fn is(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    /// Whether this element's namespace URI (or prefix) contains `fragment`.
    #[must_use]
    pub fn in_namespace(&self, fragment: &str) -> bool {
        let fragment = fragment.to_ascii_lowercase();
        self.namespace
            .as_deref()
            .map(|ns| ns.to_ascii_lowercase().contains(&fragment))
            .unwrap_or(false)
            || self
                .prefix
                .as_deref()
                .map(|p| p.eq_ignore_ascii_case(&fragment))
                .unwrap_or(false)
    }

    /// Raw attribute value by local name.
    #[must_use]
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .get(name)
            .or_else(|| {
                self.attributes
                    .iter()
                    .find(|(key, _)| key.eq_ignore_ascii_case(name))
                    .map(|(_, value)| value)
            })
            .map(String::as_str)
    }

    /// Attribute value, trimmed, or `None` when absent or blank.
    #[must_use]
    pub fn attr_trimmed(&self, name: &str) -> Option<&str> {
        self.attr(name).map(str::trim).filter(|v| !v.is_empty())
    }

    /// Owned, trimmed attribute value.
    #[must_use]
    pub fn attr_string(&self, name: &str) -> Option<String> {
        self.attr_trimmed(name).map(str::to_string)
    }

    /// Boolean attribute (`true`/`false`/`1`/`0`).
    pub fn attr_bool(&self, name: &str) -> Result<Option<bool>, PackageError> {
        self.attr_trimmed(name)
            .map(|value| parse_bool(value, &self.name, name))
            .transpose()
    }

    /// Boolean attribute with a schema default.
    pub fn attr_bool_or(&self, name: &str, default: bool) -> Result<bool, PackageError> {
        Ok(self.attr_bool(name)?.unwrap_or(default))
    }

    /// Decimal attribute.
    pub fn attr_f64(&self, name: &str) -> Result<Option<f64>, PackageError> {
        self.attr_trimmed(name)
            .map(|value| parse_decimal(value, &format!("{}@{}", self.name, name)))
            .transpose()
    }

    /// Non-negative integer attribute.
    pub fn attr_u32(&self, name: &str) -> Result<Option<u32>, PackageError> {
        self.attr_trimmed(name)
            .map(|value| {
                value.parse::<u32>().map_err(|_| {
                    PackageError::InvalidManifest(format!(
                        "{}@{} must be a non-negative integer, got '{}'",
                        self.name, name, value
                    ))
                })
            })
            .transpose()
    }

    /// First child with the given local name.
    #[must_use]
    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.children.iter().find(|child| child.is(name))
    }

    /// All children with the given local name, in document order.
    pub fn children<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlElement> {
        self.children.iter().filter(move |child| child.is(name))
    }

    /// Trimmed text of this element, or `None` when blank.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        let text = self.text.trim();
        (!text.is_empty()).then_some(text)
    }

    /// Trimmed text of the first child with the given name.
    #[must_use]
    pub fn child_text(&self, name: &str) -> Option<&str> {
        self.child(name).and_then(XmlElement::text)
    }

    /// Owned trimmed text of the first child with the given name.
    #[must_use]
    pub fn child_string(&self, name: &str) -> Option<String> {
        self.child_text(name).map(str::to_string)
    }

    /// All descendants in pre-order, excluding `self`.
    #[must_use]
    pub fn descendants(&self) -> Vec<&XmlElement> {
        let mut out = Vec::new();
        let mut pending: Vec<&XmlElement> = self.children.iter().rev().collect();
        while let Some(element) = pending.pop() {
            out.push(element);
            pending.extend(element.children.iter().rev());
        }
        out
    }

    /// Namespace URIs declared anywhere in the document subtree.
    #[must_use]
    pub fn declared_namespaces(&self) -> Vec<&str> {
        std::iter::once(self)
            .chain(self.descendants())
            .flat_map(|element| element.namespaces.values().map(String::as_str))
            .collect()
    }
}

// =============================================================================
// VALUE PARSING
// =============================================================================

/// Parse an XML Schema boolean.
pub(crate) fn parse_bool(value: &str, element: &str, attr: &str) -> Result<bool, PackageError> {
    match value.trim() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        other if other.eq_ignore_ascii_case("true") => Ok(true),
        other if other.eq_ignore_ascii_case("false") => Ok(false),
        other => Err(PackageError::InvalidManifest(format!(
            "{}@{} must be a boolean, got '{}'",
            element, attr, other
        ))),
    }
}

/// Parse a decimal value; `what` names the field in the error.
pub(crate) fn parse_decimal(value: &str, what: &str) -> Result<f64, PackageError> {
    let parsed = value.trim().parse::<f64>().map_err(|_| {
        PackageError::InvalidManifest(format!("{} must be a decimal, got '{}'", what, value))
    })?;
    if !parsed.is_finite() {
        return Err(PackageError::InvalidManifest(format!(
            "{} must be finite, got '{}'",
            what, value
        )));
    }
    Ok(parsed)
}

/// Check that a decimal lies within `[min, max]`.
pub(crate) fn check_range(value: f64, min: f64, max: f64, what: &str) -> Result<f64, PackageError> {
    if value < min || value > max {
        return Err(PackageError::InvalidManifest(format!(
            "{} must be within [{}, {}], got {}",
            what, min, max, value
        )));
    }
    Ok(value)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<manifest identifier="M1" xmlns="http://www.imsglobal.org/xsd/imscp_v1p1"
          xmlns:adlcp="http://www.adlnet.org/xsd/adlcp_v1p3">
  <resources xml:base="content/">
    <resource identifier="R1" adlcp:scormType="sco" href="index.html?a=1&amp;b=2"/>
  </resources>
  <note><![CDATA[<b>raw</b>]]></note>
</manifest>"#;

    #[test]
    fn parses_local_names_and_namespaces() {
        let root = parse_document(MANIFEST, "imsmanifest.xml").expect("parse");
        assert!(root.is("manifest"));
        assert_eq!(root.attr("identifier"), Some("M1"));
        assert_eq!(
            root.namespace.as_deref(),
            Some("http://www.imsglobal.org/xsd/imscp_v1p1")
        );

        let resources = root.child("resources").expect("resources");
        assert_eq!(resources.attr("base"), Some("content/"));

        let resource = resources.child("resource").expect("resource");
        assert_eq!(resource.attr("scormtype"), Some("sco"));
        assert_eq!(resource.attr("href"), Some("index.html?a=1&b=2"));
        assert!(resource.in_namespace("imscp"));
    }

    #[test]
    fn keeps_cdata_verbatim() {
        let root = parse_document(MANIFEST, "imsmanifest.xml").expect("parse");
        assert_eq!(root.child_text("note"), Some("<b>raw</b>"));
    }

    #[test]
    fn declared_namespaces_are_collected() {
        let root = parse_document(MANIFEST, "imsmanifest.xml").expect("parse");
        let namespaces = root.declared_namespaces();
        assert!(namespaces.iter().any(|ns| ns.contains("adlcp_v1p3")));
    }

    #[test]
    fn element_names_match_case_insensitively() {
        let root = parse_document(
            "<lom><educational><typicalLearningTime>PT1H</typicalLearningTime></educational></lom>",
            "lom.xml",
        )
        .expect("parse");
        let educational = root.child("educational").expect("educational");
        assert_eq!(educational.child_text("typicallearningtime"), Some("PT1H"));
    }

    #[test]
    fn prefixed_children_resolve_to_their_namespace() {
        let doc = r#"<sequencing xmlns="http://www.imsglobal.org/xsd/imsss"
                       xmlns:adlseq="http://www.adlnet.org/xsd/adlseq_v1p3">
            <objectives/>
            <adlseq:objectives/>
        </sequencing>"#;
        let root = parse_document(doc, "seq.xml").expect("parse");
        let kinds: Vec<bool> = root
            .children("objectives")
            .map(|el| el.in_namespace("adlseq"))
            .collect();
        assert_eq!(kinds, vec![false, true]);
    }

    #[test]
    fn rejects_mismatched_tags() {
        let err = parse_document("<a><b></a>", "bad.xml").expect_err("must fail");
        assert!(matches!(err, PackageError::Xml { .. }));
    }

    #[test]
    fn rejects_unclosed_document() {
        let err = parse_document("<a><b/>", "bad.xml").expect_err("must fail");
        assert!(matches!(err, PackageError::Xml { .. }));
    }

    #[test]
    fn rejects_empty_document() {
        let err = parse_document("   ", "empty.xml").expect_err("must fail");
        assert!(err.to_string().contains("no root element"));
    }

    #[test]
    fn typed_attribute_helpers() {
        let root = parse_document(
            r#"<controlMode choice="false" flow="1" weight="0.5" limit="3" bad="maybe"/>"#,
            "cm.xml",
        )
        .expect("parse");
        assert_eq!(root.attr_bool("choice").expect("bool"), Some(false));
        assert!(root.attr_bool_or("flow", false).expect("bool"));
        assert!(root.attr_bool_or("forwardOnly", true).expect("default"));
        assert_eq!(root.attr_f64("weight").expect("f64"), Some(0.5));
        assert_eq!(root.attr_u32("limit").expect("u32"), Some(3));
        assert!(root.attr_bool("bad").is_err());
    }

    #[test]
    fn descendants_are_pre_order() {
        let root = parse_document("<a><b><c/></b><d/></a>", "t.xml").expect("parse");
        let names: Vec<&str> = root.descendants().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["b", "c", "d"]);
    }

    #[test]
    fn range_check() {
        assert!(check_range(0.5, 0.0, 1.0, "threshold").is_ok());
        assert!(check_range(1.5, 0.0, 1.0, "threshold").is_err());
    }
}
