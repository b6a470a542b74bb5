//! # SCORM 1.2
//!
//! `imsmanifest.xml` following IMS Content Packaging 1.1.2 with the ADL
//! `adlcp` extensions, and the parser that summarises it.

mod model;
mod parser;

pub use model::{
    Item, Organization, Organizations, Prerequisites, Scorm12Manifest, TimeLimitAction,
};
pub use parser::Scorm12Parser;
