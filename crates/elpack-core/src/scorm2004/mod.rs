//! # SCORM 2004
//!
//! `imsmanifest.xml` following IMS Content Packaging 1.1.4 with the ADL
//! content packaging, navigation and sequencing extensions and IMS Simple
//! Sequencing. Covers the 2nd, 3rd and 4th editions.

mod model;
mod parser;
pub mod sequencing;

pub use model::{
    CompletionThreshold, DataMap, HideLmsUi, Item, Organization, Organizations, Presentation,
    Scorm2004Manifest,
};
pub use parser::Scorm2004Parser;
pub use sequencing::{Sequencing, SequencingCollection};
