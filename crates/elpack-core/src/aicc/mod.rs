//! # AICC
//!
//! AICC CMI001 course structure packages: the `.crs` INI file, the
//! comma-separated `.au`, `.des`, `.cst`, `.pre` and `.ort` tables, and
//! prerequisite expressions.

mod csv;
mod model;
mod parser;
mod prerequisite;

pub use model::{
    AiccManifest, AssignableUnit, Course, CourseFile, Descriptor, MemberList, Prerequisite,
};
pub use parser::AiccParser;
pub use prerequisite::PrerequisiteExpression;
