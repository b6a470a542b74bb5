//! # cmi5
//!
//! `cmi5.xml` course structures: a course, its objectives and a tree of
//! blocks and assignable units launched over xAPI.

mod model;
mod parser;

pub use model::{
    AssignableUnit, Block, Course, CourseNode, CourseStructure, LaunchMethod, MoveOn, Objective,
    ObjectiveRef,
};
pub use parser::Cmi5Parser;
