//! Consumers of a parsed program: direct evaluation and Java emission.

pub mod generator;
pub mod interpreter;
