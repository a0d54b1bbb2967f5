//! Small self-contained utilities.

mod generator;

pub use generator::Generator;
