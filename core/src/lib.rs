pub mod ast;
pub mod diagnostics;
pub mod parser;
pub mod pipeline;
pub mod printers;
pub mod scanner;
pub mod token;
pub mod types;

pub use crate::pipeline::{process, scan, Processed};
