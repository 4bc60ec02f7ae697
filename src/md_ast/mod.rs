//! The formatted-text tree: node model, tokenizers, and parser.

mod parse;
mod tree;
pub mod tokenize;

pub use parse::*;
pub use tree::*;

#[cfg(test)]
mod tree_test_utils;
#[cfg(test)]
pub(crate) use tree_test_utils::*;
