//! Rule parsing, combination and evaluation module
//!
//! This module handles parsing rule strings like
//! "age > 30 AND (status = 'active' OR tier = 'gold')" into a binary tree,
//! folding several trees into one, and evaluating trees against a Record.

mod ast;
pub mod cache;
mod combiner;
mod evaluator;
pub mod parser;
mod stored;

#[cfg(test)]
mod property_tests;

pub use ast::*;
pub use cache::*;
pub use combiner::*;
pub use evaluator::*;
pub use parser::*;
pub use stored::*;
