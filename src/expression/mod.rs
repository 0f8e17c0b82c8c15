// SPDX-License-Identifier: MIT

//! Condition expression trees
//!
//! This module provides:
//! - `Expression` - shared handle to a node of the tree
//! - `Node` - literal, logical, predicate or not-yet-supported payload
//! - `parse` - document to tree translation
//! - `evaluate` / `to_boolean` - reduction of a tree to a decision

mod ast;
mod evaluator;
mod handle;
mod parser;

pub use ast::{Literal, Logical, Node, Operator, Predicate, UnsupportedForm};
pub use evaluator::to_boolean;
pub use handle::Expression;
pub use parser::{
    load, parse, parse_str, parse_with, ParseOptions, DEFAULT_MAX_DEPTH, MAX_DEPTH_ENV,
};
