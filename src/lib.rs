// SPDX-License-Identifier: MIT

//! Condition expressions for scenario tests
//!
//! Authors describe a condition as a YAML document made of nested
//! `All` / `Any` / `Not` blocks whose leaves are literals or named checks:
//!
//! ```yaml
//! All:
//!   - Any: [true, false]
//!   - Type: always_true
//! ```
//!
//! [`parse`] turns the document into an [`Expression`] tree and
//! [`Expression::evaluate`] reduces it, resolving named checks through a
//! [`Registry`].

pub mod error;
pub mod expression;
pub mod registry;

pub use error::{ExpressionError, Result};
pub use expression::{
    load, parse, parse_str, parse_with, to_boolean, Expression, Literal, Logical, Node, Operator,
    ParseOptions, Predicate, UnsupportedForm,
};
pub use registry::{validate, Condition, ConditionRegistry, Registry};
