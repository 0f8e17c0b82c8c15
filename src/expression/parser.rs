// SPDX-License-Identifier: MIT

//! Condition document parser
//!
//! Reads a YAML tree into an [`Expression`]:
//! - `true`, `false`, numbers become literals
//! - `All: [...]`, `Any: [...]`, `Not: [x]` become logical nodes
//! - `Type: name` becomes a predicate call; `Type` with `Params` is an
//!   action call
//! - `Sequential` and `Parallel` are accepted but cannot be evaluated yet

use super::ast::{Literal, Logical, Operator, Predicate, UnsupportedForm};
use super::Expression;
use crate::error::{ExpressionError, Result};
use serde_yaml::{Mapping, Value};
use std::fs;
use std::path::Path;

/// Default nesting limit for condition documents
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Environment variable overriding [`DEFAULT_MAX_DEPTH`]
pub const MAX_DEPTH_ENV: &str = "SCENARIO_EXPRESSION_MAX_DEPTH";

const ROOT: &str = "$";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    /// Deepest nesting of operator blocks accepted before parsing fails
    pub max_depth: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl ParseOptions {
    /// Options with `max_depth` taken from the environment when set
    pub fn from_env() -> Self {
        match std::env::var(MAX_DEPTH_ENV) {
            Ok(raw) => match raw.trim().parse() {
                Ok(max_depth) => Self { max_depth },
                Err(_) => {
                    log::warn!("Ignoring {}={}: not an integer", MAX_DEPTH_ENV, raw);
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        }
    }
}

/// Parse a document node with default options
pub fn parse(node: &Value) -> Result<Expression> {
    parse_with(node, ParseOptions::default())
}

pub fn parse_with(node: &Value, options: ParseOptions) -> Result<Expression> {
    Reader { options }.read(node, ROOT, 0)
}

/// Parse a condition from YAML text
pub fn parse_str(content: &str) -> Result<Expression> {
    let document: Value = serde_yaml::from_str(content)?;
    parse(&document)
}

/// Load and parse a condition from a YAML file
pub fn load<P: AsRef<Path>>(path: P, options: ParseOptions) -> Result<Expression> {
    let content = fs::read_to_string(path)?;
    let document: Value = serde_yaml::from_str(&content)?;
    parse_with(&document, options)
}

struct Reader {
    options: ParseOptions,
}

impl Reader {
    fn read(&self, node: &Value, path: &str, depth: usize) -> Result<Expression> {
        if depth > self.options.max_depth {
            return Err(ExpressionError::DepthExceeded {
                limit: self.options.max_depth,
            });
        }

        match node {
            Value::Bool(b) => Ok(Expression::literal(*b)),
            Value::Number(n) => n
                .as_f64()
                .map(|n| Expression::literal(Literal::Number(n)))
                .ok_or_else(|| {
                    ExpressionError::parse(path, format!("number {} is not representable", n))
                }),
            Value::String(s) => Err(ExpressionError::parse(
                path,
                format!("scalar '{}' is neither a boolean nor a number", s),
            )),
            Value::Null => Err(ExpressionError::parse(path, "empty node")),
            Value::Sequence(_) => Err(ExpressionError::parse(
                path,
                "sequence without operator context",
            )),
            Value::Mapping(map) => self.read_mapping(map, path, depth),
            Value::Tagged(tagged) => Err(ExpressionError::parse(
                path,
                format!("tagged value {} is not an expression", tagged.tag),
            )),
        }
    }

    fn read_mapping(&self, map: &Mapping, path: &str, depth: usize) -> Result<Expression> {
        for operator in [Operator::And, Operator::Or, Operator::Not] {
            if let Some(operands) = map.get(operator.keyword()) {
                return self.read_logical(operator, operands, path, depth);
            }
        }

        if let Some(kind) = map.get("Type") {
            return self.read_procedure(map, kind, path);
        }

        if let Some(body) = map.get("Sequential") {
            log::debug!("Sequential block at {} kept unevaluated", path);
            return Ok(Expression::make(UnsupportedForm::Sequential(body.clone())));
        }

        if let Some(body) = map.get("Parallel") {
            log::debug!("Parallel block at {} kept unevaluated", path);
            return Ok(Expression::make(UnsupportedForm::Parallel(body.clone())));
        }

        Err(ExpressionError::parse(path, "unrecognized expression form"))
    }

    fn read_logical(
        &self,
        operator: Operator,
        operands: &Value,
        path: &str,
        depth: usize,
    ) -> Result<Expression> {
        let key = operator.keyword();
        let Value::Sequence(items) = operands else {
            return Err(ExpressionError::parse(
                format!("{}.{}", path, key),
                format!("'{}' expects a sequence of operands", key),
            ));
        };

        let operands = items
            .iter()
            .enumerate()
            .map(|(i, item)| self.read(item, &format!("{}.{}[{}]", path, key, i), depth + 1))
            .collect::<Result<Vec<_>>>()?;

        log::debug!(
            "Built {} with {} operand(s) at {}",
            key,
            operands.len(),
            path
        );
        Ok(Expression::make(Logical::new(operator, operands)?))
    }

    fn read_procedure(&self, map: &Mapping, kind: &Value, path: &str) -> Result<Expression> {
        let name = match kind.as_str().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => {
                return Err(ExpressionError::parse(
                    format!("{}.Type", path),
                    "'Type' must name a condition",
                ))
            }
        };

        if let Some(params) = map.get("Params") {
            log::debug!("Action call '{}' at {}", name, path);
            return Ok(Expression::make(UnsupportedForm::ActionCall {
                name,
                params: params.clone(),
            }));
        }

        let arguments: Mapping = map
            .iter()
            .filter(|(key, _)| key.as_str() != Some("Type"))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        log::debug!("Predicate call '{}' at {}", name, path);
        Ok(Expression::make(Predicate::new(name, arguments)))
    }
}
