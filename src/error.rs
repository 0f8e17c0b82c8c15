// SPDX-License-Identifier: MIT

//! Typed errors for parsing and evaluating condition expressions

use thiserror::Error;

/// Boxed error returned by externally supplied conditions
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

pub type Result<T> = std::result::Result<T, ExpressionError>;

/// Errors raised while building or evaluating an expression tree
#[derive(Debug, Error)]
pub enum ExpressionError {
    /// Document shape matches no grammar production
    #[error("Parse error at {path}: {message}")]
    Parse { path: String, message: String },

    /// Logical operator received the wrong number of operands
    #[error("Operator '{operator}' expects {expected} operand(s), found {found}")]
    Arity {
        operator: String,
        expected: usize,
        found: usize,
    },

    /// Named condition is not present in the registry
    #[error("Condition '{name}' is not registered")]
    Resolution { name: String },

    /// Evaluation requested on a handle that owns no node
    #[error("Cannot evaluate an empty expression")]
    EmptyExpression,

    /// Grammar form that is recognized but has no evaluation rule yet
    #[error("{form} is not supported yet")]
    Unsupported { form: String },

    /// A resolved condition failed while running
    #[error("Condition '{name}' failed: {source}")]
    Condition {
        name: String,
        #[source]
        source: BoxError,
    },

    /// Document nesting is deeper than the configured limit
    #[error("Expression nesting exceeds the limit of {limit}")]
    DepthExceeded { limit: usize },

    /// YAML parsing errors
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    /// I/O errors
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ExpressionError {
    /// Create a parse error for the node at `path`
    pub fn parse(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an arity error
    pub fn arity(operator: impl Into<String>, expected: usize, found: usize) -> Self {
        Self::Arity {
            operator: operator.into(),
            expected,
            found,
        }
    }

    /// Create a resolution error
    pub fn resolution(name: impl Into<String>) -> Self {
        Self::Resolution { name: name.into() }
    }

    /// Create an unsupported-form error
    pub fn unsupported(form: impl Into<String>) -> Self {
        Self::Unsupported { form: form.into() }
    }

    pub fn condition(name: impl Into<String>, source: BoxError) -> Self {
        Self::Condition {
            name: name.into(),
            source,
        }
    }
}
