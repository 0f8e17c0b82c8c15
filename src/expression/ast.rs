// SPDX-License-Identifier: MIT

//! Node types of a condition expression tree

use super::Expression;
use crate::error::{ExpressionError, Result};
use crate::registry::Condition;
use once_cell::sync::OnceCell;
use serde::Serialize;
use serde_yaml::{Mapping, Value};
use std::fmt;
use std::sync::Arc;

/// Payload owned by an [`Expression`] handle
#[derive(Debug)]
pub enum Node {
    Literal(Literal),
    Logical(Logical),
    Predicate(Predicate),
    /// Recognized grammar form without an evaluation rule
    Unsupported(UnsupportedForm),
}

/// Constant leaf value
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Literal {
    Boolean(bool),
    Number(f64),
}

/// Logical combinators and the document keys that introduce them
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// `All`
    And,
    /// `Any`
    Or,
    /// `Not`
    Not,
}

impl Operator {
    /// Key under which the operator appears in a document
    pub fn keyword(&self) -> &'static str {
        match self {
            Operator::And => "All",
            Operator::Or => "Any",
            Operator::Not => "Not",
        }
    }

    /// Required operand count, `None` when any count is accepted
    pub fn arity(&self) -> Option<usize> {
        match self {
            Operator::Not => Some(1),
            Operator::And | Operator::Or => None,
        }
    }

    /// Result of the combinator over an empty operand list, `None` for the
    /// unary `Not`
    pub fn identity(&self) -> Option<bool> {
        match self {
            Operator::And => Some(true),
            Operator::Or => Some(false),
            Operator::Not => None,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operator::And => write!(f, "all"),
            Operator::Or => write!(f, "any"),
            Operator::Not => write!(f, "not"),
        }
    }
}

/// Operator applied to an ordered list of operands
#[derive(Debug)]
pub struct Logical {
    operator: Operator,
    operands: Vec<Expression>,
}

impl Logical {
    /// Build a logical node, rejecting operand counts the operator cannot take
    /// and operands that own no node.
    pub fn new(operator: Operator, operands: Vec<Expression>) -> Result<Self> {
        if let Some(expected) = operator.arity() {
            if operands.len() != expected {
                return Err(ExpressionError::arity(
                    operator.keyword(),
                    expected,
                    operands.len(),
                ));
            }
        }
        if operands.iter().any(Expression::is_empty) {
            return Err(ExpressionError::EmptyExpression);
        }
        Ok(Self { operator, operands })
    }

    pub fn operator(&self) -> Operator {
        self.operator
    }

    pub fn operands(&self) -> &[Expression] {
        &self.operands
    }
}

/// Call to a named condition supplied by a [`crate::Registry`]
///
/// The name is looked up on first evaluation and the resolved condition is
/// kept for the lifetime of the node, so later evaluations reuse it even if
/// a different registry is passed in.
pub struct Predicate {
    name: String,
    arguments: Mapping,
    resolved: OnceCell<Arc<dyn Condition>>,
}

impl Predicate {
    pub fn new(name: impl Into<String>, arguments: Mapping) -> Self {
        Self {
            name: name.into(),
            arguments,
            resolved: OnceCell::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Keys of the document node other than `Type`
    pub fn arguments(&self) -> &Mapping {
        &self.arguments
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved.get().is_some()
    }

    pub(crate) fn resolution(&self) -> &OnceCell<Arc<dyn Condition>> {
        &self.resolved
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Predicate")
            .field("name", &self.name)
            .field("arguments", &self.arguments)
            .field("resolved", &self.is_resolved())
            .finish()
    }
}

/// Grammar forms that parse but cannot be evaluated yet
#[derive(Debug, Clone, PartialEq)]
pub enum UnsupportedForm {
    /// `Type` together with `Params`
    ActionCall { name: String, params: Value },
    /// `Sequential` block with its raw body
    Sequential(Value),
    /// `Parallel` block with its raw body
    Parallel(Value),
}

impl UnsupportedForm {
    pub fn description(&self) -> String {
        match self {
            UnsupportedForm::ActionCall { name, .. } => format!("Action call '{}'", name),
            UnsupportedForm::Sequential(_) => "Sequential expression".to_string(),
            UnsupportedForm::Parallel(_) => "Parallel expression".to_string(),
        }
    }
}

impl From<bool> for Literal {
    fn from(value: bool) -> Self {
        Literal::Boolean(value)
    }
}

impl From<f64> for Literal {
    fn from(value: f64) -> Self {
        Literal::Number(value)
    }
}

impl From<Literal> for Node {
    fn from(literal: Literal) -> Self {
        Node::Literal(literal)
    }
}

impl From<Logical> for Node {
    fn from(logical: Logical) -> Self {
        Node::Logical(logical)
    }
}

impl From<Predicate> for Node {
    fn from(predicate: Predicate) -> Self {
        Node::Predicate(predicate)
    }
}

impl From<UnsupportedForm> for Node {
    fn from(form: UnsupportedForm) -> Self {
        Node::Unsupported(form)
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Boolean(b) => write!(f, "{}", b),
            Literal::Number(n) => write!(f, "{}", n),
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Literal(literal) => write!(f, "{}", literal),
            Node::Logical(logical) => {
                write!(f, "({}", logical.operator)?;
                for operand in &logical.operands {
                    write!(f, " {}", operand)?;
                }
                write!(f, ")")
            }
            Node::Predicate(predicate) => write!(f, "(if {})", predicate.name),
            Node::Unsupported(UnsupportedForm::ActionCall { name, .. }) => {
                write!(f, "(change {})", name)
            }
            Node::Unsupported(UnsupportedForm::Sequential(_)) => write!(f, "(sequential)"),
            Node::Unsupported(UnsupportedForm::Parallel(_)) => write!(f, "(parallel)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operator_properties() {
        assert_eq!(Operator::And.keyword(), "All");
        assert_eq!(Operator::Or.keyword(), "Any");
        assert_eq!(Operator::Not.keyword(), "Not");

        assert_eq!(Operator::And.identity(), Some(true));
        assert_eq!(Operator::Or.identity(), Some(false));
        assert_eq!(Operator::Not.identity(), None);

        assert_eq!(Operator::Not.arity(), Some(1));
        assert_eq!(Operator::And.arity(), None);
    }

    #[test]
    fn test_not_requires_single_operand() {
        let operands = vec![Expression::literal(true), Expression::literal(false)];
        let err = Logical::new(Operator::Not, operands).unwrap_err();
        assert!(matches!(
            err,
            ExpressionError::Arity {
                expected: 1,
                found: 2,
                ..
            }
        ));

        assert!(Logical::new(Operator::Not, vec![]).is_err());
        assert!(Logical::new(Operator::Not, vec![Expression::literal(true)]).is_ok());
    }

    #[test]
    fn test_logical_rejects_empty_operand() {
        let err = Logical::new(Operator::And, vec![Expression::default()]).unwrap_err();
        assert!(matches!(err, ExpressionError::EmptyExpression));
    }

    #[test]
    fn test_display() {
        let tree = Expression::make(
            Logical::new(
                Operator::And,
                vec![
                    Expression::make(
                        Logical::new(
                            Operator::Or,
                            vec![Expression::literal(true), Expression::literal(2.5)],
                        )
                        .unwrap(),
                    ),
                    Expression::make(Predicate::new("always_true", Mapping::new())),
                ],
            )
            .unwrap(),
        );
        assert_eq!(tree.to_string(), "(all (any true 2.5) (if always_true))");
    }

    #[test]
    fn test_unsupported_description() {
        let form = UnsupportedForm::ActionCall {
            name: "Accelerate".to_string(),
            params: Value::Null,
        };
        assert_eq!(form.description(), "Action call 'Accelerate'");
        assert_eq!(
            UnsupportedForm::Parallel(Value::Null).description(),
            "Parallel expression"
        );
    }

    #[test]
    fn test_literal_serializes_untagged() {
        assert_eq!(
            serde_json::to_string(&Literal::Boolean(true)).unwrap(),
            "true"
        );
        assert_eq!(serde_json::to_string(&Literal::Number(1.5)).unwrap(), "1.5");
    }
}
