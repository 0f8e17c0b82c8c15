// SPDX-License-Identifier: MIT

//! Expression evaluation

use super::ast::{Literal, Logical, Node, Predicate};
use super::Expression;
use crate::error::{ExpressionError, Result};
use crate::registry::Registry;

/// Truthiness of an evaluated result.
///
/// A boolean `false` literal is false; every other node is true. An empty
/// handle is an error rather than a falsy value.
pub fn to_boolean(expr: &Expression) -> Result<bool> {
    match expr.node() {
        None => Err(ExpressionError::EmptyExpression),
        Some(Node::Literal(Literal::Boolean(false))) => Ok(false),
        Some(_) => Ok(true),
    }
}

impl Expression {
    /// Reduce the tree to a result, calling named conditions through `registry`.
    ///
    /// Literals evaluate to a handle sharing their own node. Logical nodes
    /// stop at the first operand that decides the outcome.
    pub fn evaluate(&self, registry: &dyn Registry) -> Result<Expression> {
        let node = self.node().ok_or(ExpressionError::EmptyExpression)?;
        match node {
            Node::Literal(_) => Ok(self.clone()),
            Node::Logical(logical) => evaluate_logical(logical, registry).map(Expression::literal),
            Node::Predicate(predicate) => {
                call_predicate(predicate, registry).map(Expression::literal)
            }
            Node::Unsupported(form) => Err(ExpressionError::unsupported(form.description())),
        }
    }

    /// Evaluate and convert the result with [`to_boolean`]
    pub fn test(&self, registry: &dyn Registry) -> Result<bool> {
        to_boolean(&self.evaluate(registry)?)
    }
}

fn evaluate_logical(logical: &Logical, registry: &dyn Registry) -> Result<bool> {
    let operator = logical.operator();
    match operator.identity() {
        Some(identity) => {
            for (i, operand) in logical.operands().iter().enumerate() {
                if operand.test(registry)? != identity {
                    log::trace!("{} decided by operand {}", operator.keyword(), i);
                    return Ok(!identity);
                }
            }
            Ok(identity)
        }
        None => match logical.operands() {
            [operand] => Ok(!operand.test(registry)?),
            operands => Err(ExpressionError::arity(operator.keyword(), 1, operands.len())),
        },
    }
}

fn call_predicate(predicate: &Predicate, registry: &dyn Registry) -> Result<Literal> {
    let name = predicate.name();
    let condition = predicate
        .resolution()
        .get_or_try_init(|| {
            log::trace!("Resolving condition '{}'", name);
            registry.resolve(name)
        })
        .map_err(|err| {
            log::warn!("Failed to resolve condition '{}': {}", name, err);
            err
        })?;

    let result = condition
        .call(predicate.arguments())
        .map_err(|err| ExpressionError::condition(name, err))?;
    log::trace!("Condition '{}' returned {}", name, result);
    Ok(result)
}
