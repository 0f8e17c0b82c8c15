// SPDX-License-Identifier: MIT

//! Shared handle over expression nodes

use super::ast::{Literal, Node};
use std::fmt;
use std::sync::Arc;

/// Handle to a node of a condition tree
///
/// Cloning a handle shares the node instead of copying it; the node is
/// dropped together with the last handle that refers to it. Nodes are never
/// mutated through a handle, and counting is atomic, so trees can be sent
/// across threads. A default handle owns no node and fails to evaluate with
/// [`crate::ExpressionError::EmptyExpression`].
#[derive(Clone, Default)]
pub struct Expression {
    node: Option<Arc<Node>>,
}

impl Expression {
    /// Wrap a freshly built node in a new handle
    pub fn make(node: impl Into<Node>) -> Self {
        Self {
            node: Some(Arc::new(node.into())),
        }
    }

    pub fn literal(value: impl Into<Literal>) -> Self {
        Self::make(value.into())
    }

    pub fn node(&self) -> Option<&Node> {
        self.node.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.node.is_none()
    }

    /// Literal value carried by this handle, if it holds one
    pub fn as_literal(&self) -> Option<Literal> {
        match self.node() {
            Some(Node::Literal(literal)) => Some(*literal),
            _ => None,
        }
    }

    /// Number of handles sharing this node (0 for an empty handle)
    pub fn reference_count(&self) -> usize {
        self.node.as_ref().map_or(0, Arc::strong_count)
    }

    /// Whether both handles refer to the same node
    pub fn ptr_eq(&self, other: &Expression) -> bool {
        match (&self.node, &other.node) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        }
    }
}

impl From<Literal> for Expression {
    fn from(literal: Literal) -> Self {
        Self::make(literal)
    }
}

impl fmt::Debug for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.node() {
            Some(node) => fmt::Debug::fmt(node, f),
            None => write!(f, "Expression(empty)"),
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.node() {
            Some(node) => write!(f, "{}", node),
            None => write!(f, "()"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_empty() {
        let expr = Expression::default();
        assert!(expr.is_empty());
        assert_eq!(expr.reference_count(), 0);
        assert!(expr.node().is_none());
        assert_eq!(expr.to_string(), "()");
    }

    #[test]
    fn test_clone_shares_node() {
        let original = Expression::literal(true);
        assert_eq!(original.reference_count(), 1);

        let copy = original.clone();
        assert!(copy.ptr_eq(&original));
        assert_eq!(original.reference_count(), 2);

        drop(copy);
        assert_eq!(original.reference_count(), 1);
    }

    #[test]
    fn test_assignment_releases_previous_node() {
        let first = Expression::literal(1.0);
        let second = Expression::literal(2.0);

        let mut slot = first.clone();
        assert!(slot.ptr_eq(&first));
        assert_eq!(first.reference_count(), 2);

        slot = second.clone();
        assert_eq!(first.reference_count(), 1);
        assert_eq!(second.reference_count(), 2);
        assert_eq!(slot.as_literal(), Some(Literal::Number(2.0)));
    }

    #[test]
    fn test_copy_survives_original() {
        let copy = {
            let original = Expression::literal(false);
            original.clone()
        };
        assert_eq!(copy.reference_count(), 1);
        assert_eq!(copy.as_literal(), Some(Literal::Boolean(false)));
    }

    #[test]
    fn test_handles_cross_threads() {
        let expr = Expression::literal(3.0);
        let shared = expr.clone();
        let value = std::thread::spawn(move || shared.as_literal())
            .join()
            .unwrap();
        assert_eq!(value, Some(Literal::Number(3.0)));
        assert_eq!(expr.reference_count(), 1);
    }
}
