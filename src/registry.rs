// SPDX-License-Identifier: MIT

//! Lookup of named conditions referenced by `Type` nodes

use crate::error::{BoxError, ExpressionError, Result};
use crate::expression::{Expression, Literal, Node};
use serde_yaml::Mapping;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, PoisonError, RwLock};

/// A named check that can be called from a condition document.
///
/// `arguments` holds every key of the calling node except `Type`, so a
/// condition can read its own configuration from the document.
pub trait Condition: Send + Sync {
    fn call(&self, arguments: &Mapping) -> std::result::Result<Literal, BoxError>;
}

/// Source of conditions, injected into evaluation
pub trait Registry {
    /// Names of every condition this registry can resolve, in a stable order
    fn declared_names(&self) -> Vec<String>;

    /// Find the condition registered under `name`
    fn resolve(&self, name: &str) -> Result<Arc<dyn Condition>>;
}

/// Adapter turning a closure into a [`Condition`]
struct FnCondition<F>(F);

impl<F> Condition for FnCondition<F>
where
    F: Fn(&Mapping) -> std::result::Result<Literal, BoxError> + Send + Sync,
{
    fn call(&self, arguments: &Mapping) -> std::result::Result<Literal, BoxError> {
        (self.0)(arguments)
    }
}

/// In-memory registry; clones share the same table
#[derive(Clone, Default)]
pub struct ConditionRegistry {
    conditions: Arc<RwLock<BTreeMap<String, Arc<dyn Condition>>>>,
}

impl ConditionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, name: impl Into<String>, condition: Arc<dyn Condition>) {
        let name = name.into();
        log::debug!("Registered condition: {}", name);
        let mut conditions = self
            .conditions
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        conditions.insert(name, condition);
    }

    /// Register a closure as a condition
    pub fn register_fn<F>(&self, name: impl Into<String>, f: F)
    where
        F: Fn(&Mapping) -> std::result::Result<Literal, BoxError> + Send + Sync + 'static,
    {
        self.register(name, Arc::new(FnCondition(f)));
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Condition>> {
        let conditions = self
            .conditions
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        conditions.get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.conditions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Registry for ConditionRegistry {
    fn declared_names(&self) -> Vec<String> {
        let conditions = self
            .conditions
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        conditions.keys().cloned().collect()
    }

    fn resolve(&self, name: &str) -> Result<Arc<dyn Condition>> {
        self.get(name)
            .ok_or_else(|| ExpressionError::resolution(name))
    }
}

/// Check up front that every condition named in `expr` is declared by
/// `registry`, reporting the first missing one in document order.
pub fn validate(expr: &Expression, registry: &dyn Registry) -> Result<()> {
    let declared: BTreeSet<String> = registry.declared_names().into_iter().collect();
    validate_against(expr, &declared)
}

fn validate_against(expr: &Expression, declared: &BTreeSet<String>) -> Result<()> {
    match expr.node() {
        None => Err(ExpressionError::EmptyExpression),
        Some(Node::Logical(logical)) => logical
            .operands()
            .iter()
            .try_for_each(|operand| validate_against(operand, declared)),
        Some(Node::Predicate(predicate)) if !declared.contains(predicate.name()) => {
            log::warn!("Condition '{}' is not declared", predicate.name());
            Err(ExpressionError::resolution(predicate.name()))
        }
        Some(_) => Ok(()),
    }
}
