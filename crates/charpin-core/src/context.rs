//! Per-request binding of recognized structure kinds to live constructors.
//!
//! The context is an explicit, immutable value passed by reference to
//! every converter and serializer call. It is built once per generation
//! request from the freshly loaded user module and never shared across
//! requests.

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use thiserror::Error;

use crate::types::StructureKind;
use crate::value::{ExecError, Value};

/// A native callable over live values. Arguments are passed by handle;
/// receivers are mutated through interior mutability.
pub type NativeFn = Rc<dyn Fn(&[Value]) -> Result<Value, ExecError>>;

/// A structure kind the context cannot satisfy.
#[derive(Debug, Error)]
pub enum ContextError {
    #[error("structure `{0}` is not bound in this context")]
    MissingStructure(StructureKind),
    #[error("structure `{kind}` has no method `{method}` bound")]
    MissingMethod {
        kind: StructureKind,
        method: String,
    },
    #[error(transparent)]
    Exec(#[from] ExecError),
}

/// Constructor plus the methods conversion relies on, for one structure
/// kind.
#[derive(Clone)]
pub struct StructureBinding {
    pub construct: NativeFn,
    pub methods: BTreeMap<String, NativeFn>,
}

impl StructureBinding {
    /// A binding with a constructor and no methods.
    pub fn new(construct: NativeFn) -> Self {
        Self {
            construct,
            methods: BTreeMap::new(),
        }
    }

    /// Add a named method to the binding.
    #[must_use]
    pub fn with_method(mut self, name: &str, method: NativeFn) -> Self {
        self.methods.insert(name.to_string(), method);
        self
    }
}

/// Immutable per-request mapping from structure kinds to their bindings.
#[derive(Clone, Default)]
pub struct Context {
    bindings: BTreeMap<StructureKind, StructureBinding>,
}

impl Context {
    /// An empty context (no structures bound).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a context from kind/binding pairs.
    pub fn from_bindings<I>(bindings: I) -> Self
    where
        I: IntoIterator<Item = (StructureKind, StructureBinding)>,
    {
        Self {
            bindings: bindings.into_iter().collect(),
        }
    }

    /// Whether the given kind is bound.
    pub fn contains(&self, kind: StructureKind) -> bool {
        self.bindings.contains_key(&kind)
    }

    /// The kinds bound in this context, in order.
    pub fn kinds(&self) -> impl Iterator<Item = StructureKind> + '_ {
        self.bindings.keys().copied()
    }

    /// Construct a live instance of the given kind.
    pub fn construct(&self, kind: StructureKind, args: &[Value]) -> Result<Value, ContextError> {
        let binding = self
            .bindings
            .get(&kind)
            .ok_or(ContextError::MissingStructure(kind))?;
        Ok((binding.construct)(args)?)
    }

    /// Invoke a bound structure method. `args[0]` is the receiver.
    pub fn call_method(
        &self,
        kind: StructureKind,
        method: &str,
        args: &[Value],
    ) -> Result<Value, ContextError> {
        let binding = self
            .bindings
            .get(&kind)
            .ok_or(ContextError::MissingStructure(kind))?;
        let method_fn = binding
            .methods
            .get(method)
            .ok_or_else(|| ContextError::MissingMethod {
                kind,
                method: method.to_string(),
            })?;
        Ok(method_fn(args)?)
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("kinds", &self.bindings.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Instance;

    fn counter_binding() -> StructureBinding {
        StructureBinding::new(Rc::new(|_args| {
            Ok(Value::instance(Instance::with_fields(
                StructureKind::Stack,
                [("items", Value::list([]))],
            )))
        }))
        .with_method(
            "push",
            Rc::new(|args| {
                let items = args[0].get_field("items")?.as_list()?;
                items.borrow_mut().push(args[1].clone());
                Ok(Value::Unit)
            }),
        )
    }

    #[test]
    fn test_construct_and_call() {
        let ctx = Context::from_bindings([(StructureKind::Stack, counter_binding())]);
        let stack = ctx.construct(StructureKind::Stack, &[]).unwrap();
        ctx.call_method(
            StructureKind::Stack,
            "push",
            &[stack.clone(), Value::Int(1)],
        )
        .unwrap();
        let items = stack.get_field("items").unwrap().as_list().unwrap();
        assert_eq!(items.borrow().len(), 1);
    }

    #[test]
    fn test_missing_structure_is_reported() {
        let ctx = Context::empty();
        assert!(matches!(
            ctx.construct(StructureKind::Graph, &[]),
            Err(ContextError::MissingStructure(StructureKind::Graph))
        ));
    }

    #[test]
    fn test_missing_method_is_reported() {
        let ctx = Context::from_bindings([(StructureKind::Stack, counter_binding())]);
        let stack = ctx.construct(StructureKind::Stack, &[]).unwrap();
        assert!(matches!(
            ctx.call_method(StructureKind::Stack, "pop", &[stack]),
            Err(ContextError::MissingMethod { .. })
        ));
    }
}
