//! The plugin registry.
//!
//! Three parallel mappings keyed by canonical type: input strategies,
//! repr-to-value converters, and value-to-repr serializers. The registry
//! is constructed once at process start and passed down by reference;
//! tests may substitute registries with altered or missing entries.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::context::{Context, ContextError};
use crate::plugins;
use crate::repr::Repr;
use crate::types::{CanonicalType, StructureKind};
use crate::value::{ExecError, Value, ValueKind};

pub type InputStrategyFn = fn() -> Vec<Repr>;
pub type ConverterFn = fn(&Repr, &Context) -> Result<Value, PluginError>;
pub type SerializerFn = fn(&Value, &Context) -> Result<Repr, PluginError>;

/// Registry misconfiguration: a recognized type with no strategy entry.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("no input strategy registered for `{0}`")]
    MissingStrategy(CanonicalType),
}

/// Fault raised by a converter or serializer. Always fatal to the
/// enclosing capture; value-level faults are only recorded as data when
/// the target itself raises them.
#[derive(Debug, Error)]
pub enum PluginError {
    #[error("representation shape mismatch: expected {expected}, got {got}")]
    Shape {
        expected: &'static str,
        got: &'static str,
    },
    #[error("missing-node marker outside a tree representation")]
    StrayMarker,
    #[error("value of kind {0} has no representation")]
    Unrepresentable(&'static str),
    #[error(transparent)]
    Context(#[from] ContextError),
    #[error(transparent)]
    Exec(#[from] ExecError),
}

/// The three plugin mappings.
pub struct PluginRegistry {
    strategies: BTreeMap<CanonicalType, InputStrategyFn>,
    converters: BTreeMap<CanonicalType, ConverterFn>,
    serializers: BTreeMap<CanonicalType, SerializerFn>,
}

impl PluginRegistry {
    /// A registry with no entries at all.
    pub fn empty() -> Self {
        Self {
            strategies: BTreeMap::new(),
            converters: BTreeMap::new(),
            serializers: BTreeMap::new(),
        }
    }

    /// The standard registry covering the full recognized vocabulary.
    pub fn standard() -> Self {
        use CanonicalType::{Int, List, Structure};
        use StructureKind::*;

        let mut registry = Self::empty();

        registry.register_strategy(Int, plugins::int_inputs);
        registry.register_strategy(List, plugins::list_inputs);
        registry.register_strategy(Structure(ListNode), plugins::list_node_inputs);
        registry.register_strategy(Structure(TreeNode), plugins::tree_node_inputs);
        registry.register_strategy(
            Structure(BinarySearchTree),
            plugins::binary_search_tree_inputs,
        );
        registry.register_strategy(Structure(Graph), plugins::graph_inputs);
        registry.register_strategy(Structure(Stack), plugins::stack_inputs);
        registry.register_strategy(Structure(Queue), plugins::queue_inputs);

        registry.register_converter(List, plugins::list_from_repr);
        registry.register_converter(Structure(ListNode), plugins::list_node_from_repr);
        registry.register_converter(Structure(TreeNode), plugins::tree_node_from_repr);
        registry.register_converter(
            Structure(BinarySearchTree),
            plugins::binary_search_tree_from_repr,
        );
        registry.register_converter(Structure(Graph), plugins::graph_from_repr);
        registry.register_converter(Structure(Stack), plugins::stack_from_repr);
        registry.register_converter(Structure(Queue), plugins::queue_from_repr);

        registry.register_serializer(List, plugins::list_to_repr);
        registry.register_serializer(Structure(ListNode), plugins::list_node_to_repr);
        registry.register_serializer(Structure(TreeNode), plugins::tree_node_to_repr);
        registry.register_serializer(
            Structure(BinarySearchTree),
            plugins::binary_search_tree_to_repr,
        );
        registry.register_serializer(Structure(Graph), plugins::graph_to_repr);
        registry.register_serializer(Structure(Stack), plugins::stack_to_repr);
        registry.register_serializer(Structure(Queue), plugins::queue_to_repr);

        // Int has no converter/serializer entries: primitives pass through
        // the identity fallback.
        registry
    }

    pub fn register_strategy(&mut self, ty: CanonicalType, strategy: InputStrategyFn) {
        self.strategies.insert(ty, strategy);
    }

    pub fn register_converter(&mut self, ty: CanonicalType, converter: ConverterFn) {
        self.converters.insert(ty, converter);
    }

    pub fn register_serializer(&mut self, ty: CanonicalType, serializer: SerializerFn) {
        self.serializers.insert(ty, serializer);
    }

    /// The ordered input representations for a type. Deterministic: the
    /// same sequence every call.
    pub fn strategy(&self, ty: CanonicalType) -> Result<Vec<Repr>, RegistryError> {
        let strategy = self
            .strategies
            .get(&ty)
            .ok_or(RegistryError::MissingStrategy(ty))?;
        Ok(strategy())
    }

    /// Convert a representation to a live value. Types without a converter
    /// entry fall back to structural identity.
    pub fn convert(
        &self,
        ty: CanonicalType,
        repr: &Repr,
        ctx: &Context,
    ) -> Result<Value, PluginError> {
        match self.converters.get(&ty) {
            Some(converter) => converter(repr, ctx),
            None => identity_value(repr),
        }
    }

    /// Serialize a live value under a declared type. Types without a
    /// serializer entry fall back to structural identity.
    pub fn serialize(
        &self,
        ty: CanonicalType,
        value: &Value,
        ctx: &Context,
    ) -> Result<Repr, PluginError> {
        match self.serializers.get(&ty) {
            Some(serializer) => serializer(value, ctx),
            None => identity_repr(value),
        }
    }

    /// Serialize a value by its own runtime kind. Return values carry no
    /// declared type, so dispatch is over the closed kind set; kinds with
    /// no canonical type fall back to structural identity.
    pub fn serialize_value(&self, value: &Value, ctx: &Context) -> Result<Repr, PluginError> {
        match canonical_of_kind(value.kind()) {
            Some(ty) => self.serialize(ty, value, ctx),
            None => identity_repr(value),
        }
    }
}

/// The canonical type a runtime kind serializes under, if any.
fn canonical_of_kind(kind: ValueKind) -> Option<CanonicalType> {
    match kind {
        ValueKind::Int => Some(CanonicalType::Int),
        ValueKind::List => Some(CanonicalType::List),
        ValueKind::Structure(structure) => Some(CanonicalType::Structure(structure)),
        ValueKind::Unit | ValueKind::Str | ValueKind::Map => None,
    }
}

/// Structural identity fallback, representation to value.
fn identity_value(repr: &Repr) -> Result<Value, PluginError> {
    match repr {
        Repr::Unit => Ok(Value::Unit),
        Repr::Int(value) => Ok(Value::Int(*value)),
        Repr::Str(value) => Ok(Value::Str(value.clone())),
        Repr::Seq(_) => {
            let items = repr.as_plain_seq().ok_or(PluginError::StrayMarker)?;
            Ok(Value::list(items.into_iter().map(Value::Int)))
        }
        Repr::Graph(_) => Err(PluginError::Shape {
            expected: "identity-convertible representation",
            got: repr.kind_name(),
        }),
    }
}

/// Structural identity fallback, value to representation.
fn identity_repr(value: &Value) -> Result<Repr, PluginError> {
    match value {
        Value::Unit => Ok(Repr::Unit),
        Value::Int(v) => Ok(Repr::Int(*v)),
        Value::Str(v) => Ok(Repr::Str(v.clone())),
        Value::List(items) => {
            let ints: Vec<i64> = items
                .borrow()
                .iter()
                .map(Value::as_int)
                .collect::<Result<_, _>>()
                .map_err(|_| PluginError::Unrepresentable("list of non-integers"))?;
            Ok(Repr::seq(ints))
        }
        Value::Map(_) | Value::Instance(_) => {
            Err(PluginError::Unrepresentable(value.kind_name()))
        }
    }
}
