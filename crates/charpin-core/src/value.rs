//! Live value model for captured executions.
//!
//! The engine manipulates user data through a closed set of runtime kinds
//! rather than ad-hoc class-name lookup. Values are single-threaded and
//! interior-mutable: a callable mutates its arguments in place and the
//! engine observes the after state through the same handles.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use thiserror::Error;

use crate::types::StructureKind;

/// Value-level fault raised while executing or inspecting user data.
///
/// When the fault comes out of the target callable itself it is recorded
/// as snapshot data; anywhere else it is fatal to the capture.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecError {
    #[error("missing field `{field}` on {kind}")]
    MissingField { kind: StructureKind, field: String },
    #[error("expected {expected}, got {actual}")]
    KindMismatch {
        expected: &'static str,
        actual: &'static str,
    },
    #[error("wrong number of arguments: expected {expected}, got {actual}")]
    Arity { expected: usize, actual: usize },
    #[error("{0}")]
    Raised(String),
}

/// A structure instance: a runtime-kind tag plus named fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Instance {
    pub kind: StructureKind,
    pub fields: BTreeMap<String, Value>,
}

impl Instance {
    /// An instance with no fields set yet.
    pub fn new(kind: StructureKind) -> Self {
        Self {
            kind,
            fields: BTreeMap::new(),
        }
    }

    /// An instance with the given fields.
    pub fn with_fields<'a, I>(kind: StructureKind, fields: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, Value)>,
    {
        Self {
            kind,
            fields: fields
                .into_iter()
                .map(|(name, value)| (name.to_string(), value))
                .collect(),
        }
    }
}

/// Runtime kind tag, the dispatch key for serializing values whose type is
/// not statically declared (return values).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Unit,
    Int,
    Str,
    List,
    Map,
    Structure(StructureKind),
}

/// A live runtime value.
///
/// `List`, `Map`, and `Instance` are shared handles: cloning a `Value`
/// aliases the underlying state. Use [`Value::deep_copy`] to sever sharing.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Unit,
    Int(i64),
    Str(String),
    List(Rc<RefCell<Vec<Value>>>),
    Map(Rc<RefCell<BTreeMap<String, Value>>>),
    Instance(Rc<RefCell<Instance>>),
}

impl Value {
    /// A fresh list value.
    pub fn list<I: IntoIterator<Item = Value>>(items: I) -> Self {
        Value::List(Rc::new(RefCell::new(items.into_iter().collect())))
    }

    /// A fresh empty map value.
    pub fn map() -> Self {
        Value::Map(Rc::new(RefCell::new(BTreeMap::new())))
    }

    /// A fresh instance value.
    pub fn instance(instance: Instance) -> Self {
        Value::Instance(Rc::new(RefCell::new(instance)))
    }

    /// The runtime kind of this value.
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Unit => ValueKind::Unit,
            Value::Int(_) => ValueKind::Int,
            Value::Str(_) => ValueKind::Str,
            Value::List(_) => ValueKind::List,
            Value::Map(_) => ValueKind::Map,
            Value::Instance(instance) => ValueKind::Structure(instance.borrow().kind),
        }
    }

    /// Short kind name for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Unit => "unit",
            Value::Int(_) => "int",
            Value::Str(_) => "string",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Instance(_) => "instance",
        }
    }

    pub fn is_unit(&self) -> bool {
        matches!(self, Value::Unit)
    }

    /// A structurally equal value sharing no state with this one.
    pub fn deep_copy(&self) -> Value {
        match self {
            Value::Unit | Value::Int(_) | Value::Str(_) => self.clone(),
            Value::List(items) => Value::list(items.borrow().iter().map(Value::deep_copy)),
            Value::Map(map) => {
                let copied: BTreeMap<String, Value> = map
                    .borrow()
                    .iter()
                    .map(|(key, value)| (key.clone(), value.deep_copy()))
                    .collect();
                Value::Map(Rc::new(RefCell::new(copied)))
            }
            Value::Instance(instance) => {
                let instance = instance.borrow();
                let fields = instance
                    .fields
                    .iter()
                    .map(|(name, value)| (name.clone(), value.deep_copy()))
                    .collect();
                Value::instance(Instance {
                    kind: instance.kind,
                    fields,
                })
            }
        }
    }

    pub fn as_int(&self) -> Result<i64, ExecError> {
        match self {
            Value::Int(value) => Ok(*value),
            other => Err(ExecError::KindMismatch {
                expected: "int",
                actual: other.kind_name(),
            }),
        }
    }

    pub fn as_str(&self) -> Result<String, ExecError> {
        match self {
            Value::Str(value) => Ok(value.clone()),
            other => Err(ExecError::KindMismatch {
                expected: "string",
                actual: other.kind_name(),
            }),
        }
    }

    pub fn as_list(&self) -> Result<Rc<RefCell<Vec<Value>>>, ExecError> {
        match self {
            Value::List(items) => Ok(Rc::clone(items)),
            other => Err(ExecError::KindMismatch {
                expected: "list",
                actual: other.kind_name(),
            }),
        }
    }

    pub fn as_map(&self) -> Result<Rc<RefCell<BTreeMap<String, Value>>>, ExecError> {
        match self {
            Value::Map(map) => Ok(Rc::clone(map)),
            other => Err(ExecError::KindMismatch {
                expected: "map",
                actual: other.kind_name(),
            }),
        }
    }

    pub fn as_instance(&self) -> Result<Rc<RefCell<Instance>>, ExecError> {
        match self {
            Value::Instance(instance) => Ok(Rc::clone(instance)),
            other => Err(ExecError::KindMismatch {
                expected: "instance",
                actual: other.kind_name(),
            }),
        }
    }

    /// Read a named field of an instance value.
    pub fn get_field(&self, field: &str) -> Result<Value, ExecError> {
        let instance = self.as_instance()?;
        let instance = instance.borrow();
        instance
            .fields
            .get(field)
            .cloned()
            .ok_or_else(|| ExecError::MissingField {
                kind: instance.kind,
                field: field.to_string(),
            })
    }

    /// Write a named field of an instance value.
    pub fn set_field(&self, field: &str, value: Value) -> Result<(), ExecError> {
        let instance = self.as_instance()?;
        instance.borrow_mut().fields.insert(field.to_string(), value);
        Ok(())
    }
}
