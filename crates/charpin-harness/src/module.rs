//! The executable-unit boundary: a loaded module as a symbol table.
//!
//! A module is what an evaluation boundary yields from user source: named
//! free functions plus the recognized structure definitions, each callable
//! carrying its declared parameter list. The module never leaks loaded
//! definitions into any shared namespace; its lifetime is one request.

use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

use charpin_core::{Context, NativeFn, StructureBinding, StructureKind};

/// A declared parameter: name plus annotation text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub name: String,
    pub annotation: Option<String>,
}

impl Param {
    pub fn new(name: &str, annotation: &str) -> Self {
        Self {
            name: name.to_string(),
            annotation: Some(annotation.to_string()),
        }
    }

    /// The conventional receiver marker. Receivers carry no annotation.
    pub fn receiver() -> Self {
        Self {
            name: "self".to_string(),
            annotation: None,
        }
    }
}

/// A named callable with its declared signature.
#[derive(Clone)]
pub struct Callable {
    pub name: String,
    pub params: Vec<Param>,
    pub body: NativeFn,
}

impl Callable {
    pub fn new(name: &str, params: Vec<Param>, body: NativeFn) -> Self {
        Self {
            name: name.to_string(),
            params,
            body,
        }
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callable")
            .field("name", &self.name)
            .field("params", &self.params)
            .finish()
    }
}

/// A recognized structure as defined by the module: its constructor and
/// its methods.
#[derive(Clone)]
pub struct StructureDef {
    pub constructor: NativeFn,
    pub methods: BTreeMap<String, Callable>,
}

impl StructureDef {
    pub fn new(constructor: NativeFn) -> Self {
        Self {
            constructor,
            methods: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_method(mut self, method: Callable) -> Self {
        self.methods.insert(method.name.clone(), method);
        self
    }
}

/// The requested target identifier does not exist on the loaded module.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TargetResolutionFault {
    #[error("no function or structure named `{0}` in the loaded module")]
    UnknownTarget(String),
    #[error("`{0}` does not name a recognized structure")]
    UnknownOwner(String),
    #[error("structure `{owner}` has no method `{method}`")]
    UnknownMethod {
        owner: StructureKind,
        method: String,
    },
    #[error("malformed target identifier `{0}`")]
    Malformed(String),
}

/// A resolved capture target.
#[derive(Debug, Clone)]
pub enum Target<'m> {
    Function(&'m Callable),
    Method {
        owner: StructureKind,
        callable: &'m Callable,
    },
}

impl<'m> Target<'m> {
    pub fn callable(&self) -> &'m Callable {
        match self {
            Target::Function(callable) => callable,
            Target::Method { callable, .. } => callable,
        }
    }

    /// The owning structure kind, for method targets.
    pub fn owner(&self) -> Option<StructureKind> {
        match self {
            Target::Function(_) => None,
            Target::Method { owner, .. } => Some(*owner),
        }
    }
}

/// A loaded module: the original source text plus its symbol table.
#[derive(Debug, Default)]
pub struct Module {
    pub source: String,
    functions: BTreeMap<String, Callable>,
    structures: BTreeMap<StructureKind, StructureDef>,
}

impl fmt::Debug for StructureDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StructureDef")
            .field("methods", &self.methods.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Module {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            functions: BTreeMap::new(),
            structures: BTreeMap::new(),
        }
    }

    pub fn add_function(&mut self, callable: Callable) {
        self.functions.insert(callable.name.clone(), callable);
    }

    pub fn add_structure(&mut self, kind: StructureKind, def: StructureDef) {
        self.structures.insert(kind, def);
    }

    pub fn function(&self, name: &str) -> Option<&Callable> {
        self.functions.get(name)
    }

    pub fn structure(&self, kind: StructureKind) -> Option<&StructureDef> {
        self.structures.get(&kind)
    }

    /// Build the per-request context from the structures this module
    /// defines, skipping absent kinds.
    pub fn context(&self) -> Context {
        Context::from_bindings(self.structures.iter().map(|(kind, def)| {
            let mut binding = StructureBinding::new(def.constructor.clone());
            for (name, method) in &def.methods {
                binding = binding.with_method(name, method.body.clone());
            }
            (*kind, binding)
        }))
    }

    /// Resolve a bare callable name or an `Owner.method` qualified name.
    pub fn resolve_target(&self, identifier: &str) -> Result<Target<'_>, TargetResolutionFault> {
        let identifier = identifier.trim();
        if identifier.is_empty() {
            return Err(TargetResolutionFault::Malformed(identifier.to_string()));
        }
        let mut parts = identifier.split('.');
        let head = parts.next().unwrap_or_default();
        match (parts.next(), parts.next()) {
            (None, _) => self
                .functions
                .get(head)
                .map(Target::Function)
                .ok_or_else(|| TargetResolutionFault::UnknownTarget(identifier.to_string())),
            (Some(method), None) => {
                let owner = StructureKind::from_name(head)
                    .ok_or_else(|| TargetResolutionFault::UnknownOwner(head.to_string()))?;
                let def = self
                    .structures
                    .get(&owner)
                    .ok_or_else(|| TargetResolutionFault::UnknownTarget(identifier.to_string()))?;
                let callable = def.methods.get(method).ok_or_else(|| {
                    TargetResolutionFault::UnknownMethod {
                        owner,
                        method: method.to_string(),
                    }
                })?;
                Ok(Target::Method { owner, callable })
            }
            (Some(_), Some(_)) => {
                Err(TargetResolutionFault::Malformed(identifier.to_string()))
            }
        }
    }
}
