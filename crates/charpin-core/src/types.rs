//! Canonical type resolution.
//!
//! Declared annotations are normalized to a closed canonical vocabulary
//! before any registry lookup: optional and box wrappers carry no type
//! identity of their own, and containers resolve at container granularity
//! (element types are never inspected).

use std::fmt;

use thiserror::Error;

/// Recognized structure kinds. This vocabulary is fixed and closed; any
/// structure name outside it is unsupported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StructureKind {
    ListNode,
    TreeNode,
    BinarySearchTree,
    Graph,
    Stack,
    Queue,
}

impl StructureKind {
    /// All recognized kinds, in declaration order.
    pub const ALL: [StructureKind; 6] = [
        StructureKind::ListNode,
        StructureKind::TreeNode,
        StructureKind::BinarySearchTree,
        StructureKind::Graph,
        StructureKind::Stack,
        StructureKind::Queue,
    ];

    /// The declared name of the structure, as it appears in user source.
    pub fn name(self) -> &'static str {
        match self {
            StructureKind::ListNode => "ListNode",
            StructureKind::TreeNode => "TreeNode",
            StructureKind::BinarySearchTree => "BinarySearchTree",
            StructureKind::Graph => "Graph",
            StructureKind::Stack => "Stack",
            StructureKind::Queue => "Queue",
        }
    }

    /// Look a kind up by its declared name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }
}

impl fmt::Display for StructureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Canonical lookup key for the plugin registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CanonicalType {
    /// Primitive integer.
    Int,
    /// Generic sequence container, at container granularity.
    List,
    /// One of the recognized structure kinds.
    Structure(StructureKind),
}

impl fmt::Display for CanonicalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CanonicalType::Int => f.write_str("i64"),
            CanonicalType::List => f.write_str("Vec"),
            CanonicalType::Structure(kind) => f.write_str(kind.name()),
        }
    }
}

/// A declared type that cannot be mapped to the canonical vocabulary.
/// Fatal to the whole capture for the callable that carries it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionError {
    #[error("parameter has no type annotation")]
    Unannotated,
    #[error("unrecognized type annotation `{0}`")]
    Unrecognized(String),
    #[error("malformed type annotation `{0}`")]
    Malformed(String),
}

/// Integer primitive names that resolve to [`CanonicalType::Int`].
const INT_NAMES: [&str; 10] = [
    "i8", "i16", "i32", "i64", "u8", "u16", "u32", "u64", "isize", "usize",
];

/// Resolve a declared annotation to its canonical type.
///
/// `Option<T>` and `Box<T>` unwrap and recurse; `Vec<...>` resolves to the
/// container itself; leading `&`/`&mut` are stripped. Anything outside the
/// canonical vocabulary is a [`ResolutionError`].
pub fn resolve_annotation(annotation: &str) -> Result<CanonicalType, ResolutionError> {
    let text = annotation.trim();
    let text = text
        .strip_prefix("&mut ")
        .or_else(|| text.strip_prefix('&'))
        .unwrap_or(text)
        .trim();

    if text.is_empty() {
        return Err(ResolutionError::Malformed(annotation.to_string()));
    }

    if let Some(open) = text.find('<') {
        let head = text[..open].trim();
        let rest = &text[open + 1..];
        let inner = rest
            .strip_suffix('>')
            .ok_or_else(|| ResolutionError::Malformed(annotation.to_string()))?;
        return match head {
            // Optionality and boxing carry no type identity.
            "Option" | "Box" => resolve_annotation(inner),
            // Container granularity only; never recurse into elements.
            "Vec" => Ok(CanonicalType::List),
            _ => Err(ResolutionError::Unrecognized(annotation.to_string())),
        };
    }

    if INT_NAMES.contains(&text) {
        return Ok(CanonicalType::Int);
    }
    if let Some(kind) = StructureKind::from_name(text) {
        return Ok(CanonicalType::Structure(kind));
    }
    Err(ResolutionError::Unrecognized(annotation.to_string()))
}
