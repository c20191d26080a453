//! Representation literals.
//!
//! A representation is a plain, structurally simple value describing an
//! input or an observed state, independent of any live object identity.
//! Representations compare by value equality and serialize as fixture
//! data.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Graph representation: vertex set plus directed edge set.
///
/// Both sets are ordered so that conversion order and serialized form are
/// deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphRepr {
    pub vertices: BTreeSet<String>,
    pub edges: BTreeSet<(String, String)>,
}

/// A representation literal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Repr {
    /// Absent value (e.g. the runtime state of an empty linked structure).
    Unit,
    Int(i64),
    Str(String),
    /// Ordered element sequence. `None` is the missing-node marker and is
    /// only meaningful in level-order tree form; plain integer sequences
    /// are all-`Some`.
    Seq(Vec<Option<i64>>),
    Graph(GraphRepr),
}

impl Repr {
    /// A plain integer sequence.
    pub fn seq<I: IntoIterator<Item = i64>>(items: I) -> Self {
        Repr::Seq(items.into_iter().map(Some).collect())
    }

    /// A level-order sequence with explicit missing-node markers.
    pub fn level_order<I: IntoIterator<Item = Option<i64>>>(items: I) -> Self {
        Repr::Seq(items.into_iter().collect())
    }

    /// A graph representation from vertex and edge literals.
    pub fn graph<'a, V, E>(vertices: V, edges: E) -> Self
    where
        V: IntoIterator<Item = &'a str>,
        E: IntoIterator<Item = (&'a str, &'a str)>,
    {
        Repr::Graph(GraphRepr {
            vertices: vertices.into_iter().map(str::to_string).collect(),
            edges: edges
                .into_iter()
                .map(|(u, v)| (u.to_string(), v.to_string()))
                .collect(),
        })
    }

    /// The sequence's integer elements, if this is a sequence with no
    /// missing markers.
    pub fn as_plain_seq(&self) -> Option<Vec<i64>> {
        match self {
            Repr::Seq(items) => items.iter().copied().collect(),
            _ => None,
        }
    }

    /// Short shape name for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Repr::Unit => "unit",
            Repr::Int(_) => "int",
            Repr::Str(_) => "string",
            Repr::Seq(_) => "sequence",
            Repr::Graph(_) => "graph",
        }
    }
}
