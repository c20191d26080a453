//! Structure-specific plugins: input strategies, converters, serializers.
//!
//! Converters build live values from representation literals through the
//! context's constructors and methods; serializers reduce live values back
//! to representations. Converters never mutate the representation and
//! serializers never mutate the value; for every representation an input
//! strategy yields, `serialize(convert(r)) == r`.

use std::collections::VecDeque;

use crate::context::Context;
use crate::registry::PluginError;
use crate::repr::{GraphRepr, Repr};
use crate::types::StructureKind;
use crate::value::Value;

// ---------------------------------------------------------------------------
// Input strategies
// ---------------------------------------------------------------------------

pub fn int_inputs() -> Vec<Repr> {
    vec![Repr::Int(3), Repr::Int(99)]
}

pub fn list_inputs() -> Vec<Repr> {
    vec![Repr::seq([1, 1, 2, 3, 3]), Repr::seq([]), Repr::seq([5])]
}

pub fn list_node_inputs() -> Vec<Repr> {
    vec![Repr::seq([1, 2, 3]), Repr::seq([5]), Repr::seq([])]
}

pub fn tree_node_inputs() -> Vec<Repr> {
    vec![
        Repr::seq([1, 2, 3]),
        Repr::level_order([Some(1), None, Some(2)]),
        Repr::seq([]),
    ]
}

/// Insertion sequences chosen to be level-order-complete, so that the
/// insert-then-serialize round trip reproduces the input exactly.
pub fn binary_search_tree_inputs() -> Vec<Repr> {
    vec![Repr::seq([10, 5, 15, 2, 7, 12, 20]), Repr::seq([])]
}

pub fn graph_inputs() -> Vec<Repr> {
    vec![
        Repr::graph(["A", "B", "C"], [("A", "B"), ("B", "C")]),
        Repr::graph([], []),
    ]
}

pub fn stack_inputs() -> Vec<Repr> {
    vec![Repr::seq([1, 2]), Repr::seq([])]
}

pub fn queue_inputs() -> Vec<Repr> {
    vec![Repr::seq([10, 20]), Repr::seq([])]
}

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

fn plain_seq(repr: &Repr) -> Result<Vec<i64>, PluginError> {
    match repr {
        Repr::Seq(_) => repr.as_plain_seq().ok_or(PluginError::StrayMarker),
        other => Err(PluginError::Shape {
            expected: "sequence",
            got: other.kind_name(),
        }),
    }
}

fn level_seq(repr: &Repr) -> Result<Vec<Option<i64>>, PluginError> {
    match repr {
        Repr::Seq(items) => Ok(items.clone()),
        other => Err(PluginError::Shape {
            expected: "sequence",
            got: other.kind_name(),
        }),
    }
}

/// Build a singly-linked chain through the context constructor.
pub fn build_chain(items: &[i64], ctx: &Context) -> Result<Value, PluginError> {
    let mut head = Value::Unit;
    for &val in items.iter().rev() {
        let node = ctx.construct(StructureKind::ListNode, &[Value::Int(val)])?;
        node.set_field("next", head)?;
        head = node;
    }
    Ok(head)
}

/// Walk a linked chain back to its ordered element sequence.
pub fn flatten_chain(head: &Value) -> Result<Vec<i64>, PluginError> {
    let mut items = Vec::new();
    let mut curr = head.clone();
    while !curr.is_unit() {
        items.push(curr.get_field("val")?.as_int()?);
        curr = curr.get_field("next")?;
    }
    Ok(items)
}

/// Build a binary tree from a level-order sequence with missing markers.
pub fn build_level_order(items: &[Option<i64>], ctx: &Context) -> Result<Value, PluginError> {
    let Some(Some(root_val)) = items.first() else {
        return Ok(Value::Unit);
    };
    let root = ctx.construct(StructureKind::TreeNode, &[Value::Int(*root_val)])?;
    let mut queue = VecDeque::from([root.clone()]);
    let mut i = 1;
    while let Some(node) = queue.pop_front() {
        if i >= items.len() {
            break;
        }
        if let Some(val) = items[i] {
            let left = ctx.construct(StructureKind::TreeNode, &[Value::Int(val)])?;
            node.set_field("left", left.clone())?;
            queue.push_back(left);
        }
        i += 1;
        if i < items.len() {
            if let Some(val) = items[i] {
                let right = ctx.construct(StructureKind::TreeNode, &[Value::Int(val)])?;
                node.set_field("right", right.clone())?;
                queue.push_back(right);
            }
            i += 1;
        }
    }
    Ok(root)
}

/// Flatten a tree to level order, trimming trailing missing markers.
///
/// The trim is a normalization, not a loss: marker placement beyond the
/// last present node is not semantically distinguishable.
pub fn flatten_level_order(root: &Value) -> Result<Vec<Option<i64>>, PluginError> {
    if root.is_unit() {
        return Ok(Vec::new());
    }
    let mut out = Vec::new();
    let mut queue = VecDeque::from([root.clone()]);
    while let Some(node) = queue.pop_front() {
        if node.is_unit() {
            out.push(None);
            continue;
        }
        out.push(Some(node.get_field("val")?.as_int()?));
        queue.push_back(node.get_field("left")?);
        queue.push_back(node.get_field("right")?);
    }
    while matches!(out.last(), Some(None)) {
        out.pop();
    }
    Ok(out)
}

// ---------------------------------------------------------------------------
// Converters and serializers
// ---------------------------------------------------------------------------

pub fn list_node_from_repr(repr: &Repr, ctx: &Context) -> Result<Value, PluginError> {
    build_chain(&plain_seq(repr)?, ctx)
}

pub fn list_node_to_repr(value: &Value, _ctx: &Context) -> Result<Repr, PluginError> {
    Ok(Repr::seq(flatten_chain(value)?))
}

pub fn list_from_repr(repr: &Repr, _ctx: &Context) -> Result<Value, PluginError> {
    Ok(Value::list(plain_seq(repr)?.into_iter().map(Value::Int)))
}

pub fn list_to_repr(value: &Value, _ctx: &Context) -> Result<Repr, PluginError> {
    let items = value.as_list()?;
    let items = items.borrow();
    let ints: Vec<i64> = items
        .iter()
        .map(Value::as_int)
        .collect::<Result<_, _>>()?;
    Ok(Repr::seq(ints))
}

pub fn tree_node_from_repr(repr: &Repr, ctx: &Context) -> Result<Value, PluginError> {
    build_level_order(&level_seq(repr)?, ctx)
}

pub fn tree_node_to_repr(value: &Value, _ctx: &Context) -> Result<Repr, PluginError> {
    Ok(Repr::level_order(flatten_level_order(value)?))
}

/// Construct an empty tree and apply the user's `insert` per element, in
/// sequence order.
pub fn binary_search_tree_from_repr(repr: &Repr, ctx: &Context) -> Result<Value, PluginError> {
    let items = plain_seq(repr)?;
    let tree = ctx.construct(StructureKind::BinarySearchTree, &[])?;
    for val in items {
        ctx.call_method(
            StructureKind::BinarySearchTree,
            "insert",
            &[tree.clone(), Value::Int(val)],
        )?;
    }
    Ok(tree)
}

pub fn binary_search_tree_to_repr(value: &Value, _ctx: &Context) -> Result<Repr, PluginError> {
    let root = value.get_field("root")?;
    Ok(Repr::level_order(flatten_level_order(&root)?))
}

/// Add vertices, then edges, both in sorted order, through the user's
/// `add_vertex`/`add_edge`.
pub fn graph_from_repr(repr: &Repr, ctx: &Context) -> Result<Value, PluginError> {
    let Repr::Graph(graph_repr) = repr else {
        return Err(PluginError::Shape {
            expected: "graph",
            got: repr.kind_name(),
        });
    };
    let graph = ctx.construct(StructureKind::Graph, &[])?;
    for vertex in &graph_repr.vertices {
        ctx.call_method(
            StructureKind::Graph,
            "add_vertex",
            &[graph.clone(), Value::Str(vertex.clone())],
        )?;
    }
    for (u, v) in &graph_repr.edges {
        ctx.call_method(
            StructureKind::Graph,
            "add_edge",
            &[graph.clone(), Value::Str(u.clone()), Value::Str(v.clone())],
        )?;
    }
    Ok(graph)
}

/// Reconstruct vertex and edge sets from the `adj` adjacency field.
pub fn graph_to_repr(value: &Value, _ctx: &Context) -> Result<Repr, PluginError> {
    let adj = value.get_field("adj")?.as_map()?;
    let adj = adj.borrow();
    let mut graph_repr = GraphRepr::default();
    for (vertex, neighbors) in adj.iter() {
        graph_repr.vertices.insert(vertex.clone());
        let neighbors = neighbors.as_list()?;
        for neighbor in neighbors.borrow().iter() {
            graph_repr
                .edges
                .insert((vertex.clone(), neighbor.as_str()?));
        }
    }
    Ok(Repr::Graph(graph_repr))
}

pub fn stack_from_repr(repr: &Repr, ctx: &Context) -> Result<Value, PluginError> {
    apply_in_order(repr, ctx, StructureKind::Stack, "push")
}

/// The backing sequence in its natural order: insertion order, not pop
/// order.
pub fn stack_to_repr(value: &Value, ctx: &Context) -> Result<Repr, PluginError> {
    items_field_to_repr(value, ctx)
}

pub fn queue_from_repr(repr: &Repr, ctx: &Context) -> Result<Value, PluginError> {
    apply_in_order(repr, ctx, StructureKind::Queue, "enqueue")
}

pub fn queue_to_repr(value: &Value, ctx: &Context) -> Result<Repr, PluginError> {
    items_field_to_repr(value, ctx)
}

fn apply_in_order(
    repr: &Repr,
    ctx: &Context,
    kind: StructureKind,
    method: &str,
) -> Result<Value, PluginError> {
    let items = plain_seq(repr)?;
    let target = ctx.construct(kind, &[])?;
    for val in items {
        ctx.call_method(kind, method, &[target.clone(), Value::Int(val)])?;
    }
    Ok(target)
}

fn items_field_to_repr(value: &Value, _ctx: &Context) -> Result<Repr, PluginError> {
    let instance = value.as_instance()?;
    let instance = instance.borrow();
    let Some(items) = instance.fields.get("items") else {
        // No backing field yet reads as empty.
        return Ok(Repr::seq([]));
    };
    let items = items.as_list()?;
    let ints: Vec<i64> = items
        .borrow()
        .iter()
        .map(Value::as_int)
        .collect::<Result<_, _>>()?;
    Ok(Repr::seq(ints))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::reference_context;

    #[test]
    fn test_chain_round_trip() {
        let ctx = reference_context();
        for repr in list_node_inputs() {
            let value = list_node_from_repr(&repr, &ctx).unwrap();
            assert_eq!(list_node_to_repr(&value, &ctx).unwrap(), repr);
        }
    }

    #[test]
    fn test_empty_chain_is_unit() {
        let ctx = reference_context();
        let value = list_node_from_repr(&Repr::seq([]), &ctx).unwrap();
        assert!(value.is_unit());
    }

    #[test]
    fn test_tree_round_trip_with_markers() {
        let ctx = reference_context();
        for repr in tree_node_inputs() {
            let value = tree_node_from_repr(&repr, &ctx).unwrap();
            assert_eq!(tree_node_to_repr(&value, &ctx).unwrap(), repr);
        }
    }

    #[test]
    fn test_bst_insertion_drops_trailing_markers() {
        let ctx = reference_context();
        let tree =
            binary_search_tree_from_repr(&Repr::seq([10, 5, 15, 12, 20]), &ctx).unwrap();
        assert_eq!(
            binary_search_tree_to_repr(&tree, &ctx).unwrap(),
            Repr::level_order([
                Some(10),
                Some(5),
                Some(15),
                None,
                None,
                Some(12),
                Some(20)
            ])
        );
    }

    #[test]
    fn test_stack_serializes_in_insertion_order() {
        let ctx = reference_context();
        let stack = stack_from_repr(&Repr::seq([1, 2]), &ctx).unwrap();
        assert_eq!(stack_to_repr(&stack, &ctx).unwrap(), Repr::seq([1, 2]));
    }

    #[test]
    fn test_graph_round_trip() {
        let ctx = reference_context();
        for repr in graph_inputs() {
            let value = graph_from_repr(&repr, &ctx).unwrap();
            assert_eq!(graph_to_repr(&value, &ctx).unwrap(), repr);
        }
    }

    #[test]
    fn test_marker_outside_tree_is_rejected() {
        let ctx = reference_context();
        let repr = Repr::level_order([Some(1), None]);
        assert!(matches!(
            list_node_from_repr(&repr, &ctx),
            Err(PluginError::StrayMarker)
        ));
    }

    #[test]
    fn test_converter_does_not_mutate_repr() {
        let ctx = reference_context();
        let repr = Repr::seq([1, 2, 3]);
        let before = repr.clone();
        let _ = list_node_from_repr(&repr, &ctx).unwrap();
        assert_eq!(repr, before);
    }
}
