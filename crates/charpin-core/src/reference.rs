//! Reference bindings for the recognized structure kinds.
//!
//! These are the in-repo implementations a loader binds into a context
//! when no external evaluation of user source is available: plain field
//! layouts matching what the structure plugins read (`val`/`next`,
//! `val`/`left`/`right`, `root`, `adj`, `items`), plus a small corpus of
//! free functions used as capture targets by the CLI, benches, and tests.

use std::rc::Rc;

use crate::context::{Context, NativeFn, StructureBinding};
use crate::types::StructureKind;
use crate::value::{ExecError, Instance, Value};

fn expect_args(args: &[Value], expected: usize) -> Result<(), ExecError> {
    if args.len() == expected {
        Ok(())
    } else {
        Err(ExecError::Arity {
            expected,
            actual: args.len(),
        })
    }
}

// ---------------------------------------------------------------------------
// Constructors
// ---------------------------------------------------------------------------

/// `ListNode(val)` with a unit `next`.
pub fn list_node_constructor() -> NativeFn {
    Rc::new(|args| {
        expect_args(args, 1)?;
        Ok(Value::instance(Instance::with_fields(
            StructureKind::ListNode,
            [("val", args[0].clone()), ("next", Value::Unit)],
        )))
    })
}

/// `TreeNode(val)` with unit children.
pub fn tree_node_constructor() -> NativeFn {
    Rc::new(|args| {
        expect_args(args, 1)?;
        Ok(Value::instance(Instance::with_fields(
            StructureKind::TreeNode,
            [
                ("val", args[0].clone()),
                ("left", Value::Unit),
                ("right", Value::Unit),
            ],
        )))
    })
}

/// `BinarySearchTree()` with a unit `root`.
pub fn binary_search_tree_constructor() -> NativeFn {
    Rc::new(|args| {
        expect_args(args, 0)?;
        Ok(Value::instance(Instance::with_fields(
            StructureKind::BinarySearchTree,
            [("root", Value::Unit)],
        )))
    })
}

/// `Graph()` with an empty `adj` map.
pub fn graph_constructor() -> NativeFn {
    Rc::new(|args| {
        expect_args(args, 0)?;
        Ok(Value::instance(Instance::with_fields(
            StructureKind::Graph,
            [("adj", Value::map())],
        )))
    })
}

/// `Stack()` with an empty `items` list.
pub fn stack_constructor() -> NativeFn {
    Rc::new(|args| {
        expect_args(args, 0)?;
        Ok(Value::instance(Instance::with_fields(
            StructureKind::Stack,
            [("items", Value::list([]))],
        )))
    })
}

/// `Queue()` with an empty `items` list.
pub fn queue_constructor() -> NativeFn {
    Rc::new(|args| {
        expect_args(args, 0)?;
        Ok(Value::instance(Instance::with_fields(
            StructureKind::Queue,
            [("items", Value::list([]))],
        )))
    })
}

// ---------------------------------------------------------------------------
// Methods
// ---------------------------------------------------------------------------

/// `BinarySearchTree.insert(self, val)`: standard leaf insertion;
/// duplicates go right.
pub fn bst_insert() -> NativeFn {
    Rc::new(|args| {
        expect_args(args, 2)?;
        let tree = &args[0];
        let val = args[1].as_int()?;
        let fresh = Value::instance(Instance::with_fields(
            StructureKind::TreeNode,
            [
                ("val", Value::Int(val)),
                ("left", Value::Unit),
                ("right", Value::Unit),
            ],
        ));

        let mut curr = tree.get_field("root")?;
        if curr.is_unit() {
            tree.set_field("root", fresh)?;
            return Ok(Value::Unit);
        }
        loop {
            let side = if val < curr.get_field("val")?.as_int()? {
                "left"
            } else {
                "right"
            };
            let child = curr.get_field(side)?;
            if child.is_unit() {
                curr.set_field(side, fresh)?;
                return Ok(Value::Unit);
            }
            curr = child;
        }
    })
}

/// `Graph.add_vertex(self, v)`: idempotent vertex insertion.
pub fn graph_add_vertex() -> NativeFn {
    Rc::new(|args| {
        expect_args(args, 2)?;
        let adj = args[0].get_field("adj")?.as_map()?;
        let vertex = args[1].as_str()?;
        adj.borrow_mut().entry(vertex).or_insert_with(|| Value::list([]));
        Ok(Value::Unit)
    })
}

/// `Graph.add_edge(self, u, v)`: directed edge; missing endpoints are
/// added as vertices.
pub fn graph_add_edge() -> NativeFn {
    Rc::new(|args| {
        expect_args(args, 3)?;
        let adj = args[0].get_field("adj")?.as_map()?;
        let from = args[1].as_str()?;
        let to = args[2].as_str()?;
        let mut adj = adj.borrow_mut();
        adj.entry(to.clone()).or_insert_with(|| Value::list([]));
        let neighbors = adj.entry(from).or_insert_with(|| Value::list([]));
        neighbors.as_list()?.borrow_mut().push(Value::Str(to));
        Ok(Value::Unit)
    })
}

/// `Graph.max_degree(self)`: largest out-degree; raises on an empty graph.
pub fn graph_max_degree() -> NativeFn {
    Rc::new(|args| {
        expect_args(args, 1)?;
        let adj = args[0].get_field("adj")?.as_map()?;
        let adj = adj.borrow();
        if adj.is_empty() {
            return Err(ExecError::Raised("max_degree on empty graph".to_string()));
        }
        let mut max = 0;
        for neighbors in adj.values() {
            max = max.max(neighbors.as_list()?.borrow().len() as i64);
        }
        Ok(Value::Int(max))
    })
}

/// `Stack.push(self, val)`.
pub fn stack_push() -> NativeFn {
    Rc::new(|args| {
        expect_args(args, 2)?;
        let items = args[0].get_field("items")?.as_list()?;
        items.borrow_mut().push(args[1].clone());
        Ok(Value::Unit)
    })
}

/// `Stack.pop(self)`: raises on an empty stack.
pub fn stack_pop() -> NativeFn {
    Rc::new(|args| {
        expect_args(args, 1)?;
        let items = args[0].get_field("items")?.as_list()?;
        let mut items = items.borrow_mut();
        items
            .pop()
            .ok_or_else(|| ExecError::Raised("pop from empty stack".to_string()))
    })
}

/// `Queue.enqueue(self, val)`.
pub fn queue_enqueue() -> NativeFn {
    Rc::new(|args| {
        expect_args(args, 2)?;
        let items = args[0].get_field("items")?.as_list()?;
        items.borrow_mut().push(args[1].clone());
        Ok(Value::Unit)
    })
}

/// `Queue.dequeue(self)`: raises on an empty queue.
pub fn queue_dequeue() -> NativeFn {
    Rc::new(|args| {
        expect_args(args, 1)?;
        let items = args[0].get_field("items")?.as_list()?;
        let mut items = items.borrow_mut();
        if items.is_empty() {
            return Err(ExecError::Raised("dequeue from empty queue".to_string()));
        }
        Ok(items.remove(0))
    })
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

fn new_list_node(val: i64, next: Value) -> Value {
    Value::instance(Instance::with_fields(
        StructureKind::ListNode,
        [("val", Value::Int(val)), ("next", next)],
    ))
}

/// `insert_into_sorted(head, val)`: insert into an ascending linked list,
/// returning the (possibly new) head. Mutates the chain in place except
/// when prepending.
pub fn insert_into_sorted() -> NativeFn {
    Rc::new(|args| {
        expect_args(args, 2)?;
        let head = args[0].clone();
        let val = args[1].as_int()?;

        if head.is_unit() || head.get_field("val")?.as_int()? >= val {
            return Ok(new_list_node(val, head));
        }
        let mut curr = head.clone();
        loop {
            let next = curr.get_field("next")?;
            if next.is_unit() || next.get_field("val")?.as_int()? >= val {
                curr.set_field("next", new_list_node(val, next))?;
                return Ok(head);
            }
            curr = next;
        }
    })
}

/// `list_length(head)`: number of nodes in a linked chain.
pub fn list_length() -> NativeFn {
    Rc::new(|args| {
        expect_args(args, 1)?;
        let mut count = 0;
        let mut curr = args[0].clone();
        while !curr.is_unit() {
            count += 1;
            curr = curr.get_field("next")?;
        }
        Ok(Value::Int(count))
    })
}

// ---------------------------------------------------------------------------
// Bindings
// ---------------------------------------------------------------------------

/// The reference binding for one structure kind.
pub fn reference_binding(kind: StructureKind) -> StructureBinding {
    match kind {
        StructureKind::ListNode => StructureBinding::new(list_node_constructor()),
        StructureKind::TreeNode => StructureBinding::new(tree_node_constructor()),
        StructureKind::BinarySearchTree => {
            StructureBinding::new(binary_search_tree_constructor())
                .with_method("insert", bst_insert())
        }
        StructureKind::Graph => StructureBinding::new(graph_constructor())
            .with_method("add_vertex", graph_add_vertex())
            .with_method("add_edge", graph_add_edge())
            .with_method("max_degree", graph_max_degree()),
        StructureKind::Stack => StructureBinding::new(stack_constructor())
            .with_method("push", stack_push())
            .with_method("pop", stack_pop()),
        StructureKind::Queue => StructureBinding::new(queue_constructor())
            .with_method("enqueue", queue_enqueue())
            .with_method("dequeue", queue_dequeue()),
    }
}

/// A context binding all six reference structures.
pub fn reference_context() -> Context {
    Context::from_bindings(
        StructureKind::ALL
            .into_iter()
            .map(|kind| (kind, reference_binding(kind))),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_into_sorted_prepends_before_head() {
        let run = insert_into_sorted();
        let head = new_list_node(5, Value::Unit);
        let result = run(&[head, Value::Int(3)]).unwrap();
        assert_eq!(result.get_field("val").unwrap(), Value::Int(3));
        let next = result.get_field("next").unwrap();
        assert_eq!(next.get_field("val").unwrap(), Value::Int(5));
    }

    #[test]
    fn test_insert_into_sorted_splices_mid_chain() {
        let run = insert_into_sorted();
        let head = new_list_node(1, new_list_node(4, Value::Unit));
        let result = run(&[head.clone(), Value::Int(2)]).unwrap();
        // Head is unchanged and the chain was mutated in place.
        assert_eq!(result, head);
        let second = head.get_field("next").unwrap();
        assert_eq!(second.get_field("val").unwrap(), Value::Int(2));
    }

    #[test]
    fn test_insert_into_sorted_empty_head() {
        let run = insert_into_sorted();
        let result = run(&[Value::Unit, Value::Int(7)]).unwrap();
        assert_eq!(result.get_field("val").unwrap(), Value::Int(7));
        assert!(result.get_field("next").unwrap().is_unit());
    }

    #[test]
    fn test_bst_insert_orders_values() {
        let construct = binary_search_tree_constructor();
        let insert = bst_insert();
        let tree = construct(&[]).unwrap();
        for val in [10, 5, 15] {
            insert(&[tree.clone(), Value::Int(val)]).unwrap();
        }
        let root = tree.get_field("root").unwrap();
        assert_eq!(root.get_field("val").unwrap(), Value::Int(10));
        let left = root.get_field("left").unwrap();
        assert_eq!(left.get_field("val").unwrap(), Value::Int(5));
        let right = root.get_field("right").unwrap();
        assert_eq!(right.get_field("val").unwrap(), Value::Int(15));
    }

    #[test]
    fn test_stack_pop_on_empty_raises() {
        let construct = stack_constructor();
        let pop = stack_pop();
        let stack = construct(&[]).unwrap();
        assert_eq!(
            pop(&[stack]).unwrap_err(),
            ExecError::Raised("pop from empty stack".to_string())
        );
    }

    #[test]
    fn test_queue_is_fifo() {
        let construct = queue_constructor();
        let enqueue = queue_enqueue();
        let dequeue = queue_dequeue();
        let queue = construct(&[]).unwrap();
        enqueue(&[queue.clone(), Value::Int(1)]).unwrap();
        enqueue(&[queue.clone(), Value::Int(2)]).unwrap();
        assert_eq!(dequeue(&[queue.clone()]).unwrap(), Value::Int(1));
        assert_eq!(dequeue(&[queue]).unwrap(), Value::Int(2));
    }

    #[test]
    fn test_graph_max_degree_raises_on_empty() {
        let construct = graph_constructor();
        let max_degree = graph_max_degree();
        let graph = construct(&[]).unwrap();
        assert!(matches!(
            max_degree(&[graph]),
            Err(ExecError::Raised(_))
        ));
    }
}
