//! The behavioral-snapshot capture engine.
//!
//! Enumerates the cartesian product of per-parameter input strategies,
//! converts each combination to isolated live values, executes the target,
//! and serializes the observed return value and after-states. Value-level
//! faults raised by the target are recorded as snapshot data; every other
//! failure aborts the capture with enough identity to diagnose it.

use thiserror::Error;

use charpin_core::{
    CanonicalType, Context, PluginError, PluginRegistry, RegistryError, ResolutionError, Repr,
    resolve_annotation,
};

use crate::module::Target;
use crate::snapshots::Snapshot;

/// Fatal capture failure. Target-execution faults are never surfaced
/// here; they are recorded into the snapshot that provoked them.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("parameter `{name}` (position {position}): {source}")]
    Resolve {
        name: String,
        position: usize,
        #[source]
        source: ResolutionError,
    },
    #[error("receiver parameter `self` on a free-function target")]
    ReceiverOutsideMethod,
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error("converting parameter `{name}` (position {position}): {source}")]
    Convert {
        name: String,
        position: usize,
        #[source]
        source: PluginError,
    },
    #[error("serializing {what}: {source}")]
    Serialize {
        what: String,
        #[source]
        source: PluginError,
    },
}

/// One enumeration slot: the receiver or a declared parameter.
struct Slot {
    name: String,
    ty: CanonicalType,
}

/// Capture the full ordered snapshot sequence for a target.
///
/// Snapshot order is a pure function of the strategy tables: the product
/// is enumerated with the first slot varying slowest and each strategy
/// list in its own order. An empty strategy list yields zero snapshots.
pub fn capture(
    target: &Target<'_>,
    registry: &PluginRegistry,
    context: &Context,
) -> Result<Vec<Snapshot>, CaptureError> {
    let callable = target.callable();
    let slots = resolve_slots(target)?;

    let strategies: Vec<Vec<Repr>> = slots
        .iter()
        .map(|slot| registry.strategy(slot.ty))
        .collect::<Result<_, _>>()?;
    let total: usize = strategies.iter().map(Vec::len).product();

    let mut snapshots = Vec::with_capacity(total);
    for index in 0..total {
        let combo = combination_at(&strategies, index);

        let mut args = Vec::with_capacity(combo.len());
        for (position, (slot, repr)) in slots.iter().zip(&combo).enumerate() {
            let live = registry.convert(slot.ty, repr, context).map_err(|source| {
                CaptureError::Convert {
                    name: slot.name.clone(),
                    position,
                    source,
                }
            })?;
            // Isolate: no two combinations, and no before/after pair, may
            // alias state.
            args.push(live.deep_copy());
        }

        let inputs_repr: Vec<Repr> = combo.into_iter().cloned().collect();
        let snapshot = match (callable.body)(&args) {
            Ok(result) => {
                let return_value_repr = if result.is_unit() {
                    None
                } else {
                    Some(registry.serialize_value(&result, context).map_err(
                        |source| CaptureError::Serialize {
                            what: "return value".to_string(),
                            source,
                        },
                    )?)
                };
                let mut after_states = Vec::with_capacity(args.len());
                for (slot, arg) in slots.iter().zip(&args) {
                    after_states.push(registry.serialize_value(arg, context).map_err(
                        |source| CaptureError::Serialize {
                            what: format!("after-state of `{}`", slot.name),
                            source,
                        },
                    )?);
                }
                Snapshot {
                    inputs_repr,
                    return_value_repr,
                    after_states_repr: Some(after_states),
                    exception_repr: String::new(),
                }
            }
            Err(fault) => Snapshot::fault(inputs_repr, fault.to_string()),
        };
        snapshots.push(snapshot);
    }
    Ok(snapshots)
}

/// Split out the receiver (by the conventional `self` marker) and resolve
/// every slot to its canonical type. The receiver resolves to the owning
/// structure kind, never to an annotation.
fn resolve_slots(target: &Target<'_>) -> Result<Vec<Slot>, CaptureError> {
    let callable = target.callable();
    let has_receiver = callable
        .params
        .first()
        .is_some_and(|param| param.name == "self");

    let mut slots = Vec::with_capacity(callable.params.len());
    if has_receiver {
        let owner = target
            .owner()
            .ok_or(CaptureError::ReceiverOutsideMethod)?;
        slots.push(Slot {
            name: "self".to_string(),
            ty: CanonicalType::Structure(owner),
        });
    }
    for (position, param) in callable
        .params
        .iter()
        .enumerate()
        .skip(usize::from(has_receiver))
    {
        let annotation =
            param
                .annotation
                .as_deref()
                .ok_or_else(|| CaptureError::Resolve {
                    name: param.name.clone(),
                    position,
                    source: ResolutionError::Unannotated,
                })?;
        let ty = resolve_annotation(annotation).map_err(|source| CaptureError::Resolve {
            name: param.name.clone(),
            position,
            source,
        })?;
        slots.push(Slot {
            name: param.name.clone(),
            ty,
        });
    }
    Ok(slots)
}

/// The `index`-th combination of the product, first list varying slowest.
fn combination_at<'a>(strategies: &'a [Vec<Repr>], mut index: usize) -> Vec<&'a Repr> {
    let mut combo = Vec::with_capacity(strategies.len());
    for list in strategies.iter().rev() {
        combo.push(&list[index % list.len()]);
        index /= list.len();
    }
    combo.reverse();
    combo
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    use charpin_core::{StructureKind, Value, reference};

    use crate::module::{Callable, Param, Target};

    fn linked_insert_callable() -> Callable {
        Callable::new(
            "insert_into_sorted",
            vec![
                Param::new("head", "Option<Box<ListNode>>"),
                Param::new("val", "i64"),
            ],
            reference::insert_into_sorted(),
        )
    }

    fn standard() -> (PluginRegistry, Context) {
        (PluginRegistry::standard(), reference::reference_context())
    }

    #[test]
    fn cartesian_completeness_and_order() {
        let (registry, ctx) = standard();
        let callable = linked_insert_callable();
        let snapshots = capture(&Target::Function(&callable), &registry, &ctx).unwrap();

        // 3 linked-list representations x 2 integers.
        assert_eq!(snapshots.len(), 6);
        // First slot varies slowest: the first two snapshots share the
        // first list representation while the integer cycles.
        assert_eq!(snapshots[0].inputs_repr[0], Repr::seq([1, 2, 3]));
        assert_eq!(snapshots[1].inputs_repr[0], Repr::seq([1, 2, 3]));
        assert_eq!(snapshots[0].inputs_repr[1], Repr::Int(3));
        assert_eq!(snapshots[1].inputs_repr[1], Repr::Int(99));
        assert_eq!(snapshots[4].inputs_repr[0], Repr::seq([]));
    }

    #[test]
    fn captures_return_values_and_after_states() {
        let (registry, ctx) = standard();
        let callable = linked_insert_callable();
        let snapshots = capture(&Target::Function(&callable), &registry, &ctx).unwrap();

        // [1,2,3] with 3 inserted keeps the head and splices in place.
        assert_eq!(
            snapshots[0].return_value_repr,
            Some(Repr::seq([1, 2, 3, 3]))
        );
        let after = snapshots[0].after_states_repr.as_ref().unwrap();
        assert_eq!(after[0], Repr::seq([1, 2, 3, 3]));
        assert_eq!(after[1], Repr::Int(3));
        assert!(snapshots.iter().all(Snapshot::is_well_formed));
    }

    #[test]
    fn empty_chain_after_state_serializes_by_runtime_kind() {
        let (registry, ctx) = standard();
        let callable = linked_insert_callable();
        let snapshots = capture(&Target::Function(&callable), &registry, &ctx).unwrap();

        // The empty-list argument is live `Unit`; its after state is the
        // unit representation, not an empty sequence.
        let empty_head = &snapshots[4];
        assert_eq!(empty_head.inputs_repr[0], Repr::seq([]));
        let after = empty_head.after_states_repr.as_ref().unwrap();
        assert_eq!(after[0], Repr::Unit);
    }

    #[test]
    fn determinism_including_order() {
        let (registry, ctx) = standard();
        let callable = linked_insert_callable();
        let target = Target::Function(&callable);
        let first = capture(&target, &registry, &ctx).unwrap();
        let second = capture(&target, &registry, &ctx).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn receiver_enumerates_by_owner_kind() {
        let (registry, ctx) = standard();
        let callable = Callable::new(
            "push",
            vec![Param::receiver(), Param::new("val", "i64")],
            reference::stack_push(),
        );
        let target = Target::Method {
            owner: StructureKind::Stack,
            callable: &callable,
        };
        let snapshots = capture(&target, &registry, &ctx).unwrap();

        // 2 stack representations x 2 integers.
        assert_eq!(snapshots.len(), 4);
        // Unit return is omitted; the mutation shows in the after state.
        assert_eq!(snapshots[0].return_value_repr, None);
        let after = snapshots[0].after_states_repr.as_ref().unwrap();
        assert_eq!(after[0], Repr::seq([1, 2, 3]));
    }

    #[test]
    fn receiver_on_free_function_is_fatal() {
        let (registry, ctx) = standard();
        let callable = Callable::new(
            "push",
            vec![Param::receiver(), Param::new("val", "i64")],
            reference::stack_push(),
        );
        let result = capture(&Target::Function(&callable), &registry, &ctx);
        assert!(matches!(
            result,
            Err(CaptureError::ReceiverOutsideMethod)
        ));
    }

    #[test]
    fn exception_isolation() {
        let (registry, ctx) = standard();
        let callable = Callable::new(
            "max_degree",
            vec![Param::receiver()],
            reference::graph_max_degree(),
        );
        let target = Target::Method {
            owner: StructureKind::Graph,
            callable: &callable,
        };
        let snapshots = capture(&target, &registry, &ctx).unwrap();

        // Both graph representations are enumerated; only the empty one
        // faults, and the fault does not abort the sequence.
        assert_eq!(snapshots.len(), 2);
        assert!(!snapshots[0].is_fault());
        assert_eq!(snapshots[0].return_value_repr, Some(Repr::Int(1)));
        assert!(snapshots[1].is_fault());
        assert_eq!(snapshots[1].exception_repr, "max_degree on empty graph");
        assert!(snapshots[1].return_value_repr.is_none());
        assert!(snapshots[1].after_states_repr.is_none());
    }

    #[test]
    fn unannotated_parameter_is_fatal() {
        let (registry, ctx) = standard();
        let callable = Callable::new(
            "mystery",
            vec![Param {
                name: "x".to_string(),
                annotation: None,
            }],
            Rc::new(|_| Ok(Value::Unit)),
        );
        let result = capture(&Target::Function(&callable), &registry, &ctx);
        assert!(matches!(
            result,
            Err(CaptureError::Resolve {
                source: ResolutionError::Unannotated,
                ..
            })
        ));
    }

    #[test]
    fn unrecognized_annotation_is_fatal_with_identity() {
        let (registry, ctx) = standard();
        let callable = Callable::new(
            "hash_it",
            vec![Param::new("table", "HashMap<String, i64>")],
            Rc::new(|_| Ok(Value::Unit)),
        );
        let err = capture(&Target::Function(&callable), &registry, &ctx).unwrap_err();
        let rendered = err.to_string();
        assert!(rendered.contains("table"), "missing identity: {rendered}");
        assert!(rendered.contains("position 0"), "missing position: {rendered}");
    }

    #[test]
    fn missing_strategy_is_a_registry_error() {
        let ctx = reference::reference_context();
        let registry = PluginRegistry::empty();
        let callable = linked_insert_callable();
        assert!(matches!(
            capture(&Target::Function(&callable), &registry, &ctx),
            Err(CaptureError::Registry(RegistryError::MissingStrategy(_)))
        ));
    }

    #[test]
    fn empty_strategy_yields_zero_snapshots() {
        let ctx = reference::reference_context();
        let mut registry = PluginRegistry::standard();
        registry.register_strategy(CanonicalType::Int, Vec::new);
        let callable = linked_insert_callable();
        let snapshots = capture(&Target::Function(&callable), &registry, &ctx).unwrap();
        assert!(snapshots.is_empty());
    }

    #[test]
    fn zero_parameter_target_executes_once() {
        let (registry, ctx) = standard();
        let callable = Callable::new("answer", Vec::new(), Rc::new(|_| Ok(Value::Int(42))));
        let snapshots = capture(&Target::Function(&callable), &registry, &ctx).unwrap();
        assert_eq!(snapshots.len(), 1);
        assert_eq!(snapshots[0].return_value_repr, Some(Repr::Int(42)));
        assert!(snapshots[0].inputs_repr.is_empty());
    }

    #[test]
    fn combinations_do_not_alias() {
        let (registry, ctx) = standard();
        // A target that destructively truncates its chain argument.
        let callable = Callable::new(
            "truncate",
            vec![Param::new("head", "Option<Box<ListNode>>")],
            Rc::new(|args| {
                if !args[0].is_unit() {
                    args[0].set_field("next", Value::Unit)?;
                }
                Ok(args[0].clone())
            }),
        );
        let snapshots = capture(&Target::Function(&callable), &registry, &ctx).unwrap();
        // Input representations are untouched by the mutation.
        assert_eq!(snapshots[0].inputs_repr[0], Repr::seq([1, 2, 3]));
        assert_eq!(
            snapshots[0].after_states_repr.as_ref().unwrap()[0],
            Repr::seq([1])
        );
        // A later run over the same strategy list still sees pristine inputs.
        let again = capture(&Target::Function(&callable), &registry, &ctx).unwrap();
        assert_eq!(snapshots, again);
    }
}
