//! The source-loading boundary.
//!
//! Loading arbitrary user source into an executable unit is a collaborator
//! concern behind [`SourceLoader`]: a capability-limited evaluation
//! boundary that yields a symbol table and nothing else. Every load uses a
//! distinct, uniquely-named execution unit, and any temporary artifact is
//! removed unconditionally on success and failure paths.
//!
//! [`ReferenceLoader`] is the in-repo implementation: it resolves the
//! recognized structure names and a fixed corpus of targets against the
//! source text by declaration scan and binds them to the reference
//! semantics from `charpin-core`. It exists so the pipeline, CLI, and
//! tests run end to end; under it, generated assertions characterize the
//! reference behavior of the declared names.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::{env, fs, process};

use thiserror::Error;

use charpin_core::{StructureKind, reference};

use crate::module::{Callable, Module, Param, StructureDef};

/// The supplied source text failed to load as a module.
#[derive(Debug, Error)]
pub enum LoadFault {
    #[error("source text is empty")]
    EmptySource,
    #[error("source defines none of the recognized structures or known targets")]
    NoRecognizedDefinitions,
    #[error("could not stage source artifact: {0}")]
    Io(#[from] std::io::Error),
}

/// Sandboxed-evaluation boundary: source text in, symbol table out.
pub trait SourceLoader {
    fn load(&self, source: &str) -> Result<Module, LoadFault>;
}

static UNIT_COUNTER: AtomicU64 = AtomicU64::new(0);

/// A process-unique id for one execution unit or request.
pub fn next_unit_id() -> u64 {
    UNIT_COUNTER.fetch_add(1, Ordering::Relaxed)
}

/// A uniquely-named temporary file hosting one loaded source text.
///
/// Concurrent loads of different or identical source never collide. The
/// file is removed when the artifact is dropped, on success and failure
/// paths alike.
#[derive(Debug)]
pub struct ScopedSourceArtifact {
    path: PathBuf,
}

impl ScopedSourceArtifact {
    /// Write `source` to a fresh uniquely-named file.
    pub fn stage(source: &str) -> std::io::Result<Self> {
        let path = env::temp_dir().join(format!(
            "charpin_unit_{}_{}.src",
            process::id(),
            next_unit_id()
        ));
        fs::write(&path, source)?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScopedSourceArtifact {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}

/// Loader binding recognized declarations to reference semantics.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReferenceLoader;

impl SourceLoader for ReferenceLoader {
    fn load(&self, source: &str) -> Result<Module, LoadFault> {
        if source.trim().is_empty() {
            return Err(LoadFault::EmptySource);
        }
        // Staged for the lifetime of the load only.
        let _artifact = ScopedSourceArtifact::stage(source)?;

        let mut module = Module::new(source);
        let mut bound = false;
        for kind in StructureKind::ALL {
            if declares_structure(source, kind) {
                module.add_structure(kind, reference_structure(kind));
                bound = true;
            }
        }
        for callable in reference_functions() {
            if declares_fn(source, &callable.name) {
                module.add_function(callable);
                bound = true;
            }
        }
        if !bound {
            return Err(LoadFault::NoRecognizedDefinitions);
        }
        Ok(module)
    }
}

fn declares_structure(source: &str, kind: StructureKind) -> bool {
    source.contains(&format!("struct {}", kind.name()))
        || source.contains(&format!("impl {}", kind.name()))
}

fn declares_fn(source: &str, name: &str) -> bool {
    source.contains(&format!("fn {name}"))
}

/// The reference definition of one structure kind, with the method
/// signatures a loaded module would carry.
pub fn reference_structure(kind: StructureKind) -> StructureDef {
    match kind {
        StructureKind::ListNode => StructureDef::new(reference::list_node_constructor()),
        StructureKind::TreeNode => StructureDef::new(reference::tree_node_constructor()),
        StructureKind::BinarySearchTree => {
            StructureDef::new(reference::binary_search_tree_constructor()).with_method(
                Callable::new(
                    "insert",
                    vec![Param::receiver(), Param::new("val", "i64")],
                    reference::bst_insert(),
                ),
            )
        }
        StructureKind::Graph => StructureDef::new(reference::graph_constructor())
            .with_method(Callable::new(
                "add_vertex",
                vec![Param::receiver(), Param::new("v", "String")],
                reference::graph_add_vertex(),
            ))
            .with_method(Callable::new(
                "add_edge",
                vec![
                    Param::receiver(),
                    Param::new("u", "String"),
                    Param::new("v", "String"),
                ],
                reference::graph_add_edge(),
            ))
            .with_method(Callable::new(
                "max_degree",
                vec![Param::receiver()],
                reference::graph_max_degree(),
            )),
        StructureKind::Stack => StructureDef::new(reference::stack_constructor())
            .with_method(Callable::new(
                "push",
                vec![Param::receiver(), Param::new("val", "i64")],
                reference::stack_push(),
            ))
            .with_method(Callable::new(
                "pop",
                vec![Param::receiver()],
                reference::stack_pop(),
            )),
        StructureKind::Queue => StructureDef::new(reference::queue_constructor())
            .with_method(Callable::new(
                "enqueue",
                vec![Param::receiver(), Param::new("val", "i64")],
                reference::queue_enqueue(),
            ))
            .with_method(Callable::new(
                "dequeue",
                vec![Param::receiver()],
                reference::queue_dequeue(),
            )),
    }
}

/// The fixed corpus of recognized free-function targets.
pub fn reference_functions() -> Vec<Callable> {
    vec![
        Callable::new(
            "insert_into_sorted",
            vec![
                Param::new("head", "Option<Box<ListNode>>"),
                Param::new("val", "i64"),
            ],
            reference::insert_into_sorted(),
        ),
        Callable::new(
            "list_length",
            vec![Param::new("head", "Option<Box<ListNode>>")],
            reference::list_length(),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_source_is_a_load_fault() {
        assert!(matches!(
            ReferenceLoader.load("   \n"),
            Err(LoadFault::EmptySource)
        ));
    }

    #[test]
    fn unrecognized_source_is_a_load_fault() {
        assert!(matches!(
            ReferenceLoader.load("fn unrelated() {}"),
            Err(LoadFault::NoRecognizedDefinitions)
        ));
    }

    #[test]
    fn declared_names_are_bound() {
        let source = "struct ListNode;\nfn insert_into_sorted() {}";
        let module = ReferenceLoader.load(source).unwrap();
        assert!(module.function("insert_into_sorted").is_some());
        assert!(module.structure(StructureKind::ListNode).is_some());
        assert!(module.structure(StructureKind::Stack).is_none());
        assert_eq!(module.source, source);
    }

    #[test]
    fn impl_block_counts_as_declaration() {
        let module = ReferenceLoader.load("impl Stack { }").unwrap();
        assert!(module.structure(StructureKind::Stack).is_some());
    }

    #[test]
    fn artifact_is_removed_on_drop() {
        let path = {
            let artifact = ScopedSourceArtifact::stage("struct Stack;").unwrap();
            assert!(artifact.path().exists());
            artifact.path().to_path_buf()
        };
        assert!(!path.exists());
    }

    #[test]
    fn artifacts_do_not_collide() {
        let a = ScopedSourceArtifact::stage("one").unwrap();
        let b = ScopedSourceArtifact::stage("one").unwrap();
        assert_ne!(a.path(), b.path());
    }

    #[test]
    fn artifact_is_removed_on_unwind() {
        let path = std::cell::RefCell::new(PathBuf::new());
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let artifact = ScopedSourceArtifact::stage("boom").unwrap();
            *path.borrow_mut() = artifact.path().to_path_buf();
            panic!("simulated load failure");
        }));
        assert!(result.is_err());
        assert!(!path.borrow().exists());
    }
}
