//! # charpin-core
//!
//! Value model and plugin machinery for behavioral-snapshot capture.
//!
//! This crate provides:
//! - Canonical type resolution: declared annotations normalized to a closed
//!   vocabulary before any registry lookup
//! - The plugin registry: input strategies, repr/value converters, and
//!   value/repr serializers keyed by canonical type
//! - The per-request context binding recognized structure kinds to the
//!   constructors found in the loaded user module
//! - Reference bindings for the recognized structure kinds, used by loaders
//!   and tests

#![deny(unsafe_code)]

pub mod context;
pub mod plugins;
pub mod reference;
pub mod registry;
pub mod repr;
pub mod types;
pub mod value;

pub use context::{Context, ContextError, NativeFn, StructureBinding};
pub use registry::{PluginError, PluginRegistry, RegistryError};
pub use repr::{GraphRepr, Repr};
pub use types::{CanonicalType, ResolutionError, StructureKind, resolve_annotation};
pub use value::{ExecError, Instance, Value, ValueKind};
