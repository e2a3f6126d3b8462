//! apicompat-model: structural snapshots of a component's API surface.
//!
//! Provides immutable descriptors for compiled types (classes, interfaces,
//! enums and annotations) and their members, the `Component` and `Baseline`
//! containers that group them, OSGi-style versions and version ranges, and
//! a single `load_baseline()` entry point that builds a `Baseline` from a
//! JSON snapshot produced by an external class-file parser.
//!
//! Baselines are never mutated after construction. Callers share them
//! across threads with `Arc<Baseline>`.

pub mod baseline;
pub mod descriptor;
pub mod error;
pub mod snapshot;
pub mod version;

pub use baseline::{Baseline, Component, Reexport};
pub use descriptor::{
    FieldDescriptor, MethodDescriptor, Modifiers, RestrictionTag, Restrictions, TypeDescriptor,
    TypeKind, TypeParameter, Visibility, CONSTRUCTOR_NAME, OBJECT,
};
pub use error::ModelError;
pub use snapshot::{load_baseline, load_baseline_str};
pub use version::{Segment, Version, VersionRange};
