//! apicompat-compare: structural deltas between two API baselines.
//!
//! `compare_baselines()` walks two baselines component by component and
//! produces a tree of `Delta` nodes; `compare()` does the same for a single
//! pair of type descriptors. The rule evaluator decides which deltas a
//! client can observe and whether they break binary compatibility.

pub mod comparator;
pub mod component;
pub mod delta;
pub mod incremental;
pub mod rules;

pub use comparator::{compare, CompareContext, TypeScope};
pub use component::{compare_baselines, compare_components, CompareOptions};
pub use delta::{Change, Delta, DeltaFlag, DeltaKind, ElementType};
pub use incremental::compare_types;
pub use rules::{is_api_visible, is_reportable, is_visible, Evaluator, RuleEvaluator, Severity};
