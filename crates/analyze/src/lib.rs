//! apicompat-analyze: turns API deltas into reportable problems.
//!
//! The analyzer compares each component of a current baseline with its
//! reference, classifies the incompatible deltas, checks the declared
//! version against the worst change, checks since tags on new API and the
//! use of other components' restricted types, and routes every problem through its configured error mode. `analyze()`
//! runs this for a whole baseline and aggregates an `AnalysisReport`.

pub mod analyzer;
pub mod config;
pub mod error;
pub mod filter;
pub mod policy;
pub mod problem;
pub mod report;
pub mod since;
pub mod usage;

pub use analyzer::{analyze, analyze_component, ComponentReport};
pub use config::{AnalyzerOptions, ApiConfigSettings, ErrorMode, VersionIncrementRule};
pub use error::{AnalyzeError, ConfigError, FilterStoreError};
pub use filter::{FilterStore, ProblemFilter};
pub use policy::{check_reexports, check_version, ReexportShift, VersionFinding};
pub use problem::{
    classify, pack_id, since_tag_problem, usage_problem, version_problem, Category, Problem,
    ProblemId, ProblemSeverity, SinceTagKind, UsageKind, VersionProblemKind,
};
pub use report::{AnalysisReport, ReportSummary};
pub use since::{check_since, SinceCheck, SinceTag};
pub use usage::check_usage;
