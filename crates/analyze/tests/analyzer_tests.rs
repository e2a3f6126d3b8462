//! End-to-end analyzer behaviour: version policy, since tags, error modes
//! and filters over small hand-built baselines.

use apicompat_analyze::{
    analyze, analyze_component, AnalyzerOptions, ApiConfigSettings, Category, ComponentReport,
    ErrorMode, FilterStore, Problem, ProblemSeverity, SinceTagKind, UsageKind,
    VersionProblemKind,
};
use apicompat_compare::Severity;
use apicompat_model::{
    load_baseline_str, Baseline, Component, MethodDescriptor, RestrictionTag, TypeDescriptor,
    Version, VersionRange,
};
use serde_json::json;

const CORE: &str = "org.example.core";

// ──────────────────────────────────────────────
// Helpers
// ──────────────────────────────────────────────

fn method(name: &str, since: &str) -> MethodDescriptor {
    MethodDescriptor::new(name, &[], "void").since(since)
}

fn baseline(name: &str, version: &str, methods: Vec<MethodDescriptor>) -> Baseline {
    let ty = methods
        .into_iter()
        .fold(TypeDescriptor::class("p.Api").since("1.0"), TypeDescriptor::with_method);
    let version: Version = version.parse().unwrap();
    Baseline::new(name).with_component(Component::new(CORE, version).with_type(ty))
}

fn run(old: &Baseline, new: &Baseline, options: &AnalyzerOptions) -> ComponentReport {
    analyze_component(
        old,
        new,
        CORE,
        &ApiConfigSettings::default(),
        options,
        &FilterStore::new(),
    )
    .unwrap()
}

fn of_category(report: &ComponentReport, category: Category) -> Vec<&Problem> {
    report
        .problems
        .iter()
        .filter(|p| p.category == category)
        .collect()
}

fn version_kinds(report: &ComponentReport) -> Vec<VersionProblemKind> {
    of_category(report, Category::Version)
        .into_iter()
        .filter_map(|p| VersionProblemKind::from_code(p.problem_id().kind_code()))
        .collect()
}

// ──────────────────────────────────────────────
// Version policy
// ──────────────────────────────────────────────

#[test]
fn breakage_with_micro_bump_requires_major_version() {
    let old = baseline("reference", "1.0.0", vec![method("run", "1.0"), method("stop", "1.0")]);
    let new = baseline("current", "1.0.1", vec![method("run", "1.0")]);
    let report = run(&old, &new, &AnalyzerOptions::default());

    assert_eq!(report.severity, Severity::Breaking);
    assert_eq!(of_category(&report, Category::Compatibility).len(), 1);
    let version = of_category(&report, Category::Version);
    assert_eq!(version.len(), 1);
    assert_eq!(
        version[0].problem_id().describe().as_deref(),
        Some("version API_COMPONENT MAJOR_VERSION_CHANGE")
    );
    assert_eq!(version[0].args, vec!["1.0.1", "1.0.0"]);
    assert_eq!(report.suggested_version, Some(Version::new(2, 0, 0)));
}

#[test]
fn major_bump_accepts_breakage() {
    let old = baseline("reference", "1.0.0", vec![method("run", "1.0"), method("stop", "1.0")]);
    let new = baseline("current", "2.0.0", vec![method("run", "1.0")]);
    let report = run(&old, &new, &AnalyzerOptions::default());
    assert!(report.problems.is_empty(), "{:?}", report.problems);

    let options = AnalyzerOptions {
        report_breakage_when_major_changed: true,
        ..AnalyzerOptions::default()
    };
    let report = run(&old, &new, &options);
    assert_eq!(of_category(&report, Category::Compatibility).len(), 1);
    assert!(version_kinds(&report).is_empty());
}

#[test]
fn addition_with_micro_bump_requires_minor_version() {
    let old = baseline("reference", "1.0.0", vec![method("run", "1.0")]);
    let new = baseline("current", "1.0.1", vec![method("run", "1.0"), method("pause", "1.0")]);
    let report = run(&old, &new, &AnalyzerOptions::default());
    assert_eq!(report.severity, Severity::CompatibleAddition);
    assert_eq!(version_kinds(&report), vec![VersionProblemKind::MinorVersionChange]);
    assert!(of_category(&report, Category::Compatibility).is_empty());
}

#[test]
fn minor_bump_without_new_api_is_reported_unless_ignored() {
    let old = baseline("reference", "1.0.0", vec![method("run", "1.0")]);
    let new = baseline("current", "1.1.0", vec![method("run", "1.0")]);
    let report = run(&old, &new, &AnalyzerOptions::default());
    assert_eq!(
        version_kinds(&report),
        vec![VersionProblemKind::MinorVersionChangeNoNewApi]
    );

    let settings = ApiConfigSettings::from_toml("micro_version_error = \"ignore\"").unwrap();
    let report = analyze_component(
        &old,
        &new,
        CORE,
        &settings,
        &AnalyzerOptions::default(),
        &FilterStore::new(),
    )
    .unwrap();
    assert!(report.problems.is_empty());
}

#[test]
fn breakage_without_version_change_is_reported() {
    let old = baseline("reference", "1.0.0", vec![method("run", "1.0"), method("stop", "1.0")]);
    let new = baseline("current", "1.0.0", vec![method("run", "1.0")]);
    let report = run(&old, &new, &AnalyzerOptions::default());
    assert_eq!(report.delta_count, 1);
    assert_eq!(of_category(&report, Category::Compatibility).len(), 1);
    assert_eq!(version_kinds(&report), vec![VersionProblemKind::MajorVersionChange]);
    assert_eq!(of_category(&report, Category::Version)[0].args, vec!["1.0.0", "1.0.0"]);
    assert!(report.has_errors());
}

#[test]
fn unchanged_component_with_equal_versions_is_clean() {
    let old = baseline("reference", "1.0.0", vec![method("run", "1.0")]);
    let new = baseline("current", "1.0.0", vec![method("run", "1.0")]);
    let report = run(&old, &new, &AnalyzerOptions::default());
    assert_eq!(report.delta_count, 0);
    assert!(report.problems.is_empty());
}

#[test]
fn annotation_conversion_with_new_restriction_is_one_problem() {
    let component = |version: &str, ty: TypeDescriptor| {
        Baseline::new(version).with_component(Component::new(CORE, version.parse().unwrap()).with_type(ty))
    };
    let old = component(
        "1.0.0",
        TypeDescriptor::annotation("p.Marker").since("1.0"),
    );
    let new = component(
        "1.0.1",
        TypeDescriptor::class("p.Marker")
            .since("1.0")
            .with_restriction(RestrictionTag::NoInstantiate),
    );
    let report = run(&old, &new, &AnalyzerOptions::default());
    let compat = of_category(&report, Category::Compatibility);
    assert_eq!(compat.len(), 1, "{:?}", report.problems);
    assert_eq!(
        compat[0].problem_id().describe().as_deref(),
        Some("compatibility ANNOTATION CHANGED TYPE_CONVERSION")
    );
    assert_eq!(compat[0].args, vec!["p.Marker", "1", "4"]);
}

fn reexporting(app: &str, range: &str, lib: &str) -> Baseline {
    let range: VersionRange = range.parse().unwrap();
    Baseline::new(app)
        .with_component(Component::new("org.example.app", app.parse().unwrap()).with_reexport("org.example.base", range))
        .with_component(Component::new("org.example.base", lib.parse().unwrap()))
}

fn run_app(old: &Baseline, new: &Baseline) -> ComponentReport {
    analyze_component(
        old,
        new,
        "org.example.app",
        &ApiConfigSettings::default(),
        &AnalyzerOptions::default(),
        &FilterStore::new(),
    )
    .unwrap()
}

#[test]
fn reexported_major_shift_justifies_major_bump() {
    let old = reexporting("1.0.0", "[1.0.0,2.0.0)", "1.0.0");
    let new = reexporting("2.0.0", "[2.0.0,3.0.0)", "2.0.0");
    let report = run_app(&old, &new);
    assert!(report.problems.is_empty(), "{:?}", report.problems);
}

#[test]
fn reexported_major_shift_without_bump_names_the_provider() {
    let old = reexporting("1.0.0", "[1.0.0,2.0.0)", "1.0.0");
    let new = reexporting("1.0.1", "[2.0.0,3.0.0)", "2.0.0");
    let report = run_app(&old, &new);
    assert_eq!(version_kinds(&report), vec![VersionProblemKind::ReexportedMajorVersionChange]);
    let problem = of_category(&report, Category::Version)[0];
    assert_eq!(problem.args, vec!["1.0.1", "org.example.base"]);
    assert!(problem.message.contains("org.example.base"));
    assert_eq!(report.suggested_version, Some(Version::new(2, 0, 0)));
}

// ──────────────────────────────────────────────
// Since tags
// ──────────────────────────────────────────────

fn since_kinds(report: &ComponentReport) -> Vec<SinceTagKind> {
    of_category(report, Category::SinceTag)
        .into_iter()
        .filter_map(|p| SinceTagKind::from_code(p.problem_id().kind_code()))
        .collect()
}

#[test]
fn correct_since_tag_is_quiet() {
    let old = baseline("reference", "1.0.0", vec![method("run", "1.0")]);
    let new = baseline("current", "1.1.0", vec![method("run", "1.0"), method("pause", "1.1")]);
    let report = run(&old, &new, &AnalyzerOptions::default());
    assert!(report.problems.is_empty(), "{:?}", report.problems);
}

#[test]
fn missing_since_tag_on_new_method() {
    let old = baseline("reference", "1.0.0", vec![method("run", "1.0")]);
    let new = baseline(
        "current",
        "1.1.0",
        vec![method("run", "1.0"), MethodDescriptor::new("pause", &[], "void")],
    );
    let report = run(&old, &new, &AnalyzerOptions::default());
    assert_eq!(since_kinds(&report), vec![SinceTagKind::Missing]);
    let problem = of_category(&report, Category::SinceTag)[0];
    assert_eq!(problem.args.len(), 1);
    assert!(problem.args[0].contains("pause"));
}

#[test]
fn since_tag_naming_another_release_is_invalid() {
    let old = baseline("reference", "1.0.0", vec![method("run", "1.0")]);
    let new = baseline(
        "current",
        "1.1.0",
        vec![method("run", "1.0"), method("pause", "org.example 1.0")],
    );
    let report = run(&old, &new, &AnalyzerOptions::default());
    assert_eq!(since_kinds(&report), vec![SinceTagKind::Invalid]);
    let problem = of_category(&report, Category::SinceTag)[0];
    assert_eq!(problem.args[0], "org.example 1.0");
    assert_eq!(problem.args[1], "org.example 1.1");
    assert!(problem.args[2].contains("pause"));
}

#[test]
fn malformed_since_tag_and_disabled_checks() {
    let old = baseline("reference", "1.0.0", vec![method("run", "1.0")]);
    let new = baseline("current", "1.1.0", vec![method("run", "1.0"), method("pause", "soon")]);
    let report = run(&old, &new, &AnalyzerOptions::default());
    assert_eq!(since_kinds(&report), vec![SinceTagKind::Malformed]);
    assert_eq!(of_category(&report, Category::SinceTag)[0].args, vec!["soon"]);

    let options = AnalyzerOptions {
        check_since_tags: false,
        ..AnalyzerOptions::default()
    };
    assert!(since_kinds(&run(&old, &new, &options)).is_empty());
}

// ──────────────────────────────────────────────
// Error modes and filters
// ──────────────────────────────────────────────

#[test]
fn warning_mode_downgrades_compatibility_problems() {
    let old = baseline("reference", "1.0.0", vec![method("run", "1.0"), method("stop", "1.0")]);
    let new = baseline("current", "2.0.0", vec![method("run", "1.0")]);
    let options = AnalyzerOptions {
        force_report: true,
        compatibility: ErrorMode::Warning,
        ..AnalyzerOptions::default()
    };
    let report = run(&old, &new, &options);
    let compat = of_category(&report, Category::Compatibility);
    assert_eq!(compat.len(), 1);
    assert_eq!(compat[0].severity, ProblemSeverity::Warning);
    assert!(!report.has_errors());
}

#[test]
fn filtered_problems_are_not_reported() {
    let old = baseline("reference", "1.0.0", vec![method("run", "1.0"), method("stop", "1.0")]);
    let new = baseline("current", "1.0.1", vec![method("run", "1.0")]);

    let first = run(&old, &new, &AnalyzerOptions::default());
    let mut store = FilterStore::new();
    for problem in &first.problems {
        store.add(problem);
    }

    let report = analyze_component(
        &old,
        &new,
        CORE,
        &ApiConfigSettings::default(),
        &AnalyzerOptions::default(),
        &store,
    )
    .unwrap();
    assert!(report.problems.is_empty());
    assert_eq!(report.filtered.len(), first.problems.len());
}

#[test]
fn filter_mode_populates_the_store() {
    let old = baseline("reference", "1.0.0", vec![method("run", "1.0"), method("stop", "1.0")]);
    let new = baseline("current", "1.0.1", vec![method("run", "1.0")]);
    let settings = ApiConfigSettings::from_toml("major_version_error = \"filter\"").unwrap();
    let mut store = FilterStore::new();
    let report = analyze(&old, &new, |_| settings.clone(), &AnalyzerOptions::default(), &mut store);

    assert_eq!(store.len(), 1);
    assert_eq!(report.summary.errors, 1);
    assert!(report.has_errors());
}

// ──────────────────────────────────────────────
// Usage of restricted types
// ──────────────────────────────────────────────

#[test]
fn extending_a_no_extend_class_from_another_component() {
    let provider = Component::new("org.example.base", Version::new(1, 0, 0))
        .with_type(TypeDescriptor::class("q.Base").with_restriction(RestrictionTag::NoExtend));
    let client = |version: &str| {
        Component::new(CORE, version.parse().unwrap())
            .with_type(TypeDescriptor::class("p.Api").since("1.0").with_superclass("q.Base"))
    };
    let old = Baseline::new("reference").with_component(provider.clone()).with_component(client("1.0.0"));
    let new = Baseline::new("current").with_component(provider).with_component(client("1.0.0"));

    let report = run(&old, &new, &AnalyzerOptions::default());
    let usage = of_category(&report, Category::Usage);
    assert_eq!(usage.len(), 1);
    assert_eq!(usage[0].resource, "p.Api");
    assert_eq!(usage[0].args, vec!["q.Base"]);
    assert_eq!(
        UsageKind::from_code(usage[0].problem_id().kind_code()),
        Some(UsageKind::IllegalExtend)
    );

    let options = AnalyzerOptions {
        check_usage: false,
        ..AnalyzerOptions::default()
    };
    assert!(run(&old, &new, &options).problems.is_empty());
}

// ──────────────────────────────────────────────
// Whole baselines
// ──────────────────────────────────────────────

#[test]
fn removed_component_is_a_baseline_problem() {
    let old = baseline("reference", "1.0.0", vec![method("run", "1.0")])
        .with_component(Component::new("org.example.extra", Version::new(1, 0, 0)));
    let new = baseline("current", "1.0.0", vec![method("run", "1.0")]);
    let mut store = FilterStore::new();
    let report = analyze(
        &old,
        &new,
        |_| ApiConfigSettings::default(),
        &AnalyzerOptions::default(),
        &mut store,
    );

    assert_eq!(report.baseline_problems.len(), 1);
    assert_eq!(report.baseline_problems[0].args, vec!["org.example.extra"]);
    assert_eq!(report.summary.components, 1);
    assert!(report.to_text().contains("BASELINE:"));
    assert!(report.to_json()["components"].is_array());
}

fn with_extra(base: Baseline) -> Baseline {
    base.with_component(Component::new("org.example.extra", Version::new(1, 0, 0)))
}

#[test]
fn removed_component_honours_filter_mode_and_filters() {
    let old = with_extra(baseline("reference", "1.0.0", vec![method("run", "1.0")]));
    let new = baseline("current", "1.0.0", vec![method("run", "1.0")]);

    let options = AnalyzerOptions {
        compatibility: ErrorMode::Filter,
        ..AnalyzerOptions::default()
    };
    let mut store = FilterStore::new();
    let report = analyze(&old, &new, |_| ApiConfigSettings::default(), &options, &mut store);
    assert!(report.baseline_problems.is_empty());
    assert_eq!(store.len(), 1);
    assert!(!report.has_errors());

    // the recorded filter now suppresses the default error
    let report = analyze(
        &old,
        &new,
        |_| ApiConfigSettings::default(),
        &AnalyzerOptions::default(),
        &mut store,
    );
    assert!(report.baseline_problems.is_empty());
    assert_eq!(report.baseline_filtered.len(), 1);
    assert_eq!(report.summary.filtered, 1);
    assert!(!report.has_errors());
}

fn snapshot(name: &str, version: &str, types: serde_json::Value) -> String {
    json!({
        "name": name,
        "components": [
            {
                "id": CORE,
                "version": version,
                "types": types
            },
            {
                "id": "org.example.util",
                "version": version,
                "types": [{ "name": "u.Util", "kind": "class", "since": "1.0" }]
            }
        ]
    })
    .to_string()
}

#[test]
fn undecodable_type_is_skipped_not_removed() {
    let old = load_baseline_str(&snapshot(
        "reference",
        "1.0.0",
        json!([
            { "name": "p.Api", "kind": "class", "since": "1.0" },
            { "name": "p.Odd", "kind": "class", "since": "1.0" }
        ]),
    ))
    .unwrap();
    let new = load_baseline_str(&snapshot(
        "current",
        "1.0.1",
        json!([
            { "name": "p.Api", "kind": "class", "since": "1.0" },
            { "name": "p.Odd", "kind": "record" }
        ]),
    ))
    .unwrap();
    assert!(new.component(CORE).unwrap().find_type("p.Api").is_some());

    let mut store = FilterStore::new();
    let report = analyze(&old, &new, |_| ApiConfigSettings::default(), &AnalyzerOptions::default(), &mut store);
    assert_eq!(report.problem_count(), 0, "{:?}", report.problems().collect::<Vec<_>>());
    assert_eq!(report.component(CORE).map(|c| c.delta_count), Some(0));
}

#[test]
fn component_with_malformed_version_is_not_reported_as_removed() {
    let types = json!([{ "name": "p.Api", "kind": "class", "since": "1.0" }]);
    let old = load_baseline_str(&snapshot("reference", "1.0.0", types.clone())).unwrap();
    let new = load_baseline_str(&snapshot("current", "1.0.x", types)).unwrap();
    assert!(new.component(CORE).is_none());

    let mut store = FilterStore::new();
    let report = analyze(&old, &new, |_| ApiConfigSettings::default(), &AnalyzerOptions::default(), &mut store);
    assert!(report.baseline_problems.is_empty());
    assert!(!report.has_errors());
}
