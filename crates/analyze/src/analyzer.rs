//! Analyzer orchestration: compare, classify, check versions, since tags and
//! usage, then route every problem through its configured error mode.

use apicompat_compare::{
    compare_components, Change, CompareContext, CompareOptions, Delta, DeltaFlag, DeltaKind,
    ElementType, Evaluator, RuleEvaluator, Severity, TypeScope,
};
use apicompat_model::{Baseline, Component, Version};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info};

use crate::config::{AnalyzerOptions, ApiConfigSettings, ErrorMode};
use crate::error::AnalyzeError;
use crate::filter::FilterStore;
use crate::policy::{check_reexports, check_version, error_mode};
use crate::problem::{
    classify, since_tag_problem, version_problem, Problem, ProblemSeverity, SinceTagKind,
};
use crate::report::AnalysisReport;
use crate::since::{check_since, member_label, requires_since_tag, SinceCheck};
use crate::usage::check_usage;

/// Outcome of analyzing one component against its reference.
#[derive(Debug, Clone, Serialize)]
pub struct ComponentReport {
    pub component_id: String,
    pub reference_version: Version,
    pub declared_version: Version,
    /// Worst severity of the component's reportable changes.
    pub severity: Severity,
    pub problems: Vec<Problem>,
    /// Problems suppressed by an existing filter.
    pub filtered: Vec<Problem>,
    /// Problems whose error mode asks for them to be filtered.
    #[serde(skip)]
    pub to_filter: Vec<Problem>,
    pub suggested_version: Option<Version>,
    pub delta_count: usize,
}

impl ComponentReport {
    fn new(reference: &Component, current: &Component) -> Self {
        ComponentReport {
            component_id: current.id.clone(),
            reference_version: reference.version.clone(),
            declared_version: current.version.clone(),
            severity: Severity::None,
            problems: Vec::new(),
            filtered: Vec::new(),
            to_filter: Vec::new(),
            suggested_version: None,
            delta_count: 0,
        }
    }

    fn route(&mut self, problem: Problem, mode: ErrorMode, filters: &FilterStore) {
        match route(problem, mode, filters) {
            Routed::Dropped => {}
            Routed::ToFilter(p) => self.to_filter.push(p),
            Routed::Filtered(p) => self.filtered.push(p),
            Routed::Reported(p) => self.problems.push(p),
        }
    }

    pub fn has_errors(&self) -> bool {
        self.problems
            .iter()
            .any(|p| p.severity == ProblemSeverity::Error)
    }
}

enum Routed {
    Dropped,
    ToFilter(Problem),
    Filtered(Problem),
    Reported(Problem),
}

/// Apply an error mode and the existing filters to a problem.
fn route(problem: Problem, mode: ErrorMode, filters: &FilterStore) -> Routed {
    let problem = match mode {
        ErrorMode::Ignore => {
            debug!(id = problem.id, resource = %problem.resource, "problem ignored");
            return Routed::Dropped;
        }
        ErrorMode::Filter => {
            debug!(id = problem.id, resource = %problem.resource, "problem sent to filter store");
            return Routed::ToFilter(problem);
        }
        ErrorMode::Warning => problem.with_severity(ProblemSeverity::Warning),
        ErrorMode::Error => problem.with_severity(ProblemSeverity::Error),
    };
    if filters.is_filtered(&problem) {
        debug!(id = problem.id, resource = %problem.resource, "problem filtered");
        Routed::Filtered(problem)
    } else {
        debug!(id = problem.id, resource = %problem.resource, "problem reported");
        Routed::Reported(problem)
    }
}

/// Analyze one component of `current` against the component with the same
/// id in `reference`.
pub fn analyze_component(
    reference: &Baseline,
    current: &Baseline,
    component_id: &str,
    settings: &ApiConfigSettings,
    options: &AnalyzerOptions,
    filters: &FilterStore,
) -> Result<ComponentReport, AnalyzeError> {
    let cur = current
        .component(component_id)
        .ok_or_else(|| AnalyzeError::UnknownComponent(component_id.to_string()))?;
    let old = reference
        .component(component_id)
        .ok_or_else(|| AnalyzeError::UnknownComponent(component_id.to_string()))?;
    Ok(analyze_pair(
        (old, reference),
        (cur, current),
        settings,
        options,
        filters,
    ))
}

fn analyze_pair(
    reference: (&Component, &Baseline),
    current: (&Component, &Baseline),
    settings: &ApiConfigSettings,
    options: &AnalyzerOptions,
    filters: &FilterStore,
) -> ComponentReport {
    let (old, cur) = (reference.0, current.0);
    let evaluator = RuleEvaluator;
    let ctx = CompareContext::new(
        TypeScope::new(old, reference.1),
        TypeScope::new(cur, current.1),
    );
    // components with equal versions are compared too
    let delta = compare_components(&ctx, CompareOptions { force: true });

    let mut report = ComponentReport::new(old, cur);
    let leaves: Vec<&Change> = delta.as_ref().map(Delta::leaves).unwrap_or_default();
    report.delta_count = leaves.len();
    report.severity = delta
        .as_ref()
        .map(|d| evaluator.tree_severity(d))
        .unwrap_or_default();

    let major_bumped = cur.version.major > old.version.major;
    let keep_breakage =
        !major_bumped || options.report_breakage_when_major_changed || options.force_report;
    for change in leaves.iter().filter(|c| evaluator.is_breaking(c)) {
        if !keep_breakage {
            debug!(change = %change, "breakage accepted by major version increment");
            continue;
        }
        report.route(classify(change), options.compatibility, filters);
    }

    let shift = check_reexports(reference, current);
    if let Some(finding) = check_version(
        &old.version,
        &cur.version,
        report.severity,
        shift.as_ref(),
        settings,
    ) {
        report.suggested_version = Some(finding.suggested.clone());
        let mode = error_mode(finding.kind, settings);
        report.route(version_problem(finding.kind, &cur.id, finding.args), mode, filters);
    }

    if options.check_since_tags {
        for change in leaves.iter().filter(|c| requires_since_tag(c, &evaluator)) {
            if let Some((problem, mode)) = since_problem(change, &cur.version, options) {
                report.route(problem, mode, filters);
            }
        }
    }

    if options.check_usage {
        for problem in check_usage(cur, current.1) {
            report.route(problem, options.usage, filters);
        }
    }

    info!(
        component = %cur.id,
        severity = %report.severity,
        deltas = report.delta_count,
        problems = report.problems.len(),
        "component analyzed"
    );
    report
}

fn since_problem(
    change: &Change,
    version: &Version,
    options: &AnalyzerOptions,
) -> Option<(Problem, ErrorMode)> {
    let member = member_label(change);
    let declared = change.since.clone().unwrap_or_default();
    match check_since(change.since.as_deref(), version) {
        SinceCheck::Valid => None,
        SinceCheck::Missing => Some((
            since_tag_problem(SinceTagKind::Missing, change, vec![member]),
            options.missing_since_tag,
        )),
        SinceCheck::Malformed => Some((
            since_tag_problem(SinceTagKind::Malformed, change, vec![declared]),
            options.malformed_since_tag,
        )),
        SinceCheck::Invalid { expected } => Some((
            since_tag_problem(SinceTagKind::Invalid, change, vec![declared, expected, member]),
            options.invalid_since_tag,
        )),
    }
}

/// Analyze every component of `current` that also exists in `reference`.
///
/// Components are analyzed in parallel. `settings_for` supplies each
/// component's `.apiconfig`. Problems routed to the filter store are added
/// to `filters` once all components are done. Components removed from the
/// baseline are reported as compatibility problems.
pub fn analyze<F>(
    reference: &Baseline,
    current: &Baseline,
    settings_for: F,
    options: &AnalyzerOptions,
    filters: &mut FilterStore,
) -> AnalysisReport
where
    F: Fn(&str) -> ApiConfigSettings + Sync,
{
    let pairs: Vec<(&Component, &Component)> = current
        .components()
        .filter_map(|c| match reference.component(&c.id) {
            Some(r) => Some((r, c)),
            None => {
                debug!(component = %c.id, "new component, nothing to compare");
                None
            }
        })
        .collect();

    let store: &FilterStore = filters;
    let mut components: Vec<ComponentReport> = pairs
        .par_iter()
        .map(|(r, c)| {
            let settings = settings_for(&c.id);
            analyze_pair((*r, reference), (*c, current), &settings, options, store)
        })
        .collect();

    let mut removed = Vec::new();
    let mut removed_filtered = Vec::new();
    let mut to_filter = Vec::new();
    for component in reference.components() {
        if current.component(&component.id).is_some() {
            continue;
        }
        if current.is_skipped(&component.id) {
            debug!(component = %component.id, "component failed to load, not reported as removed");
            continue;
        }
        let change = Change::new(
            ElementType::ApiBaseline,
            DeltaKind::Removed,
            DeltaFlag::ApiComponent,
            &component.id,
        )
        .in_type(&current.name)
        .in_component(&component.id)
        .with_args([component.id.as_str()]);
        info!(component = %component.id, "component removed");
        match route(classify(&change), options.compatibility, filters) {
            Routed::Dropped => {}
            Routed::ToFilter(p) => to_filter.push(p),
            Routed::Filtered(p) => removed_filtered.push(p),
            Routed::Reported(p) => removed.push(p),
        }
    }

    for report in &mut components {
        to_filter.append(&mut report.to_filter);
    }
    for problem in &to_filter {
        filters.add(problem);
    }

    AnalysisReport::new(&reference.name, &current.name, components, removed)
        .with_baseline_filtered(removed_filtered)
}
