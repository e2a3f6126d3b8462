//! Aggregated analysis output.

use serde::Serialize;
use serde_json::Value;

use crate::analyzer::ComponentReport;
use crate::problem::{Problem, ProblemSeverity};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReportSummary {
    pub components: usize,
    pub errors: usize,
    pub warnings: usize,
    pub filtered: usize,
}

/// Problems of every analyzed component, plus components that were removed.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub reference: String,
    pub current: String,
    pub components: Vec<ComponentReport>,
    /// Problems not attached to a component of the current baseline.
    pub baseline_problems: Vec<Problem>,
    /// Baseline problems suppressed by an existing filter.
    pub baseline_filtered: Vec<Problem>,
    pub summary: ReportSummary,
}

impl AnalysisReport {
    pub fn new(
        reference: &str,
        current: &str,
        mut components: Vec<ComponentReport>,
        baseline_problems: Vec<Problem>,
    ) -> Self {
        components.sort_by(|a, b| a.component_id.cmp(&b.component_id));
        let mut summary = ReportSummary {
            components: components.len(),
            ..ReportSummary::default()
        };
        for problem in components
            .iter()
            .flat_map(|c| c.problems.iter())
            .chain(baseline_problems.iter())
        {
            match problem.severity {
                ProblemSeverity::Error => summary.errors += 1,
                ProblemSeverity::Warning => summary.warnings += 1,
            }
        }
        summary.filtered = components.iter().map(|c| c.filtered.len()).sum();
        AnalysisReport {
            reference: reference.to_string(),
            current: current.to_string(),
            components,
            baseline_problems,
            baseline_filtered: Vec::new(),
            summary,
        }
    }

    pub fn with_baseline_filtered(mut self, filtered: Vec<Problem>) -> Self {
        self.summary.filtered += filtered.len();
        self.baseline_filtered = filtered;
        self
    }

    /// Every reported problem in component order.
    pub fn problems(&self) -> impl Iterator<Item = &Problem> {
        self.baseline_problems
            .iter()
            .chain(self.components.iter().flat_map(|c| c.problems.iter()))
    }

    pub fn problem_count(&self) -> usize {
        self.summary.errors + self.summary.warnings
    }

    pub fn has_errors(&self) -> bool {
        self.summary.errors > 0
    }

    pub fn component(&self, id: &str) -> Option<&ComponentReport> {
        self.components.iter().find(|c| c.component_id == id)
    }

    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    pub fn to_text(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!(
            "{} -> {}: {} component(s), {} error(s), {} warning(s), {} filtered",
            self.reference,
            self.current,
            self.summary.components,
            self.summary.errors,
            self.summary.warnings,
            self.summary.filtered
        ));

        if !self.baseline_problems.is_empty() {
            lines.push(String::new());
            lines.push("BASELINE:".to_string());
            lines.extend(self.baseline_problems.iter().map(|p| format!("  {}", p)));
        }

        for component in &self.components {
            if component.problems.is_empty() {
                continue;
            }
            lines.push(String::new());
            let mut header = format!(
                "{} {} -> {} ({})",
                component.component_id,
                component.reference_version,
                component.declared_version,
                component.severity
            );
            if let Some(suggested) = &component.suggested_version {
                header.push_str(&format!(", suggested {}", suggested));
            }
            lines.push(header);
            lines.extend(component.problems.iter().map(|p| format!("  {}", p)));
        }

        lines.join("\n")
    }
}
