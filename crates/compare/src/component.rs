//! Baseline and component level comparison.

use apicompat_model::{Baseline, Component};
use rayon::prelude::*;
use tracing::{debug, info};

use crate::comparator::{compare, CompareContext, TypeScope};
use crate::delta::{Change, Delta, DeltaFlag, DeltaKind, ElementType};

#[derive(Debug, Clone, Copy, Default)]
pub struct CompareOptions {
    /// Compare components even when their versions are equal.
    pub force: bool,
}

/// Compare every component of two baselines.
///
/// Components present in only one baseline become `API_COMPONENT` deltas on
/// the baseline; components present in both are compared in parallel.
pub fn compare_baselines(
    reference: &Baseline,
    current: &Baseline,
    options: CompareOptions,
) -> Option<Delta> {
    let mut children = Vec::new();

    for component in reference.components() {
        if current.component(&component.id).is_none() && !current.is_skipped(&component.id) {
            children.push(component_presence(component, DeltaKind::Removed, &current.name));
        }
    }

    let pairs: Vec<(&Component, &Component)> = reference
        .components()
        .filter_map(|r| current.component(&r.id).map(|c| (r, c)))
        .collect();
    let compared: Vec<Delta> = pairs
        .par_iter()
        .filter_map(|(r, c)| {
            let ctx = CompareContext::new(TypeScope::new(r, reference), TypeScope::new(c, current));
            compare_components(&ctx, options)
        })
        .collect();
    children.extend(compared);

    for component in current.components() {
        if reference.component(&component.id).is_none() && !reference.is_skipped(&component.id) {
            children.push(component_presence(component, DeltaKind::Added, &current.name));
        }
    }

    Delta::group(ElementType::ApiBaseline, &current.name, children)
}

fn component_presence(component: &Component, kind: DeltaKind, baseline: &str) -> Delta {
    info!(component = %component.id, %kind, "component presence changed");
    Delta::Change(
        Change::new(
            ElementType::ApiBaseline,
            kind,
            DeltaFlag::ApiComponent,
            &component.id,
        )
        .in_type(baseline)
        .in_component(&component.id)
        .with_args([component.id.as_str()]),
    )
}

/// Compare the two components named by `ctx`.
pub fn compare_components(ctx: &CompareContext<'_>, options: CompareOptions) -> Option<Delta> {
    let reference = ctx.reference.component;
    let current = ctx.current.component;
    if reference.version == current.version && !options.force {
        debug!(component = %current.id, version = %current.version, "versions equal, skipping");
        return None;
    }
    info!(
        component = %current.id,
        from = %reference.version,
        to = %current.version,
        "comparing component"
    );

    let mut children = Vec::new();
    execution_environments(reference, current, &mut children);

    for name in reference.type_names() {
        children.extend(compare_type_by_name(ctx, name));
    }
    for name in current.type_names() {
        if reference.find_type(name).is_none() {
            children.extend(compare_type_by_name(ctx, name));
        }
    }

    reexported_types(ctx, &mut children);

    let delta = Delta::group(ElementType::ApiComponent, &current.id, children);
    debug!(
        component = %current.id,
        changes = delta.as_ref().map_or(0, Delta::leaf_count),
        "component compared"
    );
    delta
}

/// Compare one type of the component pair, honouring its API status on
/// both sides. Works for nested names.
pub(crate) fn compare_type_by_name(ctx: &CompareContext<'_>, name: &str) -> Option<Delta> {
    let reference = ctx.reference.component;
    let current = ctx.current.component;
    let top_level = name.split('$').next().unwrap_or(name);
    if reference.is_type_skipped(top_level) || current.is_type_skipped(top_level) {
        debug!(type_name = %name, "type failed to load on one side, not compared");
        return None;
    }
    let old = reference.find_type(name);
    let new = current.find_type(name);
    match (old, new) {
        (None, None) => None,
        (Some(_), _) if !reference.is_api_type(name) => match new {
            Some(_) if current.is_api_type(name) => {
                Some(api_type_change(current, name, DeltaKind::Added))
            }
            _ => None,
        },
        (Some(o), None) => compare(Some(o), None, ctx),
        (Some(_), Some(_)) if !current.is_api_type(name) => {
            Some(api_type_change(current, name, DeltaKind::Removed))
        }
        (Some(o), Some(n)) => compare(Some(o), Some(n), ctx),
        (None, Some(n)) if current.is_api_type(name) => compare(None, Some(n), ctx),
        (None, Some(_)) => None,
    }
}

fn component_change(component: &Component, kind: DeltaKind, flag: DeltaFlag, key: &str) -> Change {
    Change::new(ElementType::ApiComponent, kind, flag, key)
        .in_type(&component.id)
        .in_component(&component.id)
}

fn api_type_change(component: &Component, type_name: &str, kind: DeltaKind) -> Delta {
    let since = component
        .find_type(type_name)
        .filter(|_| kind == DeltaKind::Added)
        .and_then(|t| t.since.as_deref());
    Delta::Change(
        component_change(component, kind, DeltaFlag::ApiType, type_name)
            .with_args([type_name, component.id.as_str()])
            .with_since(since),
    )
}

fn execution_environments(reference: &Component, current: &Component, out: &mut Vec<Delta>) {
    for ee in &reference.execution_environments {
        if !current.execution_environments.contains(ee) {
            out.push(Delta::Change(
                component_change(current, DeltaKind::Removed, DeltaFlag::ExecutionEnvironment, &current.id)
                    .with_args([current.id.as_str(), ee.as_str()]),
            ));
        }
    }
    for ee in &current.execution_environments {
        if !reference.execution_environments.contains(ee) {
            out.push(Delta::Change(
                component_change(current, DeltaKind::Added, DeltaFlag::ExecutionEnvironment, &current.id)
                    .with_args([current.id.as_str(), ee.as_str()]),
            ));
        }
    }
}

/// API types of re-exported components that the current component no
/// longer passes on to its clients.
fn reexported_types(ctx: &CompareContext<'_>, out: &mut Vec<Delta>) {
    let reference = ctx.reference.component;
    let current = ctx.current.component;

    for reexport in &reference.reexports {
        let Some(old_provider) = ctx.reference.baseline.component(&reexport.component_id) else {
            continue;
        };
        let new_provider = current
            .reexport(&reexport.component_id)
            .and_then(|_| ctx.current.baseline.component(&reexport.component_id));

        for t in old_provider.types() {
            if !old_provider.is_api_type(&t.name) {
                continue;
            }
            let flag = match new_provider {
                None => DeltaFlag::ReexportedType,
                Some(p) if p.find_type(&t.name).is_none() => DeltaFlag::ReexportedType,
                Some(p) if !p.is_api_type(&t.name) => DeltaFlag::ReexportedApiType,
                Some(_) => continue,
            };
            out.push(Delta::Change(
                component_change(current, DeltaKind::Removed, flag, &t.name)
                    .with_args([t.name.as_str(), reexport.component_id.as_str()]),
            ));
        }
    }
}
