//! Re-comparison of a subset of one component's types.

use std::collections::BTreeSet;

use apicompat_model::TypeDescriptor;
use tracing::debug;

use crate::comparator::{CompareContext, TypeScope};
use crate::component::compare_type_by_name;
use crate::delta::{Delta, ElementType};

/// Compare the named types of the component pair and every type whose
/// superclass chain or superinterface set contains one of them.
///
/// The result is an `API_COMPONENT` group holding only those types, or
/// `None` when none of them changed. Version checks are not applied.
pub fn compare_types(ctx: &CompareContext<'_>, names: &[&str]) -> Option<Delta> {
    let changed: BTreeSet<&str> = names.iter().copied().collect();
    let mut selected: BTreeSet<String> = changed.iter().map(|n| n.to_string()).collect();
    selected.extend(dependents(ctx.reference, &changed));
    selected.extend(dependents(ctx.current, &changed));
    debug!(
        component = %ctx.current.component.id,
        requested = names.len(),
        selected = selected.len(),
        "incremental compare"
    );

    let children: Vec<Delta> = selected
        .iter()
        .filter_map(|name| compare_type_by_name(ctx, name))
        .collect();
    Delta::group(ElementType::ApiComponent, &ctx.current.component.id, children)
}

fn dependents(scope: TypeScope<'_>, changed: &BTreeSet<&str>) -> Vec<String> {
    scope
        .component
        .types()
        .filter(|t| !changed.contains(t.name.as_str()) && depends_on(scope, t, changed))
        .map(|t| t.name.clone())
        .collect()
}

fn depends_on(scope: TypeScope<'_>, descriptor: &TypeDescriptor, changed: &BTreeSet<&str>) -> bool {
    scope
        .superclass_chain(descriptor)
        .iter()
        .chain(scope.all_superinterfaces(descriptor).iter())
        .any(|s| changed.contains(s.as_str()))
}
