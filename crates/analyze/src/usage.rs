//! Illegal use of restricted types.
//!
//! A component may not extend, implement or override what another
//! component tagged as closed to clients. Types of the same component are
//! exempt: restrictions describe the contract with clients, not with the
//! owner.

use apicompat_compare::ElementType;
use apicompat_model::{Baseline, Component, RestrictionTag, TypeDescriptor, TypeKind};
use tracing::debug;

use crate::problem::{usage_problem, Problem, UsageKind};

/// A type owned by a component other than `component`.
fn foreign<'a>(
    component: &Component,
    baseline: &'a Baseline,
    name: &str,
) -> Option<&'a TypeDescriptor> {
    if component.find_type(name).is_some() {
        return None;
    }
    baseline
        .find_type(name)
        .filter(|(owner, _)| owner.id != component.id)
        .map(|(_, t)| t)
}

fn closed_to_extension(t: &TypeDescriptor) -> bool {
    t.restrictions.contains(RestrictionTag::NoExtend)
        || (t.kind == TypeKind::Class && t.modifiers.is_final)
}

/// Every type of the component, nested types included.
fn all_types(component: &Component) -> Vec<&TypeDescriptor> {
    let mut out = Vec::new();
    let mut stack: Vec<&TypeDescriptor> = component.types().collect();
    while let Some(t) = stack.pop() {
        stack.extend(t.member_types.iter());
        out.push(t);
    }
    out.sort_by(|a, b| a.name.cmp(&b.name));
    out
}

/// Check every type of `component` against the restrictions of the
/// supertypes it takes from other components of `baseline`.
pub fn check_usage(component: &Component, baseline: &Baseline) -> Vec<Problem> {
    let mut problems = Vec::new();
    for t in all_types(component) {
        let element = ElementType::for_kind(t.kind);
        let mut report = |kind: UsageKind, element: ElementType, args: Vec<String>| {
            debug!(type_name = %t.name, ?kind, "illegal usage");
            problems.push(usage_problem(kind, element, &component.id, &t.name, args));
        };

        if let Some(sup_name) = t.superclass.as_deref() {
            if let Some(sup) = foreign(component, baseline, sup_name) {
                if closed_to_extension(sup) {
                    report(UsageKind::IllegalExtend, element, vec![sup_name.to_string()]);
                }
                for method in t.methods.iter().filter(|m| !m.is_constructor()) {
                    let Some(overridden) = sup.method(&method.key()) else {
                        continue;
                    };
                    if overridden.restrictions.contains(RestrictionTag::NoOverride)
                        || overridden.restrictions.contains(RestrictionTag::NoExtend)
                    {
                        report(
                            UsageKind::IllegalOverride,
                            ElementType::Method,
                            vec![sup_name.to_string(), method.signature(sup_name)],
                        );
                    }
                }
            }
        }

        for iface_name in &t.superinterfaces {
            let Some(iface) = foreign(component, baseline, iface_name) else {
                continue;
            };
            if t.kind == TypeKind::Interface {
                if iface.restrictions.contains(RestrictionTag::NoExtend) {
                    report(UsageKind::IllegalExtend, element, vec![iface_name.clone()]);
                }
            } else if iface.restrictions.contains(RestrictionTag::NoImplement) {
                report(UsageKind::IllegalImplement, element, vec![iface_name.clone()]);
            }
        }
    }
    problems
}
