//! Type resolution and supertype checks.

use apicompat_model::{Baseline, Component, TypeDescriptor, TypeKind, OBJECT};
use std::collections::BTreeSet;

use super::TypeComparator;
use crate::delta::{DeltaFlag, DeltaKind};

/// Resolves type names on one side of a comparison: the owning component
/// first, then every other component of its baseline.
#[derive(Debug, Clone, Copy)]
pub struct TypeScope<'a> {
    pub component: &'a Component,
    pub baseline: &'a Baseline,
}

impl<'a> TypeScope<'a> {
    pub fn new(component: &'a Component, baseline: &'a Baseline) -> Self {
        TypeScope {
            component,
            baseline,
        }
    }

    pub fn resolve(&self, name: &str) -> Option<&'a TypeDescriptor> {
        self.component
            .find_type(name)
            .or_else(|| self.baseline.find_type(name).map(|(_, t)| t))
    }

    /// Superclass names from the direct superclass upwards, excluding
    /// `Object`. Unresolvable types end the chain after being listed.
    pub fn superclass_chain(&self, descriptor: &TypeDescriptor) -> Vec<String> {
        let mut chain = Vec::new();
        let mut visited = BTreeSet::new();
        let mut next = descriptor.superclass.clone().filter(|s| s != OBJECT);
        while let Some(name) = next {
            if !visited.insert(name.clone()) {
                break;
            }
            next = self
                .resolve(&name)
                .and_then(|t| t.superclass.clone())
                .filter(|s| s != OBJECT);
            chain.push(name);
        }
        chain
    }

    /// Every interface the type implements or extends, directly or through
    /// its superclasses and superinterfaces.
    pub fn all_superinterfaces(&self, descriptor: &TypeDescriptor) -> BTreeSet<String> {
        let mut pending: Vec<String> = descriptor.superinterfaces.clone();
        for class in self.superclass_chain(descriptor) {
            if let Some(t) = self.resolve(&class) {
                pending.extend(t.superinterfaces.iter().cloned());
            }
        }

        let mut found = BTreeSet::new();
        while let Some(name) = pending.pop() {
            if !found.insert(name.clone()) {
                continue;
            }
            if let Some(t) = self.resolve(&name) {
                pending.extend(t.superinterfaces.iter().cloned());
            }
        }
        found
    }

    /// Resolved supertypes (superclasses, then interfaces) used to find
    /// members that moved within a hierarchy.
    pub fn supertypes(&self, descriptor: &TypeDescriptor) -> Vec<&'a TypeDescriptor> {
        let mut out: Vec<&'a TypeDescriptor> = self
            .superclass_chain(descriptor)
            .iter()
            .filter_map(|n| self.resolve(n))
            .collect();
        out.extend(
            self.all_superinterfaces(descriptor)
                .iter()
                .filter_map(|n| self.resolve(n)),
        );
        out
    }
}

impl TypeComparator<'_> {
    pub(super) fn check_superclass(&mut self) {
        if self.reference.kind != TypeKind::Class {
            return;
        }
        let (reference, current) = (self.reference, self.current);
        let old = reference.superclass_name();
        let new = current.superclass_name();
        if old == new {
            return;
        }

        let name = self.reference.name.clone();
        if old == OBJECT {
            self.push_type_change(DeltaKind::Added, DeltaFlag::Superclass, vec![name, new.to_string()]);
        } else if new == OBJECT {
            self.push_type_change(DeltaKind::Removed, DeltaFlag::Superclass, vec![name, old.to_string()]);
        } else {
            let new_chain = self.ctx.current.superclass_chain(current);
            if new_chain.iter().any(|c| c == old) {
                self.push_type_change(DeltaKind::Added, DeltaFlag::Superclass, vec![name, new.to_string()]);
            } else {
                self.push_type_change(DeltaKind::Removed, DeltaFlag::Superclass, vec![name, old.to_string()]);
            }
        }
    }

    pub(super) fn check_superinterfaces(&mut self) {
        let old = self.ctx.reference.all_superinterfaces(self.reference);
        let new = self.ctx.current.all_superinterfaces(self.current);
        let name = self.reference.name.clone();

        if old.iter().any(|i| !new.contains(i)) {
            self.push_type_change(
                DeltaKind::Changed,
                DeltaFlag::ContractedSuperinterfacesSet,
                vec![name.clone()],
            );
        }

        let added: Vec<&String> = new.difference(&old).collect();
        if added.is_empty() {
            return;
        }
        let with_methods = if self.reference.kind == TypeKind::Interface {
            added.iter().find(|i| {
                self.ctx.current.resolve(i).is_some_and(|t| {
                    t.methods
                        .iter()
                        .any(|m| !m.modifiers.is_static && !m.is_static_initializer())
                })
            })
        } else {
            None
        };
        match with_methods {
            Some(interface) => {
                let interface = interface.to_string();
                self.push_type_change(
                    DeltaKind::Added,
                    DeltaFlag::SuperInterfaceWithMethods,
                    vec![name, interface],
                );
            }
            None => self.push_type_change(
                DeltaKind::Changed,
                DeltaFlag::ExpandedSuperinterfacesSet,
                vec![name],
            ),
        }
    }
}
