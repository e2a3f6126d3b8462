//! Positional comparison of type parameter lists and their bounds.

use apicompat_model::{Modifiers, Restrictions, TypeParameter};

use super::TypeComparator;
use crate::delta::{DeltaFlag, DeltaKind, ElementType};

/// The type or method declaring a type parameter list.
pub(super) struct Owner {
    pub element: ElementType,
    pub key: String,
    /// Type name or method signature used in problem arguments.
    pub label: String,
    pub modifiers: Modifiers,
    pub restrictions: Restrictions,
}

impl TypeComparator<'_> {
    pub(super) fn compare_type_parameters(
        &mut self,
        owner: &Owner,
        old: &[TypeParameter],
        new: &[TypeParameter],
    ) {
        if old.is_empty() && new.is_empty() {
            return;
        }
        if old.is_empty() {
            self.push_owner_change(owner, DeltaKind::Added, DeltaFlag::TypeParameters, None);
            return;
        }
        if new.is_empty() {
            self.push_owner_change(owner, DeltaKind::Removed, DeltaFlag::TypeParameters, None);
            return;
        }

        for i in 0..old.len().max(new.len()) {
            match (old.get(i), new.get(i)) {
                (Some(p), None) => {
                    self.push_owner_change(owner, DeltaKind::Removed, DeltaFlag::TypeParameter, Some(&p.name))
                }
                (None, Some(p)) => {
                    self.push_owner_change(owner, DeltaKind::Added, DeltaFlag::TypeParameter, Some(&p.name))
                }
                (Some(a), Some(b)) => {
                    if a.name != b.name {
                        self.push_owner_change(owner, DeltaKind::Changed, DeltaFlag::TypeParameterName, Some(&a.name));
                    }
                    self.compare_bounds(owner, a, b);
                }
                (None, None) => {}
            }
        }
    }

    fn compare_bounds(&mut self, owner: &Owner, old: &TypeParameter, new: &TypeParameter) {
        match (&old.class_bound, &new.class_bound) {
            (Some(b), None) => self.push_bound_change(owner, &old.name, DeltaKind::Removed, DeltaFlag::ClassBound, b),
            (None, Some(b)) => self.push_bound_change(owner, &old.name, DeltaKind::Added, DeltaFlag::ClassBound, b),
            (Some(a), Some(b)) if a != b => {
                self.push_bound_change(owner, &old.name, DeltaKind::Changed, DeltaFlag::ClassBound, a)
            }
            _ => {}
        }

        let (old_bounds, new_bounds) = (&old.interface_bounds, &new.interface_bounds);
        for i in 0..old_bounds.len().max(new_bounds.len()) {
            match (old_bounds.get(i), new_bounds.get(i)) {
                (Some(b), None) => {
                    self.push_bound_change(owner, &old.name, DeltaKind::Removed, DeltaFlag::InterfaceBound, b)
                }
                (None, Some(b)) => {
                    self.push_bound_change(owner, &old.name, DeltaKind::Added, DeltaFlag::InterfaceBound, b)
                }
                (Some(a), Some(b)) if a != b => {
                    self.push_bound_change(owner, &old.name, DeltaKind::Changed, DeltaFlag::InterfaceBound, a)
                }
                _ => {}
            }
        }
    }

    fn push_owner_change(&mut self, owner: &Owner, kind: DeltaKind, flag: DeltaFlag, parameter: Option<&str>) {
        let mut args = vec![owner.label.clone()];
        args.extend(parameter.map(str::to_string));
        let change = self
            .base_change(owner.element, kind, flag, &owner.key)
            .with_modifiers(owner.modifiers)
            .with_restrictions(owner.restrictions.clone())
            .with_args(args);
        self.push(change);
    }

    fn push_bound_change(&mut self, owner: &Owner, parameter: &str, kind: DeltaKind, flag: DeltaFlag, bound: &str) {
        let key = format!("{}<{}>", owner.key, parameter);
        let change = self
            .base_change(ElementType::TypeParameter, kind, flag, &key)
            .with_modifiers(owner.modifiers)
            .with_restrictions(owner.restrictions.clone())
            .with_args([owner.label.as_str(), parameter, bound]);
        self.push(change);
    }
}
