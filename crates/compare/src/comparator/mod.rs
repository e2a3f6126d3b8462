//! Structural comparison of two versions of one type.
//!
//! `compare()` walks a reference and a current descriptor and produces the
//! delta group for the type, or `None` when nothing observable changed.
//! Checks run in a fixed order: restrictions, access, kind conversion,
//! modifiers, hierarchy, members, type parameters and nested member types.
//! A decrease in type visibility or a kind conversion stops the walk.

mod hierarchy;
mod members;
mod type_params;

pub use hierarchy::TypeScope;
use type_params::Owner;

use apicompat_model::descriptor::{enclosing_name, simple_name};
use apicompat_model::{Modifiers, RestrictionTag, Restrictions, TypeDescriptor, TypeKind};

use crate::delta::{Change, Delta, DeltaFlag, DeltaKind, ElementType};
use crate::rules::is_api_visible;

/// Both sides of a comparison.
#[derive(Debug, Clone, Copy)]
pub struct CompareContext<'a> {
    pub reference: TypeScope<'a>,
    pub current: TypeScope<'a>,
}

impl<'a> CompareContext<'a> {
    pub fn new(reference: TypeScope<'a>, current: TypeScope<'a>) -> Self {
        CompareContext { reference, current }
    }

    fn component_id(&self) -> &'a str {
        &self.current.component.id
    }
}

/// Compare two versions of a type.
///
/// A missing side yields a single removal or addition delta; a nested type
/// is reported against its enclosing type as a `TYPE_MEMBER` change.
/// Returns `None` when the type is unchanged or its change is not visible
/// to API clients.
pub fn compare(
    reference: Option<&TypeDescriptor>,
    current: Option<&TypeDescriptor>,
    ctx: &CompareContext<'_>,
) -> Option<Delta> {
    match (reference, current) {
        (None, None) => None,
        (Some(r), None) => type_presence_change(r, DeltaKind::Removed, ctx.reference, ctx),
        (None, Some(c)) => type_presence_change(c, DeltaKind::Added, ctx.current, ctx),
        (Some(r), Some(c)) => TypeComparator::new(r, c, ctx).run(),
    }
}

fn type_presence_change(
    descriptor: &TypeDescriptor,
    kind: DeltaKind,
    scope: TypeScope<'_>,
    ctx: &CompareContext<'_>,
) -> Option<Delta> {
    if !is_api_visible(&descriptor.modifiers, &descriptor.restrictions) {
        return None;
    }
    let change = match enclosing_name(&descriptor.name) {
        Some(outer) => {
            let element = scope
                .resolve(outer)
                .map(|t| ElementType::for_kind(t.kind))
                .unwrap_or(ElementType::Class);
            Change::new(element, kind, DeltaFlag::TypeMember, outer)
                .with_args([outer, simple_name(&descriptor.name)])
        }
        None => Change::new(
            ElementType::ApiComponent,
            kind,
            DeltaFlag::Type,
            &descriptor.name,
        )
        .with_args([descriptor.name.as_str(), ctx.component_id()]),
    };
    let change = change
        .in_component(ctx.component_id())
        .with_modifiers(descriptor.modifiers)
        .with_restrictions(effective_restrictions(descriptor));
    let change = if kind == DeltaKind::Added {
        change.with_since(descriptor.since.as_deref())
    } else {
        change
    };
    Some(Delta::Change(change))
}

/// Declared restrictions plus those implied by modifiers: a final type
/// cannot be extended.
pub(crate) fn effective_restrictions(descriptor: &TypeDescriptor) -> Restrictions {
    let mut restrictions = descriptor.restrictions.clone();
    if descriptor.modifiers.is_final && descriptor.kind == TypeKind::Class {
        restrictions.insert(RestrictionTag::NoExtend);
    }
    restrictions
}

pub(crate) struct TypeComparator<'a> {
    ctx: &'a CompareContext<'a>,
    reference: &'a TypeDescriptor,
    current: &'a TypeDescriptor,
    element: ElementType,
    /// Contract clients of the reference type relied on.
    ref_restrictions: Restrictions,
    /// Contract of the current type, applied to added members.
    cur_restrictions: Restrictions,
    children: Vec<Delta>,
}

impl<'a> TypeComparator<'a> {
    pub(crate) fn new(
        reference: &'a TypeDescriptor,
        current: &'a TypeDescriptor,
        ctx: &'a CompareContext<'a>,
    ) -> Self {
        TypeComparator {
            ctx,
            reference,
            current,
            element: ElementType::for_kind(reference.kind),
            ref_restrictions: effective_restrictions(reference),
            cur_restrictions: effective_restrictions(current),
            children: Vec::new(),
        }
    }

    pub(crate) fn run(mut self) -> Option<Delta> {
        let (reference, current) = (self.reference, self.current);
        if !is_api_visible(&reference.modifiers, &reference.restrictions)
            && !is_api_visible(&current.modifiers, &current.restrictions)
        {
            return None;
        }
        let name = reference.name.clone();

        self.check_restrictions();
        if !self.check_access() {
            return self.finish();
        }
        if self.reference.kind != self.current.kind {
            let from = ElementType::for_kind(self.reference.kind).code().to_string();
            let to = ElementType::for_kind(self.current.kind).code().to_string();
            self.push_type_change(DeltaKind::Changed, DeltaFlag::TypeConversion, vec![name, from, to]);
            return self.finish();
        }
        self.check_static();
        self.check_superclass();
        self.check_superinterfaces();
        self.compare_fields();
        self.compare_methods();
        self.check_type_modifiers();
        let owner = Owner {
            element: self.element,
            key: name.clone(),
            label: name,
            modifiers: self.type_modifiers(),
            restrictions: self.ref_restrictions.clone(),
        };
        self.compare_type_parameters(&owner, &reference.type_parameters, &current.type_parameters);
        self.compare_member_types();
        self.finish()
    }

    fn finish(self) -> Option<Delta> {
        Delta::group(self.element, &self.reference.name, self.children)
    }

    /// Reference modifiers widened to the larger of the two visibilities.
    fn type_modifiers(&self) -> Modifiers {
        widen(self.reference.modifiers, &self.current.modifiers)
    }

    fn push(&mut self, change: Change) {
        self.children.push(Delta::Change(change));
    }

    fn base_change(&self, element: ElementType, kind: DeltaKind, flag: DeltaFlag, key: &str) -> Change {
        Change::new(element, kind, flag, key)
            .in_type(&self.reference.name)
            .in_component(self.ctx.component_id())
    }

    fn push_type_change(&mut self, kind: DeltaKind, flag: DeltaFlag, args: Vec<String>) {
        let change = self
            .base_change(self.element, kind, flag, &self.reference.name)
            .with_modifiers(self.type_modifiers())
            .with_restrictions(self.ref_restrictions.clone())
            .with_args(args);
        self.push(change);
    }

    fn check_restrictions(&mut self) {
        let old = self.reference.restrictions.without(RestrictionTag::NoReference);
        let new = self.current.restrictions.without(RestrictionTag::NoReference);
        let name = self.reference.name.clone();
        let added = new.difference(&old);
        if !added.is_empty() {
            self.push_type_change(DeltaKind::Added, DeltaFlag::Restrictions, vec![name.clone(), added.to_string()]);
        }
        let removed = old.difference(&new);
        if !removed.is_empty() {
            self.push_type_change(DeltaKind::Removed, DeltaFlag::Restrictions, vec![name, removed.to_string()]);
        }
    }

    /// Returns false when visibility decreased and the walk should stop.
    fn check_access(&mut self) -> bool {
        let old = self.reference.modifiers.visibility;
        let new = self.current.modifiers.visibility;
        let name = self.reference.name.clone();
        if new < old {
            self.push_type_change(DeltaKind::Changed, DeltaFlag::DecreaseAccess, vec![name]);
            return false;
        }
        if new > old {
            self.push_type_change(DeltaKind::Changed, DeltaFlag::IncreaseAccess, vec![name]);
        }
        true
    }

    fn check_static(&mut self) {
        let (old, new) = (self.reference.modifiers.is_static, self.current.modifiers.is_static);
        let name = self.reference.name.clone();
        match (old, new) {
            (false, true) => self.push_type_change(DeltaKind::Changed, DeltaFlag::NonStaticToStatic, vec![name]),
            (true, false) => self.push_type_change(DeltaKind::Changed, DeltaFlag::StaticToNonStatic, vec![name]),
            _ => {}
        }
    }

    /// Final and abstract toggles; only meaningful on classes.
    fn check_type_modifiers(&mut self) {
        if self.reference.kind != TypeKind::Class {
            return;
        }
        let (old, new) = (self.reference.modifiers, self.current.modifiers);
        let name = self.reference.name.clone();
        match (old.is_final, new.is_final) {
            (false, true) => self.push_type_change(DeltaKind::Changed, DeltaFlag::NonFinalToFinal, vec![name.clone()]),
            (true, false) => self.push_type_change(DeltaKind::Changed, DeltaFlag::FinalToNonFinal, vec![name.clone()]),
            _ => {}
        }
        match (old.is_abstract, new.is_abstract) {
            (false, true) => self.push_type_change(DeltaKind::Changed, DeltaFlag::NonAbstractToAbstract, vec![name]),
            (true, false) => self.push_type_change(DeltaKind::Changed, DeltaFlag::AbstractToNonAbstract, vec![name]),
            _ => {}
        }
    }
}

/// `old` with its visibility raised to `new`'s when that is wider.
pub(crate) fn widen(old: Modifiers, new: &Modifiers) -> Modifiers {
    Modifiers {
        visibility: old.visibility.max(new.visibility),
        ..old
    }
}
