//! Field, method and nested type comparison.

use apicompat_model::descriptor::simple_name;
use apicompat_model::{
    FieldDescriptor, MethodDescriptor, Modifiers, RestrictionTag, Restrictions, TypeDescriptor,
    TypeKind,
};

use super::type_params::Owner;
use super::{compare, widen, TypeComparator};
use crate::delta::{Change, DeltaFlag, DeltaKind, ElementType};
use crate::rules::{is_api_visible, is_visible};

/// Either side of a member whose no-reference tag changed.
enum ReferenceTransition {
    Unchanged,
    Gained,
    Lost,
    Both,
}

fn reference_transition(old: &Restrictions, new: &Restrictions) -> ReferenceTransition {
    match (
        old.contains(RestrictionTag::NoReference),
        new.contains(RestrictionTag::NoReference),
    ) {
        (false, false) => ReferenceTransition::Unchanged,
        (false, true) => ReferenceTransition::Gained,
        (true, false) => ReferenceTransition::Lost,
        (true, true) => ReferenceTransition::Both,
    }
}

fn method_element(method: &MethodDescriptor) -> ElementType {
    if method.is_constructor() {
        ElementType::Constructor
    } else {
        ElementType::Method
    }
}

impl TypeComparator<'_> {
    fn member_key(&self, member: &str) -> String {
        format!("{}#{}", self.reference.name, member)
    }

    /// Restrictions clients of an added member see.
    fn added_restrictions(&self, member: &Restrictions) -> Restrictions {
        self.cur_restrictions.union(member)
    }

    fn member_change(
        &self,
        element: ElementType,
        kind: DeltaKind,
        flag: DeltaFlag,
        member: &str,
        modifiers: Modifiers,
        restrictions: Restrictions,
    ) -> Change {
        self.base_change(element, kind, flag, &self.member_key(member))
            .with_modifiers(modifiers)
            .with_restrictions(restrictions)
    }

    // ── Fields ──────────────────────────────────────────────────────

    pub(super) fn compare_fields(&mut self) {
        let (reference, current) = (self.reference, self.current);
        for old in &reference.fields {
            match current.field(&old.name) {
                None => self.removed_field(old),
                Some(new) => self.changed_field(old, new),
            }
        }
        for new in &current.fields {
            if reference.field(&new.name).is_none() {
                self.added_field(new);
            }
        }
    }

    fn field_is_inherited(&self, name: &str) -> bool {
        self.ctx
            .current
            .supertypes(self.current)
            .iter()
            .filter_map(|t| t.field(name))
            .any(|f| is_visible(f.modifiers.visibility, &f.restrictions))
    }

    fn removed_field(&mut self, field: &FieldDescriptor) {
        let restrictions = self.ref_restrictions.union(&field.restrictions);
        if !is_api_visible(&field.modifiers, &restrictions) {
            return;
        }
        let flag = if field.enum_constant {
            DeltaFlag::EnumConstant
        } else if self.field_is_inherited(&field.name) {
            DeltaFlag::FieldMovedUp
        } else {
            DeltaFlag::Field
        };
        let change = self
            .member_change(self.element, DeltaKind::Removed, flag, &field.name, field.modifiers, restrictions)
            .with_args([self.reference.name.as_str(), field.name.as_str()]);
        self.push(change);
    }

    fn added_field(&mut self, field: &FieldDescriptor) {
        let restrictions = self.added_restrictions(&field.restrictions);
        if !is_api_visible(&field.modifiers, &restrictions) {
            return;
        }
        let flag = if field.enum_constant {
            DeltaFlag::EnumConstant
        } else {
            DeltaFlag::Field
        };
        let change = self
            .member_change(self.element, DeltaKind::Added, flag, &field.name, field.modifiers, restrictions)
            .with_args([self.reference.name.as_str(), field.name.as_str()])
            .with_since(field.since.as_deref());
        self.push(change);
    }

    fn changed_field(&mut self, old: &FieldDescriptor, new: &FieldDescriptor) {
        let old_restrictions = self.ref_restrictions.union(&old.restrictions);
        let new_restrictions = self.cur_restrictions.union(&new.restrictions);
        let was_visible = is_visible(old.modifiers.visibility, &old_restrictions);
        let now_visible = is_visible(new.modifiers.visibility, &new_restrictions);
        if !was_visible && !now_visible {
            return;
        }

        let type_name = self.reference.name.clone();
        let args = [type_name.as_str(), old.name.as_str()];
        let api_flag = if old.enum_constant {
            DeltaFlag::ApiEnumConstant
        } else {
            DeltaFlag::ApiField
        };
        match reference_transition(&old_restrictions, &new_restrictions) {
            ReferenceTransition::Both => return,
            ReferenceTransition::Gained => {
                if was_visible {
                    let change = self
                        .member_change(self.element, DeltaKind::Removed, api_flag, &old.name, old.modifiers, old_restrictions)
                        .with_args(args);
                    self.push(change);
                }
                return;
            }
            ReferenceTransition::Lost => {
                if now_visible {
                    let change = self
                        .member_change(self.element, DeltaKind::Added, api_flag, &new.name, new.modifiers, new_restrictions)
                        .with_args(args)
                        .with_since(new.since.as_deref());
                    self.push(change);
                }
                return;
            }
            ReferenceTransition::Unchanged => {}
        }

        let modifiers = widen(old.modifiers, &new.modifiers);
        let mut changes: Vec<(DeltaKind, DeltaFlag)> = Vec::new();

        if old.type_name != new.type_name {
            changes.push((DeltaKind::Changed, DeltaFlag::Type));
        }
        match (&old.generic_signature, &new.generic_signature) {
            (Some(_), None) => changes.push((DeltaKind::Removed, DeltaFlag::TypeArgument)),
            (None, Some(_)) => changes.push((DeltaKind::Added, DeltaFlag::TypeArguments)),
            (Some(a), Some(b)) if a != b => changes.push((DeltaKind::Changed, DeltaFlag::TypeArgument)),
            _ => {}
        }

        let (was, now) = (old.modifiers, new.modifiers);
        if now.visibility < was.visibility {
            changes.push((DeltaKind::Changed, DeltaFlag::DecreaseAccess));
        } else if now.visibility > was.visibility {
            changes.push((DeltaKind::Changed, DeltaFlag::IncreaseAccess));
        }
        match (was.is_final, now.is_final) {
            (true, false) => {
                let flag = if !was.is_static {
                    DeltaFlag::FinalToNonFinalNonStatic
                } else if old.value.is_some() {
                    DeltaFlag::FinalToNonFinalStaticConstant
                } else {
                    DeltaFlag::FinalToNonFinalStaticNonConstant
                };
                changes.push((DeltaKind::Changed, flag));
            }
            (false, true) => changes.push((DeltaKind::Changed, DeltaFlag::NonFinalToFinal)),
            _ => {}
        }
        match (was.is_static, now.is_static) {
            (false, true) => changes.push((DeltaKind::Changed, DeltaFlag::NonStaticToStatic)),
            (true, false) => changes.push((DeltaKind::Changed, DeltaFlag::StaticToNonStatic)),
            _ => {}
        }
        match (was.is_transient, now.is_transient) {
            (false, true) => changes.push((DeltaKind::Changed, DeltaFlag::NonTransientToTransient)),
            (true, false) => changes.push((DeltaKind::Changed, DeltaFlag::TransientToNonTransient)),
            _ => {}
        }
        match (was.is_volatile, now.is_volatile) {
            (false, true) => changes.push((DeltaKind::Changed, DeltaFlag::NonVolatileToVolatile)),
            (true, false) => changes.push((DeltaKind::Changed, DeltaFlag::VolatileToNonVolatile)),
            _ => {}
        }
        // A constant that stopped being final is already reported above.
        if now.is_final {
            match (&old.value, &new.value) {
                (Some(a), Some(b)) if a != b => changes.push((DeltaKind::Changed, DeltaFlag::Value)),
                (Some(_), None) => changes.push((DeltaKind::Removed, DeltaFlag::Value)),
                (None, Some(_)) => changes.push((DeltaKind::Added, DeltaFlag::Value)),
                _ => {}
            }
        }

        for (kind, flag) in changes {
            let change = self
                .member_change(ElementType::Field, kind, flag, &old.name, modifiers, old_restrictions.clone())
                .with_args(args);
            self.push(change);
        }
    }

    // ── Methods ─────────────────────────────────────────────────────

    pub(super) fn compare_methods(&mut self) {
        let (reference, current) = (self.reference, self.current);
        for old in reference.methods.iter().filter(|m| !m.is_static_initializer()) {
            match current.method(&old.key()) {
                None => self.removed_method(old),
                Some(new) => self.changed_method(old, new),
            }
        }
        for new in current.methods.iter().filter(|m| !m.is_static_initializer()) {
            if reference.method(&new.key()).is_none() {
                self.added_method(new);
            }
        }
    }

    fn declared_in(supertypes: &[&TypeDescriptor], key: &str) -> bool {
        supertypes
            .iter()
            .filter_map(|t| t.method(key))
            .any(|m| is_visible(m.modifiers.visibility, &m.restrictions))
    }

    fn removed_method(&mut self, method: &MethodDescriptor) {
        let restrictions = self.ref_restrictions.union(&method.restrictions);
        if !is_api_visible(&method.modifiers, &restrictions) {
            return;
        }
        let flag = if self.reference.kind == TypeKind::Annotation {
            if method.default_value.is_some() {
                DeltaFlag::MethodWithDefaultValue
            } else {
                DeltaFlag::MethodWithoutDefaultValue
            }
        } else if method.is_constructor() {
            DeltaFlag::Constructor
        } else if Self::declared_in(&self.ctx.current.supertypes(self.current), &method.key()) {
            DeltaFlag::MethodMovedUp
        } else {
            DeltaFlag::Method
        };
        let signature = method.signature(&self.reference.name);
        let change = self
            .member_change(self.element, DeltaKind::Removed, flag, &method.key(), method.modifiers, restrictions)
            .with_args([self.reference.name.as_str(), signature.as_str()]);
        self.push(change);
    }

    fn added_method(&mut self, method: &MethodDescriptor) {
        let restrictions = self.added_restrictions(&method.restrictions);
        if !is_api_visible(&method.modifiers, &restrictions) {
            return;
        }
        let key = method.key();
        let flag = if self.current.kind == TypeKind::Annotation {
            if method.default_value.is_some() {
                DeltaFlag::MethodWithDefaultValue
            } else {
                DeltaFlag::MethodWithoutDefaultValue
            }
        } else if method.is_constructor() {
            DeltaFlag::Constructor
        } else if Self::declared_in(&self.ctx.current.supertypes(self.current), &key) {
            DeltaFlag::OverridenMethod
        } else if Self::declared_in(&self.ctx.reference.supertypes(self.reference), &key) {
            DeltaFlag::MethodMovedDown
        } else {
            DeltaFlag::Method
        };
        let signature = method.signature(&self.current.name);
        let change = self
            .member_change(self.element, DeltaKind::Added, flag, &key, method.modifiers, restrictions)
            .with_args([self.reference.name.as_str(), signature.as_str()])
            .with_since(method.since.as_deref());
        self.push(change);
    }

    fn changed_method(&mut self, old: &MethodDescriptor, new: &MethodDescriptor) {
        let old_restrictions = self.ref_restrictions.union(&old.restrictions);
        let new_restrictions = self.cur_restrictions.union(&new.restrictions);
        let was_visible = is_visible(old.modifiers.visibility, &old_restrictions);
        let now_visible = is_visible(new.modifiers.visibility, &new_restrictions);
        if !was_visible && !now_visible {
            return;
        }

        let key = old.key();
        let element = method_element(old);
        let type_name = self.reference.name.clone();
        let signature = old.signature(&type_name);
        let args = [type_name.as_str(), signature.as_str()];
        let api_flag = if old.is_constructor() {
            DeltaFlag::ApiConstructor
        } else {
            DeltaFlag::ApiMethod
        };
        match reference_transition(&old_restrictions, &new_restrictions) {
            ReferenceTransition::Both => return,
            ReferenceTransition::Gained => {
                if was_visible {
                    let change = self
                        .member_change(self.element, DeltaKind::Removed, api_flag, &key, old.modifiers, old_restrictions)
                        .with_args(args);
                    self.push(change);
                }
                return;
            }
            ReferenceTransition::Lost => {
                if now_visible {
                    let change = self
                        .member_change(self.element, DeltaKind::Added, api_flag, &key, new.modifiers, new_restrictions)
                        .with_args(args)
                        .with_since(new.since.as_deref());
                    self.push(change);
                }
                return;
            }
            ReferenceTransition::Unchanged => {}
        }

        let modifiers = widen(old.modifiers, &new.modifiers);
        let mut changes: Vec<(DeltaKind, DeltaFlag, Option<&str>)> = Vec::new();
        let (was, now) = (old.modifiers, new.modifiers);

        if now.visibility < was.visibility {
            changes.push((DeltaKind::Changed, DeltaFlag::DecreaseAccess, None));
        } else if now.visibility > was.visibility {
            changes.push((DeltaKind::Changed, DeltaFlag::IncreaseAccess, None));
        }
        match (old.varargs, new.varargs) {
            (true, false) => changes.push((DeltaKind::Changed, DeltaFlag::VarargsToArray, None)),
            (false, true) => changes.push((DeltaKind::Changed, DeltaFlag::ArrayToVarargs, None)),
            _ => {}
        }

        for (old_list, new_list, flag) in [
            (&old.checked_exceptions, &new.checked_exceptions, DeltaFlag::CheckedException),
            (&old.unchecked_exceptions, &new.unchecked_exceptions, DeltaFlag::UncheckedException),
        ] {
            for e in old_list.iter().filter(|e| !new_list.contains(e)) {
                changes.push((DeltaKind::Removed, flag, Some(e.as_str())));
            }
            for e in new_list.iter().filter(|e| !old_list.contains(e)) {
                changes.push((DeltaKind::Added, flag, Some(e.as_str())));
            }
        }

        let toggles = [
            (was.is_abstract, now.is_abstract, DeltaFlag::NonAbstractToAbstract, DeltaFlag::AbstractToNonAbstract),
            (was.is_final, now.is_final, DeltaFlag::NonFinalToFinal, DeltaFlag::FinalToNonFinal),
            (was.is_static, now.is_static, DeltaFlag::NonStaticToStatic, DeltaFlag::StaticToNonStatic),
            (was.is_native, now.is_native, DeltaFlag::NonNativeToNative, DeltaFlag::NativeToNonNative),
            (
                was.is_synchronized,
                now.is_synchronized,
                DeltaFlag::NonSynchronizedToSynchronized,
                DeltaFlag::SynchronizedToNonSynchronized,
            ),
        ];
        for (before, after, gained, lost) in toggles {
            match (before, after) {
                (false, true) => changes.push((DeltaKind::Changed, gained, None)),
                (true, false) => changes.push((DeltaKind::Changed, lost, None)),
                _ => {}
            }
        }

        match (&old.default_value, &new.default_value) {
            (Some(_), None) => changes.push((DeltaKind::Removed, DeltaFlag::AnnotationDefaultValue, None)),
            (None, Some(_)) => changes.push((DeltaKind::Added, DeltaFlag::AnnotationDefaultValue, None)),
            (Some(a), Some(b)) if a != b => {
                changes.push((DeltaKind::Changed, DeltaFlag::AnnotationDefaultValue, None))
            }
            _ => {}
        }

        let old_tags = old.restrictions.without(RestrictionTag::NoReference);
        let new_tags = new.restrictions.without(RestrictionTag::NoReference);
        let gained_tags = new_tags.difference(&old_tags);
        let lost_tags = old_tags.difference(&new_tags);
        let gained_text = gained_tags.to_string();
        let lost_text = lost_tags.to_string();
        if !gained_tags.is_empty() {
            changes.push((DeltaKind::Added, DeltaFlag::Restrictions, Some(gained_text.as_str())));
        }
        if !lost_tags.is_empty() {
            changes.push((DeltaKind::Removed, DeltaFlag::Restrictions, Some(lost_text.as_str())));
        }

        for (kind, flag, extra) in changes {
            let mut change_args: Vec<&str> = args.to_vec();
            change_args.extend(extra);
            let change = self
                .member_change(element, kind, flag, &key, modifiers, old_restrictions.clone())
                .with_args(change_args);
            self.push(change);
        }

        let owner = Owner {
            element,
            key: self.member_key(&key),
            label: signature.clone(),
            modifiers,
            restrictions: old_restrictions,
        };
        self.compare_type_parameters(&owner, &old.type_parameters, &new.type_parameters);
    }

    // ── Member types ────────────────────────────────────────────────

    pub(super) fn compare_member_types(&mut self) {
        let (reference, current) = (self.reference, self.current);
        for old in &reference.member_types {
            match current.member_type(&old.name) {
                None => {
                    let restrictions = self.ref_restrictions.union(&old.restrictions);
                    if is_api_visible(&old.modifiers, &restrictions) {
                        self.push_member_type(DeltaKind::Removed, old, restrictions);
                    }
                }
                Some(new) => self.changed_member_type(old, new),
            }
        }
        for new in &current.member_types {
            if reference.member_type(&new.name).is_none() {
                let restrictions = self.added_restrictions(&new.restrictions);
                if is_api_visible(&new.modifiers, &restrictions) {
                    self.push_member_type(DeltaKind::Added, new, restrictions);
                }
            }
        }
    }

    fn changed_member_type(&mut self, old: &TypeDescriptor, new: &TypeDescriptor) {
        let was_api = is_api_visible(&old.modifiers, &self.ref_restrictions.union(&old.restrictions));
        let now_api = is_api_visible(&new.modifiers, &self.cur_restrictions.union(&new.restrictions));
        let (was, now) = (old.modifiers.visibility, new.modifiers.visibility);
        match (was_api, now_api) {
            (false, false) => {}
            // Hidden without an access change: it was tagged no-reference.
            (true, false) if now >= was => {
                let restrictions = self.ref_restrictions.union(&old.restrictions);
                self.push_member_type(DeltaKind::Removed, old, restrictions);
            }
            (false, true) if now <= was => {
                let restrictions = self.added_restrictions(&new.restrictions);
                self.push_member_type(DeltaKind::Added, new, restrictions);
            }
            _ => {
                if let Some(delta) = compare(Some(old), Some(new), self.ctx) {
                    self.children.push(delta);
                }
            }
        }
    }

    fn push_member_type(&mut self, kind: DeltaKind, member: &TypeDescriptor, restrictions: Restrictions) {
        let since = if kind == DeltaKind::Added {
            member.since.as_deref()
        } else {
            None
        };
        let change = self
            .base_change(self.element, kind, DeltaFlag::TypeMember, &self.reference.name)
            .with_modifiers(member.modifiers)
            .with_restrictions(restrictions)
            .with_args([self.reference.name.as_str(), simple_name(&member.name)])
            .with_since(since);
        self.push(change);
    }
}
