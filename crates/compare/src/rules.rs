//! Restriction and visibility rules.
//!
//! Three questions are answered for every leaf change:
//!
//! - is it *reportable*: can an API client observe it, given the element's
//!   visibility and the restriction tags its clients were given?
//! - is it *breaking*: does the structural rule table classify it as an
//!   incompatible change?
//! - is it *new API*: does a compatible change widen the API and so call
//!   for a minor version increment?
//!
//! A change is breaking for reporting purposes only when it is both
//! structurally breaking and reportable.

use apicompat_model::{Modifiers, RestrictionTag, Restrictions, Visibility};
use serde::Serialize;
use std::fmt;

use crate::delta::{Change, Delta, DeltaFlag, DeltaKind, ElementType};

/// Worst-case classification of one change or a whole delta tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    #[default]
    None,
    CompatibleAddition,
    Breaking,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::None => write!(f, "NONE"),
            Severity::CompatibleAddition => write!(f, "COMPATIBLE_ADDITION"),
            Severity::Breaking => write!(f, "BREAKING"),
        }
    }
}

/// Visible to API clients: public, or protected in a type that may be subclassed.
pub fn is_visible(visibility: Visibility, restrictions: &Restrictions) -> bool {
    match visibility {
        Visibility::Public => true,
        Visibility::Protected => !restrictions.contains(RestrictionTag::NoExtend),
        Visibility::Package | Visibility::Private => false,
    }
}

/// Visible and not tagged no-reference. Elements failing this were never
/// API, so their addition or removal is not a delta at all.
pub fn is_api_visible(modifiers: &Modifiers, restrictions: &Restrictions) -> bool {
    is_visible(modifiers.visibility, restrictions)
        && !restrictions.contains(RestrictionTag::NoReference)
}

/// Whether `change` is observable by clients of an element with the given
/// restrictions and visibility.
pub fn is_reportable(change: &Change, restrictions: &Restrictions, visibility: Visibility) -> bool {
    use DeltaFlag as F;
    use DeltaKind::*;
    use ElementType as E;

    if matches!(change.element_type, E::ApiComponent | E::ApiBaseline) {
        return true;
    }

    let type_level = change.element_type.is_type();
    let no_reference = restrictions.contains(RestrictionTag::NoReference);
    if no_reference && !(type_level && change.flag == F::DecreaseAccess) {
        return false;
    }
    if !is_visible(visibility, restrictions) {
        return false;
    }

    let no_extend = restrictions.contains(RestrictionTag::NoExtend);
    let no_instantiate = restrictions.contains(RestrictionTag::NoInstantiate);
    let no_override = restrictions.contains(RestrictionTag::NoOverride);
    let no_implement = restrictions.contains(RestrictionTag::NoImplement);

    match (change.element_type, change.kind, change.flag) {
        (E::Class, Added, F::Method) => !(no_extend && change.modifiers.is_abstract),
        (E::Class, Changed, F::NonFinalToFinal | F::NonAbstractToAbstract) => !no_extend,
        (E::Class | E::Enum, Added | Removed, F::Constructor | F::ApiConstructor) => !no_instantiate,
        (E::Method, Changed, F::NonFinalToFinal) => !(no_extend || no_override),
        (E::Method, Changed, F::NonAbstractToAbstract) => !no_extend,
        (E::Method, Changed, F::DecreaseAccess) => !no_override,
        (E::Interface, Added, F::Field | F::Method) => !no_implement,
        (E::Interface, Added, F::SuperInterfaceWithMethods) => !(no_implement || no_extend),
        _ => true,
    }
}

/// The structural rule table: changes that break existing clients when
/// they are observable.
pub fn is_breaking_change(change: &Change) -> bool {
    use DeltaFlag as F;
    use DeltaKind::*;
    use ElementType as E;

    let kind = change.kind;
    let flag = change.flag;
    match change.element_type {
        E::ApiBaseline => matches!((kind, flag), (Removed, F::ApiComponent)),
        E::ApiComponent => matches!(
            (kind, flag),
            (
                Removed,
                F::Type | F::ApiType | F::ReexportedType | F::ReexportedApiType
            )
        ),
        E::Annotation => matches!(
            (kind, flag),
            (Added, F::MethodWithoutDefaultValue)
                | (
                    Removed,
                    F::Field
                        | F::MethodWithDefaultValue
                        | F::MethodWithoutDefaultValue
                        | F::TypeMember
                        | F::ApiField
                        | F::ApiMethod
                )
                | (Changed, F::TypeConversion | F::DecreaseAccess)
        ),
        E::Interface => matches!(
            (kind, flag),
            (
                Added,
                F::Field
                    | F::Method
                    | F::Restrictions
                    | F::SuperInterfaceWithMethods
                    | F::TypeParameter
            ) | (
                Removed,
                F::Field
                    | F::Method
                    | F::TypeMember
                    | F::TypeParameter
                    | F::TypeParameters
                    | F::ApiField
                    | F::ApiMethod
            ) | (
                Changed,
                F::TypeConversion | F::ContractedSuperinterfacesSet | F::DecreaseAccess
            )
        ),
        E::Enum => matches!(
            (kind, flag),
            (
                Removed,
                F::Field
                    | F::EnumConstant
                    | F::Method
                    | F::Constructor
                    | F::TypeMember
                    | F::ApiField
                    | F::ApiMethod
                    | F::ApiEnumConstant
            ) | (
                Changed,
                F::ContractedSuperinterfacesSet | F::TypeConversion | F::DecreaseAccess
            )
        ),
        E::Class => match (kind, flag) {
            (Added, F::Method) => change.modifiers.is_abstract,
            _ => matches!(
                (kind, flag),
                (Added, F::Restrictions | F::TypeParameter)
                    | (
                        Removed,
                        F::Field
                            | F::Method
                            | F::Constructor
                            | F::TypeMember
                            | F::Superclass
                            | F::TypeParameter
                            | F::TypeParameters
                            | F::ApiField
                            | F::ApiMethod
                            | F::ApiConstructor
                    )
                    | (
                        Changed,
                        F::ContractedSuperinterfacesSet
                            | F::NonAbstractToAbstract
                            | F::NonFinalToFinal
                            | F::TypeConversion
                            | F::DecreaseAccess
                    )
            ),
        },
        E::Field => matches!(
            (kind, flag),
            (Added, F::Value)
                | (Removed, F::Value | F::TypeArgument)
                | (
                    Changed,
                    F::Type
                        | F::Value
                        | F::DecreaseAccess
                        | F::FinalToNonFinalStaticConstant
                        | F::NonFinalToFinal
                        | F::StaticToNonStatic
                        | F::NonStaticToStatic
                )
        ),
        E::Method => matches!(
            (kind, flag),
            (Added, F::TypeParameter | F::Restrictions)
                | (
                    Removed,
                    F::AnnotationDefaultValue | F::TypeParameter | F::TypeParameters
                )
                | (
                    Changed,
                    F::VarargsToArray
                        | F::DecreaseAccess
                        | F::NonAbstractToAbstract
                        | F::NonStaticToStatic
                        | F::StaticToNonStatic
                        | F::NonFinalToFinal
                )
        ),
        E::Constructor => matches!(
            (kind, flag),
            (Added, F::TypeParameter)
                | (Removed, F::TypeParameter | F::TypeParameters)
                | (Changed, F::VarargsToArray | F::DecreaseAccess)
        ),
        E::TypeParameter => matches!(flag, F::ClassBound | F::InterfaceBound),
    }
}

/// Whether a compatible change adds to the API surface.
pub fn is_new_api(change: &Change) -> bool {
    use DeltaFlag as F;

    let visible = is_visible(change.modifiers.visibility, &change.restrictions);
    match change.kind {
        DeltaKind::Added => match change.flag {
            F::TypeMember
            | F::Method
            | F::Constructor
            | F::EnumConstant
            | F::MethodWithDefaultValue
            | F::MethodWithoutDefaultValue
            | F::MethodMovedDown
            | F::Field
            | F::Type
            | F::ApiType
            | F::ApiField
            | F::ApiMethod
            | F::ApiConstructor
            | F::ApiEnumConstant
            | F::TypeParameters
            | F::TypeArguments
            | F::Superclass
            | F::SuperInterfaceWithMethods
            | F::CheckedException
            | F::UncheckedException => visible,
            _ => false,
        },
        DeltaKind::Changed => match change.flag {
            F::NonNativeToNative
            | F::NativeToNonNative
            | F::NonSynchronizedToSynchronized
            | F::SynchronizedToNonSynchronized
            | F::NonTransientToTransient
            | F::TransientToNonTransient
            | F::NonVolatileToVolatile
            | F::VolatileToNonVolatile => false,
            _ if matches!(
                change.element_type,
                ElementType::Field | ElementType::Method | ElementType::Constructor
            ) =>
            {
                visible
            }
            F::ExpandedSuperinterfacesSet | F::IncreaseAccess => visible,
            _ => false,
        },
        DeltaKind::Removed => match change.flag {
            F::MethodMovedUp | F::FieldMovedUp | F::CheckedException | F::UncheckedException => {
                visible
            }
            _ => false,
        },
    }
}

/// The seam through which comparisons ask for compatibility verdicts.
pub trait Evaluator: Send + Sync {
    fn is_reportable(&self, change: &Change) -> bool;

    fn is_breaking(&self, change: &Change) -> bool;

    fn is_new_api(&self, change: &Change) -> bool;

    fn is_compatible(&self, change: &Change) -> bool {
        !self.is_breaking(change)
    }

    fn severity(&self, change: &Change) -> Severity {
        if self.is_breaking(change) {
            Severity::Breaking
        } else if self.is_new_api(change) {
            Severity::CompatibleAddition
        } else {
            Severity::None
        }
    }

    /// Worst severity over every leaf of a tree.
    fn tree_severity(&self, delta: &Delta) -> Severity {
        delta
            .leaves()
            .into_iter()
            .map(|c| self.severity(c))
            .max()
            .unwrap_or_default()
    }
}

/// Evaluator applying the restriction and visibility rules of this module.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleEvaluator;

impl Evaluator for RuleEvaluator {
    fn is_reportable(&self, change: &Change) -> bool {
        is_reportable(change, &change.restrictions, change.modifiers.visibility)
    }

    fn is_breaking(&self, change: &Change) -> bool {
        is_breaking_change(change) && self.is_reportable(change)
    }

    fn is_new_api(&self, change: &Change) -> bool {
        is_new_api(change)
    }
}
