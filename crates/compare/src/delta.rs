//! The delta tree produced by comparing two baselines.
//!
//! Element types, change kinds and flags are closed enumerations. Their
//! numeric codes exist only so the problem factory can pack them into a
//! stable integer id.

use apicompat_model::{Modifiers, Restrictions, TypeKind};
use serde::Serialize;
use serde_json::Value;
use std::fmt;

/// The kind of element a delta is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ElementType {
    Annotation,
    ApiComponent,
    ApiBaseline,
    Class,
    Constructor,
    Enum,
    Field,
    Interface,
    Method,
    TypeParameter,
}

impl ElementType {
    pub const ALL: [ElementType; 10] = [
        ElementType::Annotation,
        ElementType::ApiComponent,
        ElementType::ApiBaseline,
        ElementType::Class,
        ElementType::Constructor,
        ElementType::Enum,
        ElementType::Field,
        ElementType::Interface,
        ElementType::Method,
        ElementType::TypeParameter,
    ];

    pub fn code(self) -> u32 {
        match self {
            ElementType::Annotation => 1,
            ElementType::ApiComponent => 2,
            ElementType::ApiBaseline => 3,
            ElementType::Class => 4,
            ElementType::Constructor => 5,
            ElementType::Enum => 6,
            ElementType::Field => 7,
            ElementType::Interface => 8,
            ElementType::Method => 9,
            ElementType::TypeParameter => 10,
        }
    }

    pub fn from_code(code: u32) -> Option<ElementType> {
        Self::ALL.into_iter().find(|e| e.code() == code)
    }

    pub fn for_kind(kind: TypeKind) -> ElementType {
        match kind {
            TypeKind::Class => ElementType::Class,
            TypeKind::Interface => ElementType::Interface,
            TypeKind::Enum => ElementType::Enum,
            TypeKind::Annotation => ElementType::Annotation,
        }
    }

    /// Class, interface, enum or annotation.
    pub fn is_type(self) -> bool {
        matches!(
            self,
            ElementType::Class | ElementType::Interface | ElementType::Enum | ElementType::Annotation
        )
    }

    pub fn name(self) -> &'static str {
        match self {
            ElementType::Annotation => "ANNOTATION",
            ElementType::ApiComponent => "API_COMPONENT",
            ElementType::ApiBaseline => "API_BASELINE",
            ElementType::Class => "CLASS",
            ElementType::Constructor => "CONSTRUCTOR",
            ElementType::Enum => "ENUM",
            ElementType::Field => "FIELD",
            ElementType::Interface => "INTERFACE",
            ElementType::Method => "METHOD",
            ElementType::TypeParameter => "TYPE_PARAMETER",
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeltaKind {
    Added,
    Changed,
    Removed,
}

impl DeltaKind {
    pub fn code(self) -> u32 {
        match self {
            DeltaKind::Added => 1,
            DeltaKind::Changed => 2,
            DeltaKind::Removed => 3,
        }
    }

    pub fn from_code(code: u32) -> Option<DeltaKind> {
        match code {
            1 => Some(DeltaKind::Added),
            2 => Some(DeltaKind::Changed),
            3 => Some(DeltaKind::Removed),
            _ => None,
        }
    }

    /// The kind seen when comparing in the opposite direction.
    pub fn mirror(self) -> DeltaKind {
        match self {
            DeltaKind::Added => DeltaKind::Removed,
            DeltaKind::Removed => DeltaKind::Added,
            DeltaKind::Changed => DeltaKind::Changed,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            DeltaKind::Added => "ADDED",
            DeltaKind::Changed => "CHANGED",
            DeltaKind::Removed => "REMOVED",
        }
    }
}

impl fmt::Display for DeltaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

macro_rules! delta_flags {
    ($($variant:ident = $code:literal => $name:literal,)+) => {
        /// What changed, qualified by the element type and change kind.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
        #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
        pub enum DeltaFlag {
            $($variant,)+
        }

        impl DeltaFlag {
            pub const ALL: &'static [DeltaFlag] = &[$(DeltaFlag::$variant,)+];

            pub fn code(self) -> u32 {
                match self {
                    $(DeltaFlag::$variant => $code,)+
                }
            }

            pub fn name(self) -> &'static str {
                match self {
                    $(DeltaFlag::$variant => $name,)+
                }
            }
        }
    };
}

delta_flags! {
    AbstractToNonAbstract = 1 => "ABSTRACT_TO_NON_ABSTRACT",
    AnnotationDefaultValue = 2 => "ANNOTATION_DEFAULT_VALUE",
    ApiComponent = 3 => "API_COMPONENT",
    ArrayToVarargs = 4 => "ARRAY_TO_VARARGS",
    CheckedException = 5 => "CHECKED_EXCEPTION",
    ClassBound = 6 => "CLASS_BOUND",
    Constructor = 8 => "CONSTRUCTOR",
    ContractedSuperinterfacesSet = 9 => "CONTRACTED_SUPERINTERFACES_SET",
    DecreaseAccess = 10 => "DECREASE_ACCESS",
    EnumConstant = 11 => "ENUM_CONSTANT",
    ExecutionEnvironment = 12 => "EXECUTION_ENVIRONMENT",
    ExpandedSuperinterfacesSet = 13 => "EXPANDED_SUPERINTERFACES_SET",
    Field = 14 => "FIELD",
    FieldMovedUp = 15 => "FIELD_MOVED_UP",
    FinalToNonFinal = 16 => "FINAL_TO_NON_FINAL",
    FinalToNonFinalNonStatic = 17 => "FINAL_TO_NON_FINAL_NON_STATIC",
    FinalToNonFinalStaticConstant = 18 => "FINAL_TO_NON_FINAL_STATIC_CONSTANT",
    FinalToNonFinalStaticNonConstant = 19 => "FINAL_TO_NON_FINAL_STATIC_NON_CONSTANT",
    IncreaseAccess = 20 => "INCREASE_ACCESS",
    InterfaceBound = 21 => "INTERFACE_BOUND",
    Method = 22 => "METHOD",
    MethodMovedUp = 23 => "METHOD_MOVED_UP",
    MethodWithDefaultValue = 24 => "METHOD_WITH_DEFAULT_VALUE",
    MethodWithoutDefaultValue = 25 => "METHOD_WITHOUT_DEFAULT_VALUE",
    NativeToNonNative = 26 => "NATIVE_TO_NON_NATIVE",
    NonAbstractToAbstract = 27 => "NON_ABSTRACT_TO_ABSTRACT",
    NonFinalToFinal = 28 => "NON_FINAL_TO_FINAL",
    NonNativeToNative = 29 => "NON_NATIVE_TO_NATIVE",
    NonStaticToStatic = 30 => "NON_STATIC_TO_STATIC",
    NonSynchronizedToSynchronized = 31 => "NON_SYNCHRONIZED_TO_SYNCHRONIZED",
    NonTransientToTransient = 32 => "NON_TRANSIENT_TO_TRANSIENT",
    OverridenMethod = 33 => "OVERRIDEN_METHOD",
    StaticToNonStatic = 34 => "STATIC_TO_NON_STATIC",
    Superclass = 35 => "SUPERCLASS",
    SynchronizedToNonSynchronized = 36 => "SYNCHRONIZED_TO_NON_SYNCHRONIZED",
    TypeConversion = 37 => "TYPE_CONVERSION",
    TransientToNonTransient = 38 => "TRANSIENT_TO_NON_TRANSIENT",
    Type = 39 => "TYPE",
    TypeArguments = 40 => "TYPE_ARGUMENTS",
    TypeMember = 41 => "TYPE_MEMBER",
    TypeParameter = 42 => "TYPE_PARAMETER",
    TypeParameterName = 43 => "TYPE_PARAMETER_NAME",
    TypeParameters = 44 => "TYPE_PARAMETERS",
    UncheckedException = 46 => "UNCHECKED_EXCEPTION",
    Value = 47 => "VALUE",
    VarargsToArray = 48 => "VARARGS_TO_ARRAY",
    Restrictions = 49 => "RESTRICTIONS",
    ApiType = 50 => "API_TYPE",
    NonVolatileToVolatile = 51 => "NON_VOLATILE_TO_VOLATILE",
    VolatileToNonVolatile = 52 => "VOLATILE_TO_NON_VOLATILE",
    ApiField = 55 => "API_FIELD",
    ApiMethod = 56 => "API_METHOD",
    ApiConstructor = 57 => "API_CONSTRUCTOR",
    ApiEnumConstant = 58 => "API_ENUM_CONSTANT",
    TypeArgument = 61 => "TYPE_ARGUMENT",
    SuperInterfaceWithMethods = 62 => "SUPER_INTERFACE_WITH_METHODS",
    ReexportedApiType = 63 => "REEXPORTED_API_TYPE",
    ReexportedType = 64 => "REEXPORTED_TYPE",
    MethodMovedDown = 65 => "METHOD_MOVED_DOWN",
}

impl DeltaFlag {
    pub fn from_code(code: u32) -> Option<DeltaFlag> {
        Self::ALL.iter().copied().find(|f| f.code() == code)
    }
}

impl fmt::Display for DeltaFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ── Leaf changes ────────────────────────────────────────────────────

/// A single structural change.
///
/// `modifiers` and `restrictions` describe the element the change is
/// about as its clients saw it: the reference side for removals and
/// modifications (with the wider of the two visibilities), the current
/// side for additions. Restrictions include those of the enclosing type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Change {
    pub element_type: ElementType,
    pub kind: DeltaKind,
    pub flag: DeltaFlag,
    /// Qualified type name, or `Type#member` for member-level changes.
    pub key: String,
    /// Type the change was found in; the component id for component-level changes.
    pub type_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub component_id: Option<String>,
    pub modifiers: Modifiers,
    pub restrictions: Restrictions,
    pub args: Vec<String>,
    /// Since tag of an added element.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub since: Option<String>,
}

impl Change {
    pub fn new(element_type: ElementType, kind: DeltaKind, flag: DeltaFlag, key: &str) -> Self {
        Change {
            element_type,
            kind,
            flag,
            key: key.to_string(),
            type_name: key.to_string(),
            component_id: None,
            modifiers: Modifiers::public(),
            restrictions: Restrictions::none(),
            args: Vec::new(),
            since: None,
        }
    }

    pub fn in_type(mut self, type_name: &str) -> Self {
        self.type_name = type_name.to_string();
        self
    }

    pub fn in_component(mut self, component_id: &str) -> Self {
        self.component_id = Some(component_id.to_string());
        self
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn with_restrictions(mut self, restrictions: Restrictions) -> Self {
        self.restrictions = restrictions;
        self
    }

    pub fn with_args<S: Into<String>>(mut self, args: impl IntoIterator<Item = S>) -> Self {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_since(mut self, since: Option<&str>) -> Self {
        self.since = since.map(str::to_string);
        self
    }

    /// `ELEMENT_KIND_FLAG`, e.g. `CLASS_REMOVED_METHOD`.
    pub fn rule_key(&self) -> String {
        format!("{}_{}_{}", self.element_type, self.kind, self.flag)
    }
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.element_type, self.kind, self.flag, self.key
        )?;
        if !self.args.is_empty() {
            write!(f, " [{}]", self.args.join(", "))?;
        }
        Ok(())
    }
}

// ── Tree ────────────────────────────────────────────────────────────

/// A node of the delta tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum Delta {
    /// The changes found beneath one baseline, component or type.
    Group {
        element_type: ElementType,
        key: String,
        children: Vec<Delta>,
    },
    Change(Change),
}

impl Delta {
    /// A group node, or `None` when nothing changed beneath it.
    pub fn group(element_type: ElementType, key: &str, children: Vec<Delta>) -> Option<Delta> {
        if children.is_empty() {
            None
        } else {
            Some(Delta::Group {
                element_type,
                key: key.to_string(),
                children,
            })
        }
    }

    /// All leaf changes in depth-first order.
    pub fn leaves(&self) -> Vec<&Change> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a Change>) {
        match self {
            Delta::Change(c) => out.push(c),
            Delta::Group { children, .. } => {
                for child in children {
                    child.collect_leaves(out);
                }
            }
        }
    }

    /// Consume the tree, returning its leaves.
    pub fn into_leaves(self) -> Vec<Change> {
        match self {
            Delta::Change(c) => vec![c],
            Delta::Group { children, .. } => {
                children.into_iter().flat_map(Delta::into_leaves).collect()
            }
        }
    }

    pub fn leaf_count(&self) -> usize {
        match self {
            Delta::Change(_) => 1,
            Delta::Group { children, .. } => children.iter().map(Delta::leaf_count).sum(),
        }
    }

    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// Indented, one line per node.
    pub fn to_text(&self) -> String {
        let mut lines = Vec::new();
        self.render(0, &mut lines);
        lines.join("\n")
    }

    fn render(&self, depth: usize, lines: &mut Vec<String>) {
        let indent = "  ".repeat(depth);
        match self {
            Delta::Change(c) => lines.push(format!("{}{}", indent, c)),
            Delta::Group {
                element_type,
                key,
                children,
            } => {
                lines.push(format!("{}{} {}", indent, element_type, key));
                for child in children {
                    child.render(depth + 1, lines);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_codes_are_unique_and_round_trip() {
        let mut seen = std::collections::BTreeSet::new();
        for flag in DeltaFlag::ALL {
            assert!(seen.insert(flag.code()), "duplicate code for {}", flag);
            assert_eq!(DeltaFlag::from_code(flag.code()), Some(*flag));
        }
    }

    #[test]
    fn flag_names_match_serialization() {
        for flag in DeltaFlag::ALL {
            let json = serde_json::to_value(flag).unwrap();
            assert_eq!(json.as_str(), Some(flag.name()));
        }
    }

    #[test]
    fn element_codes_round_trip() {
        for e in ElementType::ALL {
            assert_eq!(ElementType::from_code(e.code()), Some(e));
        }
        assert_eq!(ElementType::from_code(0), None);
    }

    #[test]
    fn empty_group_is_none() {
        assert!(Delta::group(ElementType::Class, "p.A", vec![]).is_none());
    }

    #[test]
    fn leaves_are_depth_first() {
        let leaf = |flag| {
            Delta::Change(Change::new(
                ElementType::Class,
                DeltaKind::Removed,
                flag,
                "p.A",
            ))
        };
        let tree = Delta::group(
            ElementType::ApiComponent,
            "c",
            vec![
                leaf(DeltaFlag::Field),
                Delta::group(ElementType::Class, "p.A", vec![leaf(DeltaFlag::Method)]).unwrap(),
                leaf(DeltaFlag::Constructor),
            ],
        )
        .unwrap();
        let flags: Vec<DeltaFlag> = tree.leaves().iter().map(|c| c.flag).collect();
        assert_eq!(
            flags,
            vec![DeltaFlag::Field, DeltaFlag::Method, DeltaFlag::Constructor]
        );
        assert_eq!(tree.leaf_count(), 3);
        assert_eq!(tree.clone().into_leaves().len(), 3);
    }

    #[test]
    fn rule_key_joins_names() {
        let c = Change::new(
            ElementType::Interface,
            DeltaKind::Added,
            DeltaFlag::Method,
            "p.I",
        );
        assert_eq!(c.rule_key(), "INTERFACE_ADDED_METHOD");
    }
}
