//! Structural descriptors for compiled types and their members.
//!
//! A descriptor mirrors what a class-file parser reports for one type:
//! its kind, modifiers, hierarchy, type parameters, fields, methods,
//! nested member types and the restriction tags attached to it. The kind
//! of a descriptor never changes; a class that becomes an enum is a
//! different descriptor compared through a type-conversion delta.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Name under which constructors appear in a type's method table.
pub const CONSTRUCTOR_NAME: &str = "<init>";

/// Root of every class hierarchy. An absent superclass means this type.
pub const OBJECT: &str = "java.lang.Object";

// ── Kinds, visibility, modifiers ────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeKind {
    Class,
    Interface,
    Enum,
    Annotation,
}

impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeKind::Class => write!(f, "class"),
            TypeKind::Interface => write!(f, "interface"),
            TypeKind::Enum => write!(f, "enum"),
            TypeKind::Annotation => write!(f, "annotation"),
        }
    }
}

/// Access level, ordered from least to most accessible.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Private,
    #[default]
    Package,
    Protected,
    Public,
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Visibility::Private => write!(f, "private"),
            Visibility::Package => write!(f, "package"),
            Visibility::Protected => write!(f, "protected"),
            Visibility::Public => write!(f, "public"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct Modifiers {
    pub visibility: Visibility,
    #[serde(rename = "final")]
    pub is_final: bool,
    #[serde(rename = "abstract")]
    pub is_abstract: bool,
    #[serde(rename = "static")]
    pub is_static: bool,
    #[serde(rename = "transient")]
    pub is_transient: bool,
    #[serde(rename = "volatile")]
    pub is_volatile: bool,
    #[serde(rename = "native")]
    pub is_native: bool,
    #[serde(rename = "synchronized")]
    pub is_synchronized: bool,
}

impl Modifiers {
    pub fn with_visibility(visibility: Visibility) -> Self {
        Modifiers {
            visibility,
            ..Modifiers::default()
        }
    }

    pub fn public() -> Self {
        Self::with_visibility(Visibility::Public)
    }

    pub fn protected() -> Self {
        Self::with_visibility(Visibility::Protected)
    }

    pub fn private() -> Self {
        Self::with_visibility(Visibility::Private)
    }

    pub fn is_public(&self) -> bool {
        self.visibility == Visibility::Public
    }

    pub fn is_protected(&self) -> bool {
        self.visibility == Visibility::Protected
    }

    pub fn final_(mut self) -> Self {
        self.is_final = true;
        self
    }

    pub fn abstract_(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    pub fn static_(mut self) -> Self {
        self.is_static = true;
        self
    }
}

// ── Restrictions ────────────────────────────────────────────────────

/// A usage restriction narrowing the contract of a type or member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RestrictionTag {
    NoExtend,
    NoImplement,
    NoInstantiate,
    NoOverride,
    NoReference,
}

impl fmt::Display for RestrictionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RestrictionTag::NoExtend => write!(f, "no-extend"),
            RestrictionTag::NoImplement => write!(f, "no-implement"),
            RestrictionTag::NoInstantiate => write!(f, "no-instantiate"),
            RestrictionTag::NoOverride => write!(f, "no-override"),
            RestrictionTag::NoReference => write!(f, "no-reference"),
        }
    }
}

/// The set of restriction tags attached to one element.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Restrictions(BTreeSet<RestrictionTag>);

impl Restrictions {
    pub fn none() -> Self {
        Restrictions::default()
    }

    pub fn of(tags: &[RestrictionTag]) -> Self {
        Restrictions(tags.iter().copied().collect())
    }

    pub fn contains(&self, tag: RestrictionTag) -> bool {
        self.0.contains(&tag)
    }

    pub fn insert(&mut self, tag: RestrictionTag) {
        self.0.insert(tag);
    }

    pub fn with(mut self, tag: RestrictionTag) -> Self {
        self.insert(tag);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = RestrictionTag> + '_ {
        self.0.iter().copied()
    }

    pub fn union(&self, other: &Restrictions) -> Restrictions {
        Restrictions(self.0.union(&other.0).copied().collect())
    }

    /// Tags present in `self` but not in `other`.
    pub fn difference(&self, other: &Restrictions) -> Restrictions {
        Restrictions(self.0.difference(&other.0).copied().collect())
    }

    pub fn without(&self, tag: RestrictionTag) -> Restrictions {
        let mut out = self.clone();
        out.0.remove(&tag);
        out
    }
}

impl fmt::Display for Restrictions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tags: Vec<String> = self.iter().map(|t| t.to_string()).collect();
        write!(f, "{{{}}}", tags.join(", "))
    }
}

// ── Type parameters ─────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeParameter {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_bound: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub interface_bounds: Vec<String>,
}

impl TypeParameter {
    pub fn new(name: &str) -> Self {
        TypeParameter {
            name: name.to_string(),
            class_bound: None,
            interface_bounds: Vec::new(),
        }
    }

    pub fn with_class_bound(mut self, bound: &str) -> Self {
        self.class_bound = Some(bound.to_string());
        self
    }

    pub fn with_interface_bound(mut self, bound: &str) -> Self {
        self.interface_bounds.push(bound.to_string());
        self
    }
}

// ── Members ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub name: String,
    /// Erased field type, e.g. `int` or `java.lang.String`.
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub modifiers: Modifiers,
    /// Compile-time constant value, present only on constant fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generic_signature: Option<String>,
    #[serde(default)]
    pub enum_constant: bool,
    #[serde(default, skip_serializing_if = "Restrictions::is_empty")]
    pub restrictions: Restrictions,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub since: Option<String>,
}

impl FieldDescriptor {
    pub fn new(name: &str, type_name: &str) -> Self {
        FieldDescriptor {
            name: name.to_string(),
            type_name: type_name.to_string(),
            modifiers: Modifiers::public(),
            value: None,
            generic_signature: None,
            enum_constant: false,
            restrictions: Restrictions::none(),
            since: None,
        }
    }

    /// A `public static final` constant.
    pub fn constant(name: &str, type_name: &str, value: &str) -> Self {
        let mut field = FieldDescriptor::new(name, type_name);
        field.modifiers = Modifiers::public().static_().final_();
        field.value = Some(value.to_string());
        field
    }

    pub fn enum_constant(name: &str, enum_type: &str) -> Self {
        let mut field = FieldDescriptor::new(name, enum_type);
        field.modifiers = Modifiers::public().static_().final_();
        field.enum_constant = true;
        field
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn with_restriction(mut self, tag: RestrictionTag) -> Self {
        self.restrictions.insert(tag);
        self
    }

    pub fn since(mut self, since: &str) -> Self {
        self.since = Some(since.to_string());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodDescriptor {
    /// Method name, or `<init>` for constructors.
    pub name: String,
    #[serde(default)]
    pub parameters: Vec<String>,
    #[serde(default = "void")]
    pub return_type: String,
    #[serde(default)]
    pub modifiers: Modifiers,
    #[serde(default)]
    pub varargs: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub type_parameters: Vec<TypeParameter>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub checked_exceptions: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unchecked_exceptions: Vec<String>,
    /// Default value of an annotation member.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    #[serde(default, skip_serializing_if = "Restrictions::is_empty")]
    pub restrictions: Restrictions,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub since: Option<String>,
}

fn void() -> String {
    "void".to_string()
}

impl MethodDescriptor {
    pub fn new(name: &str, parameters: &[&str], return_type: &str) -> Self {
        MethodDescriptor {
            name: name.to_string(),
            parameters: parameters.iter().map(|p| p.to_string()).collect(),
            return_type: return_type.to_string(),
            modifiers: Modifiers::public(),
            varargs: false,
            type_parameters: Vec::new(),
            checked_exceptions: Vec::new(),
            unchecked_exceptions: Vec::new(),
            default_value: None,
            restrictions: Restrictions::none(),
            since: None,
        }
    }

    pub fn constructor(parameters: &[&str]) -> Self {
        MethodDescriptor::new(CONSTRUCTOR_NAME, parameters, "void")
    }

    pub fn is_constructor(&self) -> bool {
        self.name == CONSTRUCTOR_NAME
    }

    pub fn is_static_initializer(&self) -> bool {
        self.name == "<clinit>"
    }

    /// Matching key: name, erased parameter types and return type.
    pub fn key(&self) -> String {
        format!(
            "{}({}){}",
            self.name,
            self.parameters.join(","),
            self.return_type
        )
    }

    /// Human readable signature used in problem messages.
    pub fn signature(&self, owner: &str) -> String {
        let name = if self.is_constructor() {
            simple_name(owner)
        } else {
            self.name.as_str()
        };
        let mut params = self.parameters.clone();
        if self.varargs {
            if let Some(last) = params.last_mut() {
                if let Some(element) = last.strip_suffix("[]") {
                    *last = format!("{}...", element);
                }
            }
        }
        format!("{}({})", name, params.join(", "))
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn varargs(mut self) -> Self {
        self.varargs = true;
        self
    }

    pub fn with_default_value(mut self, value: &str) -> Self {
        self.default_value = Some(value.to_string());
        self
    }

    pub fn with_type_parameter(mut self, parameter: TypeParameter) -> Self {
        self.type_parameters.push(parameter);
        self
    }

    pub fn throws(mut self, exception: &str) -> Self {
        self.checked_exceptions.push(exception.to_string());
        self
    }

    pub fn throws_unchecked(mut self, exception: &str) -> Self {
        self.unchecked_exceptions.push(exception.to_string());
        self
    }

    pub fn with_restriction(mut self, tag: RestrictionTag) -> Self {
        self.restrictions.insert(tag);
        self
    }

    pub fn since(mut self, since: &str) -> Self {
        self.since = Some(since.to_string());
        self
    }
}

/// Last segment of a qualified or nested type name.
pub fn simple_name(qualified: &str) -> &str {
    let after_package = qualified.rsplit('.').next().unwrap_or(qualified);
    after_package.rsplit('$').next().unwrap_or(after_package)
}

/// Enclosing type of a nested type name (`p.Outer$Inner` -> `p.Outer`).
pub fn enclosing_name(qualified: &str) -> Option<&str> {
    qualified.rsplit_once('$').map(|(outer, _)| outer)
}

/// Package part of a qualified name; empty for the default package.
pub fn package_name(qualified: &str) -> &str {
    let top_level = qualified.split('$').next().unwrap_or(qualified);
    top_level.rsplit_once('.').map(|(p, _)| p).unwrap_or("")
}

// ── Types ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDescriptor {
    /// Qualified name; nested types use `$` (`p.Outer$Inner`).
    pub name: String,
    pub kind: TypeKind,
    #[serde(default)]
    pub modifiers: Modifiers,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub superclass: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub superinterfaces: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub type_parameters: Vec<TypeParameter>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldDescriptor>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub methods: Vec<MethodDescriptor>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub member_types: Vec<TypeDescriptor>,
    #[serde(default, skip_serializing_if = "Restrictions::is_empty")]
    pub restrictions: Restrictions,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub since: Option<String>,
}

impl TypeDescriptor {
    /// A public type of the given kind with no members.
    pub fn new(name: &str, kind: TypeKind) -> Self {
        let modifiers = match kind {
            TypeKind::Interface | TypeKind::Annotation => Modifiers::public().abstract_(),
            TypeKind::Enum => Modifiers::public().final_(),
            TypeKind::Class => Modifiers::public(),
        };
        TypeDescriptor {
            name: name.to_string(),
            kind,
            modifiers,
            superclass: None,
            superinterfaces: Vec::new(),
            type_parameters: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            member_types: Vec::new(),
            restrictions: Restrictions::none(),
            since: None,
        }
    }

    pub fn class(name: &str) -> Self {
        TypeDescriptor::new(name, TypeKind::Class)
    }

    pub fn interface(name: &str) -> Self {
        TypeDescriptor::new(name, TypeKind::Interface)
    }

    pub fn enumeration(name: &str) -> Self {
        TypeDescriptor::new(name, TypeKind::Enum)
    }

    pub fn annotation(name: &str) -> Self {
        TypeDescriptor::new(name, TypeKind::Annotation)
    }

    pub fn is_nested(&self) -> bool {
        self.name.contains('$')
    }

    /// Superclass name with an absent superclass resolved to `Object`.
    pub fn superclass_name(&self) -> &str {
        self.superclass.as_deref().unwrap_or(OBJECT)
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Find a method or constructor by its matching key.
    pub fn method(&self, key: &str) -> Option<&MethodDescriptor> {
        self.methods.iter().find(|m| m.key() == key)
    }

    pub fn member_type(&self, name: &str) -> Option<&TypeDescriptor> {
        self.member_types.iter().find(|t| t.name == name)
    }

    /// Resolve a nested type at any depth below this one.
    pub fn find_nested(&self, name: &str) -> Option<&TypeDescriptor> {
        self.member_types.iter().find_map(|t| {
            if t.name == name {
                Some(t)
            } else if name.starts_with(&format!("{}$", t.name)) {
                t.find_nested(name)
            } else {
                None
            }
        })
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn with_superclass(mut self, superclass: &str) -> Self {
        self.superclass = Some(superclass.to_string());
        self
    }

    pub fn with_interface(mut self, interface: &str) -> Self {
        self.superinterfaces.push(interface.to_string());
        self
    }

    pub fn with_type_parameter(mut self, parameter: TypeParameter) -> Self {
        self.type_parameters.push(parameter);
        self
    }

    pub fn with_field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    pub fn with_method(mut self, method: MethodDescriptor) -> Self {
        self.methods.push(method);
        self
    }

    pub fn with_member_type(mut self, member: TypeDescriptor) -> Self {
        self.member_types.push(member);
        self
    }

    pub fn with_restriction(mut self, tag: RestrictionTag) -> Self {
        self.restrictions.insert(tag);
        self
    }

    pub fn since(mut self, since: &str) -> Self {
        self.since = Some(since.to_string());
        self
    }
}
