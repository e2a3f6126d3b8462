//! Components and the immutable baselines that group them.

use std::collections::{BTreeMap, BTreeSet};

use crate::descriptor::{enclosing_name, package_name, RestrictionTag, TypeDescriptor, Visibility};
use crate::version::{Version, VersionRange};

/// A required component whose types are re-exported to this component's clients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reexport {
    pub component_id: String,
    pub range: VersionRange,
}

/// A named, versioned unit owning a set of types.
#[derive(Debug, Clone, PartialEq)]
pub struct Component {
    pub id: String,
    pub version: Version,
    pub execution_environments: Vec<String>,
    pub reexports: Vec<Reexport>,
    /// Packages whose types are never part of the API.
    pub internal_packages: Vec<String>,
    types: BTreeMap<String, TypeDescriptor>,
    /// Types present in the input whose descriptors could not be loaded.
    skipped_types: BTreeSet<String>,
}

impl Component {
    pub fn new(id: &str, version: Version) -> Self {
        Component {
            id: id.to_string(),
            version,
            execution_environments: Vec::new(),
            reexports: Vec::new(),
            internal_packages: Vec::new(),
            types: BTreeMap::new(),
            skipped_types: BTreeSet::new(),
        }
    }

    /// Add a top-level type. A type with the same name is replaced.
    pub fn with_type(mut self, descriptor: TypeDescriptor) -> Self {
        self.insert_type(descriptor);
        self
    }

    pub fn insert_type(&mut self, descriptor: TypeDescriptor) -> Option<TypeDescriptor> {
        self.types.insert(descriptor.name.clone(), descriptor)
    }

    pub fn mark_type_skipped(&mut self, name: &str) {
        self.skipped_types.insert(name.to_string());
    }

    /// Whether the named top-level type was in the input but failed to load.
    pub fn is_type_skipped(&self, name: &str) -> bool {
        self.skipped_types.contains(name)
    }

    pub fn with_reexport(mut self, component_id: &str, range: VersionRange) -> Self {
        self.reexports.push(Reexport {
            component_id: component_id.to_string(),
            range,
        });
        self
    }

    pub fn with_execution_environment(mut self, ee: &str) -> Self {
        self.execution_environments.push(ee.to_string());
        self
    }

    pub fn with_internal_package(mut self, package: &str) -> Self {
        self.internal_packages.push(package.to_string());
        self
    }

    /// Top-level types in name order.
    pub fn types(&self) -> impl Iterator<Item = &TypeDescriptor> {
        self.types.values()
    }

    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(|k| k.as_str())
    }

    pub fn type_count(&self) -> usize {
        self.types.len()
    }

    /// Resolve a top-level or nested type by qualified name.
    pub fn find_type(&self, name: &str) -> Option<&TypeDescriptor> {
        if let Some(t) = self.types.get(name) {
            return Some(t);
        }
        let top_level = name.split('$').next()?;
        if top_level == name {
            return None;
        }
        self.types.get(top_level)?.find_nested(name)
    }

    pub fn reexport(&self, component_id: &str) -> Option<&Reexport> {
        self.reexports.iter().find(|r| r.component_id == component_id)
    }

    pub fn is_internal_package(&self, package: &str) -> bool {
        self.internal_packages.iter().any(|p| p == package)
    }

    /// Whether clients of this component may reference the named type.
    ///
    /// A type is API when it sits outside the internal packages, is not
    /// tagged no-reference, and it and every enclosing type is public
    /// (protected is accepted for nested types).
    pub fn is_api_type(&self, name: &str) -> bool {
        if self.is_internal_package(package_name(name)) {
            return false;
        }
        let mut current = Some(name);
        while let Some(n) = current {
            let Some(t) = self.find_type(n) else {
                return false;
            };
            if t.restrictions.contains(RestrictionTag::NoReference) {
                return false;
            }
            let visible = match t.modifiers.visibility {
                Visibility::Public => true,
                Visibility::Protected => t.is_nested(),
                Visibility::Package | Visibility::Private => false,
            };
            if !visible {
                return false;
            }
            current = enclosing_name(n);
        }
        true
    }
}

/// An immutable snapshot of a set of components.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Baseline {
    pub name: String,
    components: BTreeMap<String, Component>,
    /// Ids of components that were present in the input but failed to load.
    skipped: BTreeSet<String>,
}

impl Baseline {
    pub fn new(name: &str) -> Self {
        Baseline {
            name: name.to_string(),
            components: BTreeMap::new(),
            skipped: BTreeSet::new(),
        }
    }

    pub fn with_component(mut self, component: Component) -> Self {
        self.insert_component(component);
        self
    }

    pub fn insert_component(&mut self, component: Component) -> Option<Component> {
        self.components.insert(component.id.clone(), component)
    }

    pub fn component(&self, id: &str) -> Option<&Component> {
        self.components.get(id)
    }

    /// Components in id order.
    pub fn components(&self) -> impl Iterator<Item = &Component> {
        self.components.values()
    }

    pub fn component_ids(&self) -> impl Iterator<Item = &str> {
        self.components.keys().map(|k| k.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn mark_skipped(&mut self, id: &str) {
        self.skipped.insert(id.to_string());
    }

    /// Whether the component was in the input but could not be loaded.
    /// Such a component is unknown, not removed.
    pub fn is_skipped(&self, id: &str) -> bool {
        self.skipped.contains(id)
    }

    /// Resolve a type in any component, returning its owner too.
    pub fn find_type(&self, name: &str) -> Option<(&Component, &TypeDescriptor)> {
        self.components
            .values()
            .find_map(|c| c.find_type(name).map(|t| (c, t)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::Modifiers;
    use std::sync::Arc;

    fn component() -> Component {
        Component::new("org.example.core", Version::new(1, 0, 0))
            .with_internal_package("org.example.internal")
            .with_type(
                TypeDescriptor::class("org.example.Api")
                    .with_member_type(TypeDescriptor::class("org.example.Api$Nested"))
                    .with_member_type(
                        TypeDescriptor::class("org.example.Api$Hidden")
                            .with_modifiers(Modifiers::private()),
                    ),
            )
            .with_type(TypeDescriptor::class("org.example.internal.Impl"))
            .with_type(
                TypeDescriptor::class("org.example.Pkg")
                    .with_modifiers(Modifiers::with_visibility(Visibility::Package)),
            )
            .with_type(
                TypeDescriptor::class("org.example.Tagged")
                    .with_restriction(RestrictionTag::NoReference),
            )
    }

    #[test]
    fn find_type_resolves_nested_names() {
        let c = component();
        assert!(c.find_type("org.example.Api").is_some());
        assert!(c.find_type("org.example.Api$Nested").is_some());
        assert!(c.find_type("org.example.Missing").is_none());
        assert!(c.find_type("org.example.Api$Missing").is_none());
    }

    #[test]
    fn api_types_exclude_internal_hidden_and_tagged() {
        let c = component();
        assert!(c.is_api_type("org.example.Api"));
        assert!(c.is_api_type("org.example.Api$Nested"));
        assert!(!c.is_api_type("org.example.Api$Hidden"));
        assert!(!c.is_api_type("org.example.internal.Impl"));
        assert!(!c.is_api_type("org.example.Pkg"));
        assert!(!c.is_api_type("org.example.Tagged"));
    }

    #[test]
    fn baseline_find_type_reports_owner() {
        let b = Baseline::new("ref").with_component(component());
        let (owner, t) = b.find_type("org.example.Api$Nested").unwrap();
        assert_eq!(owner.id, "org.example.core");
        assert_eq!(t.name, "org.example.Api$Nested");
    }

    #[test]
    fn baseline_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Baseline>();

        let shared = Arc::new(Baseline::new("ref").with_component(component()));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let b = Arc::clone(&shared);
                std::thread::spawn(move || b.find_type("org.example.Api").is_some())
            })
            .collect();
        for h in handles {
            assert!(h.join().unwrap());
        }
    }
}
