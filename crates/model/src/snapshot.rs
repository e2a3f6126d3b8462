//! Loading baselines from JSON snapshots.
//!
//! The main entry point is [`load_baseline`]. A snapshot looks like:
//!
//! ```json
//! {
//!   "name": "release-1.0",
//!   "components": [
//!     {
//!       "id": "org.example.core",
//!       "version": "1.0.0.v20240101",
//!       "execution_environments": ["JavaSE-17"],
//!       "reexports": [{ "id": "org.example.base", "range": "[1.0.0,2.0.0)" }],
//!       "internal_packages": ["org.example.internal"],
//!       "types": [ { "name": "org.example.Api", "kind": "class", ... } ]
//!     }
//!   ]
//! }
//! ```
//!
//! Malformed component data (bad versions, duplicate types, bad ranges) is
//! logged and skipped so that one broken entry never discards a whole
//! baseline.

use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeSet;

use crate::baseline::{Baseline, Component};
use crate::descriptor::TypeDescriptor;
use crate::error::ModelError;
use crate::version::{Version, VersionRange};

#[derive(Debug, Deserialize)]
struct BaselineSnapshot {
    name: String,
    #[serde(default)]
    components: Vec<ComponentSnapshot>,
}

#[derive(Debug, Deserialize)]
struct ComponentSnapshot {
    id: String,
    version: String,
    #[serde(default)]
    execution_environments: Vec<String>,
    #[serde(default)]
    reexports: Vec<ReexportSnapshot>,
    #[serde(default)]
    internal_packages: Vec<String>,
    /// Decoded one by one so a bad descriptor only loses that type.
    #[serde(default)]
    types: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct ReexportSnapshot {
    id: String,
    #[serde(default)]
    range: Option<String>,
}

/// Build a baseline from a parsed JSON snapshot.
pub fn load_baseline(value: &Value) -> Result<Baseline, ModelError> {
    if !value.is_object() {
        return Err(ModelError::InvalidSnapshot(
            "snapshot root must be an object".to_string(),
        ));
    }
    let snapshot = BaselineSnapshot::deserialize(value)?;

    let mut baseline = Baseline::new(&snapshot.name);
    for raw in snapshot.components {
        let id = raw.id.clone();
        match build_component(raw) {
            Ok(component) => {
                if baseline.insert_component(component).is_some() {
                    tracing::warn!(component = %id, "duplicate component in snapshot, keeping the last one");
                }
            }
            Err(e) => {
                tracing::warn!(component = %id, error = %e, "skipping malformed component");
                baseline.mark_skipped(&id);
            }
        }
    }

    tracing::debug!(
        baseline = %baseline.name,
        components = baseline.component_ids().count(),
        "loaded baseline snapshot"
    );
    Ok(baseline)
}

/// Parse JSON text and build a baseline from it.
pub fn load_baseline_str(json: &str) -> Result<Baseline, ModelError> {
    let value: Value = serde_json::from_str(json)?;
    load_baseline(&value)
}

fn build_component(raw: ComponentSnapshot) -> Result<Component, ModelError> {
    let version: Version = raw.version.parse()?;
    let mut component = Component::new(&raw.id, version);
    component.execution_environments = raw.execution_environments;
    component.internal_packages = raw.internal_packages;

    for reexport in raw.reexports {
        let range = match reexport.range.as_deref() {
            None => VersionRange::at_least(Version::default()),
            Some(text) => match text.parse::<VersionRange>() {
                Ok(r) => r,
                Err(e) => {
                    tracing::warn!(
                        component = %raw.id,
                        reexport = %reexport.id,
                        error = %e,
                        "ignoring re-export with malformed range"
                    );
                    continue;
                }
            },
        };
        component = component.with_reexport(&reexport.id, range);
    }

    let mut seen = BTreeSet::new();
    for value in raw.types {
        let descriptor = match TypeDescriptor::deserialize(&value) {
            Ok(d) => d,
            Err(e) => {
                let name = value.get("name").and_then(Value::as_str);
                tracing::warn!(component = %raw.id, type_name = ?name, error = %e, "skipping undecodable type");
                if let Some(name) = name {
                    component.mark_type_skipped(name);
                }
                continue;
            }
        };
        if let Err(reason) = check_nesting(&descriptor) {
            tracing::warn!(component = %raw.id, type_name = %descriptor.name, %reason, "skipping malformed type");
            component.mark_type_skipped(&descriptor.name);
            continue;
        }
        if !seen.insert(descriptor.name.clone()) {
            tracing::warn!(component = %raw.id, type_name = %descriptor.name, "skipping duplicate type");
            continue;
        }
        component.insert_type(descriptor);
    }

    Ok(component)
}

/// Nested descriptors must be named after the type that contains them.
fn check_nesting(descriptor: &TypeDescriptor) -> Result<(), String> {
    for member in &descriptor.member_types {
        let prefix = format!("{}$", descriptor.name);
        if !member.name.starts_with(&prefix) {
            return Err(format!(
                "member type '{}' is not nested in '{}'",
                member.name, descriptor.name
            ));
        }
        check_nesting(member)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::TypeKind;
    use serde_json::json;

    fn snapshot() -> Value {
        json!({
            "name": "release-1",
            "components": [
                {
                    "id": "org.example.core",
                    "version": "1.2.3.v2024",
                    "execution_environments": ["JavaSE-17"],
                    "reexports": [
                        { "id": "org.example.base", "range": "[1.0.0,2.0.0)" },
                        { "id": "org.example.broken", "range": "[1.0.0" }
                    ],
                    "types": [
                        {
                            "name": "org.example.Api",
                            "kind": "class",
                            "modifiers": { "visibility": "public" },
                            "member_types": [
                                { "name": "org.example.Api$Inner", "kind": "enum" }
                            ]
                        },
                        { "name": "org.example.Api", "kind": "interface" },
                        {
                            "name": "org.example.Bad",
                            "kind": "class",
                            "member_types": [ { "name": "org.other.Stray", "kind": "class" } ]
                        }
                    ]
                },
                { "id": "org.example.badversion", "version": "one.two" },
                {
                    "id": "org.example.extra",
                    "version": "2.0.0",
                    "types": [
                        { "name": "p.Good", "kind": "class" },
                        { "name": "p.Odd", "kind": "record" },
                        { "kind": "class" }
                    ]
                }
            ]
        })
    }

    #[test]
    fn loads_components_and_types() {
        let baseline = load_baseline(&snapshot()).unwrap();
        assert_eq!(baseline.name, "release-1");

        let core = baseline.component("org.example.core").unwrap();
        assert_eq!(core.version, Version::new(1, 2, 3));
        assert_eq!(core.execution_environments, vec!["JavaSE-17".to_string()]);
        assert_eq!(
            core.find_type("org.example.Api$Inner").map(|t| t.kind),
            Some(TypeKind::Enum)
        );
    }

    #[test]
    fn malformed_entries_are_skipped_not_fatal() {
        let baseline = load_baseline(&snapshot()).unwrap();
        assert!(baseline.component("org.example.badversion").is_none());

        let core = baseline.component("org.example.core").unwrap();
        // duplicate keeps the first declaration
        assert_eq!(
            core.find_type("org.example.Api").map(|t| t.kind),
            Some(TypeKind::Class)
        );
        assert!(core.find_type("org.example.Bad").is_none());
        assert!(core.is_type_skipped("org.example.Bad"));
        assert_eq!(core.reexports.len(), 1);
        assert_eq!(core.reexports[0].component_id, "org.example.base");
    }

    #[test]
    fn undecodable_type_only_loses_that_type() {
        let baseline = load_baseline(&snapshot()).unwrap();
        let extra = baseline.component("org.example.extra").unwrap();
        assert!(extra.find_type("p.Good").is_some());
        assert!(extra.find_type("p.Odd").is_none());
        assert!(extra.is_type_skipped("p.Odd"));
        assert_eq!(extra.type_count(), 1);
    }

    #[test]
    fn skipped_components_are_remembered() {
        let baseline = load_baseline(&snapshot()).unwrap();
        assert!(baseline.is_skipped("org.example.badversion"));
        assert!(!baseline.is_skipped("org.example.core"));
    }

    #[test]
    fn non_object_root_is_an_error() {
        let err = load_baseline(&json!([1, 2, 3])).unwrap_err();
        assert!(matches!(err, ModelError::InvalidSnapshot(_)));
    }

    #[test]
    fn invalid_json_text_is_an_error() {
        assert!(matches!(
            load_baseline_str("{ not json"),
            Err(ModelError::Json(_))
        ));
    }
}
