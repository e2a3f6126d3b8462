//! Problems and the factory that creates them.
//!
//! A problem id packs four fields into 32 bits:
//!
//! ```text
//!  31..28    27..22    21..18   17..0
//! category  element    kind     flag
//! ```
//!
//! Compatibility problems take the element, kind and flag codes of the delta
//! they were created from. Version and since-tag problems use the component
//! or member element with their own kind codes and a zero flag.

use apicompat_compare::{Change, DeltaFlag, DeltaKind, ElementType};
use serde::{Deserialize, Serialize};
use std::fmt;

const CATEGORY_SHIFT: u32 = 28;
const ELEMENT_SHIFT: u32 = 22;
const KIND_SHIFT: u32 = 18;
const ELEMENT_MASK: u32 = 0x3f;
const KIND_MASK: u32 = 0xf;
const FLAG_MASK: u32 = 0x3ffff;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Compatibility,
    Version,
    SinceTag,
    Usage,
}

impl Category {
    pub fn code(self) -> u32 {
        match self {
            Category::Compatibility => 1,
            Category::Version => 2,
            Category::SinceTag => 3,
            Category::Usage => 4,
        }
    }

    pub fn from_code(code: u32) -> Option<Category> {
        match code {
            1 => Some(Category::Compatibility),
            2 => Some(Category::Version),
            3 => Some(Category::SinceTag),
            4 => Some(Category::Usage),
            _ => None,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Compatibility => write!(f, "compatibility"),
            Category::Version => write!(f, "version"),
            Category::SinceTag => write!(f, "since-tag"),
            Category::Usage => write!(f, "usage"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProblemSeverity {
    Warning,
    Error,
}

impl fmt::Display for ProblemSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProblemSeverity::Warning => write!(f, "WARNING"),
            ProblemSeverity::Error => write!(f, "ERROR"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VersionProblemKind {
    MajorVersionChange,
    MinorVersionChange,
    MajorVersionChangeNoBreakage,
    MinorVersionChangeNoNewApi,
    ReexportedMajorVersionChange,
    ReexportedMinorVersionChange,
}

impl VersionProblemKind {
    pub const ALL: [VersionProblemKind; 6] = [
        VersionProblemKind::MajorVersionChange,
        VersionProblemKind::MinorVersionChange,
        VersionProblemKind::MajorVersionChangeNoBreakage,
        VersionProblemKind::MinorVersionChangeNoNewApi,
        VersionProblemKind::ReexportedMajorVersionChange,
        VersionProblemKind::ReexportedMinorVersionChange,
    ];

    pub fn code(self) -> u32 {
        match self {
            VersionProblemKind::MajorVersionChange => 1,
            VersionProblemKind::MinorVersionChange => 2,
            VersionProblemKind::MajorVersionChangeNoBreakage => 3,
            VersionProblemKind::MinorVersionChangeNoNewApi => 4,
            VersionProblemKind::ReexportedMajorVersionChange => 5,
            VersionProblemKind::ReexportedMinorVersionChange => 6,
        }
    }

    pub fn from_code(code: u32) -> Option<VersionProblemKind> {
        Self::ALL.into_iter().find(|k| k.code() == code)
    }

    pub fn name(self) -> &'static str {
        match self {
            VersionProblemKind::MajorVersionChange => "MAJOR_VERSION_CHANGE",
            VersionProblemKind::MinorVersionChange => "MINOR_VERSION_CHANGE",
            VersionProblemKind::MajorVersionChangeNoBreakage => "MAJOR_VERSION_CHANGE_NO_BREAKAGE",
            VersionProblemKind::MinorVersionChangeNoNewApi => "MINOR_VERSION_CHANGE_NO_NEW_API",
            VersionProblemKind::ReexportedMajorVersionChange => "REEXPORTED_MAJOR_VERSION_CHANGE",
            VersionProblemKind::ReexportedMinorVersionChange => "REEXPORTED_MINOR_VERSION_CHANGE",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SinceTagKind {
    Missing,
    Malformed,
    Invalid,
}

impl SinceTagKind {
    pub fn code(self) -> u32 {
        match self {
            SinceTagKind::Missing => 1,
            SinceTagKind::Malformed => 2,
            SinceTagKind::Invalid => 3,
        }
    }

    pub fn from_code(code: u32) -> Option<SinceTagKind> {
        match code {
            1 => Some(SinceTagKind::Missing),
            2 => Some(SinceTagKind::Malformed),
            3 => Some(SinceTagKind::Invalid),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            SinceTagKind::Missing => "MISSING",
            SinceTagKind::Malformed => "MALFORMED",
            SinceTagKind::Invalid => "INVALID",
        }
    }
}

/// Illegal use of a restricted type owned by another component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UsageKind {
    IllegalExtend,
    IllegalImplement,
    IllegalOverride,
}

impl UsageKind {
    pub fn code(self) -> u32 {
        match self {
            UsageKind::IllegalExtend => 1,
            UsageKind::IllegalImplement => 2,
            UsageKind::IllegalOverride => 3,
        }
    }

    pub fn from_code(code: u32) -> Option<UsageKind> {
        match code {
            1 => Some(UsageKind::IllegalExtend),
            2 => Some(UsageKind::IllegalImplement),
            3 => Some(UsageKind::IllegalOverride),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            UsageKind::IllegalExtend => "ILLEGAL_EXTEND",
            UsageKind::IllegalImplement => "ILLEGAL_IMPLEMENT",
            UsageKind::IllegalOverride => "ILLEGAL_OVERRIDE",
        }
    }
}

// ── Id packing ──────────────────────────────────────────────────────

pub fn pack_id(category: Category, element: u32, kind: u32, flag: u32) -> u32 {
    (category.code() << CATEGORY_SHIFT)
        | ((element & ELEMENT_MASK) << ELEMENT_SHIFT)
        | ((kind & KIND_MASK) << KIND_SHIFT)
        | (flag & FLAG_MASK)
}

/// The four fields of a packed problem id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProblemId(pub u32);

impl ProblemId {
    pub fn category_code(self) -> u32 {
        self.0 >> CATEGORY_SHIFT
    }

    pub fn category(self) -> Option<Category> {
        Category::from_code(self.category_code())
    }

    pub fn element_code(self) -> u32 {
        (self.0 >> ELEMENT_SHIFT) & ELEMENT_MASK
    }

    pub fn kind_code(self) -> u32 {
        (self.0 >> KIND_SHIFT) & KIND_MASK
    }

    pub fn flag_code(self) -> u32 {
        self.0 & FLAG_MASK
    }

    /// Symbolic rendering, e.g. `compatibility CLASS REMOVED METHOD`.
    /// Returns `None` when any field is out of range for its category.
    pub fn describe(self) -> Option<String> {
        let category = self.category()?;
        let element = ElementType::from_code(self.element_code())?;
        let kind = match category {
            Category::Compatibility => DeltaKind::from_code(self.kind_code())?.name(),
            Category::Version => VersionProblemKind::from_code(self.kind_code())?.name(),
            Category::SinceTag => SinceTagKind::from_code(self.kind_code())?.name(),
            Category::Usage => UsageKind::from_code(self.kind_code())?.name(),
        };
        match category {
            Category::Compatibility => {
                let flag = DeltaFlag::from_code(self.flag_code())?;
                Some(format!("{} {} {} {}", category, element, kind, flag))
            }
            Category::Version | Category::SinceTag | Category::Usage => {
                Some(format!("{} {} {}", category, element, kind))
            }
        }
    }
}

impl fmt::Display for ProblemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ── Problems ────────────────────────────────────────────────────────

/// A reported problem. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Problem {
    pub id: u32,
    pub category: Category,
    pub severity: ProblemSeverity,
    /// Component the problem is attached to.
    pub component_id: String,
    /// Type the problem is attached to; the component id for component-level problems.
    pub resource: String,
    pub args: Vec<String>,
    pub message: String,
}

impl Problem {
    pub fn problem_id(&self) -> ProblemId {
        ProblemId(self.id)
    }

    pub fn with_severity(mut self, severity: ProblemSeverity) -> Self {
        self.severity = severity;
        self
    }
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} ({}): {}",
            self.severity, self.resource, self.id, self.message
        )
    }
}

/// Create the compatibility problem for a reported delta.
pub fn classify(change: &Change) -> Problem {
    let id = pack_id(
        Category::Compatibility,
        change.element_type.code(),
        change.kind.code(),
        change.flag.code(),
    );
    Problem {
        id,
        category: Category::Compatibility,
        severity: ProblemSeverity::Error,
        component_id: change.component_id.clone().unwrap_or_default(),
        resource: change.type_name.clone(),
        args: change.args.clone(),
        message: compatibility_message(change),
    }
}

pub fn version_problem(kind: VersionProblemKind, component_id: &str, args: Vec<String>) -> Problem {
    let id = pack_id(
        Category::Version,
        ElementType::ApiComponent.code(),
        kind.code(),
        0,
    );
    let message = version_message(kind, &args);
    Problem {
        id,
        category: Category::Version,
        severity: ProblemSeverity::Error,
        component_id: component_id.to_string(),
        resource: component_id.to_string(),
        args,
        message,
    }
}

/// Create a usage problem on `resource`, a type of `component_id`.
/// `args[0]` names the restricted type; an override adds the method.
pub fn usage_problem(
    kind: UsageKind,
    element: ElementType,
    component_id: &str,
    resource: &str,
    args: Vec<String>,
) -> Problem {
    let id = pack_id(Category::Usage, element.code(), kind.code(), 0);
    let message = match kind {
        UsageKind::IllegalExtend => format!("{} illegally extends {}", resource, arg(&args, 0)),
        UsageKind::IllegalImplement => {
            format!("{} illegally implements {}", resource, arg(&args, 0))
        }
        UsageKind::IllegalOverride => format!(
            "{} illegally overrides {}.{}",
            resource,
            arg(&args, 0),
            arg(&args, 1)
        ),
    };
    Problem {
        id,
        category: Category::Usage,
        severity: ProblemSeverity::Error,
        component_id: component_id.to_string(),
        resource: resource.to_string(),
        args,
        message,
    }
}

/// Create a since-tag problem for the added element described by `change`.
pub fn since_tag_problem(kind: SinceTagKind, change: &Change, args: Vec<String>) -> Problem {
    let element = since_tag_element(change);
    let id = pack_id(Category::SinceTag, element.code(), kind.code(), 0);
    let message = match kind {
        SinceTagKind::Missing => format!("Missing @since tag on {}", arg(&args, 0)),
        SinceTagKind::Malformed => format!("Invalid @since tag: {}; the version part is malformed", arg(&args, 0)),
        SinceTagKind::Invalid => format!(
            "Invalid @since {} tag on {}; expected {}",
            arg(&args, 0),
            arg(&args, 2),
            arg(&args, 1)
        ),
    };
    Problem {
        id,
        category: Category::SinceTag,
        severity: ProblemSeverity::Error,
        component_id: change.component_id.clone().unwrap_or_default(),
        resource: change.type_name.clone(),
        args,
        message,
    }
}

/// The element an added-element since-tag problem is about.
fn since_tag_element(change: &Change) -> ElementType {
    match change.flag {
        DeltaFlag::Field | DeltaFlag::EnumConstant | DeltaFlag::ApiField | DeltaFlag::ApiEnumConstant => {
            ElementType::Field
        }
        DeltaFlag::Constructor | DeltaFlag::ApiConstructor => ElementType::Constructor,
        DeltaFlag::Method
        | DeltaFlag::MethodWithDefaultValue
        | DeltaFlag::MethodWithoutDefaultValue
        | DeltaFlag::ApiMethod => ElementType::Method,
        _ if change.element_type == ElementType::ApiComponent => ElementType::Class,
        _ => change.element_type,
    }
}

fn arg(args: &[String], index: usize) -> &str {
    args.get(index).map(String::as_str).unwrap_or("?")
}

fn version_message(kind: VersionProblemKind, args: &[String]) -> String {
    match kind {
        VersionProblemKind::MajorVersionChange => format!(
            "The major version should be incremented in version {}, since API breakage occurred since version {}",
            arg(args, 0),
            arg(args, 1)
        ),
        VersionProblemKind::MinorVersionChange => format!(
            "The minor version should be incremented in version {}, since new APIs have been added since version {}",
            arg(args, 0),
            arg(args, 1)
        ),
        VersionProblemKind::MajorVersionChangeNoBreakage => format!(
            "The major version should be the same for version {}, since no API breakage occurred since version {}",
            arg(args, 0),
            arg(args, 1)
        ),
        VersionProblemKind::MinorVersionChangeNoNewApi => format!(
            "The minor version should be the same for version {}, since no new APIs have been added since version {}",
            arg(args, 0),
            arg(args, 1)
        ),
        VersionProblemKind::ReexportedMajorVersionChange => format!(
            "The major version should be incremented in version {}, since the major version of re-exported component {} changed",
            arg(args, 0),
            arg(args, 1)
        ),
        VersionProblemKind::ReexportedMinorVersionChange => format!(
            "The minor version should be incremented in version {}, since the minor version of re-exported component {} changed",
            arg(args, 0),
            arg(args, 1)
        ),
    }
}

/// Messages for changes to baselines and components, whose arguments name
/// components rather than members.
fn component_message(change: &Change) -> Option<String> {
    let args = &change.args;
    let verb = match change.kind {
        DeltaKind::Added => "added to",
        DeltaKind::Removed => "removed from",
        DeltaKind::Changed => "changed in",
    };
    let message = match (change.element_type, change.flag) {
        (ElementType::ApiBaseline, DeltaFlag::ApiComponent) => {
            format!("The component {} has been {} the baseline", arg(args, 0), verb)
        }
        (ElementType::ApiComponent, DeltaFlag::Type) => format!(
            "The type {} has been {} component {}",
            arg(args, 0),
            verb,
            arg(args, 1)
        ),
        (ElementType::ApiComponent, DeltaFlag::ApiType) => match change.kind {
            DeltaKind::Added => format!("The type {} is now API in component {}", arg(args, 0), arg(args, 1)),
            _ => format!("The type {} is no longer API in component {}", arg(args, 0), arg(args, 1)),
        },
        (ElementType::ApiComponent, DeltaFlag::ExecutionEnvironment) => format!(
            "The execution environment {} has been {} component {}",
            arg(args, 1),
            verb,
            arg(args, 0)
        ),
        (ElementType::ApiComponent, DeltaFlag::ReexportedType | DeltaFlag::ReexportedApiType) => {
            format!(
                "The type {} re-exported from component {} is no longer available",
                arg(args, 0),
                arg(args, 1)
            )
        }
        _ => return None,
    };
    Some(message)
}

fn compatibility_message(change: &Change) -> String {
    if let Some(message) = component_message(change) {
        return message;
    }
    let subject = arg(&change.args, 0);
    let detail = change.args.get(1).map(String::as_str);
    let element = change.element_type.name().to_lowercase().replace('_', " ");
    let what = match (change.kind, change.flag) {
        (DeltaKind::Changed, DeltaFlag::TypeConversion) => {
            let from = change
                .args
                .get(1)
                .and_then(|c| c.parse().ok())
                .and_then(ElementType::from_code)
                .map(|e| e.name().to_lowercase())
                .unwrap_or_default();
            let to = change
                .args
                .get(2)
                .and_then(|c| c.parse().ok())
                .and_then(ElementType::from_code)
                .map(|e| e.name().to_lowercase())
                .unwrap_or_default();
            return format!("The type {} has been changed from {} to {}", subject, from, to);
        }
        (_, flag) => flag.name().to_lowercase().replace('_', " "),
    };
    let verb = match change.kind {
        DeltaKind::Added => "added to",
        DeltaKind::Removed => "removed from",
        DeltaKind::Changed => "changed in",
    };
    match detail {
        Some(d) if change.kind != DeltaKind::Changed => {
            format!("The {} {} has been {} {} {}", what, d, verb, element, subject)
        }
        Some(d) => format!("The {} of {} {}#{} has changed", what, element, subject, d),
        None => format!("The {} has been {} {} {}", what, verb, element, subject),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packing_is_reversible() {
        let id = ProblemId(pack_id(Category::Compatibility, 4, 3, 22));
        assert_eq!(id.category(), Some(Category::Compatibility));
        assert_eq!(id.element_code(), 4);
        assert_eq!(id.kind_code(), 3);
        assert_eq!(id.flag_code(), 22);
        assert_eq!(id.describe().as_deref(), Some("compatibility CLASS REMOVED METHOD"));
    }

    #[test]
    fn compatibility_ids_do_not_collide() {
        let mut seen = std::collections::HashSet::new();
        for element in ElementType::ALL {
            for kind in [DeltaKind::Added, DeltaKind::Changed, DeltaKind::Removed] {
                for flag in DeltaFlag::ALL {
                    let id = pack_id(Category::Compatibility, element.code(), kind.code(), flag.code());
                    assert!(seen.insert(id), "collision for {} {} {}", element, kind, flag);
                }
            }
        }
    }

    #[test]
    fn classify_uses_change_codes_and_args() {
        let change = Change::new(ElementType::Class, DeltaKind::Removed, DeltaFlag::Method, "p.A#run()void")
            .in_type("p.A")
            .in_component("core")
            .with_args(["p.A", "run()"]);
        let problem = classify(&change);
        assert_eq!(problem.category, Category::Compatibility);
        assert_eq!(problem.resource, "p.A");
        assert_eq!(problem.component_id, "core");
        assert_eq!(problem.args, vec!["p.A", "run()"]);
        assert_eq!(
            problem.problem_id().describe().as_deref(),
            Some("compatibility CLASS REMOVED METHOD")
        );
        assert_eq!(problem.message, "The method run() has been removed from class p.A");
    }

    #[test]
    fn component_level_messages_name_the_component() {
        let removed = Change::new(ElementType::ApiBaseline, DeltaKind::Removed, DeltaFlag::ApiComponent, "core")
            .in_type("current")
            .in_component("core")
            .with_args(["core"]);
        assert_eq!(classify(&removed).message, "The component core has been removed from the baseline");

        let ty = Change::new(ElementType::ApiComponent, DeltaKind::Removed, DeltaFlag::Type, "p.A")
            .in_component("core")
            .with_args(["p.A", "core"]);
        assert_eq!(classify(&ty).message, "The type p.A has been removed from component core");
    }

    #[test]
    fn version_problem_ids_decode() {
        let p = version_problem(
            VersionProblemKind::MajorVersionChange,
            "core",
            vec!["1.0.1".into(), "1.0.0".into()],
        );
        let id = p.problem_id();
        assert_eq!(id.category(), Some(Category::Version));
        assert_eq!(id.element_code(), ElementType::ApiComponent.code());
        assert_eq!(id.describe().as_deref(), Some("version API_COMPONENT MAJOR_VERSION_CHANGE"));
        assert!(p.message.contains("1.0.1"));
    }

    #[test]
    fn usage_problem_ids_decode() {
        let p = usage_problem(
            UsageKind::IllegalExtend,
            ElementType::Class,
            "app",
            "p.Mine",
            vec!["q.Sealed".into()],
        );
        assert_eq!(p.problem_id().describe().as_deref(), Some("usage CLASS ILLEGAL_EXTEND"));
        assert_eq!(p.message, "p.Mine illegally extends q.Sealed");
    }

    #[test]
    fn out_of_range_ids_do_not_describe() {
        assert_eq!(ProblemId(0).describe(), None);
        assert_eq!(ProblemId(pack_id(Category::Compatibility, 4, 3, 999)).describe(), None);
    }
}
