//! `@since` tag checks for newly added API elements.

use apicompat_compare::{Change, DeltaFlag, DeltaKind, Evaluator};
use apicompat_model::Version;

/// A since tag split around its version token: `"org.example 3.4 (beta)"`
/// has prefix `org.example`, version `3.4` and postfix `(beta)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinceTag<'a> {
    pub prefix: Option<String>,
    pub version: Option<&'a str>,
    pub postfix: Option<String>,
}

impl<'a> SinceTag<'a> {
    pub fn parse(tag: &'a str) -> Self {
        let tokens: Vec<&str> = tag.split_whitespace().collect();
        let position = tokens
            .iter()
            .position(|t| t.starts_with(|c: char| c.is_ascii_digit()));
        let join = |parts: &[&str]| {
            if parts.is_empty() {
                None
            } else {
                Some(parts.join(" "))
            }
        };
        match position {
            Some(i) => SinceTag {
                prefix: join(&tokens[..i]),
                version: Some(tokens[i]),
                postfix: join(&tokens[i + 1..]),
            },
            None => SinceTag {
                prefix: join(&tokens),
                version: None,
                postfix: None,
            },
        }
    }

    /// `major.minor` of the version token, when it is one or two numeric
    /// fragments.
    fn major_minor(&self) -> Option<(u32, u32)> {
        let fragments: Vec<&str> = self.version?.split('.').collect();
        match fragments.as_slice() {
            [major] => Some((major.parse().ok()?, 0)),
            [major, minor] => Some((major.parse().ok()?, minor.parse().ok()?)),
            _ => None,
        }
    }

    /// The tag rewritten with `version`, keeping prefix and postfix.
    fn with_version(&self, version: &str) -> String {
        [self.prefix.as_deref(), Some(version), self.postfix.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinceCheck {
    Valid,
    Missing,
    Malformed,
    /// Well formed but naming another release; carries the expected tag.
    Invalid { expected: String },
}

/// Check a declared since tag against the version of the component that
/// introduces the element.
pub fn check_since(since: Option<&str>, component_version: &Version) -> SinceCheck {
    let Some(tag) = since.map(str::trim).filter(|t| !t.is_empty()) else {
        return SinceCheck::Missing;
    };
    let parsed = SinceTag::parse(tag);
    let Some((major, minor)) = parsed.major_minor() else {
        return SinceCheck::Malformed;
    };
    if major == component_version.major && minor == component_version.minor {
        SinceCheck::Valid
    } else {
        SinceCheck::Invalid {
            expected: parsed.with_version(&component_version.major_minor()),
        }
    }
}

/// Whether an added element introduced by `change` must carry a since tag.
pub fn requires_since_tag(change: &Change, evaluator: &dyn Evaluator) -> bool {
    change.kind == DeltaKind::Added
        && matches!(
            change.flag,
            DeltaFlag::Type
                | DeltaFlag::TypeMember
                | DeltaFlag::Method
                | DeltaFlag::Constructor
                | DeltaFlag::Field
                | DeltaFlag::EnumConstant
                | DeltaFlag::MethodWithDefaultValue
                | DeltaFlag::MethodWithoutDefaultValue
        )
        && evaluator.is_new_api(change)
}

/// Name of the added element used in since-tag problem arguments.
pub fn member_label(change: &Change) -> String {
    match change.flag {
        DeltaFlag::Type => change.args.first().cloned().unwrap_or_else(|| change.key.clone()),
        DeltaFlag::TypeMember => match (change.args.first(), change.args.get(1)) {
            (Some(outer), Some(inner)) => format!("{}${}", outer, inner),
            _ => change.key.clone(),
        },
        _ => change
            .args
            .get(1)
            .or_else(|| change.args.first())
            .cloned()
            .unwrap_or_else(|| change.key.clone()),
    }
}
