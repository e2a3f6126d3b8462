//! Version policy: does the declared version match the changes made?

use apicompat_compare::Severity;
use apicompat_model::{Baseline, Component, Version, VersionRange};

use crate::config::{ApiConfigSettings, ErrorMode};
use crate::problem::VersionProblemKind;

/// A version policy violation with the version that would satisfy it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionFinding {
    pub kind: VersionProblemKind,
    pub args: Vec<String>,
    pub suggested: Version,
}

fn major_bumped(reference: &Version, declared: &Version) -> bool {
    declared.major > reference.major
}

fn minor_bumped(reference: &Version, declared: &Version) -> bool {
    declared.major == reference.major && declared.minor > reference.minor
}

/// A re-exported component whose version crossed a major or minor boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReexportShift {
    /// `ReexportedMajorVersionChange` or `ReexportedMinorVersionChange`.
    pub kind: VersionProblemKind,
    pub component_id: String,
}

/// Check a declared version against the worst severity of a component's
/// changes and any shift of its re-exported components. The qualifier is
/// ignored.
///
/// A re-export shift can cancel or replace the finding the component's own
/// changes would produce:
///
/// | own finding                         | major shift          | minor shift          |
/// |-------------------------------------|----------------------|----------------------|
/// | major bump without breakage         | cancelled            | re-exported minor    |
/// | minor bump missing                  | re-exported major    | kept                 |
/// | minor bump without new API          | re-exported major    | cancelled            |
/// | none                                | re-exported major if the major was not bumped | re-exported minor if the minor was not bumped |
///
/// Breakage is decided by the component's own changes alone.
pub fn check_version(
    reference: &Version,
    declared: &Version,
    severity: Severity,
    reexport: Option<&ReexportShift>,
    settings: &ApiConfigSettings,
) -> Option<VersionFinding> {
    let own = |kind, suggested| VersionFinding {
        kind,
        args: vec![declared.to_string(), reference.to_string()],
        suggested,
    };
    let reexported = |kind, shift: &ReexportShift, suggested| VersionFinding {
        kind,
        args: vec![declared.to_string(), shift.component_id.clone()],
        suggested,
    };

    let finding = match severity {
        Severity::Breaking => {
            let required = settings.major.apply(reference);
            return (declared < &required)
                .then(|| own(VersionProblemKind::MajorVersionChange, required));
        }
        Severity::CompatibleAddition => {
            let required = settings.minor.apply(reference);
            if major_bumped(reference, declared) {
                Some(own(VersionProblemKind::MajorVersionChangeNoBreakage, required))
            } else if declared < &required {
                Some(own(VersionProblemKind::MinorVersionChange, required))
            } else {
                None
            }
        }
        Severity::None => {
            if major_bumped(reference, declared) {
                Some(own(
                    VersionProblemKind::MajorVersionChangeNoBreakage,
                    settings.micro.apply(reference),
                ))
            } else if minor_bumped(reference, declared) {
                Some(own(
                    VersionProblemKind::MinorVersionChangeNoNewApi,
                    settings.micro.apply(reference),
                ))
            } else {
                None
            }
        }
    };

    let Some(shift) = reexport else {
        return finding;
    };
    let major_shift = shift.kind == VersionProblemKind::ReexportedMajorVersionChange;
    let to_major = || {
        reexported(
            VersionProblemKind::ReexportedMajorVersionChange,
            shift,
            settings.major.apply(reference),
        )
    };
    let to_minor = || {
        reexported(
            VersionProblemKind::ReexportedMinorVersionChange,
            shift,
            settings.minor.apply(reference),
        )
    };

    match finding.as_ref().map(|f| f.kind) {
        Some(VersionProblemKind::MajorVersionChangeNoBreakage) => {
            if major_shift {
                None
            } else {
                Some(to_minor())
            }
        }
        Some(VersionProblemKind::MinorVersionChange) if major_shift => Some(to_major()),
        Some(VersionProblemKind::MinorVersionChangeNoNewApi) => {
            if major_shift {
                Some(to_major())
            } else {
                None
            }
        }
        Some(_) => finding,
        None if major_shift => (!major_bumped(reference, declared)).then(to_major),
        None => (!major_bumped(reference, declared) && !minor_bumped(reference, declared))
            .then(to_minor),
    }
}

/// Version of a re-exported component as seen by a dependent: the
/// baseline's copy when it satisfies the range, else the range minimum.
fn resolved_version(baseline: &Baseline, id: &str, range: &VersionRange) -> Version {
    baseline
        .component(id)
        .map(|c| c.version.clone())
        .filter(|v| range.includes(v))
        .unwrap_or_else(|| range.min.clone())
}

/// The re-exported component whose resolved version moved across a major
/// boundary, or failing that the first one that moved across a minor
/// boundary.
pub fn check_reexports(
    reference: (&Component, &Baseline),
    current: (&Component, &Baseline),
) -> Option<ReexportShift> {
    let (ref_component, ref_baseline) = reference;
    let (cur_component, cur_baseline) = current;
    let mut minor = None;

    for reexport in &cur_component.reexports {
        let Some(old_reexport) = ref_component.reexport(&reexport.component_id) else {
            continue;
        };
        let old = resolved_version(ref_baseline, &reexport.component_id, &old_reexport.range);
        let new = resolved_version(cur_baseline, &reexport.component_id, &reexport.range);
        if old.major != new.major {
            return Some(ReexportShift {
                kind: VersionProblemKind::ReexportedMajorVersionChange,
                component_id: reexport.component_id.clone(),
            });
        }
        if old.minor != new.minor && minor.is_none() {
            minor = Some(ReexportShift {
                kind: VersionProblemKind::ReexportedMinorVersionChange,
                component_id: reexport.component_id.clone(),
            });
        }
    }
    minor
}

/// The configured mode for a version problem. Problems asking for a
/// larger version cannot be ignored and are shown as warnings instead.
pub fn error_mode(kind: VersionProblemKind, settings: &ApiConfigSettings) -> ErrorMode {
    let configured = match kind {
        VersionProblemKind::MajorVersionChange
        | VersionProblemKind::MajorVersionChangeNoBreakage
        | VersionProblemKind::ReexportedMajorVersionChange => settings.major_error,
        VersionProblemKind::MinorVersionChange
        | VersionProblemKind::ReexportedMinorVersionChange => settings.minor_error,
        VersionProblemKind::MinorVersionChangeNoNewApi => settings.micro_error,
    };
    let under_bump = matches!(
        kind,
        VersionProblemKind::MajorVersionChange
            | VersionProblemKind::MinorVersionChange
            | VersionProblemKind::ReexportedMajorVersionChange
            | VersionProblemKind::ReexportedMinorVersionChange
    );
    if under_bump && configured == ErrorMode::Ignore {
        ErrorMode::Warning
    } else {
        configured
    }
}
