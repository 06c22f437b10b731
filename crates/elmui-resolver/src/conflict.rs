//! Resolution failures and the re-pick report.

use std::fmt;

use miette::Diagnostic;
use semver::Version;
use thiserror::Error;

use crate::package::PackageId;
use crate::version::Constraint;

/// Why a resolution run stopped. The first fatal error aborts the run; no
/// partial resolution is ever returned alongside it.
#[derive(Debug, Clone, Error, Diagnostic)]
pub enum ResolveError {
    /// A manifest declared a range the constraint parser rejects.
    #[error("invalid version range '{raw}' for {package} (required by {requirer}): {reason}")]
    #[diagnostic(code(resolve::parse))]
    Parse {
        package: PackageId,
        requirer: String,
        raw: String,
        reason: String,
    },

    /// Every known version of the package falls outside its constraint.
    #[error("no version of {package} satisfies {constraint} ({available} known versions, required by {required_by})")]
    #[diagnostic(
        code(resolve::no_satisfying_version),
        help("Check that the package publishes version tags inside the requested range")
    )]
    NoSatisfyingVersion {
        package: PackageId,
        constraint: Constraint,
        available: usize,
        required_by: String,
    },

    /// Two requirers asked for ranges of the same package that do not overlap.
    #[error("conflicting constraints for {package}: {existing} (from {existing_from}) and {incoming} (from {incoming_from})")]
    #[diagnostic(code(resolve::conflict))]
    ConflictingConstraints {
        package: PackageId,
        existing: Constraint,
        existing_from: String,
        incoming: Constraint,
        incoming_from: String,
    },

    /// The version source failed or timed out.
    #[error("failed to fetch {package}{}: {message}", at_version(.version))]
    #[diagnostic(code(resolve::fetch), help("This may be a transient network problem; try again"))]
    Fetch {
        package: PackageId,
        version: Option<Version>,
        message: String,
    },
}

impl ResolveError {
    /// The package the failure is about.
    pub fn package(&self) -> &PackageId {
        match self {
            ResolveError::Parse { package, .. }
            | ResolveError::NoSatisfyingVersion { package, .. }
            | ResolveError::ConflictingConstraints { package, .. }
            | ResolveError::Fetch { package, .. } => package,
        }
    }
}

fn at_version(version: &Option<Version>) -> String {
    version.as_ref().map(|v| format!(" {v}")).unwrap_or_default()
}

/// Tentative picks that a later tightening forced the resolver to abandon.
#[derive(Debug, Default)]
pub struct ConflictReport {
    pub repicks: Vec<Repick>,
}

/// One abandoned pick.
#[derive(Debug, Clone)]
pub struct Repick {
    pub package: PackageId,
    pub abandoned: Version,
    pub picked: Version,
    pub constraint: Constraint,
}

impl ConflictReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, repick: Repick) {
        self.repicks.push(repick);
    }

    pub fn is_empty(&self) -> bool {
        self.repicks.is_empty()
    }
}

impl fmt::Display for ConflictReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.repicks.is_empty() {
            return write!(f, "No versions were re-picked.");
        }
        writeln!(f, "Re-picked versions ({}):", self.repicks.len())?;
        for r in &self.repicks {
            writeln!(f, "  {r}")?;
        }
        Ok(())
    }
}

impl fmt::Display for Repick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} -> {} (constraint tightened to {})",
            self.package, self.abandoned, self.picked, self.constraint
        )
    }
}
