//! Version ranges as they appear in `elm-package.json`, and the interval
//! arithmetic the resolver performs on them.
//!
//! Accepted textual forms (whitespace is ignored):
//! - Elm manifest syntax: `A <= v < B`, `A <= v <= B`, `A < v <= B`, `A < v < B`
//! - operator syntax: `>=A <B`, `>=A <=B`, `>A <=B`, `>A <B`, `>=A`, `>A`
//! - a bare version `A`, meaning `>=A`
//!
//! Every other shape is rejected with a [`ConstraintParseError`].

use std::cmp::Ordering;
use std::fmt;

use semver::Version;
use thiserror::Error;

/// One end of a version interval.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Bound {
    pub version: Version,
    pub inclusive: bool,
}

impl Bound {
    pub fn inclusive(version: Version) -> Self {
        Self {
            version,
            inclusive: true,
        }
    }

    pub fn exclusive(version: Version) -> Self {
        Self {
            version,
            inclusive: false,
        }
    }
}

/// An acceptable version interval for a package.
///
/// A lower bound is always present; a missing upper bound means +infinity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Constraint {
    pub lower: Bound,
    pub upper: Option<Bound>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConstraintParseError {
    #[error("empty version range")]
    Empty,

    #[error("invalid version '{text}': {reason}")]
    InvalidVersion { text: String, reason: String },

    #[error("unsupported range syntax '{0}'")]
    Unsupported(String),

    #[error("range '{0}' excludes every version")]
    EmptyRange(String),

    #[error("version {0} has no next patch release")]
    PatchOverflow(Version),
}

/// Returned by [`Constraint::intersect`] when two ranges share no version.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{left} and {right} do not overlap")]
pub struct Unsatisfiable {
    pub left: Constraint,
    pub right: Constraint,
}

impl Constraint {
    /// `>= version`, no upper bound.
    pub fn at_least(version: Version) -> Self {
        Self {
            lower: Bound::inclusive(version),
            upper: None,
        }
    }

    pub fn between(lower: Bound, upper: Bound) -> Self {
        Self {
            lower,
            upper: Some(upper),
        }
    }

    /// `version <= v < version with patch + 1`, the range a pinned
    /// dependency is rewritten to.
    pub fn exact_patch(version: &Version) -> Result<Self, ConstraintParseError> {
        let patch = version
            .patch
            .checked_add(1)
            .ok_or_else(|| ConstraintParseError::PatchOverflow(version.clone()))?;
        let next = Version::new(version.major, version.minor, patch);
        Ok(Self::between(Bound::inclusive(version.clone()), Bound::exclusive(next)))
    }

    pub fn parse(text: &str) -> Result<Self, ConstraintParseError> {
        let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
        if compact.is_empty() {
            return Err(ConstraintParseError::Empty);
        }

        let parsed = if let Some(rest) = compact.strip_prefix(">=") {
            Self::parse_operator_form(rest, true, &compact)?
        } else if let Some(rest) = compact.strip_prefix('>') {
            Self::parse_operator_form(rest, false, &compact)?
        } else if compact.starts_with(|c: char| c.is_ascii_digit()) {
            match compact.split_once('<') {
                Some((lower, rest)) => Self::parse_elm_form(lower, rest, &compact)?,
                None => Self::at_least(parse_version(&compact)?),
            }
        } else {
            return Err(ConstraintParseError::Unsupported(compact));
        };

        if parsed.is_empty() {
            return Err(ConstraintParseError::EmptyRange(text.trim().to_string()));
        }
        Ok(parsed)
    }

    /// `>=A` / `>A`, optionally followed by `<B` / `<=B`. `rest` follows the operator.
    fn parse_operator_form(
        rest: &str,
        lower_inclusive: bool,
        whole: &str,
    ) -> Result<Self, ConstraintParseError> {
        let (lower_text, upper_text) = match rest.split_once('<') {
            Some((lower, upper)) => (lower, Some(upper)),
            None => (rest, None),
        };
        let lower = Bound {
            version: parse_version(lower_text)?,
            inclusive: lower_inclusive,
        };
        let upper = upper_text
            .map(|text| parse_upper(text, whole))
            .transpose()?;
        Ok(Self { lower, upper })
    }

    /// `A<=v<B` and its variants. `rest` is everything after the first `<`.
    fn parse_elm_form(
        lower_text: &str,
        rest: &str,
        whole: &str,
    ) -> Result<Self, ConstraintParseError> {
        let (lower_inclusive, upper_text) = if let Some(upper) = rest.strip_prefix("=v<") {
            (true, upper)
        } else if let Some(upper) = rest.strip_prefix("v<") {
            (false, upper)
        } else {
            return Err(ConstraintParseError::Unsupported(whole.to_string()));
        };
        let lower = Bound {
            version: parse_version(lower_text)?,
            inclusive: lower_inclusive,
        };
        Ok(Self::between(lower, parse_upper(upper_text, whole)?))
    }

    /// Whether `version` lies inside this interval.
    pub fn satisfies(&self, version: &Version) -> bool {
        let above_lower = match version.cmp(&self.lower.version) {
            Ordering::Greater => true,
            Ordering::Equal => self.lower.inclusive,
            Ordering::Less => false,
        };
        above_lower
            && self.upper.as_ref().map_or(true, |upper| {
                match version.cmp(&upper.version) {
                    Ordering::Less => true,
                    Ordering::Equal => upper.inclusive,
                    Ordering::Greater => false,
                }
            })
    }

    /// Whether `version` may be picked for this range.
    ///
    /// Inside the interval, a pre-release is only admitted when one of the
    /// bounds is itself a pre-release of the same `major.minor.patch`, so
    /// `1.0.0 <= v < 2.0.0` never selects `2.0.0-beta.1`.
    pub fn allows(&self, version: &Version) -> bool {
        if !self.satisfies(version) {
            return false;
        }
        version.pre.is_empty()
            || std::iter::once(&self.lower)
                .chain(self.upper.as_ref())
                .any(|bound| !bound.version.pre.is_empty() && same_release(&bound.version, version))
    }

    /// Tightest interval admitted by both `self` and `other`.
    pub fn intersect(&self, other: &Constraint) -> Result<Constraint, Unsatisfiable> {
        let lower = tighter_lower(&self.lower, &other.lower).clone();
        let upper = match (&self.upper, &other.upper) {
            (Some(a), Some(b)) => Some(tighter_upper(a, b).clone()),
            (Some(only), None) | (None, Some(only)) => Some(only.clone()),
            (None, None) => None,
        };
        let merged = Constraint { lower, upper };
        if merged.is_empty() {
            return Err(Unsatisfiable {
                left: self.clone(),
                right: other.clone(),
            });
        }
        Ok(merged)
    }

    /// True when no version can satisfy the interval.
    pub fn is_empty(&self) -> bool {
        match &self.upper {
            None => false,
            Some(upper) => match self.lower.version.cmp(&upper.version) {
                Ordering::Greater => true,
                Ordering::Equal => !(self.lower.inclusive && upper.inclusive),
                Ordering::Less => false,
            },
        }
    }

    /// Render in `elm-package.json` syntax (`1.0.0 <= v < 2.0.0`).
    ///
    /// Returns `None` for open-ended ranges, which Elm manifests cannot express.
    pub fn elm_syntax(&self) -> Option<String> {
        let upper = self.upper.as_ref()?;
        Some(format!(
            "{} {} v {} {}",
            self.lower.version,
            if self.lower.inclusive { "<=" } else { "<" },
            if upper.inclusive { "<=" } else { "<" },
            upper.version
        ))
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = if self.lower.inclusive { ">=" } else { ">" };
        write!(f, "{op}{}", self.lower.version)?;
        if let Some(ref upper) = self.upper {
            let op = if upper.inclusive { "<=" } else { "<" };
            write!(f, " {op}{}", upper.version)?;
        }
        Ok(())
    }
}

fn parse_version(text: &str) -> Result<Version, ConstraintParseError> {
    Version::parse(text).map_err(|e| ConstraintParseError::InvalidVersion {
        text: text.to_string(),
        reason: e.to_string(),
    })
}

/// The text after a `<`: `=B` (inclusive) or `B` (exclusive).
fn parse_upper(text: &str, whole: &str) -> Result<Bound, ConstraintParseError> {
    if text.is_empty() {
        return Err(ConstraintParseError::Unsupported(whole.to_string()));
    }
    match text.strip_prefix('=') {
        Some(version) => Ok(Bound::inclusive(parse_version(version)?)),
        None => Ok(Bound::exclusive(parse_version(text)?)),
    }
}

fn same_release(a: &Version, b: &Version) -> bool {
    (a.major, a.minor, a.patch) == (b.major, b.minor, b.patch)
}

fn tighter_lower<'a>(a: &'a Bound, b: &'a Bound) -> &'a Bound {
    match a.version.cmp(&b.version) {
        Ordering::Greater => a,
        Ordering::Less => b,
        Ordering::Equal if a.inclusive => b,
        Ordering::Equal => a,
    }
}

fn tighter_upper<'a>(a: &'a Bound, b: &'a Bound) -> &'a Bound {
    match a.version.cmp(&b.version) {
        Ordering::Less => a,
        Ordering::Greater => b,
        Ordering::Equal if a.inclusive => b,
        Ordering::Equal => a,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    fn c(s: &str) -> Constraint {
        Constraint::parse(s).unwrap()
    }

    #[test]
    fn elm_inclusive_exclusive() {
        let range = c("1.0.0 <= v < 2.0.0");
        assert_eq!(range.lower, Bound::inclusive(v("1.0.0")));
        assert_eq!(range.upper, Some(Bound::exclusive(v("2.0.0"))));
    }

    #[test]
    fn elm_all_bound_kinds() {
        assert_eq!(c("1.0.0 <= v <= 2.0.0").upper, Some(Bound::inclusive(v("2.0.0"))));
        assert_eq!(c("1.0.0 < v <= 2.0.0").lower, Bound::exclusive(v("1.0.0")));
        let open = c("1.0.0 < v < 2.0.0");
        assert!(!open.lower.inclusive);
        assert!(!open.upper.unwrap().inclusive);
    }

    #[test]
    fn operator_forms() {
        assert_eq!(c(">=1.0.0 <2.0.0"), c("1.0.0 <= v < 2.0.0"));
        assert_eq!(c(">=1.0.0<=2.0.0"), c("1.0.0 <= v <= 2.0.0"));
        assert_eq!(c(">1.0.0 <=2.0.0"), c("1.0.0 < v <= 2.0.0"));
        assert_eq!(c(">1.0.0 <2.0.0"), c("1.0.0 < v < 2.0.0"));
        assert_eq!(c(">=1.2.3"), Constraint::at_least(v("1.2.3")));
        assert_eq!(c(">1.2.3").upper, None);
    }

    #[test]
    fn bare_version_is_minimum() {
        assert_eq!(c("4.0.5"), Constraint::at_least(v("4.0.5")));
    }

    #[test]
    fn unsupported_operators_rejected() {
        for raw in ["^1.0.0", "~1.2.3", "<2.0.0", "=1.0.0", "latest"] {
            assert!(
                matches!(
                    Constraint::parse(raw),
                    Err(ConstraintParseError::Unsupported(_))
                ),
                "{raw} should be unsupported"
            );
        }
    }

    #[test]
    fn malformed_ranges_rejected() {
        assert_eq!(Constraint::parse("   "), Err(ConstraintParseError::Empty));
        assert!(Constraint::parse("1.0.0 <= v").is_err());
        assert!(Constraint::parse("1.0.0 <= x < 2.0.0").is_err());
        assert!(Constraint::parse(">=1.0.0 <").is_err());
        assert!(matches!(
            Constraint::parse("1.0 <= v < 2.0"),
            Err(ConstraintParseError::InvalidVersion { .. })
        ));
    }

    #[test]
    fn inverted_range_rejected() {
        assert!(matches!(
            Constraint::parse("2.0.0 <= v < 1.0.0"),
            Err(ConstraintParseError::EmptyRange(_))
        ));
        assert!(Constraint::parse("1.0.0 <= v < 1.0.0").is_err());
        assert!(Constraint::parse("1.0.0 <= v <= 1.0.0").is_ok());
    }

    #[test]
    fn satisfies_respects_bound_kinds() {
        let half_open = c("1.0.0 <= v < 2.0.0");
        assert!(half_open.satisfies(&v("1.0.0")));
        assert!(half_open.satisfies(&v("1.9.9")));
        assert!(!half_open.satisfies(&v("2.0.0")));
        assert!(!half_open.satisfies(&v("0.9.0")));

        let closed = c("1.0.0 <= v <= 2.0.0");
        assert!(closed.satisfies(&v("2.0.0")));

        let exclusive_lower = c(">1.0.0");
        assert!(!exclusive_lower.satisfies(&v("1.0.0")));
        assert!(exclusive_lower.satisfies(&v("1.0.1")));
        assert!(exclusive_lower.satisfies(&v("99.0.0")));
    }

    #[test]
    fn intersect_takes_tightest_bounds() {
        let merged = c(">=1.0.0 <3.0.0").intersect(&c(">=2.0.0")).unwrap();
        assert_eq!(merged, c(">=2.0.0 <3.0.0"));

        let merged = c(">=1.0.0 <=2.0.0").intersect(&c(">=1.0.0 <2.0.0")).unwrap();
        assert_eq!(merged, c(">=1.0.0 <2.0.0"));

        let merged = c(">1.0.0").intersect(&c(">=1.0.0")).unwrap();
        assert_eq!(merged, c(">1.0.0"));
    }

    #[test]
    fn intersect_disjoint_is_unsatisfiable() {
        let err = c(">=1.0.0 <2.0.0").intersect(&c(">=2.0.0")).unwrap_err();
        assert_eq!(err.left, c(">=1.0.0 <2.0.0"));
        assert!(c(">=1.0.0 <=2.0.0").intersect(&c(">=2.0.0")).is_ok());
        assert!(c(">=0.3.0").intersect(&c("0.1.0 <= v < 0.2.0")).is_err());
    }

    #[test]
    fn intersect_with_self_is_noop() {
        let range = c("1.0.0 < v <= 2.0.0");
        assert_eq!(range.intersect(&range).unwrap(), range);
    }

    #[test]
    fn display_is_reparseable() {
        for raw in ["1.0.0 <= v < 2.0.0", ">1.0.0", "1.0.0 < v <= 1.5.0", "3.0.0"] {
            let range = c(raw);
            assert_eq!(c(&range.to_string()), range);
        }
        assert_eq!(c("1.0.0 <= v < 2.0.0").to_string(), ">=1.0.0 <2.0.0");
    }

    #[test]
    fn elm_syntax_output() {
        assert_eq!(
            c(">=1.0.0 <2.0.0").elm_syntax().as_deref(),
            Some("1.0.0 <= v < 2.0.0")
        );
        assert_eq!(c(">=1.0.0").elm_syntax(), None);
    }

    #[test]
    fn exact_patch_admits_only_that_release() {
        let pin = Constraint::exact_patch(&v("1.2.3")).unwrap();
        assert!(pin.allows(&v("1.2.3")));
        assert!(!pin.allows(&v("1.2.4")));
        assert!(!pin.allows(&v("1.2.2")));
        assert!(!pin.allows(&v("1.2.4-rc.1")));
        assert_eq!(pin.elm_syntax().as_deref(), Some("1.2.3 <= v < 1.2.4"));
    }

    #[test]
    fn exact_patch_of_max_patch_is_an_error() {
        let top = Version::new(1, 2, u64::MAX);
        assert_eq!(
            Constraint::exact_patch(&top),
            Err(ConstraintParseError::PatchOverflow(top))
        );
    }

    #[test]
    fn pre_releases_need_a_matching_bound() {
        let range = c("1.0.0 <= v < 2.0.0");
        assert!(range.satisfies(&v("2.0.0-beta.1")));
        assert!(!range.allows(&v("2.0.0-beta.1")));
        assert!(!range.allows(&v("1.5.0-alpha")));
        assert!(range.allows(&v("1.9.0")));

        let opted_in = c(">=2.0.0-beta.1 <3.0.0");
        assert!(opted_in.allows(&v("2.0.0-beta.2")));
        assert!(opted_in.allows(&v("2.0.0")));
        assert!(!opted_in.allows(&v("2.1.0-beta.1")));

        let upper_pre = c(">=1.0.0 <=1.4.0-rc.2");
        assert!(upper_pre.allows(&v("1.4.0-rc.1")));
        assert!(!upper_pre.allows(&v("1.3.0-rc.1")));
    }
}
