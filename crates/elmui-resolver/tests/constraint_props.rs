use elmui_resolver::version::{Bound, Constraint};
use proptest::prelude::*;
use semver::Version;

fn version() -> impl Strategy<Value = Version> {
    (0u64..4, 0u64..4, 0u64..4).prop_map(|(major, minor, patch)| Version::new(major, minor, patch))
}

fn bound() -> impl Strategy<Value = Bound> {
    (version(), any::<bool>()).prop_map(|(version, inclusive)| Bound { version, inclusive })
}

fn constraint() -> impl Strategy<Value = Constraint> {
    (bound(), proptest::option::of(bound()))
        .prop_map(|(lower, upper)| Constraint { lower, upper })
        .prop_filter("non-empty range", |c| !c.is_empty())
}

/// Plain tuple comparison, independent of the `Ordering`-based implementation.
fn reference_satisfies(c: &Constraint, v: &Version) -> bool {
    let key = |v: &Version| (v.major, v.minor, v.patch);
    let lower_ok = if c.lower.inclusive {
        key(v) >= key(&c.lower.version)
    } else {
        key(v) > key(&c.lower.version)
    };
    let upper_ok = match &c.upper {
        None => true,
        Some(u) if u.inclusive => key(v) <= key(&u.version),
        Some(u) => key(v) < key(&u.version),
    };
    lower_ok && upper_ok
}

proptest! {
    #[test]
    fn display_then_parse_keeps_meaning(c in constraint(), v in version()) {
        let reparsed = Constraint::parse(&c.to_string()).unwrap();
        prop_assert_eq!(reparsed.satisfies(&v), c.satisfies(&v));
        prop_assert_eq!(reparsed, c);
    }

    #[test]
    fn elm_syntax_parses_back(c in constraint()) {
        if let Some(text) = c.elm_syntax() {
            prop_assert_eq!(Constraint::parse(&text).unwrap(), c);
        }
    }

    #[test]
    fn satisfies_matches_reference(c in constraint(), v in version()) {
        prop_assert_eq!(c.satisfies(&v), reference_satisfies(&c, &v));
    }

    #[test]
    fn intersect_is_commutative(a in constraint(), b in constraint()) {
        prop_assert_eq!(a.intersect(&b).ok(), b.intersect(&a).ok());
    }

    #[test]
    fn intersect_is_associative(a in constraint(), b in constraint(), c in constraint()) {
        let left = a.intersect(&b).ok().and_then(|ab| ab.intersect(&c).ok());
        let right = b.intersect(&c).ok().and_then(|bc| a.intersect(&bc).ok());
        prop_assert_eq!(left, right);
    }

    #[test]
    fn intersect_with_self_is_identity(a in constraint()) {
        prop_assert_eq!(a.intersect(&a).unwrap(), a);
    }

    #[test]
    fn intersection_admits_exactly_the_common_versions(
        a in constraint(),
        b in constraint(),
        v in version(),
    ) {
        let both = a.satisfies(&v) && b.satisfies(&v);
        match a.intersect(&b) {
            Ok(merged) => prop_assert_eq!(merged.satisfies(&v), both),
            Err(_) => prop_assert!(!both),
        }
    }
}

#[test]
fn disjoint_ranges_are_unsatisfiable() {
    let low = Constraint::parse("1.0.0 <= v < 2.0.0").unwrap();
    let high = Constraint::parse("2.0.0 <= v < 3.0.0").unwrap();
    let err = low.intersect(&high).unwrap_err();
    assert_eq!(err.left, low);
    assert_eq!(err.right, high);
}
