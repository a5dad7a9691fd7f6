//! Property-based tests for the version policy.
//!
//! These tests use proptest to generate versions and tag sets and verify
//! that the bumping and selection rules hold for all of them.

#[cfg(test)]
mod proptest_tests {
    use crate::catalog::latest_tags;
    use crate::version::{next_bom_version, next_booster_version, strip_snapshot, BoosterVersion};
    use proptest::prelude::*;

    fn core() -> impl Strategy<Value = String> {
        (0u32..20, 0u32..20, 0u32..40).prop_map(|(major, minor, patch)| format!("{}.{}.{}", major, minor, patch))
    }

    // ============================================================================
    // booster revision bump
    // ============================================================================

    proptest! {
        /// Property: bumping increments the revision and keeps core and qualifier
        #[test]
        fn bump_increments_revision_only(
            core in core(),
            revision in 0u64..10_000,
            qualifier in proptest::option::of("[a-zA-Z][a-zA-Z0-9]{0,8}"),
        ) {
            let current = match &qualifier {
                Some(q) => format!("{}-{}-{}", core, revision, q),
                None => format!("{}-{}", core, revision),
            };
            let next = next_booster_version(&current);
            let parsed = BoosterVersion::parse(&next).expect("bumped version parses");
            prop_assert_eq!(parsed.core.to_string(), core);
            prop_assert_eq!(parsed.revision, revision + 1);
            prop_assert_eq!(parsed.qualifier, qualifier);
        }

        /// Property: versions of any other shape pass through unchanged
        #[test]
        fn bump_leaves_unknown_shapes(input in "[a-z ]{0,12}") {
            prop_assert_eq!(next_booster_version(&input), input);
        }

        /// Property: stripping the snapshot suffix is idempotent
        #[test]
        fn strip_snapshot_is_idempotent(core in core(), revision in 0u64..100) {
            let snapshot = format!("{}-{}-SNAPSHOT", core, revision);
            let once = strip_snapshot(&snapshot);
            prop_assert_eq!(strip_snapshot(once), once);
            prop_assert!(!once.ends_with("-SNAPSHOT"));
        }
    }

    // ============================================================================
    // BOM self-bump
    // ============================================================================

    proptest! {
        /// Property: releasing service pack k moves development to k + 1
        #[test]
        fn service_pack_advances(core in core(), k in 1u32..50) {
            let current = format!("{}-SNAPSHOT", core);
            let released = format!("{}.SP{}", core, k);
            prop_assert_eq!(
                next_bom_version(&current, &released),
                format!("{}.SP{}-SNAPSHOT", core, k + 1)
            );
        }

        /// Property: beta releases never move the BOM version
        #[test]
        fn beta_leaves_version(core in core(), n in 0u32..10) {
            let current = format!("{}-SNAPSHOT", core);
            prop_assert_eq!(next_bom_version(&current, &format!("{}.Beta{}", core, n)), current);
        }
    }

    // ============================================================================
    // catalog tag selection
    // ============================================================================

    proptest! {
        /// Property: the selected tag carries the numerically highest revision
        #[test]
        fn latest_tag_is_highest_revision(
            core in core(),
            revisions in proptest::collection::vec(1u64..500, 1..20),
        ) {
            let mut tags: Vec<String> = revisions.iter().map(|r| format!("{}-{}", core, r)).collect();
            tags.extend(revisions.iter().map(|r| format!("{}-{}-redhat", core, r)));
            let max = revisions.iter().max().copied().unwrap_or_default();

            let latest = latest_tags(&tags, &format!("{}.RELEASE", core), "redhat").unwrap();
            prop_assert_eq!(latest.community, Some(format!("{}-{}", core, max)));
            prop_assert_eq!(latest.productized, Some(format!("{}-{}-redhat", core, max)));
        }
    }
}
