//! Property-based tests for the version recognizer and identifier splitter.
//!
//! These tests use proptest to generate random inputs and verify that
//! invariants hold for all possible inputs.

#[cfg(test)]
mod proptest_tests {
    use crate::version::{is_version, split_package_identifier};
    use proptest::prelude::*;

    /// Version strings that the grammar accepts.
    const VALID_VERSION: &str =
        "[0-9]{1,4}(\\.[0-9]{1,4}){0,3}[a-z]?(_(alpha|beta|pre|rc|p)[0-9]{0,3}){0,2}(-r[0-9]{0,2})?";

    /// Package names made of hyphen-separated words that start with a letter,
    /// so no hyphen inside them can begin a version.
    const HYPHENATED_NAME: &str = "[a-z][a-z0-9+]{0,8}(-[a-z][a-z0-9+]{0,8}){0,3}";

    // ============================================================================
    // is_version property tests
    // ============================================================================

    proptest! {
        /// Property: every string generated from the grammar is recognized
        #[test]
        fn grammar_strings_are_versions(version in VALID_VERSION) {
            prop_assert!(is_version(&version), "'{}' should be a version", version);
        }

        /// Property: a version never starts with anything but a digit
        #[test]
        fn non_digit_prefix_is_rejected(input in "[a-zA-Z_.+-][a-z0-9._+-]{0,12}") {
            prop_assert!(!is_version(&input));
        }

        /// Property: appending a dot to a version makes it invalid
        #[test]
        fn trailing_dot_is_rejected(version in "[0-9]{1,3}(\\.[0-9]{1,3}){0,3}") {
            let dotted = format!("{}.", version);
            prop_assert!(!is_version(&dotted));
        }
    }

    // ============================================================================
    // split_package_identifier property tests
    // ============================================================================

    proptest! {
        /// Property: the name/version boundary is recovered for hyphenated names
        #[test]
        fn split_recovers_name_and_version(
            category in "[a-z]{2,6}-[a-z]{2,6}",
            name in HYPHENATED_NAME,
            version in VALID_VERSION,
        ) {
            let id = format!("{}/{}-{}", category, name, version);
            let pkg = split_package_identifier(&id).unwrap();
            prop_assert_eq!(pkg.category, category);
            prop_assert_eq!(pkg.name, Some(name));
            prop_assert_eq!(pkg.version, Some(version));
        }

        /// Property: identifiers whose name has no version suffix stay unversioned
        #[test]
        fn split_without_version_is_unversioned(
            category in "[a-z]{2,6}-[a-z]{2,6}",
            name in HYPHENATED_NAME,
        ) {
            let id = format!("{}/{}", category, name);
            let pkg = split_package_identifier(&id).unwrap();
            prop_assert!(pkg.name.is_none());
            prop_assert!(pkg.version.is_none());
        }

        /// Property: split is deterministic
        #[test]
        fn split_is_deterministic(id in "[a-z0-9._+-]{1,10}/[a-z0-9._+-]{0,20}") {
            let first = split_package_identifier(&id).unwrap();
            let second = split_package_identifier(&id).unwrap();
            prop_assert_eq!(first, second);
        }

        /// Property: when a version is found, reassembling gives back the input
        #[test]
        fn split_reassembles(id in "[a-z]{1,6}/[a-z0-9._+-]{1,20}") {
            let pkg = split_package_identifier(&id).unwrap();
            if let (Some(name), Some(version)) = (&pkg.name, &pkg.version) {
                prop_assert!(is_version(version));
                prop_assert_eq!(format!("{}/{}-{}", pkg.category, name, version), id);
            }
        }

        /// Property: anything without exactly one slash is rejected
        #[test]
        fn split_rejects_extra_slashes(a in "[a-z]{1,5}", b in "[a-z]{1,5}", c in "[a-z0-9.-]{1,8}") {
            let id = format!("{}/{}/{}", a, b, c);
            prop_assert!(split_package_identifier(&id).is_err());
            prop_assert!(split_package_identifier(&c.replace('/', "")).is_err());
        }
    }
}
