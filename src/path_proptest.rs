//! Property-based tests for path manipulation functions.
//!
//! These tests use proptest to generate random inputs and verify that
//! invariants hold for all possible inputs.

#[cfg(test)]
mod proptest_tests {
    use std::path::{Path, PathBuf};

    use crate::path::{clean, common_prefix, relative_path, relocate_grep_line, relocate_status_line};
    use proptest::prelude::*;

    /// Relative paths made of plain names only
    fn plain_relative() -> impl Strategy<Value = String> {
        "[a-z]{1,6}(/[a-z]{1,6}){0,4}"
    }

    /// Relative paths that may contain `.` and `..` components
    fn dotted_relative() -> impl Strategy<Value = String> {
        prop::collection::vec(prop_oneof!["[a-z]{1,4}", Just(".".to_string()), Just("..".to_string())], 1..8)
            .prop_map(|parts| parts.join("/"))
    }

    // ============================================================================
    // clean property tests
    // ============================================================================

    proptest! {
        /// Property: cleaning twice gives the same result as cleaning once
        #[test]
        fn clean_is_idempotent(input in dotted_relative()) {
            let once = clean(Path::new(&input));
            let twice = clean(&once);
            prop_assert_eq!(once, twice);
        }

        /// Property: a cleaned path never contains `.` components
        #[test]
        fn clean_removes_current_dir(input in dotted_relative()) {
            let cleaned = clean(Path::new(&input));
            if cleaned != Path::new(".") {
                prop_assert!(cleaned.components().all(|c| c != std::path::Component::CurDir));
            }
        }

        /// Property: plain names are left alone
        #[test]
        fn clean_preserves_plain_paths(input in plain_relative()) {
            prop_assert_eq!(clean(Path::new(&input)), PathBuf::from(&input));
        }
    }

    // ============================================================================
    // relative_path property tests
    // ============================================================================

    proptest! {
        /// Property: a path below the base is reported by its tail
        #[test]
        fn relative_path_of_child_is_tail(base in plain_relative(), rel in plain_relative()) {
            let base = Path::new("/").join(base);
            let path = base.join(&rel);
            prop_assert_eq!(relative_path(&path, &base), PathBuf::from(&rel));
        }

        /// Property: a path relative to itself is `.`
        #[test]
        fn relative_path_to_self_is_dot(input in plain_relative()) {
            let path = Path::new("/").join(input);
            prop_assert_eq!(relative_path(&path, &path), PathBuf::from("."));
        }

        /// Property: joining the base with the relative path leads back to the path
        #[test]
        fn relative_path_round_trips_through_join(a in plain_relative(), b in plain_relative()) {
            let path = Path::new("/").join(a);
            let base = Path::new("/").join(b);
            let rel = relative_path(&path, &base);
            prop_assert_eq!(clean(&base.join(rel)), clean(&path));
        }
    }

    // ============================================================================
    // common_prefix property tests
    // ============================================================================

    proptest! {
        /// Property: the common prefix of a single path is the path itself
        #[test]
        fn common_prefix_of_one_path(input in plain_relative()) {
            prop_assert_eq!(common_prefix([input.as_str()]), Some(PathBuf::from(&input)));
        }

        /// Property: the common prefix is a prefix of every input
        #[test]
        fn common_prefix_is_shared(a in plain_relative(), b in plain_relative()) {
            if let Some(prefix) = common_prefix([a.as_str(), b.as_str()]) {
                prop_assert!(Path::new(&a).starts_with(&prefix));
                prop_assert!(Path::new(&b).starts_with(&prefix));
            }
        }
    }

    // ============================================================================
    // relocation property tests
    // ============================================================================

    proptest! {
        /// Property: grep relocation only touches the file name
        #[test]
        fn relocate_grep_line_keeps_the_match(
            name in plain_relative(),
            offset in plain_relative(),
            rest in "[0-9]{1,4}:[ -~]{0,20}",
        ) {
            let line = format!("{name}:{rest}");
            let relocated = relocate_grep_line(&line, Path::new(&offset));
            prop_assert_eq!(relocated, format!("{offset}/{name}:{rest}"));
        }

        /// Property: color escapes around the file name survive relocation
        #[test]
        fn relocate_grep_line_keeps_colors(name in plain_relative(), offset in plain_relative()) {
            let line = format!("\x1b[35m\x1b[K{name}\x1b[m\x1b[K:1:text");
            let relocated = relocate_grep_line(&line, Path::new(&offset));
            prop_assert!(relocated.starts_with("\x1b[35m\x1b[K"));
            prop_assert!(relocated.ends_with("\x1b[m\x1b[K:1:text"));
            let expected = format!("{offset}/{name}");
            prop_assert!(relocated.contains(&expected));
        }

        /// Property: relocating a status line by `.` leaves it unchanged
        #[test]
        fn relocate_status_line_by_dot_is_identity(name in plain_relative()) {
            let line = format!("M {name}");
            prop_assert_eq!(relocate_status_line(&line, 2, Path::new(".")), line);
        }
    }
}
