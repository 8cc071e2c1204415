// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Path Arbiter (C2): resolves a rendered, recipe-supplied relative path
//! against a sandbox root without ever allowing it to escape that root.
//!
//! Resolution is purely lexical — the target file usually doesn't exist yet
//! — so `..` is rejected by tracking a virtual path stack rather than by
//! calling [`std::fs::canonicalize`].

use crate::error::PathError;
use std::path::{Path, PathBuf};

/// Resolve `relative` against `sandbox_root`, rejecting any path that is
/// absolute or that attempts to climb above the sandbox root via `..`.
pub fn resolve(sandbox_root: &Path, relative: &str) -> Result<PathBuf, PathError> {
    if Path::new(relative).is_absolute() {
        return Err(PathError::Escape(relative.to_string()));
    }

    let mut stack: Vec<&str> = Vec::new();
    for component in relative.split(['/', '\\']) {
        match component {
            "" | "." => continue,
            ".." => {
                if stack.pop().is_none() {
                    return Err(PathError::Escape(relative.to_string()));
                }
            }
            other => stack.push(other),
        }
    }

    Ok(stack.iter().fold(sandbox_root.to_path_buf(), |acc, seg| acc.join(seg)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_simple_relative_path() {
        let root = Path::new("/sandbox/demo");
        let resolved = resolve(root, "src/lib.rs").unwrap();
        assert_eq!(resolved, Path::new("/sandbox/demo/src/lib.rs"));
    }

    #[test]
    fn collapses_internal_dot_dot_within_bounds() {
        let root = Path::new("/sandbox/demo");
        let resolved = resolve(root, "src/../lib.rs").unwrap();
        assert_eq!(resolved, Path::new("/sandbox/demo/lib.rs"));
    }

    #[test]
    fn rejects_absolute_paths() {
        let root = Path::new("/sandbox/demo");
        assert_eq!(
            resolve(root, "/etc/passwd").unwrap_err(),
            PathError::Escape("/etc/passwd".to_string())
        );
    }

    #[test]
    fn rejects_escape_above_sandbox_root() {
        let root = Path::new("/sandbox/demo");
        assert!(resolve(root, "../outside").is_err());
        assert!(resolve(root, "a/../../outside").is_err());
    }

    proptest::proptest! {
        /// Invariant 1: for any generated relative path, `resolve` either
        /// yields a path under the sandbox root or an `Escape` error, never
        /// both and never neither.
        #[test]
        fn resolved_path_never_escapes_sandbox_root(
            segments in proptest::collection::vec(
                proptest::prop_oneof![
                    "[a-z]{1,6}",
                    proptest::prop::strategy::Just("..".to_string()),
                    proptest::prop::strategy::Just(".".to_string()),
                ],
                0..8,
            )
        ) {
            let root = Path::new("/sandbox/demo");
            let relative = segments.join("/");
            match resolve(root, &relative) {
                Ok(resolved) => proptest::prop_assert!(resolved.starts_with(root)),
                Err(PathError::Escape(rejected)) => proptest::prop_assert_eq!(rejected, relative),
            }
        }
    }
}
