//! Write access checks for edit targets

use crate::config::AssistantConfig;
use crate::config::constants::sentinels;
use crate::utils::normalize_path;
use std::path::Path;

/// Decides whether an edit may touch a path.
///
/// Comparison is lexical: separators folded to `/`, lowercased, `.` and
/// `..` segments resolved, and the root treated as a directory prefix.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessPolicy {
    root: Option<String>,
    private_dir: Option<String>,
}

impl AccessPolicy {
    /// No root: every path is allowed
    pub fn unrestricted() -> Self {
        Self::default()
    }

    pub fn new(root: Option<&str>, private_dir: Option<&Path>) -> Self {
        Self {
            root: root
                .filter(|root| !root.trim().is_empty())
                .map(|root| directory_prefix(root.trim())),
            private_dir: private_dir
                .and_then(Path::to_str)
                .map(directory_prefix)
                .filter(|prefix| !is_filesystem_root(prefix)),
        }
    }

    pub fn from_config(config: &AssistantConfig, private_dir: Option<&Path>) -> Self {
        Self::new(config.allowed_root(), private_dir)
    }

    pub fn root(&self) -> Option<&str> {
        self.root.as_deref()
    }

    /// Whether an edit may target `path`.
    ///
    /// `active_path` is the storage path of the active document, consulted
    /// when `path` is the `active` sentinel.
    pub fn is_allowed(&self, path: &str, active_path: Option<&str>) -> bool {
        let Some(root) = &self.root else {
            return true;
        };

        let normalized = canonical(path);
        if let Some(private_dir) = &self.private_dir {
            if normalized.starts_with(private_dir.as_str()) {
                return true;
            }
        }

        if path == sentinels::ACTIVE {
            return match active_path {
                Some(active) => self.is_allowed(active, None),
                None => true,
            };
        }

        if is_bare_relative(&normalized) {
            return true;
        }

        normalized.starts_with(root.as_str())
    }
}

/// No drive designator and no leading slash
fn is_bare_relative(normalized: &str) -> bool {
    !normalized.contains(':') && !normalized.starts_with('/')
}

/// `/`, `c:/` or a relative path that resolved to nothing
fn is_filesystem_root(prefix: &str) -> bool {
    let trimmed = prefix.trim_end_matches('/');
    trimmed.is_empty() || (trimmed.ends_with(':') && !trimmed.contains('/'))
}

fn directory_prefix(path: &str) -> String {
    let mut prefix = canonical(path);
    if !prefix.ends_with('/') {
        prefix.push('/');
    }
    prefix
}

/// Normalized path with `.` and `..` segments resolved
fn canonical(path: &str) -> String {
    let normalized = normalize_path(path);
    let absolute = normalized.starts_with('/');
    let trailing_slash = normalized.len() > 1 && normalized.ends_with('/');

    let mut segments: Vec<&str> = Vec::new();
    for segment in normalized.split('/') {
        match segment {
            "" | "." => {}
            ".." => match segments.last() {
                // A drive designator is the top of the path
                Some(last) if *last != ".." && !last.ends_with(':') => {
                    segments.pop();
                }
                None | Some(&"..") if !absolute => segments.push(".."),
                _ => {}
            },
            other => segments.push(other),
        }
    }

    let mut out = String::with_capacity(normalized.len());
    if absolute {
        out.push('/');
    }
    out.push_str(&segments.join("/"));
    if trailing_slash && !out.ends_with('/') {
        out.push('/');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(root: &str) -> AccessPolicy {
        AccessPolicy::new(Some(root), Some(Path::new("C:/Users/me/AppData/Roaming/quill")))
    }

    #[test]
    fn no_root_allows_everything() {
        let policy = AccessPolicy::unrestricted();
        assert!(policy.is_allowed("C:/anywhere/file.txt", None));
        assert!(policy.is_allowed("/etc/passwd", None));
    }

    #[test]
    fn paths_under_root_are_allowed() {
        let policy = policy("C:/proj");
        assert!(policy.is_allowed("C:/proj/src/main.cpp", None));
        assert!(policy.is_allowed(r"c:\PROJ\Assets\Player.cs", None));
        assert!(!policy.is_allowed("C:/other/file.txt", None));
        assert!(!policy.is_allowed("D:/proj/file.txt", None));
    }

    #[test]
    fn root_is_a_directory_prefix_not_a_string_prefix() {
        let policy = policy("/work/proj/");
        assert!(!policy.is_allowed("/work/project2/file.rs", None));
        assert!(policy.is_allowed("/work/proj/file.rs", None));
    }

    #[test]
    fn parent_segments_cannot_escape_root() {
        let policy = policy("C:/proj/");
        assert!(!policy.is_allowed("C:/proj/../other/file.txt", None));
        assert!(policy.is_allowed("C:/proj/src/../lib/a.rs", None));
        assert!(!policy.is_allowed("/work/proj/../../etc/passwd", None));
    }

    #[test]
    fn private_directory_is_exempt() {
        let policy = policy("C:/proj/");
        assert!(policy.is_allowed(r"C:\Users\me\AppData\Roaming\quill\ai_payload.json", None));
    }

    #[test]
    fn private_directory_that_resolves_to_a_root_is_ignored() {
        for dir in [".", "", "/", "c:/", "./sub/.."] {
            let policy = AccessPolicy::new(Some("C:/proj/"), Some(Path::new(dir)));
            assert!(!policy.is_allowed("/etc/passwd", None), "private dir {dir:?}");
            assert!(!policy.is_allowed("C:/other/file.txt", None), "private dir {dir:?}");
            assert!(policy.is_allowed("C:/proj/a.rs", None));
        }
    }

    #[test]
    fn bare_relative_paths_are_allowed() {
        let policy = policy("C:/proj/");
        assert!(policy.is_allowed("src/main.rs", None));
        assert!(policy.is_allowed("notes.txt", None));
    }

    #[test]
    fn active_sentinel_follows_the_active_document() {
        let policy = policy("C:/proj/");
        assert!(policy.is_allowed("active", None));
        assert!(policy.is_allowed("active", Some("C:/proj/a.cs")));
        assert!(!policy.is_allowed("active", Some("C:/other/a.cs")));
    }

    #[test]
    fn blank_root_disables_restriction() {
        let policy = AccessPolicy::new(Some("  "), None);
        assert_eq!(policy.root(), None);
        assert!(policy.is_allowed("/anywhere", None));
    }

    #[test]
    fn canonical_resolves_dot_segments() {
        assert_eq!(canonical("c:/a/./b/../c"), "c:/a/c");
        assert_eq!(canonical("/a/b/../../.."), "/");
        assert_eq!(canonical("c:/.."), "c:");
        assert_eq!(canonical("c:/proj/"), "c:/proj/");
    }
}
