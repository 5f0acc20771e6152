//! Request path resolution
//!
//! Maps a URL path onto the root directory. Resolution is purely lexical:
//! nothing here touches the filesystem, and symlinks are never followed.

use super::FsError;
use crate::config::PathPolicy;
use percent_encoding::percent_decode_str;
use std::path::{Path, PathBuf};

/// Joins request paths onto a fixed root
#[derive(Debug, Clone)]
pub struct PathResolver {
    root: PathBuf,
    policy: PathPolicy,
}

impl PathResolver {
    /// `root` must already be absolute
    pub const fn new(root: PathBuf, policy: PathPolicy) -> Self {
        Self { root, policy }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a raw (still percent-encoded) request path
    ///
    /// Escapes that decode to invalid UTF-8 are rejected. Empty and `.` segments are dropped and `..` pops one component.
    /// Under [`PathPolicy::Confined`] popping past the root, or a segment
    /// carrying a NUL or backslash, is rejected. Under [`PathPolicy::Join`]
    /// the pop simply continues upward.
    pub fn resolve(&self, request_path: &str) -> Result<PathBuf, FsError> {
        let decoded = percent_decode_str(request_path)
            .decode_utf8()
            .map_err(|_| FsError::InvalidPath {
                request_path: request_path.to_string(),
            })?;
        let confined = self.policy == PathPolicy::Confined;
        let forbidden = || FsError::Forbidden {
            request_path: request_path.to_string(),
        };

        let mut resolved = self.root.clone();
        let mut depth = 0usize;

        for segment in decoded.split('/') {
            match segment {
                "" | "." => {}
                ".." => {
                    if depth == 0 && confined {
                        return Err(forbidden());
                    }
                    depth = depth.saturating_sub(1);
                    resolved.pop();
                }
                name => {
                    if confined && (name.contains('\0') || name.contains('\\')) {
                        return Err(forbidden());
                    }
                    depth += 1;
                    resolved.push(name);
                }
            }
        }

        Ok(resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver(policy: PathPolicy) -> PathResolver {
        PathResolver::new(PathBuf::from("/srv/files"), policy)
    }

    #[test]
    fn test_root_and_nested() {
        let r = resolver(PathPolicy::Confined);
        assert_eq!(r.resolve("/").unwrap(), PathBuf::from("/srv/files"));
        assert_eq!(r.resolve("").unwrap(), PathBuf::from("/srv/files"));
        assert_eq!(
            r.resolve("/docs/readme.md").unwrap(),
            PathBuf::from("/srv/files/docs/readme.md")
        );
        assert_eq!(
            r.resolve("//docs/./a/").unwrap(),
            PathBuf::from("/srv/files/docs/a")
        );
    }

    #[test]
    fn test_percent_decoding() {
        let r = resolver(PathPolicy::Confined);
        assert_eq!(
            r.resolve("/my%20file.txt").unwrap(),
            PathBuf::from("/srv/files/my file.txt")
        );
        assert_eq!(
            r.resolve("/%E6%96%87.txt").unwrap(),
            PathBuf::from("/srv/files/文.txt")
        );
    }

    #[test]
    fn test_invalid_utf8_is_rejected() {
        let r = resolver(PathPolicy::Confined);
        assert!(matches!(
            r.resolve("/bad%FF.txt"),
            Err(FsError::InvalidPath { .. })
        ));
        // two distinct byte strings must not collapse onto one replacement name
        assert!(r.resolve("/a%C3.txt").is_err());
        assert!(r.resolve("/a%EF%BF%BD.txt").is_ok());
    }

    #[test]
    fn test_dotdot_inside_root_is_allowed() {
        let r = resolver(PathPolicy::Confined);
        assert_eq!(
            r.resolve("/a/b/../c").unwrap(),
            PathBuf::from("/srv/files/a/c")
        );
    }

    #[test]
    fn test_confined_rejects_escape() {
        let r = resolver(PathPolicy::Confined);
        assert!(matches!(
            r.resolve("/../etc/passwd"),
            Err(FsError::Forbidden { .. })
        ));
        assert!(matches!(
            r.resolve("/a/../../etc"),
            Err(FsError::Forbidden { .. })
        ));
        assert!(matches!(
            r.resolve("/%2e%2e/etc"),
            Err(FsError::Forbidden { .. })
        ));
        assert!(matches!(
            r.resolve("/a%00b"),
            Err(FsError::Forbidden { .. })
        ));
    }

    #[test]
    fn test_join_allows_escape() {
        let r = resolver(PathPolicy::Join);
        assert_eq!(
            r.resolve("/../etc/passwd").unwrap(),
            PathBuf::from("/srv/etc/passwd")
        );
        assert_eq!(
            r.resolve("/../../../../etc").unwrap(),
            PathBuf::from("/etc")
        );
    }
}
