use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

/// Directories that are never read or edited, whatever the project config says.
const ALWAYS_IGNORED: &[&str] = &[".git"];

/// Path legality checks that keep every read and write inside the project root.
#[derive(Debug, Clone)]
pub struct ProjectGuard {
    /// Canonical path to the project root
    project_root: PathBuf,
    /// Compiled ignore globs (project-relative, `/`-separated)
    ignored: GlobSet,
}

#[derive(Error, Debug)]
pub enum SafetyError {
    #[error("path is outside the project: {path} (project root: {root})")]
    OutsideProject { path: PathBuf, root: PathBuf },

    #[error("path is ignored by the project configuration: {path}")]
    Ignored { path: PathBuf },

    #[error("path not found: {path}")]
    NotFound { path: PathBuf },

    #[error("invalid ignore pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    #[error("failed to resolve {path}: {source}")]
    Canonicalize {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ProjectGuard {
    /// Create a guard for `project_root` with the given ignore globs.
    ///
    /// The root is canonicalized so that symlinked paths compare correctly.
    pub fn new(project_root: impl AsRef<Path>, ignored_paths: &[String]) -> Result<Self, SafetyError> {
        let root = project_root.as_ref();
        let project_root = root.canonicalize().map_err(|source| SafetyError::Canonicalize {
            path: root.to_path_buf(),
            source,
        })?;

        let mut builder = GlobSetBuilder::new();
        for pattern in ALWAYS_IGNORED
            .iter()
            .map(|p| p.to_string())
            .chain(ignored_paths.iter().cloned())
        {
            let glob = Glob::new(&pattern).map_err(|source| SafetyError::Pattern {
                pattern: pattern.clone(),
                source,
            })?;
            builder.add(glob);
        }
        let ignored = builder.build().map_err(|source| SafetyError::Pattern {
            pattern: ignored_paths.join(", "),
            source,
        })?;

        Ok(Self {
            project_root,
            ignored,
        })
    }

    /// Join a project-relative path onto the root without touching the disk.
    pub fn resolve(&self, relative_path: impl AsRef<Path>) -> PathBuf {
        self.project_root.join(relative_path)
    }

    /// Validate an existing project-relative path and return its canonical form.
    ///
    /// Symlinks and `..` components are resolved before the containment check,
    /// so a link pointing out of the project is rejected.
    pub fn validate_path(
        &self,
        relative_path: impl AsRef<Path>,
        require_not_ignored: bool,
    ) -> Result<PathBuf, SafetyError> {
        let absolute = self.resolve(relative_path);

        if !absolute.exists() {
            return Err(SafetyError::NotFound { path: absolute });
        }

        let canonical = absolute
            .canonicalize()
            .map_err(|source| SafetyError::Canonicalize {
                path: absolute.clone(),
                source,
            })?;

        self.check_canonical(&canonical, require_not_ignored)?;

        Ok(canonical)
    }

    /// Validate a path that may not exist yet (file creation).
    ///
    /// The deepest existing ancestor is canonicalized and checked; the
    /// remaining components must not climb with `..`.
    pub fn validate_new_path(
        &self,
        relative_path: impl AsRef<Path>,
        require_not_ignored: bool,
    ) -> Result<PathBuf, SafetyError> {
        let absolute = self.resolve(relative_path);
        if absolute.exists() {
            return self.validate_path(&absolute, require_not_ignored);
        }

        let mut existing = absolute.as_path();
        let mut missing = Vec::new();
        while !existing.exists() {
            match (existing.parent(), existing.file_name()) {
                (Some(parent), Some(name)) => {
                    missing.push(name.to_os_string());
                    existing = parent;
                }
                _ => {
                    return Err(SafetyError::OutsideProject {
                        path: absolute.clone(),
                        root: self.project_root.clone(),
                    })
                }
            }
        }

        if absolute
            .strip_prefix(existing)
            .map(|rest| rest.components().any(|c| matches!(c, Component::ParentDir)))
            .unwrap_or(true)
        {
            return Err(SafetyError::OutsideProject {
                path: absolute,
                root: self.project_root.clone(),
            });
        }

        let mut canonical = existing
            .canonicalize()
            .map_err(|source| SafetyError::Canonicalize {
                path: existing.to_path_buf(),
                source,
            })?;
        for name in missing.into_iter().rev() {
            canonical.push(name);
        }

        self.check_canonical(&canonical, require_not_ignored)?;
        Ok(canonical)
    }

    /// Re-check a canonical path right before it is written.
    pub fn revalidate(&self, path: &Path, require_not_ignored: bool) -> Result<PathBuf, SafetyError> {
        let canonical = path.canonicalize().map_err(|source| SafetyError::Canonicalize {
            path: path.to_path_buf(),
            source,
        })?;
        self.check_canonical(&canonical, require_not_ignored)?;
        Ok(canonical)
    }

    fn check_canonical(&self, canonical: &Path, require_not_ignored: bool) -> Result<(), SafetyError> {
        if !canonical.starts_with(&self.project_root) {
            return Err(SafetyError::OutsideProject {
                path: canonical.to_path_buf(),
                root: self.project_root.clone(),
            });
        }

        if require_not_ignored && self.is_ignored(canonical) {
            return Err(SafetyError::Ignored {
                path: canonical.to_path_buf(),
            });
        }

        Ok(())
    }

    /// Whether `path` (absolute or project-relative) or any of its ancestor
    /// directories matches an ignore glob. Paths outside the root count as ignored.
    pub fn is_ignored(&self, path: impl AsRef<Path>) -> bool {
        let path = path.as_ref();
        let relative = if path.is_absolute() {
            match path.strip_prefix(&self.project_root) {
                Ok(rel) => rel,
                Err(_) => return true,
            }
        } else {
            path
        };

        let mut prefix = PathBuf::new();
        for component in relative.components() {
            match component {
                Component::Normal(part) => prefix.push(part),
                Component::CurDir => continue,
                _ => return true,
            }
            if self.ignored.is_match(to_slash(&prefix)) {
                return true;
            }
        }
        false
    }

    /// Express an absolute path inside the project as a `/`-separated relative path.
    pub fn relativize(&self, path: &Path) -> Option<String> {
        path.strip_prefix(&self.project_root).ok().map(to_slash)
    }

    /// Get the project root.
    pub fn project_root(&self) -> &Path {
        &self.project_root
    }
}

fn to_slash(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn patterns(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_validate_path_inside_project() {
        let temp_dir = tempfile::tempdir().unwrap();
        let root = temp_dir.path();
        let guard = ProjectGuard::new(root, &[]).unwrap();

        let file = root.join("src/main.rs");
        fs::create_dir_all(file.parent().unwrap()).unwrap();
        fs::write(&file, b"").unwrap();

        let result = guard.validate_path("src/main.rs", true);
        assert!(result.is_ok());
    }

    #[test]
    fn test_validate_path_outside_project() {
        let temp_dir = tempfile::tempdir().unwrap();
        let root = temp_dir.path().join("project");
        fs::create_dir_all(&root).unwrap();
        fs::write(temp_dir.path().join("outside.rs"), b"").unwrap();
        let guard = ProjectGuard::new(&root, &[]).unwrap();

        let result = guard.validate_path("../outside.rs", false);
        assert!(matches!(result, Err(SafetyError::OutsideProject { .. })));
    }

    #[test]
    fn test_validate_missing_path() {
        let temp_dir = tempfile::tempdir().unwrap();
        let guard = ProjectGuard::new(temp_dir.path(), &[]).unwrap();

        let result = guard.validate_path("nope.rs", false);
        assert!(matches!(result, Err(SafetyError::NotFound { .. })));
    }

    #[test]
    fn test_ignored_directory_covers_descendants() {
        let temp_dir = tempfile::tempdir().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("target/debug")).unwrap();
        fs::write(root.join("target/debug/out.rs"), b"").unwrap();
        let guard = ProjectGuard::new(root, &patterns(&["target"])).unwrap();

        let result = guard.validate_path("target/debug/out.rs", true);
        assert!(matches!(result, Err(SafetyError::Ignored { .. })));

        // The ignore check is opt-out.
        assert!(guard.validate_path("target/debug/out.rs", false).is_ok());
    }

    #[test]
    fn test_git_is_always_ignored() {
        let temp_dir = tempfile::tempdir().unwrap();
        let guard = ProjectGuard::new(temp_dir.path(), &[]).unwrap();
        assert!(guard.is_ignored(".git/config"));
        assert!(!guard.is_ignored("src/git.rs"));
    }

    #[test]
    fn test_glob_patterns() {
        let temp_dir = tempfile::tempdir().unwrap();
        let guard = ProjectGuard::new(temp_dir.path(), &patterns(&["**/*.min.js"])).unwrap();
        assert!(guard.is_ignored("web/app.min.js"));
        assert!(!guard.is_ignored("web/app.js"));
    }

    #[test]
    fn test_validate_new_path() {
        let temp_dir = tempfile::tempdir().unwrap();
        let guard = ProjectGuard::new(temp_dir.path(), &[]).unwrap();

        let created = guard.validate_new_path("a/b/new.rs", true).unwrap();
        assert!(created.ends_with("a/b/new.rs"));

        let escaped = guard.validate_new_path("a/../../evil.rs", true);
        assert!(matches!(escaped, Err(SafetyError::OutsideProject { .. })));
    }

    #[test]
    #[cfg(unix)]
    fn test_validate_symlink_escape() {
        use std::os::unix::fs::symlink;

        let temp_dir = tempfile::tempdir().unwrap();
        let root = temp_dir.path().join("project");
        fs::create_dir_all(&root).unwrap();

        let outside = temp_dir.path().join("outside.rs");
        fs::write(&outside, b"").unwrap();
        symlink(&outside, root.join("escape.rs")).unwrap();

        let guard = ProjectGuard::new(&root, &[]).unwrap();
        let result = guard.validate_path("escape.rs", false);

        assert!(matches!(result, Err(SafetyError::OutsideProject { .. })));
    }
}
