//! Path filtering shared by directory indexing and the watcher.

use std::path::{Path, PathBuf};

use ignore::gitignore::{Gitignore, GitignoreBuilder};

use crate::parser::Language;

/// Name of the project-specific ignore file, read alongside `.gitignore`.
pub const IGNORE_FILE: &str = ".codemapignore";

/// Gitignore-style matcher rooted at a project directory.
#[derive(Debug, Clone)]
pub struct PathFilter {
    root: PathBuf,
    matcher: Gitignore,
}

impl PathFilter {
    /// Build a filter from extra patterns and, if `use_ignore_files` is set,
    /// the root's `.gitignore` and `.codemapignore`.
    pub fn new(
        root: &Path,
        use_ignore_files: bool,
        patterns: &[String],
    ) -> Result<Self, ignore::Error> {
        let mut builder = GitignoreBuilder::new(root);

        if use_ignore_files {
            for name in [".gitignore", IGNORE_FILE] {
                let path = root.join(name);
                if path.exists() {
                    if let Some(err) = builder.add(&path) {
                        return Err(err);
                    }
                }
            }
        }

        for pattern in patterns {
            builder.add_line(None, pattern)?;
        }

        Ok(Self {
            root: root.to_path_buf(),
            matcher: builder.build()?,
        })
    }

    /// Whether `path` or one of its parents matches an ignore rule.
    ///
    /// Paths outside the root are never ignored.
    pub fn is_ignored(&self, path: &Path, is_dir: bool) -> bool {
        if !path.starts_with(&self.root) || path == self.root {
            return false;
        }
        self.matcher
            .matched_path_or_any_parents(path, is_dir)
            .is_ignore()
    }

    /// Whether `path` is a source file worth indexing.
    pub fn accepts(&self, path: &Path) -> bool {
        Language::from_path(path).is_known() && !self.is_ignored(path, false)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}
