//! Sandboxed project workspace.
//!
//! The workspace is the only location the pipeline may read or write: a
//! directory subtree under a fixed project root. Every path handled here is
//! relative to that root, and any path that would resolve outside it is
//! rejected with [`WorkspaceError::SandboxViolation`] before any filesystem
//! operation happens. The workspace is a plain value with an injectable root,
//! so tests run against a temp directory.

use std::fs;
use std::path::{Component, Path, PathBuf};

use walkdir::WalkDir;

use crate::error::WorkspaceError;

/// Listing sentinel for an empty workspace, distinguishable from a failed
/// operation or an ambiguous empty string.
pub const NO_FILES_SENTINEL: &str = "No files found.";

/// A sandboxed directory tree the pipeline generates files into.
#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    /// Creates a workspace rooted at the given directory. The directory is
    /// not created until [`Workspace::init_root`] runs.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the project root path.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Ensures the project root directory exists. Idempotent.
    pub fn init_root(&self) -> Result<(), WorkspaceError> {
        fs::create_dir_all(&self.root)?;
        Ok(())
    }

    /// Returns all regular files under the root as relative, slash-separated
    /// paths in lexical order.
    pub fn list_files(&self) -> Result<Vec<String>, WorkspaceError> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(&self.root) {
            let entry = entry.map_err(|e| {
                WorkspaceError::Io(e.into_io_error().unwrap_or_else(|| {
                    std::io::Error::other("walkdir error without io cause")
                }))
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let rel = entry
                .path()
                .strip_prefix(&self.root)
                .expect("walkdir yields paths under the root");
            files.push(path_to_slash_string(rel));
        }

        files.sort();
        Ok(files)
    }

    /// Newline-joined relative paths, or [`NO_FILES_SENTINEL`] when the tree
    /// holds no regular files. This is the tool surface callers display.
    pub fn listing(&self) -> Result<String, WorkspaceError> {
        let files = self.list_files()?;
        if files.is_empty() {
            Ok(NO_FILES_SENTINEL.to_string())
        } else {
            Ok(files.join("\n"))
        }
    }

    /// Reads the full text content of a file under the root.
    pub fn read_file(&self, path: &str) -> Result<String, WorkspaceError> {
        let resolved = self.resolve(path)?;
        if !resolved.is_file() {
            return Err(WorkspaceError::NotFound(PathBuf::from(path)));
        }
        Ok(fs::read_to_string(resolved)?)
    }

    /// Writes content to a file under the root, creating parent directories
    /// as needed. Overwrites existing content: last writer wins.
    pub fn write_file(&self, path: &str, content: &str) -> Result<(), WorkspaceError> {
        let resolved = self.resolve(path)?;
        if let Some(parent) = resolved.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(resolved, content)?;
        Ok(())
    }

    /// Resolves a relative path against the root, rejecting anything that
    /// could land outside the sandbox. No filesystem access happens here;
    /// the check is purely structural so it also covers paths that do not
    /// exist yet.
    fn resolve(&self, path: &str) -> Result<PathBuf, WorkspaceError> {
        if path.trim().is_empty() {
            return Err(WorkspaceError::SandboxViolation(path.to_string()));
        }
        // Backslashes are path separators on Windows and suspicious
        // everywhere else; reject rather than guess.
        if path.contains('\\') {
            return Err(WorkspaceError::SandboxViolation(path.to_string()));
        }

        let candidate = Path::new(path);
        for component in candidate.components() {
            match component {
                Component::Normal(_) | Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                    return Err(WorkspaceError::SandboxViolation(path.to_string()));
                }
            }
        }

        Ok(self.root.join(candidate))
    }
}

fn path_to_slash_string(path: &Path) -> String {
    path.components()
        .filter_map(|c| c.as_os_str().to_str())
        .collect::<Vec<_>>()
        .join("/")
}
