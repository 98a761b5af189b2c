//! Scratch directories owned by a single acquisition

use crate::errors::SourceError;
use std::{
    env, fs, io,
    path::{Path, PathBuf},
    process,
};

/// A writable scratch directory
///
/// Holds the downloaded image file and whatever a packer produces from it.
/// The path is always absolute.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Workspace {
    path: PathBuf,
}

impl Workspace {
    /// Wrap an existing directory
    ///
    /// Relative paths are resolved against the current directory.
    pub fn new(path: &Path) -> Result<Self, SourceError> {
        let path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            env::current_dir()?.join(path)
        };
        Ok(Workspace { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Recursively remove the directory and everything in it
    ///
    /// A directory that is already gone is not an error.
    pub fn remove(&self) -> Result<(), SourceError> {
        match fs::remove_dir_all(&self.path) {
            Ok(()) => {
                log::debug!("removed workspace {:?}", self.path);
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Allocates a fresh workspace for each acquisition
pub trait WorkspaceProvider: Send + Sync {
    /// Create a new, empty, writable directory
    ///
    /// The label is a hint for naming; each call must return a distinct
    /// directory.
    fn new_workspace(&self, label: &str) -> Result<Workspace, SourceError>;
}

const CREATE_ATTEMPTS: usize = 16;

/// Workspaces as randomly named directories under a common root
#[derive(Clone, Debug)]
pub struct TempWorkspaces {
    root: PathBuf,
}

impl Default for TempWorkspaces {
    fn default() -> Self {
        TempWorkspaces::new(TempWorkspaces::default_root())
    }
}

impl TempWorkspaces {
    pub fn new(root: PathBuf) -> Self {
        TempWorkspaces { root }
    }

    /// Determine the directory new workspaces are created under
    ///
    /// This is `$SHUB_WORKSPACE_DIR` when set, and otherwise the system temp
    /// directory.
    pub fn default_root() -> PathBuf {
        match env::var("SHUB_WORKSPACE_DIR") {
            Ok(s) => Path::new(&s).to_path_buf(),
            Err(_) => env::temp_dir(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl WorkspaceProvider for TempWorkspaces {
    fn new_workspace(&self, label: &str) -> Result<Workspace, SourceError> {
        fs::create_dir_all(&self.root)?;
        let mut attempts = 0;
        loop {
            let path = self.root.join(format!(
                "{}-{}-{:08x}",
                label,
                process::id(),
                rand::random::<u32>()
            ));
            match fs::create_dir(&path) {
                Ok(()) => {
                    log::debug!("created workspace {:?}", path);
                    return Workspace::new(&path);
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists && attempts < CREATE_ATTEMPTS => {
                    attempts += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

/// Removes a workspace on drop unless it is kept
///
/// Covers every way out of an acquisition, including errors, panics, and a
/// cancelled future.
pub(crate) struct WorkspaceGuard {
    workspace: Option<Workspace>,
}

impl WorkspaceGuard {
    pub fn new(workspace: Workspace) -> Self {
        WorkspaceGuard {
            workspace: Some(workspace),
        }
    }

    pub fn workspace(&self) -> &Workspace {
        self.workspace
            .as_ref()
            .expect("workspace guard holds a workspace until kept")
    }

    /// Disarm the guard and take ownership of the workspace
    pub fn keep(mut self) -> Workspace {
        self.workspace
            .take()
            .expect("workspace guard holds a workspace until kept")
    }
}

impl Drop for WorkspaceGuard {
    fn drop(&mut self) {
        if let Some(workspace) = self.workspace.take() {
            log::debug!("releasing workspace {:?} after failed acquisition", workspace.path());
            if let Err(err) = workspace.remove() {
                log::warn!("error removing workspace {:?}, {}", workspace.path(), err);
            }
        }
    }
}
