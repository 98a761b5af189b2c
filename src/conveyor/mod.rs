//! Source acquisition stages consumed by the build pipeline

mod shub;
mod sources;

pub use shub::{ShubConveyorPacker, WORKSPACE_LABEL};
pub use sources::Sources;

use crate::{errors::SourceError, workspace::Workspace};
use async_trait::async_trait;
use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

/// Header fields of a build recipe
///
/// Only the header matters to source acquisition: `bootstrap` names the
/// source backend and `from` is the backend-specific reference.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Definition {
    pub header: HashMap<String, String>,
}

impl Definition {
    /// Build a recipe header from a `scheme://reference` source URI
    ///
    /// ```
    /// # use shub_conveyor::Definition;
    /// let recipe = Definition::from_uri("shub://vsoch/hello-world").unwrap();
    /// assert_eq!(recipe.bootstrap(), Some("shub"));
    /// assert_eq!(recipe.from(), Some("vsoch/hello-world"));
    /// ```
    pub fn from_uri(uri: &str) -> Result<Self, SourceError> {
        match uri.split_once("://") {
            Some((scheme, reference)) if !scheme.is_empty() => {
                let mut header = HashMap::new();
                header.insert("bootstrap".to_owned(), scheme.to_owned());
                header.insert("from".to_owned(), reference.to_owned());
                Ok(Definition { header })
            }
            _ => Err(SourceError::InvalidReference(uri.to_owned())),
        }
    }

    pub fn bootstrap(&self) -> Option<&str> {
        self.header.get("bootstrap").map(String::as_str)
    }

    pub fn from(&self) -> Option<&str> {
        self.header.get("from").map(String::as_str)
    }
}

/// Turns a downloaded artifact into the final image layout
pub trait Packer: Send {
    /// Materialize the image, returning the path of the result
    fn pack(&mut self) -> Result<PathBuf, SourceError>;
}

/// Chooses a [Packer] for a downloaded artifact
///
/// Errors are passed back to the caller of [ConveyorPacker::get()] as they
/// are.
pub trait PackerSelector: Send + Sync {
    fn select(&self, image: &Path, workspace: &Workspace) -> Result<Box<dyn Packer>, SourceError>;
}

/// One source backend of the build pipeline
///
/// `get` acquires the source named by a recipe into a workspace owned by the
/// conveyor, `pack` hands it to the selected packer, and `clean_up` releases
/// the workspace.
#[async_trait]
pub trait ConveyorPacker: Send {
    async fn get(&mut self, recipe: &Definition) -> Result<(), SourceError>;

    fn pack(&mut self) -> Result<PathBuf, SourceError>;

    /// Remove everything this conveyor owns on the filesystem
    ///
    /// Never fails, and may be called any number of times.
    fn clean_up(&mut self);
}
