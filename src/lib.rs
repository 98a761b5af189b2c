//! Source acquisition for container builds
//!
//! Resolves compact `shub://owner/container:tag@digest` references, looks up
//! the image manifest on the registry, and downloads the image into a
//! scratch workspace where a packer can take over.
//!
//! ```no_run
//! # use shub_conveyor::*;
//! # use std::{path::{Path, PathBuf}, sync::Arc};
//! struct KeepFile(PathBuf);
//! impl Packer for KeepFile {
//!     fn pack(&mut self) -> Result<PathBuf, SourceError> {
//!         Ok(self.0.clone())
//!     }
//! }
//! struct AnyImage;
//! impl PackerSelector for AnyImage {
//!     fn select(&self, image: &Path, _: &Workspace) -> Result<Box<dyn Packer>, SourceError> {
//!         Ok(Box::new(KeepFile(image.to_path_buf())))
//!     }
//! }
//! # async fn example() -> Result<(), SourceError> {
//! let sources = Sources::with_defaults(
//!     RegistryClient::new()?,
//!     Arc::new(TempWorkspaces::default()),
//!     Arc::new(AnyImage),
//! );
//! let recipe = Definition::from_uri("shub://vsoch/hello-world")?;
//! let mut conveyor = sources.conveyor_for_recipe(&recipe)?;
//! let result = conveyor.get(&recipe).await.and_then(|()| conveyor.pack());
//! conveyor.clean_up();
//! println!("{:?}", result?);
//! # Ok(())
//! # }
//! ```

#[macro_use] extern crate lazy_static;

pub mod conveyor;
pub mod errors;
pub mod locator;
pub mod registry;
pub mod workspace;

mod manifest;

pub use crate::{
    conveyor::{ConveyorPacker, Definition, Packer, PackerSelector, ShubConveyorPacker, Sources},
    errors::SourceError,
    locator::Locator,
    manifest::Manifest,
    registry::{DefaultRegistry, RegistryClient, RegistryClientBuilder},
    workspace::{TempWorkspaces, Workspace, WorkspaceProvider},
};
