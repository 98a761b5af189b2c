use crate::{
    conveyor::{ConveyorPacker, Definition, Packer, PackerSelector},
    errors::SourceError,
    locator::Locator,
    registry::RegistryClient,
    workspace::{Workspace, WorkspaceGuard, WorkspaceProvider},
};
use async_trait::async_trait;
use std::{
    fmt,
    path::{Path, PathBuf},
    sync::Arc,
};

/// Label for workspaces allocated by [ShubConveyorPacker]
pub const WORKSPACE_LABEL: &str = "sbuild-shub";

/// Acquires images from the default registry
///
/// [ConveyorPacker::get()] parses the recipe's `from` reference, allocates a
/// workspace, looks up the manifest, downloads the image, and selects a
/// packer for it. If any of those steps fail, the workspace allocated for
/// this call is removed again before the error is returned. After a
/// successful `get`, the workspace belongs to this conveyor until
/// [ConveyorPacker::clean_up()].
pub struct ShubConveyorPacker {
    client: RegistryClient,
    workspaces: Arc<dyn WorkspaceProvider>,
    packers: Arc<dyn PackerSelector>,
    locator: Option<Locator>,
    workspace: Option<Workspace>,
    image: Option<PathBuf>,
    packer: Option<Box<dyn Packer>>,
}

impl ShubConveyorPacker {
    pub fn new(
        client: RegistryClient,
        workspaces: Arc<dyn WorkspaceProvider>,
        packers: Arc<dyn PackerSelector>,
    ) -> Self {
        ShubConveyorPacker {
            client,
            workspaces,
            packers,
            locator: None,
            workspace: None,
            image: None,
            packer: None,
        }
    }

    /// The reference acquired by the last successful `get`, until `clean_up`
    pub fn locator(&self) -> Option<&Locator> {
        self.locator.as_ref()
    }

    /// The workspace owned by this conveyor, if any
    pub fn workspace(&self) -> Option<&Workspace> {
        self.workspace.as_ref()
    }

    /// Path of the downloaded image file
    pub fn image_path(&self) -> Option<&Path> {
        self.image.as_deref()
    }
}

#[async_trait]
impl ConveyorPacker for ShubConveyorPacker {
    async fn get(&mut self, recipe: &Definition) -> Result<(), SourceError> {
        log::debug!("getting container from shub");

        let from = recipe.from().ok_or(SourceError::MissingFrom)?;
        let locator = self.client.parse(&format!("//{}", from))?;

        // a conveyor only ever owns one workspace
        self.clean_up();

        let guard = WorkspaceGuard::new(self.workspaces.new_workspace(WORKSPACE_LABEL)?);
        let manifest = self.client.fetch_manifest(&locator).await?;
        if let Some(digest) = locator.digest() {
            log::debug!("{:?} digest {} is not verified against the download", locator, digest);
        }
        let image = self.client.fetch_image(&manifest, guard.workspace()).await?;
        let packer = self.packers.select(&image, guard.workspace())?;

        self.workspace = Some(guard.keep());
        self.locator = Some(locator);
        self.image = Some(image);
        self.packer = Some(packer);
        Ok(())
    }

    fn pack(&mut self) -> Result<PathBuf, SourceError> {
        match self.packer.as_mut() {
            Some(packer) => packer.pack(),
            None => Err(SourceError::NotAcquired),
        }
    }

    fn clean_up(&mut self) {
        self.packer = None;
        self.image = None;
        self.locator = None;
        if let Some(workspace) = self.workspace.take() {
            if let Err(err) = workspace.remove() {
                log::warn!("error removing workspace {:?}, {}", workspace.path(), err);
            }
        }
    }
}

impl fmt::Debug for ShubConveyorPacker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShubConveyorPacker")
            .field("locator", &self.locator)
            .field("workspace", &self.workspace)
            .field("image", &self.image)
            .finish()
    }
}
