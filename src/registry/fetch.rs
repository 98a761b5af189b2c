use crate::{errors::SourceError, manifest::Manifest, registry::RegistryClient, workspace::Workspace};
use std::{
    io,
    path::{Path, PathBuf},
};
use tokio::{
    fs::{File, OpenOptions},
    io::AsyncWriteExt,
};

/// Name prefix for downloaded image files
pub const IMAGE_FILE_PREFIX: &str = "shub-container";

const CREATE_ATTEMPTS: usize = 16;

/// Create a new, uniquely named file in `dir`
async fn create_image_file(dir: &Path) -> Result<(File, PathBuf), SourceError> {
    let mut attempts = 0;
    loop {
        let path = dir.join(format!("{}{:016x}", IMAGE_FILE_PREFIX, rand::random::<u64>()));
        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(file) => return Ok((file, path)),
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists && attempts < CREATE_ATTEMPTS => {
                attempts += 1;
            }
            Err(err) => return Err(err.into()),
        }
    }
}

impl RegistryClient {
    /// Download the image a manifest points to into the workspace
    ///
    /// The response body is written to disk as it arrives. Once the body ends,
    /// the number of bytes written is compared against the `Content-Length`
    /// the server declared, and a mismatch is reported as
    /// [SourceError::Integrity]. A file that fails this check is left in the
    /// workspace.
    ///
    /// The download is bounded only by the client's download timeout, if one
    /// was configured. Returns the absolute path of the downloaded file.
    pub async fn fetch_image(
        &self,
        manifest: &Manifest,
        workspace: &Workspace,
    ) -> Result<PathBuf, SourceError> {
        let (mut file, path) = create_image_file(workspace.path()).await?;
        log::debug!("creating temporary image file {:?}", path);

        let mut request = self.req.get(&manifest.image);
        if let Some(timeout) = self.download_timeout {
            request = request.timeout(timeout);
        }
        let mut response = request.send().await.map_err(SourceError::from_request)?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::RegistryStatus(status.to_string()));
        }

        let expected = response.content_length();
        log::info!(
            "{} <{}> downloading {} bytes ...",
            manifest.name,
            manifest.image,
            expected.map_or_else(|| "unknown".to_owned(), |n| n.to_string())
        );

        let mut written: u64 = 0;
        let result: Result<(), SourceError> = loop {
            match response.chunk().await {
                Err(err) => break Err(SourceError::from_request(err)),
                Ok(None) => break Ok(()),
                Ok(Some(chunk)) => match file.write_all(&chunk).await {
                    Err(err) => break Err(err.into()),
                    Ok(()) => written += chunk.len() as u64,
                },
            }
        };
        file.flush().await?;
        drop(file);

        match (result, expected) {
            // the connection closed before the declared length arrived
            (Err(SourceError::Network(err)), Some(expected)) if written < expected => {
                log::debug!("download ended early, {}", err);
                Err(SourceError::Integrity {
                    expected,
                    actual: written,
                })
            }
            (Err(err), _) => Err(err),
            (Ok(()), Some(expected)) if written != expected => Err(SourceError::Integrity {
                expected,
                actual: written,
            }),
            (Ok(()), _) => {
                log::debug!("downloaded {} bytes into {:?}", written, path);
                Ok(path)
            }
        }
    }
}
