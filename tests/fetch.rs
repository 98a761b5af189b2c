mod common;

use common::{runtime, MockServer, Reply};
use shub_conveyor::{
    registry::IMAGE_FILE_PREFIX, Manifest, RegistryClient, SourceError, TempWorkspaces,
    WorkspaceProvider,
};
use std::{fs, time::Duration};

fn manifest(server: &MockServer, path: &str) -> Manifest {
    Manifest {
        image: server.url(path),
        name: "vsoch/hello-world".to_owned(),
        tag: "latest".to_owned(),
        version: "1".to_owned(),
    }
}

#[test]
fn download_matches_declared_length() {
    let image: Vec<u8> = (0..100u8).collect();
    let server = MockServer::start(vec![("/images/hello.sif", Reply::ok(&image))]);
    let client = server.client();
    let root = tempfile::tempdir().unwrap();
    let workspace = TempWorkspaces::new(root.path().to_path_buf())
        .new_workspace("sbuild-shub")
        .unwrap();

    let path = runtime()
        .block_on(client.fetch_image(&manifest(&server, "/images/hello.sif"), &workspace))
        .unwrap();

    assert!(path.is_absolute());
    assert_eq!(path.parent(), Some(workspace.path()));
    assert!(path
        .file_name()
        .unwrap()
        .to_string_lossy()
        .starts_with(IMAGE_FILE_PREFIX));
    assert_eq!(fs::metadata(&path).unwrap().len(), 100);
    assert_eq!(fs::read(&path).unwrap(), image);
}

#[test]
fn short_body_is_an_integrity_error() {
    let server = MockServer::start(vec![(
        "/images/short.sif",
        Reply::ok(&[7u8; 80]).declared_length(Some(100)),
    )]);
    let client = server.client();
    let root = tempfile::tempdir().unwrap();
    let workspace = TempWorkspaces::new(root.path().to_path_buf())
        .new_workspace("sbuild-shub")
        .unwrap();

    match runtime().block_on(client.fetch_image(&manifest(&server, "/images/short.sif"), &workspace)) {
        Err(SourceError::Integrity { expected, actual }) => {
            assert_eq!(expected, 100);
            assert_eq!(actual, 80);
        }
        other => panic!("unexpected result {:?}", other),
    }

    // the partial download stays behind for the caller to clean up
    let leftovers: Vec<_> = fs::read_dir(workspace.path()).unwrap().collect();
    assert_eq!(leftovers.len(), 1);
}

#[test]
fn undeclared_length_is_accepted() {
    let server = MockServer::start(vec![(
        "/images/stream.sif",
        Reply::ok(&[1u8; 4096]).declared_length(None),
    )]);
    let client = server.client();
    let root = tempfile::tempdir().unwrap();
    let workspace = TempWorkspaces::new(root.path().to_path_buf())
        .new_workspace("sbuild-shub")
        .unwrap();

    let path = runtime()
        .block_on(client.fetch_image(&manifest(&server, "/images/stream.sif"), &workspace))
        .unwrap();
    assert_eq!(fs::metadata(&path).unwrap().len(), 4096);
}

#[test]
fn download_timeout() {
    let server = MockServer::start(vec![(
        "/images/slow.sif",
        Reply::ok(&[5u8; 100]).delay(Duration::from_secs(3)),
    )]);
    let client = RegistryClient::builder()
        .registry(&server.registry())
        .download_timeout(Duration::from_millis(200))
        .build()
        .unwrap();
    let root = tempfile::tempdir().unwrap();
    let workspace = TempWorkspaces::new(root.path().to_path_buf())
        .new_workspace("sbuild-shub")
        .unwrap();

    match runtime().block_on(client.fetch_image(&manifest(&server, "/images/slow.sif"), &workspace)) {
        Err(SourceError::Timeout) => (),
        other => panic!("unexpected result {:?}", other),
    }
}

#[test]
fn slow_download_without_deadline() {
    let server = MockServer::start(vec![(
        "/images/slow.sif",
        Reply::ok(&[5u8; 100]).delay(Duration::from_millis(500)),
    )]);
    // the manifest timeout doesn't apply to image downloads
    let client = RegistryClient::builder()
        .registry(&server.registry())
        .manifest_timeout(Duration::from_millis(100))
        .build()
        .unwrap();
    let root = tempfile::tempdir().unwrap();
    let workspace = TempWorkspaces::new(root.path().to_path_buf())
        .new_workspace("sbuild-shub")
        .unwrap();

    let path = runtime()
        .block_on(client.fetch_image(&manifest(&server, "/images/slow.sif"), &workspace))
        .unwrap();
    assert_eq!(fs::read(&path).unwrap(), vec![5u8; 100]);
}

#[test]
fn download_not_found() {
    let server = MockServer::start(vec![]);
    let client = server.client();
    let root = tempfile::tempdir().unwrap();
    let workspace = TempWorkspaces::new(root.path().to_path_buf())
        .new_workspace("sbuild-shub")
        .unwrap();

    match runtime().block_on(client.fetch_image(&manifest(&server, "/images/gone.sif"), &workspace)) {
        Err(SourceError::RegistryStatus(status)) => assert!(status.contains("404")),
        other => panic!("unexpected result {:?}", other),
    }
}

#[test]
fn concurrent_downloads_use_distinct_files() {
    let image = vec![3u8; 1000];
    let server = MockServer::start(vec![("/images/a.sif", Reply::ok(&image))]);
    let client = server.client();
    let root = tempfile::tempdir().unwrap();
    let workspace = TempWorkspaces::new(root.path().to_path_buf())
        .new_workspace("sbuild-shub")
        .unwrap();
    let m = manifest(&server, "/images/a.sif");

    let (a, b) = runtime().block_on(async {
        tokio::join!(
            client.fetch_image(&m, &workspace),
            client.fetch_image(&m, &workspace)
        )
    });
    let (a, b) = (a.unwrap(), b.unwrap());
    assert_ne!(a, b);
    assert_eq!(fs::read(&a).unwrap(), image);
    assert_eq!(fs::read(&b).unwrap(), image);
}

#[test]
fn missing_workspace_is_a_filesystem_error() {
    let server = MockServer::start(vec![("/images/a.sif", Reply::ok(b"abc"))]);
    let client = server.client();
    let root = tempfile::tempdir().unwrap();
    let workspace = TempWorkspaces::new(root.path().to_path_buf())
        .new_workspace("sbuild-shub")
        .unwrap();
    workspace.remove().unwrap();

    match runtime().block_on(client.fetch_image(&manifest(&server, "/images/a.sif"), &workspace)) {
        Err(SourceError::Filesystem(_)) => (),
        other => panic!("unexpected result {:?}", other),
    }
    assert!(server.seen().is_empty());
}
