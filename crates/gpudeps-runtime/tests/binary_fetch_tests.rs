//! Vendor tool fetching from zip archives.

mod common;

use std::sync::Arc;

use common::{TestServer, zip_bytes};
use gpudeps_core::{DepsError, Platform};
use gpudeps_runtime::{BinaryFetcher, BinaryRegistry, BinarySpec, CancellationToken};
use reqwest::Client;
use tempfile::tempdir;

fn fetcher(registry: BinaryRegistry, dir: &std::path::Path) -> BinaryFetcher {
    BinaryFetcher::new(Client::new(), Arc::new(registry), dir.join("binaries"))
}

#[tokio::test]
async fn test_archive_payload_is_renamed_and_executable() {
    let server = TestServer::start().await;
    server.serve(
        "nvidia/linux-amd64.zip",
        zip_bytes(&[("dist/", None), ("dist/smi-1.2.3-linux", Some(b"ELF tool"))]),
    );
    let registry = BinaryRegistry::default().with_entry(
        "nvidia",
        "linux",
        "x86_64",
        BinarySpec::new(server.url("nvidia/linux-amd64.zip"), "nvidia-smi"),
    );
    let dir = tempdir().unwrap();
    let fetcher = fetcher(registry, dir.path());

    let path = fetcher
        .ensure("NVIDIA", Some("linux"), Some("amd64"), &CancellationToken::new())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(path, dir.path().join("binaries").join("nvidia-smi"));
    assert_eq!(std::fs::read(&path).unwrap(), b"ELF tool");

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o755);
    }

    let leftovers: Vec<_> = std::fs::read_dir(dir.path().join("binaries"))
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .collect();
    assert_eq!(leftovers, vec![std::ffi::OsString::from("nvidia-smi")]);
}

#[tokio::test]
async fn test_present_binary_skips_network() {
    let server = TestServer::start().await;
    server.serve("tool.zip", zip_bytes(&[("tool", Some(b"v1"))]));
    let registry = BinaryRegistry::default().with_entry(
        "amd",
        "linux",
        "amd64",
        BinarySpec::new(server.url("tool.zip"), "rocm-smi"),
    );
    let dir = tempdir().unwrap();
    let fetcher = fetcher(registry, dir.path());
    let cancel = CancellationToken::new();

    let first = fetcher
        .ensure("amd", Some("linux"), Some("amd64"), &cancel)
        .await
        .unwrap();
    let second = fetcher
        .ensure("amd", Some("linux"), Some("amd64"), &cancel)
        .await
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(server.hits("tool.zip"), 1);
}

#[tokio::test]
async fn test_windows_target_gets_exe_suffix() {
    let server = TestServer::start().await;
    server.serve("win.zip", zip_bytes(&[("smi.exe", Some(b"MZ"))]));
    let registry = BinaryRegistry::default().with_entry(
        "nvidia",
        "windows",
        "amd64",
        BinarySpec::new(server.url("win.zip"), "nvidia-smi"),
    );
    let dir = tempdir().unwrap();

    let path = fetcher(registry, dir.path())
        .ensure("nvidia", Some("windows"), Some("x64"), &CancellationToken::new())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(path.file_name().unwrap(), "nvidia-smi.exe");
}

#[tokio::test]
async fn test_named_member_is_selected() {
    let server = TestServer::start().await;
    server.serve(
        "bundle.zip",
        zip_bytes(&[("LICENSE", Some(b"text")), ("bin/xpu-smi", Some(b"tool"))]),
    );
    let registry = BinaryRegistry::default().with_entry(
        "intel",
        "linux",
        "amd64",
        BinarySpec::new(server.url("bundle.zip"), "xpu-smi").with_member("bin/xpu-smi"),
    );
    let dir = tempdir().unwrap();

    let path = fetcher(registry, dir.path())
        .ensure("intel", Some("linux"), Some("amd64"), &CancellationToken::new())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(std::fs::read(path).unwrap(), b"tool");
}

#[tokio::test]
async fn test_unknown_or_unpublished_vendor_is_not_an_error() {
    let dir = tempdir().unwrap();
    let fetcher = fetcher(BinaryRegistry::builtin(), dir.path());
    let cancel = CancellationToken::new();

    assert!(
        fetcher
            .ensure("nvidia", Some("linux"), Some("amd64"), &cancel)
            .await
            .unwrap()
            .is_none()
    );
    assert!(
        fetcher
            .ensure("acme", Some("linux"), Some("amd64"), &cancel)
            .await
            .unwrap()
            .is_none()
    );
    assert!(!dir.path().join("binaries").exists());
}

#[tokio::test]
async fn test_download_failure_leaves_nothing_behind() {
    let server = TestServer::start().await;
    server.fail("missing.zip", 404);
    let registry = BinaryRegistry::default().with_entry(
        "nvidia",
        "linux",
        "arm64",
        BinarySpec::new(server.url("missing.zip"), "nvidia-smi"),
    );
    let dir = tempdir().unwrap();
    let fetcher = fetcher(registry, dir.path());

    let err = fetcher
        .ensure("nvidia", Some("linux"), Some("aarch64"), &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        DepsError::Network {
            status_code: Some(404),
            ..
        }
    ));
    let binaries = dir.path().join("binaries");
    assert_eq!(std::fs::read_dir(&binaries).unwrap().count(), 0);
}

#[tokio::test]
async fn test_corrupt_archive_removes_partial_binary() {
    let server = TestServer::start().await;
    server.serve("broken.zip", b"PK but not really".to_vec());
    let registry = BinaryRegistry::default().with_entry(
        "nvidia",
        "linux",
        "amd64",
        BinarySpec::new(server.url("broken.zip"), "nvidia-smi"),
    );
    let dir = tempdir().unwrap();
    let fetcher = fetcher(registry, dir.path());

    let err = fetcher
        .ensure("nvidia", Some("linux"), Some("amd64"), &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, DepsError::Extraction { .. }));
    let target = fetcher.target_path(
        fetcher
            .registry()
            .lookup("nvidia", &Platform::new("linux", "amd64"))
            .unwrap(),
        &Platform::new("linux", "amd64"),
    );
    assert!(!target.exists());
    assert_eq!(
        std::fs::read_dir(dir.path().join("binaries")).unwrap().count(),
        0,
        "no staging or archive files remain"
    );
}

#[tokio::test]
async fn test_failed_refresh_keeps_previous_binary_intact() {
    let server = TestServer::start().await;
    server.serve("good.zip", zip_bytes(&[("smi", Some(b"complete tool"))]));
    server.serve("broken.zip", b"not an archive".to_vec());
    let dir = tempdir().unwrap();
    let cancel = CancellationToken::new();

    let good = BinaryRegistry::default().with_entry(
        "nvidia",
        "linux",
        "amd64",
        BinarySpec::new(server.url("good.zip"), "nvidia-smi"),
    );
    let path = fetcher(good, dir.path())
        .ensure("nvidia", Some("linux"), Some("amd64"), &cancel)
        .await
        .unwrap()
        .unwrap();

    // A different tool name pointing at a broken archive must not disturb it.
    let broken = BinaryRegistry::default().with_entry(
        "amd",
        "linux",
        "amd64",
        BinarySpec::new(server.url("broken.zip"), "rocm-smi"),
    );
    assert!(
        fetcher(broken, dir.path())
            .ensure("amd", Some("linux"), Some("amd64"), &cancel)
            .await
            .is_err()
    );

    assert_eq!(std::fs::read(&path).unwrap(), b"complete tool");
    let names: Vec<_> = std::fs::read_dir(dir.path().join("binaries"))
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .collect();
    assert_eq!(names, vec![std::ffi::OsString::from("nvidia-smi")]);
}
