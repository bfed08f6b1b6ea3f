use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tokio::fs;

pub const SWEEP_MAX_AGE: Duration = Duration::from_secs(3600);

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum StorageMode {
    Disk,
    Buffer,
}

/// An uploaded image held for the duration of one request. The disk variant
/// owns a file under the scratch directory, the buffer variant never touches
/// disk and is meant for deployments without a writable filesystem.
pub enum StoredUpload {
    Disk { path: PathBuf, len: usize },
    Buffer { bytes: Vec<u8> },
}

impl StoredUpload {
    pub fn len(&self) -> usize {
        match self {
            Self::Disk { len, .. } => *len,
            Self::Buffer { bytes } => bytes.len(),
        }
    }

    /// Releases whatever the upload holds. Deleting an already missing file is
    /// fine, any other failure is logged and swallowed so it never replaces
    /// the outcome of the request itself.
    pub async fn cleanup(self) {
        if let Self::Disk { path, .. } = self {
            cleanup_file(&path).await;
        }
    }
}

pub async fn store_upload(
    mode: StorageMode,
    scratch_dir: &Path,
    filename: &str,
    bytes: Vec<u8>,
) -> io::Result<StoredUpload> {
    match mode {
        StorageMode::Buffer => Ok(StoredUpload::Buffer { bytes }),
        StorageMode::Disk => {
            let path = scratch_dir.join(unique_name(filename));
            fs::write(&path, &bytes).await?;
            log::debug!("stored upload at {}", path.display());
            Ok(StoredUpload::Disk { path, len: bytes.len() })
        }
    }
}

fn unique_name(filename: &str) -> String {
    let millis =
        SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis();
    let suffix = rand::random::<u32>();
    let extension = filename
        .rsplit_once('.')
        .map_or_else(|| "bin".into(), |(_, extension)| extension.to_ascii_lowercase());

    format!("upload-{millis}-{suffix:08x}.{extension}")
}

async fn cleanup_file(path: &Path) {
    match fs::remove_file(path).await {
        Ok(()) => log::debug!("cleaned up {}", path.display()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => (),
        Err(err) => log::error!("failed to clean up {}: {err}", path.display()),
    }
}

/// Deletes regular files older than `max_age`, reclaiming uploads orphaned by
/// crashed or aborted requests. Files within the threshold are left alone, so
/// running this next to active writes is safe.
pub async fn sweep_old_files(dir: &Path, max_age: Duration) -> io::Result<usize> {
    let now = SystemTime::now();
    let mut removed = 0;

    let mut entries = fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let Ok(metadata) = entry.metadata().await else {
            continue;
        };
        if !metadata.is_file() {
            continue;
        }
        let Ok(modified) = metadata.modified() else {
            continue;
        };
        if now.duration_since(modified).is_ok_and(|age| age > max_age) {
            cleanup_file(&entry.path()).await;
            removed += 1;
        }
    }

    Ok(removed)
}

#[cfg(test)]
mod test {
    use super::*;

    #[tokio::test]
    async fn test_disk_store_and_cleanup() {
        let scratch = tempfile::tempdir().unwrap();

        let stored = store_upload(StorageMode::Disk, scratch.path(), "cat.PNG", b"pixels".to_vec())
            .await
            .unwrap();
        assert_eq!(stored.len(), 6);

        let StoredUpload::Disk { path, .. } = &stored else {
            panic!("expected a disk upload");
        };
        let path = path.clone();
        assert!(path.exists());
        assert_eq!(path.extension().unwrap(), "png");
        assert_eq!(std::fs::read(&path).unwrap(), b"pixels");

        stored.cleanup().await;
        assert!(!path.exists());

        // deleting again must not blow up
        cleanup_file(&path).await;
    }

    #[tokio::test]
    async fn test_buffer_store_touches_no_disk() {
        let scratch = tempfile::tempdir().unwrap();

        let stored =
            store_upload(StorageMode::Buffer, scratch.path(), "cat.png", b"pixels".to_vec())
                .await
                .unwrap();
        assert_eq!(stored.len(), 6);
        assert_eq!(std::fs::read_dir(scratch.path()).unwrap().count(), 0);

        stored.cleanup().await;
    }

    #[test]
    fn test_unique_names_do_not_collide() {
        let first = unique_name("cat.png");
        let second = unique_name("cat.png");
        assert_ne!(first, second);
        assert!(first.starts_with("upload-"));
        assert!(first.ends_with(".png"));
    }

    #[tokio::test]
    async fn test_sweep_removes_only_old_files() {
        let scratch = tempfile::tempdir().unwrap();
        std::fs::write(scratch.path().join("old-1.png"), b"a").unwrap();
        std::fs::write(scratch.path().join("old-2.jpg"), b"b").unwrap();

        tokio::time::sleep(Duration::from_millis(1200)).await;
        std::fs::write(scratch.path().join("fresh.png"), b"c").unwrap();

        let removed = sweep_old_files(scratch.path(), Duration::from_millis(500)).await.unwrap();
        assert_eq!(removed, 2);

        let remaining = std::fs::read_dir(scratch.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().into_string().unwrap())
            .collect::<Vec<_>>();
        assert_eq!(remaining, ["fresh.png"]);
    }

    #[tokio::test]
    async fn test_sweep_missing_directory_fails() {
        let scratch = tempfile::tempdir().unwrap();
        let missing = scratch.path().join("nope");
        assert!(sweep_old_files(&missing, SWEEP_MAX_AGE).await.is_err());
    }
}
