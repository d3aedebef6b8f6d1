use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use anyhow::{anyhow, Context, Result};
use tracing::{debug, info, warn};

use crate::file::FileFormat;

pub const RESOURCES_SUBFOLDER: &str = "resources";

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Local disk store for uploaded and fetched resources.
///
/// Every public operation degrades instead of failing: errors are logged and
/// the caller gets `None`, `false` or `0`.
pub struct ResourceStore {
    base_path: PathBuf,
}

impl ResourceStore {
    pub fn new<P: AsRef<Path>>(base_path: P) -> Result<Self> {
        let base_path = base_path.as_ref().to_path_buf();
        fs::create_dir_all(&base_path)
            .with_context(|| format!("Failed to create upload folder {}", base_path.display()))?;
        Ok(Self { base_path })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    pub fn resources_dir(&self) -> PathBuf {
        self.base_path.join(RESOURCES_SUBFOLDER)
    }

    pub fn is_supported(file_name: &str) -> bool {
        FileFormat::from_path(file_name).is_some()
    }

    /// Writes `content` as `file_name` under `subfolder` and returns the path.
    pub fn save(&self, file_name: &str, content: &[u8], subfolder: &str) -> Option<PathBuf> {
        match self.try_save(file_name, content, subfolder) {
            Ok(path) => {
                info!(path = %path.display(), bytes = content.len(), "saved resource");
                Some(path)
            }
            Err(e) => {
                warn!(file_name, "Error saving file: {:#}", e);
                None
            }
        }
    }

    fn try_save(&self, file_name: &str, content: &[u8], subfolder: &str) -> Result<PathBuf> {
        let dir = if subfolder.is_empty() {
            self.base_path.clone()
        } else {
            self.base_path.join(subfolder)
        };
        fs::create_dir_all(&dir)?;

        // Only the last component is used; "../x" cannot escape the folder.
        let name = Path::new(file_name)
            .file_name()
            .ok_or_else(|| anyhow!("invalid file name {:?}", file_name))?;
        let file_path = dir.join(name);
        fs::write(&file_path, content)?;
        Ok(file_path)
    }

    pub fn size_mb<P: AsRef<Path>>(path: P) -> io::Result<f64> {
        let len = fs::metadata(path)?.len();
        Ok(len as f64 / BYTES_PER_MB)
    }

    pub fn try_delete<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        fs::remove_file(path)
    }

    pub fn delete<P: AsRef<Path>>(&self, path: P) -> bool {
        let path = path.as_ref();
        match self.try_delete(path) {
            Ok(()) => {
                debug!(path = %path.display(), "deleted resource file");
                true
            }
            Err(e) => {
                warn!(path = %path.display(), "Error deleting file: {}", e);
                false
            }
        }
    }

    /// Removes regular files in `folder` last modified more than `max_age_hours` ago.
    /// Does not descend into subdirectories. Returns how many files were removed.
    pub fn purge_older_than<P: AsRef<Path>>(folder: P, max_age_hours: u64) -> usize {
        let folder = folder.as_ref();
        // Saturates: an age past u64 seconds is never reached, so nothing is purged.
        let max_age = Duration::from_secs(max_age_hours.saturating_mul(3600));
        let entries = match fs::read_dir(folder) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(folder = %folder.display(), "Error reading folder for cleanup: {}", e);
                return 0;
            }
        };

        let now = SystemTime::now();
        let mut removed = 0;
        for entry in entries.flatten() {
            let path = entry.path();
            let Ok(metadata) = entry.metadata() else { continue };
            if !metadata.is_file() {
                continue;
            }
            let age = metadata
                .modified()
                .ok()
                .and_then(|modified| now.duration_since(modified).ok());
            if matches!(age, Some(age) if age > max_age) {
                match fs::remove_file(&path) {
                    Ok(()) => removed += 1,
                    Err(e) => warn!(path = %path.display(), "Error removing old file: {}", e),
                }
            }
        }

        if removed > 0 {
            info!(folder = %folder.display(), removed, "purged old files");
        }
        removed
    }
}
