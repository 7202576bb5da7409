use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Utc;
use tokio::fs::{self, File};
use tracing::{debug, warn};

use crate::error::DownloadError;
use crate::models::{ExportFormat, ReportKind};

/// How long a generated document stays on disk. Deletion is scheduled at
/// creation, so the guarantee holds whether or not a download happens.
pub const RETENTION: Duration = Duration::from_secs(60);

/// Scoped storage for generated report documents. Filenames embed the
/// creation timestamp, so concurrent generations never collide and no
/// database is involved.
pub struct ArtifactStore {
    dir: PathBuf,
    retention: Duration,
}

/// An artifact opened for download. The handle stays readable even if the
/// retention sweep deletes the file mid-stream.
pub struct ServedArtifact {
    pub file: File,
    pub filename: String,
    pub content_type: &'static str,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self::with_retention(dir, RETENTION)
    }

    pub fn with_retention(dir: impl Into<PathBuf>, retention: Duration) -> Self {
        Self {
            dir: dir.into(),
            retention,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Writes a rendered document and schedules its deletion. Returns the
    /// generated filename.
    pub async fn persist(
        &self,
        bytes: &[u8],
        kind: ReportKind,
        format: ExportFormat,
    ) -> std::io::Result<String> {
        fs::create_dir_all(&self.dir).await?;

        let filename = format!(
            "{kind}-report-{}.{}",
            Utc::now().timestamp_millis(),
            format.extension()
        );
        let path = self.dir.join(&filename);
        fs::write(&path, bytes).await?;
        debug!(%filename, size = bytes.len(), "persisted report artifact");

        self.schedule_deletion(path, filename.clone());
        Ok(filename)
    }

    /// Opens an artifact for download. The filename is validated before any
    /// filesystem access; a traversal attempt never reaches the disk.
    pub async fn serve(&self, filename: &str) -> Result<ServedArtifact, DownloadError> {
        validate_filename(filename)?;

        let path = self.dir.join(filename);
        let file = File::open(&path).await.map_err(|err| {
            if err.kind() == ErrorKind::NotFound {
                DownloadError::NotFound
            } else {
                DownloadError::Io(err)
            }
        })?;

        Ok(ServedArtifact {
            file,
            filename: filename.to_string(),
            content_type: content_type_for(filename),
        })
    }

    fn schedule_deletion(&self, path: PathBuf, filename: String) {
        let retention = self.retention;
        tokio::spawn(async move {
            tokio::time::sleep(retention).await;
            match fs::remove_file(&path).await {
                Ok(()) => debug!(%filename, "deleted expired report artifact"),
                Err(err) if err.kind() == ErrorKind::NotFound => {}
                Err(err) => {
                    warn!(%filename, error = %err, "failed to delete expired report artifact")
                }
            }
        });
    }
}

/// Rejects anything that could escape the artifact directory: traversal
/// sequences, path separators, and empty names.
pub fn validate_filename(filename: &str) -> Result<(), DownloadError> {
    if filename.is_empty()
        || filename.contains("..")
        || filename.contains('/')
        || filename.contains('\\')
    {
        return Err(DownloadError::InvalidFilename);
    }
    Ok(())
}

fn content_type_for(filename: &str) -> &'static str {
    filename
        .rsplit('.')
        .next()
        .and_then(ExportFormat::from_extension)
        .map(|format| format.content_type())
        .unwrap_or("application/octet-stream")
}
