use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::warn;

use crate::adapters::{DocumentHandle, DocumentStore};
use crate::error::AdapterError;

/// Highest numbered variant tried before giving up on a name.
const MAX_CONFLICT_SUFFIX: usize = 1000;

/// Stores documents under a local directory, one subdirectory per UTC day.
pub struct FilesystemStore {
    root: PathBuf,
}

impl FilesystemStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    async fn ensure_directory(&self, path: &Path) -> Result<(), AdapterError> {
        tokio::fs::create_dir_all(path)
            .await
            .map_err(|e| AdapterError::Io {
                path: path.to_path_buf(),
                source: e,
            })
    }

    /// Creates `filename` in `dir_path` exclusively, falling back to
    /// `name_2.ext`, `name_3.ext`, ... when it is taken.
    async fn write_exclusive(
        &self,
        dir_path: &Path,
        filename: &str,
        content: &[u8],
    ) -> Result<PathBuf, AdapterError> {
        let (base, ext) = match filename.rfind('.') {
            Some(dot_pos) if dot_pos > 0 => (&filename[..dot_pos], Some(&filename[dot_pos..])),
            _ => (filename, None),
        };

        for counter in 1..=MAX_CONFLICT_SUFFIX {
            let try_filename = if counter == 1 {
                filename.to_string()
            } else {
                match ext {
                    Some(ext) => format!("{}_{}{}", base, counter, ext),
                    None => format!("{}_{}", base, counter),
                }
            };
            let try_path = dir_path.join(&try_filename);

            match tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&try_path)
                .await
            {
                Ok(file) => {
                    write_or_discard(file, &try_path, content).await?;
                    return Ok(try_path);
                }
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
                Err(e) => {
                    return Err(AdapterError::Io {
                        path: try_path,
                        source: e,
                    });
                }
            }
        }

        Err(AdapterError::Io {
            path: dir_path.join(filename),
            source: std::io::Error::new(
                std::io::ErrorKind::AlreadyExists,
                "no free file name left",
            ),
        })
    }
}

/// Writes `content` to a freshly created file. On failure the partial file at
/// `path` is removed.
async fn write_or_discard<W>(mut file: W, path: &Path, content: &[u8]) -> Result<(), AdapterError>
where
    W: AsyncWrite + Unpin,
{
    let written = async {
        file.write_all(content).await?;
        file.flush().await
    }
    .await;

    if let Err(source) = written {
        drop(file);
        if let Err(e) = tokio::fs::remove_file(path).await {
            warn!(path = %path.display(), error = %e, "Failed to remove partial file");
        }
        return Err(AdapterError::Io {
            path: path.to_path_buf(),
            source,
        });
    }

    Ok(())
}

#[async_trait]
impl DocumentStore for FilesystemStore {
    async fn store(&self, bytes: &[u8], name: &str) -> Result<DocumentHandle, AdapterError> {
        let dir_path = self.root.join(Utc::now().format("%Y%m%d").to_string());
        self.ensure_directory(&dir_path).await?;

        let path = self.write_exclusive(&dir_path, name, bytes).await?;
        let path = std::path::absolute(&path).unwrap_or(path);

        Ok(DocumentHandle::new(format!("file://{}", path.display())))
    }
}
