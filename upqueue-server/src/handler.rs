use crate::Exception;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use upqueue::format_byte_size;

/// A file part spooled to disk
#[derive(Debug, Clone)]
pub struct ReceivedFile {
    pub field: String,
    pub file_name: String,
    pub content_type: Option<String>,
    pub path: PathBuf,
    pub size: u64,
}

/// What happens to a post once every part has been read.
///
/// Runs on the blocking pool. Files still at their spool path afterwards are
/// deleted.
pub trait UploadHandler: Send + Sync {
    fn handle(&self, fields: &HashMap<String, String>, files: &[ReceivedFile])
        -> Result<(), Exception>;
}

/// Moves every received file into a directory under its client-side name
#[derive(Debug, Clone)]
pub struct StoreHandler {
    dir: PathBuf,
}

impl StoreHandler {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn destination(&self, file_name: &str) -> PathBuf {
        // never trust a client path
        let name = Path::new(file_name)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| "upload".to_string());

        self.dir.join(name)
    }
}

impl UploadHandler for StoreHandler {
    fn handle(
        &self,
        _fields: &HashMap<String, String>,
        files: &[ReceivedFile],
    ) -> Result<(), Exception> {
        std::fs::create_dir_all(&self.dir)?;

        for file in files {
            let dest = self.destination(&file.file_name);

            if std::fs::rename(&file.path, &dest).is_err() {
                // spool and store may be on different file systems
                std::fs::copy(&file.path, &dest)?;
                std::fs::remove_file(&file.path)?;
            }

            log::info!(
                "Stored {} file: {} ({}, {}) -> {}",
                file.field,
                file.file_name,
                file.content_type.as_deref().unwrap_or("unknown type"),
                format_byte_size(file.size),
                dest.display()
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn moves_files_under_their_base_name() {
        let spool = tempfile::tempdir().unwrap();
        let store = tempfile::tempdir().unwrap();

        let path = spool.path().join("x.part");
        std::fs::write(&path, b"data").unwrap();

        let file = ReceivedFile {
            field: "file".into(),
            file_name: "../../etc/report.txt".into(),
            content_type: None,
            path: path.clone(),
            size: 4,
        };

        StoreHandler::new(store.path())
            .handle(&HashMap::new(), &[file])
            .unwrap();

        assert!(!path.exists());
        assert_eq!(
            std::fs::read(store.path().join("report.txt")).unwrap(),
            b"data"
        );
    }
}
