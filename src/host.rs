//! Services only the host application can provide

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use log::info;

use crate::loader::LoadedDocument;

/// Printing and saving are delegated to the host; the engine never touches
/// the file system on its own.
pub trait HostServices {
    /// Send the document to the printer. `Ok(false)` means the host declined.
    fn print(&mut self, document: &LoadedDocument) -> anyhow::Result<bool>;

    /// Persist the original document bytes under `filename`
    fn save(&mut self, filename: &str, bytes: &[u8]) -> anyhow::Result<()>;
}

/// Host with neither a printer nor a place to save to
#[derive(Clone, Copy, Debug, Default)]
pub struct NoHostServices;

impl HostServices for NoHostServices {
    fn print(&mut self, _document: &LoadedDocument) -> anyhow::Result<bool> {
        Ok(false)
    }

    fn save(&mut self, filename: &str, _bytes: &[u8]) -> anyhow::Result<()> {
        Err(anyhow!("no download location configured for {filename}"))
    }
}

/// Writes downloads into a fixed directory. Printing is not available.
#[derive(Clone, Debug)]
pub struct FileHostServices {
    download_dir: PathBuf,
}

impl FileHostServices {
    pub fn new(download_dir: impl Into<PathBuf>) -> Self {
        Self {
            download_dir: download_dir.into(),
        }
    }

    pub fn download_dir(&self) -> &Path {
        &self.download_dir
    }

    /// Target path for `filename`, with any directory part stripped
    fn target(&self, filename: &str) -> anyhow::Result<PathBuf> {
        let name = Path::new(filename)
            .file_name()
            .ok_or_else(|| anyhow!("invalid download filename {filename:?}"))?;
        Ok(self.download_dir.join(name))
    }
}

impl HostServices for FileHostServices {
    fn print(&mut self, document: &LoadedDocument) -> anyhow::Result<bool> {
        info!("Print requested for {}; no printer attached", document.source);
        Ok(false)
    }

    fn save(&mut self, filename: &str, bytes: &[u8]) -> anyhow::Result<()> {
        let target = self.target(filename)?;
        fs::create_dir_all(&self.download_dir).with_context(|| {
            format!("Failed to create download dir {}", self.download_dir.display())
        })?;
        fs::write(&target, bytes)
            .with_context(|| format!("Failed to write {}", target.display()))?;
        info!("Saved {} bytes to {}", bytes.len(), target.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn saves_into_download_dir() {
        let dir = TempDir::new().unwrap();
        let mut host = FileHostServices::new(dir.path().join("downloads"));
        host.save("report.pdf", b"%PDF-1.7").unwrap();
        assert_eq!(
            fs::read(dir.path().join("downloads/report.pdf")).unwrap(),
            b"%PDF-1.7"
        );
    }

    #[test]
    fn directory_components_are_stripped() {
        let dir = TempDir::new().unwrap();
        let mut host = FileHostServices::new(dir.path());
        host.save("../../escape.pdf", b"x").unwrap();
        assert!(dir.path().join("escape.pdf").exists());
    }

    #[test]
    fn rejects_empty_name() {
        let dir = TempDir::new().unwrap();
        let mut host = FileHostServices::new(dir.path());
        assert!(host.save("..", b"x").is_err());
    }
}
