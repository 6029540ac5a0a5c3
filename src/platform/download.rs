/// Download collaborator: receives the encoded image through a synthetic link

use std::path::PathBuf;
use std::sync::Mutex;

use base64::Engine as _;

use crate::{Error, Result};

/// A synthetic download link carrying the encoded image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadLink {
    pub download: String,
    pub bytes: Vec<u8>,
}

impl DownloadLink {
    pub fn new(download: impl Into<String>, bytes: Vec<u8>) -> Self {
        DownloadLink { download: download.into(), bytes }
    }

    /// `data:` URL suitable for an anchor `href`
    pub fn href(&self) -> String {
        png_data_url(&self.bytes)
    }
}

pub fn png_data_url(bytes: &[u8]) -> String {
    format!(
        "data:image/png;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(bytes)
    )
}

pub trait DownloadSink: Send + Sync {
    /// Activate the link, delivering its payload
    fn click(&self, link: &DownloadLink) -> Result<()>;
}

/// Saves downloads into a directory, like a browser's download folder
pub struct DirectoryDownload {
    dir: PathBuf,
}

impl DirectoryDownload {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        DirectoryDownload { dir: dir.into() }
    }

    pub fn path_for(&self, link: &DownloadLink) -> PathBuf {
        self.dir.join(&link.download)
    }
}

impl DownloadSink for DirectoryDownload {
    fn click(&self, link: &DownloadLink) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path_for(link);
        std::fs::write(&path, &link.bytes)
            .map_err(|e| Error::ExportError(format!("{}: {}", path.display(), e)))?;
        log::info!("saved {} ({} bytes)", path.display(), link.bytes.len());
        Ok(())
    }
}

/// Records clicked links in memory
pub struct MemoryDownload {
    links: Mutex<Vec<DownloadLink>>,
}

impl MemoryDownload {
    pub fn new() -> Self {
        MemoryDownload { links: Mutex::new(Vec::new()) }
    }

    pub fn links(&self) -> Vec<DownloadLink> {
        self.links.lock().unwrap().clone()
    }
}

impl Default for MemoryDownload {
    fn default() -> Self {
        Self::new()
    }
}

impl DownloadSink for MemoryDownload {
    fn click(&self, link: &DownloadLink) -> Result<()> {
        self.links.lock().unwrap().push(link.clone());
        Ok(())
    }
}
