//! Host environment surface: document, notifications, downloads, device metrics
//!
//! The capture pipeline never touches a real browser. Everything it needs
//! from the page is expressed through the traits in this module so the
//! pipeline can be driven deterministically from tests and the CLI.

pub mod device;
pub mod document;
pub mod download;
pub mod notify;

pub use device::{DeviceMetrics, ViewportClass};
pub use document::{AttachedNode, Document, MemoryDocument, NodeId, NodeKind};
pub use download::{DirectoryDownload, DownloadLink, DownloadSink, MemoryDownload};
pub use notify::{LogNotifier, NoticeLevel, Notifier, RecordingNotifier};

/// Composite trait handing the pipeline its collaborators.
pub trait Host: Send + Sync {
    fn document(&self) -> &dyn Document;
    fn notifier(&self) -> &dyn Notifier;
    fn downloads(&self) -> &dyn DownloadSink;
    fn device_metrics(&self) -> DeviceMetrics;
}

/// In-memory host used by tests and as a safe default.
pub struct MemoryHost {
    pub document: MemoryDocument,
    pub notifier: RecordingNotifier,
    pub downloads: MemoryDownload,
    pub metrics: DeviceMetrics,
}

impl MemoryHost {
    pub fn new(metrics: DeviceMetrics) -> Self {
        MemoryHost {
            document: MemoryDocument::new(),
            notifier: RecordingNotifier::new(),
            downloads: MemoryDownload::new(),
            metrics,
        }
    }
}

impl Default for MemoryHost {
    fn default() -> Self {
        Self::new(DeviceMetrics::default())
    }
}

impl Host for MemoryHost {
    fn document(&self) -> &dyn Document {
        &self.document
    }

    fn notifier(&self) -> &dyn Notifier {
        &self.notifier
    }

    fn downloads(&self) -> &dyn DownloadSink {
        &self.downloads
    }

    fn device_metrics(&self) -> DeviceMetrics {
        self.metrics
    }
}

/// Host for the command line tool: logs notices, saves into a directory.
pub struct CliHost {
    document: MemoryDocument,
    notifier: LogNotifier,
    downloads: DirectoryDownload,
    metrics: DeviceMetrics,
}

impl CliHost {
    pub fn new(out_dir: impl Into<std::path::PathBuf>, metrics: DeviceMetrics) -> Self {
        CliHost {
            document: MemoryDocument::new(),
            notifier: LogNotifier,
            downloads: DirectoryDownload::new(out_dir),
            metrics,
        }
    }
}

impl Host for CliHost {
    fn document(&self) -> &dyn Document {
        &self.document
    }

    fn notifier(&self) -> &dyn Notifier {
        &self.notifier
    }

    fn downloads(&self) -> &dyn DownloadSink {
        &self.downloads
    }

    fn device_metrics(&self) -> DeviceMetrics {
        self.metrics
    }
}
