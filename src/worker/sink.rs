//! Destinations for downloaded images: a folder on disk or an in-memory ZIP

use bytes::Bytes;
use std::fs;
use std::io::{Cursor, Write};
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};
use zip::{CompressionMethod, ZipWriter, write::FileOptions};

use super::naming::archive_name;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("'{0}' is not a plain folder name")]
    InvalidFolderName(String),
}

/// Where a job delivers its images
#[derive(Debug, Clone, Default)]
pub enum SinkTarget {
    /// ZIP archive kept in memory for download
    #[default]
    Archive,
    /// One subfolder per sanitized query under `base_dir`
    Folder { base_dir: PathBuf },
}

impl SinkTarget {
    pub fn open(&self, sanitized: &str) -> Result<Box<dyn SinkWriter>, SinkError> {
        match self {
            SinkTarget::Archive => Ok(Box::new(ArchiveWriter::new(sanitized))),
            SinkTarget::Folder { base_dir } => {
                Ok(Box::new(FolderWriter::create(base_dir, sanitized)?))
            }
        }
    }
}

/// Receives entries one at a time, then finalizes into a [`Sink`]
pub trait SinkWriter: Send {
    fn write_entry(&mut self, name: &str, data: &[u8]) -> Result<(), SinkError>;

    fn finish(self: Box<Self>) -> Result<Sink, SinkError>;
}

/// Finalized output of a completed job
#[derive(Debug, Clone)]
pub enum Sink {
    Archive {
        filename: String,
        bytes: Bytes,
        entries: Vec<String>,
    },
    Folder {
        path: PathBuf,
        entries: Vec<String>,
    },
}

impl Sink {
    pub fn entries(&self) -> &[String] {
        match self {
            Sink::Archive { entries, .. } | Sink::Folder { entries, .. } => entries,
        }
    }
}

pub struct ArchiveWriter {
    zip: ZipWriter<Cursor<Vec<u8>>>,
    filename: String,
    entries: Vec<String>,
}

impl ArchiveWriter {
    pub fn new(sanitized: &str) -> Self {
        Self {
            zip: ZipWriter::new(Cursor::new(Vec::new())),
            filename: archive_name(sanitized),
            entries: Vec::new(),
        }
    }
}

impl SinkWriter for ArchiveWriter {
    fn write_entry(&mut self, name: &str, data: &[u8]) -> Result<(), SinkError> {
        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
        self.zip.start_file(name, options)?;
        self.zip.write_all(data)?;
        self.entries.push(name.to_string());
        debug!(name, size = data.len(), "Added archive entry");
        Ok(())
    }

    fn finish(self: Box<Self>) -> Result<Sink, SinkError> {
        let mut this = *self;
        let bytes = this.zip.finish()?.into_inner();
        info!(filename = %this.filename, entries = this.entries.len(), size = bytes.len(), "Archive finalized");

        Ok(Sink::Archive {
            filename: this.filename,
            bytes: Bytes::from(bytes),
            entries: this.entries,
        })
    }
}

pub struct FolderWriter {
    dir: PathBuf,
    entries: Vec<String>,
}

impl FolderWriter {
    pub fn create(base_dir: &Path, sanitized: &str) -> Result<Self, SinkError> {
        // Exactly one normal component, so the folder stays directly under base_dir
        let mut components = Path::new(sanitized).components();
        if !matches!(
            (components.next(), components.next()),
            (Some(Component::Normal(_)), None)
        ) {
            return Err(SinkError::InvalidFolderName(sanitized.to_string()));
        }

        let dir = base_dir.join(sanitized);
        fs::create_dir_all(&dir)?;
        info!(dir = %dir.display(), "Created output folder");

        Ok(Self {
            dir,
            entries: Vec::new(),
        })
    }
}

impl SinkWriter for FolderWriter {
    fn write_entry(&mut self, name: &str, data: &[u8]) -> Result<(), SinkError> {
        let path = self.dir.join(name);
        fs::write(&path, data)?;
        self.entries.push(name.to_string());
        debug!(path = %path.display(), size = data.len(), "Wrote image file");
        Ok(())
    }

    fn finish(self: Box<Self>) -> Result<Sink, SinkError> {
        Ok(Sink::Folder {
            path: self.dir,
            entries: self.entries,
        })
    }
}
