//! Filesystem storage for uploaded images and generated documents.
//!
//! Everything a process owns lives under a directory named after its id.
//! Nothing is ever overwritten or deleted here.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// An uploaded file before it reaches disk.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: Option<String>,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn from_path(path: &Path) -> io::Result<Self> {
        Ok(Self {
            filename: path.file_name().map(|n| n.to_string_lossy().to_string()),
            bytes: fs::read(path)?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct Storage {
    root: PathBuf,
}

impl Storage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn images_dir(&self) -> PathBuf {
        self.root.join("images")
    }

    pub fn documents_dir(&self) -> PathBuf {
        self.root.join("documents")
    }

    pub fn init(&self) -> io::Result<()> {
        fs::create_dir_all(self.images_dir())?;
        fs::create_dir_all(self.documents_dir())?;
        Ok(())
    }

    /// Write an upload batch as `<n>_<basename>`, numbering after any earlier batches.
    pub fn save_uploads(&self, process_id: i64, files: &[UploadedFile]) -> io::Result<Vec<PathBuf>> {
        let proc_dir = self.images_dir().join(process_id.to_string());
        fs::create_dir_all(&proc_dir)?;
        let offset = fs::read_dir(&proc_dir)?.count();

        let mut saved = Vec::with_capacity(files.len());
        for (idx, file) in files.iter().enumerate() {
            let basename = file
                .filename
                .as_deref()
                .and_then(|n| Path::new(n).file_name())
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| "image.jpg".to_string());
            let dest = proc_dir.join(format!("{}_{}", offset + idx, basename));
            fs::write(&dest, &file.bytes)?;
            saved.push(dest);
        }
        Ok(saved)
    }

    /// A fresh path for a document of this process. Never returns an existing file.
    pub fn reserve_path(&self, process_id: i64, filename: &str) -> io::Result<PathBuf> {
        let proc_dir = self.documents_dir().join(process_id.to_string());
        fs::create_dir_all(&proc_dir)?;

        let candidate = proc_dir.join(filename);
        if !candidate.exists() {
            return Ok(candidate);
        }

        let path = Path::new(filename);
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| filename.to_string());
        let ext = path.extension().map(|e| e.to_string_lossy().to_string());

        let mut n = 2;
        loop {
            let name = match &ext {
                Some(ext) => format!("{}-{}.{}", stem, n, ext),
                None => format!("{}-{}", stem, n),
            };
            let candidate = proc_dir.join(name);
            if !candidate.exists() {
                return Ok(candidate);
            }
            n += 1;
        }
    }

    pub fn write(&self, path: &Path, content: &[u8]) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, content)
    }

    /// Read a stored document back as `(bytes, mime, filename)`.
    pub fn open_document(&self, path: &Path) -> io::Result<(Vec<u8>, &'static str, String)> {
        let bytes = fs::read(path)?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        Ok((bytes, guess_mime(path), filename))
    }
}

pub fn guess_mime(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("pdf") => "application/pdf",
        Some("txt") => "text/plain; charset=utf-8",
        Some("json") => "application/json",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}
