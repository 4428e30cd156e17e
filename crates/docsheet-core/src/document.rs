use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Format tag derived from a file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentFormat {
    Pdf,
    Image,
    PlainText,
    Word,
    Unsupported,
}

impl DocumentFormat {
    /// Every extension the pipeline can read. The upload layer validates
    /// against this same list.
    pub const SUPPORTED_EXTENSIONS: &'static [&'static str] =
        &["pdf", "png", "jpg", "jpeg", "tiff", "bmp", "txt", "docx"];

    pub fn from_extension(ext: &str) -> Self {
        match ext.trim_start_matches('.').to_lowercase().as_str() {
            "pdf" => Self::Pdf,
            "png" | "jpg" | "jpeg" | "tiff" | "bmp" => Self::Image,
            "txt" => Self::PlainText,
            "docx" => Self::Word,
            _ => Self::Unsupported,
        }
    }

    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|e| e.to_str())
            .map(Self::from_extension)
            .unwrap_or(Self::Unsupported)
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, Self::Unsupported)
    }

    /// Human-readable name used in messages.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Pdf => "PDF",
            Self::Image => "image",
            Self::PlainText => "text file",
            Self::Word => "Word document",
            Self::Unsupported => "unsupported document",
        }
    }

    /// Acquisition stage name used in logs and error tags.
    pub fn stage(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Image => "image",
            Self::PlainText => "text",
            Self::Word => "docx",
            Self::Unsupported => "dispatch",
        }
    }
}

/// A document handed to the pipeline: where it lives, what to call it, and
/// how to read it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRef {
    pub path: PathBuf,
    pub name: String,
    pub format: DocumentFormat,
}

impl DocumentRef {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let format = DocumentFormat::from_path(&path);
        Self { path, name, format }
    }

    /// Use a display name that differs from the on-disk file name, e.g. an
    /// upload stored under a generated prefix.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Lowercased extension without the dot, or an empty string.
    pub fn extension(&self) -> String {
        self.path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default()
    }

    /// File name without extension; used to derive default output names.
    pub fn stem(&self) -> String {
        Path::new(&self.name)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.name.clone())
    }
}
