//! File categories and MIME type guessing.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Coarse file category shown next to file names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileCategory {
    /// Raster or vector images.
    Image,
    /// Text, office, and PDF documents.
    Document,
    /// Video.
    Video,
    /// Audio.
    Audio,
    /// Compressed archives.
    Archive,
    /// Source code.
    Code,
    /// Anything else.
    Other,
}

impl FileCategory {
    /// All categories, in display order.
    pub const ALL: [FileCategory; 7] = [
        Self::Image,
        Self::Document,
        Self::Video,
        Self::Audio,
        Self::Archive,
        Self::Code,
        Self::Other,
    ];

    /// Categorize from a MIME type, falling back to the name's extension.
    pub fn detect(mime_type: &str, name: &str) -> Self {
        let mime = mime_type.to_ascii_lowercase();
        if let Some(category) = Self::from_mime(&mime) {
            return category;
        }
        let ext = name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();
        Self::from_extension(&ext)
    }

    fn from_mime(mime: &str) -> Option<Self> {
        let category = match mime {
            m if m.starts_with("image/") => Self::Image,
            m if m.starts_with("video/") => Self::Video,
            m if m.starts_with("audio/") => Self::Audio,
            "application/zip" | "application/gzip" | "application/x-tar"
            | "application/x-7z-compressed" | "application/x-rar-compressed" => Self::Archive,
            "application/javascript" | "application/json" | "application/xml"
            | "text/css" | "text/html" => Self::Code,
            m if m.starts_with("text/") => Self::Document,
            "application/pdf" | "application/msword" | "application/vnd.ms-excel"
            | "application/vnd.ms-powerpoint" => Self::Document,
            m if m.starts_with("application/vnd.openxmlformats-officedocument") => Self::Document,
            _ => return None,
        };
        Some(category)
    }

    fn from_extension(ext: &str) -> Self {
        match ext {
            "png" | "jpg" | "jpeg" | "gif" | "svg" | "webp" | "bmp" => Self::Image,
            "mp4" | "mov" | "mkv" | "webm" | "avi" => Self::Video,
            "mp3" | "wav" | "flac" | "ogg" | "m4a" => Self::Audio,
            "zip" | "gz" | "tgz" | "tar" | "7z" | "rar" => Self::Archive,
            "rs" | "ts" | "tsx" | "js" | "jsx" | "py" | "go" | "java" | "c" | "h" | "cpp"
            | "toml" | "json" | "yaml" | "yml" => Self::Code,
            "txt" | "md" | "pdf" | "doc" | "docx" | "xls" | "xlsx" | "ppt" | "pptx" | "csv" => {
                Self::Document
            }
            _ => Self::Other,
        }
    }
}

impl fmt::Display for FileCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Image => "image",
            Self::Document => "document",
            Self::Video => "video",
            Self::Audio => "audio",
            Self::Archive => "archive",
            Self::Code => "code",
            Self::Other => "other",
        };
        f.write_str(s)
    }
}

/// Guess a MIME type from a file name's extension.
pub fn guess_mime_type(name: &str) -> Option<String> {
    let (_, ext) = name.rsplit_once('.')?;
    let mime = match ext.to_lowercase().as_str() {
        "txt" => "text/plain",
        "md" => "text/markdown",
        "html" | "htm" => "text/html",
        "css" => "text/css",
        "js" => "application/javascript",
        "json" => "application/json",
        "xml" => "application/xml",
        "pdf" => "application/pdf",
        "zip" => "application/zip",
        "gz" | "gzip" => "application/gzip",
        "tar" => "application/x-tar",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "webp" => "image/webp",
        "mp4" => "video/mp4",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "csv" => "text/csv",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "xls" => "application/vnd.ms-excel",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "ppt" => "application/vnd.ms-powerpoint",
        "pptx" => "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        _ => return None,
    };
    Some(mime.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mime_takes_precedence() {
        assert_eq!(FileCategory::detect("image/png", "notes.txt"), FileCategory::Image);
        assert_eq!(FileCategory::detect("application/pdf", "x"), FileCategory::Document);
    }

    #[test]
    fn test_extension_fallback() {
        assert_eq!(
            FileCategory::detect("application/octet-stream", "App.tsx"),
            FileCategory::Code
        );
        assert_eq!(FileCategory::detect("", "backup.TAR"), FileCategory::Archive);
        assert_eq!(FileCategory::detect("", "noext"), FileCategory::Other);
    }

    #[test]
    fn test_guess_mime_type() {
        assert_eq!(guess_mime_type("file.pdf"), Some("application/pdf".into()));
        assert_eq!(guess_mime_type("img.PNG"), Some("image/png".into()));
        assert_eq!(guess_mime_type("noext"), None);
    }
}
