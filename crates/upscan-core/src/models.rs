//! Upload descriptor handed to the scanner by the upload-receiving layer.

use bytes::Bytes;
use std::path::Path;

/// A file received from a client, as produced by the multipart layer.
///
/// The scanner only ever reads a descriptor. `content` is a [`Bytes`] so stages
/// that move work to a blocking thread can clone it without copying the buffer.
#[derive(Debug, Clone)]
pub struct FileDescriptor {
    /// Filename as supplied by the client. May be empty.
    pub original_name: String,
    /// Content-Type as supplied by the client.
    pub declared_mime_type: String,
    /// Size reported by the upload layer.
    pub size_bytes: u64,
    pub content: Bytes,
}

impl FileDescriptor {
    pub fn new(
        original_name: impl Into<String>,
        declared_mime_type: impl Into<String>,
        content: impl Into<Bytes>,
    ) -> Self {
        let content = content.into();
        Self {
            original_name: original_name.into(),
            declared_mime_type: declared_mime_type.into(),
            size_bytes: content.len() as u64,
            content,
        }
    }

    /// Override the reported size (the upload layer may know it before buffering).
    pub fn with_size(mut self, size_bytes: u64) -> Self {
        self.size_bytes = size_bytes;
        self
    }

    /// Lowercase extension of `original_name`, without the dot.
    ///
    /// The name is read the way it will be stored: only the last path component counts,
    /// and control characters plus trailing dots and whitespace are ignored, so
    /// `"shell.php "` and `"shell.php."` both give `php`. Returns `None` for names
    /// without an extension and for dotfiles such as `.htaccess`.
    pub fn extension(&self) -> Option<String> {
        let last_component = self
            .original_name
            .rsplit(|c: char| c == '/' || c == '\\')
            .next()
            .unwrap_or(&self.original_name);
        let name: String = last_component
            .chars()
            .filter(|c| !c.is_ascii_control())
            .collect();
        let name = name.trim_end_matches(|c: char| c == '.' || c.is_whitespace());

        Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .filter(|e| !e.is_empty())
    }
}
