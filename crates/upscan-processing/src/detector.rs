//! Magic-byte file type detection
//!
//! The signature table is ordered and matched first-wins. Several container formats
//! share a prefix (WEBP, WAV and AVI all start with `RIFF`), so rules that need a
//! second pattern to disambiguate carry more than one `(offset, bytes)` pair.

/// Returned when no signature matches.
pub const UNKNOWN_TYPE: &str = "unknown";

/// Buffers shorter than this are never classified.
pub const MIN_DETECTION_LEN: usize = 12;

/// A known file format: its MIME type, the extensions allowed to carry it and the
/// byte patterns that identify it.
#[derive(Debug, Clone, Copy)]
pub struct SignatureRule {
    pub mime_type: &'static str,
    pub extensions: &'static [&'static str],
    pub magic: &'static [(usize, &'static [u8])],
}

impl SignatureRule {
    /// Whether every magic pattern is present at its offset.
    pub fn matches(&self, buffer: &[u8]) -> bool {
        self.magic.iter().all(|(offset, pattern)| {
            buffer
                .get(*offset..*offset + pattern.len())
                .is_some_and(|window| window == *pattern)
        })
    }

    /// Whether `extension` (lowercase, no dot) is accepted for this format.
    pub fn accepts_extension(&self, extension: &str) -> bool {
        self.extensions.contains(&extension)
    }
}

pub static SIGNATURE_RULES: &[SignatureRule] = &[
    SignatureRule {
        mime_type: "image/jpeg",
        extensions: &["jpg", "jpeg", "jpe", "jfif"],
        magic: &[(0, &[0xFF, 0xD8, 0xFF])],
    },
    SignatureRule {
        mime_type: "image/png",
        extensions: &["png"],
        magic: &[(0, &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A])],
    },
    SignatureRule {
        mime_type: "image/gif",
        extensions: &["gif"],
        magic: &[(0, b"GIF8")],
    },
    SignatureRule {
        mime_type: "application/pdf",
        extensions: &["pdf"],
        magic: &[(0, b"%PDF")],
    },
    // Office Open XML, OpenDocument, EPUB and Java/Android archives are all zip containers.
    SignatureRule {
        mime_type: "application/zip",
        extensions: &[
            "zip", "docx", "xlsx", "pptx", "odt", "ods", "odp", "epub", "jar", "apk",
        ],
        magic: &[(0, &[0x50, 0x4B, 0x03, 0x04])],
    },
    SignatureRule {
        mime_type: "audio/mpeg",
        extensions: &["mp3"],
        magic: &[(0, b"ID3")],
    },
    SignatureRule {
        mime_type: "image/webp",
        extensions: &["webp"],
        magic: &[(0, b"RIFF"), (8, b"WEBP")],
    },
    SignatureRule {
        mime_type: "audio/wav",
        extensions: &["wav"],
        magic: &[(0, b"RIFF"), (8, b"WAVE")],
    },
    SignatureRule {
        mime_type: "video/x-msvideo",
        extensions: &["avi"],
        magic: &[(0, b"RIFF"), (8, b"AVI ")],
    },
    SignatureRule {
        mime_type: "application/gzip",
        extensions: &["gz", "tgz"],
        magic: &[(0, &[0x1F, 0x8B, 0x08])],
    },
    SignatureRule {
        mime_type: "audio/ogg",
        extensions: &["ogg", "oga", "ogv", "opus"],
        magic: &[(0, b"OggS")],
    },
    SignatureRule {
        mime_type: "audio/flac",
        extensions: &["flac"],
        magic: &[(0, b"fLaC")],
    },
    SignatureRule {
        mime_type: "image/tiff",
        extensions: &["tif", "tiff"],
        magic: &[(0, &[0x49, 0x49, 0x2A, 0x00])],
    },
    SignatureRule {
        mime_type: "image/tiff",
        extensions: &["tif", "tiff"],
        magic: &[(0, &[0x4D, 0x4D, 0x00, 0x2A])],
    },
];

/// Detect the MIME type of `buffer` from its leading bytes.
///
/// Returns [`UNKNOWN_TYPE`] for buffers shorter than [`MIN_DETECTION_LEN`] or when no
/// rule matches.
pub fn detect_file_type(buffer: &[u8]) -> &'static str {
    detect_rule(buffer)
        .map(|rule| rule.mime_type)
        .unwrap_or(UNKNOWN_TYPE)
}

/// The first rule matching `buffer`, if any.
pub fn detect_rule(buffer: &[u8]) -> Option<&'static SignatureRule> {
    if buffer.len() < MIN_DETECTION_LEN {
        return None;
    }
    SIGNATURE_RULES.iter().find(|rule| rule.matches(buffer))
}

/// Look up the rule for a detected MIME type.
pub fn signature_rule_for(mime_type: &str) -> Option<&'static SignatureRule> {
    SIGNATURE_RULES.iter().find(|rule| rule.mime_type == mime_type)
}
