//! Storage-safe filenames.

/// Filesystem limit on a single path component, in bytes.
pub const MAX_FILENAME_BYTES: usize = 255;

/// Extensions longer than this are treated as part of the stem when truncating.
const MAX_PRESERVED_EXTENSION_BYTES: usize = 32;

const FALLBACK_FILENAME: &str = "unnamed";

/// Turn a client-supplied filename into one that is safe to use as a single path component.
///
/// - only the last component survives (`/` and `\` both count as separators) and `..`
///   sequences are collapsed,
/// - null bytes and ASCII control characters are dropped,
/// - leading and trailing dots and surrounding whitespace are trimmed,
/// - the result is cut to [`MAX_FILENAME_BYTES`], shortening the stem so the extension
///   is kept.
///
/// Never fails: a name with nothing left becomes `"unnamed"`. Applying it twice gives the
/// same result as applying it once.
pub fn sanitize_filename(name: &str) -> String {
    let last_component = name
        .rsplit(|c: char| c == '/' || c == '\\')
        .next()
        .unwrap_or(name);

    let mut sanitized: String = last_component
        .chars()
        .filter(|c| !c.is_ascii_control())
        .collect();

    while sanitized.contains("..") {
        sanitized = sanitized.replace("..", ".");
    }

    let trimmed = sanitized.trim_matches(|c: char| c == '.' || c.is_whitespace());

    if trimmed.is_empty() {
        return FALLBACK_FILENAME.to_string();
    }

    truncate_preserving_extension(trimmed, MAX_FILENAME_BYTES)
}

/// Lowercase extension of the name [`sanitize_filename`] produces for `name`.
pub fn stored_extension(name: &str) -> Option<String> {
    let stored = sanitize_filename(name);
    let (stem, extension) = stored.rsplit_once('.')?;
    if stem.is_empty() || extension.is_empty() {
        return None;
    }
    Some(extension.to_lowercase())
}

fn truncate_preserving_extension(name: &str, max_bytes: usize) -> String {
    if name.len() <= max_bytes {
        return name.to_string();
    }

    let (stem, extension) = match name.rfind('.') {
        Some(pos) if pos > 0 && name.len() - pos <= MAX_PRESERVED_EXTENSION_BYTES => {
            name.split_at(pos)
        }
        _ => (name, ""),
    };

    let stem = truncate_to_char_boundary(stem, max_bytes - extension.len());
    // A cut can leave the stem ending in '.', which would join with the extension's dot.
    let stem = stem.trim_end_matches(|c: char| c == '.' || c.is_whitespace());

    format!("{}{}", stem, extension)
}

fn truncate_to_char_boundary(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
