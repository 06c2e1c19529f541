//! Executable and script payload heuristics.
//!
//! This is a conservative filter, not an antivirus: it looks for executable headers at the
//! start of the buffer and for a handful of script markers anywhere in it. Every pattern
//! added here must be weighed against false positives on legitimate binaries.

use bytes::Bytes;
use regex::bytes::RegexSet;
use std::sync::LazyLock;
use tracing::{debug, error, warn};
use upscan_core::{FileDescriptor, ScanCheck};

use crate::report::ScanReport;

/// Buffers above this size are inspected on a blocking worker thread.
pub const BLOCKING_INSPECTION_THRESHOLD: usize = 1024 * 1024;

/// How a [`ContentPattern`] is recognised.
#[derive(Debug, Clone, Copy)]
pub enum Matcher {
    /// Exact bytes at offset 0.
    Prefix(&'static [u8]),
    /// ASCII case-insensitive byte regex, matched anywhere in the buffer.
    Pattern(&'static str),
}

#[derive(Debug, Clone, Copy)]
pub struct ContentPattern {
    pub name: &'static str,
    pub matcher: Matcher,
    pub message: &'static str,
}

pub static CONTENT_PATTERNS: &[ContentPattern] = &[
    ContentPattern {
        name: "pe_header",
        matcher: Matcher::Prefix(b"MZ"),
        message: "Windows executable (PE) header detected",
    },
    ContentPattern {
        name: "elf_header",
        matcher: Matcher::Prefix(&[0x7F, 0x45, 0x4C, 0x46]),
        message: "Linux executable (ELF) header detected",
    },
    ContentPattern {
        name: "macho_header_32",
        matcher: Matcher::Prefix(&[0xFE, 0xED, 0xFA, 0xCE]),
        message: "macOS executable (Mach-O) header detected",
    },
    ContentPattern {
        name: "macho_header_64",
        matcher: Matcher::Prefix(&[0xFE, 0xED, 0xFA, 0xCF]),
        message: "macOS executable (Mach-O) header detected",
    },
    ContentPattern {
        name: "macho_header_32_le",
        matcher: Matcher::Prefix(&[0xCE, 0xFA, 0xED, 0xFE]),
        message: "macOS executable (Mach-O) header detected",
    },
    ContentPattern {
        name: "macho_header_64_le",
        matcher: Matcher::Prefix(&[0xCF, 0xFA, 0xED, 0xFE]),
        message: "macOS executable (Mach-O) header detected",
    },
    ContentPattern {
        name: "script_tag",
        matcher: Matcher::Pattern(r"(?i-u)<script"),
        message: "Embedded <script> tag detected",
    },
    ContentPattern {
        name: "javascript_uri",
        matcher: Matcher::Pattern(r"(?i-u)javascript:"),
        message: "javascript: URI detected",
    },
    ContentPattern {
        name: "event_handler",
        matcher: Matcher::Pattern(r"(?i-u)\bon[a-z]+\s*="),
        message: "Inline event handler attribute detected",
    },
    ContentPattern {
        name: "php_tag",
        matcher: Matcher::Pattern(r"(?i-u)<\?php"),
        message: "PHP open tag detected",
    },
];

/// The regex-backed patterns compiled into one set, with the index of each entry
/// in [`CONTENT_PATTERNS`].
struct CompiledPatterns {
    set: RegexSet,
    pattern_index: Vec<usize>,
}

static COMPILED_PATTERNS: LazyLock<Result<CompiledPatterns, regex::Error>> =
    LazyLock::new(|| {
        let (pattern_index, sources): (Vec<usize>, Vec<&str>) = CONTENT_PATTERNS
            .iter()
            .enumerate()
            .filter_map(|(i, p)| match p.matcher {
                Matcher::Pattern(source) => Some((i, source)),
                Matcher::Prefix(_) => None,
            })
            .unzip();
        let set = RegexSet::new(sources)?;
        Ok(CompiledPatterns { set, pattern_index })
    });

/// Every pattern matching `content`, in table order.
///
/// Returns an error only if the static pattern table failed to compile.
pub fn find_content_patterns(
    content: &[u8],
) -> Result<Vec<&'static ContentPattern>, regex::Error> {
    let compiled = COMPILED_PATTERNS.as_ref().map_err(|e| e.clone())?;
    let regex_hits: Vec<usize> = compiled
        .set
        .matches(content)
        .iter()
        .map(|i| compiled.pattern_index[i])
        .collect();

    Ok(CONTENT_PATTERNS
        .iter()
        .enumerate()
        .filter(|(i, pattern)| match pattern.matcher {
            Matcher::Prefix(prefix) => content.starts_with(prefix),
            Matcher::Pattern(_) => regex_hits.contains(i),
        })
        .map(|(_, pattern)| pattern)
        .collect())
}

/// Scan the file content for executable headers and embedded script markers.
///
/// One error is recorded per distinct message, so the four Mach-O variants count once.
pub async fn check_executable_content(file: &FileDescriptor, report: &mut ScanReport) {
    let result = if file.content.len() > BLOCKING_INSPECTION_THRESHOLD {
        let content: Bytes = file.content.clone();
        match tokio::task::spawn_blocking(move || find_content_patterns(&content)).await {
            Ok(result) => result,
            Err(e) => {
                error!(error = %e, filename = %file.original_name, "Content inspection task failed");
                report.push(
                    ScanCheck::ExecutableContent,
                    format!("Content inspection failed: {}", e),
                );
                return;
            }
        }
    } else {
        find_content_patterns(&file.content)
    };

    let matches = match result {
        Ok(matches) => matches,
        Err(e) => {
            error!(error = %e, "Content patterns failed to compile");
            report.push(
                ScanCheck::ExecutableContent,
                format!("Content inspection unavailable: {}", e),
            );
            return;
        }
    };

    if matches.is_empty() {
        debug!(filename = %file.original_name, "No executable content markers");
        return;
    }

    let mut seen: Vec<&str> = Vec::with_capacity(matches.len());
    for pattern in matches {
        if seen.contains(&pattern.message) {
            continue;
        }
        seen.push(pattern.message);
        warn!(
            filename = %file.original_name,
            pattern = pattern.name,
            "Executable content marker detected"
        );
        report.push(ScanCheck::ExecutableContent, pattern.message);
    }
}
