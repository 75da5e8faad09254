//! Upload filename sanitization.
//!
//! Filenames arrive from end users and are forwarded verbatim to an external
//! service as a multipart part name, so they are reduced to a conservative
//! ASCII character set before leaving the process. The stem may be fully
//! non-representable (e.g. entirely non-ASCII); in that case it is replaced
//! by a caller-supplied placeholder while the extension is preserved.

/// Sanitize a filename to a safe ASCII subset.
///
/// - The stem keeps ASCII alphanumerics plus `.`, `-` and `_`; whitespace
///   becomes `_`; everything else is dropped.
/// - A stem that is empty after sanitization (or consists only of dots) is
///   replaced by `fallback`.
/// - The extension (text after the last dot) is kept only if it is non-empty
///   and purely ASCII alphanumeric; otherwise the result has no extension.
pub fn secure_filename(filename: &str, fallback: &str) -> String {
    let (stem, ext) = split_extension(filename);

    let mut safe_stem: String = stem
        .chars()
        .filter_map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                Some(c)
            } else if c.is_whitespace() {
                Some('_')
            } else {
                None
            }
        })
        .collect();
    safe_stem = safe_stem.trim_matches('.').to_string();

    if safe_stem.is_empty() {
        safe_stem = fallback.to_string();
    }

    match ext {
        Some(ext) if !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()) => {
            format!("{safe_stem}.{ext}")
        }
        _ => safe_stem,
    }
}

/// Split a filename into stem and extension at the last dot.
///
/// A leading dot ("hidden" files) is part of the stem, not an extension
/// separator.
pub fn split_extension(filename: &str) -> (&str, Option<&str>) {
    match filename.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, Some(ext)),
        _ => (filename, None),
    }
}
