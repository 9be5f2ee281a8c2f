use unicode_normalization::UnicodeNormalization;

/// Extension assumed when the uploaded name has none.
pub const DEFAULT_EXTENSION: &str = "pdf";

/// Marker inserted between the base name and the extension of a result.
pub const TRANSLATED_MARKER: &str = "_translated";

const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// Split a filename into base and extension.
///
/// The extension is whatever follows the last `.`, provided it is non-empty
/// and does not cross a path separator. Without one the whole name is the
/// base and the extension falls back to [`DEFAULT_EXTENSION`]; the whole
/// name is never reused as an extension (`README` keeps `pdf`, not `README`).
pub fn split_extension(name: &str) -> (&str, &str) {
    match name.rsplit_once('.') {
        Some((base, ext)) if !ext.is_empty() && !ext.contains('/') => (base, ext),
        _ => (name, DEFAULT_EXTENSION),
    }
}

/// Strip diacritics and replace anything outside `[A-Za-z0-9.\-_]` with `_`.
pub fn sanitize_base(base: &str) -> String {
    base.nfd()
        .filter(|c| !is_combining_diacritic(*c))
        .map(|c| if is_safe_char(c) { c } else { '_' })
        .collect()
}

/// Build the download name for a translated document:
/// `Résumé Final.pdf` becomes `Resume_Final_translated.pdf`.
pub fn translated_filename(original: &str) -> String {
    let (base, ext) = split_extension(original);
    format!(
        "{}{}.{}",
        sanitize_base(base),
        TRANSLATED_MARKER,
        sanitize_base(ext)
    )
}

/// Content type for a document extension, matched case-insensitively so an
/// upload named `SCAN.PDF` is served as `application/pdf`, not as a download blob.
pub fn content_type_for(extension: &str) -> &'static str {
    match extension.to_ascii_lowercase().as_str() {
        "pdf" => "application/pdf",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "pptx" => "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "txt" => "text/plain",
        _ => FALLBACK_CONTENT_TYPE,
    }
}

fn is_combining_diacritic(c: char) -> bool {
    ('\u{0300}'..='\u{036f}').contains(&c)
}

fn is_safe_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_')
}
