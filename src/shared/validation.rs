use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Characters not allowed in a stored file name
    static ref UNSAFE_FILENAME_CHARS: Regex = Regex::new(r"[^A-Za-z0-9._-]+").unwrap();

    /// Runs of underscores left behind after replacement
    static ref REPEATED_UNDERSCORES: Regex = Regex::new(r"_{2,}").unwrap();

    /// Job category slugs: lowercase words joined by underscores or hyphens
    /// - Valid: "engineering", "data_science", "customer-support"
    /// - Invalid: "Engineering", "data science", "_ops"
    pub static ref CATEGORY_REGEX: Regex = Regex::new(r"^[a-z0-9]+(?:[_-][a-z0-9]+)*$").unwrap();
}

/// Reduces a client-supplied file name to a safe, flat ASCII name.
///
/// Directory components are dropped, unsafe characters become `_` and
/// leading dots are stripped so the result can never escape the upload
/// directory or become a hidden file. Returns `None` when nothing usable
/// remains.
pub fn secure_filename(name: &str) -> Option<String> {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let replaced = UNSAFE_FILENAME_CHARS.replace_all(base.trim(), "_");
    let collapsed = REPEATED_UNDERSCORES.replace_all(&replaced, "_");
    let cleaned = collapsed.trim_start_matches(['.', '_']).trim_end_matches('_');

    if cleaned.is_empty() || cleaned.chars().all(|c| c == '.') {
        None
    } else {
        Some(cleaned.to_string())
    }
}

/// Lowercased extension of a file name, if any
pub fn file_extension(name: &str) -> Option<String> {
    let (stem, ext) = name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// `ILIKE` pattern matching `term` anywhere, with wildcards in the term escaped
pub fn like_pattern(term: &str) -> String {
    let escaped = term
        .trim()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

/// Trimmed, non-empty search term
pub fn search_term(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secure_filename_strips_paths() {
        assert_eq!(
            secure_filename("../../etc/passwd").as_deref(),
            Some("passwd")
        );
        assert_eq!(
            secure_filename(r"C:\Users\jane\My CV (final).pdf").as_deref(),
            Some("My_CV_final_.pdf")
        );
    }

    #[test]
    fn test_secure_filename_rejects_empty_results() {
        assert!(secure_filename("").is_none());
        assert!(secure_filename("...").is_none());
        assert!(secure_filename("/").is_none());
    }

    #[test]
    fn test_secure_filename_no_hidden_files() {
        assert_eq!(secure_filename(".resume.pdf").as_deref(), Some("resume.pdf"));
    }

    #[test]
    fn test_file_extension() {
        assert_eq!(file_extension("cv.PDF").as_deref(), Some("pdf"));
        assert_eq!(file_extension("cv.final.docx").as_deref(), Some("docx"));
        assert!(file_extension("resume").is_none());
        assert!(file_extension(".bashrc").is_none());
    }

    #[test]
    fn test_category_regex() {
        assert!(CATEGORY_REGEX.is_match("engineering"));
        assert!(CATEGORY_REGEX.is_match("data_science"));
        assert!(CATEGORY_REGEX.is_match("customer-support"));
        assert!(!CATEGORY_REGEX.is_match("Engineering"));
        assert!(!CATEGORY_REGEX.is_match("data science"));
        assert!(!CATEGORY_REGEX.is_match("_ops"));
        assert!(!CATEGORY_REGEX.is_match(""));
    }

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern(" rust "), "%rust%");
        assert_eq!(like_pattern("100%_done"), "%100\\%\\_done%");
    }

    #[test]
    fn test_search_term() {
        assert_eq!(search_term(Some("  dev ")), Some("dev"));
        assert_eq!(search_term(Some("   ")), None);
        assert_eq!(search_term(None), None);
    }
}
