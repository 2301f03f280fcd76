use regex::Regex;
use std::collections::HashSet;
use std::path::Path;
use std::sync::LazyLock;

static UNSAFE_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9 _-]").expect("static regex"));

/// Reduce `text` to `[A-Za-z0-9 _-]`, trimmed; `fallback` if nothing is left.
fn sanitize_or(text: &str, fallback: impl FnOnce() -> String) -> String {
    let kept = UNSAFE_CHARS.replace_all(text, "");
    let trimmed = kept.trim();
    if trimmed.is_empty() {
        fallback()
    } else {
        trimmed.to_string()
    }
}

/// Path-safe form of a bookmark title, never empty.
pub fn sanitize(title: &str, ordinal: usize) -> String {
    sanitize_or(title, || format!("Part_{}", ordinal))
}

/// `01-Title.pdf`
pub fn chapter_file_name(ordinal: usize, title: &str) -> String {
    format!("{:02}-{}.pdf", ordinal, sanitize(title, ordinal))
}

/// Archive directory names for a batch of sources, one per source, in order.
///
/// Each is the sanitized file stem; repeated stems get `_2`, `_3`, ...
pub fn source_directories<S: AsRef<str>>(names: &[S]) -> Vec<String> {
    let mut used: HashSet<String> = HashSet::new();

    names
        .iter()
        .enumerate()
        .map(|(index, name)| {
            let stem = Path::new(name.as_ref())
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            let base = sanitize_or(&stem, || format!("Document_{}", index + 1));

            // Compared case-insensitively so extraction on such filesystems
            // cannot merge two directories
            let mut candidate = base.clone();
            let mut n = 1;
            while !used.insert(candidate.to_lowercase()) {
                n += 1;
                candidate = format!("{}_{}", base, n);
            }
            candidate
        })
        .collect()
}

/// Archive path of a chapter, nested under its source directory when batching.
pub fn entry_path(directory: Option<&str>, file_name: &str) -> String {
    match directory {
        Some(dir) => format!("{}/{}", dir, file_name),
        None => file_name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_keeps_safe_characters() {
        assert_eq!(sanitize("Chapter 1 - Intro_x", 1), "Chapter 1 - Intro_x");
    }

    #[test]
    fn test_sanitize_strips_path_characters() {
        assert_eq!(sanitize("../etc/passwd", 3), "etcpasswd");
        assert_eq!(sanitize("  A: B? C*  ", 3), "A B C");
    }

    #[test]
    fn test_sanitize_fallback() {
        assert_eq!(sanitize("", 4), "Part_4");
        assert_eq!(sanitize("   ", 5), "Part_5");
        assert_eq!(sanitize("第一章", 6), "Part_6");
        assert_eq!(sanitize("/\\:*?\"<>|", 7), "Part_7");
    }

    #[test]
    fn test_sanitize_output_is_always_safe() {
        let safe = Regex::new(r"^[A-Za-z0-9 _-]+$").unwrap();
        let inputs = [
            "",
            " ",
            "\t\n",
            "Ünïcödé Title",
            "emoji 🎉 chapter",
            "a/b\\c",
            "\u{0}\u{1f}",
            "---",
            "Résumé: 2.1",
        ];
        for (i, input) in inputs.iter().enumerate() {
            let out = sanitize(input, i);
            assert!(safe.is_match(&out), "{:?} -> {:?}", input, out);
        }
    }

    #[test]
    fn test_chapter_file_name() {
        assert_eq!(chapter_file_name(1, "Ch1"), "01-Ch1.pdf");
        assert_eq!(chapter_file_name(12, "???"), "12-Part_12.pdf");
        assert_eq!(chapter_file_name(123, "Appendix"), "123-Appendix.pdf");
    }

    #[test]
    fn test_source_directories() {
        let dirs = source_directories(&[
            "a/report.pdf",
            "b/report.pdf",
            "Report.PDF",
            "report_2.pdf",
            "notes v2.pdf",
            "#.pdf",
        ]);
        assert_eq!(
            dirs,
            vec!["report", "report_2", "Report_3", "report_2_2", "notes v2", "Document_6"]
        );
    }

    #[test]
    fn test_entry_path() {
        assert_eq!(entry_path(None, "01-A.pdf"), "01-A.pdf");
        assert_eq!(entry_path(Some("book"), "01-A.pdf"), "book/01-A.pdf");
    }
}
