use serde::{Deserialize, Serialize};

/// How an uploaded document is turned into text.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    /// Word document: paragraphs read from the OOXML body.
    Docx,
    /// UTF-8 text, read as-is.
    PlainText,
    /// Anything else goes through OCR.
    Image,
}

impl DocumentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Docx => "docx",
            Self::PlainText => "plain_text",
            Self::Image => "image",
        }
    }

    pub fn needs_ocr(&self) -> bool {
        matches!(self, Self::Image)
    }
}

/// Classify an upload by its client-supplied file name.
///
/// `.docx` is matched case-insensitively on the suffix; text is whatever
/// `mime_guess` maps to `text/*`. Everything else is assumed to be an image.
pub fn classify_upload(file_name: &str) -> DocumentKind {
    if file_name.to_lowercase().ends_with(".docx") {
        return DocumentKind::Docx;
    }
    let is_text = mime_guess::from_path(file_name)
        .first()
        .map(|mime| mime.type_() == mime_guess::mime::TEXT)
        .unwrap_or(false);
    if is_text {
        DocumentKind::PlainText
    } else {
        DocumentKind::Image
    }
}

/// Make a client-supplied file name safe to join onto a directory.
pub fn sanitize_filename(name: &str) -> String {
    // Only the last path component is meaningful
    let base = name.rsplit(['/', '\\']).next().unwrap_or("");

    let sanitized: String = base
        .chars()
        .filter(|&c| c != '\0')
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    // Remove consecutive dots (path traversal prevention)
    let sanitized = sanitized.replace("..", "");
    let sanitized = sanitized.trim_start_matches('.').to_string();

    // Truncate to 100 characters
    let sanitized = if sanitized.len() > 100 {
        sanitized[..100].to_string()
    } else {
        sanitized
    };

    if sanitized.is_empty() {
        "document".into()
    } else {
        sanitized
    }
}

/// Extension of a file name including the leading dot, or `""`.
///
/// Leading dots of the base name do not start an extension
/// (`.bashrc` has none). Non-alphanumeric extensions are dropped.
pub fn file_extension(name: &str) -> &str {
    let base = name.rsplit(['/', '\\']).next().unwrap_or("");
    let stem_start = base.len() - base.trim_start_matches('.').len();
    match base[stem_start..].rfind('.') {
        Some(idx) => {
            let ext = &base[stem_start + idx..];
            let valid = ext.len() <= 10 && ext[1..].chars().all(|c| c.is_ascii_alphanumeric());
            if valid {
                ext
            } else {
                ""
            }
        }
        None => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn docx_is_case_insensitive() {
        assert_eq!(classify_upload("Report.DOCX"), DocumentKind::Docx);
        assert_eq!(classify_upload("labs.docx"), DocumentKind::Docx);
    }

    #[test]
    fn text_files_are_plain_text() {
        assert_eq!(classify_upload("notes.txt"), DocumentKind::PlainText);
        assert_eq!(classify_upload("export.csv"), DocumentKind::PlainText);
    }

    #[test]
    fn everything_else_is_an_image() {
        assert_eq!(classify_upload("scan.jpg"), DocumentKind::Image);
        assert_eq!(classify_upload("scan.PNG"), DocumentKind::Image);
        assert_eq!(classify_upload("no_extension"), DocumentKind::Image);
        assert!(classify_upload("photo.heic").needs_ocr());
    }

    #[test]
    fn sanitize_strips_directories() {
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("C:\\Users\\me\\scan.png"), "scan.png");
    }

    #[test]
    fn sanitize_replaces_special_chars() {
        assert_eq!(sanitize_filename("lab results (1).jpg"), "lab_results__1_.jpg");
    }

    #[test]
    fn sanitize_never_returns_empty() {
        assert_eq!(sanitize_filename(""), "document");
        assert_eq!(sanitize_filename("../"), "document");
        assert_eq!(sanitize_filename("..."), "document");
    }

    #[test]
    fn sanitize_truncates_long_names() {
        let long = "a".repeat(300);
        assert_eq!(sanitize_filename(&long).len(), 100);
    }

    #[test]
    fn extension_keeps_the_dot_and_case() {
        assert_eq!(file_extension("me.JPG"), ".JPG");
        assert_eq!(file_extension("archive.tar.gz"), ".gz");
        assert_eq!(file_extension("dir/photo.png"), ".png");
    }

    #[test]
    fn extension_absent_cases() {
        assert_eq!(file_extension("README"), "");
        assert_eq!(file_extension(".bashrc"), "");
        assert_eq!(file_extension("weird.p/ng"), "");
        assert_eq!(file_extension("evil.png%00"), "");
    }
}
