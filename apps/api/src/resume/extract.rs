//! Raw text extraction from uploaded resume documents.

use thiserror::Error;

use crate::errors::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Pdf,
    PlainText,
}

impl DocumentFormat {
    pub fn content_type(self) -> &'static str {
        match self {
            DocumentFormat::Pdf => "application/pdf",
            DocumentFormat::PlainText => "text/plain",
        }
    }
}

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Unsupported file type '{0}'. Upload a PDF or plain-text resume")]
    UnsupportedFormat(String),

    #[error("Could not read PDF: {0}")]
    Pdf(String),

    #[error("No text could be extracted from the document")]
    Empty,
}

impl From<ExtractError> for AppError {
    fn from(err: ExtractError) -> Self {
        match err {
            ExtractError::UnsupportedFormat(_) => AppError::Validation(err.to_string()),
            ExtractError::Pdf(_) | ExtractError::Empty => {
                AppError::UnprocessableEntity(err.to_string())
            }
        }
    }
}

/// Picks a format from the file extension first, then the declared content type.
pub fn detect_format(
    filename: &str,
    content_type: Option<&str>,
) -> Result<DocumentFormat, ExtractError> {
    let extension = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "pdf" => return Ok(DocumentFormat::Pdf),
        "txt" | "text" | "md" => return Ok(DocumentFormat::PlainText),
        _ => {}
    }

    match content_type.map(|c| c.to_ascii_lowercase()) {
        Some(ct) if ct == "application/pdf" => Ok(DocumentFormat::Pdf),
        Some(ct) if ct.starts_with("text/") => Ok(DocumentFormat::PlainText),
        _ => Err(ExtractError::UnsupportedFormat(filename.to_string())),
    }
}

/// Extracts text from the document. PDF parsing runs on the blocking pool;
/// a panic inside the PDF library is reported as an unreadable document.
pub async fn extract_text(bytes: Vec<u8>, format: DocumentFormat) -> Result<String, ExtractError> {
    let text = match format {
        DocumentFormat::PlainText => decode_plain_text(&bytes),
        DocumentFormat::Pdf => tokio::task::spawn_blocking(move || {
            pdf_extract::extract_text_from_mem(&bytes).map_err(|e| ExtractError::Pdf(e.to_string()))
        })
        .await
        .map_err(|e| ExtractError::Pdf(format!("PDF parser aborted: {e}")))??,
    };

    let text = normalize_text(&text);
    if text.trim().is_empty() {
        return Err(ExtractError::Empty);
    }
    Ok(text)
}

/// UTF-16 with a byte order mark, otherwise lossy UTF-8.
fn decode_plain_text(bytes: &[u8]) -> String {
    let (units, little_endian) = match bytes {
        [0xFF, 0xFE, rest @ ..] => (rest, true),
        [0xFE, 0xFF, rest @ ..] => (rest, false),
        _ => return String::from_utf8_lossy(bytes).into_owned(),
    };
    char::decode_utf16(units.chunks_exact(2).map(|pair| {
        let pair = [pair[0], pair[1]];
        if little_endian {
            u16::from_le_bytes(pair)
        } else {
            u16::from_be_bytes(pair)
        }
    }))
    .map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER))
    .collect()
}

/// Unifies line endings and drops control characters other than newline and tab.
/// Strips trailing whitespace and collapses runs of blank lines to one.
pub fn normalize_text(text: &str) -> String {
    let kept: String = text
        .chars()
        .filter(|c| {
            (!c.is_control() || matches!(c, '\n' | '\t' | '\r' | '\u{c}')) && *c != '\u{feff}'
        })
        .collect();
    let unified = kept.replace("\r\n", "\n").replace(['\r', '\u{c}'], "\n");
    let mut out = String::with_capacity(unified.len());
    let mut blank_run = 0usize;
    for line in unified.lines() {
        let line = line.trim_end();
        if line.is_empty() {
            blank_run += 1;
            if blank_run > 1 || out.is_empty() {
                continue;
            }
        } else {
            blank_run = 0;
        }
        out.push_str(line);
        out.push('\n');
    }
    out.trim_end().to_string()
}

/// Reduces an uploaded filename to a safe, flat name.
pub fn secure_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .filter_map(|c| match c {
            c if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') => Some(c),
            c if c.is_whitespace() => Some('_'),
            _ => None,
        })
        .collect();
    let cleaned = cleaned.trim_start_matches(['.', '_']).to_string();
    if cleaned.is_empty() {
        "resume".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_format_by_extension() {
        assert_eq!(detect_format("cv.PDF", None).unwrap(), DocumentFormat::Pdf);
        assert_eq!(
            detect_format("cv.txt", Some("application/octet-stream")).unwrap(),
            DocumentFormat::PlainText
        );
    }

    #[test]
    fn test_detect_format_falls_back_to_content_type() {
        assert_eq!(
            detect_format("upload", Some("application/pdf")).unwrap(),
            DocumentFormat::Pdf
        );
        assert_eq!(
            detect_format("upload", Some("text/markdown")).unwrap(),
            DocumentFormat::PlainText
        );
    }

    #[test]
    fn test_detect_format_rejects_unknown() {
        let err = detect_format("cv.docx", Some("application/msword")).unwrap_err();
        assert!(matches!(err, ExtractError::UnsupportedFormat(_)));
        assert!(matches!(AppError::from(err), AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_extract_plain_text_normalizes_line_endings() {
        let text = extract_text(b"Jane Doe\r\n\r\n\r\nSkills\r\nRust".to_vec(), DocumentFormat::PlainText)
            .await
            .unwrap();
        assert_eq!(text, "Jane Doe\n\nSkills\nRust");
    }

    #[tokio::test]
    async fn test_extract_empty_text_is_error() {
        let err = extract_text(b"  \n \n".to_vec(), DocumentFormat::PlainText)
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractError::Empty));
        assert!(matches!(AppError::from(err), AppError::UnprocessableEntity(_)));
    }

    fn utf16le(text: &str, bom: bool) -> Vec<u8> {
        let mut bytes = if bom { vec![0xFF, 0xFE] } else { Vec::new() };
        bytes.extend(text.encode_utf16().flat_map(|u| u.to_le_bytes()));
        bytes
    }

    #[tokio::test]
    async fn test_extract_utf16_text_has_no_nul() {
        for bom in [true, false] {
            let bytes = utf16le("Jane Doe\r\nSkills: Rust", bom);
            let text = extract_text(bytes, DocumentFormat::PlainText).await.unwrap();
            assert!(!text.contains('\0'), "bom={bom}");
            assert_eq!(text, "Jane Doe\nSkills: Rust", "bom={bom}");
        }
    }

    #[test]
    fn test_normalize_drops_control_characters() {
        assert_eq!(
            normalize_text("\u{feff}Jane\0 Doe\u{7}\nRust\tGo\u{1b}"),
            "Jane Doe\nRust\tGo"
        );
    }

    #[tokio::test]
    async fn test_extract_garbage_pdf_is_error_not_panic() {
        let result = extract_text(b"not a pdf at all".to_vec(), DocumentFormat::Pdf).await;
        assert!(result.is_err());
    }

    #[test]
    fn test_secure_filename() {
        assert_eq!(secure_filename("My Resume (final).pdf"), "My_Resume_final.pdf");
        assert_eq!(secure_filename("../../etc/passwd"), "passwd");
        assert_eq!(secure_filename("C:\\Users\\me\\cv.pdf"), "cv.pdf");
        assert_eq!(secure_filename(".hidden.pdf"), "hidden.pdf");
        assert_eq!(secure_filename("???"), "resume");
    }
}
