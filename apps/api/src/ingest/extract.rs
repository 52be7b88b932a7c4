//! Text Extractor — pulls plain text out of uploaded resume/job documents.
//!
//! Leaf module: no dependency on the rest of the engine. Supported formats
//! are PDF (via `pdf-extract`), DOCX (the ZIP container's
//! `word/document.xml`, tags stripped), and plain text.

use std::io::Read;

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Unsupported file format: .{0}")]
    Unsupported(String),

    #[error("Could not read PDF: {0}")]
    Pdf(String),

    #[error("Could not read DOCX: {0}")]
    Docx(String),
}

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b").unwrap());

static PHONE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:\+\d{1,3}[-.\s]?)?\(?\d{3}\)?[-.\s]?\d{3}[-.\s]?\d{4}").unwrap()
});

/// Extracts plain text from an uploaded document, dispatching on the file
/// extension.
pub fn extract_text(filename: &str, bytes: &[u8]) -> Result<String, ExtractError> {
    let extension = filename
        .rsplit('.')
        .next()
        .unwrap_or_default()
        .to_lowercase();

    match extension.as_str() {
        "pdf" => extract_pdf(bytes),
        "docx" => extract_docx(bytes),
        "txt" | "md" => Ok(String::from_utf8_lossy(bytes).into_owned()),
        other => Err(ExtractError::Unsupported(other.to_string())),
    }
}

fn extract_pdf(bytes: &[u8]) -> Result<String, ExtractError> {
    pdf_extract::extract_text_from_mem(bytes).map_err(|e| ExtractError::Pdf(e.to_string()))
}

/// A DOCX file is a ZIP archive; the document body lives in
/// `word/document.xml`. Paragraph closes become newlines, every other tag is
/// dropped, and the few XML entities that matter get decoded.
fn extract_docx(bytes: &[u8]) -> Result<String, ExtractError> {
    let cursor = std::io::Cursor::new(bytes);
    let mut archive =
        zip::ZipArchive::new(cursor).map_err(|e| ExtractError::Docx(e.to_string()))?;
    let mut document = archive
        .by_name("word/document.xml")
        .map_err(|e| ExtractError::Docx(e.to_string()))?;

    let mut xml = String::new();
    document
        .read_to_string(&mut xml)
        .map_err(|e| ExtractError::Docx(e.to_string()))?;

    Ok(strip_document_xml(&xml))
}

fn strip_document_xml(xml: &str) -> String {
    let with_breaks = xml.replace("</w:p>", "\n");

    let mut text = String::with_capacity(with_breaks.len());
    let mut in_tag = false;
    for c in with_breaks.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => text.push(c),
            _ => {}
        }
    }

    text.replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .trim()
        .to_string()
}

/// Derives a candidate name from an uploaded filename:
/// `jane_doe-resume.pdf` → `Jane Doe Resume`.
pub fn candidate_name_from_filename(filename: &str) -> String {
    let stem = filename.rsplit_once('.').map_or(filename, |(s, _)| s);
    stem.split(['_', '-', ' '])
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// First email address found in the text, if any.
pub fn email_in(text: &str) -> Option<String> {
    EMAIL_RE.find(text).map(|m| m.as_str().to_string())
}

/// First phone number found in the text, if any.
pub fn phone_in(text: &str) -> Option<String> {
    PHONE_RE.find(text).map(|m| m.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_txt_extraction_is_lossy_utf8() {
        let text = extract_text("resume.txt", b"plain resume text").unwrap();
        assert_eq!(text, "plain resume text");
    }

    #[test]
    fn test_unsupported_extension_is_error() {
        let result = extract_text("resume.xlsx", b"");
        assert!(matches!(result, Err(ExtractError::Unsupported(ref ext)) if ext == "xlsx"));
    }

    #[test]
    fn test_extension_dispatch_is_case_insensitive() {
        assert!(extract_text("resume.TXT", b"ok").is_ok());
    }

    #[test]
    fn test_garbage_docx_is_error() {
        let result = extract_text("resume.docx", b"not a zip archive");
        assert!(matches!(result, Err(ExtractError::Docx(_))));
    }

    #[test]
    fn test_strip_document_xml() {
        let xml = "<w:document><w:p><w:r><w:t>First line</w:t></w:r></w:p>\
                   <w:p><w:r><w:t>Second &amp; third</w:t></w:r></w:p></w:document>";
        let text = strip_document_xml(xml);
        assert_eq!(text, "First line\nSecond & third");
    }

    #[test]
    fn test_candidate_name_from_filename() {
        assert_eq!(candidate_name_from_filename("jane_doe.pdf"), "Jane Doe");
        assert_eq!(
            candidate_name_from_filename("john-smith-resume.docx"),
            "John Smith Resume"
        );
        assert_eq!(candidate_name_from_filename("cv.txt"), "Cv");
    }

    #[test]
    fn test_email_in_text() {
        assert_eq!(
            email_in("Reach me at jane.doe@example.com or by phone."),
            Some("jane.doe@example.com".to_string())
        );
        assert_eq!(email_in("no contact details"), None);
    }

    #[test]
    fn test_phone_in_text() {
        assert_eq!(
            phone_in("Call 555-123-4567 any time."),
            Some("555-123-4567".to_string())
        );
        assert_eq!(phone_in("no digits here"), None);
    }
}
