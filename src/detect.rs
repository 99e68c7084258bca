//! Document format detection.
//!
//! Formats are recognised by file extension first and by content sniffing
//! second. Only the leading bytes of a file are ever read.

use crate::error::{Error, Result};
use crate::model::DocumentFormat;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Number of leading bytes inspected when sniffing.
const SNIFF_LEN: usize = 512;

const PDF_MAGIC: &[u8] = b"%PDF-";
const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n";
const JPEG_MAGIC: &[u8] = b"\xff\xd8\xff";
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";

/// Detect a document format from a file path.
///
/// The extension wins when it is recognised. Otherwise the first bytes of
/// the file are sniffed.
///
/// # Returns
/// * `Ok(DocumentFormat)` if the format is recognised
/// * `Err(Error::UnknownFormat)` if neither extension nor content match
/// * `Err(Error::Io)` if the file cannot be read
///
/// # Example
/// ```no_run
/// use docparity::detect::detect_format_from_path;
///
/// let format = detect_format_from_path("paper.pdf").unwrap();
/// println!("{:?}", format);
/// ```
pub fn detect_format_from_path<P: AsRef<Path>>(path: P) -> Result<DocumentFormat> {
    let path = path.as_ref();
    if let Some(format) = path
        .extension()
        .and_then(|e| e.to_str())
        .and_then(DocumentFormat::from_extension)
    {
        return Ok(format);
    }

    let file = File::open(path)?;
    let mut header = Vec::with_capacity(SNIFF_LEN);
    file.take(SNIFF_LEN as u64).read_to_end(&mut header)?;
    detect_format_from_bytes(&header)
}

/// Detect a document format from its leading bytes.
///
/// Recognises PDF, PNG and JPEG magic numbers, SVG and HTML markup, and
/// Jupyter notebooks. ZIP containers (docx, pptx) cannot be told apart
/// without an extension and are reported as unknown.
pub fn detect_format_from_bytes(data: &[u8]) -> Result<DocumentFormat> {
    if data.starts_with(PDF_MAGIC) {
        return Ok(DocumentFormat::Pdf);
    }
    if data.starts_with(PNG_MAGIC) {
        return Ok(DocumentFormat::Png);
    }
    if data.starts_with(JPEG_MAGIC) {
        return Ok(DocumentFormat::Jpg);
    }
    if data.starts_with(ZIP_MAGIC) {
        log::debug!("ZIP container without extension, cannot tell docx from pptx");
        return Err(Error::UnknownFormat);
    }

    let head = &data[..data.len().min(SNIFF_LEN)];
    let text = String::from_utf8_lossy(head);
    let text = text.trim_start_matches('\u{feff}').trim_start();
    let lower = text.to_ascii_lowercase();

    if lower.contains("<svg") {
        return Ok(DocumentFormat::Svg);
    }
    if lower.starts_with("<!doctype html") || lower.contains("<html") {
        return Ok(DocumentFormat::Html);
    }
    if lower.starts_with('{') && lower.contains("\"cells\"") {
        return Ok(DocumentFormat::Jupyter);
    }

    Err(Error::UnknownFormat)
}

/// Check if bytes look like a PDF.
pub fn is_pdf_bytes(data: &[u8]) -> bool {
    data.starts_with(PDF_MAGIC)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_detect_pdf() {
        let data = b"%PDF-1.7\n%\xe2\xe3\xcf\xd3";
        assert_eq!(detect_format_from_bytes(data).unwrap(), DocumentFormat::Pdf);
        assert!(is_pdf_bytes(data));
    }

    #[test]
    fn test_detect_images() {
        assert_eq!(
            detect_format_from_bytes(b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR").unwrap(),
            DocumentFormat::Png
        );
        assert_eq!(
            detect_format_from_bytes(b"\xff\xd8\xff\xe0\0\x10JFIF").unwrap(),
            DocumentFormat::Jpg
        );
    }

    #[test]
    fn test_detect_markup() {
        assert_eq!(
            detect_format_from_bytes(b"<!DOCTYPE html><html></html>").unwrap(),
            DocumentFormat::Html
        );
        assert_eq!(
            detect_format_from_bytes(b"<?xml version=\"1.0\"?>\n<svg xmlns=\"x\"></svg>").unwrap(),
            DocumentFormat::Svg
        );
    }

    #[test]
    fn test_detect_notebook() {
        let data = br#"{"cells": [], "metadata": {}, "nbformat": 4}"#;
        assert_eq!(detect_format_from_bytes(data).unwrap(), DocumentFormat::Jupyter);
    }

    #[test]
    fn test_detect_unknown() {
        assert!(matches!(
            detect_format_from_bytes(b"Not a document"),
            Err(Error::UnknownFormat)
        ));
        assert!(matches!(
            detect_format_from_bytes(b"PK\x03\x04rest"),
            Err(Error::UnknownFormat)
        ));
        assert!(matches!(detect_format_from_bytes(b""), Err(Error::UnknownFormat)));
    }

    #[test]
    fn test_path_extension_wins() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("slides.PPTX");
        std::fs::write(&path, b"PK\x03\x04").unwrap();
        assert_eq!(detect_format_from_path(&path).unwrap(), DocumentFormat::Pptx);
    }

    #[test]
    fn test_path_sniffed_without_extension() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"%PDF-1.4\n").unwrap();
        assert_eq!(detect_format_from_path(file.path()).unwrap(), DocumentFormat::Pdf);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = detect_format_from_path("/nonexistent/file");
        assert!(matches!(result, Err(Error::Io(_))));
    }
}
