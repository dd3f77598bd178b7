//! Plain-text clinical documents fed to the report path.

use std::path::Path;

use thiserror::Error;

/// Extensions accepted for document reports.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["txt", "md"];

#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("Unsupported file format: {0}")]
    Unsupported(String),

    #[error("I/O error reading document: {0}")]
    Io(#[from] std::io::Error),

    #[error("Document is empty")]
    Empty,
}

/// Read a `.txt` or `.md` document as UTF-8 text.
pub fn read_document(path: &Path) -> Result<String, DocumentError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    if !SUPPORTED_EXTENSIONS.contains(&extension.as_str()) {
        let shown = if extension.is_empty() {
            path.display().to_string()
        } else {
            format!(".{extension}")
        };
        return Err(DocumentError::Unsupported(shown));
    }

    let text = std::fs::read_to_string(path)?;
    if text.trim().is_empty() {
        return Err(DocumentError::Empty);
    }

    tracing::debug!(path = %path.display(), bytes = text.len(), "Document read");
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_text_and_markdown() {
        let dir = tempfile::tempdir().unwrap();
        let txt = dir.path().join("notes.txt");
        let md = dir.path().join("Intake.MD");
        std::fs::write(&txt, "Patient reports low mood.").unwrap();
        std::fs::write(&md, "# Intake\nSleeps four hours a night.").unwrap();

        assert_eq!(read_document(&txt).unwrap(), "Patient reports low mood.");
        assert!(read_document(&md).unwrap().starts_with("# Intake"));
    }

    #[test]
    fn other_formats_rejected_before_reading() {
        let dir = tempfile::tempdir().unwrap();
        let pdf = dir.path().join("scan.pdf");

        let err = read_document(&pdf).unwrap_err();
        assert!(matches!(err, DocumentError::Unsupported(ref ext) if ext == ".pdf"));
        assert_eq!(err.to_string(), "Unsupported file format: .pdf");
    }

    #[test]
    fn missing_extension_rejected() {
        let err = read_document(Path::new("README")).unwrap_err();
        assert!(matches!(err, DocumentError::Unsupported(_)));
    }

    #[test]
    fn blank_document_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blank.txt");
        std::fs::write(&path, " \n\t").unwrap();
        assert!(matches!(read_document(&path), Err(DocumentError::Empty)));
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            read_document(&dir.path().join("absent.txt")),
            Err(DocumentError::Io(_))
        ));
    }
}
