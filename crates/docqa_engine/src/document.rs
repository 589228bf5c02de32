use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;

/// Extensions offered by the document picker. The backend does its own checks.
pub const ACCEPTED_EXTENSIONS: [&str; 4] = ["pdf", "txt", "xls", "xlsx"];

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("unsupported file type {0:?}: expected .pdf, .txt, .xls or .xlsx")]
    UnsupportedExtension(PathBuf),
    #[error("not a regular file: {0:?}")]
    NotAFile(PathBuf),
    #[error("could not read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// A document read into memory, ready for multipart upload.
#[derive(Clone, PartialEq, Eq)]
pub struct Document {
    pub filename: String,
    pub mime_type: Option<String>,
    pub bytes: Arc<[u8]>,
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("filename", &self.filename)
            .field("mime_type", &self.mime_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Case-insensitive extension check against [`ACCEPTED_EXTENSIONS`].
pub fn is_accepted(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            ACCEPTED_EXTENSIONS
                .iter()
                .any(|accepted| accepted.eq_ignore_ascii_case(ext))
        })
        .unwrap_or(false)
}

/// Applies the picker filter, then reads the file and guesses its MIME type.
pub fn load_document(path: &Path) -> Result<Document, DocumentError> {
    if !is_accepted(path) {
        return Err(DocumentError::UnsupportedExtension(path.to_path_buf()));
    }
    let meta = fs::metadata(path).map_err(|source| DocumentError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    if !meta.is_file() {
        return Err(DocumentError::NotAFile(path.to_path_buf()));
    }
    let bytes = fs::read(path).map_err(|source| DocumentError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mime_type = mime_guess::from_path(path)
        .first_raw()
        .map(str::to_string);

    Ok(Document {
        filename,
        mime_type,
        bytes: bytes.into(),
    })
}
