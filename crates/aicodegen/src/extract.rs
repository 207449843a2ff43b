//! Plain-text extraction for the file formats the tools understand.

use std::fs::{self, File};
use std::io::{self, Read};
use std::path::Path;

use thiserror::Error;
use zip::ZipArchive;

/// Error returned when a file could not be turned into text.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// The file that was being read.
        path: String,
        /// The underlying error.
        #[source]
        source: io::Error,
    },
    /// The file is not a valid office archive.
    #[error("failed to open document {path}: {source}")]
    Archive {
        /// The file that was being read.
        path: String,
        /// The underlying error.
        #[source]
        source: zip::result::ZipError,
    },
    /// The PDF could not be parsed.
    #[error("failed to extract text from PDF {path}: {reason}")]
    Pdf {
        /// The file that was being read.
        path: String,
        /// What the PDF parser reported.
        reason: String,
    },
}

/// Returns the plain text of the file at `path`, picking the extraction
/// method by extension.
///
/// Files with unknown extensions are read as UTF-8; invalid sequences are
/// replaced rather than rejected.
pub fn extract_text(path: &Path) -> Result<String, ExtractError> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("pdf") => pdf_extract::extract_text(path).map_err(|err| {
            ExtractError::Pdf {
                path: path.display().to_string(),
                reason: err.to_string(),
            }
        }),
        Some("docx") => read_zip_entry(path, "word/document.xml")
            .map(|xml| xml_to_text(&xml)),
        Some("odt") => {
            read_zip_entry(path, "content.xml").map(|xml| xml_to_text(&xml))
        }
        Some("xml") => read_to_string(path).map(|xml| xml_to_text(&xml)),
        _ => read_to_string(path),
    }
}

fn read_to_string(path: &Path) -> Result<String, ExtractError> {
    let bytes = fs::read(path).map_err(|source| ExtractError::Io {
        path: path.display().to_string(),
        source,
    })?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn read_zip_entry(path: &Path, entry: &str) -> Result<String, ExtractError> {
    let archive_err = |source| ExtractError::Archive {
        path: path.display().to_string(),
        source,
    };

    let file = File::open(path).map_err(|source| ExtractError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let mut archive = ZipArchive::new(file).map_err(archive_err)?;
    let mut entry = archive.by_name(entry).map_err(archive_err)?;

    let mut xml = String::new();
    entry
        .read_to_string(&mut xml)
        .map_err(|source| ExtractError::Io {
            path: path.display().to_string(),
            source,
        })?;
    Ok(xml)
}

/// Strips markup from WordprocessingML and OpenDocument XML, keeping
/// paragraph breaks.
pub(crate) fn xml_to_text(xml: &str) -> String {
    let with_breaks = xml
        .replace("</w:p>", "\n")
        .replace("</text:p>", "\n")
        .replace("</text:h>", "\n")
        .replace("<w:tab/>", "\t")
        .replace("<text:tab/>", "\t")
        .replace("<w:br/>", "\n")
        .replace("<text:line-break/>", "\n");

    let mut result = String::with_capacity(with_breaks.len());
    let mut in_tag = false;
    for ch in with_breaks.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => result.push(ch),
            _ => {}
        }
    }

    decode_entities(&result)
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn decode_entities(text: &str) -> String {
    // `&amp;` goes last so that `&amp;lt;` decodes to `&lt;`.
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
