//! Document sources: fetching raw bytes and handing them to the parser

use std::fs;
use std::io::Read;
use std::path::Path;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use log::{debug, info, warn};

use crate::error::{Result, ViewerError};
use crate::pdf::{DocumentError, DocumentParser, PdfDocument};

/// Responses larger than this are refused
const MAX_DOCUMENT_BYTES: u64 = 512 * 1024 * 1024;

/// Where a document comes from
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DocumentSource {
    /// `http(s)://` URL, `file://` URL or plain file path
    Url(String),
    /// Base64-encoded document bytes
    Base64(String),
    /// Bytes already in memory
    Bytes { name: String, bytes: Vec<u8> },
}

impl DocumentSource {
    /// Short label used in logs and as [`LoadedDocument::source`]
    pub fn label(&self) -> String {
        match self {
            DocumentSource::Url(url) => url.clone(),
            DocumentSource::Base64(data) => format!("<base64, {} chars>", data.len()),
            DocumentSource::Bytes { name, .. } => name.clone(),
        }
    }
}

/// Resolves a location to document bytes
pub trait SourceFetcher {
    fn fetch(&self, location: &str) -> Result<Vec<u8>>;
}

/// Fetches over HTTP(S) with `ureq`; anything else is read from disk
pub struct HttpFetcher {
    agent: ureq::Agent,
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self {
            agent: ureq::agent(),
        }
    }
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    fn fetch_remote(&self, url: &str) -> Result<Vec<u8>> {
        let response = self
            .agent
            .get(url)
            .set("Accept", "application/pdf")
            .call()
            .map_err(|e| ViewerError::fetch(url, e))?;

        read_limited(response.into_reader(), MAX_DOCUMENT_BYTES, url)
    }
}

/// Read all of `reader`, refusing bodies longer than `limit` bytes
fn read_limited(reader: impl Read, limit: u64, location: &str) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    reader
        .take(limit.saturating_add(1))
        .read_to_end(&mut bytes)
        .map_err(|e| ViewerError::fetch(location, e))?;
    if bytes.len() as u64 > limit {
        return Err(ViewerError::fetch(
            location,
            format!("document too large (over {limit} bytes)"),
        ));
    }
    Ok(bytes)
}

impl SourceFetcher for HttpFetcher {
    fn fetch(&self, location: &str) -> Result<Vec<u8>> {
        if location.starts_with("http://") || location.starts_with("https://") {
            return self.fetch_remote(location);
        }
        let path = location.strip_prefix("file://").unwrap_or(location);
        fs::read(Path::new(path)).map_err(|e| ViewerError::fetch(location, e))
    }
}

/// Decode a base64 payload, ignoring embedded whitespace and line breaks
pub fn decode_base64(data: &str) -> Result<Vec<u8>> {
    let compact: String = data.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    if compact.is_empty() {
        return Err(ViewerError::EmptySource {
            what: "Base64 data",
        });
    }
    Ok(STANDARD.decode(compact)?)
}

/// Raw bytes for `source`
pub fn read_source(source: &DocumentSource, fetcher: &dyn SourceFetcher) -> Result<Vec<u8>> {
    match source {
        DocumentSource::Url(url) => {
            let url = url.trim();
            if url.is_empty() {
                return Err(ViewerError::EmptySource { what: "URL" });
            }
            fetcher.fetch(url)
        }
        DocumentSource::Base64(data) => decode_base64(data),
        DocumentSource::Bytes { bytes, .. } => {
            if bytes.is_empty() {
                return Err(ViewerError::EmptySource {
                    what: "Document data",
                });
            }
            Ok(bytes.clone())
        }
    }
}

/// The live document together with the bytes it was parsed from
pub struct LoadedDocument {
    pub document: Box<dyn PdfDocument>,
    /// Original bytes, kept for download
    pub bytes: Vec<u8>,
    /// Info-dictionary title, or empty
    pub title: String,
    pub source: String,
}

impl LoadedDocument {
    pub fn page_count(&self) -> usize {
        self.document.page_count()
    }
}

impl std::fmt::Debug for LoadedDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedDocument")
            .field("source", &self.source)
            .field("title", &self.title)
            .field("pages", &self.document.page_count())
            .field("bytes", &self.bytes.len())
            .finish()
    }
}

/// Fetch, decode and parse a document
pub fn open_document(
    source: &DocumentSource,
    fetcher: &dyn SourceFetcher,
    parser: &dyn DocumentParser,
) -> Result<LoadedDocument> {
    let label = source.label();
    let bytes = read_source(source, fetcher)?;
    debug!("Read {} bytes from {label}", bytes.len());

    let document = parser.parse(&bytes)?;
    if document.page_count() == 0 {
        return Err(DocumentError::Invalid("document has no pages".to_string()).into());
    }

    let title = match document.title() {
        Ok(title) => title.unwrap_or_default(),
        Err(e) => {
            warn!("Could not read title of {label}: {e}");
            String::new()
        }
    };

    info!(
        "Opened {label}: {} pages, title {title:?}",
        document.page_count()
    );

    Ok(LoadedDocument {
        document,
        bytes,
        title,
        source: label,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{MemoryDocument, MemoryParser, StaticFetcher};
    use std::io::Write;
    use tempfile::NamedTempFile;

    const PDF: &[u8] = b"%PDF-1.7 three pages";

    fn parser() -> MemoryParser {
        MemoryParser::new().with_document(
            PDF,
            MemoryDocument::with_pages(&["a", "b", "c"]).with_title("Annual Report"),
        )
    }

    #[test]
    fn body_at_limit_is_accepted() {
        let body = std::io::Cursor::new(vec![7u8; 16]);
        assert_eq!(read_limited(body, 16, "http://host/a.pdf").unwrap().len(), 16);
    }

    #[test]
    fn body_over_limit_is_refused_not_truncated() {
        let body = std::io::Cursor::new(vec![7u8; 17]);
        let err = read_limited(body, 16, "http://host/a.pdf").unwrap_err();
        assert!(
            matches!(
                &err,
                ViewerError::Fetch { location, detail }
                    if location == "http://host/a.pdf" && detail.starts_with("document too large")
            ),
            "{err:?}"
        );
    }

    #[test]
    fn base64_tolerates_whitespace() {
        let encoded = STANDARD.encode(PDF);
        let (head, tail) = encoded.split_at(8);
        let wrapped = format!("  {head}\n{tail}\r\n");
        assert_eq!(decode_base64(&wrapped).unwrap(), PDF);
    }

    #[test]
    fn invalid_base64_is_a_decode_error() {
        assert!(matches!(
            decode_base64("not*base64!"),
            Err(ViewerError::Decode(_))
        ));
    }

    #[test]
    fn empty_sources_are_rejected() {
        let fetcher = StaticFetcher::new();
        assert!(matches!(
            read_source(&DocumentSource::Url("  ".into()), &fetcher),
            Err(ViewerError::EmptySource { what: "URL" })
        ));
        assert!(matches!(
            read_source(&DocumentSource::Base64(String::new()), &fetcher),
            Err(ViewerError::EmptySource { .. })
        ));
    }

    #[test]
    fn opens_document_with_title() {
        let fetcher = StaticFetcher::new().with_resource("https://example.com/r.pdf", PDF);
        let loaded = open_document(
            &DocumentSource::Url("https://example.com/r.pdf".into()),
            &fetcher,
            &parser(),
        )
        .unwrap();
        assert_eq!(loaded.page_count(), 3);
        assert_eq!(loaded.title, "Annual Report");
        assert_eq!(loaded.bytes, PDF);
    }

    #[test]
    fn unreadable_title_is_empty() {
        let parser = MemoryParser::new()
            .with_document(PDF, MemoryDocument::with_pages(&["a"]).failing_title());
        let loaded = open_document(
            &DocumentSource::Base64(STANDARD.encode(PDF)),
            &StaticFetcher::new(),
            &parser,
        )
        .unwrap();
        assert_eq!(loaded.title, "");
    }

    #[test]
    fn unparseable_bytes_fail() {
        let result = open_document(
            &DocumentSource::Bytes {
                name: "junk".into(),
                bytes: b"GIF89a".to_vec(),
            },
            &StaticFetcher::new(),
            &parser(),
        );
        assert!(matches!(result, Err(ViewerError::Document(_))));
    }

    #[test]
    fn empty_document_is_rejected() {
        let parser = MemoryParser::new().with_document(PDF, MemoryDocument::with_pages(&[]));
        let result = open_document(
            &DocumentSource::Base64(STANDARD.encode(PDF)),
            &StaticFetcher::new(),
            &parser,
        );
        assert!(matches!(result, Err(ViewerError::Document(_))));
    }

    #[test]
    fn missing_remote_is_a_fetch_error() {
        let result = read_source(
            &DocumentSource::Url("https://example.com/missing.pdf".into()),
            &StaticFetcher::new(),
        );
        assert!(matches!(result, Err(ViewerError::Fetch { .. })));
    }

    #[test]
    fn http_fetcher_reads_local_paths() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(PDF).unwrap();
        let path = file.path().to_string_lossy().into_owned();

        let fetcher = HttpFetcher::new();
        assert_eq!(fetcher.fetch(&path).unwrap(), PDF);
        assert_eq!(fetcher.fetch(&format!("file://{path}")).unwrap(), PDF);
        assert!(fetcher.fetch("/definitely/not/here.pdf").is_err());
    }
}
