use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, instrument};

use crate::zsun::riders::error::TransportError;

/// Supplies raw payload text. Implementations classify their own failures
/// into [`TransportError`]; callers never look past that.
pub trait Transport {
    fn fetch(&self) -> std::result::Result<String, TransportError>;
}

impl<F> Transport for F
where
    F: Fn() -> std::result::Result<String, TransportError>,
{
    fn fetch(&self) -> std::result::Result<String, TransportError> {
        self()
    }
}

/// Reads the payload from a local file.
#[derive(Debug, Clone)]
pub struct FileTransport {
    path: PathBuf,
}

impl FileTransport {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Transport for FileTransport {
    #[instrument(level = "debug", skip_all, fields(path = %self.path.display()))]
    fn fetch(&self) -> std::result::Result<String, TransportError> {
        let text = fs::read_to_string(&self.path).map_err(|err| classify(&self.path, err))?;
        debug!(bytes = text.len(), "payload read");
        Ok(text)
    }
}

fn classify(path: &Path, err: io::Error) -> TransportError {
    let source = format!("{}: {err}", path.display());
    match err.kind() {
        io::ErrorKind::NotFound => TransportError::NotFound(source),
        io::ErrorKind::PermissionDenied => TransportError::AccessDenied(source),
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TransportError::Timeout(source),
        _ => TransportError::MalformedResponse(source),
    }
}
