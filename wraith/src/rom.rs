//! ROM images and the places they are fetched from.
//!
//! A ROM is fetched by name, once per play request. Every ROM lives at `<base>/<name>.nes`,
//! where the base is either an HTTP URL or a local directory.

use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};

use reqwest::{StatusCode, Url};
use tracing::debug;

/// File extension of every ROM image.
pub const ROM_EXTENSION: &str = "nes";

/// An immutable ROM image. It is handed to the core exactly once and not kept by the front end.
#[derive(Clone, PartialEq, Eq)]
pub struct Rom {
    name: String,
    bytes: Vec<u8>,
}

impl Rom {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

impl fmt::Debug for Rom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rom")
            .field("name", &self.name)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Fetching a ROM failed before it ever reached the core.
#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum RomFetchError {
    #[display("can not build a URL for ROM {name:?} under {base}")]
    Url { name: String, base: Url },
    #[display("request for {url} failed: {source}")]
    Request { url: Url, source: reqwest::Error },
    #[display("{url} answered with status {status}")]
    Status { url: Url, status: StatusCode },
    #[display("can not read {}: {source}", path.display())]
    Io { path: PathBuf, source: std::io::Error },
}

impl RomFetchError {
    /// The HTTP status, if the server answered with a non-success one.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            RomFetchError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// The configured ROM base is neither a usable URL nor a directory path.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("invalid ROM base {base:?}: {reason}")]
pub struct InvalidRomBase {
    base: String,
    reason: String,
}

/// Anything that can produce a ROM image by name.
///
/// Fetches run off the scheduler loop, so the returned future has to be `Send`.
pub trait RomSource: Send + Sync {
    fn fetch(&self, name: &str) -> impl Future<Output = Result<Rom, RomFetchError>> + Send;
}

/// Fetches `<base>/<name>.nes` with an HTTP GET.
#[derive(Debug, Clone)]
pub struct HttpRomSource {
    client: reqwest::Client,
    base: Url,
}

impl HttpRomSource {
    pub fn new(base: Url) -> Self {
        Self::with_client(reqwest::Client::new(), base)
    }

    pub fn with_client(client: reqwest::Client, base: Url) -> Self {
        Self { client, base }
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    /// The URL a ROM is fetched from. The name becomes a single, percent-encoded path segment.
    pub fn url_for(&self, name: &str) -> Option<Url> {
        let mut url = self.base.clone();
        {
            let mut segments = url.path_segments_mut().ok()?;
            segments
                .pop_if_empty()
                .push(&format!("{name}.{ROM_EXTENSION}"));
        }
        Some(url)
    }
}

impl RomSource for HttpRomSource {
    async fn fetch(&self, name: &str) -> Result<Rom, RomFetchError> {
        let url = self.url_for(name).ok_or_else(|| RomFetchError::Url {
            name: name.to_owned(),
            base: self.base.clone(),
        })?;
        debug!(%url, "Fetching ROM");
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|source| RomFetchError::Request {
                url: url.clone(),
                source,
            })?;
        let status = response.status();
        if !status.is_success() {
            return Err(RomFetchError::Status { url, status });
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|source| RomFetchError::Request { url, source })?;
        Ok(Rom::new(name, bytes.to_vec()))
    }
}

/// Reads `<dir>/<name>.nes` from the local file system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirRomSource {
    dir: PathBuf,
}

impl DirRomSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.{ROM_EXTENSION}"))
    }

    /// Lists every `.nes` file in the directory by its stem.
    pub async fn list(&self) -> Result<RomCatalog, RomFetchError> {
        let io_err = |source| RomFetchError::Io {
            path: self.dir.clone(),
            source,
        };
        let mut entries = tokio::fs::read_dir(&self.dir).await.map_err(io_err)?;
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(io_err)? {
            let path = entry.path();
            let is_rom = path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case(ROM_EXTENSION));
            if !is_rom {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                names.push(stem.to_owned());
            }
        }
        Ok(RomCatalog::new(names))
    }
}

impl RomSource for DirRomSource {
    async fn fetch(&self, name: &str) -> Result<Rom, RomFetchError> {
        let path = self.path_for(name);
        debug!(path = %path.display(), "Reading ROM");
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Rom::new(name, bytes)),
            Err(source) => Err(RomFetchError::Io { path, source }),
        }
    }
}

/// A ROM source picked from a configured base: URLs are fetched over HTTP, anything else is
/// treated as a directory.
#[derive(Debug, Clone)]
pub enum RomLocation {
    Http(HttpRomSource),
    Dir(DirRomSource),
}

impl RomLocation {
    pub fn parse(base: &str) -> Result<Self, InvalidRomBase> {
        let invalid = |reason: String| InvalidRomBase {
            base: base.to_owned(),
            reason,
        };
        if base.trim().is_empty() {
            return Err(invalid("the base is empty".to_owned()));
        }
        if base.starts_with("http://") || base.starts_with("https://") {
            let url = Url::parse(base).map_err(|err| invalid(err.to_string()))?;
            if url.cannot_be_a_base() {
                return Err(invalid("the URL can not have a path".to_owned()));
            }
            Ok(Self::Http(HttpRomSource::new(url)))
        } else {
            Ok(Self::Dir(DirRomSource::new(base)))
        }
    }

    /// Builds the ROM list for the selection control. A non-empty configured list wins; otherwise
    /// a directory is scanned. HTTP bases have no listing, so they yield an empty catalog.
    pub async fn catalog(&self, configured: &[String]) -> Result<RomCatalog, RomFetchError> {
        if !configured.is_empty() {
            return Ok(RomCatalog::new(configured.iter().cloned()));
        }
        match self {
            RomLocation::Http(_) => Ok(RomCatalog::default()),
            RomLocation::Dir(dir) => dir.list().await,
        }
    }
}

impl RomSource for RomLocation {
    async fn fetch(&self, name: &str) -> Result<Rom, RomFetchError> {
        match self {
            RomLocation::Http(http) => http.fetch(name).await,
            RomLocation::Dir(dir) => dir.fetch(name).await,
        }
    }
}

/// The names of the available ROMs, sorted and without duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RomCatalog {
    names: Vec<String>,
}

impl RomCatalog {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut names: Vec<String> = names.into_iter().map(Into::into).collect();
        names.sort();
        names.dedup();
        Self { names }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.binary_search_by(|n| n.as_str().cmp(name)).is_ok()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }
}
