// 📥 Loaders - Data acquisition
// Resolve a configured source (URL, local file, ZIP archive) into a readable handle
//
// Every loader implements DataSource. Loaders that materialize files keep
// them in a WorkDir that is removed on cleanup() or when the loader drops.

use crate::error::{ImportError, Result};
use crate::pattern::{select_one, MemberPattern};
use log::{debug, info};
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, Cursor, Read, Write};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

// ============================================================================
// PAYLOAD
// ============================================================================

/// What a loader hands to a reader: buffered text or an open stream.
pub enum Payload {
    Text(String),
    Stream(Box<dyn BufRead>),
}

impl Payload {
    /// Whole payload as text (streams are read to the end as UTF-8).
    pub fn into_text(self) -> Result<String> {
        match self {
            Payload::Text(text) => Ok(text),
            Payload::Stream(mut stream) => {
                let mut text = String::new();
                stream.read_to_string(&mut text)?;
                Ok(text)
            }
        }
    }

    /// Payload as a byte stream.
    pub fn into_stream(self) -> Box<dyn BufRead> {
        match self {
            Payload::Text(text) => Box::new(Cursor::new(text.into_bytes())),
            Payload::Stream(stream) => stream,
        }
    }
}

impl std::fmt::Debug for Payload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Payload::Text(text) => write!(f, "Payload::Text({} bytes)", text.len()),
            Payload::Stream(_) => f.write_str("Payload::Stream"),
        }
    }
}

// ============================================================================
// DATA SOURCE TRAIT
// ============================================================================

/// DataSource - how an importer obtains its input
pub trait DataSource {
    /// Acquire the data handle. Called once per run, before any wipe.
    fn get_data(&mut self) -> Result<Payload>;

    /// Resolve the local working file, for loaders that have one.
    fn get_file(&mut self) -> Result<PathBuf> {
        Err(ImportError::NoWorkFile)
    }

    /// Whether the working file is already resolved.
    fn has_file(&self) -> bool {
        false
    }

    /// Release temporary resources. Must be safe to call more than once.
    fn cleanup(&mut self) -> Result<()> {
        Ok(())
    }
}

// ============================================================================
// FILE OPTIONS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    Binary,
    Text,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Utf8,
    Latin1,
}

impl Encoding {
    pub fn decode(&self, bytes: Vec<u8>) -> Result<String> {
        match self {
            Encoding::Utf8 => String::from_utf8(bytes)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e).into()),
            // Latin-1 maps each byte to the code point of the same value
            Encoding::Latin1 => Ok(bytes.into_iter().map(char::from).collect()),
        }
    }
}

/// How a local working file is opened.
#[derive(Debug, Clone)]
pub struct FileOptions {
    pub open_mode: OpenMode,
    pub encoding: Encoding,
    /// Leading lines to discard (copyright notices, column headers)
    pub skip_lines: usize,
}

impl Default for FileOptions {
    fn default() -> Self {
        FileOptions {
            open_mode: OpenMode::Binary,
            encoding: Encoding::Utf8,
            skip_lines: 0,
        }
    }
}

/// Open `path` according to `options`.
pub fn open_file(path: &Path, options: &FileOptions) -> Result<Payload> {
    debug!("Opening {}", path.display());
    let file = File::open(path)?;

    let mut stream: Box<dyn BufRead> = match (options.open_mode, options.encoding) {
        (OpenMode::Text, Encoding::Latin1) => {
            let mut bytes = Vec::new();
            BufReader::new(file).read_to_end(&mut bytes)?;
            let text = Encoding::Latin1.decode(bytes)?;
            Box::new(Cursor::new(text.into_bytes()))
        }
        _ => Box::new(BufReader::new(file)),
    };

    let mut discarded = Vec::new();
    for _ in 0..options.skip_lines {
        discarded.clear();
        if stream.read_until(b'\n', &mut discarded)? == 0 {
            break;
        }
    }

    Ok(Payload::Stream(stream))
}

// ============================================================================
// WORK DIRECTORY
// ============================================================================

/// Temporary directory created on first use and removed on close or drop.
#[derive(Debug, Default)]
pub struct WorkDir {
    basedir: Option<PathBuf>,
    dir: Option<TempDir>,
}

impl WorkDir {
    /// `basedir` of None means the system temp directory.
    pub fn new(basedir: Option<PathBuf>) -> Self {
        WorkDir { basedir, dir: None }
    }

    pub fn path(&mut self) -> Result<PathBuf> {
        if let Some(dir) = &self.dir {
            return Ok(dir.path().to_path_buf());
        }

        let dir = match &self.basedir {
            Some(base) => {
                fs::create_dir_all(base)?;
                tempfile::Builder::new().prefix("geodata-").tempdir_in(base)?
            }
            None => tempfile::Builder::new().prefix("geodata-").tempdir()?,
        };
        debug!("Created work directory {}", dir.path().display());
        let path = dir.path().to_path_buf();
        self.dir = Some(dir);
        Ok(path)
    }

    pub fn exists(&self) -> bool {
        self.dir.is_some()
    }

    /// Remove the directory and everything below it.
    pub fn close(&mut self) -> Result<()> {
        if let Some(dir) = self.dir.take() {
            info!("Cleaning up {}", dir.path().display());
            dir.close()?;
        }
        Ok(())
    }
}

// ============================================================================
// HTTP
// ============================================================================

fn http_get(url: &str) -> Result<reqwest::blocking::Response> {
    let response = reqwest::blocking::get(url).map_err(|source| ImportError::Fetch {
        url: url.to_string(),
        source,
    })?;

    let status = response.status();
    if !status.is_success() {
        return Err(ImportError::HttpStatus {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    Ok(response)
}

/// Stream `url` into a new file inside `dir`.
fn download(url: &str, dir: &Path, chunk_size: usize) -> Result<PathBuf> {
    info!("Downloading {}", url);
    let mut response = http_get(url)?;

    let (mut out, path) = tempfile::Builder::new()
        .prefix("download-")
        .tempfile_in(dir)?
        .keep()
        .map_err(|e| e.error)?;

    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; chunk_size.max(1)];
    let mut total: u64 = 0;

    loop {
        let read = response.read(&mut buffer)?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
        out.write_all(&buffer[..read])?;
        total += read as u64;
    }
    out.flush()?;

    info!(
        "Downloaded {} bytes (sha256 {:x})",
        total,
        hasher.finalize()
    );

    Ok(path)
}

/// HttpLoader - one GET, whole body as text
#[derive(Debug, Clone)]
pub struct HttpLoader {
    pub url: String,
}

impl HttpLoader {
    pub fn new(url: impl Into<String>) -> Self {
        HttpLoader { url: url.into() }
    }
}

impl DataSource for HttpLoader {
    fn get_data(&mut self) -> Result<Payload> {
        info!("Fetching {}", self.url);
        let response = http_get(&self.url)?;
        let text = response.text().map_err(|source| ImportError::Fetch {
            url: self.url.clone(),
            source,
        })?;
        Ok(Payload::Text(text))
    }
}

// ============================================================================
// LOCAL FILE
// ============================================================================

/// FileLoader - a file that already exists locally
#[derive(Debug, Clone)]
pub struct FileLoader {
    workfile: PathBuf,
    pub options: FileOptions,
}

impl FileLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileLoader {
            workfile: path.into(),
            options: FileOptions::default(),
        }
    }

    pub fn with_options(mut self, options: FileOptions) -> Self {
        self.options = options;
        self
    }
}

impl DataSource for FileLoader {
    fn get_data(&mut self) -> Result<Payload> {
        open_file(&self.workfile, &self.options)
    }

    fn get_file(&mut self) -> Result<PathBuf> {
        Ok(self.workfile.clone())
    }

    fn has_file(&self) -> bool {
        true
    }
}

// ============================================================================
// DOWNLOADER
// ============================================================================

/// Downloader - fetch a URL into a temporary directory and open it as a file
#[derive(Debug)]
pub struct Downloader {
    pub url: String,
    pub options: FileOptions,
    pub chunk_size: usize,
    workdir: WorkDir,
    workfile: Option<PathBuf>,
}

impl Downloader {
    pub fn new(url: impl Into<String>) -> Self {
        Downloader {
            url: url.into(),
            options: FileOptions::default(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            workdir: WorkDir::default(),
            workfile: None,
        }
    }

    pub fn with_options(mut self, options: FileOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_basedir(mut self, basedir: Option<PathBuf>) -> Self {
        self.workdir = WorkDir::new(basedir);
        self
    }
}

impl DataSource for Downloader {
    fn get_data(&mut self) -> Result<Payload> {
        let path = self.get_file()?;
        open_file(&path, &self.options)
    }

    fn get_file(&mut self) -> Result<PathBuf> {
        if let Some(path) = &self.workfile {
            return Ok(path.clone());
        }
        let dir = self.workdir.path()?;
        let path = download(&self.url, &dir, self.chunk_size)?;
        self.workfile = Some(path.clone());
        Ok(path)
    }

    fn has_file(&self) -> bool {
        self.workfile.is_some()
    }

    fn cleanup(&mut self) -> Result<()> {
        self.workdir.close()
    }
}

// ============================================================================
// ZIP ARCHIVES
// ============================================================================

pub const DEFAULT_CHUNK_SIZE: usize = 4096;

/// Where the archive comes from.
#[derive(Debug, Clone)]
pub enum ArchiveSource {
    Local(PathBuf),
    Remote(String),
}

/// ZipLoader - extract members matching `extract`, work on the one matching `pattern`
#[derive(Debug)]
pub struct ZipLoader {
    pub source: ArchiveSource,
    pub extract: MemberPattern,
    pub pattern: MemberPattern,
    pub options: FileOptions,
    pub chunk_size: usize,
    workdir: WorkDir,
    archive: Option<PathBuf>,
    extracted: Option<Vec<String>>,
    workfile: Option<PathBuf>,
}

impl ZipLoader {
    pub fn new(source: ArchiveSource, pattern: MemberPattern) -> Self {
        ZipLoader {
            source,
            extract: MemberPattern::any(),
            pattern,
            options: FileOptions::default(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            workdir: WorkDir::default(),
            archive: None,
            extracted: None,
            workfile: None,
        }
    }

    /// Archive already on disk.
    pub fn local(archive: impl Into<PathBuf>, pattern: MemberPattern) -> Self {
        Self::new(ArchiveSource::Local(archive.into()), pattern)
    }

    /// Archive fetched from `url` into the work directory.
    pub fn download(url: impl Into<String>, pattern: MemberPattern) -> Self {
        Self::new(ArchiveSource::Remote(url.into()), pattern)
    }

    pub fn with_extract(mut self, extract: MemberPattern) -> Self {
        self.extract = extract;
        self
    }

    pub fn with_options(mut self, options: FileOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_basedir(mut self, basedir: Option<PathBuf>) -> Self {
        self.workdir = WorkDir::new(basedir);
        self
    }

    fn archive_path(&mut self) -> Result<PathBuf> {
        if let Some(path) = &self.archive {
            return Ok(path.clone());
        }
        let path = match &self.source {
            ArchiveSource::Local(path) => path.clone(),
            ArchiveSource::Remote(url) => {
                let dir = self.workdir.path()?;
                download(url, &dir, self.chunk_size)?
            }
        };
        self.archive = Some(path.clone());
        Ok(path)
    }

    /// Extract matching members (once) and return their archive names.
    pub fn list_files(&mut self) -> Result<&[String]> {
        if self.extracted.is_none() {
            let archive = self.archive_path()?;
            let dir = self.workdir.path()?;
            let names = extract_members(&archive, &self.extract, &dir)?;
            self.extracted = Some(names);
        }
        Ok(self.extracted.as_deref().unwrap_or_default())
    }
}

impl DataSource for ZipLoader {
    fn get_data(&mut self) -> Result<Payload> {
        let path = self.get_file()?;
        open_file(&path, &self.options)
    }

    fn get_file(&mut self) -> Result<PathBuf> {
        if let Some(path) = &self.workfile {
            return Ok(path.clone());
        }

        let pattern = self.pattern.clone();
        let chosen = {
            let names = self.list_files()?;
            select_one(&pattern, names.iter().map(String::as_str))?.to_string()
        };
        let path = self.workdir.path()?.join(&chosen);
        info!("Using {}", chosen);

        self.workfile = Some(path.clone());
        Ok(path)
    }

    fn has_file(&self) -> bool {
        self.workfile.is_some()
    }

    fn cleanup(&mut self) -> Result<()> {
        self.workdir.close()
    }
}

/// Extract every member of `archive` matching `extract` into `dir`.
pub fn extract_members(archive: &Path, extract: &MemberPattern, dir: &Path) -> Result<Vec<String>> {
    let zip_error = |source| ImportError::Archive {
        path: archive.to_path_buf(),
        source,
    };

    let file = File::open(archive)?;
    let mut zip = zip::ZipArchive::new(BufReader::new(file)).map_err(zip_error)?;
    let mut extracted = Vec::new();

    for index in 0..zip.len() {
        let mut member = zip.by_index(index).map_err(zip_error)?;
        let name = member.name().to_string();

        if member.is_dir() || !extract.matches(&name) {
            continue;
        }

        let relative = member
            .enclosed_name()
            .ok_or_else(|| ImportError::UnsafeMember(name.clone()))?;
        let target = dir.join(relative);

        info!("Extracting {}", name);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut out = File::create(&target)?;
        io::copy(&mut member, &mut out)?;

        extracted.push(name);
    }

    debug!("Extracted {} members from {}", extracted.len(), archive.display());
    Ok(extracted)
}
