//! Idempotent retrieval of corpus files into the local testdata directory.
//!
//! Nothing here ever re-fetches or rewrites an artifact that already exists locally, so a re-run
//! over a fully populated directory performs no network I/O at all.

use std::cell::OnceCell;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;

use crate::error::{Result, TestgenError};

/// Source of raw corpus bytes, addressed by a path relative to the corpus root.
pub trait Remote {
    /// Fetch `path`.
    ///
    /// Returns `Ok(None)` when the remote answered with a non-success status. Transport failures
    /// are errors.
    fn get(&self, path: &str) -> Result<Option<Vec<u8>>>;
}

impl<T: Remote + ?Sized> Remote for &T {
    fn get(&self, path: &str) -> Result<Option<Vec<u8>>> {
        (**self).get(path)
    }
}

/// [`Remote`] backed by plain HTTP GETs against a base URL.
///
/// The HTTP client is built on first use, so a run that finds everything locally never touches
/// the TLS stack.
pub struct HttpRemote {
    base_url: String,
    client: OnceCell<reqwest::blocking::Client>,
}

impl HttpRemote {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: OnceCell::new(),
        }
    }

    fn client(&self) -> Result<&reqwest::blocking::Client> {
        if let Some(client) = self.client.get() {
            return Ok(client);
        }
        let client = reqwest::blocking::Client::builder()
            .build()
            .map_err(TestgenError::Client)?;
        Ok(self.client.get_or_init(|| client))
    }

    pub fn url_for(&self, path: &str) -> String {
        join_url(&self.base_url, path)
    }
}

impl Remote for HttpRemote {
    fn get(&self, path: &str) -> Result<Option<Vec<u8>>> {
        let url = self.url_for(path);
        let http_err = |source| TestgenError::Http {
            url: url.clone(),
            source,
        };

        let resp = self.client()?.get(&url).send().map_err(http_err)?;
        if !resp.status().is_success() {
            tracing::warn!("{url} returned {}", resp.status());
            return Ok(None);
        }
        let body = resp.bytes().map_err(http_err)?;
        Ok(Some(body.to_vec()))
    }
}

/// Join `path` onto `base` with exactly one `/` between them.
pub fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Local mirror of the corpus files a run needs.
pub struct Cache<R> {
    dir: PathBuf,
    remote: R,
}

impl<R: Remote> Cache<R> {
    pub fn new(dir: impl Into<PathBuf>, remote: R) -> Self {
        Self {
            dir: dir.into(),
            remote,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Make sure `path` exists under the cache directory, downloading it if needed.
    ///
    /// Returns `false` if the remote does not have the file; no local file is created then.
    pub fn ensure_local(&self, path: &str) -> Result<bool> {
        let local = self.dir.join(path);
        if local.exists() {
            return Ok(true);
        }

        tracing::info!("downloading {path}");
        match self.remote.get(path)? {
            Some(bytes) => {
                write_atomic(&local, &bytes)?;
                Ok(true)
            }
            None => {
                tracing::warn!("could not download {path}");
                Ok(false)
            }
        }
    }

    /// Make sure `{name}.json` exists, unpacking it from `{name}.json.gz` on first use.
    ///
    /// The archive is left in place after unpacking. A corrupt archive is fatal.
    pub fn materialize(&self, name: &str) -> Result<bool> {
        let json_path = self.dir.join(format!("{name}.json"));
        if json_path.exists() {
            return Ok(true);
        }

        let gz_name = format!("{name}.json.gz");
        if !self.ensure_local(&gz_name)? {
            return Ok(false);
        }

        let gz_path = self.dir.join(&gz_name);
        tracing::info!("unpacking {gz_name}");
        let file = fs::File::open(&gz_path).map_err(|e| TestgenError::io(&gz_path, e))?;
        let mut decoded = Vec::new();
        GzDecoder::new(std::io::BufReader::new(file))
            .read_to_end(&mut decoded)
            .map_err(|source| TestgenError::Decompress {
                path: gz_path.clone(),
                source,
            })?;

        write_atomic(&json_path, &decoded)?;
        Ok(true)
    }
}

/// Write `data` to a temp file next to `path`, then rename it over `path`.
pub(crate) fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    let file_name = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("download");
    let tmp_path = parent.join(format!(".{file_name}.opcode_testgen.tmp"));

    fs::write(&tmp_path, data).map_err(|e| TestgenError::io(&tmp_path, e))?;

    // `rename` doesn't replace on Windows.
    #[cfg(windows)]
    {
        let _ = fs::remove_file(path);
    }

    fs::rename(&tmp_path, path).map_err(|e| TestgenError::io(path, e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_url_uses_single_separator() {
        assert_eq!(join_url("https://h/v2", "04.json.gz"), "https://h/v2/04.json.gz");
        assert_eq!(join_url("https://h/v2/", "04.json.gz"), "https://h/v2/04.json.gz");
        assert_eq!(join_url("https://h/v2/", "/metadata.json"), "https://h/v2/metadata.json");
    }

    #[test]
    fn write_atomic_replaces_and_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.json");

        write_atomic(&path, b"first").unwrap();
        write_atomic(&path, b"second").unwrap();

        assert_eq!(fs::read(&path).unwrap(), b"second");
        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("a.json")]);
    }
}
