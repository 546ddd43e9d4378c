use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::assets::decode::{LoadedImage, decode_any};
use crate::foundation::error::{CardError, CardResult};

/// Underlying fetch-and-decode primitive used by the asset cache.
///
/// Implementations must be thread-safe: the cache calls `load` from rayon workers and from
/// concurrent render threads. Deduplication and error memoization happen in the cache, so a loader
/// is expected to do real work on every call.
pub trait AssetLoader: Send + Sync {
    /// Fetch and decode the image named by `source`.
    fn load(&self, source: &str) -> CardResult<LoadedImage>;
}

impl<F> AssetLoader for F
where
    F: Fn(&str) -> CardResult<LoadedImage> + Send + Sync,
{
    fn load(&self, source: &str) -> CardResult<LoadedImage> {
        self(source)
    }
}

/// Options for [`SourceLoader`].
#[derive(Clone, Debug)]
pub struct SourceLoaderOpts {
    /// Directory relative file sources resolve against.
    pub asset_root: PathBuf,
    /// Overall timeout for one remote fetch.
    pub timeout: Duration,
    /// Maximum accepted body size, remote or local.
    pub max_bytes: u64,
}

impl Default for SourceLoaderOpts {
    fn default() -> Self {
        Self {
            asset_root: PathBuf::from("."),
            timeout: Duration::from_secs(10),
            max_bytes: 10 * 1024 * 1024,
        }
    }
}

/// Default loader: `http(s)://` sources over `ureq`, everything else from disk.
pub struct SourceLoader {
    opts: SourceLoaderOpts,
    agent: ureq::Agent,
}

impl std::fmt::Debug for SourceLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceLoader")
            .field("opts", &self.opts)
            .finish_non_exhaustive()
    }
}

impl Default for SourceLoader {
    fn default() -> Self {
        Self::new(SourceLoaderOpts::default())
    }
}

impl SourceLoader {
    pub fn new(opts: SourceLoaderOpts) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(opts.timeout).build();
        Self { opts, agent }
    }

    pub fn opts(&self) -> &SourceLoaderOpts {
        &self.opts
    }

    fn fetch_remote(&self, url: &str) -> CardResult<Vec<u8>> {
        let resp = self
            .agent
            .get(url)
            .call()
            .map_err(|e| CardError::asset(url, format!("fetch failed: {e}")))?;
        let mut bytes = Vec::new();
        resp.into_reader()
            .take(self.opts.max_bytes.saturating_add(1))
            .read_to_end(&mut bytes)
            .map_err(|e| CardError::asset(url, format!("read body: {e}")))?;
        self.check_len(url, bytes.len())?;
        Ok(bytes)
    }

    fn read_local(&self, source: &str) -> CardResult<Vec<u8>> {
        let path = self.local_path(source)?;
        let bytes = std::fs::read(&path)
            .map_err(|e| CardError::asset(source, format!("read '{}': {e}", path.display())))?;
        self.check_len(source, bytes.len())?;
        Ok(bytes)
    }

    fn local_path(&self, source: &str) -> CardResult<PathBuf> {
        let stripped = source.strip_prefix("file://").unwrap_or(source);
        let p = Path::new(stripped);
        if p.is_absolute() {
            return Ok(p.to_path_buf());
        }
        let rel = normalize_rel_path(stripped).map_err(|e| CardError::asset(source, e.to_string()))?;
        Ok(self.opts.asset_root.join(rel))
    }

    fn check_len(&self, source: &str, len: usize) -> CardResult<()> {
        if len as u64 > self.opts.max_bytes {
            return Err(CardError::asset(
                source,
                format!("asset exceeds {} bytes", self.opts.max_bytes),
            ));
        }
        Ok(())
    }
}

impl AssetLoader for SourceLoader {
    fn load(&self, source: &str) -> CardResult<LoadedImage> {
        if source.trim().is_empty() {
            return Err(CardError::asset(source, "empty asset source"));
        }
        let bytes = if is_remote(source) {
            self.fetch_remote(source)?
        } else {
            self.read_local(source)?
        };
        tracing::debug!(source, bytes = bytes.len(), "fetched asset");
        decode_any(source, &bytes).map_err(|e| match e {
            CardError::Asset { .. } => e,
            other => CardError::asset(source, format!("decode failed: {other}")),
        })
    }
}

/// Return `true` for `http://` and `https://` sources.
pub fn is_remote(source: &str) -> bool {
    let lower = source.get(..8).map(str::to_ascii_lowercase).unwrap_or_default();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Normalize a relative asset path.
///
/// The result uses `/` separators and drops `.` segments. Absolute paths and parent traversals
/// (`..`) are rejected so a relative source can never leave the asset root.
pub fn normalize_rel_path(source: &str) -> CardResult<String> {
    let s = source.replace('\\', "/");
    if s.is_empty() {
        return Err(CardError::validation("asset path must be non-empty"));
    }
    if s.starts_with('/') {
        return Err(CardError::validation("asset paths must be relative"));
    }

    let mut out = Vec::<&str>::new();
    for part in s.split('/') {
        match part {
            "" | "." => continue,
            ".." => return Err(CardError::validation("asset paths must not contain '..'")),
            _ => out.push(part),
        }
    }
    if out.is_empty() {
        return Err(CardError::validation("asset path must contain a file name"));
    }
    Ok(out.join("/"))
}

#[cfg(test)]
#[path = "../../tests/unit/assets/loader.rs"]
mod tests;
