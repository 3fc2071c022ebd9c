//! Product/brand image resolution.
//!
//! Lookup order: local cache directory `<base>/<legacy_id>/<filename>`
//! (exact name, then a case-insensitive scan), then an HTTP download from
//! the retired site, writing the bytes back into the cache for the next
//! run. Every failure degrades to "no image"; nothing here can fail a row.

use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::blocking::Client;
use tracing::{debug, warn};

pub struct ImageStore {
    base_path: Option<PathBuf>,
    site_url: String,
    client: Option<Client>,
}

impl ImageStore {
    pub fn new(base_path: Option<PathBuf>, site_url: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .user_agent("Mozilla/5.0")
            .build()
            .map_err(|error| {
                warn!(%error, "http client unavailable, image downloads disabled");
                error
            })
            .ok();
        Self {
            base_path: base_path.filter(|path| !path.as_os_str().is_empty()),
            site_url: site_url.into().trim_end_matches('/').to_string(),
            client,
        }
    }

    /// An image store that never touches the network or the filesystem.
    pub fn disabled() -> Self {
        Self {
            base_path: None,
            site_url: String::new(),
            client: None,
        }
    }

    /// Fetch image bytes for a legacy record, or `None`.
    pub fn fetch(&self, url: &str, legacy_id: &str) -> Option<Vec<u8>> {
        let url = url.trim();
        if url.is_empty() || url == "nan" {
            return None;
        }
        let filename = filename_from_url(url);

        let local_path = self.local_path(legacy_id, &filename);
        if let Some(path) = &local_path
            && let Some(bytes) = read_cached(path)
        {
            debug!(path = %path.display(), "image cache hit");
            return Some(bytes);
        }

        let bytes = self.download(url, legacy_id)?;
        if let Some(path) = &local_path {
            cache_write(path, &bytes);
        }
        Some(bytes)
    }

    fn local_path(&self, legacy_id: &str, filename: &str) -> Option<PathBuf> {
        let base = self.base_path.as_ref()?;
        if legacy_id.is_empty() || filename.is_empty() {
            return None;
        }
        Some(base.join(legacy_id).join(filename))
    }

    fn download(&self, url: &str, legacy_id: &str) -> Option<Vec<u8>> {
        let client = self.client.as_ref()?;
        let target = self.absolute_url(url, legacy_id)?;
        match client.get(&target).send() {
            Ok(response) => {
                let is_image = response
                    .headers()
                    .get(reqwest::header::CONTENT_TYPE)
                    .and_then(|value| value.to_str().ok())
                    .is_some_and(|value| value.contains("image"));
                if !response.status().is_success() || !is_image {
                    warn!(url = %target, status = %response.status(), "image download rejected");
                    return None;
                }
                match response.bytes() {
                    Ok(bytes) => Some(bytes.to_vec()),
                    Err(error) => {
                        warn!(url = %target, %error, "image body read failed");
                        None
                    }
                }
            }
            Err(error) => {
                warn!(url = %target, %error, "image download failed");
                None
            }
        }
    }

    /// Absolute download URL: pass absolute URLs through, resolve relative
    /// legacy paths against the configured site, repairing the export's
    /// empty-directory artifact (`/product//`) with the legacy id.
    fn absolute_url(&self, url: &str, legacy_id: &str) -> Option<String> {
        if url.starts_with("http") {
            return Some(url.to_string());
        }
        if self.site_url.is_empty() {
            return None;
        }
        let mut clean = url.trim_start_matches('.').trim().replace("//", "/");
        if !legacy_id.is_empty() && url.contains("/product//") {
            clean = clean.replace("/product/", &format!("/product/{legacy_id}/"));
        }
        Some(format!("{}/{}", self.site_url, clean.trim_start_matches('/')))
    }
}

/// Pull the real file name out of a legacy image URL. Dynamic URLs carry
/// it in the `src` query parameter; plain URLs end with it.
fn filename_from_url(url: &str) -> String {
    let parsed = reqwest::Url::parse(url).ok().or_else(|| {
        reqwest::Url::parse(&format!(
            "http://legacy.invalid/{}",
            url.trim_start_matches('/')
        ))
        .ok()
    });
    if let Some(parsed) = parsed {
        if let Some((_, src)) = parsed.query_pairs().find(|(key, _)| key == "src") {
            let name = src.rsplit('/').next().unwrap_or("").trim().to_string();
            if name.len() >= 3 {
                return name;
            }
        }
        let name = parsed
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .unwrap_or("")
            .trim()
            .to_string();
        if name.len() >= 3 {
            return name;
        }
    }
    "image.jpg".to_string()
}

fn read_cached(path: &Path) -> Option<Vec<u8>> {
    if path.exists() {
        return std::fs::read(path).ok();
    }
    // Case-insensitive fallback scan over the legacy id directory.
    let dir = path.parent()?;
    let wanted = path.file_name()?.to_string_lossy().to_lowercase();
    let entries = std::fs::read_dir(dir).ok()?;
    for entry in entries.flatten() {
        if entry.file_name().to_string_lossy().to_lowercase() == wanted {
            return std::fs::read(entry.path()).ok();
        }
    }
    None
}

fn cache_write(path: &Path, bytes: &[u8]) {
    if let Some(dir) = path.parent()
        && let Err(error) = std::fs::create_dir_all(dir)
    {
        warn!(path = %path.display(), %error, "image cache directory not created");
        return;
    }
    if let Err(error) = std::fs::write(path, bytes) {
        warn!(path = %path.display(), %error, "image cache write failed");
    }
}
