use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result, anyhow};
use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::header::{ETAG, IF_MODIFIED_SINCE, IF_NONE_MATCH, LAST_MODIFIED};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

const CACHE_VERSION: u32 = 1;
const CACHE_DIR: &str = "shot_leadup";
const CACHE_FILE: &str = "open_data_cache.json";

static CACHE: Mutex<Option<ResponseCache>> = Mutex::new(None);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchMode {
    /// Revalidate cached bodies with `If-None-Match` / `If-Modified-Since`.
    #[default]
    Revalidate,
    /// Never touch the network; a cache miss is an error.
    Offline,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct CacheFile {
    version: u32,
    entries: HashMap<String, CachedBody>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CachedBody {
    body: String,
    etag: Option<String>,
    last_modified: Option<String>,
    fetched_at: u64,
}

/// In-memory view of one cache file. `path: None` keeps entries for the
/// process only.
struct ResponseCache {
    path: Option<PathBuf>,
    file: CacheFile,
}

impl ResponseCache {
    fn open(path: Option<PathBuf>) -> Self {
        let file = path.as_deref().map(load_cache_file).unwrap_or_default();
        Self { path, file }
    }

    fn get(&self, url: &str) -> Option<&CachedBody> {
        self.file.entries.get(url)
    }

    fn store(&mut self, url: &str, mut entry: CachedBody) {
        entry.fetched_at = unix_now();
        self.file.version = CACHE_VERSION;
        self.file.entries.insert(url.to_string(), entry);
        if let Err(err) = self.save() {
            warn!(error = %err, "could not persist response cache");
        }
    }

    fn save(&self) -> Result<()> {
        let Some(path) = self.path.as_deref() else {
            return Ok(());
        };
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
        }
        let tmp = path.with_extension("json.tmp");
        let json = serde_json::to_string(&self.file).context("serialize response cache")?;
        fs::write(&tmp, json).context("write response cache")?;
        fs::rename(&tmp, path).context("swap response cache")?;
        Ok(())
    }
}

/// Fetches `url` as text through the on-disk response cache.
pub fn fetch_json_cached(client: &Client, url: &str, mode: FetchMode) -> Result<String> {
    let mut guard = lock_cache();
    let cache = guard.get_or_insert_with(|| ResponseCache::open(cache_path()));
    fetch_with_cache(cache, client, url, mode)
}

fn fetch_with_cache(
    cache: &mut ResponseCache,
    client: &Client,
    url: &str,
    mode: FetchMode,
) -> Result<String> {
    let cached = cache.get(url).cloned();

    if mode == FetchMode::Offline {
        return cached
            .map(|entry| entry.body)
            .ok_or_else(|| anyhow!("offline and {url} is not cached"));
    }

    let mut req = client.get(url);
    if let Some(entry) = cached.as_ref() {
        if let Some(etag) = entry.etag.as_ref() {
            req = req.header(IF_NONE_MATCH, etag);
        }
        if let Some(last_modified) = entry.last_modified.as_ref() {
            req = req.header(IF_MODIFIED_SINCE, last_modified);
        }
    }

    let resp = req.send().with_context(|| format!("GET {url}"))?;
    let status = resp.status();
    if status == StatusCode::NOT_MODIFIED {
        let Some(entry) = cached else {
            return Err(anyhow!("{url}: 304 without a cached body"));
        };
        debug!(url, "not modified");
        let body = entry.body.clone();
        cache.store(url, entry);
        return Ok(body);
    }

    let etag = header_string(resp.headers(), ETAG);
    let last_modified = header_string(resp.headers(), LAST_MODIFIED);
    let body = resp.text().context("failed reading body")?;
    if !status.is_success() {
        return Err(anyhow!("{url}: http {status}"));
    }

    cache.store(
        url,
        CachedBody {
            body: body.clone(),
            etag,
            last_modified,
            fetched_at: unix_now(),
        },
    );
    Ok(body)
}

pub fn app_cache_dir() -> Option<PathBuf> {
    if let Ok(base) = std::env::var("XDG_CACHE_HOME")
        && !base.trim().is_empty()
    {
        return Some(PathBuf::from(base).join(CACHE_DIR));
    }
    let home = std::env::var("HOME").ok()?;
    if home.trim().is_empty() {
        return None;
    }
    Some(PathBuf::from(home).join(".cache").join(CACHE_DIR))
}

fn lock_cache() -> MutexGuard<'static, Option<ResponseCache>> {
    CACHE.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn header_string(headers: &reqwest::header::HeaderMap, name: reqwest::header::HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

fn load_cache_file(path: &Path) -> CacheFile {
    let Ok(raw) = fs::read_to_string(path) else {
        return CacheFile::default();
    };
    match serde_json::from_str::<CacheFile>(&raw) {
        Ok(cache) if cache.version == CACHE_VERSION => cache,
        _ => CacheFile::default(),
    }
}

fn cache_path() -> Option<PathBuf> {
    app_cache_dir().map(|dir| dir.join(CACHE_FILE))
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::path::PathBuf;
    use std::thread::{self, JoinHandle};

    use reqwest::blocking::Client;

    use super::{CachedBody, FetchMode, ResponseCache, fetch_with_cache};

    // Serves one canned response and hands back the raw request text.
    fn serve_once(response: String) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind local port");
        let addr = listener.local_addr().expect("local addr");
        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().expect("accept connection");
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = stream.read(&mut buf).expect("read request");
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            stream.write_all(response.as_bytes()).expect("write response");
            String::from_utf8_lossy(&request).to_ascii_lowercase()
        });
        (format!("http://{addr}/matches/2/44.json"), handle)
    }

    fn client() -> Client {
        Client::builder().no_proxy().build().expect("test client")
    }

    fn cached(body: &str, etag: Option<&str>) -> CachedBody {
        CachedBody {
            body: body.to_string(),
            etag: etag.map(str::to_string),
            last_modified: None,
            fetched_at: 0,
        }
    }

    fn cache_file(dir: &tempfile::TempDir) -> PathBuf {
        dir.path().join("cache").join("open_data_cache.json")
    }

    #[test]
    fn offline_miss_is_an_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let mut cache = ResponseCache::open(Some(cache_file(&dir)));
        let err = fetch_with_cache(
            &mut cache,
            &client(),
            "https://example.invalid/x.json",
            FetchMode::Offline,
        )
        .unwrap_err();
        assert!(err.to_string().contains("is not cached"));
    }

    #[test]
    fn offline_hit_reads_persisted_body() {
        let dir = tempfile::tempdir().expect("temp dir");
        let url = "https://example.invalid/lineups/7.json";
        {
            let mut cache = ResponseCache::open(Some(cache_file(&dir)));
            cache.store(url, cached("[]", Some("\"abc\"")));
        }

        let mut reopened = ResponseCache::open(Some(cache_file(&dir)));
        let body = fetch_with_cache(&mut reopened, &client(), url, FetchMode::Offline)
            .expect("cached body");
        assert_eq!(body, "[]");
    }

    #[test]
    fn not_modified_serves_cached_body() {
        let (url, server) = serve_once(
            "HTTP/1.1 304 Not Modified\r\nConnection: close\r\nContent-Length: 0\r\n\r\n".to_string(),
        );
        let mut cache = ResponseCache::open(None);
        cache.store(&url, cached("[{\"match_id\": 1}]", Some("\"v1\"")));

        let body = fetch_with_cache(&mut cache, &client(), &url, FetchMode::Revalidate)
            .expect("revalidated body");
        assert_eq!(body, "[{\"match_id\": 1}]");

        let request = server.join().expect("server thread");
        assert!(request.contains("if-none-match: \"v1\""));
    }

    #[test]
    fn fresh_response_is_cached_with_etag() {
        let body = "[{\"match_id\": 2}]";
        let (url, server) = serve_once(format!(
            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nETag: \"v2\"\r\nConnection: close\r\nContent-Length: {}\r\n\r\n{body}",
            body.len()
        ));
        let mut cache = ResponseCache::open(None);

        let fetched = fetch_with_cache(&mut cache, &client(), &url, FetchMode::Revalidate)
            .expect("fresh body");
        assert_eq!(fetched, body);
        server.join().expect("server thread");

        let entry = cache.get(&url).expect("stored entry");
        assert_eq!(entry.etag.as_deref(), Some("\"v2\""));
        let offline = fetch_with_cache(&mut cache, &client(), &url, FetchMode::Offline)
            .expect("offline body");
        assert_eq!(offline, body);
    }
}
