//! Reader/cache for the Claude debug-log sidecar (§4.3).
//!
//! `<home>/debug/<sessionId>.txt` can grow large, and the line the core cares about is the
//! *last* `autocompact: tokens=… threshold=…` entry, so the reader works backward from the
//! end of the file with exponentially widening windows instead of reading the whole thing.

use std::collections::HashMap;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, Instant, SystemTime};

use once_cell::sync::Lazy;

const TAIL_WINDOWS: &[u64] = &[128 * 1024, 512 * 1024, 2 * 1024 * 1024, 4 * 1024 * 1024];
const NEGATIVE_TTL: Duration = Duration::from_secs(5);

/// Override values read from the sidecar, applied on top of transcript-derived usage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutocompactOverride {
    pub tokens: u64,
    pub threshold: u64,
}

#[derive(Clone)]
struct CacheEntry {
    key: (SystemTime, u64),
    value: Option<AutocompactOverride>,
    cached_at: Instant,
}

static CACHE: Lazy<Mutex<HashMap<PathBuf, CacheEntry>>> = Lazy::new(|| Mutex::new(HashMap::new()));

/// Look up the current autocompaction override for a session, consulting (and updating) the
/// process-wide cache keyed by `(home, sessionId)`.
pub fn lookup(home: &Path, session_id: &str) -> Option<AutocompactOverride> {
    let path = home.join("debug").join(format!("{session_id}.txt"));
    let metadata = std::fs::metadata(&path);

    if let Some(cached) = cached_value(&path, &metadata) {
        return cached;
    }

    let (value, key) = match &metadata {
        Ok(meta) => {
            let key = (
                meta.modified().unwrap_or(SystemTime::UNIX_EPOCH),
                meta.len(),
            );
            (read_last_autocompact(&path, meta.len()), key)
        }
        Err(_) => (None, (SystemTime::UNIX_EPOCH, 0)),
    };

    CACHE.lock().unwrap().insert(
        path,
        CacheEntry {
            key,
            value,
            cached_at: Instant::now(),
        },
    );

    value
}

fn cached_value(
    path: &Path,
    metadata: &std::io::Result<std::fs::Metadata>,
) -> Option<Option<AutocompactOverride>> {
    let cache = CACHE.lock().unwrap();
    let entry = cache.get(path)?;

    match metadata {
        Ok(meta) => {
            let current_key = (
                meta.modified().unwrap_or(SystemTime::UNIX_EPOCH),
                meta.len(),
            );
            (entry.key == current_key).then_some(entry.value)
        }
        Err(_) => {
            (entry.value.is_none() && entry.cached_at.elapsed() < NEGATIVE_TTL).then_some(None)
        }
    }
}

fn read_last_autocompact(path: &Path, file_size: u64) -> Option<AutocompactOverride> {
    let mut file = std::fs::File::open(path).ok()?;

    for &window in TAIL_WINDOWS {
        let window = window.min(file_size);
        let start = file_size.saturating_sub(window);

        file.seek(SeekFrom::Start(start)).ok()?;
        let mut buf = vec![0u8; (file_size - start) as usize];
        file.read_exact(&mut buf).ok()?;

        if let Some(found) = last_autocompact_line(&String::from_utf8_lossy(&buf)) {
            return Some(found);
        }
        if window >= file_size {
            break;
        }
    }

    None
}

fn last_autocompact_line(text: &str) -> Option<AutocompactOverride> {
    text.lines().filter_map(parse_autocompact_line).last()
}

fn parse_autocompact_line(line: &str) -> Option<AutocompactOverride> {
    let rest = line.trim().strip_prefix("autocompact: tokens=")?;
    let (tokens_str, rest) = rest.split_once(' ')?;
    let threshold_str = rest.trim().strip_prefix("threshold=")?;
    Some(AutocompactOverride {
        tokens: tokens_str.trim().parse().ok()?,
        threshold: threshold_str.trim().parse().ok()?,
    })
}

/// Clear the process-wide cache. Test-only.
#[cfg(test)]
pub fn reset() {
    CACHE.lock().unwrap().clear();
}
