//! Persisted cumulative distance.
//!
//! The cache keeps `(distance_pulses, timestamp)` in memory and writes it to a
//! small `[DEFAULT]`-section key/value file on a repeating timer and once more
//! at shutdown. Disk therefore lags memory by at most one write interval.

use crossbeam_channel as xch;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;
use std::time::Duration;

use crate::atomic::write_atomic;
use crate::config::CacheCfg;
use crate::error::{OdoError, Result};
use crate::observer::Observer;
use crate::types::Sample;

const SECTION: &str = "DEFAULT";
const KEY_DISTANCE: &str = "distance_pulses";
const KEY_TIMESTAMP: &str = "timestamp";

/// Contents of the cache file.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CacheRecord {
    pub distance_pulses: f64,
    pub timestamp: f64,
}

impl CacheRecord {
    /// Parse cache file text. Missing or malformed fields default to 0.0 with a warning.
    ///
    /// The file is read INI-style: `key = value` or `key: value` lines under
    /// `[DEFAULT]`, `#`/`;` comment lines skipped, each key converted on its
    /// own so one bad value never costs the other.
    pub fn parse(text: &str) -> Self {
        let mut distance = None;
        let mut timestamp = None;
        let mut seen_section = false;
        let mut in_section = false;
        for (lineno, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }
            if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
                in_section = name.trim() == SECTION;
                seen_section |= in_section;
                continue;
            }
            if !in_section {
                continue;
            }
            let Some((key, value)) = split_entry(line) else {
                tracing::warn!(line = lineno + 1, "unparseable cache line; ignored");
                continue;
            };
            let slot = if key.eq_ignore_ascii_case(KEY_DISTANCE) {
                &mut distance
            } else if key.eq_ignore_ascii_case(KEY_TIMESTAMP) {
                &mut timestamp
            } else {
                continue;
            };
            *slot = Some(float_value(value));
        }
        if !seen_section {
            tracing::warn!("cache file has no [{SECTION}] section; starting from zero");
        }
        let field = |key: &str, v: Option<Option<f64>>| -> f64 {
            match v {
                Some(Some(v)) => v,
                Some(None) => {
                    tracing::warn!(key, "malformed cache value; using 0.0");
                    0.0
                }
                None => {
                    if seen_section {
                        tracing::warn!(key, "missing cache value; using 0.0");
                    }
                    0.0
                }
            }
        };
        Self {
            distance_pulses: field(KEY_DISTANCE, distance),
            timestamp: field(KEY_TIMESTAMP, timestamp),
        }
    }

    /// Render as cache file text.
    pub fn render(&self) -> Result<String> {
        let mut section = toml::Table::new();
        section.insert(
            KEY_DISTANCE.into(),
            toml::Value::Float(self.distance_pulses),
        );
        section.insert(KEY_TIMESTAMP.into(), toml::Value::Float(self.timestamp));
        let mut root = toml::Table::new();
        root.insert(SECTION.into(), toml::Value::Table(section));
        toml::to_string(&root)
            .map_err(|e| eyre::Report::new(OdoError::Io(format!("encode cache: {e}"))))
    }
}

/// Split `key = value` or `key: value` at whichever delimiter comes first.
fn split_entry(line: &str) -> Option<(&str, &str)> {
    let at = line.find(['=', ':'])?;
    let key = line[..at].trim();
    if key.is_empty() {
        return None;
    }
    Some((key, line[at + 1..].trim()))
}

/// Accepts plain or quoted floats and integers; non-finite values are rejected.
fn float_value(raw: &str) -> Option<f64> {
    let unquoted = ['"', '\'']
        .iter()
        .find_map(|q| raw.strip_prefix(*q).and_then(|r| r.strip_suffix(*q)))
        .unwrap_or(raw);
    let f = unquoted.trim().parse::<f64>().ok()?;
    f.is_finite().then_some(f)
}

/// Read the cache file at `path` without starting a flusher.
///
/// A missing or unreadable file is an error here; malformed contents are not.
pub fn read_record(path: &Path) -> Result<CacheRecord> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| eyre::Report::new(OdoError::Io(format!("read {}: {e}", path.display()))))?;
    Ok(CacheRecord::parse(&text))
}

struct CacheState {
    record: CacheRecord,
    dirty: bool,
}

struct Inner {
    path: PathBuf,
    state: Mutex<CacheState>,
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self, record: CacheRecord) -> Result<()> {
        let text = record.render()?;
        write_atomic(&self.path, text.as_bytes()).map_err(|e| {
            eyre::Report::new(OdoError::Io(format!(
                "write {}: {e}",
                self.path.display()
            )))
        })
    }

    fn flush(&self) -> Result<()> {
        let record = {
            let mut st = self.lock();
            st.dirty = false;
            st.record
        };
        if let Err(e) = self.write(record) {
            // Next flush retries.
            self.lock().dirty = true;
            return Err(e);
        }
        tracing::trace!(
            distance = record.distance_pulses,
            path = %self.path.display(),
            "distance cache flushed"
        );
        Ok(())
    }

    fn flush_if_dirty(&self) {
        if !self.lock().dirty {
            return;
        }
        if let Err(e) = self.flush() {
            tracing::warn!(error = %e, "periodic cache flush failed; keeping in-memory value");
        }
    }
}

pub struct DistanceCache {
    inner: Arc<Inner>,
    stop_tx: Mutex<Option<xch::Sender<()>>>,
    flusher: Mutex<Option<JoinHandle<()>>>,
    closed: AtomicBool,
}

impl core::fmt::Debug for DistanceCache {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DistanceCache")
            .field("path", &self.inner.path)
            .field("record", &self.inner.lock().record)
            .finish()
    }
}

impl DistanceCache {
    /// Load (or create) the cache file and start the periodic flusher.
    pub fn open(cfg: &CacheCfg) -> Result<Self> {
        let record = match std::fs::read_to_string(&cfg.path) {
            Ok(text) => CacheRecord::parse(&text),
            Err(e) if e.kind() == ErrorKind::NotFound => CacheRecord::default(),
            Err(e) => {
                tracing::warn!(error = %e, path = %cfg.path.display(), "cache file unreadable; starting from zero");
                CacheRecord::default()
            }
        };
        let inner = Arc::new(Inner {
            path: cfg.path.clone(),
            state: Mutex::new(CacheState {
                record,
                dirty: false,
            }),
        });
        if !cfg.path.exists()
            && let Err(e) = inner.flush()
        {
            tracing::warn!(error = %e, "could not create cache file");
        }
        tracing::info!(
            distance = record.distance_pulses,
            timestamp = record.timestamp,
            path = %cfg.path.display(),
            "distance cache loaded"
        );

        let (stop_tx, stop_rx) = xch::bounded::<()>(0);
        let interval = cfg.write_interval.max(Duration::from_millis(1));
        let worker = inner.clone();
        let flusher = std::thread::Builder::new()
            .name("cache-flush".into())
            .spawn(move || {
                loop {
                    match stop_rx.recv_timeout(interval) {
                        Err(xch::RecvTimeoutError::Timeout) => worker.flush_if_dirty(),
                        _ => break,
                    }
                }
                tracing::trace!("cache flusher exiting cleanly");
            })
            .map_err(|e| eyre::Report::new(OdoError::Io(format!("spawn cache flusher: {e}"))))?;

        Ok(Self {
            inner,
            stop_tx: Mutex::new(Some(stop_tx)),
            flusher: Mutex::new(Some(flusher)),
            closed: AtomicBool::new(false),
        })
    }

    pub fn path(&self) -> &Path {
        &self.inner.path
    }

    /// In-memory distance in pulses.
    pub fn distance(&self) -> f64 {
        self.inner.lock().record.distance_pulses
    }

    /// Timestamp of the last `set_distance`.
    pub fn timestamp(&self) -> f64 {
        self.inner.lock().record.timestamp
    }

    pub fn record(&self) -> CacheRecord {
        self.inner.lock().record
    }

    /// Update the in-memory value; disk catches up on the next flush.
    /// `_speed` is accepted so the call mirrors a trajectory sample.
    pub fn set_distance(&self, timestamp: f64, distance: f64, _speed: f64) {
        let mut st = self.inner.lock();
        st.record = CacheRecord {
            distance_pulses: distance,
            timestamp,
        };
        st.dirty = true;
    }

    /// Write the current value now.
    pub fn flush(&self) -> Result<()> {
        self.inner.flush()
    }

    /// Observer that forwards positions more than `min_delta_pulses` past the cached value.
    pub fn observer(self: &Arc<Self>, min_delta_pulses: f64) -> CacheUpdater {
        CacheUpdater {
            cache: self.clone(),
            min_delta_pulses,
        }
    }

    /// Stop the flusher and write a final time. Idempotent.
    pub fn shutdown(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        drop(
            self.stop_tx
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .take(),
        );
        let handle = self
            .flusher
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle
            && let Err(e) = handle.join()
        {
            tracing::warn!(?e, "cache flusher panicked");
        }
        match self.inner.flush() {
            Ok(()) => tracing::debug!(distance = self.distance(), "distance cache closed"),
            Err(e) => tracing::error!(error = %e, "final cache flush failed"),
        }
    }
}

impl Drop for DistanceCache {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Coalescing trajectory observer feeding a `DistanceCache`.
pub struct CacheUpdater {
    cache: Arc<DistanceCache>,
    min_delta_pulses: f64,
}

impl Observer for CacheUpdater {
    fn on_sample(&self, sample: Sample) {
        if sample.position - self.cache.distance() > self.min_delta_pulses {
            self.cache
                .set_distance(sample.timestamp_s, sample.position, sample.speed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("[DEFAULT]\ndistance_pulses = 123.5\ntimestamp = 1000.0\n", 123.5, 1000.0)]
    #[case("[DEFAULT]\ndistance_pulses = 42\ntimestamp = \"17.25\"\n", 42.0, 17.25)]
    #[case("[DEFAULT]\ndistance_pulses = \"abc\"\ntimestamp = 5.0\n", 0.0, 5.0)]
    #[case("[DEFAULT]\ntimestamp = 5.0\n", 0.0, 5.0)]
    #[case("[other]\ndistance_pulses = 1.0\n", 0.0, 0.0)]
    #[case("not = = valid", 0.0, 0.0)]
    #[case("", 0.0, 0.0)]
    #[case("[DEFAULT]\ndistance_pulses = 123.5\ntimestamp = garbage\n", 123.5, 0.0)]
    #[case("[DEFAULT]\ndistance_pulses: 4321.0\ntimestamp: 1000.0\n", 4321.0, 1000.0)]
    #[case("; saved\n[DEFAULT]\n# comment\ndistance_pulses = 7\ntimestamp = inf\n", 7.0, 0.0)]
    #[case("[DEFAULT]\ndistance_pulses = 8.0\n[other]\ntimestamp = 3.0\n", 8.0, 0.0)]
    fn parse_defaults_bad_fields(#[case] text: &str, #[case] dist: f64, #[case] ts: f64) {
        let r = CacheRecord::parse(text);
        assert_eq!(r.distance_pulses, dist);
        assert_eq!(r.timestamp, ts);
    }

    #[test]
    fn render_parses_back() {
        let r = CacheRecord {
            distance_pulses: 123.5,
            timestamp: 1000.0,
        };
        let text = r.render().unwrap();
        assert!(text.contains("[DEFAULT]"));
        assert_eq!(CacheRecord::parse(&text), r);
    }

    #[test]
    fn updater_coalesces_small_moves() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = CacheCfg {
            path: dir.path().join("odo.ini"),
            write_interval: Duration::from_secs(3600),
            min_delta_pulses: 10.0,
        };
        let cache = Arc::new(DistanceCache::open(&cfg).unwrap());
        let up = cache.observer(10.0);
        let at = |p: f64| Sample {
            timestamp_s: p,
            position: p,
            speed: 1.0,
        };
        up.on_sample(at(5.0));
        assert_eq!(cache.distance(), 0.0);
        up.on_sample(at(10.0));
        assert_eq!(cache.distance(), 0.0);
        up.on_sample(at(10.5));
        assert_eq!(cache.distance(), 10.5);
        up.on_sample(at(20.0));
        assert_eq!(cache.distance(), 10.5);
        cache.shutdown();
    }
}
