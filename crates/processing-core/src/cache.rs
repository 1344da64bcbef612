//! Bounded analysis caches.
//!
//! Smoothing and motion-cluster results are pure functions of their inputs,
//! so a cache entry is only ever overwritten with an equal value. The caches
//! are injected through [`TelemetryCaches`]; nothing here is global.

use std::hash::Hash;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use clipcam_common::config::{CacheConfig, SmoothingConfig};
use clipcam_project_model::event::{MouseEvent, Timestamped};
use clipcam_project_model::viewport::Point2D;
use lru::LruCache;

use crate::motion_cluster::{MotionCluster, MotionClusterConfig};

/// A thread-safe LRU map with a fixed entry cap.
pub struct AnalysisCache<K: Hash + Eq, V: Clone> {
    name: &'static str,
    inner: Mutex<LruCache<K, V>>,
}

impl<K: Hash + Eq, V: Clone> AnalysisCache<K, V> {
    /// A zero capacity is bumped to one entry.
    pub fn new(name: &'static str, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            name,
            inner: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// A poisoned lock only means another reader panicked mid-insert; the
    /// map itself is still a valid LRU.
    fn lock(&self) -> MutexGuard<'_, LruCache<K, V>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn get(&self, key: &K) -> Option<V> {
        self.lock().get(key).cloned()
    }

    pub fn set(&self, key: K, value: V) {
        self.lock().put(key, value);
    }

    /// Return the cached value or compute, store and return it.
    ///
    /// `compute` runs without the lock held, so two threads may race to
    /// fill the same key. Both store equal values.
    pub fn get_or_insert_with(&self, key: K, compute: impl FnOnce() -> V) -> V {
        if let Some(hit) = self.get(&key) {
            return hit;
        }
        tracing::trace!(cache = self.name, "Analysis cache miss");
        let value = compute();
        self.set(key, value.clone());
        value
    }

    /// Drop every entry.
    pub fn invalidate(&self) {
        let mut cache = self.lock();
        if !cache.is_empty() {
            tracing::debug!(cache = self.name, entries = cache.len(), "Invalidating analysis cache");
        }
        cache.clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.lock().cap().get()
    }
}

/// Identity of a time-sorted event stream: the id of the recording it
/// belongs to, plus count and first and last timestamps.
///
/// The id is what tells apart two recordings captured at the same rate
/// over the same span; the rest distinguishes sub-ranges of one stream.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StreamFingerprint {
    stream_id: String,
    count: usize,
    first_bits: u64,
    last_bits: u64,
}

impl StreamFingerprint {
    pub fn of<T: Timestamped>(stream_id: &str, events: &[T]) -> Self {
        let bits = |e: Option<&T>| e.map(|e| e.timestamp().to_bits()).unwrap_or(0);
        Self {
            stream_id: stream_id.to_owned(),
            count: events.len(),
            first_bits: bits(events.first()),
            last_bits: bits(events.last()),
        }
    }
}

/// Key for one smoothed cursor sample.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SmoothingKey {
    pub stream: StreamFingerprint,
    pub time_bits: u64,
    pub width: u32,
    pub height: u32,
    pub steps: usize,
    pub window_bits: u64,
    pub tau_bits: u64,
}

impl SmoothingKey {
    pub fn new(
        stream_id: &str,
        events: &[MouseEvent],
        time_ms: f64,
        (width, height): (u32, u32),
        config: &SmoothingConfig,
    ) -> Self {
        Self {
            stream: StreamFingerprint::of(stream_id, events),
            time_bits: time_ms.to_bits(),
            width,
            height,
            steps: config.steps,
            window_bits: config.window_ms.to_bits(),
            tau_bits: config.tau_ms.to_bits(),
        }
    }
}

/// Key for the motion clusters of one stream at one resolution and
/// clustering config.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MotionClusterKey {
    pub stream: StreamFingerprint,
    pub width: u32,
    pub height: u32,
    pub radius_bits: u64,
    pub min_duration_bits: u64,
    pub min_samples: usize,
}

impl MotionClusterKey {
    pub fn new(
        stream_id: &str,
        events: &[MouseEvent],
        (width, height): (u32, u32),
        config: &MotionClusterConfig,
    ) -> Self {
        Self {
            stream: StreamFingerprint::of(stream_id, events),
            width,
            height,
            radius_bits: config.radius.to_bits(),
            min_duration_bits: config.min_duration_ms.to_bits(),
            min_samples: config.min_samples,
        }
    }
}

/// The caches shared by telemetry analyzers for one session.
///
/// Invalidate wholesale on project or recording switch.
pub struct TelemetryCaches {
    pub smoothing: AnalysisCache<SmoothingKey, Option<Point2D>>,
    pub motion_clusters: AnalysisCache<MotionClusterKey, Arc<Vec<MotionCluster>>>,
}

impl TelemetryCaches {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            smoothing: AnalysisCache::new("smoothing", config.capacity),
            motion_clusters: AnalysisCache::new("motion_clusters", config.capacity),
        }
    }

    pub fn invalidate_all(&self) {
        self.smoothing.invalidate();
        self.motion_clusters.invalidate();
    }
}

impl Default for TelemetryCaches {
    fn default() -> Self {
        Self::new(&CacheConfig::default())
    }
}
