//! Dwell detection: runs of pointer samples that stay inside a small radius.

use std::sync::Arc;

use clipcam_project_model::event::MouseEvent;
use clipcam_project_model::viewport::Point2D;
use serde::Serialize;

use crate::cache::{MotionClusterKey, TelemetryCaches};

#[derive(Debug, Clone)]
pub struct MotionClusterConfig {
    /// Maximum distance (normalized) from the running centroid.
    pub radius: f64,
    /// Minimum time the pointer must stay in the cluster (ms).
    pub min_duration_ms: f64,
    pub min_samples: usize,
}

impl Default for MotionClusterConfig {
    fn default() -> Self {
        Self {
            radius: 0.06,
            min_duration_ms: 1000.0,
            min_samples: 3,
        }
    }
}

/// A period where the pointer hovered around one spot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MotionCluster {
    pub start_ms: f64,
    pub end_ms: f64,
    /// Normalized centroid.
    pub center: Point2D,
    /// Largest normalized distance from the centroid.
    pub spread: f64,
    pub sample_count: usize,
}

impl MotionCluster {
    pub fn duration_ms(&self) -> f64 {
        self.end_ms - self.start_ms
    }
}

/// Greedy single pass: a sample joins the current cluster while it stays
/// within `radius` of the running centroid.
pub fn detect_motion_clusters(
    events: &[MouseEvent],
    width: u32,
    height: u32,
    config: &MotionClusterConfig,
) -> Vec<MotionCluster> {
    if events.is_empty() || width == 0 || height == 0 {
        return vec![];
    }

    let normalize = |e: &MouseEvent| Point2D::new(e.x / width as f64, e.y / height as f64);
    let mut clusters = vec![];
    let mut run: Vec<(f64, Point2D)> = vec![];
    let mut sum = (0.0, 0.0);

    for event in events {
        let p = normalize(event);
        if !run.is_empty() {
            let n = run.len() as f64;
            let centroid = Point2D::new(sum.0 / n, sum.1 / n);
            if p.distance_to(&centroid) > config.radius {
                flush(&run, config, &mut clusters);
                run.clear();
                sum = (0.0, 0.0);
            }
        }
        run.push((event.timestamp, p));
        sum.0 += p.x;
        sum.1 += p.y;
    }
    flush(&run, config, &mut clusters);

    clusters
}

fn flush(run: &[(f64, Point2D)], config: &MotionClusterConfig, out: &mut Vec<MotionCluster>) {
    let (Some(first), Some(last)) = (run.first(), run.last()) else {
        return;
    };
    if run.len() < config.min_samples || last.0 - first.0 < config.min_duration_ms {
        return;
    }

    let n = run.len() as f64;
    let center = Point2D::new(
        run.iter().map(|(_, p)| p.x).sum::<f64>() / n,
        run.iter().map(|(_, p)| p.y).sum::<f64>() / n,
    );
    let spread = run
        .iter()
        .map(|(_, p)| p.distance_to(&center))
        .fold(0.0_f64, f64::max);

    out.push(MotionCluster {
        start_ms: first.0,
        end_ms: last.0,
        center,
        spread,
        sample_count: run.len(),
    });
}

/// [`detect_motion_clusters`] through the cluster cache, keyed by
/// `stream_id`, the stream's edges, the resolution and `config`.
pub fn detect_motion_clusters_cached(
    caches: &TelemetryCaches,
    stream_id: &str,
    events: &[MouseEvent],
    width: u32,
    height: u32,
    config: &MotionClusterConfig,
) -> Arc<Vec<MotionCluster>> {
    let key = MotionClusterKey::new(stream_id, events, (width, height), config);
    caches.motion_clusters.get_or_insert_with(key, || {
        Arc::new(detect_motion_clusters(events, width, height, config))
    })
}
