//! Support and resistance levels from clustered swing points.

use crate::config::PatternConfig;
use crate::types::{Extremum, LevelKind, SupportResistanceLevel};

/// Cluster extrema prices into levels.
///
/// Prices are visited in ascending order; a price joins the open cluster
/// while it stays within `level_tolerance_pct` of the cluster mean. Levels
/// above `last_close` are resistance, the rest support. Clusters with fewer
/// than `min_level_strength` touches are dropped.
pub fn cluster_levels(
    extrema: &[Extremum],
    last_close: f64,
    cfg: &PatternConfig,
) -> Vec<SupportResistanceLevel> {
    let tolerance = cfg.level_tolerance_pct / 100.0;
    let mut prices: Vec<f64> = extrema.iter().map(|e| e.price).collect();
    prices.sort_by(|a, b| a.total_cmp(b));

    let mut clusters: Vec<(f64, u32)> = Vec::new();
    let mut sum = 0.0;
    let mut count = 0u32;

    for price in prices {
        if count > 0 {
            let mean = sum / count as f64;
            if mean > 0.0 && (price - mean) / mean <= tolerance {
                sum += price;
                count += 1;
                continue;
            }
            clusters.push((mean, count));
        }
        sum = price;
        count = 1;
    }
    if count > 0 {
        clusters.push((sum / count as f64, count));
    }

    clusters
        .into_iter()
        .filter(|(_, touches)| *touches >= cfg.min_level_strength)
        .map(|(price, strength)| SupportResistanceLevel {
            price,
            strength,
            kind: if price > last_close {
                LevelKind::Resistance
            } else {
                LevelKind::Support
            },
        })
        .collect()
}
