//! Chart pattern detection.
//!
//! Swing points come from a zig-zag scan over closes. Formations are matched
//! against consecutive swing points; confidence is `1 / (1 + deviation)`
//! where deviation is the template error divided by its tolerance, so any
//! accepted match scores in (0.5, 1] and a perfect shape scores 1.

use crate::config::PatternConfig;
use crate::services::signals::levels::cluster_levels;
use crate::types::{Extremum, ExtremumKind, Pattern, PatternKind, PatternScan, PriceSeries};
use std::cmp::Ordering;
use tracing::debug;

/// Confirmed swing points of `closes` with at least `min_swing_pct` reversal.
///
/// The candidate extreme still forming at the end of the series is not
/// reported; see [`find_swing_points`].
pub fn find_extrema(series: &PriceSeries, min_swing_pct: f64) -> Vec<Extremum> {
    zigzag(series, min_swing_pct).0
}

/// Confirmed swing points followed by the provisional one still forming at
/// the end of the series, if any.
///
/// The provisional point is already `min_swing_pct` away from the last
/// confirmed one but has not been followed by a reversal yet.
pub fn find_swing_points(series: &PriceSeries, min_swing_pct: f64) -> Vec<Extremum> {
    let (mut out, trailing) = zigzag(series, min_swing_pct);
    out.extend(trailing);
    out
}

fn zigzag(series: &PriceSeries, min_swing_pct: f64) -> (Vec<Extremum>, Option<Extremum>) {
    let points = series.points();
    let swing = min_swing_pct / 100.0;
    let close = |i: usize| points[i].close;
    let mut out = Vec::new();
    if points.len() < 2 {
        return (out, None);
    }

    let extremum = |i: usize, kind: ExtremumKind| Extremum {
        index: i,
        time: points[i].time,
        price: points[i].close,
        kind,
    };

    let mut hi = 0;
    let mut lo = 0;
    // Kind of the extreme currently being tracked, once a direction is known.
    let mut tracking: Option<ExtremumKind> = None;
    let mut candidate = 0;

    for i in 1..points.len() {
        let p = close(i);
        match tracking {
            None => {
                if p > close(hi) {
                    hi = i;
                }
                if p < close(lo) {
                    lo = i;
                }
                if close(lo) > 0.0 && (close(hi) - close(lo)) / close(lo) >= swing {
                    if hi > lo {
                        out.push(extremum(lo, ExtremumKind::Trough));
                        tracking = Some(ExtremumKind::Peak);
                        candidate = hi;
                    } else {
                        out.push(extremum(hi, ExtremumKind::Peak));
                        tracking = Some(ExtremumKind::Trough);
                        candidate = lo;
                    }
                }
            }
            Some(ExtremumKind::Peak) => {
                let top = close(candidate);
                if p > top {
                    candidate = i;
                } else if top > 0.0 && (top - p) / top >= swing {
                    out.push(extremum(candidate, ExtremumKind::Peak));
                    tracking = Some(ExtremumKind::Trough);
                    candidate = i;
                }
            }
            Some(ExtremumKind::Trough) => {
                let bottom = close(candidate);
                if p < bottom {
                    candidate = i;
                } else if bottom > 0.0 && (p - bottom) / bottom >= swing {
                    out.push(extremum(candidate, ExtremumKind::Trough));
                    tracking = Some(ExtremumKind::Peak);
                    candidate = i;
                }
            }
        }
    }

    let trailing = tracking.map(|kind| extremum(candidate, kind));
    (out, trailing)
}

fn rel_diff(a: f64, b: f64) -> f64 {
    let base = a.max(b);
    if base <= 0.0 {
        return f64::INFINITY;
    }
    (a - b).abs() / base
}

fn confidence(deviation: f64) -> f64 {
    (1.0 / (1.0 + deviation.max(0.0))).clamp(0.0, 1.0)
}

/// Twin peaks (or troughs) separated by one opposite swing.
fn match_double(
    window: &[Extremum],
    outer: ExtremumKind,
    cfg: &PatternConfig,
) -> Option<Pattern> {
    let [a, mid, b] = window else {
        return None;
    };
    if a.kind != outer || b.kind != outer || mid.kind == outer {
        return None;
    }

    let tolerance = cfg.pattern_tolerance_pct / 100.0;
    let diff = rel_diff(a.price, b.price);
    if diff > tolerance {
        return None;
    }

    let depth = match outer {
        ExtremumKind::Peak => {
            let lower = a.price.min(b.price);
            (lower - mid.price) / lower
        }
        ExtremumKind::Trough => {
            let higher = a.price.max(b.price);
            if higher <= 0.0 {
                return None;
            }
            (mid.price - higher) / higher
        }
    };
    if !(depth >= cfg.min_depth_pct / 100.0) {
        return None;
    }

    Some(Pattern {
        kind: match outer {
            ExtremumKind::Peak => PatternKind::DoubleTop,
            ExtremumKind::Trough => PatternKind::DoubleBottom,
        },
        start: a.time,
        end: b.time,
        confidence: confidence(diff / tolerance),
    })
}

/// Peak, trough, higher peak, trough, peak.
fn match_head_and_shoulders(window: &[Extremum], cfg: &PatternConfig) -> Option<Pattern> {
    let [ls, t1, head, t2, rs] = window else {
        return None;
    };
    if ls.kind != ExtremumKind::Peak
        || head.kind != ExtremumKind::Peak
        || rs.kind != ExtremumKind::Peak
    {
        return None;
    }

    // Head must stand clear of both shoulders, otherwise it is a triple top.
    let clearance = cfg.pattern_tolerance_pct / 100.0;
    if head.price <= ls.price * (1.0 + clearance) || head.price <= rs.price * (1.0 + clearance) {
        return None;
    }

    let tolerance = cfg.shoulder_tolerance_pct / 100.0;
    let shoulder_diff = rel_diff(ls.price, rs.price);
    let neckline_diff = rel_diff(t1.price, t2.price);
    if shoulder_diff > tolerance || neckline_diff > tolerance {
        return None;
    }

    Some(Pattern {
        kind: PatternKind::HeadAndShoulders,
        start: ls.time,
        end: rs.time,
        confidence: confidence((shoulder_diff + neckline_diff) / 2.0 / tolerance),
    })
}

/// Least-squares slope of price against bar index, as a fraction of mean price per bar.
fn relative_slope(points: &[&Extremum]) -> Option<f64> {
    if points.len() < 2 {
        return None;
    }
    let n = points.len() as f64;
    let mean_x = points.iter().map(|e| e.index as f64).sum::<f64>() / n;
    let mean_y = points.iter().map(|e| e.price).sum::<f64>() / n;
    let sxx: f64 = points.iter().map(|e| (e.index as f64 - mean_x).powi(2)).sum();
    if sxx == 0.0 || mean_y <= 0.0 {
        return None;
    }
    let sxy: f64 = points
        .iter()
        .map(|e| (e.index as f64 - mean_x) * (e.price - mean_y))
        .sum();
    Some(sxy / sxx / mean_y)
}

/// Flat side touched at least twice, sloping side touched at least twice after
/// the first flat touch.
fn match_triangle(extrema: &[Extremum], flat: ExtremumKind, cfg: &PatternConfig) -> Option<Pattern> {
    let recent = &extrema[extrema.len().saturating_sub(6)..];
    let flat_side: Vec<&Extremum> = recent.iter().filter(|e| e.kind == flat).collect();
    let flat_side = &flat_side[flat_side.len().saturating_sub(3)..];
    let first = flat_side.first()?;
    let sloped_side: Vec<&Extremum> = recent
        .iter()
        .filter(|e| e.kind != flat && e.index > first.index)
        .collect();
    if flat_side.len() < 2 || sloped_side.len() < 2 {
        return None;
    }

    // Every flat-side touch must sit on the same horizontal line.
    let flat_mean = flat_side.iter().map(|e| e.price).sum::<f64>() / flat_side.len() as f64;
    let line_tolerance = cfg.pattern_tolerance_pct / 100.0;
    if flat_side
        .iter()
        .any(|e| rel_diff(e.price, flat_mean) > line_tolerance)
    {
        return None;
    }

    let tol = cfg.flat_slope_tolerance;
    let flat_slope = relative_slope(flat_side)?;
    let sloped = relative_slope(&sloped_side)?;
    if flat_slope.abs() > tol {
        return None;
    }

    let kind = match flat {
        ExtremumKind::Peak if sloped > tol => PatternKind::AscendingTriangle,
        ExtremumKind::Trough if sloped < -tol => PatternKind::DescendingTriangle,
        _ => return None,
    };

    let end = flat_side
        .iter()
        .chain(sloped_side.iter())
        .map(|e| e.time)
        .max()?;

    Some(Pattern {
        kind,
        start: first.time,
        end,
        confidence: confidence(flat_slope.abs() / tol),
    })
}

/// Keep `candidate` if it beats `best` on confidence, then on recency.
fn keep_best(best: &mut Option<Pattern>, candidate: Option<Pattern>) {
    let Some(candidate) = candidate else {
        return;
    };
    let replace = match best {
        None => true,
        Some(current) => {
            candidate.confidence > current.confidence
                || (candidate.confidence == current.confidence && candidate.end > current.end)
        }
    };
    if replace {
        *best = Some(candidate);
    }
}

fn rank(a: &Pattern, b: &Pattern) -> Ordering {
    b.confidence
        .total_cmp(&a.confidence)
        .then(b.end.cmp(&a.end))
        .then(a.kind.cmp(&b.kind))
}

/// Pattern detector over one price series.
pub struct PatternDetector {
    config: PatternConfig,
}

impl PatternDetector {
    pub fn new(config: PatternConfig) -> Self {
        Self { config }
    }

    /// Find extrema, levels and the best match per pattern kind.
    pub fn scan(&self, series: &PriceSeries) -> PatternScan {
        let cfg = &self.config;
        let (extrema, trailing) = zigzag(series, cfg.min_swing_pct);
        let last_close = series.last().map(|p| p.close).unwrap_or(0.0);
        // Levels need confirmed touches only.
        let levels = cluster_levels(&extrema, last_close, cfg);

        // A formation may complete on the swing still forming at the end.
        let swings: Vec<Extremum> = extrema.iter().copied().chain(trailing).collect();

        let mut double_top = None;
        let mut double_bottom = None;
        let mut head_shoulders = None;

        for window in swings.windows(3) {
            keep_best(&mut double_top, match_double(window, ExtremumKind::Peak, cfg));
            keep_best(&mut double_bottom, match_double(window, ExtremumKind::Trough, cfg));
        }
        for window in swings.windows(5) {
            keep_best(&mut head_shoulders, match_head_and_shoulders(window, cfg));
        }
        let ascending = match_triangle(&swings, ExtremumKind::Peak, cfg);
        let descending = match_triangle(&swings, ExtremumKind::Trough, cfg);

        let mut patterns: Vec<Pattern> = [double_top, double_bottom, head_shoulders, ascending, descending]
            .into_iter()
            .flatten()
            .collect();
        patterns.sort_by(rank);

        debug!(
            "Pattern scan for {} {}: {} extrema, {} levels, {} patterns",
            series.asset(),
            series.window(),
            extrema.len(),
            levels.len(),
            patterns.len()
        );

        PatternScan {
            extrema,
            levels,
            patterns,
            start: series.first().map(|p| p.time).unwrap_or(0),
            end: series.last().map(|p| p.time).unwrap_or(0),
        }
    }
}
