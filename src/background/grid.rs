//! Neighbour search for the connection lines.
//!
//! Points are bucketed into square cells whose side equals the link
//! distance, so any close pair lives in the same or an adjacent cell. Each
//! cell is compared with itself and four "forward" neighbours, which visits
//! every unordered pair exactly once.

use std::collections::HashMap;

/// A pair of point indices (`a < b`) and their distance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Link {
    pub a: usize,
    pub b: usize,
    pub distance: f64,
}

const FORWARD: [(i64, i64); 4] = [(1, 0), (-1, 1), (0, 1), (1, 1)];

fn link(points: &[(f64, f64)], i: usize, j: usize, max: f64) -> Option<Link> {
    let (x1, y1) = points[i];
    let (x2, y2) = points[j];
    let distance = (x1 - x2).hypot(y1 - y2);
    (distance < max).then(|| Link {
        a: i.min(j),
        b: i.max(j),
        distance,
    })
}

/// All pairs closer than `max_distance`, via a uniform grid.
pub fn close_pairs(points: &[(f64, f64)], max_distance: f64) -> Vec<Link> {
    if points.len() < 2 || max_distance <= 0.0 || !max_distance.is_finite() {
        return Vec::new();
    }

    let cell_of = |(x, y): (f64, f64)| {
        (
            (x / max_distance).floor() as i64,
            (y / max_distance).floor() as i64,
        )
    };
    let mut cells: HashMap<(i64, i64), Vec<usize>> = HashMap::new();
    for (i, &p) in points.iter().enumerate() {
        cells.entry(cell_of(p)).or_default().push(i);
    }

    let mut out = Vec::new();
    for (&(cx, cy), members) in &cells {
        for (k, &i) in members.iter().enumerate() {
            for &j in &members[k + 1..] {
                out.extend(link(points, i, j, max_distance));
            }
        }
        for (dx, dy) in FORWARD {
            let Some(other) = cells.get(&(cx + dx, cy + dy)) else {
                continue;
            };
            for &i in members {
                for &j in other {
                    out.extend(link(points, i, j, max_distance));
                }
            }
        }
    }
    out
}

/// Reference O(n²) scan over every unordered pair.
pub fn close_pairs_naive(points: &[(f64, f64)], max_distance: f64) -> Vec<Link> {
    let mut out = Vec::new();
    for i in 0..points.len() {
        for j in i + 1..points.len() {
            out.extend(link(points, i, j, max_distance));
        }
    }
    out
}
