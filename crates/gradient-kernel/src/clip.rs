//! Clipping open and closed polylines against polygon sets.

use gradient_kernel_math::{distance, lerp, Point2, Tolerance};

use crate::geometry::{polygons_contain, Polygon, Polyline};

/// Parameter tolerance when comparing intersection positions along a segment.
const PARAM_EPS: f64 = 1e-9;

fn cross(ax: f64, ay: f64, bx: f64, by: f64) -> f64 {
    ax * by - ay * bx
}

/// Parameter `t` along `a -> b` where it crosses segment `c -> d`.
fn segment_crossing(a: &Point2, b: &Point2, c: &Point2, d: &Point2) -> Option<f64> {
    let r = b - a;
    let s = d - c;
    let denom = cross(r.x, r.y, s.x, s.y);
    if denom.abs() < 1e-12 {
        // Parallel or collinear: handled by the midpoint classification.
        return None;
    }
    let qp = c - a;
    let t = cross(qp.x, qp.y, s.x, s.y) / denom;
    let u = cross(qp.x, qp.y, r.x, r.y) / denom;
    if (-PARAM_EPS..=1.0 + PARAM_EPS).contains(&u) && (-PARAM_EPS..=1.0 + PARAM_EPS).contains(&t) {
        Some(t)
    } else {
        None
    }
}

/// Split parameters for segment `a -> b` against every ring edge of `boundary`.
fn split_parameters(a: &Point2, b: &Point2, boundary: &[Polygon]) -> Vec<f64> {
    let mut ts = vec![0.0, 1.0];
    for poly in boundary {
        for ring in poly.rings() {
            let n = ring.len();
            for i in 0..n {
                let c = &ring[i];
                let d = &ring[(i + 1) % n];
                if let Some(t) = segment_crossing(a, b, c, d) {
                    if t > PARAM_EPS && t < 1.0 - PARAM_EPS {
                        ts.push(t);
                    }
                }
            }
        }
    }
    ts.sort_by(|x, y| x.total_cmp(y));
    ts.dedup_by(|x, y| (*x - *y).abs() < PARAM_EPS);
    ts
}

/// Keep the parts of `subject` that lie inside `boundary`.
///
/// A closed subject loop whose first and last kept pieces meet at the seam
/// is returned as one chain, so a loop cut by a single boundary crossing
/// yields one piece per side rather than two.
pub fn clip_polyline(boundary: &[Polygon], subject: &Polyline) -> Vec<Polyline> {
    if subject.len() < 2 || boundary.is_empty() {
        return Vec::new();
    }

    let tol = Tolerance::DEFAULT;
    let mut pieces: Vec<Vec<Point2>> = Vec::new();
    let mut current: Vec<Point2> = Vec::new();
    let mut first_inside: Option<bool> = None;
    let mut last_inside = false;

    for (a, b) in subject.segments() {
        if distance(a, b) < tol.linear {
            continue;
        }
        let ts = split_parameters(a, b, boundary);
        for w in ts.windows(2) {
            let p0 = lerp(a, b, w[0]);
            let p1 = lerp(a, b, w[1]);
            let mid = lerp(a, b, (w[0] + w[1]) / 2.0);
            let inside = polygons_contain(boundary, &mid);
            first_inside.get_or_insert(inside);
            last_inside = inside;

            if inside {
                if current.is_empty() {
                    current.push(p0);
                }
                current.push(p1);
            } else if !current.is_empty() {
                let piece = std::mem::take(&mut current);
                if piece.len() >= 2 {
                    pieces.push(piece);
                }
            }
        }
    }
    if current.len() >= 2 {
        pieces.push(current);
    }

    let wraps = subject.is_closed() && first_inside == Some(true) && last_inside;
    if wraps && pieces.len() >= 2 {
        let head = pieces.remove(0);
        if let Some(tail) = pieces.last_mut() {
            tail.extend(head.into_iter().skip(1));
        }
    }

    pieces.into_iter().map(Polyline::new).collect()
}

/// Clip each subject against `boundary`, preserving subject order.
pub fn clip_polylines(boundary: &[Polygon], subjects: &[Polyline]) -> Vec<Polyline> {
    subjects
        .iter()
        .flat_map(|s| clip_polyline(boundary, s))
        .collect()
}
