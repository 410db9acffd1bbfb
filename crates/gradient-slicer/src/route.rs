//! Path routing: chain a bag of disjoint paths into one continuous tour.

use gradient_kernel_math::{distance, Point2};

use crate::path::Path;

/// When to put an explicit travel move between consecutive paths.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TravelInsertion {
    /// Before every path, even when the gap is zero.
    Always,
    /// Only when the gap is wider than the given distance (mm).
    WhenGapExceeds(f64),
}

impl TravelInsertion {
    fn needed(&self, gap: f64) -> bool {
        match *self {
            TravelInsertion::Always => true,
            TravelInsertion::WhenGapExceeds(tolerance) => gap > tolerance,
        }
    }
}

/// An ordered, connected path list.
#[derive(Debug, Clone, PartialEq)]
pub struct Tour {
    /// Paths in print order, with travels between them.
    pub paths: Vec<Path>,
    /// Where the tour ends (the entry point if it is empty).
    pub end: Point2,
}

/// Greedy nearest-neighbour tour through `paths`, starting at `start`.
///
/// At every step the path with the closest endpoint to the current position
/// is taken next, reversed if its far end is the closer one. Ties go to the
/// path that appears first, and to its start over its end.
pub fn route(paths: Vec<Path>, start: Point2, travel: TravelInsertion) -> Tour {
    let mut remaining: Vec<Path> = paths.into_iter().filter(|p| p.points.len() >= 2).collect();
    let mut ordered = Vec::with_capacity(remaining.len() * 2);
    let mut current = start;

    while !remaining.is_empty() {
        let mut best = (0, false, f64::INFINITY);
        for (i, path) in remaining.iter().enumerate() {
            let (Some(first), Some(last)) = (path.start(), path.end()) else {
                continue;
            };
            let to_start = distance(&current, first);
            if to_start < best.2 {
                best = (i, false, to_start);
            }
            let to_end = distance(&current, last);
            if to_end < best.2 {
                best = (i, true, to_end);
            }
        }

        let (index, reversed, gap) = best;
        let mut next = remaining.remove(index);
        if reversed {
            next.reverse();
        }
        if let (true, Some(entry)) = (travel.needed(gap), next.start()) {
            ordered.push(Path::travel(current, *entry));
        }
        if let Some(exit) = next.end() {
            current = *exit;
        }
        ordered.push(next);
    }

    Tour {
        paths: ordered,
        end: current,
    }
}
