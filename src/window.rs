use crate::config::SimParams;
use crate::reads::{self, ReadSet};

use rayon::prelude::*;

/// Estimates how much of a read set falls inside one read's search window.
///
/// Takes the first `samples` reads of a freshly generated set and, for each,
/// counts the reads of the whole set on the same tile within the rectangular
/// window (a read always matches its own window). The result is the mean
/// in-range percentage, which approximates the window-to-tile area ratio,
/// reduced slightly by reads near tile edges with a truncated search area.
pub fn window_ratio(params: &SimParams, library_size: f64, samples: usize) -> f64 {
    let mut rng = reads::rng_for(params.seed, 0);
    let set = reads::uniform(params, library_size, &mut rng);

    in_range_percentage(&set, params.x_dist, params.y_dist, samples)
}

fn in_range_percentage(set: &ReadSet, x_dist: u32, y_dist: u32, samples: usize) -> f64 {
    let samples = samples.min(set.len());
    if samples == 0 {
        return 0.0;
    }

    let in_range: u64 = (0..samples)
        .into_par_iter()
        .map(|s| {
            (0..set.len())
                .filter(|&i| {
                    set.tiles[i] == set.tiles[s]
                        && set.xs[i].abs_diff(set.xs[s]) < x_dist
                        && set.ys[i].abs_diff(set.ys[s]) < y_dist
                })
                .count() as u64
        })
        .sum();

    in_range as f64 * 100.0 / (set.len() as f64 * samples as f64)
}
