use crate::config::SimParams;
use crate::duplicates;
use crate::reads::{self, MixtureSpec};

use anyhow::{Context, Result};
use itertools::Itertools;
use rayon::prelude::*;
use serde::Serialize;

/// Result of one library-size experiment.
#[derive(Clone, Debug, Serialize)]
pub struct SweepRecord {
    pub library_size: f64,
    pub global_rate: f64,
    pub local_rate: f64,
}

impl std::fmt::Display for SweepRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} {}",
            self.library_size, self.global_rate, self.local_rate
        )
    }
}

/// Result of one sub-library mixture experiment. `sizes` and `fractions`
/// include the residual sub-library, if one was generated.
#[derive(Clone, Debug, Serialize)]
pub struct MixtureRecord {
    pub sizes: Vec<f64>,
    pub fractions: Vec<f64>,
    pub global_rate: f64,
    pub local_rate: f64,
}

impl std::fmt::Display for MixtureRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}] [{}] {} {}",
            self.sizes.iter().map(|s| format!("{:.1}", s)).join(", "),
            self.fractions.iter().join(", "),
            self.global_rate,
            self.local_rate
        )
    }
}

/// The library sizes swept by the reference experiments: a handful of very
/// small libraries, then 100..8000 in steps of 100, then 8000..20000 in
/// steps of 500.
pub fn default_library_sizes() -> Vec<f64> {
    let mut sizes: Vec<f64> = vec![5.0, 10.0, 20.0, 50.0];
    sizes.extend((100..8000).step_by(100).map(|s| s as f64));
    sizes.extend((8000..20000).step_by(500).map(|s| s as f64));
    sizes
}

/// The mixture models swept by the reference experiments.
pub fn default_mixtures() -> Vec<MixtureSpec> {
    let models: [(&[f64], &[f64]); 4] = [
        (&[5000.0; 4], &[0.005, 0.004, 0.003, 0.002]),
        (&[5000.0; 4], &[0.01, 0.01, 0.008, 0.008]),
        (&[5000.0; 4], &[0.1, 0.05, 0.008, 0.008]),
        (&[5000.0], &[0.2]),
    ];

    models
        .iter()
        .map(|(sizes, fractions)| MixtureSpec {
            sub_libraries: sizes
                .iter()
                .zip(fractions.iter())
                .map(|(&size, &fraction)| reads::SubLibrary { size, fraction })
                .collect(),
        })
        .collect()
}

/// Runs one experiment per library size, in parallel, and returns the
/// records in the original parameter order.
pub fn library_size_sweep(params: &SimParams, sizes: &[f64]) -> Vec<SweepRecord> {
    sizes
        .par_iter()
        .enumerate()
        .map(|(i, &library_size)| {
            debug!("library size {library_size}: generating {} reads", params.total_reads);
            let mut rng = reads::rng_for(params.seed, i as u64);
            let set = reads::uniform(params, library_size, &mut rng);
            let counts = duplicates::count_duplicates(&set, params.x_dist, params.y_dist);

            SweepRecord {
                library_size,
                global_rate: counts.global_rate(set.len()),
                local_rate: counts.local_rate(set.len()),
            }
        })
        .collect()
}

/// Runs one experiment per mixture model, in parallel, in the original
/// parameter order. A model that fails to generate aborts the whole sweep;
/// partial results are not reported.
pub fn mixture_sweep(params: &SimParams, models: &[MixtureSpec]) -> Result<Vec<MixtureRecord>> {
    models
        .par_iter()
        .enumerate()
        .map(|(i, spec)| {
            let mut rng = reads::rng_for(params.seed, i as u64);
            let set = reads::mixture(params, spec, &mut rng)
                .with_context(|| format!("generating reads for mixture model {i}"))?;
            let counts = duplicates::count_duplicates(&set, params.x_dist, params.y_dist);

            let resolved = spec.resolved(params.total_reads);
            Ok(MixtureRecord {
                sizes: resolved.iter().map(|s| s.size).collect(),
                fractions: resolved.iter().map(|s| s.fraction).collect(),
                global_rate: counts.global_rate(set.len()),
                local_rate: counts.local_rate(set.len()),
            })
        })
        .collect()
}
