use crate::config::SimParams;

use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256StarStar;
use thiserror::Error;

/// Reads tolerated below a full fraction sum before a residual sub-library
/// is generated for the remainder.
const RESIDUAL_EPSILON: f64 = 1e-5;

/// A set of simulated reads, stored as parallel arrays.
///
/// `identities[i]` stands in for the original template molecule of read `i`;
/// two reads sharing an identity are amplification duplicates. `xs`, `ys`
/// and `tiles` give the physical position of the read on the simulated
/// flow cell. Nothing here is mutated after generation.
pub struct ReadSet {
    pub identities: Vec<u64>,
    pub xs: Vec<u32>,
    pub ys: Vec<u32>,
    pub tiles: Vec<u32>,
}

impl ReadSet {
    fn with_capacity(n: usize) -> Self {
        ReadSet {
            identities: Vec::with_capacity(n),
            xs: Vec::with_capacity(n),
            ys: Vec::with_capacity(n),
            tiles: Vec::with_capacity(n),
        }
    }

    pub fn len(&self) -> usize {
        self.identities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }

    /// Appends `count` reads with identities uniform in `[0, library_size)`
    /// and positions uniform over the configured coordinate ranges.
    fn extend_uniform(
        &mut self,
        params: &SimParams,
        library_size: f64,
        count: usize,
        rng: &mut Xoshiro256StarStar,
    ) {
        // library sizes below 1 degenerate; clamp as the reference model does
        let library_size = library_size.max(1.0) as u64;

        for _ in 0..count {
            self.identities.push(rng.gen_range(0..library_size));
            self.xs
                .push(rng.gen_range(params.x_range.start..params.x_range.end));
            self.ys
                .push(rng.gen_range(params.y_range.start..params.y_range.end));
            self.tiles.push(rng.gen_range(0..params.tile_count));
        }
    }
}

/// Creates the RNG for one experiment. A fixed base seed gives each
/// parameter combination its own stream, so sweep results do not depend on
/// which worker picks up which task.
pub fn rng_for(seed: Option<u64>, stream: u64) -> Xoshiro256StarStar {
    match seed {
        Some(s) => Xoshiro256StarStar::seed_from_u64(s.wrapping_add(stream)),
        None => Xoshiro256StarStar::from_entropy(),
    }
}

/// Generates `params.total_reads` reads sampled from a single library of
/// `library_size` distinct identities.
pub fn uniform(params: &SimParams, library_size: f64, rng: &mut Xoshiro256StarStar) -> ReadSet {
    let mut reads = ReadSet::with_capacity(params.total_reads);
    reads.extend_uniform(params, library_size, params.total_reads, rng);
    reads
}

/// One sub-library of a mixture: a pool of `size` distinct identities from
/// which `fraction` of the total reads are drawn.
#[derive(Clone, Debug)]
pub struct SubLibrary {
    pub size: f64,
    pub fraction: f64,
}

/// A sub-library mixture, modelling overrepresented transcripts or
/// amplicons: the read set is partitioned into contiguous blocks, each
/// sampled from its own (smaller) identity pool.
#[derive(Clone, Debug)]
pub struct MixtureSpec {
    pub sub_libraries: Vec<SubLibrary>,
}

#[derive(Debug, Error)]
pub enum GenerateErr {
    #[error("a mixture needs at least one sub-library")]
    EmptyMixture,
    #[error("sub-library fraction {fraction} is outside (0, 1]")]
    InvalidFraction { fraction: f64 },
    #[error("sub-library fractions sum to {sum}, which exceeds 1")]
    FractionOverflow { sum: f64 },
}

impl MixtureSpec {
    pub fn new(sub_libraries: Vec<SubLibrary>) -> Result<Self, GenerateErr> {
        let spec = MixtureSpec { sub_libraries };
        spec.validate()?;
        Ok(spec)
    }

    pub fn validate(&self) -> Result<(), GenerateErr> {
        if self.sub_libraries.is_empty() {
            return Err(GenerateErr::EmptyMixture);
        }
        for sub in &self.sub_libraries {
            if !(sub.fraction > 0.0 && sub.fraction <= 1.0) {
                return Err(GenerateErr::InvalidFraction {
                    fraction: sub.fraction,
                });
            }
        }
        let sum: f64 = self.sub_libraries.iter().map(|s| s.fraction).sum();
        if sum > 1.0 + RESIDUAL_EPSILON {
            return Err(GenerateErr::FractionOverflow { sum });
        }
        Ok(())
    }

    /// The sub-libraries that will actually be generated: the specified
    /// ones, plus a residual sub-library covering any unassigned fraction.
    /// The residual pool has one identity per remaining read, i.e. it is
    /// effectively duplicate-free background.
    pub fn resolved(&self, total_reads: usize) -> Vec<SubLibrary> {
        let mut subs = self.sub_libraries.clone();
        let remaining = 1.0 - subs.iter().map(|s| s.fraction).sum::<f64>();
        if remaining > RESIDUAL_EPSILON {
            subs.push(SubLibrary {
                size: total_reads as f64 * remaining,
                fraction: remaining,
            });
        }
        subs
    }
}

/// Generates reads from a sub-library mixture. Each sub-library fills one
/// contiguous block of `floor(total_reads * fraction)` reads; the returned
/// set's length is the sum of the block lengths, which may fall slightly
/// short of `params.total_reads` due to flooring.
///
/// Identity values are not offset between blocks: all sub-libraries share
/// one identity space, matching the reference model.
pub fn mixture(
    params: &SimParams,
    spec: &MixtureSpec,
    rng: &mut Xoshiro256StarStar,
) -> Result<ReadSet, GenerateErr> {
    spec.validate()?;

    let mut reads = ReadSet::with_capacity(params.total_reads);
    for sub in spec.resolved(params.total_reads) {
        let count = (params.total_reads as f64 * sub.fraction) as usize;
        reads.extend_uniform(params, sub.size, count, rng);
    }
    Ok(reads)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_params() -> SimParams {
        SimParams {
            total_reads: 1000,
            seed: Some(42),
            ..SimParams::default()
        }
    }

    #[test]
    fn uniform_respects_ranges() {
        let params = small_params();
        let mut rng = rng_for(params.seed, 0);
        let reads = uniform(&params, 50.0, &mut rng);

        assert_eq!(reads.len(), 1000);
        assert!(reads.identities.iter().all(|&id| id < 50));
        assert!(reads
            .xs
            .iter()
            .all(|&x| x >= params.x_range.start && x < params.x_range.end));
        assert!(reads
            .ys
            .iter()
            .all(|&y| y >= params.y_range.start && y < params.y_range.end));
        assert!(reads.tiles.iter().all(|&t| t < params.tile_count));
    }

    #[test]
    fn tiny_library_sizes_clamp_to_one() {
        let params = small_params();
        let mut rng = rng_for(params.seed, 0);
        let reads = uniform(&params, 0.25, &mut rng);
        assert!(reads.identities.iter().all(|&id| id == 0));
    }

    #[test]
    fn seeded_generation_is_reproducible() {
        let params = small_params();
        let a = uniform(&params, 100.0, &mut rng_for(params.seed, 3));
        let b = uniform(&params, 100.0, &mut rng_for(params.seed, 3));
        assert_eq!(a.identities, b.identities);
        assert_eq!(a.xs, b.xs);
        assert_eq!(a.ys, b.ys);
        assert_eq!(a.tiles, b.tiles);
    }

    #[test]
    fn mixture_appends_residual_sub_library() {
        let spec = MixtureSpec::new(vec![
            SubLibrary {
                size: 10.0,
                fraction: 0.25,
            },
            SubLibrary {
                size: 20.0,
                fraction: 0.25,
            },
        ])
        .unwrap();

        let resolved = spec.resolved(1000);
        assert_eq!(resolved.len(), 3);
        assert!((resolved[2].fraction - 0.5).abs() < 1e-9);
        assert!((resolved[2].size - 500.0).abs() < 1e-6);
    }

    #[test]
    fn mixture_with_full_fraction_has_no_residual() {
        let spec = MixtureSpec::new(vec![SubLibrary {
            size: 10.0,
            fraction: 1.0,
        }])
        .unwrap();
        assert_eq!(spec.resolved(1000).len(), 1);
    }

    #[test]
    fn mixture_block_lengths_sum() {
        let params = small_params();
        let spec = MixtureSpec::new(vec![
            SubLibrary {
                size: 5.0,
                fraction: 0.1,
            },
            SubLibrary {
                size: 5.0,
                fraction: 0.2,
            },
        ])
        .unwrap();

        let mut rng = rng_for(params.seed, 0);
        let reads = mixture(&params, &spec, &mut rng).unwrap();
        // 100 + 200 + 700 residual reads
        assert_eq!(reads.len(), 1000);
    }

    #[test]
    fn overfull_fractions_are_rejected() {
        let err = MixtureSpec::new(vec![
            SubLibrary {
                size: 10.0,
                fraction: 0.9,
            },
            SubLibrary {
                size: 10.0,
                fraction: 0.5,
            },
        ])
        .unwrap_err();
        assert!(matches!(err, GenerateErr::FractionOverflow { .. }));
    }

    #[test]
    fn non_positive_fractions_are_rejected() {
        let err = MixtureSpec::new(vec![SubLibrary {
            size: 10.0,
            fraction: 0.0,
        }])
        .unwrap_err();
        assert!(matches!(err, GenerateErr::InvalidFraction { .. }));

        assert!(matches!(
            MixtureSpec::new(vec![]).unwrap_err(),
            GenerateErr::EmptyMixture
        ));
    }
}
