use crate::reads::ReadSet;

use indexmap::IndexMap;
use rayon::prelude::*;
use serde::Serialize;

/// Number of duplicate groups handed to each worker task. Group evaluations
/// are independent, so chunks reduce by plain summation in any order.
const GROUP_CHUNK: usize = 1024;

/// Duplicate counts for one read set.
///
/// `global` counts every extra copy of a repeated identity, ignoring
/// position. `local` counts the subset of those copies that a
/// proximity-based deduplication tool would actually flag: same tile, and
/// within the rectangular search window of an earlier copy.
#[derive(Copy, Clone, Debug, Serialize)]
pub struct DuplicateCounts {
    pub global: u64,
    pub local: u64,
}

impl DuplicateCounts {
    pub fn global_rate(&self, total_reads: usize) -> f64 {
        self.global as f64 / total_reads as f64
    }

    pub fn local_rate(&self, total_reads: usize) -> f64 {
        self.local as f64 / total_reads as f64
    }
}

/// Groups reads by identity, preserving first-seen order. Read indices fit
/// in u32 at the simulated scales, which halves the map's memory footprint.
fn group_by_identity(reads: &ReadSet) -> IndexMap<u64, Vec<u32>> {
    let mut by_identity: IndexMap<u64, Vec<u32>> = IndexMap::new();

    for (i, &identity) in reads.identities.iter().enumerate() {
        by_identity
            .entry(identity)
            .and_modify(|e| e.push(i as u32))
            .or_insert_with(|| vec![i as u32]);
    }

    by_identity
}

/// Counts local duplicates within one identity group.
///
/// Read j of the group is flagged if ANY earlier member (0..j) lies on the
/// same tile with |Δx| < x_dist and |Δy| < y_dist, strict on both axes.
/// Each read is credited at most once, no matter how many earlier members
/// it is close to. A full pairwise count would come out higher; this
/// per-read flag matches what a window-based deduplicator reports.
fn local_in_group(reads: &ReadSet, group: &[u32], x_dist: u32, y_dist: u32) -> u64 {
    let mut flagged = 0;

    for j in 1..group.len() {
        let b = group[j] as usize;
        let close_to_earlier = group[..j].iter().any(|&i| {
            let a = i as usize;
            reads.tiles[a] == reads.tiles[b]
                && reads.xs[a].abs_diff(reads.xs[b]) < x_dist
                && reads.ys[a].abs_diff(reads.ys[b]) < y_dist
        });
        if close_to_earlier {
            flagged += 1;
        }
    }

    flagged
}

/// Computes the global and local duplicate counts of a read set.
///
/// The global count is `len - distinct identities`. The local count sums
/// the per-group window test over all identity groups of size > 1; the
/// group list is split into fixed-size chunks evaluated in parallel.
pub fn count_duplicates(reads: &ReadSet, x_dist: u32, y_dist: u32) -> DuplicateCounts {
    let by_identity = group_by_identity(reads);

    let global = (reads.len() - by_identity.len()) as u64;

    // singleton groups cannot contribute to either count
    let groups: Vec<&[u32]> = by_identity
        .values()
        .filter(|indices| indices.len() > 1)
        .map(|indices| indices.as_slice())
        .collect();

    let local = groups
        .par_chunks(GROUP_CHUNK)
        .map(|chunk| {
            chunk
                .iter()
                .map(|group| local_in_group(reads, group, x_dist, y_dist))
                .sum::<u64>()
        })
        .sum();

    DuplicateCounts { global, local }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_set(identities: &[u64], xs: &[u32], ys: &[u32], tiles: &[u32]) -> ReadSet {
        ReadSet {
            identities: identities.to_vec(),
            xs: xs.to_vec(),
            ys: ys.to_vec(),
            tiles: tiles.to_vec(),
        }
    }

    #[test]
    fn distinct_identities_count_nothing() {
        let reads = read_set(
            &[0, 1, 2, 3],
            &[100, 100, 100, 100],
            &[100, 100, 100, 100],
            &[0, 0, 0, 0],
        );
        let counts = count_duplicates(&reads, 50, 50);
        assert_eq!(counts.global, 0);
        assert_eq!(counts.local, 0);
    }

    #[test]
    fn collapsed_positions_flag_every_extra_read() {
        // all reads share one identity and one exact position
        let n = 7;
        let reads = read_set(&vec![9; n], &vec![100; n], &vec![200; n], &vec![3; n]);
        let counts = count_duplicates(&reads, 50, 50);
        assert_eq!(counts.global, (n - 1) as u64);
        assert_eq!(counts.local, (n - 1) as u64);
    }

    #[test]
    fn global_count_ignores_position() {
        let reads = read_set(
            &[1, 1, 2, 2, 3],
            &[0, 30000, 0, 30000, 0],
            &[0, 40000, 0, 40000, 0],
            &[0, 1, 0, 1, 0],
        );
        let counts = count_duplicates(&reads, 50, 50);
        assert_eq!(counts.global, 2);
        assert_eq!(counts.local, 0);
    }

    #[test]
    fn local_never_exceeds_global() {
        let reads = read_set(
            &[1, 1, 1, 2, 2, 3],
            &[100, 120, 9000, 500, 510, 100],
            &[100, 120, 9000, 500, 510, 100],
            &[0, 0, 0, 1, 1, 2],
        );
        let counts = count_duplicates(&reads, 50, 50);
        assert!(counts.local <= counts.global);
        assert_eq!(counts.global, 3);
        assert_eq!(counts.local, 2);
    }

    #[test]
    fn counting_is_deterministic() {
        let reads = read_set(
            &[1, 1, 2, 2, 1],
            &[100, 110, 500, 505, 112],
            &[100, 110, 500, 505, 112],
            &[0, 0, 0, 0, 0],
        );
        let first = count_duplicates(&reads, 50, 50);
        for _ in 0..10 {
            let again = count_duplicates(&reads, 50, 50);
            assert_eq!(again.global, first.global);
            assert_eq!(again.local, first.local);
        }
    }

    #[test]
    fn threshold_is_strict() {
        // |Δx| exactly at the threshold must not count
        let reads = read_set(&[1, 1], &[100, 150], &[100, 100], &[0, 0]);
        let counts = count_duplicates(&reads, 50, 50);
        assert_eq!(counts.global, 1);
        assert_eq!(counts.local, 0);

        // one unit inside the threshold must count
        let reads = read_set(&[1, 1], &[100, 149], &[100, 100], &[0, 0]);
        let counts = count_duplicates(&reads, 50, 50);
        assert_eq!(counts.local, 1);
    }

    #[test]
    fn window_is_rectangular_and_same_tile() {
        // within the x window but on different tiles
        let reads = read_set(&[1, 1], &[100, 110], &[100, 110], &[0, 1]);
        assert_eq!(count_duplicates(&reads, 50, 50).local, 0);

        // same tile, x close, y outside
        let reads = read_set(&[1, 1], &[100, 110], &[100, 400], &[0, 0]);
        assert_eq!(count_duplicates(&reads, 50, 50).local, 0);
    }

    #[test]
    fn close_pairs_scenario() {
        let reads = read_set(
            &[1, 1, 2, 2],
            &[100, 100, 500, 500],
            &[100, 100, 500, 500],
            &[0, 0, 0, 0],
        );
        let counts = count_duplicates(&reads, 50, 50);
        assert_eq!(counts.global, 2);
        assert_eq!(counts.local, 2);
    }

    #[test]
    fn distant_pairs_scenario() {
        let reads = read_set(
            &[1, 1, 2, 2],
            &[100, 200, 500, 600],
            &[100, 100, 500, 500],
            &[0, 0, 0, 0],
        );
        let counts = count_duplicates(&reads, 50, 50);
        assert_eq!(counts.global, 2);
        assert_eq!(counts.local, 0);
    }

    #[test]
    fn each_read_is_flagged_at_most_once() {
        // the third read is close to both earlier copies, but contributes 1
        let reads = read_set(&[1, 1, 1], &[100, 105, 110], &[100, 105, 110], &[0, 0, 0]);
        let counts = count_duplicates(&reads, 50, 50);
        assert_eq!(counts.global, 2);
        assert_eq!(counts.local, 2);
    }

    #[test]
    fn later_read_can_match_any_earlier_member() {
        // reads 0 and 1 are far apart; read 2 sits next to read 1 only.
        // read 1 is not flagged, read 2 is.
        let reads = read_set(
            &[1, 1, 1],
            &[100, 10000, 10010],
            &[100, 10000, 10010],
            &[0, 0, 0],
        );
        let counts = count_duplicates(&reads, 50, 50);
        assert_eq!(counts.global, 2);
        assert_eq!(counts.local, 1);
    }

    #[test]
    fn rates_divide_by_total_reads() {
        let counts = DuplicateCounts { global: 5, local: 2 };
        assert!((counts.global_rate(10) - 0.5).abs() < 1e-12);
        assert!((counts.local_rate(10) - 0.2).abs() < 1e-12);
    }
}
