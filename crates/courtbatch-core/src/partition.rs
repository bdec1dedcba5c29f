//! Dataset partitioning and seeded sampling.
//!
//! Partitioning mirrors a balanced array split: with `len = q * nprocs + r`,
//! the first `r` chunks hold `q + 1` records and the rest hold `q`. Chunks are
//! contiguous, so concatenating them by ascending `pid` gives back the dataset.

use std::ops::Range;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::{Dataset, Error, Record, Result, TRACING_TARGET_PARTITION};

/// One worker's slice of the dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct Partition {
    pid: usize,
    nprocs: usize,
    records: Vec<Record>,
}

impl Partition {
    /// Returns the worker index.
    pub fn pid(&self) -> usize {
        self.pid
    }

    /// Returns the total number of workers.
    pub fn nprocs(&self) -> usize {
        self.nprocs
    }

    /// Chunk index used in storage paths, `None` when the run is unchunked.
    pub fn chunk_index(&self) -> Option<usize> {
        (self.nprocs > 1).then_some(self.pid)
    }

    /// Returns `true` when there is nothing for this worker to do.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns the number of records in the chunk.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns the chunk's records in dataset order.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Consumes the partition and returns its records.
    pub fn into_records(self) -> Vec<Record> {
        self.records
    }
}

/// Range of dataset indices assigned to `pid`.
///
/// Callers must ensure `pid < nprocs`.
pub fn chunk_bounds(len: usize, nprocs: usize, pid: usize) -> Range<usize> {
    let base = len / nprocs;
    let extra = len % nprocs;
    let start = pid * base + pid.min(extra);
    let size = base + usize::from(pid < extra);
    start..start + size
}

/// Returns the chunk of `dataset` assigned to worker `pid` out of `nprocs`.
///
/// # Errors
///
/// Returns [`Error::InvalidPartitionRequest`] unless `pid < nprocs`.
pub fn partition(dataset: &Dataset, nprocs: usize, pid: usize) -> Result<Partition> {
    if pid >= nprocs {
        return Err(Error::InvalidPartitionRequest { pid, nprocs });
    }

    let bounds = chunk_bounds(dataset.len(), nprocs, pid);
    tracing::debug!(
        target: TRACING_TARGET_PARTITION,
        pid,
        nprocs,
        start = bounds.start,
        end = bounds.end,
        "Partitioned dataset"
    );

    Ok(Partition {
        pid,
        nprocs,
        records: dataset.records()[bounds].to_vec(),
    })
}

/// Draws `k` records from `dataset` with a seeded generator.
///
/// The same `(dataset, k, seed)` always yields the same sample. Sampled
/// records keep their original relative order.
///
/// # Errors
///
/// Returns [`Error::InvalidSampleSize`] when `k` exceeds the dataset length.
pub fn sample(dataset: &Dataset, k: usize, seed: u64) -> Result<Dataset> {
    let available = dataset.len();
    if k > available {
        return Err(Error::InvalidSampleSize {
            requested: k,
            available,
        });
    }

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut indices = rand::seq::index::sample(&mut rng, available, k).into_vec();
    indices.sort_unstable();

    tracing::debug!(
        target: TRACING_TARGET_PARTITION,
        requested = k,
        available,
        seed,
        "Sampled dataset"
    );

    Ok(indices
        .into_iter()
        .map(|i| dataset.records()[i].clone())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset(len: usize) -> Dataset {
        (0..len).map(|i| Record::from(format!("id-{i}"))).collect()
    }

    #[test]
    fn chunks_reconstruct_dataset() {
        for len in [0, 1, 2, 7, 10, 33] {
            let data = dataset(len);
            for nprocs in 1..=12 {
                let joined: Vec<Record> = (0..nprocs)
                    .flat_map(|pid| partition(&data, nprocs, pid).unwrap().into_records())
                    .collect();
                assert_eq!(joined, data.records(), "len={len} nprocs={nprocs}");
            }
        }
    }

    #[test]
    fn chunks_are_balanced() {
        for len in [0, 5, 11, 100] {
            let data = dataset(len);
            for nprocs in 1..=9 {
                let sizes: Vec<usize> = (0..nprocs)
                    .map(|pid| partition(&data, nprocs, pid).unwrap().len())
                    .collect();
                let max = sizes.iter().max().unwrap();
                let min = sizes.iter().min().unwrap();
                assert!(max - min <= 1, "len={len} nprocs={nprocs} sizes={sizes:?}");
            }
        }
    }

    #[test]
    fn larger_chunks_come_first() {
        let data = dataset(7);
        let sizes: Vec<usize> = (0..3)
            .map(|pid| partition(&data, 3, pid).unwrap().len())
            .collect();
        assert_eq!(sizes, [3, 2, 2]);
    }

    #[test]
    fn single_process_is_unchunked() {
        let data = dataset(4);
        let part = partition(&data, 1, 0).unwrap();
        assert_eq!(part.chunk_index(), None);
        assert_eq!(part.len(), 4);

        let part = partition(&data, 2, 1).unwrap();
        assert_eq!(part.chunk_index(), Some(1));
    }

    #[test]
    fn rejects_out_of_range_pid() {
        let data = dataset(4);
        assert!(matches!(
            partition(&data, 2, 2),
            Err(Error::InvalidPartitionRequest { pid: 2, nprocs: 2 })
        ));
        assert!(matches!(
            partition(&data, 0, 0),
            Err(Error::InvalidPartitionRequest { .. })
        ));
    }

    #[test]
    fn fewer_records_than_workers_leaves_empty_chunks() {
        let data = dataset(2);
        assert!(!partition(&data, 3, 1).unwrap().is_empty());
        assert!(partition(&data, 3, 2).unwrap().is_empty());
    }

    #[test]
    fn sampling_is_deterministic() {
        let data = dataset(50);
        let a = sample(&data, 10, 42).unwrap();
        let b = sample(&data, 10, 42).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 10);

        let c = sample(&data, 10, 43).unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn sample_keeps_original_order() {
        let data = dataset(30);
        let picked = sample(&data, 12, 1).unwrap();
        let positions: Vec<usize> = picked
            .iter()
            .map(|r| data.iter().position(|d| d == r).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn sample_larger_than_dataset_fails() {
        let data = dataset(3);
        assert!(matches!(
            sample(&data, 4, 0),
            Err(Error::InvalidSampleSize {
                requested: 4,
                available: 3
            })
        ));
    }
}
