// ============================================================
// Layer 4 — Corpus Splitter
// ============================================================
// Divides the corpus into the three ranges active learning uses:
//
//   seed:     first `seed_docs` documents, fully labeled
//   pool:     everything in between, labels withheld
//   held_out: last `held_out_docs` documents, scoring only
//
// Unlike a train/validation split this one is NOT shuffled:
// the loader returns documents in file-name order and the
// ranges must be reproducible from run to run.

use anyhow::{bail, Result};

use crate::domain::partition::CorpusPartition;

/// Split `total` documents into seed / pool / held-out ranges.
///
/// Fails if the seed and held-out sets together need more
/// documents than the corpus has.
pub fn partition_corpus(
    total:         usize,
    seed_docs:     usize,
    held_out_docs: usize,
) -> Result<CorpusPartition> {
    if seed_docs + held_out_docs > total {
        bail!(
            "corpus has {} documents but seed ({}) + held-out ({}) need {}",
            total,
            seed_docs,
            held_out_docs,
            seed_docs + held_out_docs
        );
    }

    let pool_end  = total - held_out_docs;
    let partition = CorpusPartition {
        seed:     0..seed_docs,
        pool:     seed_docs..pool_end,
        held_out: pool_end..total,
    };

    tracing::debug!(
        "Corpus split: {} seed, {} pool, {} held-out",
        partition.seed.len(),
        partition.pool.len(),
        partition.held_out.len(),
    );

    Ok(partition)
}
