//! Minibatch iteration over a tensorized corpus.

use crate::{
    corpus::Corpus,
    errors::{DatasetError, Result},
};
use rand::{Rng, seq::SliceRandom};
use tracing::trace;

/// Lazy sequence of `[batch_size, width]` batches.
///
/// Every emitted batch is a fresh copy of the selected rows. Row indices
/// are partitioned once at construction time, so each row appears in at
/// most one batch.
#[derive(Debug)]
pub struct Minibatches<'a> {
    corpus: &'a Corpus,
    indices: Vec<usize>,
    batch_size: usize,
    drop_remainder: bool,
    cursor: usize,
}

/// Batches over `corpus`; shuffled with the thread-local RNG when `is_training`.
pub fn get_minibatch_iterator(
    corpus: &Corpus,
    batch_size: usize,
    is_training: bool,
    drop_remainder: bool,
) -> Result<Minibatches<'_>> {
    get_minibatch_iterator_with_rng(
        corpus,
        batch_size,
        is_training,
        drop_remainder,
        &mut rand::thread_rng(),
    )
}

/// Same as [`get_minibatch_iterator`], drawing the permutation from `rng`.
pub fn get_minibatch_iterator_with_rng<'a, R: Rng + ?Sized>(
    corpus: &'a Corpus,
    batch_size: usize,
    is_training: bool,
    drop_remainder: bool,
    rng: &mut R,
) -> Result<Minibatches<'a>> {
    if batch_size == 0 {
        return Err(DatasetError::Config("batch_size must be > 0".into()));
    }
    let mut indices: Vec<usize> = (0..corpus.rows()).collect();
    if is_training {
        indices.shuffle(rng);
    }
    trace!(
        rows = indices.len(),
        batch_size, is_training, drop_remainder, "minibatch iterator"
    );
    Ok(Minibatches {
        corpus,
        indices,
        batch_size,
        drop_remainder,
        cursor: 0,
    })
}

impl Minibatches<'_> {
    /// Row indices of the next batch, without materializing it.
    fn next_chunk(&mut self) -> Option<&[usize]> {
        let remaining = self.indices.len() - self.cursor;
        if remaining == 0 || (remaining < self.batch_size && self.drop_remainder) {
            return None;
        }
        let take = remaining.min(self.batch_size);
        let chunk = &self.indices[self.cursor..self.cursor + take];
        self.cursor += take;
        Some(chunk)
    }

    fn batches_left(&self) -> usize {
        let remaining = self.indices.len() - self.cursor;
        if self.drop_remainder {
            remaining / self.batch_size
        } else {
            remaining.div_ceil(self.batch_size)
        }
    }
}

impl Iterator for Minibatches<'_> {
    type Item = Corpus;

    fn next(&mut self) -> Option<Corpus> {
        let corpus = self.corpus;
        self.next_chunk().map(|chunk| corpus.gather(chunk))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.batches_left();
        (n, Some(n))
    }
}

impl ExactSizeIterator for Minibatches<'_> {}
