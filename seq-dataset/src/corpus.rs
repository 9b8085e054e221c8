//! Row-major 2-D id array of tensorized examples.

use crate::{
    errors::{DatasetError, Result},
    vocab::TokenId,
};

/// `[rows, width]` matrix of token ids, one row per example.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Corpus {
    width: usize,
    data: Vec<TokenId>,
}

impl Corpus {
    /// An empty corpus whose rows will have `width` ids.
    pub fn new(width: usize) -> Result<Self> {
        if width == 0 {
            return Err(DatasetError::Config("corpus width must be > 0".into()));
        }
        Ok(Self {
            width,
            data: Vec::new(),
        })
    }

    pub fn from_rows<R: AsRef<[TokenId]>>(width: usize, rows: &[R]) -> Result<Self> {
        let mut corpus = Self::new(width)?;
        corpus.data.reserve(rows.len() * width);
        for row in rows {
            corpus.push_row(row.as_ref())?;
        }
        Ok(corpus)
    }

    pub fn push_row(&mut self, row: &[TokenId]) -> Result<()> {
        if row.len() != self.width {
            return Err(DatasetError::Config(format!(
                "row of length {} does not fit corpus width {}",
                row.len(),
                self.width
            )));
        }
        self.data.extend_from_slice(row);
        Ok(())
    }

    pub fn rows(&self) -> usize {
        self.data.len() / self.width
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows(), self.width)
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Row `i`. Panics when out of range, like slice indexing.
    pub fn row(&self, i: usize) -> &[TokenId] {
        &self.data[i * self.width..(i + 1) * self.width]
    }

    pub fn iter_rows(&self) -> impl ExactSizeIterator<Item = &[TokenId]> + '_ {
        self.data.chunks_exact(self.width)
    }

    /// Flat row-major view.
    pub fn as_slice(&self) -> &[TokenId] {
        &self.data
    }

    /// A new corpus made of the selected rows, in `indices` order.
    pub fn gather(&self, indices: &[usize]) -> Corpus {
        let mut data = Vec::with_capacity(indices.len() * self.width);
        for &i in indices {
            data.extend_from_slice(self.row(i));
        }
        Corpus {
            width: self.width,
            data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_and_gather() {
        let c = Corpus::from_rows(2, &[[1u32, 2], [3, 4], [5, 6]]).unwrap();
        assert_eq!(c.shape(), (3, 2));
        assert_eq!(c.row(1), &[3, 4]);
        let g = c.gather(&[2, 0]);
        assert_eq!(g.as_slice(), &[5, 6, 1, 2]);
        assert_eq!(c.iter_rows().len(), 3);
    }

    #[test]
    fn rejects_mismatched_rows() {
        let mut c = Corpus::new(3).unwrap();
        assert!(c.push_row(&[1, 2]).is_err());
        assert!(Corpus::new(0).is_err());
    }

    #[test]
    fn empty_corpus_has_zero_rows() {
        let c = Corpus::new(4).unwrap();
        assert!(c.is_empty());
        assert_eq!(c.shape(), (0, 4));
        assert_eq!(c.gather(&[]).rows(), 0);
    }
}
