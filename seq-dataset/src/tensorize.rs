//! Fixed-length integer encoding of token sequences.
//!
//! Layout for length `L` and a sequence of `n` tokens:
//!
//! ```text
//! n < L-1:  [START, t0, .., t(n-1), END, PAD, .., PAD]
//! n >= L-1: [START, t0, .., t(L-2)]            (truncated, no END)
//! ```

use crate::{
    corpus::Corpus,
    errors::{DatasetError, Result},
    vocab::{TokenId, Vocabulary},
};

/// Encode one token sequence into exactly `length` ids.
///
/// Unseen tokens map to the unknown id. Sequences too long for `length`
/// are cut without an end marker.
///
/// # Errors
/// [`DatasetError::Config`] when `length < 2`.
pub fn tensorise_token_sequence<S: AsRef<str>>(
    vocab: &Vocabulary,
    length: usize,
    token_seq: &[S],
) -> Result<Vec<TokenId>> {
    check_length(length)?;
    let mut out = Vec::with_capacity(length);
    out.push(vocab.start_id());
    out.extend(
        token_seq
            .iter()
            .take(length - 1)
            .map(|t| vocab.get_id_or_unk(t.as_ref())),
    );
    if out.len() < length {
        out.push(vocab.end_id());
    }
    out.resize(length, vocab.pad_id());
    Ok(out)
}

/// Encode a stream of token sequences into a `[n, length]` corpus.
pub fn tensorise_corpus<I>(vocab: &Vocabulary, length: usize, sequences: I) -> Result<Corpus>
where
    I: IntoIterator,
    I::Item: AsRef<[String]>,
{
    check_length(length)?;
    let mut corpus = Corpus::new(length)?;
    for seq in sequences {
        corpus.push_row(&tensorise_token_sequence(vocab, length, seq.as_ref())?)?;
    }
    Ok(corpus)
}

pub(crate) fn check_length(length: usize) -> Result<()> {
    if length < 2 {
        return Err(DatasetError::Config(format!(
            "sequence length must be >= 2, got {length}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vocab::build_vocab;

    fn vocab_of(tokens: &[&str]) -> Vocabulary {
        let seq: Vec<String> = tokens.iter().map(|t| t.to_string()).collect();
        build_vocab([seq], 100)
    }

    #[test]
    fn pads_after_end_marker() {
        let vocab = vocab_of(&["public", "int", "foo"]);
        let row = tensorise_token_sequence(&vocab, 6, &["public", "int", "foo"]).unwrap();
        let id = |t| vocab.get_id_or_unk(t);
        assert_eq!(
            row,
            vec![vocab.start_id(), id("public"), id("int"), id("foo"), vocab.end_id(), vocab.pad_id()]
        );
    }

    #[test]
    fn short_sequences_hold_start_end_and_padding() {
        let vocab = vocab_of(&["a", "b"]);
        for n in 0..5usize {
            let seq: Vec<&str> = ["a", "b", "a", "b", "a"][..n].to_vec();
            let length = n + 4;
            let row = tensorise_token_sequence(&vocab, length, &seq).unwrap();
            assert_eq!(row.len(), length);
            assert_eq!(row[0], vocab.start_id());
            assert_eq!(row[n + 1], vocab.end_id());
            assert!(row[n + 2..].iter().all(|&x| x == vocab.pad_id()));
        }
    }

    #[test]
    fn exact_fit_drops_end_marker() {
        // n == L-1: every slot after START is a token.
        let vocab = vocab_of(&["a", "b", "c"]);
        let row = tensorise_token_sequence(&vocab, 4, &["a", "b", "c"]).unwrap();
        assert!(!row.contains(&vocab.end_id()));
        assert_eq!(row[1..], [4, 5, 6]);
    }

    #[test]
    fn long_sequences_are_truncated_without_end_marker() {
        let vocab = vocab_of(&["a", "b", "c", "d", "e"]);
        let seq = ["a", "b", "c", "d", "e"];
        let row = tensorise_token_sequence(&vocab, 3, &seq).unwrap();
        assert_eq!(row, vec![vocab.start_id(), vocab.get_id_or_unk("a"), vocab.get_id_or_unk("b")]);
        assert!(!row.contains(&vocab.end_id()));
    }

    #[test]
    fn unknown_tokens_map_to_unk() {
        let vocab = vocab_of(&["a"]);
        let row = tensorise_token_sequence(&vocab, 4, &["zzz"]).unwrap();
        assert_eq!(row, vec![vocab.start_id(), vocab.unk_id(), vocab.end_id(), vocab.pad_id()]);
    }

    #[test]
    fn minimum_length_is_start_plus_one() {
        let vocab = vocab_of(&["a"]);
        assert_eq!(
            tensorise_token_sequence::<&str>(&vocab, 2, &[]).unwrap(),
            vec![vocab.start_id(), vocab.end_id()]
        );
        assert_eq!(
            tensorise_token_sequence(&vocab, 2, &["a"]).unwrap(),
            vec![vocab.start_id(), vocab.get_id_or_unk("a")]
        );
    }

    #[test]
    fn lengths_below_two_are_config_errors() {
        let vocab = vocab_of(&["a"]);
        for length in [0, 1] {
            assert!(matches!(
                tensorise_token_sequence(&vocab, length, &["a"]),
                Err(DatasetError::Config(_))
            ));
        }
    }

    #[test]
    fn corpus_has_one_row_per_sequence() {
        let vocab = vocab_of(&["a", "b"]);
        let seqs = vec![
            vec!["a".to_string()],
            vec!["b".to_string(), "a".to_string()],
        ];
        let corpus = tensorise_corpus(&vocab, 5, &seqs).unwrap();
        assert_eq!(corpus.shape(), (2, 5));
        assert_eq!(corpus.row(1)[1..3], [vocab.get_id_or_unk("b"), vocab.get_id_or_unk("a")]);
    }
}
