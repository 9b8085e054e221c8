//! Bounded token vocabulary with reserved symbols.
//!
//! Ids `0..4` are always `%UNK%`, `%PAD%`, `%START%`, `%END%`; corpus tokens
//! follow in descending frequency, ties broken by first occurrence.

use crate::errors::{DatasetError, Result};
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fs, path::Path};
use tracing::{debug, info};

/// Integer id of a vocabulary entry.
pub type TokenId = u32;

pub const UNK_SYMBOL: &str = "%UNK%";
pub const PAD_SYMBOL: &str = "%PAD%";
pub const START_SYMBOL: &str = "%START%";
pub const END_SYMBOL: &str = "%END%";

/// Reserved symbols in id order.
pub const RESERVED_SYMBOLS: [&str; 4] = [UNK_SYMBOL, PAD_SYMBOL, START_SYMBOL, END_SYMBOL];

/// Frequency counter that remembers first-occurrence order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenCounter {
    index: HashMap<String, usize>,
    entries: Vec<(String, u64)>,
}

impl TokenCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, token: &str) {
        self.add_count(token, 1);
    }

    fn add_count(&mut self, token: &str, count: u64) {
        match self.index.get(token) {
            Some(&i) => self.entries[i].1 += count,
            None => {
                self.index.insert(token.to_string(), self.entries.len());
                self.entries.push((token.to_string(), count));
            }
        }
    }

    pub fn add_sequence<S: AsRef<str>>(&mut self, tokens: &[S]) {
        for t in tokens {
            self.add(t.as_ref());
        }
    }

    /// Fold `other` into `self`. Tokens first seen in `other` are ordered
    /// after every token already in `self`.
    pub fn merge(&mut self, other: TokenCounter) {
        for (token, count) in other.entries {
            self.add_count(&token, count);
        }
    }

    pub fn count(&self, token: &str) -> u64 {
        self.index.get(token).map_or(0, |&i| self.entries[i].1)
    }

    /// Number of distinct tokens.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The `n` most frequent tokens, ties in first-occurrence order.
    pub fn most_common(&self, n: usize) -> Vec<(&str, u64)> {
        let mut ranked: Vec<(&str, u64)> = self
            .entries
            .iter()
            .map(|(t, c)| (t.as_str(), *c))
            .collect();
        // stable sort keeps first-occurrence order among equal counts
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked.truncate(n);
        ranked
    }
}

/// Immutable token <-> id mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vocabulary {
    id_to_token: Vec<String>,
    token_to_id: HashMap<String, TokenId>,
}

/// On-disk form of a vocabulary.
#[derive(Serialize, Deserialize)]
struct VocabularyFile {
    tokens: Vec<String>,
}

impl Vocabulary {
    /// A vocabulary holding only the reserved symbols.
    pub fn reserved_only() -> Self {
        let mut vocab = Self {
            id_to_token: Vec::new(),
            token_to_id: HashMap::new(),
        };
        for sym in RESERVED_SYMBOLS {
            vocab.add_or_get_id(sym);
        }
        vocab
    }

    /// Reserved symbols plus the `vocab_size` most common counted tokens.
    ///
    /// A corpus token spelled like a reserved symbol maps to the reserved
    /// id, so the result never exceeds `vocab_size + 4` entries.
    pub fn from_counter(counter: &TokenCounter, vocab_size: usize) -> Self {
        let mut vocab = Self::reserved_only();
        for (token, _) in counter.most_common(vocab_size) {
            vocab.add_or_get_id(token);
        }
        debug!(
            distinct = counter.len(),
            kept = vocab.len(),
            "vocabulary built from counter"
        );
        vocab
    }

    fn add_or_get_id(&mut self, token: &str) -> TokenId {
        if let Some(&id) = self.token_to_id.get(token) {
            return id;
        }
        let id = self.id_to_token.len() as TokenId;
        self.id_to_token.push(token.to_string());
        self.token_to_id.insert(token.to_string(), id);
        id
    }

    /// Id of `token`, or the unknown id when it is not in the vocabulary.
    pub fn get_id_or_unk(&self, token: &str) -> TokenId {
        self.token_to_id
            .get(token)
            .copied()
            .unwrap_or(self.unk_id())
    }

    pub fn get_name_for_id(&self, id: TokenId) -> Option<&str> {
        self.id_to_token.get(id as usize).map(String::as_str)
    }

    pub fn contains(&self, token: &str) -> bool {
        self.token_to_id.contains_key(token)
    }

    pub fn len(&self) -> usize {
        self.id_to_token.len()
    }

    /// Always false: the reserved symbols are present.
    pub fn is_empty(&self) -> bool {
        self.id_to_token.is_empty()
    }

    /// Tokens in id order.
    pub fn tokens(&self) -> &[String] {
        &self.id_to_token
    }

    pub fn unk_id(&self) -> TokenId {
        0
    }

    pub fn pad_id(&self) -> TokenId {
        1
    }

    pub fn start_id(&self) -> TokenId {
        2
    }

    pub fn end_id(&self) -> TokenId {
        3
    }

    /// Write the vocabulary as `{"tokens": [...]}` in id order.
    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = VocabularyFile {
            tokens: self.id_to_token.clone(),
        };
        fs::write(path.as_ref(), serde_json::to_vec_pretty(&file)?)?;
        info!("vocabulary: saved {} entries to {}", self.len(), path.as_ref().display());
        Ok(())
    }

    /// Read a vocabulary written by [`Vocabulary::save_json`].
    ///
    /// # Errors
    /// [`DatasetError::InvalidVocabulary`] when the reserved symbols are not
    /// at ids `0..4` or a token appears twice.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self> {
        let data = fs::read(path.as_ref())?;
        let file: VocabularyFile = serde_json::from_slice(&data)?;
        Self::from_tokens(file.tokens)
    }

    fn from_tokens(tokens: Vec<String>) -> Result<Self> {
        for (id, sym) in RESERVED_SYMBOLS.iter().enumerate() {
            if tokens.get(id).map(String::as_str) != Some(*sym) {
                return Err(DatasetError::InvalidVocabulary(format!(
                    "expected {sym} at id {id}"
                )));
            }
        }
        let mut token_to_id = HashMap::with_capacity(tokens.len());
        for (id, token) in tokens.iter().enumerate() {
            if token_to_id.insert(token.clone(), id as TokenId).is_some() {
                return Err(DatasetError::InvalidVocabulary(format!(
                    "duplicate token {token:?}"
                )));
            }
        }
        Ok(Self {
            id_to_token: tokens,
            token_to_id,
        })
    }
}

/// Count every token of every sequence and keep the `vocab_size` most common.
pub fn build_vocab<I>(sequences: I, vocab_size: usize) -> Vocabulary
where
    I: IntoIterator,
    I::Item: AsRef<[String]>,
{
    let mut counter = TokenCounter::new();
    for seq in sequences {
        counter.add_sequence(seq.as_ref());
    }
    Vocabulary::from_counter(&counter, vocab_size)
}
