//! Vocabulary construction and the subsampled token stream.
//!
//! The vocabulary is built in one pass over the corpus, then filtered by
//! minimum occurrence count and ordered by descending frequency (ties keep
//! first-seen order). During training it serves id lines via [`Vocabulary::get_line`],
//! applying word2vec-style frequency subsampling.

mod reader;

use std::collections::HashMap;
use std::io::{self, BufRead, Seek};

use rand::Rng;

use crate::error::{Error, Result};

pub use reader::{CorpusReader, EOS};

/// Index of a word in the vocabulary.
pub type WordId = u32;

/// A vocabulary word and its occurrence count.
#[derive(Debug, Clone)]
pub struct WordEntry {
    pub word: Vec<u8>,
    pub count: u64,
}

/// The trainer's view of the corpus vocabulary.
pub struct Vocabulary {
    words: Vec<WordEntry>,
    index: HashMap<Vec<u8>, WordId>,
    retention: Vec<f64>,
    n_tokens: u64,
}

impl Vocabulary {
    /// Build the vocabulary by counting token occurrences in `reader`,
    /// keeping words that occur at least `min_count` times. `subsample_t`
    /// is the subsampling threshold (≤ 0 disables subsampling).
    pub fn from_corpus<R: BufRead>(
        reader: &mut CorpusReader<R>,
        min_count: u64,
        subsample_t: f64,
    ) -> Result<Self> {
        let mut words: Vec<WordEntry> = Vec::new();
        let mut index: HashMap<Vec<u8>, WordId> = HashMap::new();
        let mut n_tokens: u64 = 0;
        let mut token = Vec::new();
        while reader.read_token(&mut token)? {
            n_tokens += 1;
            match index.get(token.as_slice()) {
                Some(&id) => words[id as usize].count += 1,
                None => {
                    index.insert(token.clone(), words.len() as WordId);
                    words.push(WordEntry {
                        word: token.clone(),
                        count: 1,
                    });
                }
            }
            if n_tokens % 1_000_000 == 0 {
                eprint!("\rRead {}M words", n_tokens / 1_000_000);
            }
        }

        // Descending frequency; the sort is stable, so equal counts keep
        // their first-seen order.
        words.sort_by(|a, b| b.count.cmp(&a.count));
        words.retain(|entry| entry.count >= min_count);
        index.clear();
        for (id, entry) in words.iter().enumerate() {
            index.insert(entry.word.clone(), id as WordId);
        }

        eprintln!("\rRead {}M words", n_tokens / 1_000_000);
        eprintln!("Number of words:  {}", words.len());
        if words.is_empty() {
            return Err(Error::EmptyVocabulary);
        }

        let retention = retention_probabilities(&words, n_tokens, subsample_t);
        Ok(Self {
            words,
            index,
            retention,
            n_tokens,
        })
    }

    /// Number of vocabulary words after min-count filtering.
    pub fn n_words(&self) -> usize {
        self.words.len()
    }

    /// Total corpus tokens seen during the counting pass, before any
    /// filtering.
    pub fn n_tokens(&self) -> u64 {
        self.n_tokens
    }

    /// The word bytes for an id.
    pub fn word(&self, id: WordId) -> &[u8] {
        &self.words[id as usize].word
    }

    /// Occurrence counts in id order; feeds the negative-sampling table.
    pub fn counts(&self) -> Vec<u64> {
        self.words.iter().map(|entry| entry.count).collect()
    }

    /// Retention probability used by subsampling.
    pub fn retention(&self, id: WordId) -> f64 {
        self.retention[id as usize]
    }

    /// Read one line of ids from the corpus into `line`, subsampling as it
    /// goes. Unknown tokens are skipped; a known end-of-sentence token ends
    /// the line. If the reader is at EOF on entry, it wraps to offset 0.
    ///
    /// Returns the number of vocabulary tokens consumed, counted before
    /// subsampling.
    pub fn get_line<R: BufRead + Seek, G: Rng>(
        &self,
        reader: &mut CorpusReader<R>,
        line: &mut Vec<WordId>,
        rng: &mut G,
    ) -> io::Result<u64> {
        if reader.at_eof() {
            reader.rewind()?;
        }
        line.clear();
        let mut token = Vec::new();
        let mut consumed = 0;
        while reader.read_token(&mut token)? {
            let Some(&id) = self.index.get(token.as_slice()) else {
                continue;
            };
            consumed += 1;
            if rng.random::<f64>() <= self.retention[id as usize] {
                line.push(id);
            }
            if token.as_slice() == EOS {
                break;
            }
        }
        Ok(consumed)
    }
}

/// Per-id retention probability `min(1, √(t/f) + t/f)` with
/// `f = count / total`, or 1.0 when `t ≤ 0`.
fn retention_probabilities(words: &[WordEntry], n_tokens: u64, t: f64) -> Vec<f64> {
    words
        .iter()
        .map(|entry| {
            if t > 0.0 {
                let f = entry.count as f64 / n_tokens as f64;
                ((t / f).sqrt() + t / f).min(1.0)
            } else {
                1.0
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::train::MinstdRng;
    use approx::assert_relative_eq;
    use std::io::Cursor;

    fn vocab_of(corpus: &[u8], min_count: u64, t: f64) -> Vocabulary {
        let mut reader = CorpusReader::new(Cursor::new(corpus.to_vec()));
        Vocabulary::from_corpus(&mut reader, min_count, t).unwrap()
    }

    #[test]
    fn orders_by_descending_count_with_first_seen_ties() {
        let vocab = vocab_of(b"b b a c b a\n", 1, 0.0);
        // counts: b=3, a=2, c=1, </s>=1; c was seen before </s>
        assert_eq!(vocab.n_words(), 4);
        assert_eq!(vocab.word(0), b"b");
        assert_eq!(vocab.word(1), b"a");
        assert_eq!(vocab.word(2), b"c");
        assert_eq!(vocab.word(3), EOS);
        assert_eq!(vocab.counts(), vec![3, 2, 1, 1]);
        assert_eq!(vocab.n_tokens(), 7);
    }

    #[test]
    fn min_count_filters_rare_words() {
        let vocab = vocab_of(b"a a a b b c\n", 2, 0.0);
        assert_eq!(vocab.n_words(), 2);
        assert_eq!(vocab.word(0), b"a");
        assert_eq!(vocab.word(1), b"b");
    }

    #[test]
    fn empty_vocabulary_is_an_error() {
        let mut reader = CorpusReader::new(Cursor::new(b"a b c\n".to_vec()));
        let result = Vocabulary::from_corpus(&mut reader, 10, 0.0);
        assert!(matches!(result, Err(Error::EmptyVocabulary)));
    }

    #[test]
    fn retention_matches_the_subsampling_formula() {
        let vocab = vocab_of(b"a a a a a a a a b b\n", 1, 0.1);
        // f(a) = 8/11
        let f: f64 = 8.0 / 11.0;
        assert_relative_eq!(
            vocab.retention(0),
            (0.1 / f).sqrt() + 0.1 / f,
            epsilon = 1e-12
        );
        // b's formula value exceeds 1 and clamps
        assert_relative_eq!(vocab.retention(1), 1.0, epsilon = 1e-12);
        // </s> occurs once; its frequency is below t, so it is always kept
        assert_relative_eq!(vocab.retention(2), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn zero_threshold_disables_subsampling() {
        let vocab = vocab_of(b"a a a a b\n", 1, 0.0);
        for id in 0..vocab.n_words() as WordId {
            assert_relative_eq!(vocab.retention(id), 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn get_line_yields_ids_and_counts_known_tokens() {
        let vocab = vocab_of(b"a a b b\nrare a\n", 2, 0.0);
        let mut reader = CorpusReader::new(Cursor::new(b"a rare b\na\n".to_vec()));
        let mut rng = MinstdRng::new(1);
        let mut line = Vec::new();

        let consumed = vocab.get_line(&mut reader, &mut line, &mut rng).unwrap();
        // "rare" is unknown and skipped; a, b, </s> are consumed
        assert_eq!(consumed, 3);
        let a = vocab.word_id(b"a");
        let b = vocab.word_id(b"b");
        let eos = vocab.word_id(EOS);
        assert_eq!(line, vec![a, b, eos]);

        let consumed = vocab.get_line(&mut reader, &mut line, &mut rng).unwrap();
        assert_eq!(consumed, 2);
        assert_eq!(line, vec![a, eos]);
    }

    #[test]
    fn get_line_wraps_at_end_of_stream() {
        let vocab = vocab_of(b"a b\n", 1, 0.0);
        let mut reader = CorpusReader::new(Cursor::new(b"a b\n".to_vec()));
        let mut rng = MinstdRng::new(1);
        let mut line = Vec::new();
        let first = vocab.get_line(&mut reader, &mut line, &mut rng).unwrap();
        assert_eq!(first, 3);
        // the next read discovers EOF and yields an empty line
        let second = vocab.get_line(&mut reader, &mut line, &mut rng).unwrap();
        assert_eq!(second, 0);
        assert!(line.is_empty());
        // and the call after that wraps to offset 0
        let third = vocab.get_line(&mut reader, &mut line, &mut rng).unwrap();
        assert_eq!(third, 3);
        assert_eq!(line.len(), 3);
    }

    impl Vocabulary {
        fn word_id(&self, word: &[u8]) -> WordId {
            self.index[word]
        }
    }
}
