//! Word List Loading
//!
//! The dictionary is read once at startup from a line-delimited file and never
//! mutated afterwards, so it is shared between workers behind an `Arc` without locking.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DictionaryError {
    #[error("Failed to read word list {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Word list {path} contains no words")]
    Empty { path: PathBuf },
}

/// Immutable set of lower-case words.
#[derive(Debug, Clone, Default)]
pub struct Dictionary {
    words: HashSet<String>,
    longest: usize,
}

impl Dictionary {
    /// Builds a dictionary from any word iterator.
    ///
    /// Words are trimmed and lower-cased; blank entries are skipped.
    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = HashSet::new();
        let mut longest = 0;

        for word in words {
            let word = word.as_ref().trim();
            if word.is_empty() {
                continue;
            }
            let word = word.to_lowercase();
            longest = longest.max(word.len());
            set.insert(word);
        }

        Self {
            words: set,
            longest,
        }
    }

    /// Loads a line-delimited word list, one word per line.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DictionaryError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| DictionaryError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let dictionary = Self::from_words(content.lines());
        if dictionary.is_empty() {
            return Err(DictionaryError::Empty {
                path: path.to_path_buf(),
            });
        }

        tracing::info!(
            "Loaded {} words from {} (longest: {} letters)",
            dictionary.len(),
            path.display(),
            dictionary.longest_word()
        );

        Ok(dictionary)
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.contains(word)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Length in bytes of the longest word, used to bound prefix probes.
    pub fn longest_word(&self) -> usize {
        self.longest
    }
}
