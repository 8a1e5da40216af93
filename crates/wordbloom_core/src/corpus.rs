//! Newline-delimited word files, memory-mapped.
//!
//! Words are raw byte strings with no decoding. Splitting follows byte
//! `split` semantics: a trailing newline yields a final empty word and
//! `\r` is kept as part of the word.

use crate::consts::WORD_DELIM;
use crate::errors::{BloomError, Result};
use memmap2::Mmap;
use std::collections::HashSet;
use std::fs::File;
use std::path::{Path, PathBuf};

pub fn split_words(data: &[u8]) -> impl Iterator<Item = &[u8]> {
    data.split(|b| *b == WORD_DELIM)
}

pub struct WordList {
    path: PathBuf,
    // zero-length files are not mapped
    mmap: Option<Mmap>,
}

impl WordList {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let unavailable = |source| BloomError::CorpusUnavailable { path: path.clone(), source };
        let f = File::open(&path).map_err(unavailable)?;
        let len = f.metadata().map_err(unavailable)?.len();
        let mmap = if len == 0 { None } else { Some(unsafe { Mmap::map(&f) }.map_err(unavailable)?) };
        tracing::debug!(path = %path.display(), bytes = len, "word list mapped");
        Ok(Self { path, mmap })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.mmap.as_deref().unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = &[u8]> {
        split_words(self.as_bytes())
    }

    /// Number of words, counting a trailing empty word.
    pub fn word_count(&self) -> usize {
        self.as_bytes().iter().filter(|b| **b == WORD_DELIM).count() + 1
    }

    pub fn to_vec(&self) -> Vec<&[u8]> {
        self.iter().collect()
    }

    pub fn to_set(&self) -> HashSet<&[u8]> {
        self.iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn splits_on_newline_bytes() {
        let words: Vec<&[u8]> = split_words(b"cat\ndog\r\n\xffbird").collect();
        assert_eq!(words, vec![&b"cat"[..], b"dog\r", b"\xffbird"]);
    }

    #[test]
    fn trailing_newline_yields_empty_word() {
        let words: Vec<&[u8]> = split_words(b"cat\ndog\n").collect();
        assert_eq!(words, vec![&b"cat"[..], b"dog", b""]);
    }

    #[test]
    fn open_reads_file() {
        let tmp = tempdir().unwrap();
        let p = tmp.path().join("words.txt");
        fs::write(&p, b"alpha\nbeta\ngamma\nbeta").unwrap();
        let list = WordList::open(&p).unwrap();
        assert_eq!(list.word_count(), 4);
        assert_eq!(list.to_vec()[1], b"beta");
        assert_eq!(list.to_set().len(), 3);
        assert_eq!(list.path(), p.as_path());
    }

    #[test]
    fn empty_file_is_one_empty_word() {
        let tmp = tempdir().unwrap();
        let p = tmp.path().join("empty.txt");
        fs::write(&p, b"").unwrap();
        let list = WordList::open(&p).unwrap();
        assert_eq!(list.word_count(), 1);
        assert_eq!(list.to_vec(), vec![&b""[..]]);
    }

    #[test]
    fn missing_file_is_corpus_unavailable() {
        let tmp = tempdir().unwrap();
        let err = WordList::open(tmp.path().join("nope.txt")).err().unwrap();
        assert!(matches!(err, BloomError::CorpusUnavailable { .. }));
    }
}
