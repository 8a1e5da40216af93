//! Accuracy evaluation against a labeled word list.

use crate::filter::BloomFilter;
use rayon::prelude::*;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

/// Test words split by filter verdict and ground truth. Word sets are
/// deduplicated; the `reported_*` fields count every query.
#[derive(Debug, Default)]
pub struct Classification<'a> {
    pub reported_present: usize,
    pub reported_absent: usize,
    pub true_positives: HashSet<&'a [u8]>,
    pub true_negatives: HashSet<&'a [u8]>,
    pub false_positives: HashSet<&'a [u8]>,
    pub false_negatives: HashSet<&'a [u8]>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Counts {
    pub reported_present: usize,
    pub reported_absent: usize,
    pub true_positives: usize,
    pub true_negatives: usize,
    pub false_positives: usize,
    pub false_negatives: usize,
}

impl Counts {
    /// FP / (FP + TN), 0 when no negatives were queried.
    pub fn observed_false_positive_rate(&self) -> f64 {
        let negatives = self.false_positives + self.true_negatives;
        if negatives == 0 {
            0.0
        } else {
            self.false_positives as f64 / negatives as f64
        }
    }
}

impl fmt::Display for Counts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "positive_words: {} negative_words: {}", self.reported_present, self.reported_absent)?;
        writeln!(f, "false positives: {}", self.false_positives)?;
        writeln!(f, "false negatives: {}", self.false_negatives)?;
        writeln!(f, "true positives: {}", self.true_positives)?;
        write!(f, "true negatives: {}", self.true_negatives)
    }
}

impl Classification<'_> {
    pub fn counts(&self) -> Counts {
        Counts {
            reported_present: self.reported_present,
            reported_absent: self.reported_absent,
            true_positives: self.true_positives.len(),
            true_negatives: self.true_negatives.len(),
            false_positives: self.false_positives.len(),
            false_negatives: self.false_negatives.len(),
        }
    }
}

/// Query every test word and classify the verdicts against `ground_truth`.
///
/// Queries run on the rayon pool; the filter is only read.
pub fn evaluate<'a>(
    filter: &BloomFilter,
    test_words: &[&'a [u8]],
    ground_truth: &HashSet<&[u8]>,
) -> Classification<'a> {
    let verdicts: Vec<bool> = test_words.par_iter().map(|w| filter.may_contain(w)).collect();
    let mut out = Classification::default();
    for (&word, present) in test_words.iter().zip(verdicts) {
        let member = ground_truth.contains(word);
        if present {
            out.reported_present += 1;
            if member {
                out.true_positives.insert(word);
            } else {
                out.false_positives.insert(word);
            }
        } else {
            out.reported_absent += 1;
            if member {
                out.false_negatives.insert(word);
            } else {
                out.true_negatives.insert(word);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FilterConfig;
    use crate::hashing::HashAlgorithm;

    fn cat_dog() -> BloomFilter {
        let cfg = FilterConfig::new(100, vec![HashAlgorithm::Md5, HashAlgorithm::Sha256]).unwrap();
        BloomFilter::build(cfg, [b"cat", b"dog"]).unwrap()
    }

    fn colliding_word(f: &BloomFilter) -> String {
        (0..200_000u32)
            .map(|i| format!("w{i}"))
            .find(|w| f.may_contain(w.as_bytes()))
            .expect("a colliding word exists for m=100")
    }

    #[test]
    fn false_positive_is_classified() {
        let f = cat_dog();
        let fp = colliding_word(&f);
        let truth: HashSet<&[u8]> = [&b"cat"[..], &b"dog"[..]].into_iter().collect();
        let words: Vec<&[u8]> = vec![&b"cat"[..], &b"dog"[..], fp.as_bytes()];
        let c = evaluate(&f, &words, &truth);
        assert_eq!(c.counts().true_positives, 2);
        assert!(c.false_positives.contains(fp.as_bytes()));
        assert!(c.false_negatives.is_empty());
        assert!(c.true_negatives.is_empty());
        assert_eq!(c.reported_present, 3);
    }

    #[test]
    fn absent_words_are_true_negatives() {
        let f = cat_dog();
        let truth: HashSet<&[u8]> = [&b"cat"[..], &b"dog"[..]].into_iter().collect();
        let candidates: Vec<String> = (0..500).map(|i| format!("x{i}")).collect();
        let words: Vec<&[u8]> = candidates.iter().map(|s| s.as_bytes()).collect();
        let c = evaluate(&f, &words, &truth);
        let n = c.counts();
        assert_eq!(n.true_positives + n.false_negatives, 0);
        assert_eq!(n.true_negatives + n.false_positives, 500);
        assert_eq!(n.reported_present + n.reported_absent, 500);
        assert!(n.true_negatives > 400);
    }

    #[test]
    fn ground_truth_outside_corpus_can_be_false_negative() {
        // ground truth that the filter was never built from
        let f = cat_dog();
        let truth: HashSet<&[u8]> = [&b"cat"[..], &b"horse"[..]].into_iter().collect();
        let words: Vec<&[u8]> = vec![&b"cat"[..], &b"horse"[..]];
        let c = evaluate(&f, &words, &truth);
        if !f.may_contain(b"horse") {
            assert!(c.false_negatives.contains(&b"horse"[..]));
        }
        assert!(c.true_positives.contains(&b"cat"[..]));
    }

    #[test]
    fn duplicates_count_queries_but_not_words() {
        let f = cat_dog();
        let truth: HashSet<&[u8]> = [&b"cat"[..]].into_iter().collect();
        let words: Vec<&[u8]> = vec![&b"cat"[..]; 3];
        let n = evaluate(&f, &words, &truth).counts();
        assert_eq!(n.reported_present, 3);
        assert_eq!(n.true_positives, 1);
    }

    #[test]
    fn observed_rate() {
        let n = Counts {
            reported_present: 3,
            reported_absent: 7,
            true_positives: 2,
            true_negatives: 7,
            false_positives: 1,
            false_negatives: 0,
        };
        assert!((n.observed_false_positive_rate() - 0.125).abs() < 1e-12);
        assert_eq!(Counts { false_positives: 0, true_negatives: 0, ..n }.observed_false_positive_rate(), 0.0);
        assert!(n.to_string().contains("false positives: 1"));
    }
}
