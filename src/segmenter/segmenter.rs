use super::dictionary::Dictionary;
use super::types::SegmentationResult;
use std::sync::Arc;

/// Segments candidates against a shared dictionary.
#[derive(Debug, Clone)]
pub struct DictionarySegmenter {
    dictionary: Arc<Dictionary>,
}

impl DictionarySegmenter {
    pub fn new(dictionary: Arc<Dictionary>) -> Self {
        Self { dictionary }
    }

    pub fn dictionary(&self) -> &Dictionary {
        &self.dictionary
    }

    pub fn segment(&self, text: &str) -> SegmentationResult {
        segment(text, &self.dictionary)
    }

    pub fn can_segment(&self, text: &str) -> bool {
        can_segment(text, &self.dictionary)
    }
}

/// Returns every decomposition of `text` into dictionary words.
///
/// Exhaustive backtracking: at each position every dictionary word that prefixes the
/// remaining suffix is tried, shortest first, and a segmentation is recorded each time
/// the end of the string is reached. Branches that land on a position from which the
/// end is unreachable are skipped; this only removes dead ends, so the returned set is
/// the same as unpruned search.
///
/// Worst case is exponential in the length of `text`. Callers only pass short,
/// structurally filtered candidates.
pub fn segment(text: &str, dictionary: &Dictionary) -> SegmentationResult {
    let mut result = SegmentationResult::default();
    if text.is_empty() || dictionary.is_empty() {
        return result;
    }

    let reachable = suffix_reachability(text, dictionary);
    if !reachable[0] {
        return result;
    }

    let mut path: Vec<&str> = Vec::new();
    backtrack(text, 0, dictionary, &reachable, &mut path, &mut result.segmentations);
    result
}

/// Yes/no form of [`segment`], linear in the number of probed prefixes.
pub fn can_segment(text: &str, dictionary: &Dictionary) -> bool {
    !text.is_empty() && !dictionary.is_empty() && suffix_reachability(text, dictionary)[0]
}

fn backtrack<'a>(
    text: &'a str,
    start: usize,
    dictionary: &Dictionary,
    reachable: &[bool],
    path: &mut Vec<&'a str>,
    out: &mut Vec<Vec<String>>,
) {
    if start == text.len() {
        out.push(path.iter().map(|word| word.to_string()).collect());
        return;
    }

    for end in prefix_ends(text, start, dictionary) {
        if !reachable[end] {
            continue;
        }
        let Some(word) = text.get(start..end) else {
            continue;
        };
        if dictionary.contains(word) {
            path.push(word);
            backtrack(text, end, dictionary, reachable, path, out);
            path.pop();
        }
    }
}

/// `reachable[i]` is true when `text[i..]` splits fully into dictionary words.
fn suffix_reachability(text: &str, dictionary: &Dictionary) -> Vec<bool> {
    let n = text.len();
    let mut reachable = vec![false; n + 1];
    reachable[n] = true;

    for start in (0..n).rev() {
        let covered = prefix_ends(text, start, dictionary).any(|end| {
            reachable[end]
                && text
                    .get(start..end)
                    .map_or(false, |word| dictionary.contains(word))
        });
        reachable[start] = covered;
    }

    reachable
}

fn prefix_ends(text: &str, start: usize, dictionary: &Dictionary) -> std::ops::RangeInclusive<usize> {
    let last = text.len().min(start + dictionary.longest_word());
    (start + 1)..=last
}
