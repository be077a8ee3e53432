use std::cmp::Ordering;
use std::collections::{BTreeMap, BinaryHeap, HashSet};

use tracing::debug;

use crate::error::AnalysisError;

pub const DEFAULT_MAX_PATTERNS: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrequentPattern {
    pub sequence: Vec<String>,
    /// Number of input sequences containing `sequence` as a subsequence.
    pub support: usize,
}

/// Frequent-subsequence search over token windows.
pub trait SequenceMiner {
    /// Up to `k` patterns, highest support first. Ties keep the miner's own
    /// discovery order.
    fn top_k(&self, sequences: &[Vec<String>], k: usize) -> Vec<FrequentPattern>;
}

/// Pattern-growth miner over projected databases.
///
/// Items are extended in ascending order, depth first, and a pattern only
/// displaces a kept one with strictly lower support, so among equal supports
/// the earlier-discovered pattern wins.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrefixSpan {
    pub max_pattern_len: Option<usize>,
}

impl SequenceMiner for PrefixSpan {
    fn top_k(&self, sequences: &[Vec<String>], k: usize) -> Vec<FrequentPattern> {
        if k == 0 {
            return Vec::new();
        }
        let mut top = TopK::new(k);
        let projected = (0..sequences.len()).map(|seq| (seq, 0)).collect::<Vec<_>>();
        let mut prefix = Vec::new();
        self.grow(sequences, &mut prefix, &projected, &mut top);
        top.into_sorted()
    }
}

impl PrefixSpan {
    fn grow<'a>(
        &self,
        sequences: &'a [Vec<String>],
        prefix: &mut Vec<&'a str>,
        projected: &[(usize, usize)],
        top: &mut TopK,
    ) {
        let mut counts: BTreeMap<&'a str, usize> = BTreeMap::new();
        for &(seq, start) in projected {
            let mut seen = HashSet::new();
            for item in &sequences[seq][start..] {
                if seen.insert(item.as_str()) {
                    *counts.entry(item.as_str()).or_default() += 1;
                }
            }
        }

        for (item, support) in counts {
            if !top.admits(support) {
                continue;
            }
            prefix.push(item);
            top.offer(prefix, support);

            let can_grow = self.max_pattern_len.is_none_or(|max| prefix.len() < max);
            if can_grow && top.admits(support) {
                let next = projected
                    .iter()
                    .filter_map(|&(seq, start)| {
                        sequences[seq][start..]
                            .iter()
                            .position(|t| t == item)
                            .map(|offset| (seq, start + offset + 1))
                    })
                    .collect::<Vec<_>>();
                self.grow(sequences, prefix, &next, top);
            }
            prefix.pop();
        }
    }
}

#[derive(Debug)]
struct Kept {
    support: usize,
    discovery: usize,
    sequence: Vec<String>,
}

// Discovery numbers are unique, so `(support, discovery)` identifies a kept
// pattern and equality agrees with the heap order below.
impl PartialEq for Kept {
    fn eq(&self, other: &Self) -> bool {
        self.support == other.support && self.discovery == other.discovery
    }
}

impl Eq for Kept {}

// Heap order puts the weakest kept pattern on top: lowest support, then
// latest discovery.
impl Ord for Kept {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .support
            .cmp(&self.support)
            .then(self.discovery.cmp(&other.discovery))
    }
}

impl PartialOrd for Kept {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

struct TopK {
    k: usize,
    heap: BinaryHeap<Kept>,
    discovered: usize,
}

impl TopK {
    fn new(k: usize) -> Self {
        Self {
            k,
            heap: BinaryHeap::with_capacity(k + 1),
            discovered: 0,
        }
    }

    fn admits(&self, support: usize) -> bool {
        if self.heap.len() < self.k {
            return true;
        }
        self.heap.peek().is_some_and(|worst| support > worst.support)
    }

    fn offer(&mut self, sequence: &[&str], support: usize) {
        let discovery = self.discovered;
        self.discovered += 1;
        if !self.admits(support) {
            return;
        }
        if self.heap.len() == self.k {
            self.heap.pop();
        }
        self.heap.push(Kept {
            support,
            discovery,
            sequence: sequence.iter().map(|s| s.to_string()).collect(),
        });
    }

    fn into_sorted(self) -> Vec<FrequentPattern> {
        let mut kept = self.heap.into_vec();
        kept.sort_by(|a, b| b.support.cmp(&a.support).then(a.discovery.cmp(&b.discovery)));
        kept.into_iter()
            .map(|k| FrequentPattern {
                sequence: k.sequence,
                support: k.support,
            })
            .collect()
    }
}

/// Mines up to `max_patterns` candidates and orders them by support,
/// descending. The sort is stable so the miner's ordering breaks ties.
pub fn rank_patterns<M: SequenceMiner + ?Sized>(
    miner: &M,
    windows: &[Vec<String>],
    max_patterns: usize,
) -> Vec<FrequentPattern> {
    let mut patterns = miner.top_k(windows, max_patterns);
    patterns.retain(|p| !p.sequence.is_empty());
    patterns.sort_by(|a, b| b.support.cmp(&a.support));
    debug!(windows = windows.len(), patterns = patterns.len(), "ranked patterns");
    patterns
}

pub fn nth_pattern(patterns: &[FrequentPattern], n: usize) -> Result<&FrequentPattern, AnalysisError> {
    patterns.get(n).ok_or(AnalysisError::PatternIndex {
        requested: n,
        found: patterns.len(),
    })
}

/// First token of the `n`-th most frequent pattern (0 is the most frequent).
///
/// Multi-token patterns are reduced to their first token; use
/// [`nth_pattern`] to work with the whole sequence. An empty sequence is a
/// lookup failure like a missing rank.
pub fn common_event(patterns: &[FrequentPattern], n: usize) -> Result<String, AnalysisError> {
    nth_pattern(patterns, n)?
        .sequence
        .first()
        .cloned()
        .ok_or(AnalysisError::PatternIndex {
            requested: n,
            found: patterns.len(),
        })
}
