//! Ratcliff/Obershelp "gestalt" similarity: find the longest common
//! contiguous block, recurse on what lies left and right of it, and score
//! `2 * matched / (len(a) + len(b))`.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashMap;
use std::hash::Hash;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block {
    pub a: usize,
    pub b: usize,
    pub size: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Similarity {
    matched: usize,
    total: usize,
}

impl Similarity {
    pub fn matched(&self) -> usize {
        self.matched
    }

    pub fn ratio(&self) -> f64 {
        if self.total == 0 {
            return 1.0;
        }
        2.0 * self.matched as f64 / self.total as f64
    }

    /// Ratio as a percentage rounded to two decimals
    pub fn percent(&self) -> Decimal {
        if self.total == 0 {
            return dec!(100);
        }
        (Decimal::from((2 * self.matched) as u64) * dec!(100) / Decimal::from(self.total as u64)).round_dp(2)
    }

    pub fn meets(&self, threshold: f64) -> bool {
        self.ratio() >= threshold
    }
}

/// Symmetric similarity of two sequences. The block search breaks ties by
/// earliest position, which can make the raw score depend on argument
/// order; the larger of the two orders is kept.
pub fn similarity<T: Eq + Hash>(a: &[T], b: &[T]) -> Similarity {
    let forward = matched_elements(a, b);
    let backward = matched_elements(b, a);
    Similarity {
        matched: forward.max(backward),
        total: a.len() + b.len(),
    }
}

pub fn matched_elements<T: Eq + Hash>(a: &[T], b: &[T]) -> usize {
    matching_blocks(a, b).iter().map(|m| m.size).sum()
}

/// Non-overlapping common blocks in the order they are discovered
pub fn matching_blocks<T: Eq + Hash>(a: &[T], b: &[T]) -> Vec<Block> {
    let mut b2j: HashMap<&T, Vec<usize>> = HashMap::new();
    for (j, item) in b.iter().enumerate() {
        b2j.entry(item).or_default().push(j);
    }

    let mut blocks = Vec::new();
    let mut pending = vec![(0, a.len(), 0, b.len())];

    while let Some((alo, ahi, blo, bhi)) = pending.pop() {
        let block = longest_match(a, &b2j, alo, ahi, blo, bhi);
        if block.size == 0 {
            continue;
        }
        if alo < block.a && blo < block.b {
            pending.push((alo, block.a, blo, block.b));
        }
        if block.a + block.size < ahi && block.b + block.size < bhi {
            pending.push((block.a + block.size, ahi, block.b + block.size, bhi));
        }
        blocks.push(block);
    }

    blocks
}

/// Longest block in `a[alo..ahi]` / `b[blo..bhi]`; among equally long
/// blocks the one starting earliest in `a`, then earliest in `b`, wins.
fn longest_match<T: Eq + Hash>(
    a: &[T],
    b2j: &HashMap<&T, Vec<usize>>,
    alo: usize,
    ahi: usize,
    blo: usize,
    bhi: usize,
) -> Block {
    let mut best = Block { a: alo, b: blo, size: 0 };
    let mut run_lengths: HashMap<usize, usize> = HashMap::new();

    for i in alo..ahi {
        let mut next_lengths = HashMap::new();
        if let Some(positions) = b2j.get(&a[i]) {
            for &j in positions {
                if j < blo {
                    continue;
                }
                if j >= bhi {
                    break;
                }
                let k = j
                    .checked_sub(1)
                    .and_then(|prev| run_lengths.get(&prev))
                    .copied()
                    .unwrap_or(0)
                    + 1;
                next_lengths.insert(j, k);
                if k > best.size {
                    best = Block { a: i + 1 - k, b: j + 1 - k, size: k };
                }
            }
        }
        run_lengths = next_lengths;
    }

    best
}
