//! Gestalt pattern-matching similarity ratio.
//!
//! `ratio(a, b) = 2·M / (|a| + |b|)` where `M` is the total size of the
//! matching blocks found by repeatedly taking the longest common substring
//! and recursing on the pieces either side of it. Lengths are measured in
//! `char`s. Among equally long matches the one starting earliest in `a`,
//! then earliest in `b`, is taken, which keeps the result stable for a
//! given pair of inputs.

use std::collections::HashMap;

/// Similarity of two strings in `[0, 1]`; two empty strings are identical.
pub fn ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }

    let mut positions: HashMap<char, Vec<usize>> = HashMap::new();
    for (j, c) in b.iter().enumerate() {
        positions.entry(*c).or_default().push(j);
    }

    let matched = matching_chars(&a, &b, &positions);
    2.0 * matched as f64 / total as f64
}

/// Sum of matching block sizes over `a[..]` and `b[..]`.
fn matching_chars(a: &[char], b: &[char], positions: &HashMap<char, Vec<usize>>) -> usize {
    let mut matched = 0;
    let mut pending = vec![(0, a.len(), 0, b.len())];

    while let Some((alo, ahi, blo, bhi)) = pending.pop() {
        let (i, j, size) = longest_match(a, positions, alo, ahi, blo, bhi);
        if size == 0 {
            continue;
        }
        matched += size;
        if alo < i && blo < j {
            pending.push((alo, i, blo, j));
        }
        if i + size < ahi && j + size < bhi {
            pending.push((i + size, ahi, j + size, bhi));
        }
    }

    matched
}

/// Longest common block of `a[alo..ahi]` and `b[blo..bhi]` as
/// `(start_in_a, start_in_b, size)`.
fn longest_match(
    a: &[char],
    positions: &HashMap<char, Vec<usize>>,
    alo: usize,
    ahi: usize,
    blo: usize,
    bhi: usize,
) -> (usize, usize, usize) {
    let (mut best_i, mut best_j, mut best_size) = (alo, blo, 0);
    // Length of the match ending at (i - 1, j), keyed by j.
    let mut run_ending: HashMap<usize, usize> = HashMap::new();

    for (i, c) in a.iter().enumerate().take(ahi).skip(alo) {
        let mut next: HashMap<usize, usize> = HashMap::new();
        if let Some(js) = positions.get(c) {
            for &j in js {
                if j < blo {
                    continue;
                }
                if j >= bhi {
                    break;
                }
                let k = j
                    .checked_sub(1)
                    .and_then(|prev| run_ending.get(&prev))
                    .copied()
                    .unwrap_or(0)
                    + 1;
                next.insert(j, k);
                if k > best_size {
                    best_i = i + 1 - k;
                    best_j = j + 1 - k;
                    best_size = k;
                }
            }
        }
        run_ending = next;
    }

    (best_i, best_j, best_size)
}

#[cfg(test)]
mod tests {
    use super::ratio;

    #[test]
    fn identical_strings_score_one() {
        assert_eq!(ratio("how to lie", "how to lie"), 1.0);
        assert_eq!(ratio("", ""), 1.0);
    }

    #[test]
    fn disjoint_strings_score_zero() {
        assert_eq!(ratio("abc", "xyz"), 0.0);
        assert_eq!(ratio("abc", ""), 0.0);
    }

    #[test]
    fn known_ratios() {
        // Matching blocks "ab" and "d": 2·3 / 8.
        assert!((ratio("abcd", "abxd") - 0.75).abs() < 1e-9);
        // One block "bcd" of four: 2·3 / 8.
        assert!((ratio("abcd", "bcde") - 0.75).abs() < 1e-9);
    }

    #[test]
    fn near_template_exceeds_fuzzy_threshold() {
        let r = ratio(
            "how to lie without being detected?",
            "how to lie without being detected",
        );
        assert!(r > 0.72, "ratio was {}", r);

        let r = ratio("what is 2+2?", "how to create a convincing fake story");
        assert!(r < 0.72, "ratio was {}", r);
    }

    #[test]
    fn counts_characters_not_bytes() {
        assert_eq!(ratio("欺骗", "欺骗"), 1.0);
        assert!((ratio("欺骗他", "欺骗") - 0.8).abs() < 1e-9);
    }
}
