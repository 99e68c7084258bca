//! Stateless field comparators.
//!
//! These are the building blocks of the equivalence checker: exact and
//! case-insensitive equality, fuzzy text similarity, numeric tolerance,
//! bounding-box IoU and greedy list pairing.

use crate::model::BoundingBox;
use crate::text::{normalize, tokens};
use serde::{Deserialize, Serialize};

/// Exact equality.
pub fn exact<T: PartialEq + ?Sized>(a: &T, b: &T) -> bool {
    a == b
}

/// Equality after Unicode, case and whitespace normalization.
pub fn case_insensitive(a: &str, b: &str) -> bool {
    normalize(a) == normalize(b)
}

/// Token-order-insensitive similarity of two strings, in `[0, 1]`.
///
/// Both strings are normalized and split into token sets; the score is the
/// best normalized Levenshtein similarity between the sorted shared tokens
/// and each side's sorted tokens (a token-set ratio). Two blank strings
/// score 1.0; a blank string against a non-blank one scores 0.0.
pub fn text_similarity(a: &str, b: &str) -> f64 {
    let na = normalize(a);
    let nb = normalize(b);
    match (na.is_empty(), nb.is_empty()) {
        (true, true) => return 1.0,
        (true, false) | (false, true) => return 0.0,
        (false, false) => {}
    }
    if na == nb {
        return 1.0;
    }

    let ta = tokens(&na);
    let tb = tokens(&nb);
    if ta.is_empty() || tb.is_empty() {
        // Punctuation-only text
        return strsim::normalized_levenshtein(&na, &nb);
    }

    let shared: Vec<&str> = ta.intersection(&tb).copied().collect();
    let only_a: Vec<&str> = ta.difference(&tb).copied().collect();
    let only_b: Vec<&str> = tb.difference(&ta).copied().collect();

    let t0 = shared.join(" ");
    let t1 = join_nonempty(&t0, &only_a.join(" "));
    let t2 = join_nonempty(&t0, &only_b.join(" "));

    [
        strsim::normalized_levenshtein(&t0, &t1),
        strsim::normalized_levenshtein(&t0, &t2),
        strsim::normalized_levenshtein(&t1, &t2),
    ]
    .into_iter()
    .fold(0.0, f64::max)
}

fn join_nonempty(a: &str, b: &str) -> String {
    match (a.is_empty(), b.is_empty()) {
        (true, _) => b.to_string(),
        (_, true) => a.to_string(),
        _ => format!("{} {}", a, b),
    }
}

/// Fuzzy text match: `(score >= threshold, score)`.
///
/// Fails closed: a blank string never matches a non-blank one, whatever
/// the threshold.
pub fn fuzzy_text(a: &str, b: &str, threshold: f64) -> (bool, f64) {
    let score = text_similarity(a, b);
    let blank_mismatch = a.trim().is_empty() != b.trim().is_empty();
    (!blank_mismatch && score >= threshold, score)
}

/// Round to the given number of significant digits.
pub fn round_significant(value: f64, digits: u32) -> f64 {
    if value == 0.0 || !value.is_finite() || digits == 0 {
        return value;
    }
    let magnitude = value.abs().log10().floor() as i32;
    let factor = 10f64.powi(digits as i32 - 1 - magnitude);
    (value * factor).round() / factor
}

/// Numeric equivalence with tolerance.
///
/// Two present numbers are equivalent if they differ by at most `epsilon`
/// or agree after rounding to `significant_digits` (0 disables the second
/// test). Two absent values are equivalent; absent versus present never is.
pub fn numeric_tolerant(
    a: Option<f64>,
    b: Option<f64>,
    significant_digits: u32,
    epsilon: f64,
) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(_), None) | (None, Some(_)) => false,
        (Some(x), Some(y)) => {
            if x == y || (x - y).abs() <= epsilon {
                return true;
            }
            significant_digits > 0
                && x.is_finite()
                && y.is_finite()
                && round_significant(x, significant_digits)
                    == round_significant(y, significant_digits)
        }
    }
}

/// Intersection over union of two same-unit boxes.
///
/// Identical regions score 1.0 even when degenerate (zero width or height),
/// so a box always matches itself.
pub fn spatial_iou(a: &BoundingBox, b: &BoundingBox) -> f64 {
    if a.same_region(b) {
        1.0
    } else {
        a.iou(b)
    }
}

/// One pairing produced by [`set_compare`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchedPair {
    /// Index into the first list
    pub a_index: usize,
    /// Index into the second list
    pub b_index: usize,
    /// Similarity of the pair
    pub score: f64,
}

/// Outcome of pairing two lists.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SetMatch {
    /// Pairs, ordered by `a_index`
    pub matched: Vec<MatchedPair>,
    /// Unpaired indices of the first list, ascending
    pub unmatched_a: Vec<usize>,
    /// Unpaired indices of the second list, ascending
    pub unmatched_b: Vec<usize>,
}

impl SetMatch {
    /// Partner of an index of the first list.
    pub fn partner_of_a(&self, a_index: usize) -> Option<&MatchedPair> {
        self.matched.iter().find(|p| p.a_index == a_index)
    }
}

/// Greedy best-match pairing of two lists.
///
/// Each item of the shorter list (the first list on a tie), in input order,
/// claims the best-scoring unclaimed item of the other list whose score is
/// at least `threshold`. Ties go to the earlier candidate. With
/// `ignore_order == false`, a candidate must also come after the previously
/// claimed one, so pairs never cross.
///
/// Greedy pairing is not a globally optimal assignment; it is deterministic
/// and linear in the number of candidate pairs.
pub fn set_compare<A, B, F>(
    list_a: &[A],
    list_b: &[B],
    similarity: F,
    threshold: f64,
    ignore_order: bool,
) -> SetMatch
where
    F: Fn(&A, &B) -> f64,
{
    let a_drives = list_a.len() <= list_b.len();
    let (drivers, candidates) = if a_drives {
        (list_a.len(), list_b.len())
    } else {
        (list_b.len(), list_a.len())
    };

    let score = |driver: usize, candidate: usize| -> f64 {
        if a_drives {
            similarity(&list_a[driver], &list_b[candidate])
        } else {
            similarity(&list_a[candidate], &list_b[driver])
        }
    };

    let mut claimed = vec![false; candidates];
    let mut next_allowed = 0usize;
    let mut pairs: Vec<(usize, usize, f64)> = Vec::new();

    for driver in 0..drivers {
        let start = if ignore_order { 0 } else { next_allowed };
        let mut best: Option<(usize, f64)> = None;
        for candidate in start..candidates {
            if claimed[candidate] {
                continue;
            }
            let s = score(driver, candidate);
            if s >= threshold && best.map_or(true, |(_, b)| s > b) {
                best = Some((candidate, s));
            }
        }
        if let Some((candidate, s)) = best {
            claimed[candidate] = true;
            next_allowed = candidate + 1;
            pairs.push((driver, candidate, s));
        }
    }

    let mut matched: Vec<MatchedPair> = pairs
        .iter()
        .map(|&(driver, candidate, score)| {
            let (a_index, b_index) = if a_drives {
                (driver, candidate)
            } else {
                (candidate, driver)
            };
            MatchedPair {
                a_index,
                b_index,
                score,
            }
        })
        .collect();
    matched.sort_by_key(|p| p.a_index);

    let mut used_a = vec![false; list_a.len()];
    let mut used_b = vec![false; list_b.len()];
    for pair in &matched {
        used_a[pair.a_index] = true;
        used_b[pair.b_index] = true;
    }

    SetMatch {
        matched,
        unmatched_a: (0..list_a.len()).filter(|&i| !used_a[i]).collect(),
        unmatched_b: (0..list_b.len()).filter(|&i| !used_b[i]).collect(),
    }
}
