//! String similarity scoring for the duplicate detector: classic Levenshtein
//! edit distance normalized to [0, 1].

/// Unit-cost edit distance (insert/delete/substitute) over Unicode scalar
/// values, computed with a single rolling row of scores rather than the full
/// matrix.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    // Keep the rolling row sized by the shorter string.
    let (longer, shorter) = if a.len() >= b.len() { (&a, &b) } else { (&b, &a) };
    if shorter.is_empty() {
        return longer.len();
    }

    let mut prev: Vec<usize> = (0..=shorter.len()).collect();
    let mut curr = vec![0usize; shorter.len() + 1];

    for (i, lc) in longer.iter().enumerate() {
        curr[0] = i + 1;
        for (j, sc) in shorter.iter().enumerate() {
            let insert = prev[j + 1] + 1;
            let delete = curr[j] + 1;
            let substitute = prev[j] + usize::from(lc != sc);
            curr[j + 1] = insert.min(delete).min(substitute);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[shorter.len()]
}

/// Similarity in [0, 1] after trimming and case-folding both sides.
/// Exact match after fold is 1.0; an empty side scores 0.0; otherwise
/// `1 - distance / max(len(a), len(b))` over character counts. Symmetric.
pub fn similarity(a: &str, b: &str) -> f64 {
    let a = a.trim().to_lowercase();
    let b = b.trim().to_lowercase();
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    if a == b {
        return 1.0;
    }

    let max_len = a.chars().count().max(b.chars().count());
    1.0 - levenshtein(&a, &b) as f64 / max_len as f64
}

/// Fixed 2-decimal rounding for stored similarity scores.
pub fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}
