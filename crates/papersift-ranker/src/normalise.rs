//! Score and keyword normalisation helpers.

/// Maximum distance (in characters) between two keyword tokens for a
/// multi-token partial match.
pub const TOKEN_PROXIMITY_CHARS: usize = 50;

/// Clamp into [0, 100]. Non-finite input collapses to 0.
pub fn clamp_score(value: f64) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    value.clamp(0.0, 100.0)
}

/// Round half away from zero and clamp into the u8 score range.
pub fn round_score(value: f64) -> u8 {
    clamp_score(value.round()) as u8
}

/// Tokens of a lowercased keyword that are longer than 3 characters.
pub fn keyword_tokens(keyword: &str) -> Vec<&str> {
    let mut out: Vec<&str> = Vec::new();
    for tok in keyword.split(|c: char| !c.is_alphanumeric()) {
        if tok.chars().count() > 3 && !out.contains(&tok) {
            out.push(tok);
        }
    }
    out
}

/// Character offsets of every occurrence of `needle` in `haystack`.
pub fn char_positions(haystack: &str, needle: &str) -> Vec<usize> {
    haystack
        .match_indices(needle)
        .map(|(byte_idx, _)| haystack[..byte_idx].chars().count())
        .collect()
}

/// Multi-token partial match: at least two distinct tokens occur in `text`
/// and some pair of their occurrences lies within [`TOKEN_PROXIMITY_CHARS`].
pub fn tokens_near(text: &str, tokens: &[&str]) -> bool {
    let present: Vec<Vec<usize>> = tokens
        .iter()
        .map(|t| char_positions(text, t))
        .filter(|p| !p.is_empty())
        .collect();

    if present.len() < 2 {
        return false;
    }

    for i in 0..present.len() {
        for j in (i + 1)..present.len() {
            for &a in &present[i] {
                for &b in &present[j] {
                    if a.abs_diff(b) <= TOKEN_PROXIMITY_CHARS {
                        return true;
                    }
                }
            }
        }
    }
    false
}
