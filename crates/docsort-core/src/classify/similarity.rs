/// String similarity in `[0, 1]`, where 1 means identical.
///
/// Detection and sibling cross-referencing only see this trait, so the edit
/// distance behind it can be swapped freely.
pub trait Similarity: Send + Sync {
    fn similarity(&self, a: &str, b: &str) -> f64;
}

/// Levenshtein distance normalized by the longer input.
#[derive(Debug, Clone, Copy, Default)]
pub struct NormalizedLevenshtein;

impl Similarity for NormalizedLevenshtein {
    fn similarity(&self, a: &str, b: &str) -> f64 {
        strsim::normalized_levenshtein(a, b).clamp(0.0, 1.0)
    }
}

/// Jaro-Winkler; favors shared prefixes, which suits product names with
/// version or locale suffixes.
#[derive(Debug, Clone, Copy, Default)]
pub struct JaroWinkler;

impl Similarity for JaroWinkler {
    fn similarity(&self, a: &str, b: &str) -> f64 {
        strsim::jaro_winkler(a, b).clamp(0.0, 1.0)
    }
}
