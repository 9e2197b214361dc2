use tracing::trace;

use super::catalog::{Catalog, Term};
use super::similarity::Similarity;
use crate::config::MatchingConfig;
use crate::model::{MatchEvidence, MatchKind};

/// Longest word n-gram compared against catalog terms during fuzzy matching.
const MAX_PHRASE_WORDS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeywordSet {
    /// Canonical names and aliases only.
    Primary,
    /// Primary terms plus nicknames and department words.
    WithSecondary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FuzzyScope {
    /// First `n` characters of the matching text.
    Head(usize),
    FullText,
}

/// How permissive one detection run is.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectOptions {
    pub keywords: KeywordSet,
    pub fuzzy_threshold: f64,
    pub fuzzy_scope: FuzzyScope,
    /// Run fuzzy matching even when literal hits exist.
    pub fuzzy_always: bool,
    pub min_fuzzy_len: usize,
}

impl DetectOptions {
    /// First-pass detection: primary terms, conservative fuzzy over the head.
    pub fn initial(matching: &MatchingConfig) -> Self {
        Self {
            keywords: KeywordSet::Primary,
            fuzzy_threshold: matching.fuzzy_threshold,
            fuzzy_scope: FuzzyScope::Head(matching.head_chars),
            fuzzy_always: false,
            min_fuzzy_len: matching.min_fuzzy_len,
        }
    }

    pub fn broader_keywords(matching: &MatchingConfig) -> Self {
        Self {
            keywords: KeywordSet::WithSecondary,
            ..Self::initial(matching)
        }
    }

    pub fn widened(matching: &MatchingConfig) -> Self {
        Self {
            keywords: KeywordSet::WithSecondary,
            fuzzy_threshold: matching.widened_fuzzy_threshold,
            fuzzy_scope: FuzzyScope::FullText,
            fuzzy_always: true,
            min_fuzzy_len: matching.min_fuzzy_len,
        }
    }
}

/// Finds catalog systems mentioned in normalized matching text.
pub struct Detector<'a> {
    catalog: &'a Catalog,
    similarity: &'a dyn Similarity,
}

impl<'a> Detector<'a> {
    pub fn new(catalog: &'a Catalog, similarity: &'a dyn Similarity) -> Self {
        Self {
            catalog,
            similarity,
        }
    }

    /// Evidence ordered by position, then system, then match kind. Identical
    /// input always yields an identical list.
    pub fn detect(&self, text: &str, options: &DetectOptions) -> Vec<MatchEvidence> {
        if text.is_empty() {
            return Vec::new();
        }

        let mut evidence = Vec::new();
        self.scan_literal(text, self.catalog.primary_terms(), &mut evidence);
        if options.keywords == KeywordSet::WithSecondary {
            self.scan_literal(text, self.catalog.secondary_terms(), &mut evidence);
        }

        if evidence.is_empty() || options.fuzzy_always {
            let region = match options.fuzzy_scope {
                FuzzyScope::Head(chars) => head(text, chars),
                FuzzyScope::FullText => text,
            };
            let fuzzy = self.scan_fuzzy(region, options, &evidence);
            evidence.extend(fuzzy);
        }

        drop_contained_hits(&mut evidence);

        evidence.sort_by(|a, b| {
            a.position
                .cmp(&b.position)
                .then_with(|| a.system.cmp(&b.system))
                .then_with(|| a.kind.cmp(&b.kind))
        });
        evidence.dedup_by(|later, earlier| {
            later.position == earlier.position && later.system == earlier.system
        });

        for hit in &evidence {
            trace!(
                "Hit {} '{}' at {} ({}, {:.2})",
                hit.system,
                hit.matched,
                hit.position,
                hit.kind.as_str(),
                hit.weight
            );
        }

        evidence
    }

    fn scan_literal(&self, text: &str, terms: &[Term], out: &mut Vec<MatchEvidence>) {
        for term in terms {
            for (position, matched) in text.match_indices(term.text.as_str()) {
                if !is_word_bounded(text, position, matched.len()) {
                    continue;
                }
                out.push(MatchEvidence {
                    system: self.catalog.entry(term.system).name.clone(),
                    matched: matched.to_string(),
                    kind: term.kind,
                    position,
                    weight: term.kind.base_weight(),
                });
            }
        }
    }

    fn scan_fuzzy(
        &self,
        region: &str,
        options: &DetectOptions,
        literal: &[MatchEvidence],
    ) -> Vec<MatchEvidence> {
        let words = word_spans(region);
        let mut hits = Vec::new();

        for start in 0..words.len() {
            for len in 1..=MAX_PHRASE_WORDS {
                let Some(last) = words.get(start + len - 1) else {
                    break;
                };
                let (from, to) = (words[start].0, last.1);
                if literal.iter().any(|hit| hit.position < to && from < hit.end()) {
                    continue;
                }

                let phrase = words[start..start + len]
                    .iter()
                    .map(|&(s, e)| &region[s..e])
                    .collect::<Vec<_>>()
                    .join(" ");
                if phrase.chars().count() < options.min_fuzzy_len {
                    continue;
                }

                if let Some(found) =
                    self.catalog
                        .fuzzy_lookup(&phrase, options.fuzzy_threshold, self.similarity)
                {
                    hits.push(MatchEvidence {
                        system: found.entry.name.clone(),
                        matched: region[from..to].to_string(),
                        kind: MatchKind::Fuzzy,
                        position: from,
                        weight: MatchKind::Fuzzy.base_weight() * found.score,
                    });
                }
            }
        }

        hits
    }
}

/// A hit is dropped when a longer hit for a different system covers it, so
/// "microsoft teams" counts for Teams and not also for Microsoft.
fn drop_contained_hits(evidence: &mut Vec<MatchEvidence>) {
    let covered: Vec<bool> = evidence
        .iter()
        .map(|hit| {
            evidence.iter().any(|other| {
                other.system != hit.system
                    && other.matched.len() > hit.matched.len()
                    && other.position <= hit.position
                    && hit.end() <= other.end()
            })
        })
        .collect();

    let mut flags = covered.into_iter();
    evidence.retain(|_| !flags.next().unwrap_or(false));
}

fn is_word_bounded(text: &str, position: usize, len: usize) -> bool {
    let before = text[..position].chars().next_back();
    let after = text[position + len..].chars().next();
    !before.map_or(false, char::is_alphanumeric) && !after.map_or(false, char::is_alphanumeric)
}

/// Byte spans of alphanumeric runs.
fn word_spans(text: &str) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut start = None;
    for (idx, ch) in text.char_indices() {
        match (ch.is_alphanumeric(), start) {
            (true, None) => start = Some(idx),
            (false, Some(s)) => {
                spans.push((s, idx));
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        spans.push((s, text.len()));
    }
    spans
}

fn head(text: &str, chars: usize) -> &str {
    match text.char_indices().nth(chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::similarity::NormalizedLevenshtein;

    fn detect(text: &str, options: DetectOptions) -> Vec<MatchEvidence> {
        let catalog = Catalog::builtin().unwrap();
        Detector::new(&catalog, &NormalizedLevenshtein).detect(text, &options)
    }

    fn initial() -> DetectOptions {
        DetectOptions::initial(&MatchingConfig::default())
    }

    #[test]
    fn test_alias_and_nested_canonical_hit() {
        let evidence = detect("guide ms teams for nye brukere", initial());
        assert_eq!(evidence.len(), 2);
        assert_eq!(evidence[0].kind, MatchKind::Alias);
        assert_eq!(evidence[0].position, 6);
        assert_eq!(evidence[1].kind, MatchKind::ExactKeyword);
        assert!(evidence.iter().all(|e| e.system == "Teams"));
    }

    #[test]
    fn test_whole_word_only() {
        assert!(detect("swordfish og teamsports", initial()).is_empty());
        let evidence = detect("åpne word.", initial());
        assert_eq!(evidence.len(), 1);
        assert_eq!(evidence[0].system, "Word");
    }

    #[test]
    fn test_longer_hit_of_other_system_wins() {
        let evidence = detect("logg inn i microsoft teams", initial());
        assert!(evidence.iter().all(|e| e.system == "Teams"));
    }

    #[test]
    fn test_secondary_keywords_only_when_requested() {
        let text = "hvordan dele en innboks med kolleger";
        assert!(detect(text, initial()).is_empty());

        let broader = detect(text, DetectOptions::broader_keywords(&MatchingConfig::default()));
        assert_eq!(broader.len(), 1);
        assert_eq!(broader[0].system, "Outlook");
        assert_eq!(broader[0].kind, MatchKind::SecondaryContext);
    }

    #[test]
    fn test_fuzzy_in_head_only() {
        let evidence = detect("sharepoimt tilgang", initial());
        assert_eq!(evidence.len(), 1);
        assert_eq!(evidence[0].system, "SharePoint");
        assert_eq!(evidence[0].kind, MatchKind::Fuzzy);
        assert!(evidence[0].weight < MatchKind::Fuzzy.base_weight());

        let padded = format!("{} sharepoimt", "x ".repeat(200));
        assert!(detect(&padded, initial()).is_empty());

        let widened = detect(&padded, DetectOptions::widened(&MatchingConfig::default()));
        assert_eq!(widened.len(), 1);
    }

    #[test]
    fn test_fuzzy_skipped_when_literal_hit_exists() {
        let evidence = detect("outlook og sharepoimt", initial());
        assert_eq!(evidence.len(), 1);
        assert_eq!(evidence[0].system, "Outlook");
    }

    #[test]
    fn test_deterministic_and_ordered() {
        let text = "sian og elements brukes sammen med teams";
        let first = detect(text, initial());
        let second = detect(text, initial());
        assert_eq!(first, second);
        assert!(first.windows(2).all(|w| w[0].position <= w[1].position));
    }

    #[test]
    fn test_empty_text_has_no_evidence() {
        assert!(detect("", initial()).is_empty());
    }

    #[test]
    fn test_head_respects_char_boundaries() {
        assert_eq!(head("æøå", 2), "æø");
        assert_eq!(head("abc", 10), "abc");
    }
}
