use std::cmp::{Ordering, Reverse};
use std::collections::BTreeMap;

use super::catalog::Catalog;
use crate::config::MatchingConfig;
use crate::model::{Confidence, MatchEvidence, MatchKind, ReasonCode};

/// Per-tier damping of a system's score; tier 1 keeps 80%, tier 4 half.
const TIER_PENALTY: f64 = 0.25;

#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    pub system: Option<String>,
    pub confidence: Confidence,
    pub reason: Option<ReasonCode>,
}

impl Decision {
    /// A decision recovery passes are allowed to adopt.
    pub fn is_adoptable(&self) -> bool {
        self.system.is_some() && self.confidence >= Confidence::Medium
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SystemScore {
    pub system: String,
    pub hits: usize,
    pub earliest: usize,
    pub tier: u8,
    pub score: f64,
}

impl SystemScore {
    fn rank_key(&self) -> (Reverse<i64>, u8, usize, &str) {
        (
            Reverse((self.score * 1e6).round() as i64),
            self.tier,
            self.earliest,
            self.system.as_str(),
        )
    }
}

/// Pure function of the evidence list: the same evidence always gives the
/// same decision.
pub struct Scorer<'a> {
    catalog: &'a Catalog,
    config: &'a MatchingConfig,
}

impl<'a> Scorer<'a> {
    pub fn new(catalog: &'a Catalog, config: &'a MatchingConfig) -> Self {
        Self { catalog, config }
    }

    /// Systems ordered best first: score, then tier, then earliest hit, then name.
    pub fn rank(&self, evidence: &[MatchEvidence]) -> Vec<SystemScore> {
        let mut grouped: BTreeMap<&str, (f64, usize, usize)> = BTreeMap::new();
        for hit in evidence {
            let slot = grouped
                .entry(hit.system.as_str())
                .or_insert((0.0, 0, usize::MAX));
            slot.0 += hit.weight;
            slot.1 += 1;
            slot.2 = slot.2.min(hit.position);
        }

        let near_top = self.config.near_top_chars.max(1) as f64;
        let mut scores: Vec<SystemScore> = grouped
            .into_iter()
            .map(|(system, (weight, hits, earliest))| {
                let tier = self.catalog.tier_of(system);
                let position_boost = 1.0 + near_top / (near_top + earliest as f64);
                let tier_factor = 1.0 / (1.0 + TIER_PENALTY * f64::from(tier));
                SystemScore {
                    system: system.to_string(),
                    hits,
                    earliest,
                    tier,
                    score: weight * position_boost * tier_factor,
                }
            })
            .collect();

        scores.sort_by(|a, b| a.rank_key().cmp(&b.rank_key()));
        scores
    }

    pub fn decide(&self, evidence: &[MatchEvidence]) -> Decision {
        let ranked = self.rank(evidence);
        let Some(top) = ranked.first() else {
            return Decision {
                system: None,
                confidence: Confidence::Low,
                reason: Some(ReasonCode::NoCandidates),
            };
        };

        let Some(runner_up) = ranked.get(1) else {
            let early_exact = evidence.iter().any(|hit| {
                hit.kind == MatchKind::ExactKeyword && hit.position < self.config.near_top_chars
            });
            return Decision {
                system: Some(top.system.clone()),
                confidence: if early_exact {
                    Confidence::High
                } else {
                    Confidence::Medium
                },
                reason: None,
            };
        };

        let ratio = if runner_up.score > 0.0 {
            top.score / runner_up.score
        } else {
            f64::INFINITY
        };

        let (confidence, reason) = match ratio.partial_cmp(&self.config.near_tie_ratio) {
            Some(Ordering::Less) => (Confidence::Low, Some(ReasonCode::AmbiguousClassification)),
            _ if ratio >= self.config.wide_margin => (Confidence::High, None),
            _ => (Confidence::Medium, None),
        };

        Decision {
            system: Some(top.system.clone()),
            confidence,
            reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(system: &str, kind: MatchKind, position: usize) -> MatchEvidence {
        MatchEvidence {
            system: system.to_string(),
            matched: system.to_lowercase(),
            kind,
            position,
            weight: kind.base_weight(),
        }
    }

    fn decide(evidence: &[MatchEvidence]) -> Decision {
        let catalog = Catalog::builtin().unwrap();
        let config = MatchingConfig::default();
        Scorer::new(&catalog, &config).decide(evidence)
    }

    #[test]
    fn test_no_evidence_is_unclassified() {
        let decision = decide(&[]);
        assert_eq!(decision.system, None);
        assert_eq!(decision.confidence, Confidence::Low);
        assert_eq!(decision.reason, Some(ReasonCode::NoCandidates));
    }

    #[test]
    fn test_single_system_confidence() {
        let early = decide(&[hit("Outlook", MatchKind::ExactKeyword, 10)]);
        assert_eq!(early.system.as_deref(), Some("Outlook"));
        assert_eq!(early.confidence, Confidence::High);

        let late = decide(&[hit("Outlook", MatchKind::ExactKeyword, 900)]);
        assert_eq!(late.confidence, Confidence::Medium);

        let alias_only = decide(&[hit("Outlook", MatchKind::Alias, 0)]);
        assert_eq!(alias_only.confidence, Confidence::Medium);
    }

    #[test]
    fn test_wide_margin_is_high() {
        let evidence = vec![
            hit("SIAN", MatchKind::ExactKeyword, 0),
            hit("SIAN", MatchKind::ExactKeyword, 40),
            hit("SIAN", MatchKind::ExactKeyword, 80),
            hit("Teams", MatchKind::ExactKeyword, 2000),
        ];
        let decision = decide(&evidence);
        assert_eq!(decision.system.as_deref(), Some("SIAN"));
        assert_eq!(decision.confidence, Confidence::High);
    }

    #[test]
    fn test_near_tie_is_low_but_keeps_top_pick() {
        // same tier, same weight, adjacent positions
        let evidence = vec![
            hit("Outlook", MatchKind::ExactKeyword, 10),
            hit("Excel", MatchKind::ExactKeyword, 12),
        ];
        let decision = decide(&evidence);
        assert_eq!(decision.system.as_deref(), Some("Outlook"));
        assert_eq!(decision.confidence, Confidence::Low);
        assert_eq!(decision.reason, Some(ReasonCode::AmbiguousClassification));
    }

    #[test]
    fn test_exact_tie_broken_by_tier_then_position() {
        let catalog = Catalog::builtin().unwrap();
        let config = MatchingConfig::default();
        let scorer = Scorer::new(&catalog, &config);

        let same_tier = scorer.rank(&[
            hit("Excel", MatchKind::ExactKeyword, 50),
            hit("Outlook", MatchKind::ExactKeyword, 50),
        ]);
        assert_eq!(same_tier[0].system, "Excel");

        let ranked = scorer.rank(&[hit("Microsoft", MatchKind::ExactKeyword, 0)]);
        assert_eq!(ranked[0].tier, 4);
    }

    #[test]
    fn test_tier_and_position_shape_the_score() {
        let evidence = vec![
            hit("Tilgangsportalen", MatchKind::Alias, 2),
            hit("SIAN", MatchKind::ExactKeyword, 40),
        ];
        let decision = decide(&evidence);
        assert_eq!(decision.system.as_deref(), Some("SIAN"));
        assert!(decision.confidence >= Confidence::Medium);
    }

    #[test]
    fn test_decision_is_repeatable() {
        let evidence = vec![
            hit("Jira", MatchKind::Alias, 5),
            hit("Confluence", MatchKind::ExactKeyword, 30),
        ];
        assert_eq!(decide(&evidence), decide(&evidence));
    }
}
