use rayon::prelude::*;
use serde::Serialize;
use std::path::Path;
use tracing::{debug, info};

use super::detect::DetectOptions;
use super::normalize::derive_title;
use super::Classifier;
use crate::model::{ClassificationResult, Confidence, Document, MatchEvidence, MatchKind};
use crate::progress::ProgressReporter;

/// Re-classification passes, in the order they run. Each one only touches
/// documents the earlier stages left unresolved, except contextual correction,
/// which only touches documents assigned to an access portal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryPass {
    BroaderKeywords,
    FuzzyWidening,
    ContextualCorrection,
    SiblingCrossReference,
}

impl RecoveryPass {
    pub const ALL: [RecoveryPass; 4] = [
        RecoveryPass::BroaderKeywords,
        RecoveryPass::FuzzyWidening,
        RecoveryPass::ContextualCorrection,
        RecoveryPass::SiblingCrossReference,
    ];

    /// Pass number stored on results; 0 is the initial classification.
    pub fn number(self) -> u8 {
        match self {
            RecoveryPass::BroaderKeywords => 1,
            RecoveryPass::FuzzyWidening => 2,
            RecoveryPass::ContextualCorrection => 3,
            RecoveryPass::SiblingCrossReference => 4,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            RecoveryPass::BroaderKeywords => "broader_keywords",
            RecoveryPass::FuzzyWidening => "fuzzy_widening",
            RecoveryPass::ContextualCorrection => "contextual_correction",
            RecoveryPass::SiblingCrossReference => "sibling_cross_reference",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PassOutcome {
    pub pass: u8,
    pub name: &'static str,
    pub examined: usize,
    pub changed: usize,
}

struct Anchor<'d> {
    path: &'d Path,
    system: String,
    title: String,
}

impl Classifier {
    /// Run every recovery pass in order over `results`, which must be parallel
    /// to `documents`.
    pub fn recover(
        &self,
        documents: &[Document],
        results: &mut [ClassificationResult],
        reporter: &dyn ProgressReporter,
    ) -> Vec<PassOutcome> {
        RecoveryPass::ALL
            .iter()
            .map(|&pass| {
                reporter.on_recovery_pass_start(pass.name());
                let outcome = self.run_pass(pass, documents, results);
                info!(
                    "Recovery pass {} ({}): examined {}, changed {}",
                    outcome.pass, outcome.name, outcome.examined, outcome.changed
                );
                reporter.on_recovery_pass_complete(pass.name(), outcome.examined, outcome.changed);
                outcome
            })
            .collect()
    }

    pub fn run_pass(
        &self,
        pass: RecoveryPass,
        documents: &[Document],
        results: &mut [ClassificationResult],
    ) -> PassOutcome {
        let (examined, changed) = match pass {
            RecoveryPass::BroaderKeywords => self.redetect(
                documents,
                results,
                &DetectOptions::broader_keywords(self.matching()),
                pass.number(),
            ),
            RecoveryPass::FuzzyWidening => self.redetect(
                documents,
                results,
                &DetectOptions::widened(self.matching()),
                pass.number(),
            ),
            RecoveryPass::ContextualCorrection => self.correct_access_portals(results, pass.number()),
            RecoveryPass::SiblingCrossReference => {
                self.cross_reference_siblings(documents, results, pass.number())
            }
        };

        PassOutcome {
            pass: pass.number(),
            name: pass.name(),
            examined,
            changed,
        }
    }

    fn redetect(
        &self,
        documents: &[Document],
        results: &mut [ClassificationResult],
        options: &DetectOptions,
        pass: u8,
    ) -> (usize, usize) {
        let detector = self.detector();
        let scorer = self.scorer();

        results
            .par_iter_mut()
            .zip(documents.par_iter())
            .filter(|(result, doc)| doc.has_text() && !result.is_resolved())
            .map(|(result, doc)| {
                let evidence = detector.detect(&doc.text.matching, options);
                let decision = scorer.decide(&evidence);
                if !decision.is_adoptable() {
                    return (1, 0);
                }
                debug!(
                    "Pass {}: {} -> {:?} ({})",
                    pass,
                    doc.id.display(),
                    decision.system,
                    decision.confidence
                );
                *result = ClassificationResult {
                    document_id: doc.id.clone(),
                    system: decision.system,
                    evidence,
                    confidence: decision.confidence,
                    pass,
                    reason: None,
                };
                (1, 1)
            })
            .reduce(|| (0, 0), |a, b| (a.0 + b.0, a.1 + b.1))
    }

    /// A document assigned to an access portal whose evidence also names an
    /// independent system literally is moved to the best such system.
    fn correct_access_portals(&self, results: &mut [ClassificationResult], pass: u8) -> (usize, usize) {
        let catalog = self.catalog();
        let scorer = self.scorer();
        let mut examined = 0;
        let mut changed = 0;

        for result in results.iter_mut() {
            let on_portal = result
                .system
                .as_deref()
                .and_then(|name| catalog.get(name))
                .map_or(false, |entry| entry.is_access_portal());
            if !on_portal {
                continue;
            }
            examined += 1;

            let independent: Vec<MatchEvidence> = result
                .evidence
                .iter()
                .filter(|hit| hit.kind.is_literal())
                .filter(|hit| catalog.get(&hit.system).map_or(false, |e| e.is_independent()))
                .cloned()
                .collect();

            let Some(best) = scorer.rank(&independent).into_iter().next() else {
                continue;
            };

            debug!(
                "Pass {}: {} moved from access portal {} to {}",
                pass,
                result.document_id.display(),
                result.system_name(),
                best.system
            );
            result.system = Some(best.system);
            result.confidence = result.confidence.max(Confidence::Medium);
            result.reason = None;
            result.pass = pass;
            changed += 1;
        }

        (examined, changed)
    }

    /// Unresolved documents whose title closely matches a confidently classified
    /// document's title join that document's system.
    fn cross_reference_siblings(
        &self,
        documents: &[Document],
        results: &mut [ClassificationResult],
        pass: u8,
    ) -> (usize, usize) {
        let mut anchors: Vec<Anchor<'_>> = documents
            .iter()
            .zip(results.iter())
            .filter(|(_, result)| result.confidence == Confidence::High)
            .filter_map(|(doc, result)| {
                let system = result.system.clone()?;
                let title = derive_title(&doc.text.display, Some(&system))?;
                Some(Anchor {
                    path: doc.path(),
                    system,
                    title: title.to_lowercase(),
                })
            })
            .collect();
        anchors.sort_by(|a, b| a.path.cmp(b.path));

        if anchors.is_empty() {
            return (0, 0);
        }

        let similarity = self.similarity();
        let threshold = self.matching().sibling_threshold;

        results
            .par_iter_mut()
            .zip(documents.par_iter())
            .filter(|(result, doc)| doc.has_text() && !result.is_resolved())
            .map(|(result, doc)| {
                let Some(title) = derive_title(&doc.text.display, None) else {
                    return (1, 0);
                };
                let title = title.to_lowercase();

                let mut best: Option<(&Anchor<'_>, f64)> = None;
                for anchor in &anchors {
                    let score = similarity.similarity(&title, &anchor.title);
                    if score >= threshold && best.map_or(true, |(_, s)| score > s) {
                        best = Some((anchor, score));
                    }
                }
                let Some((anchor, score)) = best else {
                    return (1, 0);
                };

                debug!(
                    "Pass {}: {} joins sibling {} in {}",
                    pass,
                    doc.id.display(),
                    anchor.path.display(),
                    anchor.system
                );
                result.evidence.push(MatchEvidence {
                    system: anchor.system.clone(),
                    matched: anchor.title.clone(),
                    kind: MatchKind::SecondaryContext,
                    position: 0,
                    weight: MatchKind::SecondaryContext.base_weight() * score,
                });
                result.system = Some(anchor.system.clone());
                result.confidence = Confidence::Medium;
                result.reason = None;
                result.pass = pass;
                (1, 1)
            })
            .reduce(|| (0, 0), |a, b| (a.0 + b.0, a.1 + b.1))
    }
}
