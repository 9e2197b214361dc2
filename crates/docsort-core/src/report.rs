use csv::Writer;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::path::Path;

use crate::classify::PassOutcome;
use crate::error::Error;
use crate::model::{ClassificationResult, UNCLASSIFIED};
use crate::placement::{PlacementAction, PlacementDecision, PlacementStats};

pub const SUMMARY_FILE: &str = "run_summary.json";
pub const CSV_REPORT_FILE: &str = "classification_report.csv";

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub generated_at: String,
    pub source_dir: String,
    pub total_documents: usize,
    pub classified: usize,
    pub unclassified: usize,
    /// classified / total × 100; 0 for an empty run.
    pub accuracy_percent: f64,
    pub per_system: BTreeMap<String, usize>,
    pub per_confidence: BTreeMap<String, usize>,
    pub per_reason: BTreeMap<String, usize>,
    pub passes: Vec<PassOutcome>,
    pub placement: Option<PlacementStats>,
}

impl RunSummary {
    pub fn from_results(
        source_dir: &Path,
        results: &[ClassificationResult],
        passes: Vec<PassOutcome>,
    ) -> Self {
        let mut per_system = BTreeMap::new();
        let mut per_confidence = BTreeMap::new();
        let mut per_reason = BTreeMap::new();

        for result in results {
            *per_system.entry(result.system_name().to_string()).or_insert(0) += 1;
            *per_confidence
                .entry(result.confidence.to_string())
                .or_insert(0) += 1;
            if let Some(reason) = result.reason {
                *per_reason.entry(reason.to_string()).or_insert(0) += 1;
            }
        }

        let total_documents = results.len();
        let classified = results.iter().filter(|r| r.is_classified()).count();

        Self {
            generated_at: chrono::Utc::now().to_rfc3339(),
            source_dir: source_dir.to_string_lossy().into_owned(),
            total_documents,
            classified,
            unclassified: total_documents - classified,
            accuracy_percent: accuracy(classified, total_documents),
            per_system,
            per_confidence,
            per_reason,
            passes,
            placement: None,
        }
    }

    pub fn with_placement(mut self, stats: PlacementStats) -> Self {
        self.placement = Some(stats);
        self
    }

    pub fn write_json(&self, path: &Path) -> Result<(), Error> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }
}

pub fn accuracy(classified: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        classified as f64 / total as f64 * 100.0
    }
}

/// One row per document. `decisions`, when present, must be parallel to `results`.
pub fn write_csv_report(
    path: &Path,
    results: &[ClassificationResult],
    decisions: Option<&[PlacementDecision]>,
) -> Result<(), Error> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut writer = Writer::from_path(path)?;

    writer.write_record([
        "source",
        "system",
        "confidence",
        "pass",
        "reason",
        "evidence",
        "target",
        "action",
    ])?;

    for (idx, result) in results.iter().enumerate() {
        let decision = decisions.and_then(|d| d.get(idx));
        let (target, action) = match decision {
            Some(d) => match &d.action {
                PlacementAction::Place => (d.target().to_string_lossy().into_owned(), "place"),
                PlacementAction::AlreadyPlaced { existing } => {
                    (existing.to_string_lossy().into_owned(), "already_placed")
                }
            },
            None => (String::new(), ""),
        };

        writer.write_record(&[
            result.document_id.to_string_lossy().into_owned(),
            result.system.clone().unwrap_or_else(|| UNCLASSIFIED.to_string()),
            result.confidence.to_string(),
            result.pass.to_string(),
            result.reason.map_or(String::new(), |r| r.to_string()),
            evidence_summary(result),
            target,
            action.to_string(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

fn evidence_summary(result: &ClassificationResult) -> String {
    result
        .evidence
        .iter()
        .map(|hit| format!("{}:{}@{}", hit.kind.as_str(), hit.matched, hit.position))
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Confidence, MatchEvidence, MatchKind, ReasonCode};
    use std::path::PathBuf;
    use tempfile::tempdir;

    fn results() -> Vec<ClassificationResult> {
        vec![
            ClassificationResult {
                document_id: PathBuf::from("a.pdf"),
                system: Some("Teams".to_string()),
                evidence: vec![MatchEvidence {
                    system: "Teams".to_string(),
                    matched: "teams".to_string(),
                    kind: MatchKind::ExactKeyword,
                    position: 3,
                    weight: 1.0,
                }],
                confidence: Confidence::High,
                pass: 0,
                reason: None,
            },
            ClassificationResult::unclassified(PathBuf::from("b.pdf"), ReasonCode::EmptyContent, 0),
        ]
    }

    #[test]
    fn test_accuracy() {
        assert_eq!(accuracy(0, 0), 0.0);
        assert_eq!(accuracy(3, 4), 75.0);
    }

    #[test]
    fn test_summary_counts() {
        let summary = RunSummary::from_results(Path::new("/in"), &results(), Vec::new());
        assert_eq!(summary.total_documents, 2);
        assert_eq!(summary.classified, 1);
        assert_eq!(summary.unclassified, 1);
        assert_eq!(summary.accuracy_percent, 50.0);
        assert_eq!(summary.per_system.get("Teams"), Some(&1));
        assert_eq!(summary.per_system.get(UNCLASSIFIED), Some(&1));
        assert_eq!(summary.per_reason.get("empty_content"), Some(&1));
    }

    #[test]
    fn test_reports_are_written() {
        let dir = tempdir().unwrap();
        let json = dir.path().join(SUMMARY_FILE);
        let csv_path = dir.path().join(CSV_REPORT_FILE);

        RunSummary::from_results(dir.path(), &results(), Vec::new())
            .write_json(&json)
            .unwrap();
        write_csv_report(&csv_path, &results(), None).unwrap();

        let parsed: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&json).unwrap()).unwrap();
        assert_eq!(parsed["total_documents"], 2);

        let csv_text = fs::read_to_string(&csv_path).unwrap();
        assert_eq!(csv_text.lines().count(), 3);
        assert!(csv_text.contains("exact_keyword:teams@3"));
    }
}
