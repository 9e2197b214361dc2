use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// Sentinel system name reported for documents without a decision.
pub const UNCLASSIFIED: &str = "Unclassified";

/// Outcome of pulling text out of a source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionStatus {
    Ok,
    Empty,
    ExtractionFailed,
}

/// Cleaned text in two shapes: a lowercased, whitespace-collapsed copy used for
/// matching and a line-preserving copy in original case used for titles.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedText {
    pub matching: String,
    pub display: String,
}

impl NormalizedText {
    pub fn is_empty(&self) -> bool {
        self.matching.is_empty()
    }
}

/// One source PDF. Built once at scan time; only its classification changes later.
#[derive(Debug, Clone)]
pub struct Document {
    pub id: PathBuf,
    pub raw_text: Option<String>,
    pub text: NormalizedText,
    pub status: ExtractionStatus,
    /// Extractor message when `status` is `ExtractionFailed`.
    pub failure: Option<String>,
}

impl Document {
    pub fn path(&self) -> &Path {
        &self.id
    }

    pub fn file_stem(&self) -> String {
        self.id
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    pub fn has_text(&self) -> bool {
        self.status == ExtractionStatus::Ok
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    /// Canonical system name.
    ExactKeyword,
    Alias,
    Fuzzy,
    /// Keyword from the secondary (nickname / department) list.
    SecondaryContext,
}

impl MatchKind {
    /// Base weight of a single hit of this kind. Fuzzy hits are further scaled
    /// by their similarity.
    pub fn base_weight(self) -> f64 {
        match self {
            MatchKind::ExactKeyword => 1.0,
            MatchKind::Alias => 0.9,
            MatchKind::Fuzzy => 0.7,
            MatchKind::SecondaryContext => 0.5,
        }
    }

    /// Literal catalog hits, as opposed to fuzzy or contextual ones.
    pub fn is_literal(self) -> bool {
        matches!(self, MatchKind::ExactKeyword | MatchKind::Alias)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MatchKind::ExactKeyword => "exact_keyword",
            MatchKind::Alias => "alias",
            MatchKind::Fuzzy => "fuzzy",
            MatchKind::SecondaryContext => "secondary_context",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchEvidence {
    pub system: String,
    pub matched: String,
    pub kind: MatchKind,
    /// Byte offset into the normalized matching text.
    pub position: usize,
    pub weight: f64,
}

impl MatchEvidence {
    pub fn end(&self) -> usize {
        self.position + self.matched.len()
    }

    pub fn overlaps(&self, other: &MatchEvidence) -> bool {
        self.position < other.end() && other.position < self.end()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl Confidence {
    pub fn as_str(self) -> &'static str {
        match self {
            Confidence::Low => "low",
            Confidence::Medium => "medium",
            Confidence::High => "high",
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a document is unclassified or only weakly classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasonCode {
    ExtractionFailure,
    EmptyContent,
    AmbiguousClassification,
    NoCandidates,
}

impl ReasonCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ReasonCode::ExtractionFailure => "extraction_failure",
            ReasonCode::EmptyContent => "empty_content",
            ReasonCode::AmbiguousClassification => "ambiguous_classification",
            ReasonCode::NoCandidates => "no_candidates",
        }
    }
}

impl fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The current decision for one document. Recovery passes overwrite it in place.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationResult {
    pub document_id: PathBuf,
    /// `None` means unclassified.
    pub system: Option<String>,
    pub evidence: Vec<MatchEvidence>,
    pub confidence: Confidence,
    /// 0 for the initial pass, then the number of the recovery pass.
    pub pass: u8,
    pub reason: Option<ReasonCode>,
}

impl ClassificationResult {
    pub fn unclassified(document_id: PathBuf, reason: ReasonCode, pass: u8) -> Self {
        Self {
            document_id,
            system: None,
            evidence: Vec::new(),
            confidence: Confidence::Low,
            pass,
            reason: Some(reason),
        }
    }

    pub fn system_name(&self) -> &str {
        self.system.as_deref().unwrap_or(UNCLASSIFIED)
    }

    pub fn is_classified(&self) -> bool {
        self.system.is_some()
    }

    /// A decision recovery passes leave alone.
    pub fn is_resolved(&self) -> bool {
        self.system.is_some() && self.confidence >= Confidence::Medium
    }
}
