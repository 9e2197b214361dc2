use config::{Config, ConfigError, Environment, File as ConfigFile};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    pub source_dir: String,
    /// Root that receives the organized tree. Defaults to `source_dir`.
    pub output_root: Option<String>,
    pub ignore_patterns: Vec<String>,
    pub transfer_mode: TransferMode,
    pub dry_run: bool,
    pub alphabetical_view: bool,
    pub write_reports: bool,
    pub matching: MatchingConfig,
    pub normalizer: NormalizerConfig,
    pub layout: LayoutConfig,
    pub extra_systems: Vec<SystemConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            source_dir: ".".to_string(),
            output_root: None,
            ignore_patterns: Vec::new(),
            transfer_mode: TransferMode::Copy,
            dry_run: false,
            alphabetical_view: false,
            write_reports: true,
            matching: MatchingConfig::default(),
            normalizer: NormalizerConfig::default(),
            layout: LayoutConfig::default(),
            extra_systems: Vec::new(),
        }
    }
}

impl AppConfig {
    pub fn output_root(&self) -> PathBuf {
        PathBuf::from(self.output_root.as_deref().unwrap_or(&self.source_dir))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferMode {
    Copy,
    Move,
}

/// Thresholds for detection, scoring and recovery.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MatchingConfig {
    /// Size of the head region scanned for fuzzy hits in the initial pass.
    pub head_chars: usize,
    /// Offsets below this count as "near the top" of the document.
    pub near_top_chars: usize,
    pub fuzzy_threshold: f64,
    /// Threshold used by the fuzzy-widening recovery pass.
    pub widened_fuzzy_threshold: f64,
    pub sibling_threshold: f64,
    /// Shortest token or phrase (in chars) considered for fuzzy matching.
    pub min_fuzzy_len: usize,
    /// Winner/runner-up score ratio at or above which a contested decision is high.
    pub wide_margin: f64,
    /// Winner/runner-up score ratio below which a contested decision is a near-tie.
    pub near_tie_ratio: f64,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            head_chars: 300,
            near_top_chars: 200,
            fuzzy_threshold: 0.85,
            widened_fuzzy_threshold: 0.75,
            sibling_threshold: 0.90,
            min_fuzzy_len: 4,
            wide_margin: 2.0,
            near_tie_ratio: 1.15,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NormalizerConfig {
    /// Line patterns; a line matching any of them is dropped.
    pub boilerplate_patterns: Vec<String>,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            boilerplate_patterns: default_boilerplate_patterns(),
        }
    }
}

fn default_boilerplate_patterns() -> Vec<String> {
    [
        // date stamps
        r"^\s*\d{1,2}\.\d{1,2}\.\d{4}\s*$",
        r"(?i)^\s*sist\s+oppdatert",
        // support-desk phrases
        r"(?i)^\s*teksten under er for brukerstøtte",
        r"(?i)^\s*brukerstøttes fremgangsmåte",
        r"(?i)^\s*har du en tilbakemelding",
        r"(?i)^\s*trenger du fortsatt hjelp",
        r"(?i)^\s*meld inn sak til oss",
        r"(?i)^\s*nøkkelord\s*:",
        r"(?i)^\s*se også\s*:",
        // section headers
        r"(?i)^\s*problem eller behov\s*:?\s*$",
        r"(?i)^\s*system/program/tjeneste\s*:?\s*$",
        r"(?i)^\s*løsning/fremgangsmåte\s*:?\s*$",
        r"(?i)^\s*(innhold fra skjema|din henvendelse)\s*:?\s*$",
        // page furniture
        r"(?i)^\s*(side|page)\s+\d+(\s*(av|of)\s*\d+)?\s*$",
        r"(?i)^\s*side_\d+\.pdf\s*$",
        r"^\s*\d+\s*$",
        r"(?i)^\s*https?://\S+\s*$",
    ]
    .iter()
    .map(|p| p.to_string())
    .collect()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub organized_dir: String,
    pub alphabetical_dir: String,
    pub unclassified_bucket: String,
    pub failed_bucket: String,
    pub title_max_chars: usize,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            organized_dir: "organized_by_system".to_string(),
            alphabetical_dir: "alphabetical_all_pdfs".to_string(),
            unclassified_bucket: "Other".to_string(),
            failed_bucket: "_weird_format_files".to_string(),
            title_max_chars: 100,
        }
    }
}

/// A catalog entry supplied from configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SystemConfig {
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default = "default_tier")]
    pub tier: u8,
    #[serde(default)]
    pub independent: bool,
    #[serde(default)]
    pub access_portal: bool,
}

fn default_tier() -> u8 {
    2
}

/// Load `Config.toml` (optional) and `DOCSORT__*` environment overrides.
pub fn load_configuration() -> Result<AppConfig, ConfigError> {
    let builder = Config::builder()
        .add_source(ConfigFile::with_name("Config").required(false))
        .add_source(Environment::with_prefix("DOCSORT").separator("__"))
        .build()?;
    builder.try_deserialize::<AppConfig>()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_consistent() {
        let config = AppConfig::default();
        assert_eq!(config.transfer_mode, TransferMode::Copy);
        assert!(config.matching.widened_fuzzy_threshold < config.matching.fuzzy_threshold);
        assert!(config.matching.near_tie_ratio < config.matching.wide_margin);
        assert!(!config.normalizer.boilerplate_patterns.is_empty());
    }

    #[test]
    fn test_output_root_falls_back_to_source() {
        let mut config = AppConfig {
            source_dir: "/data/pdfs".to_string(),
            ..AppConfig::default()
        };
        assert_eq!(config.output_root(), PathBuf::from("/data/pdfs"));

        config.output_root = Some("/data/out".to_string());
        assert_eq!(config.output_root(), PathBuf::from("/data/out"));
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let parsed = Config::builder()
            .add_source(config::File::from_str(
                "source_dir = \"/in\"\ntransfer_mode = \"move\"\n[matching]\nhead_chars = 120\n",
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize::<AppConfig>()
            .unwrap();

        assert_eq!(parsed.source_dir, "/in");
        assert_eq!(parsed.transfer_mode, TransferMode::Move);
        assert_eq!(parsed.matching.head_chars, 120);
        assert_eq!(parsed.matching.near_top_chars, 200);
        assert_eq!(parsed.layout.unclassified_bucket, "Other");
    }
}
