use regex::RegexSet;

use crate::config::NormalizerConfig;
use crate::model::NormalizedText;

const MIN_TITLE_CHARS: usize = 10;
const MIN_FALLBACK_TITLE_CHARS: usize = 6;

/// Strips boilerplate lines and collapses whitespace. Never fails: the worst
/// case is an empty `NormalizedText`.
#[derive(Debug, Clone)]
pub struct Normalizer {
    boilerplate: RegexSet,
}

impl Normalizer {
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self, regex::Error> {
        let boilerplate = RegexSet::new(patterns.iter().map(|p| p.as_ref()))?;
        Ok(Self { boilerplate })
    }

    pub fn from_config(config: &NormalizerConfig) -> Result<Self, regex::Error> {
        Self::new(&config.boilerplate_patterns)
    }

    pub fn normalize(&self, raw: &str) -> NormalizedText {
        let kept: Vec<String> = raw
            .lines()
            .filter(|line| !self.boilerplate.is_match(line))
            .map(collapse_whitespace)
            .filter(|line| !line.is_empty())
            .collect();

        let display = kept.join("\n");
        let matching = kept.join(" ").to_lowercase();

        NormalizedText { matching, display }
    }
}

fn collapse_whitespace(line: &str) -> String {
    line.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// First meaningful line of the cleaned display text, used as a document title.
///
/// Lines that only repeat `system_name` are skipped. Falls back to the first
/// shorter line that still carries letters.
pub fn derive_title(display: &str, system_name: Option<&str>) -> Option<String> {
    let is_only_system = |line: &str| {
        system_name
            .map(|name| line.eq_ignore_ascii_case(name))
            .unwrap_or(false)
    };
    let has_letters = |line: &str| line.chars().filter(|c| c.is_alphabetic()).count() >= 3;

    let candidate = display
        .lines()
        .map(str::trim)
        .find(|line| {
            line.chars().count() >= MIN_TITLE_CHARS && has_letters(line) && !is_only_system(line)
        })
        .or_else(|| {
            display.lines().map(str::trim).find(|line| {
                line.chars().count() >= MIN_FALLBACK_TITLE_CHARS
                    && has_letters(line)
                    && !is_only_system(line)
            })
        })?;

    Some(candidate.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NormalizerConfig;

    fn normalizer() -> Normalizer {
        Normalizer::from_config(&NormalizerConfig::default()).unwrap()
    }

    #[test]
    fn test_drops_boilerplate_lines() {
        let raw = "Sist oppdatert: 12.03.2024\n\
                   Teams - opprette kanal\n\
                   Problem eller behov\n\
                   Du vil  opprette en   ny kanal\n\
                   Trenger du fortsatt hjelp? Ring oss\n\
                   Side 1 av 2\n\
                   17.08.2023";
        let text = normalizer().normalize(raw);

        assert_eq!(
            text.display,
            "Teams - opprette kanal\nDu vil opprette en ny kanal"
        );
        assert_eq!(
            text.matching,
            "teams - opprette kanal du vil opprette en ny kanal"
        );
    }

    #[test]
    fn test_empty_and_whitespace_input() {
        let n = normalizer();
        assert!(n.normalize("").is_empty());
        assert!(n.normalize("   \n\t\n  ").is_empty());
        assert!(n.normalize("12\n01.02.2020\n").is_empty());
    }

    #[test]
    fn test_preserves_display_case() {
        let text = normalizer().normalize("Outlook: Delt Postkasse");
        assert_eq!(text.display, "Outlook: Delt Postkasse");
        assert_eq!(text.matching, "outlook: delt postkasse");
    }

    #[test]
    fn test_invalid_pattern_is_rejected() {
        assert!(Normalizer::new(&["(unclosed"]).is_err());
    }

    #[test]
    fn test_derive_title_skips_short_and_system_lines() {
        let display = "SIAN\nv2\nHvordan logge inn i SIAN\nmer tekst her";
        assert_eq!(
            derive_title(display, Some("SIAN")).as_deref(),
            Some("Hvordan logge inn i SIAN")
        );
    }

    #[test]
    fn test_derive_title_fallback_and_none() {
        assert_eq!(derive_title("ab\nKort tittel", None).as_deref(), Some("Kort tittel"));
        assert_eq!(derive_title("Excel\nabc", None).as_deref(), None);
        assert_eq!(derive_title("", None), None);
    }
}
