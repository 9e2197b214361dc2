use ahash::AHashMap;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use super::catalog_data::{BUILTIN_SYSTEMS, SECONDARY_KEYWORDS};
use super::similarity::Similarity;
use crate::config::SystemConfig;
use crate::model::MatchKind;

/// Catalog terms shorter than this never take part in fuzzy lookups; three-letter
/// acronyms are one edit away from too many ordinary words.
const MIN_FUZZY_TERM_CHARS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SystemRole {
    Standard,
    /// Must never be grouped under a gateway system.
    Independent,
    /// A gateway to other systems.
    AccessPortal,
}

#[derive(Debug, Clone, Serialize)]
pub struct SystemEntry {
    pub name: String,
    pub aliases: Vec<String>,
    /// Lower tier wins ties.
    pub tier: u8,
    pub role: SystemRole,
}

impl SystemEntry {
    pub fn is_independent(&self) -> bool {
        self.role == SystemRole::Independent
    }

    pub fn is_access_portal(&self) -> bool {
        self.role == SystemRole::AccessPortal
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("system name must not be empty")]
    EmptyName,

    #[error("term '{term}' is claimed by both '{first}' and '{second}'")]
    DuplicateTerm {
        term: String,
        first: String,
        second: String,
    },

    #[error("system '{0}' cannot be both independent and an access portal")]
    ConflictingRole(String),

    #[error("secondary keyword '{keyword}' refers to unknown system '{system}'")]
    UnknownSystem { keyword: String, system: String },

    #[error("secondary keyword '{keyword}' is already a primary term of '{system}'")]
    SecondaryShadowsPrimary { keyword: String, system: String },
}

/// A searchable lowercase string pointing at one catalog entry.
#[derive(Debug, Clone)]
pub struct Term {
    pub text: String,
    pub system: usize,
    pub kind: MatchKind,
    pub words: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct FuzzyMatch<'a> {
    pub entry: &'a SystemEntry,
    pub term: &'a str,
    pub score: f64,
}

/// Read-only registry of known systems. Shared across threads by reference.
#[derive(Debug, Clone)]
pub struct Catalog {
    entries: Vec<SystemEntry>,
    by_name: AHashMap<String, usize>,
    by_term: AHashMap<String, usize>,
    terms: Vec<Term>,
    secondary: Vec<Term>,
}

impl Catalog {
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::with_extra(&[])
    }

    /// Built-in table plus systems supplied by configuration.
    pub fn with_extra(extra: &[SystemConfig]) -> Result<Self, CatalogError> {
        let mut entries: Vec<SystemEntry> = BUILTIN_SYSTEMS
            .iter()
            .map(|builtin| SystemEntry {
                name: builtin.name.to_string(),
                aliases: builtin.aliases.iter().map(|a| a.to_string()).collect(),
                tier: builtin.tier,
                role: builtin.role,
            })
            .collect();

        for system in extra {
            let role = match (system.independent, system.access_portal) {
                (true, true) => return Err(CatalogError::ConflictingRole(system.name.clone())),
                (true, false) => SystemRole::Independent,
                (false, true) => SystemRole::AccessPortal,
                (false, false) => SystemRole::Standard,
            };
            entries.push(SystemEntry {
                name: system.name.clone(),
                aliases: system.aliases.clone(),
                tier: system.tier,
                role,
            });
        }

        let secondary: Vec<(String, String)> = SECONDARY_KEYWORDS
            .iter()
            .map(|(k, s)| (k.to_string(), s.to_string()))
            .collect();

        Self::from_entries(entries, &secondary)
    }

    /// Build and validate a catalog. Any term (canonical name or alias) claimed
    /// by two systems, compared case-insensitively, is rejected.
    pub fn from_entries(
        entries: Vec<SystemEntry>,
        secondary: &[(String, String)],
    ) -> Result<Self, CatalogError> {
        let mut by_name = AHashMap::new();
        let mut by_term: AHashMap<String, usize> = AHashMap::new();
        let mut terms = Vec::new();

        for (idx, entry) in entries.iter().enumerate() {
            let name = normalize_term(&entry.name);
            if name.is_empty() {
                return Err(CatalogError::EmptyName);
            }
            by_name.insert(name.clone(), idx);

            let own_terms = std::iter::once((name, MatchKind::ExactKeyword)).chain(
                entry
                    .aliases
                    .iter()
                    .map(|alias| (normalize_term(alias), MatchKind::Alias)),
            );

            for (text, kind) in own_terms {
                if text.is_empty() {
                    continue;
                }
                match by_term.get(&text) {
                    Some(&owner) if owner == idx => continue,
                    Some(&owner) => {
                        return Err(CatalogError::DuplicateTerm {
                            term: text,
                            first: entries[owner].name.clone(),
                            second: entry.name.clone(),
                        })
                    }
                    None => {}
                }
                by_term.insert(text.clone(), idx);
                terms.push(Term {
                    words: text.split(' ').count(),
                    text,
                    system: idx,
                    kind,
                });
            }
        }

        let mut secondary_terms = Vec::with_capacity(secondary.len());
        for (keyword, system) in secondary {
            let text = normalize_term(keyword);
            let Some(&idx) = by_name.get(&normalize_term(system)) else {
                return Err(CatalogError::UnknownSystem {
                    keyword: keyword.clone(),
                    system: system.clone(),
                });
            };
            if let Some(&owner) = by_term.get(&text) {
                return Err(CatalogError::SecondaryShadowsPrimary {
                    keyword: keyword.clone(),
                    system: entries[owner].name.clone(),
                });
            }
            secondary_terms.push(Term {
                words: text.split(' ').count(),
                text,
                system: idx,
                kind: MatchKind::SecondaryContext,
            });
        }

        debug!(
            "Catalog built: {} systems, {} primary terms, {} secondary keywords",
            entries.len(),
            terms.len(),
            secondary_terms.len()
        );

        Ok(Self {
            entries,
            by_name,
            by_term,
            terms,
            secondary: secondary_terms,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[SystemEntry] {
        &self.entries
    }

    pub fn entry(&self, idx: usize) -> &SystemEntry {
        &self.entries[idx]
    }

    /// Entry by canonical name, case-insensitive.
    pub fn get(&self, name: &str) -> Option<&SystemEntry> {
        self.by_name
            .get(&normalize_term(name))
            .map(|&idx| &self.entries[idx])
    }

    /// Tier of `name`; unknown systems sort last.
    pub fn tier_of(&self, name: &str) -> u8 {
        self.get(name).map(|e| e.tier).unwrap_or(u8::MAX)
    }

    /// Exact lookup: `phrase` equals a canonical name or alias, ignoring case
    /// and surrounding or repeated whitespace.
    pub fn lookup(&self, phrase: &str) -> Option<&SystemEntry> {
        self.by_term
            .get(&normalize_term(phrase))
            .map(|&idx| &self.entries[idx])
    }

    /// Best-scoring entry whose name or alias is at least `threshold` similar to
    /// `query`. Only terms with the same word count are compared. Ties go to the
    /// lower tier, then to catalog order.
    pub fn fuzzy_lookup(
        &self,
        query: &str,
        threshold: f64,
        similarity: &dyn Similarity,
    ) -> Option<FuzzyMatch<'_>> {
        let query = normalize_term(query);
        let words = query.split(' ').count();
        let mut best: Option<FuzzyMatch<'_>> = None;

        for term in &self.terms {
            if term.words != words || term.text.chars().count() < MIN_FUZZY_TERM_CHARS {
                continue;
            }
            let score = similarity.similarity(&query, &term.text);
            if score < threshold {
                continue;
            }
            let entry = &self.entries[term.system];
            let better = match &best {
                None => true,
                Some(current) => {
                    score > current.score
                        || (score == current.score && entry.tier < current.entry.tier)
                }
            };
            if better {
                best = Some(FuzzyMatch {
                    entry,
                    term: &term.text,
                    score,
                });
            }
        }

        best
    }

    pub fn primary_terms(&self) -> &[Term] {
        &self.terms
    }

    pub fn secondary_terms(&self) -> &[Term] {
        &self.secondary
    }
}

fn normalize_term(term: &str) -> String {
    term.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::similarity::NormalizedLevenshtein;

    fn entry(name: &str, aliases: &[&str], tier: u8, role: SystemRole) -> SystemEntry {
        SystemEntry {
            name: name.to_string(),
            aliases: aliases.iter().map(|a| a.to_string()).collect(),
            tier,
            role,
        }
    }

    #[test]
    fn test_builtin_catalog_is_valid() {
        let catalog = Catalog::builtin().unwrap();
        assert!(catalog.len() >= 50);
        assert!(catalog.get("sian").unwrap().is_independent());
        assert!(catalog.get("Tilgangsportalen").unwrap().is_access_portal());
    }

    #[test]
    fn test_lookup_is_case_and_space_insensitive() {
        let catalog = Catalog::builtin().unwrap();
        assert_eq!(catalog.lookup("MS  Teams").unwrap().name, "Teams");
        assert_eq!(catalog.lookup("outlook").unwrap().name, "Outlook");
        assert_eq!(catalog.lookup("Min Side").unwrap().name, "Tilgangsportalen");
        assert!(catalog.lookup("ms").is_none());
    }

    #[test]
    fn test_duplicate_alias_across_systems_is_fatal() {
        let result = Catalog::from_entries(
            vec![
                entry("Teams", &["chat"], 2, SystemRole::Standard),
                entry("Mattermost", &["CHAT"], 2, SystemRole::Standard),
            ],
            &[],
        );
        assert!(matches!(result, Err(CatalogError::DuplicateTerm { .. })));
    }

    #[test]
    fn test_alias_equal_to_other_canonical_is_fatal() {
        let result = Catalog::from_entries(
            vec![
                entry("Cisco", &["jabber"], 3, SystemRole::Standard),
                entry("Jabber", &[], 2, SystemRole::Independent),
            ],
            &[],
        );
        assert!(matches!(result, Err(CatalogError::DuplicateTerm { .. })));
    }

    #[test]
    fn test_alias_repeating_own_name_is_ignored() {
        let catalog = Catalog::from_entries(
            vec![entry("Excel", &["EXCEL", "regneark-app"], 2, SystemRole::Standard)],
            &[],
        )
        .unwrap();
        assert_eq!(catalog.primary_terms().len(), 2);
    }

    #[test]
    fn test_secondary_keyword_validation() {
        let entries = vec![entry("Outlook", &[], 2, SystemRole::Standard)];
        let unknown = Catalog::from_entries(
            entries.clone(),
            &[("innboks".to_string(), "Exchange".to_string())],
        );
        assert!(matches!(unknown, Err(CatalogError::UnknownSystem { .. })));

        let shadow = Catalog::from_entries(
            entries,
            &[("outlook".to_string(), "Outlook".to_string())],
        );
        assert!(matches!(shadow, Err(CatalogError::SecondaryShadowsPrimary { .. })));
    }

    #[test]
    fn test_extra_system_with_both_roles_is_rejected() {
        let extra = SystemConfig {
            name: "Nyportal".to_string(),
            aliases: vec![],
            tier: 2,
            independent: true,
            access_portal: true,
        };
        assert!(matches!(
            Catalog::with_extra(&[extra]),
            Err(CatalogError::ConflictingRole(_))
        ));
    }

    #[test]
    fn test_extra_system_is_searchable() {
        let extra = SystemConfig {
            name: "Nettskjema".to_string(),
            aliases: vec!["nett skjema".to_string()],
            tier: 2,
            independent: true,
            access_portal: false,
        };
        let catalog = Catalog::with_extra(&[extra]).unwrap();
        assert_eq!(catalog.lookup("Nett Skjema").unwrap().name, "Nettskjema");
    }

    #[test]
    fn test_fuzzy_lookup_threshold() {
        let catalog = Catalog::builtin().unwrap();
        let sim = NormalizedLevenshtein;

        let hit = catalog.fuzzy_lookup("sharepoimt", 0.85, &sim).unwrap();
        assert_eq!(hit.entry.name, "SharePoint");
        assert!(hit.score > 0.85);

        assert!(catalog.fuzzy_lookup("kaffemaskin", 0.85, &sim).is_none());
    }

    #[test]
    fn test_fuzzy_lookup_skips_short_terms() {
        let catalog = Catalog::builtin().unwrap();
        // "less" is one edit from "ess", which must not count
        assert!(catalog
            .fuzzy_lookup("less", 0.5, &NormalizedLevenshtein)
            .map(|m| m.entry.name != "ESS")
            .unwrap_or(true));
    }
}
