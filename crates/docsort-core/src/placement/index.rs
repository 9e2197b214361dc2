use ahash::AHashSet;
use dashmap::DashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::layout::disambiguate;
use crate::{hasher, scanner};

/// What a target directory already holds: its entry names (lowercased, for
/// case-insensitive collision checks) and its files keyed by size.
#[derive(Debug, Default)]
pub struct BucketIndex {
    names: AHashSet<String>,
    by_size: DashMap<u64, Vec<PathBuf>>,
}

impl BucketIndex {
    /// A missing directory gives an empty index.
    pub fn load(dir: &Path) -> io::Result<Self> {
        let mut names = AHashSet::new();
        if dir.is_dir() {
            for entry in fs::read_dir(dir)? {
                names.insert(entry?.file_name().to_string_lossy().to_lowercase());
            }
        }
        let by_size = scanner::build_size_to_files_map(&[dir], &[])?;
        Ok(Self { names, by_size })
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.names.contains(&name.to_lowercase())
    }

    /// An indexed file with the same bytes as `source`.
    pub fn find_identical(&self, source: &Path) -> io::Result<Option<PathBuf>> {
        hasher::find_identical(source, &self.by_size)
    }

    /// Reserve `desired`, or the first free numbered variant of it. The flag is
    /// true when a suffix had to be added.
    pub fn claim(&mut self, desired: &str) -> (String, bool) {
        let name = disambiguate(desired, |candidate| self.contains_name(candidate));
        let renamed = name != desired;
        self.names.insert(name.to_lowercase());
        (name, renamed)
    }

    /// Make a file written into this directory visible to later content checks.
    pub fn record(&self, path: PathBuf, size: u64) {
        self.by_size.entry(size).or_default().push(path);
    }
}
