use dashmap::DashMap;
use glob::Pattern;
use rayon::prelude::*;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, error};

/// True for paths ending in `.pdf`, any case.
pub fn is_pdf(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().eq_ignore_ascii_case("pdf"))
        .unwrap_or(false)
}

/// PDFs directly inside `source_dir`, sorted by path. Sub-directories are not
/// entered, so an organized tree living under the source is never rescanned.
pub fn list_source_pdfs(source_dir: &Path, ignore_globs: &[&str]) -> io::Result<Vec<PathBuf>> {
    let ignore_patterns = compile_patterns(ignore_globs);

    let entries = fs::read_dir(source_dir).map_err(|err| {
        io::Error::new(
            err.kind(),
            format!("Error reading directory {}: {}", source_dir.display(), err),
        )
    })?;

    let mut files = Vec::new();
    for entry_result in entries {
        let entry = match entry_result {
            Ok(entry) => entry,
            Err(err) => {
                error!(
                    "Error reading entry in directory {}: {}",
                    source_dir.display(),
                    err
                );
                continue;
            }
        };

        let path = entry.path();
        if !path.is_file() || !is_pdf(&path) {
            continue;
        }
        if ignore_patterns
            .iter()
            .any(|pattern| pattern.matches_path(&path))
        {
            debug!("Ignoring {}", path.display());
            continue;
        }
        files.push(path);
    }

    files.sort();
    Ok(files)
}

/// Parallel directory traversal. Builds a map of file_size → Vec<PathBuf>,
/// filtering by glob ignore patterns. Skips symlinks; empty files are indexed
/// too, so an already-placed 0-byte PDF is still recognised.
/// Missing roots yield an empty map.
pub fn build_size_to_files_map(
    root_paths: &[&Path],
    ignore_globs: &[&str],
) -> io::Result<DashMap<u64, Vec<PathBuf>>> {
    let map: DashMap<u64, Vec<PathBuf>> = DashMap::new();
    let ignore_patterns = compile_patterns(ignore_globs);

    root_paths
        .par_iter()
        .try_for_each(|root_dir| visit_dirs(root_dir, &map, &ignore_patterns))?;

    Ok(map)
}

fn compile_patterns(globs: &[&str]) -> Vec<Pattern> {
    globs
        .iter()
        .filter_map(|glob| match Pattern::new(glob) {
            Ok(p) => Some(p),
            Err(e) => {
                error!("Invalid glob pattern '{}': {}", glob, e);
                None
            }
        })
        .collect()
}

fn visit_dirs(
    dir: &Path,
    map: &DashMap<u64, Vec<PathBuf>>,
    ignore_patterns: &[Pattern],
) -> io::Result<()> {
    if !dir.is_dir() {
        return Ok(());
    }

    if ignore_patterns
        .iter()
        .any(|pattern| pattern.matches_path(dir))
    {
        return Ok(());
    }

    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            if err.kind() == io::ErrorKind::PermissionDenied {
                error!(
                    "Access denied reading directory {}: {}",
                    dir.display(),
                    err
                );
                return Ok(());
            } else {
                return Err(io::Error::new(
                    err.kind(),
                    format!("Error reading directory {}: {}", dir.display(), err),
                ));
            }
        }
    };

    entries.par_bridge().try_for_each(|entry_result| {
        let entry = match entry_result {
            Ok(entry) => entry,
            Err(err) => {
                return Err(io::Error::new(
                    err.kind(),
                    format!(
                        "Error reading entry in directory {}: {}",
                        dir.display(),
                        err
                    ),
                ))
            }
        };

        let path = entry.path();
        let metadata = match fs::symlink_metadata(&path) {
            Ok(metadata) => metadata,
            Err(err) => {
                return Err(io::Error::new(
                    err.kind(),
                    format!("Error getting metadata for {}: {}", path.display(), err),
                ))
            }
        };

        if metadata.is_dir() {
            visit_dirs(&path, map, ignore_patterns)
        } else {
            if metadata.is_file()
                && !ignore_patterns
                    .iter()
                    .any(|pattern| pattern.matches_path(&path))
            {
                map.entry(metadata.len()).or_default().push(path);
            }
            Ok(())
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_list_source_pdfs_is_flat_and_sorted() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("b.pdf"), b"b").unwrap();
        fs::write(dir.path().join("A.PDF"), b"a").unwrap();
        fs::write(dir.path().join("notes.txt"), b"n").unwrap();
        fs::create_dir(dir.path().join("organized_by_system")).unwrap();
        fs::write(dir.path().join("organized_by_system").join("c.pdf"), b"c").unwrap();

        let files = list_source_pdfs(dir.path(), &[]).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["A.PDF", "b.pdf"]);
    }

    #[test]
    fn test_list_source_pdfs_honors_ignore_globs() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("keep.pdf"), b"k").unwrap();
        fs::write(dir.path().join("draft_skip.pdf"), b"d").unwrap();

        let files = list_source_pdfs(dir.path(), &["*draft_*"]).unwrap();
        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("keep.pdf"));
    }

    #[test]
    fn test_size_map_indexes_empty_files_and_skips_missing_roots() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("one.pdf"), b"12345").unwrap();
        fs::write(dir.path().join("empty.pdf"), b"").unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("nested").join("two.pdf"), b"54321").unwrap();
        let missing = dir.path().join("missing");

        let map = build_size_to_files_map(&[dir.path(), missing.as_path()], &[]).unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map.get(&5).unwrap().len(), 2);
        assert_eq!(map.get(&0).unwrap().len(), 1);
    }
}
