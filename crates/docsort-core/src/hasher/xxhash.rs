use dashmap::DashMap;
use std::fs::{self, File};
use std::hash::Hasher as _;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use twox_hash::XxHash64;

const PARTIAL_HASH_LENGTH: usize = 1024; // 1KB

/// First file in `size_map` with the same bytes as `candidate`, if any. Sizes
/// are compared first, then a partial hash of the first 1KB, and only then a
/// hash of the full content.
/// Unreadable entries are logged and skipped.
pub fn find_identical(
    candidate: &Path,
    size_map: &DashMap<u64, Vec<PathBuf>>,
) -> io::Result<Option<PathBuf>> {
    let size = fs::metadata(candidate)?.len();
    let Some(same_size) = size_map.get(&size) else {
        return Ok(None);
    };

    let candidate_partial = partial_hash(candidate)?;
    let mut candidate_full = None;

    for existing in same_size.iter() {
        match partial_hash(existing) {
            Ok(hash) if hash == candidate_partial => {}
            Ok(_) => continue,
            Err(e) => {
                tracing::error!("Error processing file '{}': {}", existing.display(), e);
                continue;
            }
        }

        let full = match candidate_full {
            Some(full) => full,
            None => {
                let full = content_hash(candidate)?;
                candidate_full = Some(full);
                full
            }
        };
        match content_hash(existing) {
            Ok(hash) if hash == full => return Ok(Some(existing.clone())),
            Ok(_) => {}
            Err(e) => tracing::error!("Error processing file '{}': {}", existing.display(), e),
        }
    }

    Ok(None)
}

fn partial_hash(file: &Path) -> io::Result<u64> {
    Ok(hash_data(&read_portion(file)?))
}

fn content_hash(file: &Path) -> io::Result<u64> {
    Ok(hash_data(&read_full_file(file)?))
}

fn read_portion(file: &Path) -> io::Result<Vec<u8>> {
    let mut f = File::open(file)?;
    let mut buffer = vec![0; PARTIAL_HASH_LENGTH];
    let mut filled = 0;
    while filled < buffer.len() {
        let n = f.read(&mut buffer[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    buffer.truncate(filled);
    Ok(buffer)
}

fn read_full_file(file: &Path) -> io::Result<Vec<u8>> {
    let mut f = File::open(file)?;
    let mut buffer = Vec::new();
    f.read_to_end(&mut buffer)?;
    Ok(buffer)
}

fn hash_data(data: &[u8]) -> u64 {
    let mut hasher = XxHash64::with_seed(0);
    hasher.write(data);
    hasher.finish()
}
