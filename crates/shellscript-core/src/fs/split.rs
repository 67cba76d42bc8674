//! Splitting a file into numbered chunks and joining them back.
//!
//! Chunks live next to the source and are named by appending a three digit
//! counter to the full file name: `disk.img` becomes `disk.img.001`,
//! `disk.img.002`, ... Every chunk except the last is exactly `chunk_size`
//! bytes.

use crate::config::FileConfig;
use crate::error::{Result, ShellError};
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const FIRST_SUFFIX: &str = ".001";

fn chunk_path(source: &Path, index: usize) -> PathBuf {
    let mut name = source.file_name().unwrap_or_default().to_os_string();
    name.push(format!(".{:0width$}", index, width = FileConfig::CHUNK_SUFFIX_DIGITS));
    source.with_file_name(name)
}

/// Split `path` into chunks of `chunk_size` bytes.
///
/// An empty source produces a single empty chunk. On failure the chunks
/// written so far are deleted when `remove_on_failure` is set.
pub fn split_file(
    path: impl AsRef<Path>,
    chunk_size: u64,
    remove_on_failure: bool,
) -> Result<Vec<PathBuf>> {
    let path = path.as_ref();
    if chunk_size == 0 {
        return Err(ShellError::invalid("chunk_size", "must be greater than zero"));
    }

    let mut created = Vec::new();
    match write_chunks(path, chunk_size, &mut created) {
        Ok(()) => {
            debug!("Split {} into {} chunks", path.display(), created.len());
            Ok(created)
        }
        Err(e) => {
            if remove_on_failure {
                for chunk in &created {
                    if let Err(rm_err) = fs::remove_file(chunk) {
                        warn!("Failed to remove chunk {}: {}", chunk.display(), rm_err);
                    }
                }
            }
            Err(e)
        }
    }
}

fn write_chunks(path: &Path, chunk_size: u64, created: &mut Vec<PathBuf>) -> Result<()> {
    let file = File::open(path).map_err(|e| ShellError::io_with_path(e, path))?;
    let total = file
        .metadata()
        .map_err(|e| ShellError::io_with_path(e, path))?
        .len();
    let count = total.div_ceil(chunk_size).max(1);
    let mut reader = BufReader::with_capacity(FileConfig::SPLIT_BLOCK_SIZE, file);

    for index in 1..=count {
        let chunk = chunk_path(path, index as usize);
        let out = File::create(&chunk).map_err(|e| ShellError::io_with_path(e, &chunk))?;
        created.push(chunk.clone());

        let mut writer = BufWriter::with_capacity(FileConfig::SPLIT_BLOCK_SIZE, out);
        io::copy(&mut (&mut reader).take(chunk_size), &mut writer)
            .map_err(|e| ShellError::io_with_path(e, &chunk))?;
        writer
            .flush()
            .map_err(|e| ShellError::io_with_path(e, &chunk))?;
    }
    Ok(())
}

/// Concatenate `chunks` in the given order into `output`. Returns the bytes written.
pub fn combine_files<I, P>(output: impl AsRef<Path>, chunks: I) -> Result<u64>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    let output = output.as_ref();
    let out = File::create(output).map_err(|e| ShellError::io_with_path(e, output))?;
    let mut writer = BufWriter::with_capacity(FileConfig::SPLIT_BLOCK_SIZE, out);

    let mut written = 0u64;
    for chunk in chunks {
        let chunk = chunk.as_ref();
        let mut reader = File::open(chunk).map_err(|e| ShellError::io_with_path(e, chunk))?;
        written += io::copy(&mut reader, &mut writer)
            .map_err(|e| ShellError::io_with_path(e, output))?;
    }
    writer
        .flush()
        .map_err(|e| ShellError::io_with_path(e, output))?;
    debug!("Combined {} bytes into {}", written, output.display());
    Ok(written)
}

/// Given the first chunk (`name.001`), list the whole chunk set in order.
///
/// Returns an empty list when the name does not end in `.001`, numbering has
/// a gap, a middle chunk differs in size from the first, or the last chunk
/// is larger than the first.
pub fn split_chunks(first_chunk: impl AsRef<Path>) -> Vec<PathBuf> {
    let first_chunk = first_chunk.as_ref();
    let Some(name) = first_chunk.file_name().and_then(|n| n.to_str()) else {
        return Vec::new();
    };
    let Some(base) = name.strip_suffix(FIRST_SUFFIX) else {
        return Vec::new();
    };
    let Ok(first_size) = fs::metadata(first_chunk).map(|m| m.len()) else {
        return Vec::new();
    };

    let dir = match first_chunk.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let Ok(entries) = fs::read_dir(&dir) else {
        return Vec::new();
    };

    let prefix = format!("{}.", base);
    let mut numbered: Vec<(usize, PathBuf)> = entries
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| {
            let file_name = entry.file_name();
            let suffix = file_name.to_str()?.strip_prefix(&prefix)?;
            if suffix.len() != FileConfig::CHUNK_SUFFIX_DIGITS
                || !suffix.chars().all(|c| c.is_ascii_digit())
            {
                return None;
            }
            Some((suffix.parse().ok()?, first_chunk.with_file_name(&file_name)))
        })
        .collect();
    numbered.sort_by_key(|(n, _)| *n);

    if numbered.iter().enumerate().any(|(i, (n, _))| *n != i + 1) {
        debug!("Chunk numbering of {} has a gap", first_chunk.display());
        return Vec::new();
    }

    let last = numbered.len().saturating_sub(1);
    for (i, (_, path)) in numbered.iter().enumerate() {
        let Ok(size) = fs::metadata(path).map(|m| m.len()) else {
            return Vec::new();
        };
        let consistent = if i == last {
            size <= first_size
        } else {
            size == first_size
        };
        if !consistent {
            debug!("Chunk {} has unexpected size {}", path.display(), size);
            return Vec::new();
        }
    }

    numbered.into_iter().map(|(_, path)| path).collect()
}
