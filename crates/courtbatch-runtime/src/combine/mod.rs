//! Result combining.
//!
//! Merges the per-chunk artifacts of one run into a single artifact per kind,
//! written one level above the chunk directory. Chunk files are only read.

mod merge;

use courtbatch_core::Flavor;
use courtbatch_core::dataset::{decode_rows, encode_rows};
use courtbatch_core::job::{ArtifactKind, join_path, parent_path};
use courtbatch_opendal::StorageBackend;
use serde::Serialize;
use serde_json::Value;

pub use merge::{concat, normalize_results};

use crate::{Result, RuntimeError, TRACING_TARGET_COMBINE};

/// One combined artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CombinedArtifact {
    pub kind: ArtifactKind,
    /// Path of the combined file, relative to the backend root.
    pub path: String,
    /// Number of chunk files merged.
    pub chunks: usize,
    /// Number of records (results) or rows (echoed input) written.
    pub records: usize,
}

enum Merged {
    Results(Vec<Value>),
    Rows(Vec<Vec<String>>),
}

impl Merged {
    fn len(&self) -> usize {
        match self {
            Self::Results(records) => records.len(),
            Self::Rows(rows) => rows.len(),
        }
    }

    fn encode(&self) -> Result<Vec<u8>> {
        Ok(match self {
            Self::Results(records) => {
                serde_json::to_vec(records).map_err(courtbatch_core::Error::from)?
            }
            Self::Rows(rows) => encode_rows(rows)?,
        })
    }
}

/// Combines every chunk artifact under `chunks_dir` on `backend`.
///
/// Chunk files are ordered by the `pid` in their name. Results chunks may be
/// a list or a keyed mapping (see [`normalize_results`]); echoed-input chunks
/// are headerless CSV. Every chunk of every kind is parsed before anything is
/// written, so a malformed chunk leaves no combined file behind. Existing
/// combined files are overwritten.
pub async fn combine(
    backend: &StorageBackend,
    flavor: Flavor,
    chunks_dir: &str,
) -> Result<Vec<CombinedArtifact>> {
    let chunks_dir = chunks_dir.trim_end_matches('/');
    if !backend.dir_exists(chunks_dir).await? {
        return Err(RuntimeError::MissingOutputDirectory(chunks_dir.to_owned()));
    }

    let files = backend.list(chunks_dir).await?;
    let mut merged = Vec::with_capacity(ArtifactKind::ALL.len());

    for kind in ArtifactKind::ALL {
        let chunk_files = chunk_files(&files, kind, flavor);
        if chunk_files.is_empty() {
            return Err(RuntimeError::NoChunkFilesFound {
                dir: chunks_dir.to_owned(),
                pattern: format!("{}_<pid>{}", kind.stem(flavor), kind.extension()),
            });
        }

        tracing::info!(
            target: TRACING_TARGET_COMBINE,
            kind = %kind,
            flavor = %flavor,
            count = chunk_files.len(),
            "Combining chunk files"
        );

        let contents = read_chunks(backend, &chunk_files).await?;
        let chunk_count = chunk_files.len();
        let merged_kind = match kind {
            ArtifactKind::Results => Merged::Results(merge_results(&chunk_files, contents)?),
            ArtifactKind::EchoedInput => Merged::Rows(merge_rows(&chunk_files, contents)?),
        };
        merged.push((kind, chunk_count, merged_kind));
    }

    let output_dir = parent_path(chunks_dir);
    let mut artifacts = Vec::with_capacity(merged.len());
    for (kind, chunks, content) in merged {
        let path = join_path(output_dir, &kind.combined_file_name(flavor));
        backend.write(&path, &content.encode()?).await?;

        tracing::info!(
            target: TRACING_TARGET_COMBINE,
            kind = %kind,
            records = content.len(),
            path = %path,
            "Saved combined output"
        );

        artifacts.push(CombinedArtifact {
            kind,
            path,
            chunks,
            records: content.len(),
        });
    }

    Ok(artifacts)
}

/// Reads every chunk file. A listed file that cannot be read is malformed.
async fn read_chunks(backend: &StorageBackend, paths: &[String]) -> Result<Vec<Vec<u8>>> {
    let mut contents = Vec::with_capacity(paths.len());
    for path in paths {
        let bytes = backend.read(path).await.map_err(|e| {
            RuntimeError::malformed_chunk_with_source(path.clone(), "unreadable", e)
        })?;
        contents.push(bytes);
    }
    Ok(contents)
}

/// Chunk files of `kind` among `files`, sorted by pid.
fn chunk_files(files: &[String], kind: ArtifactKind, flavor: Flavor) -> Vec<String> {
    let mut matching: Vec<(usize, &String)> = files
        .iter()
        .filter_map(|path| {
            let name = path.rsplit('/').next().unwrap_or(path);
            kind.parse_chunk_pid(flavor, name).map(|pid| (pid, path))
        })
        .collect();
    matching.sort_by_key(|(pid, _)| *pid);
    matching.into_iter().map(|(_, path)| path.clone()).collect()
}

fn merge_results(paths: &[String], contents: Vec<Vec<u8>>) -> Result<Vec<Value>> {
    let mut chunks = Vec::with_capacity(contents.len());
    for (path, bytes) in paths.iter().zip(contents) {
        let value: Value = serde_json::from_slice(&bytes).map_err(|e| {
            RuntimeError::malformed_chunk_with_source(path.clone(), "invalid JSON", e)
        })?;
        let records = normalize_results(value).ok_or_else(|| {
            RuntimeError::malformed_chunk(path.clone(), "expected a list or a keyed mapping")
        })?;
        chunks.push(records);
    }
    Ok(concat(chunks))
}

fn merge_rows(paths: &[String], contents: Vec<Vec<u8>>) -> Result<Vec<Vec<String>>> {
    let mut chunks = Vec::with_capacity(contents.len());
    for (path, bytes) in paths.iter().zip(contents) {
        let rows = decode_rows(&bytes).map_err(|e| {
            RuntimeError::malformed_chunk_with_source(path.clone(), "invalid CSV", e)
        })?;
        chunks.push(rows);
    }
    Ok(concat(chunks))
}
