//! On-disk artifacts produced between offline pipeline stages.
//!
//! The chunking stage writes a JSON array of chunks; the embedding
//! stage writes a binary matrix whose rows are aligned 1:1, in order,
//! with that array. The loader treats row-order alignment between the
//! two files as a hard precondition and refuses mismatched inputs.
//!
//! Matrix layout: magic `GEM1`, `rows: u32 LE`, `dims: u32 LE`, then
//! `rows * dims` f32 values, little-endian, row-major.

use std::fs;
use std::path::Path;

use crate::corpus::CommentaryRecord;
use crate::document::Chunk;
use crate::error::{GitaError, Result};

const MATRIX_MAGIC: &[u8; 4] = b"GEM1";

fn artifact_error(message: impl Into<String>) -> GitaError {
    GitaError::Ingestion { stage: "artifacts".to_string(), message: message.into() }
}

/// Write normalized commentary records as a pretty-printed JSON array.
pub fn write_records(path: &Path, records: &[CommentaryRecord]) -> Result<()> {
    let json = serde_json::to_vec_pretty(records)
        .map_err(|e| artifact_error(format!("cannot serialize records: {e}")))?;
    fs::write(path, json)
        .map_err(|e| artifact_error(format!("cannot write '{}': {e}", path.display())))
}

/// Read commentary records written by [`write_records`].
pub fn read_records(path: &Path) -> Result<Vec<CommentaryRecord>> {
    let bytes = fs::read(path)
        .map_err(|e| artifact_error(format!("cannot read '{}': {e}", path.display())))?;
    serde_json::from_slice(&bytes)
        .map_err(|e| artifact_error(format!("cannot parse '{}': {e}", path.display())))
}

/// Write the chunk sequence as a pretty-printed JSON array.
///
/// Embeddings are not serialized (the `Chunk` serializer skips empty
/// embedding vectors, and chunks at this stage have none).
pub fn write_chunks(path: &Path, chunks: &[Chunk]) -> Result<()> {
    let json = serde_json::to_vec_pretty(chunks)
        .map_err(|e| artifact_error(format!("cannot serialize chunks: {e}")))?;
    fs::write(path, json)
        .map_err(|e| artifact_error(format!("cannot write '{}': {e}", path.display())))
}

/// Read a chunk sequence written by [`write_chunks`].
pub fn read_chunks(path: &Path) -> Result<Vec<Chunk>> {
    let bytes = fs::read(path)
        .map_err(|e| artifact_error(format!("cannot read '{}': {e}", path.display())))?;
    serde_json::from_slice(&bytes)
        .map_err(|e| artifact_error(format!("cannot parse '{}': {e}", path.display())))
}

/// Write an embedding matrix. All rows must have the same dimensionality.
pub fn write_matrix(path: &Path, rows: &[Vec<f32>]) -> Result<()> {
    let dims = rows.first().map(Vec::len).unwrap_or(0);
    if rows.iter().any(|row| row.len() != dims) {
        return Err(artifact_error("embedding rows have inconsistent dimensionality"));
    }

    let mut bytes = Vec::with_capacity(12 + rows.len() * dims * 4);
    bytes.extend_from_slice(MATRIX_MAGIC);
    bytes.extend_from_slice(&(rows.len() as u32).to_le_bytes());
    bytes.extend_from_slice(&(dims as u32).to_le_bytes());
    for row in rows {
        for value in row {
            bytes.extend_from_slice(&value.to_le_bytes());
        }
    }

    fs::write(path, bytes)
        .map_err(|e| artifact_error(format!("cannot write '{}': {e}", path.display())))
}

/// Read an embedding matrix written by [`write_matrix`].
pub fn read_matrix(path: &Path) -> Result<Vec<Vec<f32>>> {
    let bytes = fs::read(path)
        .map_err(|e| artifact_error(format!("cannot read '{}': {e}", path.display())))?;

    if bytes.len() < 12 || &bytes[..4] != MATRIX_MAGIC {
        return Err(artifact_error(format!(
            "'{}' is not an embedding matrix artifact",
            path.display()
        )));
    }

    let rows = u32::from_le_bytes(bytes[4..8].try_into().expect("4-byte slice")) as usize;
    let dims = u32::from_le_bytes(bytes[8..12].try_into().expect("4-byte slice")) as usize;
    let expected = 12 + rows * dims * 4;
    if bytes.len() != expected {
        return Err(artifact_error(format!(
            "'{}' is truncated: expected {expected} bytes, found {}",
            path.display(),
            bytes.len()
        )));
    }

    let mut values = bytes[12..]
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes(b.try_into().expect("4-byte slice")));
    let matrix = (0..rows).map(|_| values.by_ref().take(dims).collect()).collect();
    Ok(matrix)
}

/// Read both artifacts, enforcing the row-order alignment precondition.
///
/// # Errors
///
/// Returns [`GitaError::Ingestion`] naming both counts if the matrix
/// row count does not match the chunk count.
pub fn read_aligned(chunks_path: &Path, matrix_path: &Path) -> Result<(Vec<Chunk>, Vec<Vec<f32>>)> {
    let chunks = read_chunks(chunks_path)?;
    let matrix = read_matrix(matrix_path)?;
    if chunks.len() != matrix.len() {
        return Err(artifact_error(format!(
            "chunk/matrix row mismatch: {} chunks in '{}' but {} rows in '{}'",
            chunks.len(),
            chunks_path.display(),
            matrix.len(),
            matrix_path.display()
        )));
    }
    Ok((chunks, matrix))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::CommentaryType;
    use crate::document::ChunkMetadata;

    fn chunk(i: usize) -> Chunk {
        Chunk {
            id: format!("c{i}"),
            text: format!("commentary text {i}"),
            embedding: Vec::new(),
            metadata: ChunkMetadata {
                author: "Swami Sivananda".to_string(),
                chapter: 2,
                verse: 47,
                shloka_id: "BG2.47".to_string(),
                commentary_type: CommentaryType::EnglishTranslation,
                shloka_sanskrit: "कर्मण्येवाधिकारस्ते".to_string(),
                chunk_index: i,
            },
        }
    }

    #[test]
    fn chunks_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chunks.json");
        let chunks = vec![chunk(0), chunk(1)];

        write_chunks(&path, &chunks).unwrap();
        assert_eq!(read_chunks(&path).unwrap(), chunks);
    }

    #[test]
    fn matrix_round_trips_exactly() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("embeddings.bin");
        let rows = vec![vec![0.25f32, -1.5, 3.0], vec![0.0, 7.5, -0.125]];

        write_matrix(&path, &rows).unwrap();
        assert_eq!(read_matrix(&path).unwrap(), rows);
    }

    #[test]
    fn rejects_inconsistent_row_dimensions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("embeddings.bin");
        let err = write_matrix(&path, &[vec![1.0], vec![1.0, 2.0]]).unwrap_err();
        assert!(matches!(err, GitaError::Ingestion { .. }));
    }

    #[test]
    fn aligned_read_rejects_row_count_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let chunks_path = dir.path().join("chunks.json");
        let matrix_path = dir.path().join("embeddings.bin");

        write_chunks(&chunks_path, &[chunk(0), chunk(1)]).unwrap();
        write_matrix(&matrix_path, &[vec![1.0, 0.0]]).unwrap();

        let err = read_aligned(&chunks_path, &matrix_path).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("2 chunks"));
        assert!(message.contains("1 rows"));
    }

    #[test]
    fn rejects_foreign_binary_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("not-a-matrix.bin");
        std::fs::write(&path, b"something else entirely").unwrap();
        assert!(read_matrix(&path).is_err());
    }
}
