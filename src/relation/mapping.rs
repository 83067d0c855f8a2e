//! Reader for row mapping files
//!
//! A mapping is either binary (`u32` file id `1`, `u32` element size `4`, `u32` count, followed by
//! `count` little-endian `u32` values) or text (one integer per line).
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::{Error, Result};

/// File id expected in the header of binary mappings
pub const FILE_ID: u32 = 1;
/// Element size expected in the header of binary mappings
pub const ELEMENT_SIZE: u32 = std::mem::size_of::<u32>() as u32;

/// Checks whether the file starts with the header of a binary mapping.
pub fn is_binary(path: &Path) -> Result<bool> {
    let mut file = File::open(path).map_err(|e| Error::io(path, e))?;
    let mut header = [0u8; 8];
    let mut filled = 0;
    while filled < header.len() {
        let n = file
            .read(&mut header[filled..])
            .map_err(|e| Error::io(path, e))?;
        if n == 0 {
            return Ok(false);
        }
        filled += n;
    }
    let file_id = u32::from_le_bytes([header[0], header[1], header[2], header[3]]);
    let element_size = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);
    Ok(file_id == FILE_ID && element_size == ELEMENT_SIZE)
}

/// Reads a mapping, detecting its format.
pub fn read(path: impl AsRef<Path>) -> Result<Vec<u32>> {
    let path = path.as_ref();
    if is_binary(path)? {
        read_binary(path)
    } else {
        read_text(path)
    }
}

/// Reads a binary mapping.
pub fn read_binary(path: &Path) -> Result<Vec<u32>> {
    let bytes = std::fs::read(path).map_err(|e| Error::io(path, e))?;
    let word = |k: usize| -> Option<u32> {
        bytes
            .get(4 * k..4 * k + 4)
            .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    };
    let count = word(2).ok_or_else(|| Error::parse(path, 1, "truncated header"))? as usize;
    if bytes.len() != 12 + 4 * count {
        return Err(Error::DataIntegrity(format!(
            "{}: header announces {count} rows but the file holds {} bytes of data",
            path.display(),
            bytes.len().saturating_sub(12)
        )));
    }
    Ok((0..count).filter_map(|k| word(3 + k)).collect())
}

/// Reads a text mapping.
pub fn read_text(path: &Path) -> Result<Vec<u32>> {
    let content = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    let mut rows = Vec::new();
    for (idx, line) in content.lines().enumerate() {
        for token in line.split_whitespace() {
            let row = token
                .parse::<u32>()
                .map_err(|e| Error::parse(path, idx + 1, format!("invalid row index: {e}")))?;
            rows.push(row);
        }
    }
    Ok(rows)
}

/// Writes a binary mapping.
pub fn write_binary(path: impl AsRef<Path>, rows: &[u32]) -> Result<()> {
    let path = path.as_ref();
    let mut bytes = Vec::with_capacity(12 + 4 * rows.len());
    bytes.extend_from_slice(&FILE_ID.to_le_bytes());
    bytes.extend_from_slice(&ELEMENT_SIZE.to_le_bytes());
    bytes.extend_from_slice(&(rows.len() as u32).to_le_bytes());
    for row in rows {
        bytes.extend_from_slice(&row.to_le_bytes());
    }
    std::fs::write(path, bytes).map_err(|e| Error::io(path, e))
}
