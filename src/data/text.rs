//! Reader for the libFM / libSVM text format
//!
//! Every line holds one case: an optional target followed by `id:value` pairs.
use std::path::Path;

use super::sparse::{Entry, SparseMatrix};
use crate::error::{Error, Result};

/// Rows and targets read from a text file.
#[derive(Debug)]
pub struct TextData {
    /// Design matrix
    pub x: SparseMatrix,
    /// Targets (`NaN` where a line carries no target)
    pub target: Vec<f64>,
}

/// Reads a libFM text file from disk.
pub fn read(path: impl AsRef<Path>) -> Result<TextData> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    parse(&content, path)
}

/// Parses the content of a libFM text file. `path` is only used for error messages.
pub fn parse(content: &str, path: &Path) -> Result<TextData> {
    let mut x = SparseMatrix::new(0);
    let mut target = Vec::new();
    let mut row = Vec::new();
    for (idx, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        row.clear();
        let mut y = f64::NAN;
        for (k, token) in line.split_whitespace().enumerate() {
            match token.split_once(':') {
                Some((id, value)) => {
                    let id = id.parse::<usize>().map_err(|e| {
                        Error::parse(path, idx + 1, format!("invalid feature id {id:?}: {e}"))
                    })?;
                    let value = value.parse::<f64>().map_err(|e| {
                        Error::parse(path, idx + 1, format!("invalid value {value:?}: {e}"))
                    })?;
                    row.push(Entry::new(id, value));
                }
                None if k == 0 => {
                    y = token.parse::<f64>().map_err(|e| {
                        Error::parse(path, idx + 1, format!("invalid target {token:?}: {e}"))
                    })?;
                }
                None => {
                    return Err(Error::parse(
                        path,
                        idx + 1,
                        format!("expected id:value, got {token:?}"),
                    ))
                }
            }
        }
        x.push_row(&row);
        target.push(y);
    }
    Ok(TextData { x, target })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_targets_and_pairs() {
        let data = parse("1.5 0:1 3:0.5\n-1 2:2\n\n", Path::new("mem")).unwrap();
        assert_eq!(data.x.num_rows(), 2);
        assert_eq!(data.x.num_cols(), 4);
        assert_eq!(data.target, vec![1.5, -1.0]);
        assert_eq!(data.x.row(0), &[Entry::new(0, 1.0), Entry::new(3, 0.5)]);
    }

    #[test]
    fn target_is_optional() {
        let data = parse("0:1 1:1\n2:1\n", Path::new("mem")).unwrap();
        assert_eq!(data.x.num_rows(), 2);
        assert!(data.target.iter().all(|t| t.is_nan()));
    }

    #[test]
    fn reports_line_of_malformed_pair() {
        let err = parse("1 0:1\n1 x:2\n", Path::new("train.libfm")).unwrap_err();
        match err {
            Error::Parse { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error: {other}"),
        }
    }
}
