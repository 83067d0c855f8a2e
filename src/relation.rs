//! Relation tables and joins from a primary table into them
//!
//! A relation table holds attributes shared by many rows of the primary table (e.g. all ratings
//! of one user). Each primary row references one relation row; the relation row's attributes then
//! act as if they were part of the primary row, using attribute ids shifted by `attr_offset`.
pub mod mapping;

use std::path::Path;
use std::sync::Arc;

use crate::data::{text, AttributeGroups, SparseMatrix};
use crate::error::{Error, Result};

/// Design matrix of a relation table.
#[derive(Clone, Debug)]
pub struct RelationData {
    /// Rows of the relation table
    pub x: SparseMatrix,
    /// Transpose of `x` (one row per attribute)
    pub xt: SparseMatrix,
    /// Id of the first attribute of this table in the joint attribute space
    pub attr_offset: usize,
    /// Groups of the attributes of this table
    pub groups: Option<AttributeGroups>,
}

impl RelationData {
    /// Creates a [`RelationData`] from its rows.
    pub fn new(x: SparseMatrix, attr_offset: usize) -> Self {
        let xt = x.transpose();
        RelationData {
            x,
            xt,
            attr_offset,
            groups: None,
        }
    }

    /// Loads a relation table stored in the libFM text format (a leading target is ignored).
    /// A file `<path>.groups` is read as attribute groups if present.
    pub fn load(path: impl AsRef<Path>, attr_offset: usize) -> Result<Self> {
        let path = path.as_ref();
        let data = text::read(path)?;
        let mut relation = RelationData::new(data.x, attr_offset);
        let mut groups_path = path.as_os_str().to_owned();
        groups_path.push(".groups");
        let groups_path = Path::new(&groups_path);
        if groups_path.exists() {
            relation.groups = Some(AttributeGroups::load(groups_path)?);
        }
        log::debug!(
            "relation {}: num_cases={} num_values={} num_features={} offset={}",
            path.display(),
            relation.num_cases(),
            relation.x.num_values(),
            relation.num_features(),
            attr_offset
        );
        Ok(relation)
    }

    /// Sets the groups of the attributes of this table.
    pub fn with_groups(mut self, groups: AttributeGroups) -> Self {
        self.groups = Some(groups);
        self
    }

    /// Returns the number of attributes of this table.
    pub fn num_features(&self) -> usize {
        self.x.num_cols()
    }

    /// Returns the number of rows of this table.
    pub fn num_cases(&self) -> usize {
        self.x.num_rows()
    }
}

/// Maps each row of a primary table to a row of a relation table.
#[derive(Clone, Debug)]
pub struct RelationJoin {
    rows: Vec<u32>,
    /// The referenced relation table
    pub data: Arc<RelationData>,
}

impl RelationJoin {
    /// Creates a [`RelationJoin`] after checking that every index is a row of `data`.
    pub fn new(rows: Vec<u32>, data: Arc<RelationData>) -> Result<Self> {
        let num_cases = data.num_cases();
        if let Some(&row) = rows.iter().find(|&&row| row as usize >= num_cases) {
            return Err(Error::DataIntegrity(format!(
                "join references row {row} of a relation with {num_cases} rows"
            )));
        }
        Ok(RelationJoin { rows, data })
    }

    /// Loads the mapping from a binary or text file; its length must be `expected_rows`.
    pub fn load(
        path: impl AsRef<Path>,
        data: Arc<RelationData>,
        expected_rows: usize,
    ) -> Result<Self> {
        let join = RelationJoin::new(mapping::read(path)?, data)?;
        join.check(expected_rows)?;
        Ok(join)
    }

    /// Checks that the mapping covers exactly `expected_rows` rows.
    pub fn check(&self, expected_rows: usize) -> Result<()> {
        if self.rows.len() != expected_rows {
            return Err(Error::DataIntegrity(format!(
                "join has {} rows, expected {expected_rows}",
                self.rows.len()
            )));
        }
        Ok(())
    }

    /// Returns the relation row referenced by primary row `c`.
    pub fn relation_row(&self, c: usize) -> usize {
        self.rows[c] as usize
    }

    /// Returns the number of mapped primary rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Checks whether the mapping is empty.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Counts how many primary rows reference each relation row.
    pub fn counts(&self) -> Vec<usize> {
        let mut counts = vec![0; self.data.num_cases()];
        for &row in self.rows.iter() {
            counts[row as usize] += 1;
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Entry;

    fn relation() -> Arc<RelationData> {
        Arc::new(RelationData::new(
            SparseMatrix::from_rows(&[vec![Entry::new(0, 1.0)], vec![Entry::new(1, 1.0)]]),
            3,
        ))
    }

    #[test]
    fn rejects_out_of_range_rows() {
        assert!(matches!(
            RelationJoin::new(vec![0, 2], relation()),
            Err(Error::DataIntegrity(_))
        ));
    }

    #[test]
    fn counts_references() {
        let join = RelationJoin::new(vec![1, 1, 0, 1], relation()).unwrap();
        assert_eq!(join.counts(), vec![1, 3]);
        assert_eq!(join.relation_row(2), 0);
    }

    #[test]
    fn load_checks_expected_length() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("join");
        mapping::write_binary(&path, &[0, 1, 1]).unwrap();
        assert!(RelationJoin::load(&path, relation(), 3).is_ok());
        assert!(matches!(
            RelationJoin::load(&path, relation(), 4),
            Err(Error::DataIntegrity(_))
        ));
    }

    #[test]
    fn load_reads_groups_next_to_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("user.x");
        std::fs::write(&path, "0:1 1:0.5\n2:1\n").unwrap();
        std::fs::write(dir.path().join("user.x.groups"), "0\n1\n1\n").unwrap();
        let relation = RelationData::load(&path, 10).unwrap();
        assert_eq!(relation.num_cases(), 2);
        assert_eq!(relation.num_features(), 3);
        assert_eq!(relation.groups.unwrap().num_groups(), 2);
    }
}
