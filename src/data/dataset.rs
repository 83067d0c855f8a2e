//! Training and test datasets
use std::cell::OnceCell;
use std::path::Path;

use super::groups::AttributeGroups;
use super::sparse::{Entry, SparseMatrix};
use super::text;
use crate::error::{Error, Result};
use crate::relation::RelationJoin;

/// A design matrix with one target per row and optional joins into relation tables.
#[derive(Clone, Debug)]
pub struct Dataset {
    /// Rows of the primary table
    pub x: SparseMatrix,
    /// Target of every row
    pub target: Vec<f64>,
    /// Joins into relation tables (one mapping entry per row)
    pub relations: Vec<RelationJoin>,
    /// Groups of the primary table's attributes
    pub groups: Option<AttributeGroups>,
    xt: OnceCell<SparseMatrix>,
}

impl Dataset {
    /// Creates a [`Dataset`] from a design matrix and its targets.
    pub fn new(x: SparseMatrix, target: Vec<f64>) -> Result<Self> {
        if x.num_rows() != target.len() {
            return Err(Error::DataIntegrity(format!(
                "{} rows but {} targets",
                x.num_rows(),
                target.len()
            )));
        }
        Ok(Dataset {
            x,
            target,
            relations: Vec::new(),
            groups: None,
            xt: OnceCell::new(),
        })
    }

    /// Loads a dataset stored in the libFM text format.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = text::read(path)?;
        if let Some(line) = data.target.iter().position(|t| t.is_nan()) {
            return Err(Error::parse(path, line + 1, "missing target"));
        }
        Dataset::new(data.x, data.target)
    }

    /// Adds a join into a relation table.
    pub fn with_relation(mut self, join: RelationJoin) -> Result<Self> {
        join.check(self.num_cases())?;
        self.relations.push(join);
        Ok(self)
    }

    /// Sets the groups of the primary table's attributes.
    pub fn with_groups(mut self, groups: AttributeGroups) -> Self {
        self.groups = Some(groups);
        self
    }

    /// Raises the column count of the primary table to `num_cols`.
    pub fn with_num_cols(mut self, num_cols: usize) -> Self {
        self.x = self.x.with_num_cols(num_cols);
        self.xt = OnceCell::new();
        self
    }

    /// Maps the targets to `{-1, +1}` (positive values become `+1`).
    pub fn binarize_targets(mut self) -> Self {
        for t in self.target.iter_mut() {
            *t = if *t > 0.0 { 1.0 } else { -1.0 };
        }
        self
    }

    /// Returns the number of cases (rows).
    pub fn num_cases(&self) -> usize {
        self.target.len()
    }

    /// Returns the transposed primary table, built on first use.
    pub fn transposed(&self) -> &SparseMatrix {
        self.xt.get_or_init(|| self.x.transpose())
    }

    /// Returns the smallest and largest target.
    pub fn target_bounds(&self) -> (f64, f64) {
        self.target
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &t| {
                (lo.min(t), hi.max(t))
            })
    }

    /// Returns the number of attributes spanned by the primary table and all relation tables.
    pub fn num_attributes(&self) -> usize {
        self.relations
            .iter()
            .map(|join| join.data.attr_offset + join.data.num_features())
            .fold(self.x.num_cols(), usize::max)
    }

    /// Checks that all attribute ids (after applying relation offsets) are below `num_attribute`
    /// and that the primary table and the relation tables use disjoint attribute ranges.
    pub fn validate(&self, num_attribute: usize) -> Result<()> {
        if let Some(id) = self.x.max_id() {
            if id >= num_attribute {
                return Err(Error::DataIntegrity(format!(
                    "feature id {id} exceeds the number of attributes {num_attribute}"
                )));
            }
        }
        for join in self.relations.iter() {
            join.check(self.num_cases())?;
            let end = join.data.attr_offset + join.data.num_features();
            if end > num_attribute {
                return Err(Error::DataIntegrity(format!(
                    "relation attributes {}..{end} exceed the number of attributes {num_attribute}",
                    join.data.attr_offset
                )));
            }
        }
        self.check_disjoint()
    }

    fn check_disjoint(&self) -> Result<()> {
        let mut ranges: Vec<(usize, usize)> = self
            .relations
            .iter()
            .map(|join| {
                let offset = join.data.attr_offset;
                (offset, offset + join.data.num_features())
            })
            .filter(|&(start, end)| start < end)
            .collect();
        let primary = self.x.num_cols();
        if let Some(&(start, end)) = ranges.iter().find(|&&(start, _)| start < primary) {
            return Err(Error::DataIntegrity(format!(
                "relation attributes {start}..{end} overlap the primary attributes 0..{primary}"
            )));
        }
        ranges.sort_unstable();
        for pair in ranges.windows(2) {
            let ((a_start, a_end), (b_start, b_end)) = (pair[0], pair[1]);
            if b_start < a_end {
                return Err(Error::DataIntegrity(format!(
                    "relation attributes {a_start}..{a_end} and {b_start}..{b_end} overlap"
                )));
            }
        }
        Ok(())
    }

    /// Writes the joint row of case `c` (own attributes followed by the attributes of all joined
    /// relation rows, shifted by their offsets) into `buf`.
    pub fn expand_row(&self, c: usize, buf: &mut Vec<Entry>) {
        buf.clear();
        buf.extend_from_slice(self.x.row(c));
        for join in self.relations.iter() {
            let offset = join.data.attr_offset;
            buf.extend(
                join.data
                    .x
                    .row(join.relation_row(c))
                    .iter()
                    .map(|e| Entry::new(offset + e.id, e.value)),
            );
        }
    }
}
