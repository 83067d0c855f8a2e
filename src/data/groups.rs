//! Assignment of attributes to groups sharing hyperpriors
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Maps every attribute to a group.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AttributeGroups {
    group: Vec<usize>,
    counts: Vec<usize>,
}

impl AttributeGroups {
    /// Puts all `num_attributes` attributes into one group.
    pub fn single(num_attributes: usize) -> Self {
        AttributeGroups {
            group: vec![0; num_attributes],
            counts: vec![num_attributes],
        }
    }

    /// Builds the groups from an explicit assignment (group ids need not be contiguous).
    pub fn from_assignment(group: Vec<usize>) -> Self {
        let num_groups = group.iter().map(|&g| g + 1).max().unwrap_or(1);
        let mut counts = vec![0; num_groups];
        for &g in group.iter() {
            counts[g] += 1;
        }
        AttributeGroups { group, counts }
    }

    /// Reads one group id per attribute from a text file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let mut group = Vec::new();
        for (idx, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let g = line
                .parse::<usize>()
                .map_err(|e| Error::parse(path, idx + 1, format!("invalid group id: {e}")))?;
            group.push(g);
        }
        Ok(Self::from_assignment(group))
    }

    /// Returns the group of attribute `i`.
    pub fn group(&self, i: usize) -> usize {
        self.group[i]
    }

    /// Returns the number of groups.
    pub fn num_groups(&self) -> usize {
        self.counts.len()
    }

    /// Returns the number of attributes.
    pub fn num_attributes(&self) -> usize {
        self.group.len()
    }

    /// Returns the number of attributes in group `g`.
    pub fn count(&self, g: usize) -> usize {
        self.counts[g]
    }

    /// Resizes to `num_attributes`, putting new attributes into group `g`.
    pub(crate) fn resize(&mut self, num_attributes: usize, g: usize) {
        while self.group.len() > num_attributes {
            if let Some(last) = self.group.pop() {
                self.counts[last] -= 1;
            }
        }
        if self.group.len() < num_attributes {
            if g >= self.counts.len() {
                self.counts.resize(g + 1, 0);
            }
            self.counts[g] += num_attributes - self.group.len();
            self.group.resize(num_attributes, g);
        }
    }

    /// Assigns attributes `offset..offset + other.num_attributes()` to the groups of `other`,
    /// shifted behind the groups already present.
    pub(crate) fn append_at(&mut self, offset: usize, other: &AttributeGroups) {
        let end = offset + other.num_attributes();
        if self.group.len() < end {
            self.resize(end, 0);
        }
        let base = self.num_groups();
        self.counts.resize(base + other.num_groups(), 0);
        for (i, &g) in other.group.iter().enumerate() {
            let old = self.group[offset + i];
            self.counts[old] -= 1;
            self.group[offset + i] = base + g;
            self.counts[base + g] += 1;
        }
    }
}
