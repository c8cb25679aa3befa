use std::collections::{BTreeSet, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// How the level list of a new categorical column is ordered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LevelOrder {
    /// Lexicographically sorted distinct values
    #[default]
    Sorted,
    /// Distinct values in order of first appearance
    FirstSeen,
}

/// Categorical storage: one level code per row plus the ordered level list.
///
/// A missing row has no code. Every present code indexes into `levels`, so
/// reading a row always yields its level string, never the raw index.
#[derive(Debug, Clone, PartialEq)]
pub struct Categorical {
    /// Code (level index) per row
    codes: Vec<Option<u32>>,

    /// Distinct level strings
    levels: Vec<String>,

    /// Level string to code
    level_map: HashMap<String, u32>,
}

impl Categorical {
    /// Build a categorical from string values, collecting the distinct
    /// non-missing values as levels.
    pub fn from_values<S: AsRef<str>>(values: &[Option<S>], order: LevelOrder) -> Self {
        let levels: Vec<String> = match order {
            LevelOrder::Sorted => values
                .iter()
                .flatten()
                .map(|v| v.as_ref().to_string())
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect(),
            LevelOrder::FirstSeen => {
                let mut seen = HashSet::new();
                let mut levels = Vec::new();
                for value in values.iter().flatten() {
                    let value = value.as_ref();
                    if seen.insert(value) {
                        levels.push(value.to_string());
                    }
                }
                levels
            }
        };

        let level_map = Self::build_map(&levels);
        let codes = values
            .iter()
            .map(|v| v.as_ref().and_then(|v| level_map.get(v.as_ref()).copied()))
            .collect();

        Categorical {
            codes,
            levels,
            level_map,
        }
    }

    /// Build a categorical directly from codes and levels
    pub fn from_codes(codes: Vec<Option<u32>>, levels: Vec<String>) -> Result<Self> {
        let level_map = Self::build_map(&levels);
        if level_map.len() != levels.len() {
            return Err(Error::InvalidInput(
                "categorical levels must be distinct".to_string(),
            ));
        }

        if let Some(code) = codes
            .iter()
            .flatten()
            .find(|&&code| code as usize >= levels.len())
        {
            return Err(Error::InvalidInput(format!(
                "level code {} is out of range for {} levels",
                code,
                levels.len()
            )));
        }

        Ok(Categorical {
            codes,
            levels,
            level_map,
        })
    }

    fn build_map(levels: &[String]) -> HashMap<String, u32> {
        levels
            .iter()
            .enumerate()
            .map(|(i, level)| (level.clone(), i as u32))
            .collect()
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// The ordered level list
    pub fn levels(&self) -> &[String] {
        &self.levels
    }

    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    /// Per-row codes
    pub fn codes(&self) -> &[Option<u32>] {
        &self.codes
    }

    /// Position of a level in the level list
    pub fn level_index(&self, level: &str) -> Option<usize> {
        self.level_map.get(level).map(|&code| code as usize)
    }

    /// Level string of a row, `None` when the row is missing or out of range
    pub fn get(&self, row: usize) -> Option<&str> {
        self.codes
            .get(row)
            .copied()
            .flatten()
            .map(|code| self.levels[code as usize].as_str())
    }

    /// Resolve every row to its level string
    pub fn to_strings(&self) -> Vec<Option<String>> {
        self.codes
            .iter()
            .map(|code| code.map(|c| self.levels[c as usize].clone()))
            .collect()
    }

    /// Count of rows per level, in level order (unobserved levels count 0)
    pub fn value_counts(&self) -> Vec<(String, usize)> {
        let mut counts = vec![0usize; self.levels.len()];
        for code in self.codes.iter().flatten() {
            counts[*code as usize] += 1;
        }
        self.levels.iter().cloned().zip(counts).collect()
    }

    /// Replace the level order. The new list must be a permutation of the
    /// current levels; row values are unchanged.
    pub fn reorder_levels(&mut self, new_levels: Vec<String>) -> Result<()> {
        if new_levels.len() != self.levels.len() {
            return Err(Error::InvalidInput(format!(
                "expected {} levels, got {}",
                self.levels.len(),
                new_levels.len()
            )));
        }

        let new_map = Self::build_map(&new_levels);
        if new_map.len() != new_levels.len() {
            return Err(Error::InvalidInput(
                "categorical levels must be distinct".to_string(),
            ));
        }
        if let Some(missing) = self.levels.iter().find(|l| !new_map.contains_key(*l)) {
            return Err(Error::InvalidInput(format!(
                "level '{}' is missing from the new level list",
                missing
            )));
        }

        let remap: Vec<u32> = self.levels.iter().map(|l| new_map[l]).collect();
        for code in self.codes.iter_mut().flatten() {
            *code = remap[*code as usize];
        }
        self.levels = new_levels;
        self.level_map = new_map;
        Ok(())
    }

    /// Move `reference` to the front of the level list
    pub fn relevel(&mut self, reference: &str) -> Result<()> {
        if self.level_index(reference).is_none() {
            return Err(Error::InvalidInput(format!(
                "'{}' is not a level of this column",
                reference
            )));
        }
        let mut new_levels = Vec::with_capacity(self.levels.len());
        new_levels.push(reference.to_string());
        new_levels.extend(self.levels.iter().filter(|l| *l != reference).cloned());
        self.reorder_levels(new_levels)
    }

    /// Rows at the given positions, keeping the full level list
    pub(crate) fn take(&self, rows: &[usize]) -> Categorical {
        Categorical {
            codes: rows.iter().map(|&i| self.codes[i]).collect(),
            levels: self.levels.clone(),
            level_map: self.level_map.clone(),
        }
    }

    /// Append another categorical's rows. Levels unknown to `self` are added
    /// at the end of the level list.
    pub(crate) fn append(&mut self, other: &Categorical) {
        let remap: Vec<u32> = other
            .levels
            .iter()
            .map(|level| match self.level_map.get(level) {
                Some(&code) => code,
                None => {
                    let code = self.levels.len() as u32;
                    self.levels.push(level.clone());
                    self.level_map.insert(level.clone(), code);
                    code
                }
            })
            .collect();

        self.codes
            .extend(other.codes.iter().map(|code| code.map(|c| remap[c as usize])));
    }
}
