//! Partitioning a DataFrame by key columns
//!
//! Groups iterate in first-appearance order of their key. Each group keeps
//! the source positions of its rows, so [`ungroup`] can put every row back
//! where it came from.

use std::fmt;

use indexmap::IndexMap;

use crate::column::ColumnType;
use crate::dataframe::DataFrame;
use crate::error::{Error, Result};

/// Key of one group: one entry per key column, `None` for a missing value
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupKey(pub Vec<Option<String>>);

impl GroupKey {
    /// Key from present values only
    pub fn from_strs(values: &[&str]) -> Self {
        GroupKey(values.iter().map(|v| Some(v.to_string())).collect())
    }

    pub fn values(&self) -> &[Option<String>] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<&str> = self
            .0
            .iter()
            .map(|v| v.as_deref().unwrap_or("NA"))
            .collect();
        f.write_str(&parts.join(", "))
    }
}

/// Rows sharing one key
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    rows: Vec<usize>,
    frame: DataFrame,
}

impl Group {
    /// Source row positions, ascending
    pub fn rows(&self) -> &[usize] {
        &self.rows
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Result of [`group_by`]: every source row in exactly one group
#[derive(Debug, Clone, PartialEq)]
pub struct GroupPartition {
    key_columns: Vec<String>,
    groups: IndexMap<GroupKey, Group>,
    // Zero-row frame with the source schema, returned when there are no groups
    template: DataFrame,
    source_rows: usize,
}

/// Split `df` into groups keyed by the values of `keys`.
///
/// Categorical keys contribute their level string, Numeric keys their
/// display form. Missing key values form their own group.
pub fn group_by(df: &DataFrame, keys: &[&str]) -> Result<GroupPartition> {
    if keys.is_empty() {
        return Err(Error::InvalidInput(
            "group_by needs at least one key column".to_string(),
        ));
    }
    let key_columns = keys
        .iter()
        .map(|name| df.column(name))
        .collect::<Result<Vec<_>>>()?;

    let mut indices: IndexMap<GroupKey, Vec<usize>> = IndexMap::new();
    for row in 0..df.row_count() {
        let key = GroupKey(
            key_columns
                .iter()
                .map(|c| c.data().value(row).and_then(|v| v.render()))
                .collect(),
        );
        indices.entry(key).or_default().push(row);
    }

    let groups: IndexMap<GroupKey, Group> = indices
        .into_iter()
        .map(|(key, rows)| {
            let frame = df.take_unchecked(&rows);
            (key, Group { rows, frame })
        })
        .collect();

    log::debug!(
        "grouped {} rows by [{}] into {} groups",
        df.row_count(),
        keys.join(", "),
        groups.len()
    );

    Ok(GroupPartition {
        key_columns: keys.iter().map(|k| k.to_string()).collect(),
        groups,
        template: df.take_unchecked(&[]),
        source_rows: df.row_count(),
    })
}

/// Reassemble the source table: every row goes back to its original position
pub fn ungroup(partition: &GroupPartition) -> Result<DataFrame> {
    if partition.groups.is_empty() {
        return Ok(partition.template.clone());
    }

    // Position of each source row inside the stacked group frames
    let mut positions: Vec<Option<usize>> = vec![None; partition.source_rows];
    let mut offset = 0;
    for group in partition.groups.values() {
        for (local, &row) in group.rows.iter().enumerate() {
            let slot = positions
                .get_mut(row)
                .filter(|slot| slot.is_none())
                .ok_or_else(|| {
                    Error::InvalidInput(format!(
                        "row {} is claimed by more than one group or is out of range",
                        row
                    ))
                })?;
            *slot = Some(offset + local);
        }
        offset += group.rows.len();
    }
    let order = positions
        .into_iter()
        .enumerate()
        .map(|(row, pos)| {
            pos.ok_or_else(|| Error::InvalidInput(format!("row {} belongs to no group", row)))
        })
        .collect::<Result<Vec<_>>>()?;

    let stacked = partition.concat()?;
    stacked.take_rows(&order)
}

impl GroupPartition {
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn key_columns(&self) -> &[String] {
        &self.key_columns
    }

    /// Row count of the table that was grouped
    pub fn source_row_count(&self) -> usize {
        self.source_rows
    }

    pub fn keys(&self) -> impl Iterator<Item = &GroupKey> {
        self.groups.keys()
    }

    /// Groups with their sub-tables, in partition order
    pub fn iter(&self) -> impl Iterator<Item = (&GroupKey, &DataFrame)> {
        self.groups.iter().map(|(k, g)| (k, &g.frame))
    }

    pub fn groups(&self) -> impl Iterator<Item = (&GroupKey, &Group)> {
        self.groups.iter()
    }

    pub fn get(&self, key: &GroupKey) -> Option<&DataFrame> {
        self.groups.get(key).map(|g| &g.frame)
    }

    /// Look a group up by present key values
    pub fn get_by_str(&self, key: &[&str]) -> Option<&DataFrame> {
        self.get(&GroupKey::from_strs(key))
    }

    pub fn row_indices(&self, key: &GroupKey) -> Option<&[usize]> {
        self.groups.get(key).map(|g| g.rows.as_slice())
    }

    /// Number of rows per group
    pub fn sizes(&self) -> IndexMap<GroupKey, usize> {
        self.groups
            .iter()
            .map(|(k, g)| (k.clone(), g.len()))
            .collect()
    }

    /// Mean of a Numeric column per group, ignoring missing values.
    /// A group with no present value maps to `None`.
    pub fn mean(&self, column: &str) -> Result<IndexMap<GroupKey, Option<f64>>> {
        self.template
            .column(column)?
            .expect_type(&[ColumnType::Numeric], "numeric")?;

        self.groups
            .iter()
            .map(|(key, group)| {
                let values = group.frame.column(column)?.data();
                let present: Vec<f64> = (0..values.len())
                    .filter_map(|row| values.value(row).and_then(|v| v.as_f64()))
                    .collect();
                let mean = if present.is_empty() {
                    None
                } else {
                    Some(present.iter().sum::<f64>() / present.len() as f64)
                };
                Ok((key.clone(), mean))
            })
            .collect()
    }

    /// Group sub-tables stacked in partition order
    pub fn concat(&self) -> Result<DataFrame> {
        if self.groups.is_empty() {
            return Ok(self.template.clone());
        }
        let frames: Vec<DataFrame> = self.groups.values().map(|g| g.frame.clone()).collect();
        DataFrame::concat(&frames)
    }
}

impl DataFrame {
    /// Shorthand for [`group_by`]
    pub fn group_by(&self, keys: &[&str]) -> Result<GroupPartition> {
        group_by(self, keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::{Column, Value};

    fn sample() -> DataFrame {
        DataFrame::from_columns(vec![
            Column::numeric("x", vec![1.0, 2.0, 3.0, 4.0]),
            Column::text_opt(
                "y",
                vec![Some("b".into()), Some("a".into()), None, Some("b".into())],
            ),
        ])
        .unwrap()
    }

    #[test]
    fn test_first_appearance_order() {
        let parts = group_by(&sample(), &["y"]).unwrap();
        let keys: Vec<String> = parts.keys().map(|k| k.to_string()).collect();
        assert_eq!(keys, vec!["b", "a", "NA"]);
        assert_eq!(parts.row_indices(&GroupKey::from_strs(&["b"])).unwrap(), &[0, 3]);
    }

    #[test]
    fn test_missing_key_is_own_group() {
        let parts = group_by(&sample(), &["y"]).unwrap();
        let missing = parts.get(&GroupKey(vec![None])).unwrap();
        assert_eq!(missing.value(0, "x").unwrap(), Value::Numeric(3.0));
    }

    #[test]
    fn test_ungroup_restores_order() {
        let df = sample();
        let parts = group_by(&df, &["y"]).unwrap();
        assert_eq!(ungroup(&parts).unwrap(), df);
        assert_eq!(parts.concat().unwrap().row_count(), 4);
    }

    #[test]
    fn test_mean_and_sizes() {
        let parts = group_by(&sample(), &["y"]).unwrap();
        let means = parts.mean("x").unwrap();
        assert_eq!(means[&GroupKey::from_strs(&["b"])], Some(2.5));
        assert_eq!(parts.sizes()[&GroupKey::from_strs(&["a"])], 1);
        assert!(matches!(parts.mean("y"), Err(Error::ColumnTypeMismatch { .. })));
    }

    #[test]
    fn test_bad_keys() {
        assert!(matches!(group_by(&sample(), &[]), Err(Error::InvalidInput(_))));
        assert!(matches!(group_by(&sample(), &["z"]), Err(Error::UnknownColumn(_))));
    }

    #[test]
    fn test_empty_frame() {
        let df = sample().head(0);
        let parts = df.group_by(&["y"]).unwrap();
        assert!(parts.is_empty());
        assert_eq!(ungroup(&parts).unwrap(), df);
    }
}
