use crate::error::{FrameError, FrameResult};
use crate::scalar::Scalar;

/// A row-major, dynamically-typed table.
///
/// Spec §9's design notes call a full Arrow/DataFusion stack out of scope for
/// this crate family and sanction a hand-rolled `Frame`/`Column` in its
/// place; this is that type. It plays the role
/// `examples/original_source/quarry/integrated_result.py` gives a pandas
/// `DataFrame`: the static store's result set, each time-series store's
/// result set, and every intermediate join/filter step along the way are all
/// `Frame`s.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frame {
    columns: Vec<String>,
    rows: Vec<Vec<Scalar>>,
}

impl Frame {
    #[must_use]
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    #[must_use]
    pub fn from_rows(columns: Vec<String>, rows: Vec<Vec<Scalar>>) -> Self {
        for row in &rows {
            assert_eq!(
                row.len(),
                columns.len(),
                "row width does not match column count"
            );
        }
        Self { columns, rows }
    }

    pub fn push_row(&mut self, row: Vec<Scalar>) {
        assert_eq!(
            row.len(),
            self.columns.len(),
            "row width does not match column count"
        );
        self.rows.push(row);
    }

    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    #[must_use]
    pub fn rows(&self) -> &[Vec<Scalar>] {
        &self.rows
    }

    #[must_use]
    pub fn nrows(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn ncols(&self) -> usize {
        self.columns.len()
    }

    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    fn require_column(&self, name: &str) -> FrameResult<usize> {
        self.column_index(name)
            .ok_or_else(|| FrameError::UnknownColumn(name.to_owned()))
    }

    /// Projects down to exactly `names`, in the given order (spec §4.7's
    /// final `SELECT`-projection step, `generate_select_result`'s `df[cols]`).
    pub fn select(&self, names: &[&str]) -> FrameResult<Frame> {
        let indices: Vec<usize> = names
            .iter()
            .map(|name| self.require_column(name))
            .collect::<FrameResult<_>>()?;
        let columns = names.iter().map(|n| (*n).to_owned()).collect();
        let rows = self
            .rows
            .iter()
            .map(|row| indices.iter().map(|&i| row[i].clone()).collect())
            .collect();
        Ok(Frame { columns, rows })
    }

    /// Returns a copy of `self` with an additional `Int` column named `name`
    /// holding `0..nrows()`, used as the synthetic join key for `LeftJoin`
    /// (`integrated_result.py`'s `my_special_join_col`).
    #[must_use]
    pub fn with_row_id(&self, name: &str) -> Frame {
        let mut columns = self.columns.clone();
        columns.push(name.to_owned());
        let rows = self
            .rows
            .iter()
            .enumerate()
            .map(|(i, row)| {
                let mut row = row.clone();
                row.push(Scalar::Int(i as i64));
                row
            })
            .collect();
        Frame { columns, rows }
    }

    /// Drops the given columns if present; missing names are ignored.
    #[must_use]
    pub fn drop_columns(&self, names: &[&str]) -> Frame {
        let keep: Vec<&str> = self
            .columns
            .iter()
            .map(String::as_str)
            .filter(|c| !names.contains(c))
            .collect();
        self.select(&keep).expect("kept columns are always present")
    }

    #[must_use]
    pub fn filter_mask(&self, mask: &[bool]) -> Frame {
        assert_eq!(mask.len(), self.rows.len());
        let rows = self
            .rows
            .iter()
            .zip(mask)
            .filter(|(_, keep)| **keep)
            .map(|(row, _)| row.clone())
            .collect();
        Frame {
            columns: self.columns.clone(),
            rows,
        }
    }

    /// Inner-joins `self` with `other` on one or more key column pairs,
    /// keeping every column of `self` plus every column of `other` that is
    /// not a join key and not already present in `self` by name.
    ///
    /// Grounds `process_triples`' `df.set_index(join_cols).join(tsq.df.set_index(join_cols), how='inner')`:
    /// a static-result row survives only if it has a matching time-series
    /// row on every key (signal id, and timestamp/data variable when bound).
    pub fn inner_join(&self, other: &Frame, keys: &[(&str, &str)]) -> FrameResult<Frame> {
        let left_key_idx: Vec<usize> = keys
            .iter()
            .map(|(l, _)| self.require_column(l))
            .collect::<FrameResult<_>>()?;
        let right_key_idx: Vec<usize> = keys
            .iter()
            .map(|(_, r)| other.require_column(r))
            .collect::<FrameResult<_>>()?;
        let right_key_names: Vec<&str> = keys.iter().map(|(_, r)| *r).collect();

        let extra_right_cols: Vec<usize> = other
            .columns
            .iter()
            .enumerate()
            .filter(|(_, name)| {
                !right_key_names.contains(&name.as_str()) && !self.columns.contains(name)
            })
            .map(|(i, _)| i)
            .collect();

        let mut columns = self.columns.clone();
        columns.extend(extra_right_cols.iter().map(|&i| other.columns[i].clone()));

        let mut rows = Vec::new();
        for left_row in &self.rows {
            for right_row in &other.rows {
                let matches = left_key_idx
                    .iter()
                    .zip(&right_key_idx)
                    .all(|(&li, &ri)| left_row[li].join_eq(&right_row[ri]));
                if matches {
                    let mut row = left_row.clone();
                    row.extend(extra_right_cols.iter().map(|&i| right_row[i].clone()));
                    rows.push(row);
                }
            }
        }
        Ok(Frame { columns, rows })
    }

    /// Left-joins `self` with `other` on a single key column pair, keeping
    /// every row of `self`: unmatched rows get `Null` in every new column
    /// from `other`. Grounds `generate_left_join`'s
    /// `df_lhs.set_index(join_col).join(df_rhs.set_index(join_col)[rhs_newcols], how='left')`.
    pub fn left_join(&self, other: &Frame, left_key: &str, right_key: &str) -> FrameResult<Frame> {
        let left_key_idx = self.require_column(left_key)?;
        let right_key_idx = other.require_column(right_key)?;

        let extra_right_cols: Vec<usize> = other
            .columns
            .iter()
            .enumerate()
            .filter(|(_, name)| name.as_str() != right_key && !self.columns.contains(name))
            .map(|(i, _)| i)
            .collect();

        let mut columns = self.columns.clone();
        columns.extend(extra_right_cols.iter().map(|&i| other.columns[i].clone()));

        let mut rows = Vec::new();
        for left_row in &self.rows {
            let matching: Vec<&Vec<Scalar>> = other
                .rows
                .iter()
                .filter(|right_row| left_row[left_key_idx].join_eq(&right_row[right_key_idx]))
                .collect();
            if matching.is_empty() {
                let mut row = left_row.clone();
                row.extend(extra_right_cols.iter().map(|_| Scalar::Null));
                rows.push(row);
            } else {
                for right_row in matching {
                    let mut row = left_row.clone();
                    row.extend(extra_right_cols.iter().map(|&i| right_row[i].clone()));
                    rows.push(row);
                }
            }
        }
        Ok(Frame { columns, rows })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(columns: &[&str], rows: Vec<Vec<Scalar>>) -> Frame {
        Frame::from_rows(columns.iter().map(|c| (*c).to_owned()).collect(), rows)
    }

    #[test]
    fn select_projects_and_reorders() {
        let f = frame(
            &["a", "b", "c"],
            vec![vec![Scalar::Int(1), Scalar::Int(2), Scalar::Int(3)]],
        );
        let projected = f.select(&["c", "a"]).unwrap();
        assert_eq!(projected.columns(), ["c", "a"]);
        assert_eq!(projected.rows()[0], vec![Scalar::Int(3), Scalar::Int(1)]);
    }

    #[test]
    fn with_row_id_is_sequential() {
        let f = frame(
            &["a"],
            vec![vec![Scalar::Int(10)], vec![Scalar::Int(20)]],
        );
        let with_id = f.with_row_id("__row_id");
        assert_eq!(with_id.columns().last().unwrap(), "__row_id");
        assert_eq!(with_id.rows()[0].last().unwrap(), &Scalar::Int(0));
        assert_eq!(with_id.rows()[1].last().unwrap(), &Scalar::Int(1));
    }

    #[test]
    fn inner_join_drops_unmatched_rows() {
        let left = frame(
            &["signal_id"],
            vec![vec![Scalar::Str("s1".into())], vec![Scalar::Str("s2".into())]],
        );
        let right = frame(
            &["signal_id", "value"],
            vec![vec![Scalar::Str("s1".into()), Scalar::Real(1.5)]],
        );
        let joined = left.inner_join(&right, &[("signal_id", "signal_id")]).unwrap();
        assert_eq!(joined.nrows(), 1);
        assert_eq!(joined.columns(), ["signal_id", "value"]);
        assert_eq!(joined.rows()[0][1], Scalar::Real(1.5));
    }

    #[test]
    fn left_join_keeps_unmatched_rows_as_null() {
        let left = frame(
            &["__row_id", "x"],
            vec![vec![Scalar::Int(0), Scalar::Int(1)], vec![Scalar::Int(1), Scalar::Int(2)]],
        );
        let right = frame(
            &["__row_id", "y"],
            vec![vec![Scalar::Int(0), Scalar::Str("hit".into())]],
        );
        let joined = left.left_join(&right, "__row_id", "__row_id").unwrap();
        assert_eq!(joined.nrows(), 2);
        assert_eq!(joined.rows()[0].last().unwrap(), &Scalar::Str("hit".into()));
        assert_eq!(joined.rows()[1].last().unwrap(), &Scalar::Null);
    }

    #[test]
    fn filter_mask_keeps_only_marked_rows() {
        let f = frame(
            &["a"],
            vec![vec![Scalar::Int(1)], vec![Scalar::Int(2)], vec![Scalar::Int(3)]],
        );
        let filtered = f.filter_mask(&[true, false, true]);
        assert_eq!(filtered.nrows(), 2);
    }
}
