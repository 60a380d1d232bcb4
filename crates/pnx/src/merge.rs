//! Merge-run detection over the emitted row order.
//!
//! Runs are computed from row positions in one pass. The run that is still
//! open when the scan ends is always closed, whether or not the last row
//! matched its predecessor.

use std::ops::Range;

/// How parent values reach rows that share a parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Emission {
    /// Every row carries its parent values.
    #[default]
    Duplicated,
    /// Only the first row of a run carries them; the sink spans the rest.
    Spanned,
}

/// A contiguous block of rows with one parent, spanned over fixed columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeRun {
    /// Row positions in emission order, header excluded.
    pub rows: Range<usize>,
    /// Columns spanned for every row of the run.
    pub columns: Range<usize>,
}

impl MergeRun {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn first_row(&self) -> usize {
        self.rows.start
    }

    pub fn last_row(&self) -> usize {
        self.rows.end - 1
    }
}

/// Maximal ranges of equal consecutive keys, including single rows.
pub fn key_runs<K: PartialEq>(keys: &[K]) -> Vec<Range<usize>> {
    let mut runs = Vec::new();
    if keys.is_empty() {
        return runs;
    }
    let mut start = 0;
    for idx in 1..keys.len() {
        if keys[idx] != keys[start] {
            runs.push(start..idx);
            start = idx;
        }
    }
    runs.push(start..keys.len());
    runs
}

/// Runs of two or more equal keys, each spanning `columns`.
///
/// An empty column range never produces runs.
pub fn merge_runs<K: PartialEq>(keys: &[K], columns: Range<usize>) -> Vec<MergeRun> {
    if columns.is_empty() {
        return Vec::new();
    }
    key_runs(keys)
        .into_iter()
        .filter(|rows| rows.len() >= 2)
        .map(|rows| MergeRun {
            rows,
            columns: columns.clone(),
        })
        .collect()
}

/// Clear the spanned cells of every row of a run except the first.
pub fn blank_runs(rows: &mut [Vec<String>], runs: &[MergeRun]) {
    for run in runs {
        for row in rows.iter_mut().take(run.rows.end).skip(run.rows.start + 1) {
            for value in row.iter_mut().take(run.columns.end).skip(run.columns.start) {
                value.clear();
            }
        }
    }
}

/// Copy the first row's spanned cells down the run, undoing [`blank_runs`].
pub fn fill_runs(rows: &mut [Vec<String>], runs: &[MergeRun]) {
    for run in runs {
        let Some(first) = rows.get(run.rows.start) else {
            continue;
        };
        let representative: Vec<String> = first
            .iter()
            .take(run.columns.end)
            .skip(run.columns.start)
            .cloned()
            .collect();
        for row in rows.iter_mut().take(run.rows.end).skip(run.rows.start + 1) {
            for (slot, value) in row.iter_mut().skip(run.columns.start).zip(&representative) {
                slot.clone_from(value);
            }
        }
    }
}
