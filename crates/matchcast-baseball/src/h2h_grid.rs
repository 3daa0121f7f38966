// Head-to-head calibration grid.
//
// Rows are career at-bats against the pitcher (1-25), columns are OPS bin
// edges. Each cell holds the points (0-30) of total score weight that
// head-to-head history earns at that sample size and quality. Lookup snaps
// at-bats to an exact row and interpolates linearly between OPS columns.

use std::sync::LazyLock;
use thiserror::Error;

/// Number of at-bat rows in the calibrated table.
pub const AT_BAT_ROWS: usize = 25;

/// OPS used when the head-to-head OPS is missing or non-finite.
pub const LEAGUE_BASELINE_OPS: f64 = 0.72;

/// Largest cell value; divides by 100 into the maximum weight share.
pub const MAX_POINTS: f64 = 30.0;

const OPS_BIN_EDGES: [f64; 12] = [
    0.20, 0.40, 0.50, 0.60, 0.70, 0.80, 0.90, 1.00, 1.10, 1.25, 1.50, 2.00,
];

#[rustfmt::skip]
const CALIBRATED_POINTS: [[f64; 12]; AT_BAT_ROWS] = [
    [1.0, 1.0, 1.0, 1.0,  2.0,  2.0,  3.0,  3.0,  4.0,  4.0,  4.0,  4.0], // 1
    [1.0, 1.0, 2.0, 2.0,  3.0,  3.0,  4.0,  5.0,  5.0,  6.0,  6.0,  7.0], // 2
    [1.0, 2.0, 2.0, 3.0,  3.0,  4.0,  5.0,  6.0,  7.0,  8.0,  8.0,  8.0], // 3
    [2.0, 2.0, 3.0, 3.0,  4.0,  5.0,  6.0,  7.0,  8.0,  9.0, 10.0, 10.0], // 4
    [2.0, 2.0, 3.0, 4.0,  5.0,  6.0,  7.0,  8.0,  9.0, 10.0, 11.0, 11.0], // 5
    [2.0, 3.0, 3.0, 4.0,  5.0,  6.0,  8.0,  9.0, 10.0, 11.0, 12.0, 13.0], // 6
    [2.0, 3.0, 4.0, 4.0,  6.0,  7.0,  9.0, 10.0, 11.0, 13.0, 14.0, 14.0], // 7
    [2.0, 3.0, 4.0, 5.0,  6.0,  8.0,  9.0, 11.0, 12.0, 14.0, 15.0, 15.0], // 8
    [2.0, 3.0, 4.0, 5.0,  7.0,  8.0, 10.0, 12.0, 13.0, 15.0, 16.0, 16.0], // 9
    [3.0, 4.0, 4.0, 5.0,  7.0,  9.0, 11.0, 12.0, 14.0, 16.0, 17.0, 17.0], // 10
    [3.0, 4.0, 5.0, 6.0,  7.0,  9.0, 11.0, 13.0, 15.0, 16.0, 18.0, 18.0], // 11
    [3.0, 4.0, 5.0, 6.0,  8.0, 10.0, 12.0, 14.0, 16.0, 17.0, 19.0, 19.0], // 12
    [3.0, 4.0, 5.0, 6.0,  8.0, 10.0, 12.0, 15.0, 16.0, 18.0, 20.0, 20.0], // 13
    [3.0, 4.0, 5.0, 7.0,  9.0, 11.0, 13.0, 15.0, 17.0, 19.0, 21.0, 21.0], // 14
    [3.0, 5.0, 6.0, 7.0,  9.0, 11.0, 14.0, 16.0, 18.0, 20.0, 21.0, 22.0], // 15
    [4.0, 5.0, 6.0, 7.0,  9.0, 12.0, 14.0, 17.0, 19.0, 21.0, 22.0, 23.0], // 16
    [4.0, 5.0, 6.0, 8.0, 10.0, 12.0, 15.0, 17.0, 19.0, 21.0, 23.0, 24.0], // 17
    [4.0, 5.0, 6.0, 8.0, 10.0, 12.0, 15.0, 18.0, 20.0, 22.0, 24.0, 25.0], // 18
    [4.0, 5.0, 6.0, 8.0, 10.0, 13.0, 16.0, 18.0, 21.0, 23.0, 25.0, 25.0], // 19
    [4.0, 5.0, 7.0, 8.0, 11.0, 13.0, 16.0, 19.0, 21.0, 24.0, 25.0, 26.0], // 20
    [4.0, 6.0, 7.0, 9.0, 11.0, 14.0, 17.0, 19.0, 22.0, 24.0, 26.0, 27.0], // 21
    [4.0, 6.0, 7.0, 9.0, 11.0, 14.0, 17.0, 20.0, 22.0, 25.0, 27.0, 28.0], // 22
    [4.0, 6.0, 7.0, 9.0, 12.0, 14.0, 18.0, 21.0, 23.0, 26.0, 28.0, 29.0], // 23
    [4.0, 6.0, 7.0, 9.0, 12.0, 15.0, 18.0, 21.0, 24.0, 26.0, 28.0, 29.0], // 24
    [5.0, 6.0, 8.0, 10.0, 12.0, 15.0, 18.0, 22.0, 24.0, 27.0, 29.0, 30.0], // 25
];

static CALIBRATED: LazyLock<H2hGrid> = LazyLock::new(|| {
    H2hGrid::new(
        OPS_BIN_EDGES.to_vec(),
        CALIBRATED_POINTS.iter().map(|row| row.to_vec()).collect(),
    )
    .expect("built-in head-to-head calibration grid is well-formed")
});

#[derive(Debug, Error, PartialEq)]
pub enum GridError {
    #[error("grid needs {expected} at-bat rows, got {actual}")]
    RowCount { expected: usize, actual: usize },

    #[error("row {row} has {actual} cells but there are {expected} OPS bins")]
    RowWidth {
        row: usize,
        expected: usize,
        actual: usize,
    },

    #[error("OPS bin edges must be finite and strictly increasing (at index {index})")]
    UnorderedEdges { index: usize },

    #[error("at least two OPS bin edges are required")]
    TooFewEdges,

    #[error("cell [{row}][{col}] = {value} is outside [0, 30]")]
    CellOutOfRange { row: usize, col: usize, value: f64 },
}

/// A validated at-bats x OPS calibration table.
#[derive(Debug, Clone)]
pub struct H2hGrid {
    edges: Vec<f64>,
    points: Vec<Vec<f64>>,
}

impl H2hGrid {
    /// Build a grid, rejecting malformed dimensions or values up front so
    /// lookups can never fail.
    pub fn new(edges: Vec<f64>, points: Vec<Vec<f64>>) -> Result<Self, GridError> {
        if edges.len() < 2 {
            return Err(GridError::TooFewEdges);
        }
        for (index, pair) in edges.windows(2).enumerate() {
            if !pair[0].is_finite() || !pair[1].is_finite() || pair[1] <= pair[0] {
                return Err(GridError::UnorderedEdges { index: index + 1 });
            }
        }
        if points.len() != AT_BAT_ROWS {
            return Err(GridError::RowCount {
                expected: AT_BAT_ROWS,
                actual: points.len(),
            });
        }
        for (row, cells) in points.iter().enumerate() {
            if cells.len() != edges.len() {
                return Err(GridError::RowWidth {
                    row,
                    expected: edges.len(),
                    actual: cells.len(),
                });
            }
            for (col, &value) in cells.iter().enumerate() {
                if !(0.0..=MAX_POINTS).contains(&value) {
                    return Err(GridError::CellOutOfRange { row, col, value });
                }
            }
        }
        Ok(Self { edges, points })
    }

    /// The built-in calibrated grid.
    pub fn calibrated() -> &'static H2hGrid {
        &CALIBRATED
    }

    /// Interpolated points (0-30) for the given head-to-head sample.
    pub fn points(&self, at_bats: Option<f64>, ops: Option<f64>) -> f64 {
        let row = &self.points[at_bat_row(at_bats)];

        let ops = ops.filter(|v| v.is_finite()).unwrap_or(LEAGUE_BASELINE_OPS);
        let lo = self.edges[0];
        let hi = self.edges[self.edges.len() - 1];
        let ops = ops.clamp(lo, hi);

        // Index of the last edge <= ops, capped so that `upper` stays in range.
        let lower = self
            .edges
            .iter()
            .rposition(|&edge| edge <= ops)
            .unwrap_or(0)
            .min(self.edges.len() - 2);
        let upper = lower + 1;

        let span = self.edges[upper] - self.edges[lower];
        let t = ((ops - self.edges[lower]) / span).clamp(0.0, 1.0);
        row[lower] + t * (row[upper] - row[lower])
    }

    /// Weight share in [0, 0.30] that head-to-head history carries.
    pub fn weight(&self, at_bats: Option<f64>, ops: Option<f64>) -> f64 {
        self.points(at_bats, ops) / 100.0
    }
}

/// Zero-based row for an at-bat count: rounded, clamped to 1..=25. Missing
/// or non-finite counts map to the first row.
fn at_bat_row(at_bats: Option<f64>) -> usize {
    let ab = at_bats.filter(|v| v.is_finite()).unwrap_or(0.0).round();
    let ab = ab.clamp(1.0, AT_BAT_ROWS as f64) as usize;
    ab - 1
}

/// Head-to-head weight share from the calibrated grid.
pub fn h2h_weight(at_bats: Option<f64>, ops: Option<f64>) -> f64 {
    H2hGrid::calibrated().weight(at_bats, ops)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
