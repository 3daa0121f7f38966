// Matchup engine: lineup-slot projection, signal normalization, the
// head-to-head calibration grid, and the composite hitter score.

pub mod h2h_grid;
pub mod lineup;
pub mod normalize;
pub mod opportunity;
pub mod scorer;
pub mod signals;
pub mod weights;
