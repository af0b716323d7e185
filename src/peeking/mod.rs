// Monitoring-bias simulation
//
// Quantifies how repeated interim significance testing inflates the
// realized Type-I error of a fixed-horizon test. Both arms are drawn from
// the same population, so every significant trial is a false positive.
//
// Stopping rule: a trial ends at the first look with p < alpha, and no
// further observations are drawn for it. The gap between the resulting
// curve and the nominal alpha grows with the number of looks and tends to 1
// as looks become unbounded.

mod curve;
mod simulate;
mod stream;

pub use curve::{log_grid, CurvePoint, ResultCurve};
pub use simulate::{
    scan, simulate_false_positive_rate, sweep, Scan, Simulator, Tally, TrialOutcome,
};
pub use stream::{generate_p_values, LookSchedule, PValueStream};
