//! Trading policy port trait.

/// An external decision-maker driven by the policy-replay simulator.
///
/// `predict` maps an observation vector to an action index in 0..=2
/// (hold, long, short). Any error string, and any index outside that
/// range, aborts the run as a policy failure with the offending step
/// attached by the driver.
pub trait PolicyPort {
    fn predict(&mut self, observation: &[f64]) -> Result<i64, String>;
}
