//! Policy adapters for evaluation without an external learner.
//!
//! [`ScriptedPolicy`] replays a recorded action sequence (e.g. the `action`
//! column of a logged evaluation run); [`ForecastPolicy`] follows the
//! forecast's implied direction bar by bar.

use crate::domain::bar::PriceSeries;
use crate::domain::position::Action;
use crate::ports::policy_port::PolicyPort;

/// Replays a pre-recorded action sequence. Each `predict` call consumes the
/// next entry; running out of entries is a policy failure.
pub struct ScriptedPolicy {
    actions: Vec<i64>,
    cursor: usize,
}

impl ScriptedPolicy {
    pub fn new(actions: Vec<i64>) -> Self {
        ScriptedPolicy { actions, cursor: 0 }
    }

    /// Skip the first `offset` entries, for runs whose first decision bar is
    /// delayed by an observation window.
    pub fn with_offset(mut self, offset: usize) -> Self {
        self.cursor = offset;
        self
    }
}

impl PolicyPort for ScriptedPolicy {
    fn predict(&mut self, _observation: &[f64]) -> Result<i64, String> {
        let action = self
            .actions
            .get(self.cursor)
            .copied()
            .ok_or_else(|| format!("action log exhausted at entry {}", self.cursor))?;
        self.cursor += 1;
        Ok(action)
    }
}

/// Goes long on a positive forecast return, short on a negative one, and
/// holds when the forecast is absent or flat.
pub struct ForecastPolicy {
    inner: ScriptedPolicy,
}

impl ForecastPolicy {
    pub fn new(series: &PriceSeries) -> Self {
        let actions = (0..series.len())
            .map(|step| match series.forecast_return(step) {
                Some(r) if r > 0.0 => Action::Long.index(),
                Some(r) if r < 0.0 => Action::Short.index(),
                _ => Action::Hold.index(),
            })
            .collect();
        ForecastPolicy {
            inner: ScriptedPolicy::new(actions),
        }
    }

    pub fn with_offset(mut self, offset: usize) -> Self {
        self.inner = self.inner.with_offset(offset);
        self
    }
}

impl PolicyPort for ForecastPolicy {
    fn predict(&mut self, observation: &[f64]) -> Result<i64, String> {
        self.inner.predict(observation)
    }
}
