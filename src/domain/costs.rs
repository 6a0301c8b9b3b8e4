//! Transaction cost and slippage model.
//!
//! Two rate pairs are configured up front: the realistic base pair used by
//! every evaluation or backtest run, and a reduced curriculum pair that only
//! policy training may select. Which pair is active is chosen per call via
//! [`CostRegime`], so a running simulation can switch regimes without being
//! rebuilt.

/// Selects which rate pair is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CostRegime {
    /// Curriculum rates. Only valid while training a policy.
    Training,
    /// Realistic rates. Required for all evaluation and backtest runs.
    Evaluation,
}

/// When costs are charged relative to position activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CostTiming {
    /// Both components charged only on a step that executes a position flip.
    OnTrade,
    /// Slippage charged every step; transaction cost only on an executed flip.
    PerStep,
}

/// One (transaction, slippage) rate pair, per unit notional per step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostRates {
    pub transaction: f64,
    pub slippage: f64,
}

impl CostRates {
    pub const ZERO: CostRates = CostRates {
        transaction: 0.0,
        slippage: 0.0,
    };

    pub fn new(transaction: f64, slippage: f64) -> Self {
        CostRates {
            transaction,
            slippage,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CostModel {
    pub base: CostRates,
    pub curriculum: CostRates,
    pub timing: CostTiming,
}

impl Default for CostModel {
    fn default() -> Self {
        CostModel {
            base: CostRates::ZERO,
            curriculum: CostRates::ZERO,
            timing: CostTiming::OnTrade,
        }
    }
}

impl CostModel {
    pub fn new(base: CostRates, curriculum: CostRates, timing: CostTiming) -> Self {
        CostModel {
            base,
            curriculum,
            timing,
        }
    }

    /// A model that charges nothing in either regime.
    pub fn free(timing: CostTiming) -> Self {
        CostModel::new(CostRates::ZERO, CostRates::ZERO, timing)
    }

    fn active(&self, regime: CostRegime) -> CostRates {
        match regime {
            CostRegime::Training => self.curriculum,
            CostRegime::Evaluation => self.base,
        }
    }

    /// Rates charged for one step: `(transaction_cost, slippage)`.
    ///
    /// `trade_executed` is the state machine's flip flag; a request for the
    /// already-held position charges nothing extra.
    pub fn rates(&self, trade_executed: bool, regime: CostRegime) -> (f64, f64) {
        let rates = self.active(regime);
        match self.timing {
            CostTiming::OnTrade => {
                if trade_executed {
                    (rates.transaction, rates.slippage)
                } else {
                    (0.0, 0.0)
                }
            }
            CostTiming::PerStep => {
                let txn = if trade_executed { rates.transaction } else { 0.0 };
                (txn, rates.slippage)
            }
        }
    }
}
