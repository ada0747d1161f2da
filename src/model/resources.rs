use std::fmt;

use serde::{Deserialize, Serialize};

/// Upper bound for the percentage-scaled stats (approval, name recognition,
/// campaign strength). Lower bound is zero for every resource.
pub const MAX_PERCENT: f64 = 100.0;

/// Which player resource a cost, requirement, or shortfall refers to.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Funds,
    Approval,
    PoliticalCapital,
    ActionPoints,
    NameRecognition,
    CampaignStrength,
}

impl ResourceKind {
    /// Return the serde string for this variant (for messages and Postgres COPY).
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Funds => "funds",
            ResourceKind::Approval => "approval",
            ResourceKind::PoliticalCapital => "political_capital",
            ResourceKind::ActionPoints => "action_points",
            ResourceKind::NameRecognition => "name_recognition",
            ResourceKind::CampaignStrength => "campaign_strength",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Concrete price of one action execution. Percentage stats are never part of
/// a cost; only the three spendable resources appear here.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionCost {
    #[serde(default)]
    pub action_points: u32,
    #[serde(default)]
    pub funds: i64,
    #[serde(default)]
    pub political_capital: u32,
}

impl ActionCost {
    pub fn is_free(&self) -> bool {
        self.action_points == 0 && self.funds == 0 && self.political_capital == 0
    }
}

impl fmt::Display for ActionCost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} AP / ${} / {} PC",
            self.action_points, self.funds, self.political_capital
        )
    }
}

/// Signed change to a player's resources. Fields default to zero so catalog
/// JSON only names the stats an effect touches.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StatDelta {
    #[serde(default)]
    pub funds: i64,
    #[serde(default)]
    pub approval: f64,
    #[serde(default)]
    pub political_capital: i64,
    #[serde(default)]
    pub action_points: i64,
    #[serde(default)]
    pub name_recognition: f64,
    #[serde(default)]
    pub campaign_strength: f64,
}

impl StatDelta {
    pub fn is_zero(&self) -> bool {
        *self == StatDelta::default()
    }
}

/// Report of a failed debit: which resource fell short and by how much.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Shortfall {
    pub resource: ResourceKind,
    pub required: f64,
    pub available: f64,
}

impl Shortfall {
    /// How much more of the resource the player would need.
    pub fn missing(&self) -> f64 {
        self.required - self.available
    }
}

/// Point-in-time copy of a player's resources, returned to callers after every
/// successful action and used as the ledger's serialized form.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub funds: i64,
    pub approval: f64,
    pub political_capital: u32,
    pub action_points: u32,
    pub name_recognition: f64,
    pub campaign_strength: f64,
}

/// The authoritative, mutable resource state of one player.
///
/// Invariants: funds, political capital, and action points never go negative;
/// approval, name recognition, and campaign strength stay in `[0, 100]`.
/// Construction and every mutation re-establish the bounds, so a ledger read
/// is always in range, including one deserialized from external state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(into = "StatsSnapshot", from = "StatsSnapshot")]
pub struct ResourceLedger {
    funds: i64,
    approval: f64,
    political_capital: u32,
    action_points: u32,
    name_recognition: f64,
    campaign_strength: f64,
}

impl From<ResourceLedger> for StatsSnapshot {
    fn from(ledger: ResourceLedger) -> Self {
        ledger.snapshot()
    }
}

impl From<StatsSnapshot> for ResourceLedger {
    fn from(snap: StatsSnapshot) -> Self {
        ResourceLedger::new(
            snap.funds,
            snap.approval,
            snap.political_capital,
            snap.action_points,
            snap.name_recognition,
            snap.campaign_strength,
        )
    }
}

impl ResourceLedger {
    /// Build a ledger, clamping every value into bounds. Out-of-range inputs
    /// are normalized, not rejected; bounds are the ledger's own job.
    pub fn new(
        funds: i64,
        approval: f64,
        political_capital: u32,
        action_points: u32,
        name_recognition: f64,
        campaign_strength: f64,
    ) -> Self {
        Self {
            funds: funds.max(0),
            approval: clamp_percent(approval),
            political_capital,
            action_points,
            name_recognition: clamp_percent(name_recognition),
            campaign_strength: clamp_percent(campaign_strength),
        }
    }

    pub fn funds(&self) -> i64 {
        self.funds
    }

    pub fn approval(&self) -> f64 {
        self.approval
    }

    pub fn political_capital(&self) -> u32 {
        self.political_capital
    }

    pub fn action_points(&self) -> u32 {
        self.action_points
    }

    pub fn name_recognition(&self) -> f64 {
        self.name_recognition
    }

    pub fn campaign_strength(&self) -> f64 {
        self.campaign_strength
    }

    /// Read any stat as an `f64`, for cost scaling and eligibility checks.
    pub fn stat(&self, kind: ResourceKind) -> f64 {
        match kind {
            ResourceKind::Funds => self.funds as f64,
            ResourceKind::Approval => self.approval,
            ResourceKind::PoliticalCapital => f64::from(self.political_capital),
            ResourceKind::ActionPoints => f64::from(self.action_points),
            ResourceKind::NameRecognition => self.name_recognition,
            ResourceKind::CampaignStrength => self.campaign_strength,
        }
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            funds: self.funds,
            approval: self.approval,
            political_capital: self.political_capital,
            action_points: self.action_points,
            name_recognition: self.name_recognition,
            campaign_strength: self.campaign_strength,
        }
    }

    /// Debit a cost, all-or-nothing. If any single resource is insufficient,
    /// nothing is debited and the first shortfall is reported, checked in
    /// order: action points, funds, political capital.
    pub fn try_debit(&mut self, cost: &ActionCost) -> Result<(), Shortfall> {
        if self.action_points < cost.action_points {
            return Err(Shortfall {
                resource: ResourceKind::ActionPoints,
                required: f64::from(cost.action_points),
                available: f64::from(self.action_points),
            });
        }
        if self.funds < cost.funds {
            return Err(Shortfall {
                resource: ResourceKind::Funds,
                required: cost.funds as f64,
                available: self.funds as f64,
            });
        }
        if self.political_capital < cost.political_capital {
            return Err(Shortfall {
                resource: ResourceKind::PoliticalCapital,
                required: f64::from(cost.political_capital),
                available: f64::from(self.political_capital),
            });
        }
        self.action_points -= cost.action_points;
        self.funds -= cost.funds;
        self.political_capital -= cost.political_capital;
        Ok(())
    }

    /// Apply a signed delta, clamping percentage stats into `[0, 100]` and
    /// flooring funds/PC/AP at zero. Clamping is normal behavior, never an
    /// error.
    pub fn apply_delta(&mut self, delta: &StatDelta) {
        self.funds = self.funds.saturating_add(delta.funds).max(0);
        self.approval = clamp_percent(self.approval + delta.approval);
        self.political_capital = shift_counter(self.political_capital, delta.political_capital);
        self.action_points = shift_counter(self.action_points, delta.action_points);
        self.name_recognition = clamp_percent(self.name_recognition + delta.name_recognition);
        self.campaign_strength = clamp_percent(self.campaign_strength + delta.campaign_strength);
    }

    /// Credit funds directly (filing-fee refunds).
    ///
    /// # Panics
    /// Panics if `amount` is negative; refunds are always non-negative.
    pub fn credit_funds(&mut self, amount: i64) {
        assert!(amount >= 0, "credit must be non-negative: {amount}");
        self.funds = self.funds.saturating_add(amount);
    }
}

fn clamp_percent(value: f64) -> f64 {
    value.clamp(0.0, MAX_PERCENT)
}

/// Shift an unsigned counter by a signed delta, flooring at zero.
fn shift_counter(current: u32, delta: i64) -> u32 {
    let shifted = i64::from(current).saturating_add(delta);
    shifted.clamp(0, i64::from(u32::MAX)) as u32
}
