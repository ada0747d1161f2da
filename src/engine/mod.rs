pub mod arena;
pub mod clock;
pub mod config;
pub mod cost;
pub mod effects;
pub mod elections;
pub mod error;
pub mod resolver;

pub use arena::{LedgerArena, PlayerState, lock_bounded, lock_pair};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::EngineConfig;
pub use cost::{compute_cost, cost_multiplier};
pub use effects::EffectOutcome;
pub use elections::ElectionBook;
pub use error::{EngineError, TransitionError, ValidationError};
pub use resolver::{
    ActionReport, ActionResolver, AttackReport, FilingReport, SupportReport, WithdrawalReport,
};
