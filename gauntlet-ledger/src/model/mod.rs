/// Platform users and their roles.
pub mod user;

/// Challenge plan templates, immutable once referenced.
pub mod plan;

/// One trader's evaluation attempt against one plan.
pub mod challenge;

/// Closed and open execution records.
pub mod trade;

/// Rule violations, appended only.
pub mod violation;

/// Profit-split payout requests.
pub mod payout;

/// Post-funded account-size increases, appended only.
pub mod scaling;

/// Persisted notification outbox.
pub mod notification;

pub use challenge::{AccountMode, Challenge, ChallengeStatus};
pub use notification::NotificationRecord;
pub use payout::{Payout, PayoutNetwork, PayoutStatus};
pub use plan::{ChallengePlan, DrawdownType};
pub use scaling::ScalingStep;
pub use trade::{CloseReason, Trade, TradeDirection, TradeStatus};
pub use user::{User, UserRole};
pub use violation::{Violation, ViolationKind};
