//! Typed identifiers for calculation rules.
//!
//! Each rule declares its target and dependencies statically. The compute
//! functions live in the engine; only the declaration lives here so the
//! schema can reference rules by name and an unknown name fails to load.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::keys;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleId {
    /// 투자전가치 = 투자후가치 - 투자금액
    PreMoneyValuation,
    /// 지분율 = 투자금액 / 투자후가치 * 100
    Ownership,
    /// 인수주식수 = floor(투자금액 * unit multiplier / 인수단가)
    SharesAcquired,
    /// 투자후총발행주식수 = floor(인수주식수 / 지분율 * 100)
    ///
    /// Both inputs are calculated fields.
    TotalSharesAfter,
}

impl RuleId {
    pub const ALL: [Self; 4] = [
        Self::PreMoneyValuation,
        Self::Ownership,
        Self::SharesAcquired,
        Self::TotalSharesAfter,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PreMoneyValuation => "pre_money_valuation",
            Self::Ownership => "ownership",
            Self::SharesAcquired => "shares_acquired",
            Self::TotalSharesAfter => "total_shares_after",
        }
    }

    /// Field written by this rule.
    pub fn target(&self) -> &'static str {
        match self {
            Self::PreMoneyValuation => keys::PRE_MONEY_VALUATION,
            Self::Ownership => keys::OWNERSHIP,
            Self::SharesAcquired => keys::SHARES_ACQUIRED,
            Self::TotalSharesAfter => keys::TOTAL_SHARES_AFTER,
        }
    }

    /// Fields read by this rule, in declaration order.
    pub fn dependencies(&self) -> &'static [&'static str] {
        match self {
            Self::PreMoneyValuation => &[keys::POST_MONEY_VALUATION, keys::INVESTMENT_AMOUNT],
            Self::Ownership => &[keys::INVESTMENT_AMOUNT, keys::POST_MONEY_VALUATION],
            Self::SharesAcquired => &[keys::INVESTMENT_AMOUNT, keys::PRICE_PER_SHARE],
            Self::TotalSharesAfter => &[keys::SHARES_ACQUIRED, keys::OWNERSHIP],
        }
    }

    /// Returns true if the rule's inputs depend on the active currency unit.
    pub fn is_unit_sensitive(&self) -> bool {
        matches!(self, Self::SharesAcquired)
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
