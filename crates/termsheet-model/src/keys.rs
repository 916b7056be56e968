//! Field keys of the built-in term sheet schema.

pub const INVESTMENT_TARGET: &str = "투자대상";
pub const REPRESENTATIVE: &str = "대표이사";
pub const INVESTOR: &str = "투자자";
pub const CONTRACT_DATE: &str = "계약일";
pub const INVESTMENT_TYPE: &str = "투자유형";
pub const INVESTMENT_AMOUNT: &str = "투자금액";
pub const POST_MONEY_VALUATION: &str = "투자후가치";
pub const PRE_MONEY_VALUATION: &str = "투자전가치";
pub const PRICE_PER_SHARE: &str = "인수단가";
pub const SHARES_ACQUIRED: &str = "인수주식수";
pub const OWNERSHIP: &str = "지분율";
pub const TOTAL_SHARES_AFTER: &str = "투자후총발행주식수";
pub const REDEMPTION_INTEREST: &str = "상환이자";
pub const RESIDUAL_INTEREST: &str = "잔여분배이자";
pub const DIVIDEND_RATE: &str = "배당률";
pub const SPECIAL_TERMS: &str = "특약사항";

/// Investment type options.
pub const COMMON_STOCK: &str = "보통주";
pub const REDEEMABLE_CONVERTIBLE_PREFERRED: &str = "상환전환우선주";
pub const CONVERTIBLE_BOND: &str = "전환사채";
