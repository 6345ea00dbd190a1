//! dhlottery.co.kr over plain HTTP
//!
//! [`DhLotterySession`] owns the cookie jar and the login state. The two
//! product vendors share one session and implement
//! [`lotto_core::TicketVendor`].

pub mod endpoints;
pub mod lotto645;
pub mod parse;
pub mod pension720;
pub mod session;

pub use endpoints::Endpoints;
pub use lotto645::Lotto645Vendor;
pub use pension720::Pension720Vendor;
pub use session::DhLotterySession;

/// Product code of Lotto 6/45 in the purchase ledger.
pub const LOTTO645_PRODUCT_CODE: &str = "LO40";

/// Product code of Pension 720+ in the purchase ledger.
pub const PENSION720_PRODUCT_CODE: &str = "LP72";
