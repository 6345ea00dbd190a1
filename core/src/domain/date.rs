//! Vendor timestamps
//!
//! The vendor reports every time in KST (UTC+09:00) without an offset, e.g.
//! `2026/01/24 (토) 18:20:39`. Parsed values always carry the +09:00 offset.

use std::sync::LazyLock;

use chrono::{
    DateTime, Datelike, Duration, FixedOffset, NaiveDate, Offset, TimeZone, Utc, Weekday,
};
use regex_lite::Regex;

/// KST offset in seconds east of UTC.
pub const KST_OFFSET_SECS: i32 = 9 * 3600;

#[allow(clippy::expect_used)]
static SALE_DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d{4})/(\d{2})/(\d{2}).*?(\d{2}):(\d{2}):(\d{2})").expect("valid sale date regex")
});

#[allow(clippy::expect_used)]
static DRAW_DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d{4})\s*[-./년]\s*(\d{1,2})\s*[-./월]\s*(\d{1,2})").expect("valid draw date regex")
});

/// The vendor's fixed offset.
pub fn kst() -> FixedOffset {
    FixedOffset::east_opt(KST_OFFSET_SECS).unwrap_or_else(|| Utc.fix())
}

/// Current time in KST.
pub fn now_kst() -> DateTime<FixedOffset> {
    Utc::now().with_timezone(&kst())
}

/// Today's calendar date in KST.
pub fn today_kst() -> NaiveDate {
    now_kst().date_naive()
}

/// Parse a vendor sale timestamp (`YYYY/MM/DD (요일) HH:MM:SS`).
///
/// Returns `None` when the text does not contain a complete, valid timestamp.
pub fn parse_sale_date(text: &str) -> Option<DateTime<FixedOffset>> {
    let caps = SALE_DATE_RE.captures(text)?;
    let field = |idx: usize| caps.get(idx)?.as_str().parse::<u32>().ok();

    let year = i32::try_from(field(1)?).ok()?;
    let naive = NaiveDate::from_ymd_opt(year, field(2)?, field(3)?)?.and_hms_opt(
        field(4)?,
        field(5)?,
        field(6)?,
    )?;
    kst().from_local_datetime(&naive).single()
}

/// Parse a draw date such as `2025-12-06`, `2025.12.06` or `2025년 12월 06일`.
pub fn parse_draw_date(text: &str) -> Option<NaiveDate> {
    let caps = DRAW_DATE_RE.captures(text)?;
    let year = caps.get(1)?.as_str().parse().ok()?;
    let month = caps.get(2)?.as_str().parse().ok()?;
    let day = caps.get(3)?.as_str().parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// True when `sale` happened at most `window_minutes` before `now`.
///
/// The boundary is inclusive. Sale times in the future count as recent.
pub fn is_within_window(
    sale: DateTime<FixedOffset>,
    now: DateTime<Utc>,
    window_minutes: u32,
) -> bool {
    now.signed_duration_since(sale) <= Duration::minutes(i64::from(window_minutes))
}

/// `YYYY.MM.DD` rendering used in reports.
pub fn format_date_dot(date: NaiveDate) -> String {
    date.format("%Y.%m.%d").to_string()
}

/// `YYYY.MM.DD (Sat) HH:MM` rendering of a sale timestamp, or `-`.
pub fn format_sale_date(sale: Option<DateTime<FixedOffset>>) -> String {
    match sale {
        Some(sale) => sale.format("%Y.%m.%d (%a) %H:%M").to_string(),
        None => "-".to_string(),
    }
}

/// Weekday of a KST date, used for Pension 720+ group rotation.
pub fn weekday_kst(now: DateTime<Utc>) -> Weekday {
    now.with_timezone(&kst()).weekday()
}
