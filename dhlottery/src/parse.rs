//! Page parsers
//!
//! Plain regex extraction over the vendor's HTML. Every parser degrades
//! instead of failing: missing pieces become `None`, an empty list or round 0,
//! and the caller decides whether that is an error.

use std::collections::{BTreeMap, HashSet};
use std::sync::LazyLock;

use chrono::{DateTime, FixedOffset, NaiveDate};
use lotto_core::domain::date::{parse_draw_date, parse_sale_date};
use lotto_core::domain::lotto645::PrizeInfo;
use lotto_core::domain::{
    Balance, PensionMode, PensionTicket, PensionWinningNumbers, PurchaseMode, PurchasedTicket, Rank, Slot,
    WinningNumbers,
};
use regex_lite::Regex;

macro_rules! static_regex {
    ($name:ident, $pattern:expr) => {
        #[allow(clippy::expect_used)]
        static $name: LazyLock<Regex> =
            LazyLock::new(|| Regex::new($pattern).expect(concat!("valid ", stringify!($name))));
    };
}

static_regex!(TAG_RE, r"<[^>]*>");
static_regex!(WHITESPACE_RE, r"\s+");
static_regex!(LOGIN_FAILED_RE, r#"<a\b[^>]*class\s*=\s*"[^"]*\bbtn_common\b"#);
static_regex!(
    DRAW_NO_RE,
    r#"<strong[^>]*\bid\s*=\s*"lottoDrwNo"[^>]*>\s*(\d+)\s*</strong>"#
);
static_regex!(SALE_ROUND_RE, r"제\s*(\d+)\s*회");
static_regex!(
    DETAIL_POP_RE,
    r"detailPop\('([^']+)'\s*,\s*'([^']+)'\s*,\s*'([^']+)'\)"
);
static_regex!(H3_ROUND_RE, r"(?s)<h3[^>]*>.*?<strong[^>]*>(.*?)</strong>");
static_regex!(
    SELECTED_GAME_RE,
    r"(?s)<li[^>]*>\s*<strong[^>]*>\s*<span[^>]*>\s*([A-E])\s*</span>\s*<span[^>]*>(.*?)</span>\s*</strong>(.*?)</li>"
);
static_regex!(NUM_SPAN_RE, r"<span[^>]*>\s*(\d{1,2})\s*</span>");
static_regex!(PENSION_NUMBER_RE, r"([1-5])\s*조\s*((?:\d\s*){6})");
static_regex!(ISSUED_RE, r"발행일\s*:?\s*([\d/]+\s*\([^)]*\)\s*[\d:]+)");
static_regex!(DRAW_DAY_RE, r"추첨일\s*:?\s*([\d/.\-]+)");
static_regex!(RESULT_ROUND_RE, r"(?s)<h4[^>]*>\s*<strong[^>]*>\s*(\d+)\s*회");
static_regex!(DESC_RE, r#"(?s)<p[^>]*class\s*=\s*"desc"[^>]*>(.*?)</p>"#);
static_regex!(BALL_645_RE, r#"ball_645[^"]*"[^>]*>\s*(\d{1,2})\s*<"#);
static_regex!(ROW_RE, r"(?s)<tr[^>]*>(.*?)</tr>");
static_regex!(CELL_RE, r"(?s)<td[^>]*>(.*?)</td>");
static_regex!(RANK_CELL_RE, r"(\d)\s*등");
static_regex!(WF720_ROUND_RE, r"wf720-round[^>]*>\s*(\d+)");
static_regex!(WF720_DATE_RE, r"wf720-date[^>]*>([^<]*)<");
static_regex!(PENSION_GROUP_RE, r"pension-jo[^>]*>\s*([1-5])\s*<");
static_regex!(WF_BALL_RE, r"wf-ball[^>]*>\s*(\d)\s*<");
static_regex!(
    TOTAL_DEPOSIT_RE,
    r#"(?s)class\s*=\s*"total_new"[^>]*>.*?<strong[^>]*>(.*?)</strong>"#
);
static_regex!(
    RIGHT_CELL_RE,
    r#"(?s)<td[^>]*class\s*=\s*"[^"]*\bta_right\b[^"]*"[^>]*>(.*?)</td>"#
);
static_regex!(
    ACCOUNT_TABLE_RE,
    r"(?s)tbl_total_account_number_top.*?</table>"
);

/// Tag-free, whitespace-collapsed text of an HTML fragment.
pub fn strip_tags(html: &str) -> String {
    let text = TAG_RE.replace_all(html, " ").replace("&nbsp;", " ");
    WHITESPACE_RE.replace_all(text.trim(), " ").into_owned()
}

/// All digits of `text` as one number: `"1,234,567원"` -> `1234567`.
pub fn parse_digits(text: &str) -> Option<u64> {
    let digits: String = text.chars().filter(char::is_ascii_digit).collect();
    digits.parse().ok()
}

/// The login response carries a "back" button only when the login failed.
pub fn login_failed(html: &str) -> bool {
    LOGIN_FAILED_RE.is_match(html)
}

/// Round currently on sale, from the front page (latest drawn round + 1).
pub fn parse_current_round(html: &str) -> Option<u32> {
    let drawn: u32 = DRAW_NO_RE.captures(html)?.get(1)?.as_str().parse().ok()?;
    drawn.checked_add(1)
}

/// Round shown on a purchase page ("제 1208 회").
pub fn parse_sale_round(html: &str) -> Option<u32> {
    SALE_ROUND_RE
        .captures(html)?
        .get(1)?
        .as_str()
        .parse()
        .ok()
        .filter(|round| *round > 0)
}

/// Keys of one ledger entry, needed to open its detail page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseSummary {
    pub order_no: String,
    pub barcode: String,
    pub issue_no: String,
}

/// Ledger entries in page order (newest first), without duplicates.
pub fn parse_purchase_list(html: &str) -> Vec<PurchaseSummary> {
    let mut seen = HashSet::new();
    DETAIL_POP_RE
        .captures_iter(html)
        .filter_map(|caps| {
            let summary = PurchaseSummary {
                order_no: caps.get(1)?.as_str().to_string(),
                barcode: caps.get(2)?.as_str().to_string(),
                issue_no: caps.get(3)?.as_str().to_string(),
            };
            let key = format!("{}|{}|{}", summary.order_no, summary.barcode, summary.issue_no);
            seen.insert(key).then_some(summary)
        })
        .collect()
}

/// Header fields shared by both products' detail pages.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ReceiptHeader {
    round: u32,
    sale_date: Option<DateTime<FixedOffset>>,
    draw_date: Option<NaiveDate>,
}

fn parse_receipt_header(html: &str) -> ReceiptHeader {
    let round = H3_ROUND_RE
        .captures(html)
        .and_then(|caps| parse_digits(caps.get(1)?.as_str()))
        .and_then(|round| u32::try_from(round).ok())
        .unwrap_or(0);

    let text = strip_tags(html);
    let sale_date = ISSUED_RE
        .captures(&text)
        .and_then(|caps| parse_sale_date(caps.get(1)?.as_str()));
    let draw_date = DRAW_DAY_RE
        .captures(&text)
        .and_then(|caps| parse_draw_date(caps.get(1)?.as_str()));

    ReceiptHeader {
        round,
        sale_date,
        draw_date,
    }
}

/// Games of a Lotto 6/45 detail page. A game needs a slot and six numbers;
/// anything short of that is skipped.
pub fn parse_lotto645_detail(html: &str) -> Vec<PurchasedTicket> {
    let header = parse_receipt_header(html);

    SELECTED_GAME_RE
        .captures_iter(html)
        .filter_map(|caps| {
            let slot: Slot = caps.get(1)?.as_str().parse().ok()?;
            let mode = PurchaseMode::from_label(&strip_tags(caps.get(2)?.as_str()));
            let numbers: Vec<u8> = NUM_SPAN_RE
                .captures_iter(caps.get(3)?.as_str())
                .filter_map(|num| num.get(1)?.as_str().parse().ok())
                .collect();
            if numbers.len() != 6 {
                return None;
            }

            Some(
                PurchasedTicket::new(header.round, slot, numbers, mode)
                    .with_sale_date(header.sale_date)
                    .with_draw_date(header.draw_date),
            )
        })
        .collect()
}

/// Tickets of a Pension 720+ detail page ("4조 765432").
pub fn parse_pension720_detail(html: &str) -> Vec<PensionTicket> {
    let header = parse_receipt_header(html);

    SELECTED_GAME_RE
        .captures_iter(html)
        .filter_map(|caps| {
            let slot: Slot = caps.get(1)?.as_str().parse().ok()?;
            let mode = PensionMode::from_label(&strip_tags(caps.get(2)?.as_str()));
            let text = strip_tags(caps.get(3)?.as_str());
            let number = PENSION_NUMBER_RE.captures(&text)?;
            let group: u8 = number.get(1)?.as_str().parse().ok()?;
            let digits: String = number
                .get(2)?
                .as_str()
                .chars()
                .filter(char::is_ascii_digit)
                .collect();

            Some(
                PensionTicket::new(header.round, slot, group, digits, mode)
                    .with_sale_date(header.sale_date)
                    .with_draw_date(header.draw_date),
            )
        })
        .collect()
}

/// Games returned by a successful order, e.g. `A|01|02|04|27|39|443`.
///
/// The last field carries the final number followed by the mode digit.
pub fn parse_purchased_games(lines: &[String], round: u32) -> Vec<PurchasedTicket> {
    lines
        .iter()
        .filter_map(|line| {
            let mut parts: Vec<&str> = line.split('|').map(str::trim).collect();
            let slot: Slot = parts.first()?.parse().ok()?;
            let last = parts.pop()?;
            let mode_code = last.chars().last()?;
            let mode = PurchaseMode::from_vendor_code(mode_code).unwrap_or(PurchaseMode::Auto);

            let mut numbers: Vec<u8> = parts
                .iter()
                .skip(1)
                .filter_map(|part| part.parse().ok())
                .collect();
            numbers.push(last.get(..last.len() - mode_code.len_utf8())?.parse().ok()?);
            if numbers.len() != 6 {
                return None;
            }

            Some(PurchasedTicket::new(round, slot, numbers, mode))
        })
        .collect()
}

/// Latest Lotto 6/45 draw from the result page, prize table included when
/// present.
pub fn parse_lotto645_result(html: &str) -> Option<WinningNumbers> {
    let start = html.find("win_result")?;
    let section = &html[start..];

    let round: u32 = RESULT_ROUND_RE
        .captures(section)?
        .get(1)?
        .as_str()
        .parse()
        .ok()?;
    let draw_date = parse_draw_date(&strip_tags(DESC_RE.captures(section)?.get(1)?.as_str()))?;

    let bonus_start = section.find("num bonus")?;
    let win_start = section.find("num win")?;
    let numbers: Vec<u8> = BALL_645_RE
        .captures_iter(section.get(win_start..bonus_start)?)
        .filter_map(|caps| caps.get(1)?.as_str().parse().ok())
        .collect();
    let bonus: u8 = BALL_645_RE
        .captures(&section[bonus_start..])?
        .get(1)?
        .as_str()
        .parse()
        .ok()?;

    let winning = WinningNumbers::new(round, draw_date, numbers, bonus).ok()?;
    let prizes = parse_prize_table(html);
    if prizes.is_empty() {
        Some(winning)
    } else {
        Some(winning.with_prizes(prizes))
    }
}

/// Rows of the per-rank payout table; rows without a rank are ignored.
pub fn parse_prize_table(html: &str) -> BTreeMap<Rank, PrizeInfo> {
    ROW_RE
        .captures_iter(html)
        .filter_map(|row| {
            let cells: Vec<&str> = CELL_RE
                .captures_iter(row.get(1)?.as_str())
                .filter_map(|cell| Some(cell.get(1)?.as_str()))
                .collect();
            if cells.len() < 4 {
                return None;
            }

            let ordinal: u8 = RANK_CELL_RE
                .captures(&strip_tags(cells[0]))?
                .get(1)?
                .as_str()
                .parse()
                .ok()?;
            let rank = Rank::from_ordinal(ordinal)?;

            Some((
                rank,
                PrizeInfo {
                    total_amount: parse_digits(&strip_tags(cells[1])).unwrap_or(0),
                    winner_count: parse_digits(&strip_tags(cells[2])).unwrap_or(0),
                    amount_per_winner: parse_digits(&strip_tags(cells[3])).unwrap_or(0),
                },
            ))
        })
        .collect()
}

/// Deposit balance from the "box money" section of my page.
///
/// A registered top-up account adds two right-aligned cells ahead of the
/// amounts, shifting every amount by two.
pub fn parse_balance(html: &str) -> Option<Balance> {
    let start = html.find("box money")?;
    let section = &html[start..];
    let section = section
        .find("class=\"box ")
        .map_or(section, |end| &section[..end]);

    let has_account = ACCOUNT_TABLE_RE
        .find(section)
        .is_some_and(|table| table.as_str().contains("<td"));
    let offset = if has_account { 2 } else { 0 };

    let cells: Vec<u64> = RIGHT_CELL_RE
        .captures_iter(section)
        .skip(offset + 1)
        .map(|caps| {
            caps.get(1)
                .and_then(|cell| parse_digits(&strip_tags(cell.as_str())))
                .unwrap_or(0)
        })
        .collect();
    let total = TOTAL_DEPOSIT_RE
        .captures(section)
        .and_then(|caps| parse_digits(&strip_tags(caps.get(1)?.as_str())))?;

    Some(Balance {
        total,
        available: *cells.first()?,
        reserved: cells.get(1).copied().unwrap_or(0),
        withdraw_pending: cells.get(2).copied().unwrap_or(0),
        unavailable: cells.get(3).copied().unwrap_or(0),
        monthly_total: cells.get(4).copied().unwrap_or(0),
    })
}

/// Latest Pension 720+ draw from the front-page slider: the active slide,
/// or the last one when none is marked active.
pub fn parse_pension720_result(html: &str) -> Option<PensionWinningNumbers> {
    let slides: Vec<&str> = html.split("wf720-inbox").skip(1).collect();
    let slide = slides
        .iter()
        .find(|slide| {
            slide
                .split('>')
                .next()
                .is_some_and(|class_rest| class_rest.contains("swiper-slide-active"))
        })
        .or_else(|| slides.last())?;

    let round: u32 = WF720_ROUND_RE
        .captures(slide)?
        .get(1)?
        .as_str()
        .parse()
        .ok()?;
    let draw_date = parse_draw_date(WF720_DATE_RE.captures(slide)?.get(1)?.as_str())?;

    let lists: Vec<&str> = slide.split("wf720-list").skip(1).collect();
    let first_prize = lists.first()?;
    let group: u8 = PENSION_GROUP_RE
        .captures(first_prize)?
        .get(1)?
        .as_str()
        .parse()
        .ok()?;
    let number = ball_digits(first_prize)?;
    let bonus = ball_digits(lists.get(1)?)?;

    PensionWinningNumbers::new(round, draw_date, group, number, bonus).ok()
}

// Six digit balls after the list's "rightArea" marker.
fn ball_digits(list: &str) -> Option<String> {
    let start = list.find("rightArea")?;
    let digits: String = WF_BALL_RE
        .captures_iter(&list[start..])
        .filter_map(|caps| Some(caps.get(1)?.as_str()))
        .collect();
    (digits.len() == 6).then_some(digits)
}
