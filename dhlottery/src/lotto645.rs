//! Lotto 6/45 on dhlottery.co.kr
//!
//! Ordering goes through the `ol` host's JSON endpoints: a ready-socket call
//! hands out the order token, `execBuy.do` places auto games for the round on
//! sale. History comes from the `www` ledger and its detail pages.

use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use chrono::Duration;
use lotto_core::domain::date::today_kst;
use lotto_core::domain::{PurchasedTicket, Slot, WinningNumbers};
use lotto_core::{LottoError, Product, Result, TicketVendor};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::LOTTO645_PRODUCT_CODE;
use crate::parse;
use crate::session::DhLotterySession;

/// Most games one order may hold.
pub const MAX_GAMES: u8 = 5;

/// Days of ledger read when looking for tickets.
pub const HISTORY_DAYS: i64 = 7;

const SUCCESS_CODE: &str = "100";

#[derive(Debug, Deserialize)]
struct ReadySocket {
    ready_ip: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BuyResponse {
    result: BuyResult,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BuyResult {
    result_code: String,
    #[serde(default)]
    result_msg: String,
    #[serde(default)]
    arr_game_choice_num: Option<Vec<String>>,
}

/// One entry of the order's `param` JSON.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GameRequest {
    gen_type: &'static str,
    arr_game_choice_num: Option<String>,
    alpabet: &'static str,
}

/// State carried from one purchase step to the next.
#[derive(Debug, Default, Clone)]
struct PendingOrder {
    round: Option<u32>,
    ready_ip: Option<String>,
}

pub struct Lotto645Vendor {
    session: Arc<DhLotterySession>,
    games: u8,
    pending: Mutex<PendingOrder>,
    last_order: Mutex<Vec<PurchasedTicket>>,
}

impl Lotto645Vendor {
    /// Vendor buying `games` auto games (1..=5) per order.
    pub fn new(session: Arc<DhLotterySession>, games: u8) -> Result<Self> {
        if !(1..=MAX_GAMES).contains(&games) {
            return Err(LottoError::invalid_input(
                "games",
                format!("{games} is outside 1..={MAX_GAMES}"),
            ));
        }
        Ok(Self {
            session,
            games,
            pending: Mutex::new(PendingOrder::default()),
            last_order: Mutex::new(Vec::new()),
        })
    }

    pub fn games(&self) -> u8 {
        self.games
    }

    /// Games the last successful order returned.
    pub fn last_order(&self) -> Vec<PurchasedTicket> {
        self.last_order
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn pending(&self) -> std::sync::MutexGuard<'_, PendingOrder> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Round on sale: the purchase page's own label, else the front page's
    /// latest draw + 1.
    async fn current_round(&self, purchase_page: &str) -> Result<u32> {
        if let Some(round) = parse::parse_sale_round(purchase_page) {
            return Ok(round);
        }

        let main = self
            .session
            .get_html(&self.session.endpoints().main_page(), &[])
            .await?;
        match parse::parse_current_round(&main) {
            Some(round) => Ok(round),
            None => {
                self.session.dump_page("lotto645-round", &main).await;
                Err(LottoError::unexpected_page("reading the Lotto 6/45 round"))
            }
        }
    }

    fn buy_param(&self) -> Result<String> {
        let games: Vec<GameRequest> = Slot::ALL
            .iter()
            .take(usize::from(self.games))
            .map(|slot| GameRequest {
                gen_type: "0",
                arr_game_choice_num: None,
                alpabet: slot.as_str(),
            })
            .collect();
        serde_json::to_string(&games).map_err(|err| LottoError::Parse {
            what: "order parameters",
            value: err.to_string(),
        })
    }

    async fn fetch_detail(&self, summary: &parse::PurchaseSummary) -> Result<Vec<PurchasedTicket>> {
        let html = self
            .session
            .get_html(
                &self.session.endpoints().lotto645_detail(),
                &[
                    ("orderNo", summary.order_no.clone()),
                    ("barcode", summary.barcode.clone()),
                    ("issueNo", summary.issue_no.clone()),
                ],
            )
            .await?;

        let tickets = parse::parse_lotto645_detail(&html);
        if tickets.is_empty() {
            warn!(order_no = %summary.order_no, "detail page had no games");
            self.session.dump_page("lotto645-detail", &html).await;
        }
        Ok(tickets)
    }
}

/// Ledger query for the last [`HISTORY_DAYS`] days of one product.
pub(crate) fn ledger_query(product_code: &str) -> Vec<(&'static str, String)> {
    let today = today_kst();
    let start = today - Duration::days(HISTORY_DAYS);
    vec![
        ("searchStartDate", start.format("%Y%m%d").to_string()),
        ("searchEndDate", today.format("%Y%m%d").to_string()),
        ("lottoId", product_code.to_string()),
        ("nowPage", "1".to_string()),
    ]
}

#[async_trait]
impl TicketVendor for Lotto645Vendor {
    type Ticket = PurchasedTicket;
    type Winning = WinningNumbers;

    fn product(&self) -> Product {
        Product::Lotto645
    }

    async fn navigate_to_purchase_page(&self) -> Result<()> {
        self.session.require_auth()?;
        let page = self
            .session
            .get_html(&self.session.endpoints().lotto645_game(), &[])
            .await?;
        let round = self.current_round(&page).await?;

        info!(round, games = self.games, "Lotto 6/45 purchase page ready");
        *self.pending() = PendingOrder {
            round: Some(round),
            ready_ip: None,
        };
        Ok(())
    }

    async fn perform_auto_number_selection(&self) -> Result<()> {
        self.session.require_auth()?;
        let endpoints = self.session.endpoints();
        let socket: ReadySocket = self
            .session
            .post_form_json(&endpoints.ready_socket(), &[], &endpoints.lotto645_game())
            .await?;

        let ready_ip = socket
            .ready_ip
            .filter(|ip| !ip.trim().is_empty())
            .ok_or_else(|| LottoError::vendor("ready socket returned no ready_ip"))?;
        self.pending().ready_ip = Some(ready_ip);
        Ok(())
    }

    async fn confirm_purchase(&self) -> Result<()> {
        self.session.require_auth()?;
        let PendingOrder { round, ready_ip } = self.pending().clone();
        let (Some(round), Some(ready_ip)) = (round, ready_ip) else {
            return Err(LottoError::vendor("purchase steps ran out of order"));
        };

        let amount = u32::from(self.games) * Product::Lotto645.price_per_game();
        self.session.ensure_balance(u64::from(amount)).await?;

        let endpoints = self.session.endpoints();
        let form = [
            ("round", round.to_string()),
            ("direct", ready_ip),
            ("nBuyAmount", amount.to_string()),
            ("param", self.buy_param()?),
            ("gameCnt", self.games.to_string()),
        ];

        let response: BuyResponse = self
            .session
            .post_form_json(&endpoints.exec_buy(), &form, &endpoints.lotto645_game())
            .await?;
        *self.pending() = PendingOrder::default();

        let result = response.result;
        if result.result_code != SUCCESS_CODE {
            return Err(LottoError::PurchaseRejected {
                code: result.result_code,
                message: result.result_msg,
            });
        }

        let tickets =
            parse::parse_purchased_games(&result.arr_game_choice_num.unwrap_or_default(), round);
        for ticket in &tickets {
            info!(
                round,
                slot = %ticket.slot,
                numbers = ?ticket.numbers,
                mode = %ticket.mode,
                "Lotto 6/45 game purchased"
            );
        }
        *self
            .last_order
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = tickets;
        Ok(())
    }

    async fn query_most_recent_ticket(&self) -> Result<Option<PurchasedTicket>> {
        Ok(self.query_tickets_in_window(None, 1).await?.into_iter().next())
    }

    async fn query_tickets_in_window(
        &self,
        round: Option<u32>,
        max_count: usize,
    ) -> Result<Vec<PurchasedTicket>> {
        self.session.require_auth()?;
        let list = self
            .session
            .get_html(
                &self.session.endpoints().buy_list(),
                &ledger_query(LOTTO645_PRODUCT_CODE),
            )
            .await?;

        let mut tickets = Vec::new();
        for summary in parse::parse_purchase_list(&list) {
            if tickets.len() >= max_count {
                break;
            }
            let games = self.fetch_detail(&summary).await?;
            tickets.extend(
                games
                    .into_iter()
                    .filter(|ticket| round.is_none_or(|r| ticket.round == r)),
            );
        }
        tickets.truncate(max_count);
        Ok(tickets)
    }

    async fn fetch_latest_winning_numbers(&self) -> Result<Option<WinningNumbers>> {
        let html = self
            .session
            .get_html(&self.session.endpoints().lotto645_result(), &[])
            .await?;

        let winning = parse::parse_lotto645_result(&html);
        match &winning {
            Some(winning) => info!(
                round = winning.round(),
                numbers = ?winning.numbers(),
                bonus = winning.bonus_number(),
                "Lotto 6/45 winning numbers"
            ),
            None => {
                warn!("Lotto 6/45 result page could not be parsed");
                self.session.dump_page("lotto645-result", &html).await;
            }
        }
        Ok(winning)
    }
}
