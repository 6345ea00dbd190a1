//! Pension 720+ on dhlottery.co.kr
//!
//! One ticket per order. The group follows the weekday (Mon=1 .. Fri=5,
//! weekends 1) unless a fixed group is configured; the six digits are drawn
//! by the vendor's auto-number endpoint.

use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use chrono::Utc;
use lotto_core::domain::date::weekday_kst;
use lotto_core::domain::pension::{group_for_weekday, is_valid_group, is_valid_pension_number};
use lotto_core::domain::{PensionTicket, PensionWinningNumbers};
use lotto_core::{LottoError, Product, Result, TicketVendor};
use serde::Deserialize;
use tracing::{info, warn};

use crate::PENSION720_PRODUCT_CODE;
use crate::lotto645::ledger_query;
use crate::parse;
use crate::session::DhLotterySession;

const SUCCESS_CODE: &str = "100";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AutoNumberResponse {
    result_code: String,
    #[serde(default)]
    result_msg: String,
    sel_num: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BuyResponse {
    result_code: String,
    #[serde(default)]
    result_msg: String,
    sale_ticket: Option<String>,
}

#[derive(Debug, Default, Clone)]
struct PendingTicket {
    round: Option<u32>,
    group: Option<u8>,
    number: Option<String>,
}

pub struct Pension720Vendor {
    session: Arc<DhLotterySession>,
    fixed_group: Option<u8>,
    pending: Mutex<PendingTicket>,
}

impl Pension720Vendor {
    pub fn new(session: Arc<DhLotterySession>) -> Self {
        Self {
            session,
            fixed_group: None,
            pending: Mutex::new(PendingTicket::default()),
        }
    }

    /// Always buy in `group` instead of the weekday's group.
    pub fn with_group(mut self, group: Option<u8>) -> Result<Self> {
        if let Some(group) = group
            && !is_valid_group(group)
        {
            return Err(LottoError::invalid_input(
                "group",
                format!("{group} is outside 1..=5"),
            ));
        }
        self.fixed_group = group;
        Ok(self)
    }

    /// Group the next purchase uses.
    pub fn group(&self) -> u8 {
        self.fixed_group
            .unwrap_or_else(|| group_for_weekday(weekday_kst(Utc::now())))
    }

    fn pending(&self) -> std::sync::MutexGuard<'_, PendingTicket> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn fetch_detail(&self, summary: &parse::PurchaseSummary) -> Result<Vec<PensionTicket>> {
        let html = self
            .session
            .get_html(
                &self.session.endpoints().pension720_detail(),
                &[
                    ("orderNo", summary.order_no.clone()),
                    ("barcode", summary.barcode.clone()),
                    ("issueNo", summary.issue_no.clone()),
                ],
            )
            .await?;

        let tickets = parse::parse_pension720_detail(&html);
        if tickets.is_empty() {
            warn!(order_no = %summary.order_no, "detail page had no tickets");
            self.session.dump_page("pension720-detail", &html).await;
        }
        Ok(tickets)
    }
}

fn reject(code: String, message: String) -> LottoError {
    LottoError::PurchaseRejected { code, message }
}

#[async_trait]
impl TicketVendor for Pension720Vendor {
    type Ticket = PensionTicket;
    type Winning = PensionWinningNumbers;

    fn product(&self) -> Product {
        Product::Pension720
    }

    async fn navigate_to_purchase_page(&self) -> Result<()> {
        self.session.require_auth()?;
        let page = self
            .session
            .get_html(&self.session.endpoints().pension720_game(), &[])
            .await?;

        let Some(round) = parse::parse_sale_round(&page) else {
            self.session.dump_page("pension720-game", &page).await;
            return Err(LottoError::unexpected_page("reading the Pension 720+ round"));
        };

        let group = self.group();
        info!(round, group, "Pension 720+ purchase page ready");
        *self.pending() = PendingTicket {
            round: Some(round),
            group: Some(group),
            number: None,
        };
        Ok(())
    }

    async fn perform_auto_number_selection(&self) -> Result<()> {
        self.session.require_auth()?;
        let PendingTicket { round, group, .. } = self.pending().clone();
        let (Some(round), Some(group)) = (round, group) else {
            return Err(LottoError::vendor("purchase steps ran out of order"));
        };

        let endpoints = self.session.endpoints();
        let response: AutoNumberResponse = self
            .session
            .post_form_json(
                &endpoints.pension720_auto_number(),
                &[
                    ("ROUND", round.to_string()),
                    ("SEL_CLASS", group.to_string()),
                    ("BUY_CNT", "1".to_string()),
                ],
                &endpoints.pension720_game(),
            )
            .await?;

        if response.result_code != SUCCESS_CODE {
            return Err(reject(response.result_code, response.result_msg));
        }
        let number = response
            .sel_num
            .filter(|number| is_valid_pension_number(number))
            .ok_or_else(|| LottoError::vendor("auto-number response had no six-digit number"))?;

        info!(round, group, number = %number, "Pension 720+ number selected");
        self.pending().number = Some(number);
        Ok(())
    }

    async fn confirm_purchase(&self) -> Result<()> {
        self.session.require_auth()?;
        let PendingTicket {
            round,
            group,
            number,
        } = self.pending().clone();
        let (Some(round), Some(group), Some(number)) = (round, group, number) else {
            return Err(LottoError::vendor("purchase steps ran out of order"));
        };
        let amount = Product::Pension720.price_per_game();
        self.session.ensure_balance(u64::from(amount)).await?;

        let endpoints = self.session.endpoints();
        let response: BuyResponse = self
            .session
            .post_form_json(
                &endpoints.pension720_buy(),
                &[
                    ("ROUND", round.to_string()),
                    ("BUY_KIND", "01".to_string()),
                    ("BUY_NO", format!("{group}{number}")),
                    ("BUY_CNT", "1".to_string()),
                    ("BUY_SET_TYPE", "SA".to_string()),
                    ("BUY_TYPE", "A".to_string()),
                    ("AMOUNT", amount.to_string()),
                ],
                &endpoints.pension720_game(),
            )
            .await?;
        *self.pending() = PendingTicket::default();

        if response.result_code != SUCCESS_CODE {
            return Err(reject(response.result_code, response.result_msg));
        }

        info!(
            round,
            group,
            number = %number,
            sale_ticket = response.sale_ticket.as_deref().unwrap_or("-"),
            "Pension 720+ ticket purchased"
        );
        Ok(())
    }

    async fn query_most_recent_ticket(&self) -> Result<Option<PensionTicket>> {
        Ok(self.query_tickets_in_window(None, 1).await?.into_iter().next())
    }

    async fn query_tickets_in_window(
        &self,
        round: Option<u32>,
        max_count: usize,
    ) -> Result<Vec<PensionTicket>> {
        self.session.require_auth()?;
        let list = self
            .session
            .get_html(
                &self.session.endpoints().buy_list(),
                &ledger_query(PENSION720_PRODUCT_CODE),
            )
            .await?;

        let mut tickets = Vec::new();
        for summary in parse::parse_purchase_list(&list) {
            if tickets.len() >= max_count {
                break;
            }
            let found = self.fetch_detail(&summary).await?;
            tickets.extend(
                found
                    .into_iter()
                    .filter(|ticket| round.is_none_or(|r| ticket.round == r)),
            );
        }
        tickets.truncate(max_count);
        Ok(tickets)
    }

    async fn fetch_latest_winning_numbers(&self) -> Result<Option<PensionWinningNumbers>> {
        let html = self
            .session
            .get_html(&self.session.endpoints().main_page(), &[])
            .await?;

        let winning = parse::parse_pension720_result(&html);
        match &winning {
            Some(winning) => info!(
                round = winning.round(),
                group = winning.group(),
                number = winning.number(),
                bonus = winning.bonus_number(),
                "Pension 720+ winning numbers"
            ),
            None => {
                warn!("Pension 720+ result slider could not be parsed");
                self.session.dump_page("pension720-result", &html).await;
            }
        }
        Ok(winning)
    }
}
