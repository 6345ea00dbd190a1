//! Vendor URLs
//!
//! The site is split over three hosts: `www` (login, ledger, results),
//! `ol` (Lotto 6/45 orders) and `el` (Pension 720+ orders). Tests point all
//! three at one mock server with [`Endpoints::single_host`].

use lotto_core::{LottoError, Result};
use url::Url;

const WWW_BASE: &str = "https://www.dhlottery.co.kr";
const OL_BASE: &str = "https://ol.dhlottery.co.kr";
const EL_BASE: &str = "https://el.dhlottery.co.kr";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    www: Url,
    ol: Url,
    el: Url,
}

impl Default for Endpoints {
    #[allow(clippy::expect_used)]
    fn default() -> Self {
        Self {
            www: Url::parse(WWW_BASE).expect("valid www base URL"),
            ol: Url::parse(OL_BASE).expect("valid ol base URL"),
            el: Url::parse(EL_BASE).expect("valid el base URL"),
        }
    }
}

fn parse_base(base: &str) -> Result<Url> {
    let url = Url::parse(base)
        .map_err(|err| LottoError::invalid_input("base_url", format!("{base}: {err}")))?;
    if url.cannot_be_a_base() {
        return Err(LottoError::invalid_input(
            "base_url",
            format!("{base} cannot be used as a base URL"),
        ));
    }
    Ok(url)
}

impl Endpoints {
    /// Serve every host from `base`, e.g. a local mock server.
    pub fn single_host(base: &str) -> Result<Self> {
        let url = parse_base(base)?;
        Ok(Self {
            www: url.clone(),
            ol: url.clone(),
            el: url,
        })
    }

    fn at(base: &Url, path_and_query: &str) -> String {
        format!(
            "{}{}",
            base.as_str().trim_end_matches('/'),
            path_and_query
        )
    }

    pub fn login_page(&self) -> String {
        Self::at(&self.www, "/user.do?method=login")
    }

    pub fn login_action(&self) -> String {
        Self::at(&self.www, "/userSsl.do?method=login")
    }

    /// Front page; carries the latest drawn Lotto round and the Pension
    /// 720+ result slider.
    pub fn main_page(&self) -> String {
        Self::at(&self.www, "/common.do?method=main")
    }

    /// My page; carries the deposit balance box.
    pub fn balance_page(&self) -> String {
        Self::at(&self.www, "/userSsl.do?method=myPage")
    }

    /// Purchase ledger list, filtered by product code and date range.
    pub fn buy_list(&self) -> String {
        Self::at(&self.www, "/myPage.do?method=lottoBuyList")
    }

    pub fn lotto645_detail(&self) -> String {
        Self::at(&self.www, "/myPage.do?method=lotto645Detail")
    }

    pub fn pension720_detail(&self) -> String {
        Self::at(&self.www, "/myPage.do?method=lotto720Detail")
    }

    pub fn lotto645_result(&self) -> String {
        Self::at(&self.www, "/gameResult.do?method=byWin")
    }

    pub fn lotto645_game(&self) -> String {
        Self::at(&self.ol, "/olotto/game/game645.do")
    }

    pub fn ready_socket(&self) -> String {
        Self::at(&self.ol, "/olotto/game/egovUserReadySocket.json")
    }

    pub fn exec_buy(&self) -> String {
        Self::at(&self.ol, "/olotto/game/execBuy.do")
    }

    pub fn pension720_game(&self) -> String {
        Self::at(&self.el, "/game_mobile/pension720/game.jsp")
    }

    pub fn pension720_auto_number(&self) -> String {
        Self::at(&self.el, "/makeAutoNo.do")
    }

    pub fn pension720_buy(&self) -> String {
        Self::at(&self.el, "/connPro.do")
    }
}
