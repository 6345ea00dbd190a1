mod lotto645;
mod pension720;
mod session;

use std::sync::Arc;

use lotto_core::config::Credentials;
use lotto_dhlottery::{DhLotterySession, Endpoints};
use wiremock::Mock;
use wiremock::MockServer;
use wiremock::ResponseTemplate;
use wiremock::matchers::method;
use wiremock::matchers::path;
use wiremock::matchers::query_param;

pub(crate) const LOGIN_OK: &str = include_str!("../fixtures/login_ok.html");
pub(crate) const LOGIN_FAILED: &str = include_str!("../fixtures/login_failed.html");
pub(crate) const MAIN: &str = include_str!("../fixtures/main.html");
pub(crate) const GAME645: &str = include_str!("../fixtures/game645.html");
pub(crate) const BUY_LIST: &str = include_str!("../fixtures/buy_list.html");
pub(crate) const BUY_LIST_EMPTY: &str = include_str!("../fixtures/buy_list_empty.html");
pub(crate) const LOTTO_DETAIL: &str = include_str!("../fixtures/lotto645_detail.html");
pub(crate) const PENSION_DETAIL: &str = include_str!("../fixtures/pension720_detail.html");
pub(crate) const LOTTO_RESULT: &str = include_str!("../fixtures/lotto645_result.html");
pub(crate) const MY_PAGE: &str = include_str!("../fixtures/my_page.html");

pub(crate) fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("content-type", "text/html; charset=UTF-8")
        .set_body_string(body)
}

pub(crate) fn json(body: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(body)
}

/// My page whose deposit box offers `available` KRW to spend.
pub(crate) fn my_page_with_available(available: &str) -> String {
    MY_PAGE.replace(
        "<strong>47,000</strong>",
        &format!("<strong>{available}</strong>"),
    )
}

pub(crate) fn balance_page(body: &str) -> Mock {
    Mock::given(method("GET"))
        .and(path("/userSsl.do"))
        .and(query_param("method", "myPage"))
        .respond_with(html(body))
}

pub(crate) fn credentials() -> Credentials {
    Credentials {
        username: "player".to_string(),
        password: "secret".to_string(),
    }
}

pub(crate) fn session(server: &MockServer) -> DhLotterySession {
    let endpoints = Endpoints::single_host(&server.uri()).expect("mock server URI is a base URL");
    DhLotterySession::new(endpoints, std::time::Duration::from_secs(5))
        .expect("client should build")
}

/// Mounts the two login requests, answering with `login_response`.
pub(crate) async fn mount_login(server: &MockServer, login_response: &str) {
    Mock::given(method("GET"))
        .and(path("/user.do"))
        .and(query_param("method", "login"))
        .respond_with(html("<html><form id=\"loginForm\"></form></html>"))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/userSsl.do"))
        .respond_with(html(login_response))
        .mount(server)
        .await;
}

pub(crate) async fn logged_in_session(server: &MockServer) -> Arc<DhLotterySession> {
    mount_login(server, LOGIN_OK).await;
    let session = session(server);
    session
        .login(&credentials())
        .await
        .expect("login should succeed");
    Arc::new(session)
}
