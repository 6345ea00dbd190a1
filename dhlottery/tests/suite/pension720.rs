use lotto_core::LottoError;
use lotto_core::TicketVendor;
use lotto_core::domain::PensionMode;
use lotto_dhlottery::Pension720Vendor;
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::Mock;
use wiremock::MockServer;
use wiremock::matchers::body_string_contains;
use wiremock::matchers::method;
use wiremock::matchers::path;
use wiremock::matchers::query_param;

use super::*;

const PENSION_GAME: &str =
    "<html><body><h2>연금복권720+ <span>제 298 회</span></h2></body></html>";

async fn mount_game_page(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/game_mobile/pension720/game.jsp"))
        .respond_with(html(PENSION_GAME))
        .mount(server)
        .await;
}

#[tokio::test]
async fn purchase_uses_selected_group_and_number() {
    let server = MockServer::start().await;
    let session = logged_in_session(&server).await;
    mount_game_page(&server).await;
    Mock::given(method("POST"))
        .and(path("/makeAutoNo.do"))
        .and(body_string_contains("ROUND=298"))
        .and(body_string_contains("SEL_CLASS=4"))
        .respond_with(json(json!({ "resultCode": "100", "selNum": "765432" })))
        .expect(1)
        .mount(&server)
        .await;
    balance_page(MY_PAGE).expect(1).mount(&server).await;
    Mock::given(method("POST"))
        .and(path("/connPro.do"))
        .and(body_string_contains("BUY_NO=4765432"))
        .respond_with(json(json!({
            "resultCode": "100",
            "resultMsg": "OK",
            "saleTicket": "4765432"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let vendor = Pension720Vendor::new(session)
        .with_group(Some(4))
        .expect("valid group");
    vendor.navigate_to_purchase_page().await.expect("navigate");
    vendor
        .perform_auto_number_selection()
        .await
        .expect("auto number");
    vendor.confirm_purchase().await.expect("order accepted");
}

#[tokio::test]
async fn empty_deposit_stops_the_order() {
    let server = MockServer::start().await;
    let session = logged_in_session(&server).await;
    mount_game_page(&server).await;
    Mock::given(method("POST"))
        .and(path("/makeAutoNo.do"))
        .respond_with(json(json!({ "resultCode": "100", "selNum": "765432" })))
        .mount(&server)
        .await;
    balance_page(&my_page_with_available("0")).mount(&server).await;
    Mock::given(method("POST"))
        .and(path("/connPro.do"))
        .respond_with(json(json!({ "resultCode": "100" })))
        .expect(0)
        .mount(&server)
        .await;

    let vendor = Pension720Vendor::new(session);
    vendor.navigate_to_purchase_page().await.expect("navigate");
    vendor
        .perform_auto_number_selection()
        .await
        .expect("auto number");
    let err = vendor
        .confirm_purchase()
        .await
        .expect_err("an empty deposit cannot pay");

    assert!(err.is_permanent());
    assert!(matches!(
        err,
        LottoError::InsufficientBalance {
            required: 1_000,
            available: 0,
        }
    ));
}

#[tokio::test]
async fn malformed_auto_number_is_an_error() {
    let server = MockServer::start().await;
    let session = logged_in_session(&server).await;
    mount_game_page(&server).await;
    Mock::given(method("POST"))
        .and(path("/makeAutoNo.do"))
        .respond_with(json(json!({ "resultCode": "100", "selNum": "12" })))
        .mount(&server)
        .await;

    let vendor = Pension720Vendor::new(session);
    vendor.navigate_to_purchase_page().await.expect("navigate");
    let result = vendor.perform_auto_number_selection().await;

    assert!(matches!(result, Err(LottoError::Vendor(_))));
}

#[tokio::test]
async fn sold_out_round_is_rejected() {
    let server = MockServer::start().await;
    let session = logged_in_session(&server).await;
    mount_game_page(&server).await;
    Mock::given(method("POST"))
        .and(path("/makeAutoNo.do"))
        .respond_with(json(json!({ "resultCode": "-1", "resultMsg": "sold out" })))
        .mount(&server)
        .await;

    let vendor = Pension720Vendor::new(session);
    vendor.navigate_to_purchase_page().await.expect("navigate");
    let result = vendor.perform_auto_number_selection().await;

    assert!(matches!(result, Err(LottoError::PurchaseRejected { .. })));
}

#[tokio::test]
async fn history_reads_pension_ledger() {
    let server = MockServer::start().await;
    let session = logged_in_session(&server).await;
    Mock::given(method("GET"))
        .and(path("/myPage.do"))
        .and(query_param("method", "lottoBuyList"))
        .and(query_param("lottoId", "LP72"))
        .respond_with(html(
            "<a onclick=\"detailPop('298','11111 22222','333')\">11111</a>",
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/myPage.do"))
        .and(query_param("method", "lotto720Detail"))
        .and(query_param("orderNo", "298"))
        .respond_with(html(PENSION_DETAIL))
        .mount(&server)
        .await;

    let vendor = Pension720Vendor::new(session);
    let ticket = vendor
        .query_most_recent_ticket()
        .await
        .expect("history")
        .expect("ledger has a ticket");

    assert_eq!(ticket.round, 298);
    assert_eq!(ticket.group, 4);
    assert_eq!(ticket.number, "765432");
    assert_eq!(ticket.mode, PensionMode::Auto);
}

#[tokio::test]
async fn winning_numbers_from_front_page() {
    let server = MockServer::start().await;
    let session = logged_in_session(&server).await;
    Mock::given(method("GET"))
        .and(path("/common.do"))
        .and(query_param("method", "main"))
        .respond_with(html(MAIN))
        .mount(&server)
        .await;

    let vendor = Pension720Vendor::new(session);
    let winning = vendor
        .fetch_latest_winning_numbers()
        .await
        .expect("front page")
        .expect("draw published");

    assert_eq!(winning.round(), 298);
    assert_eq!(winning.group(), 4);
    assert_eq!(winning.number(), "765432");
}
