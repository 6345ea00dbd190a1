use chrono::DateTime;
use chrono::TimeZone;
use chrono::Utc;
use lotto_core::LottoError;
use lotto_core::PurchaseError;
use lotto_core::PurchaseGuard;
use lotto_core::PurchaseOutcome;
use lotto_core::TicketVendor;
use lotto_core::domain::PurchaseMode;
use lotto_core::domain::Rank;
use lotto_core::domain::Slot;
use lotto_dhlottery::Lotto645Vendor;
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::Mock;
use wiremock::MockServer;
use wiremock::matchers::body_string_contains;
use wiremock::matchers::method;
use wiremock::matchers::path;
use wiremock::matchers::query_param;

use super::*;

// 2026-01-24 09:30 KST, three minutes after the fixture ticket was issued.
fn shortly_after_sale() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 24, 0, 30, 0)
        .single()
        .expect("valid timestamp")
}

async fn mount_purchase_flow(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/olotto/game/game645.do"))
        .respond_with(html(GAME645))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/olotto/game/egovUserReadySocket.json"))
        .respond_with(json(json!({ "ready_ip": "10.1.2.3" })))
        .mount(server)
        .await;
}

fn successful_order() -> serde_json::Value {
    json!({
        "result": {
            "resultCode": "100",
            "resultMsg": "SUCCESS",
            "arrGameChoiceNum": ["A|01|02|04|27|39|443"]
        }
    })
}

async fn mount_history(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/myPage.do"))
        .and(query_param("method", "lottoBuyList"))
        .and(query_param("lottoId", "LO40"))
        .respond_with(html(BUY_LIST))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/myPage.do"))
        .and(query_param("method", "lotto645Detail"))
        .and(query_param("orderNo", "1208"))
        .respond_with(html(LOTTO_DETAIL))
        .mount(server)
        .await;
    let older = LOTTO_DETAIL
        .replace("<strong>1208</strong>", "<strong>1207</strong>")
        .replace("2026/01/24 (토) 09:27:41", "2026/01/17 (토) 10:02:11");
    Mock::given(method("GET"))
        .and(path("/myPage.do"))
        .and(query_param("method", "lotto645Detail"))
        .and(query_param("orderNo", "1207"))
        .respond_with(html(&older))
        .mount(server)
        .await;
}

#[tokio::test]
async fn purchase_steps_place_one_order() {
    let server = MockServer::start().await;
    let session = logged_in_session(&server).await;
    mount_purchase_flow(&server).await;
    balance_page(MY_PAGE).expect(1).mount(&server).await;
    Mock::given(method("POST"))
        .and(path("/olotto/game/execBuy.do"))
        .and(body_string_contains("round=1208"))
        .and(body_string_contains("direct=10.1.2.3"))
        .and(body_string_contains("nBuyAmount=1000"))
        .and(body_string_contains("gameCnt=1"))
        .respond_with(json(successful_order()))
        .expect(1)
        .mount(&server)
        .await;

    let vendor = Lotto645Vendor::new(session, 1).expect("valid game count");
    vendor.navigate_to_purchase_page().await.expect("navigate");
    vendor
        .perform_auto_number_selection()
        .await
        .expect("ready socket");
    vendor.confirm_purchase().await.expect("order accepted");

    let order = vendor.last_order();
    assert_eq!(order.len(), 1);
    assert_eq!(order[0].round, 1208);
    assert_eq!(order[0].slot, Slot::A);
    assert_eq!(order[0].numbers, vec![1, 2, 4, 27, 39, 44]);
    assert_eq!(order[0].mode, PurchaseMode::Auto);
}

#[tokio::test]
async fn round_falls_back_to_front_page() {
    let server = MockServer::start().await;
    let session = logged_in_session(&server).await;
    Mock::given(method("GET"))
        .and(path("/olotto/game/game645.do"))
        .respond_with(html("<html><body>loading</body></html>"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/common.do"))
        .and(query_param("method", "main"))
        .respond_with(html(MAIN))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/olotto/game/egovUserReadySocket.json"))
        .respond_with(json(json!({ "ready_ip": "10.1.2.3" })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/olotto/game/execBuy.do"))
        .and(body_string_contains("round=1208"))
        .respond_with(json(successful_order()))
        .expect(1)
        .mount(&server)
        .await;

    let vendor = Lotto645Vendor::new(session, 1).expect("valid game count");
    vendor.navigate_to_purchase_page().await.expect("navigate");
    vendor
        .perform_auto_number_selection()
        .await
        .expect("ready socket");
    vendor.confirm_purchase().await.expect("order accepted");
}

#[tokio::test]
async fn refused_order_is_a_permanent_rejection() {
    let server = MockServer::start().await;
    let session = logged_in_session(&server).await;
    mount_purchase_flow(&server).await;
    Mock::given(method("POST"))
        .and(path("/olotto/game/execBuy.do"))
        .respond_with(json(json!({
            "result": { "resultCode": "-7", "resultMsg": "insufficient deposit" }
        })))
        .mount(&server)
        .await;

    let vendor = Lotto645Vendor::new(session, 1).expect("valid game count");
    vendor.navigate_to_purchase_page().await.expect("navigate");
    vendor
        .perform_auto_number_selection()
        .await
        .expect("ready socket");
    let err = vendor
        .confirm_purchase()
        .await
        .expect_err("order should be refused");

    assert!(err.is_permanent());
    match err {
        LottoError::PurchaseRejected { code, message } => {
            assert_eq!(code, "-7");
            assert_eq!(message, "insufficient deposit");
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[tokio::test]
async fn unreadable_balance_does_not_block_the_order() {
    let server = MockServer::start().await;
    let session = logged_in_session(&server).await;
    mount_purchase_flow(&server).await;
    balance_page(MAIN).expect(1).mount(&server).await;
    Mock::given(method("POST"))
        .and(path("/olotto/game/execBuy.do"))
        .respond_with(json(successful_order()))
        .expect(1)
        .mount(&server)
        .await;

    let vendor = Lotto645Vendor::new(session, 1).expect("valid game count");
    vendor.navigate_to_purchase_page().await.expect("navigate");
    vendor
        .perform_auto_number_selection()
        .await
        .expect("ready socket");
    vendor.confirm_purchase().await.expect("order accepted");
}

#[tokio::test]
async fn order_beyond_the_deposit_is_never_sent() {
    let server = MockServer::start().await;
    let session = logged_in_session(&server).await;
    mount_purchase_flow(&server).await;
    Mock::given(method("GET"))
        .and(path("/myPage.do"))
        .and(query_param("method", "lottoBuyList"))
        .respond_with(html(BUY_LIST_EMPTY))
        .mount(&server)
        .await;
    balance_page(&my_page_with_available("3,000"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/olotto/game/execBuy.do"))
        .respond_with(json(successful_order()))
        .expect(0)
        .mount(&server)
        .await;

    let vendor = Lotto645Vendor::new(session, 5).expect("valid game count");
    let err = PurchaseGuard::new(&vendor)
        .with_clock(shortly_after_sale)
        .run(false, 5)
        .await
        .expect_err("five games cost more than the deposit");

    match err {
        PurchaseError::Action(LottoError::InsufficientBalance {
            required,
            available,
        }) => {
            assert_eq!(required, 5_000);
            assert_eq!(available, 3_000);
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[tokio::test]
async fn confirm_without_preparation_is_refused() {
    let server = MockServer::start().await;
    let session = logged_in_session(&server).await;
    let vendor = Lotto645Vendor::new(session, 1).expect("valid game count");

    let result = vendor.confirm_purchase().await;

    assert!(matches!(result, Err(LottoError::Vendor(_))));
}

#[tokio::test]
async fn history_reads_ledger_and_details() {
    let server = MockServer::start().await;
    let session = logged_in_session(&server).await;
    mount_history(&server).await;
    let vendor = Lotto645Vendor::new(session, 1).expect("valid game count");

    let latest = vendor
        .query_most_recent_ticket()
        .await
        .expect("history")
        .expect("ledger has tickets");
    assert_eq!(latest.round, 1208);
    assert_eq!(latest.slot, Slot::A);
    assert!(latest.sale_date.is_some());

    let round_1208 = vendor
        .query_tickets_in_window(Some(1208), 10)
        .await
        .expect("history");
    assert_eq!(round_1208.len(), 2);

    let everything = vendor
        .query_tickets_in_window(None, 10)
        .await
        .expect("history");
    let rounds: Vec<u32> = everything.iter().map(|t| t.round).collect();
    assert_eq!(rounds, vec![1208, 1208, 1207, 1207]);

    let capped = vendor
        .query_tickets_in_window(None, 3)
        .await
        .expect("history");
    assert_eq!(capped.len(), 3);
}

#[tokio::test]
async fn empty_ledger_has_no_recent_ticket() {
    let server = MockServer::start().await;
    let session = logged_in_session(&server).await;
    Mock::given(method("GET"))
        .and(path("/myPage.do"))
        .and(query_param("method", "lottoBuyList"))
        .respond_with(html(BUY_LIST_EMPTY))
        .mount(&server)
        .await;
    let vendor = Lotto645Vendor::new(session, 1).expect("valid game count");

    let latest = vendor.query_most_recent_ticket().await.expect("history");

    assert_eq!(latest, None);
}

#[tokio::test]
async fn winning_numbers_with_prize_table() {
    let server = MockServer::start().await;
    let session = logged_in_session(&server).await;
    Mock::given(method("GET"))
        .and(path("/gameResult.do"))
        .and(query_param("method", "byWin"))
        .respond_with(html(LOTTO_RESULT))
        .mount(&server)
        .await;
    let vendor = Lotto645Vendor::new(session, 1).expect("valid game count");

    let winning = vendor
        .fetch_latest_winning_numbers()
        .await
        .expect("result page")
        .expect("draw published");

    assert_eq!(winning.round(), 1201);
    assert_eq!(winning.bonus_number(), 37);
    assert_eq!(
        winning.prize_for(Rank::Fifth).map(|p| p.amount_per_winner),
        Some(5_000)
    );
}

#[tokio::test]
async fn unreadable_result_page_is_saved_for_inspection() {
    let server = MockServer::start().await;
    mount_login(&server, LOGIN_OK).await;
    let artifacts = tempfile::tempdir().expect("tempdir");
    let session = session(&server).with_artifacts_dir(Some(artifacts.path().to_path_buf()));
    session.login(&credentials()).await.expect("login");
    Mock::given(method("GET"))
        .and(path("/gameResult.do"))
        .respond_with(html("<html><body>maintenance</body></html>"))
        .mount(&server)
        .await;
    let vendor = Lotto645Vendor::new(std::sync::Arc::new(session), 1).expect("valid game count");

    let winning = vendor
        .fetch_latest_winning_numbers()
        .await
        .expect("request succeeds");

    assert_eq!(winning, None);
    let saved = std::fs::read_dir(artifacts.path()).expect("artifacts").count();
    assert_eq!(saved, 1);
}

#[tokio::test]
async fn guarded_purchase_is_confirmed_from_ledger() {
    let server = MockServer::start().await;
    let session = logged_in_session(&server).await;
    mount_purchase_flow(&server).await;
    Mock::given(method("POST"))
        .and(path("/olotto/game/execBuy.do"))
        .respond_with(json(successful_order()))
        .expect(1)
        .mount(&server)
        .await;
    balance_page(MY_PAGE).mount(&server).await;
    // The ledger is empty until the order goes through.
    Mock::given(method("GET"))
        .and(path("/myPage.do"))
        .and(query_param("method", "lottoBuyList"))
        .respond_with(html(BUY_LIST_EMPTY))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_history(&server).await;

    let vendor = Lotto645Vendor::new(session, 1).expect("valid game count");
    let outcome = PurchaseGuard::new(&vendor)
        .with_clock(shortly_after_sale)
        .run(false, 5)
        .await
        .expect("purchase should be verified");

    match outcome {
        PurchaseOutcome::Confirmed(ticket) => assert_eq!(ticket.round, 1208),
        other => panic!("expected a confirmed purchase, got {other:?}"),
    }
}

#[tokio::test]
async fn guarded_purchase_skips_when_ledger_already_has_this_weeks_ticket() {
    let server = MockServer::start().await;
    let session = logged_in_session(&server).await;
    mount_history(&server).await;
    Mock::given(method("POST"))
        .and(path("/olotto/game/execBuy.do"))
        .respond_with(json(successful_order()))
        .expect(0)
        .mount(&server)
        .await;

    let vendor = Lotto645Vendor::new(session, 1).expect("valid game count");
    let outcome = PurchaseGuard::new(&vendor)
        .with_clock(shortly_after_sale)
        .run(false, 5)
        .await
        .expect("run should succeed");

    assert!(matches!(outcome, PurchaseOutcome::Skipped(_)));
}
