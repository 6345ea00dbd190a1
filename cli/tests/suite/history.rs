use wiremock::Mock;
use wiremock::MockServer;
use wiremock::matchers::method;
use wiremock::matchers::path;
use wiremock::matchers::query_param;

use super::*;

#[tokio::test]
async fn history_reads_the_pension_ledger() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    Mock::given(method("GET"))
        .and(path("/myPage.do"))
        .and(query_param("method", "lottoBuyList"))
        .and(query_param("lottoId", "LP72"))
        .respond_with(html("<table><tr><td>조회 결과가 없습니다.</td></tr></table>"))
        .expect(1)
        .mount(&server)
        .await;
    let dir = tempfile::tempdir().expect("tempdir");
    let config = write_config(dir.path(), &server);

    let code = run(&config, &["history", "pension", "--max", "3"]).await;

    assert_eq!(code, 0);
}

#[tokio::test]
async fn history_needs_credentials() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().expect("tempdir");
    let config = dir.path().join("weekly-lotto.toml");
    std::fs::write(&config, format!("base_url = \"{}\"\n", server.uri())).expect("write config");

    let code = run(&config, &["history", "lotto"]).await;

    assert_eq!(code, 1);
}
