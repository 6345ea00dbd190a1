use lotto_core::LottoError;
use pretty_assertions::assert_eq;
use wiremock::Mock;
use wiremock::MockServer;
use wiremock::ResponseTemplate;
use wiremock::matchers::body_string_contains;
use wiremock::matchers::method;
use wiremock::matchers::path;
use wiremock::matchers::query_param;

use super::*;

#[tokio::test]
async fn login_posts_credentials_and_marks_session() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user.do"))
        .respond_with(html("<html></html>"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/userSsl.do"))
        .and(body_string_contains("userId=player"))
        .and(body_string_contains("password=secret"))
        .respond_with(html(LOGIN_OK))
        .expect(1)
        .mount(&server)
        .await;

    let session = session(&server);
    session
        .login(&credentials())
        .await
        .expect("login should succeed");

    assert!(session.is_authenticated());
}

#[tokio::test]
async fn wrong_credentials_are_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user.do"))
        .respond_with(html("<html></html>"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/userSsl.do"))
        .respond_with(html(LOGIN_FAILED))
        .expect(1)
        .mount(&server)
        .await;

    let session = session(&server);
    let result = session.login(&credentials()).await;

    assert!(matches!(result, Err(LottoError::InvalidCredentials)));
    assert!(!session.is_authenticated());
}

#[tokio::test]
async fn redirect_to_login_means_session_expired() {
    let server = MockServer::start().await;
    let session = logged_in_session(&server).await;
    Mock::given(method("GET"))
        .and(path("/myPage.do"))
        .respond_with(
            ResponseTemplate::new(302).insert_header("location", "/user.do?method=login"),
        )
        .mount(&server)
        .await;

    let result = session
        .get_html(&session.endpoints().buy_list(), &[])
        .await;

    assert!(matches!(result, Err(LottoError::NotAuthenticated)));
    assert!(!session.is_authenticated());
}

#[tokio::test]
async fn client_errors_surface_as_http_errors() {
    let server = MockServer::start().await;
    let session = logged_in_session(&server).await;
    Mock::given(method("GET"))
        .and(path("/gameResult.do"))
        .and(query_param("method", "byWin"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let result = session
        .get_html(&session.endpoints().lotto645_result(), &[])
        .await;

    match result {
        Err(LottoError::Http(err)) => {
            assert_eq!(err.status(), Some(reqwest::StatusCode::NOT_FOUND));
        }
        other => panic!("expected an HTTP error, got {other:?}"),
    }
}
