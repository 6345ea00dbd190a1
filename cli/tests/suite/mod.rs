mod history;

use std::path::Path;

use clap::Parser;
use lotto_cli::Cli;
use wiremock::Mock;
use wiremock::MockServer;
use wiremock::ResponseTemplate;
use wiremock::matchers::method;
use wiremock::matchers::path;

pub(crate) const GAME645: &str =
    "<html><body><h2>로또 6/45 <span>제 1208 회</span></h2></body></html>";

pub(crate) fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("content-type", "text/html; charset=UTF-8")
        .set_body_string(body)
}

/// Config file pointing every vendor host at `server`.
pub(crate) fn write_config(dir: &Path, server: &MockServer) -> std::path::PathBuf {
    let path = dir.join("weekly-lotto.toml");
    let contents = format!(
        "username = \"player\"\npassword = \"secret\"\nbase_url = \"{}\"\ntimeout_secs = 5\n",
        server.uri()
    );
    std::fs::write(&path, contents).expect("write config");
    path
}

pub(crate) async fn mount_login(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/user.do"))
        .respond_with(html("<html><form id=\"loginForm\"></form></html>"))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/userSsl.do"))
        .respond_with(html("<html><body>welcome</body></html>"))
        .mount(server)
        .await;
}

/// Run `weekly-lotto --config <config> <args..>` and return the exit code.
pub(crate) async fn run(config: &Path, args: &[&str]) -> i32 {
    let config = config.to_string_lossy();
    let mut argv = vec!["weekly-lotto", "--config", config.as_ref()];
    argv.extend_from_slice(args);
    Cli::try_parse_from(argv).expect("valid arguments").run().await
}
