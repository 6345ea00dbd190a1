use std::sync::Arc;
use std::time::Duration;

use lotto_core::config::AppConfig;
use lotto_core::{LottoError, Result};
use lotto_dhlottery::{DhLotterySession, Endpoints};

/// Build the vendor session from `config` and log in.
pub(crate) async fn open(config: &AppConfig) -> Result<Arc<DhLotterySession>> {
    let credentials = config
        .credentials()
        .map_err(|err| LottoError::invalid_input("credentials", err.to_string()))?;

    let endpoints = match &config.base_url {
        Some(base) => Endpoints::single_host(base)?,
        None => Endpoints::default(),
    };
    let session = DhLotterySession::new(endpoints, Duration::from_secs(config.timeout_secs))?
        .with_artifacts_dir(config.artifacts_dir.clone());

    session.login(credentials).await?;
    Ok(Arc::new(session))
}
