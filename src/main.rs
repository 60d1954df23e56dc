//! Arbiter service binary.
//!
//! Wires the throttled API client to the tournament chat poller and drains
//! the alert channel into the log. The dashboard process embeds the library
//! instead and renders the alerts; this binary is what runs in staging and
//! what moderators tail when the UI is down.

use anyhow::Result;

use arbiter::core::{config, logging};
use arbiter::{start_poller, ApiClient, TimeoutGate};

#[tokio::main]
async fn main() -> Result<()> {
    logging::init_logger(config::LOG_FILE_PATH.as_str())?;
    logging::log_api_configuration();

    let api = ApiClient::new()?;
    let gate = TimeoutGate::new();
    let mut alerts = start_poller(api, gate);

    loop {
        tokio::select! {
            maybe_alert = alerts.recv() => {
                match maybe_alert {
                    Some(alert) => {
                        log::info!(
                            "[{}] {} in '{}': score {:.1} ({:?}){}",
                            alert.classified.top_category().map(|c| c.as_str()).unwrap_or("-"),
                            alert.username,
                            alert.tournament_name,
                            alert.classified.total,
                            alert.classified.lang,
                            match alert.timeout {
                                Some(outcome) => format!(", timeout {outcome:?}"),
                                None => String::new(),
                            }
                        );
                    }
                    None => {
                        log::error!("Poller stopped unexpectedly");
                        break;
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                log::info!("Shutting down");
                break;
            }
        }
    }

    Ok(())
}
