//! Logging initialization and startup configuration checking
//!
//! Console + file logging via simplelog, plus a startup sanity pass over
//! the environment so a misconfigured deploy fails loudly in the log.

use anyhow::Result;
use simplelog::*;
use std::fs::File;

use crate::core::config;

/// Initialize logger for both console and file output
///
/// # Arguments
/// * `log_file_path` - Path to the log file
pub fn init_logger(log_file_path: &str) -> Result<()> {
    let log_file = File::create(log_file_path).map_err(|e| anyhow::anyhow!("Failed to create log file: {}", e))?;

    CombinedLogger::init(vec![
        TermLogger::new(
            LevelFilter::Info,
            Config::default(),
            TerminalMode::Mixed,
            ColorChoice::Auto,
        ),
        WriteLogger::new(LevelFilter::Info, Config::default(), log_file),
    ])
    .map_err(|e| anyhow::anyhow!("Failed to initialize logger: {}", e))?;

    Ok(())
}

/// Logs API configuration at application startup
///
/// Checks the base URL, token presence, and auto-timeout setting. A missing
/// token is not fatal (public reads still work) but mod actions will fail,
/// so say it plainly here rather than per-request later.
pub fn log_api_configuration() {
    log::info!("API base: {}", config::API_BASE.as_str());

    match config::API_TOKEN.as_deref() {
        Some(token) if !token.is_empty() => {
            log::info!("API token configured ({} chars), mod actions enabled", token.len());
        }
        _ => {
            log::warn!("ARBITER_API_TOKEN not set, mod actions (timeouts, deletions) will be rejected");
        }
    }

    if *config::AUTO_TIMEOUT {
        log::warn!(
            "Auto chat timeouts ENABLED (threshold {}, {} min per timeout)",
            config::chat::ACTION_THRESHOLD,
            config::chat::TIMEOUT_MINUTES
        );
    } else {
        log::info!("Auto chat timeouts disabled, alert-only mode");
    }
}
