//! ISP operations service.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ request id → trace → timeout → metrics → circuit breaker
//!                                                                   │
//!                                                                   ▼
//!                                                        /api/v1 (API key auth)
//!                                                  webhooks | events | circuits
//!                                                                   │
//!                                     ┌─────────────────────────────┴──────────┐
//!                                     ▼                                        ▼
//!                              webhook dispatcher                     circuit breaker
//!                         (sign, fan out, delivery log)          (Redis or local state)
//!                                     │
//!                                     ▼
//!                              subscriber endpoints
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use isp_ops::config::{load_config, IspOpsConfig};
use isp_ops::lifecycle;
use isp_ops::observability::logging::init_logging;

#[derive(Parser)]
#[command(name = "isp-ops", version, about = "Circuit breaking and webhook delivery service")]
struct Args {
    /// Path to the TOML configuration file. Defaults are used when omitted.
    #[arg(short, long, env = "ISP_OPS_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => match load_config(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Failed to load configuration from {}: {}", path.display(), e);
                return ExitCode::FAILURE;
            }
        },
        None => IspOpsConfig::default(),
    };

    if let Err(e) = init_logging(&config.observability.log_level) {
        eprintln!("Failed to initialize logging: {}", e);
        return ExitCode::FAILURE;
    }

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = ?args.config,
        bind_address = %config.listener.bind_address,
        redis = config.circuit_breaker.redis_url.is_some(),
        "isp-ops starting"
    );

    match lifecycle::run(config, args.config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Fatal error");
            ExitCode::FAILURE
        }
    }
}
