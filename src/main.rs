//! Mentavo tutor entry point.
//!
//! Startup sequence:
//!   1. Load .env (if present)
//!   2. Load config
//!   3. Init logger at the configured level
//!   4. Open the JSON store and wire the tutor service
//!   5. Spawn the comms channels; Ctrl-C cancels them

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use mentavo_tutor::{
    comms, config,
    error::AppError,
    logger,
    store::{JsonStore, StoreHandle},
    tutor::TutorService,
};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), AppError> {
    // .env is optional.
    let _ = dotenvy::dotenv();

    let config = config::load()?;
    logger::init(&config.log_level)?;

    info!(
        tutor_name = %config.tutor_name,
        data_dir = %config.data_dir.display(),
        log_level = %config.log_level,
        prompt_style = %config.prompt_style,
        provider = %config.llm.provider,
        "config loaded"
    );

    let store = StoreHandle::new(Arc::new(JsonStore::open(config.data_dir.clone())?));
    let service = TutorService::from_config(&config, store)?;

    let shutdown = CancellationToken::new();
    let ctrl_c = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("ctrl-c received, shutting down");
                ctrl_c.cancel();
            }
            Err(e) => warn!("cannot listen for ctrl-c: {e}"),
        }
    });

    let handle = comms::start(comms::channels(&config, &service), shutdown);
    handle.join().await?;

    info!("shutdown complete");
    Ok(())
}
