//! Comms: the external I/O channels that carry student messages to the
//! [`TutorService`].
//!
//! Each channel (console, HTTP) implements [`Channel`] and is spawned as an
//! independent task by [`start`].  Channels capture the service at
//! construction time; the shared [`CancellationToken`] is their only other
//! input.  Any channel error cancels the token so siblings stop too.

#[cfg(feature = "channel-axum")]
pub mod http;
#[cfg(feature = "channel-pty")]
pub mod pty;

use std::future::Future;
use std::pin::Pin;

use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::config::Config;
use crate::error::AppError;
use crate::tutor::TutorService;

/// A boxed, owned future returned by [`Channel::run`].
pub type ChannelFuture = Pin<Box<dyn Future<Output = Result<(), AppError>> + Send + 'static>>;

/// A concurrently-runnable I/O channel.
pub trait Channel: Send + 'static {
    /// Stable identifier used in log messages.
    fn id(&self) -> &str;

    /// Consume the channel and return its run loop.  Must return once
    /// `shutdown` is cancelled.
    fn run(self: Box<Self>, shutdown: CancellationToken) -> ChannelFuture;
}

/// Handle to the running channel set.
pub struct CommsHandle {
    inner: JoinHandle<Result<(), AppError>>,
}

impl CommsHandle {
    /// Wait for every channel to exit and return the first error, if any.
    pub async fn join(self) -> Result<(), AppError> {
        match self.inner.await {
            Ok(r) => r,
            Err(e) => Err(AppError::Comms(format!("comms task panicked: {e}"))),
        }
    }
}

/// Build the channels enabled in `config`.
pub fn channels(config: &Config, service: &TutorService) -> Vec<Box<dyn Channel>> {
    let mut channels: Vec<Box<dyn Channel>> = Vec::new();

    #[cfg(feature = "channel-pty")]
    {
        if config.comms.pty.enabled {
            info!("loading pty channel");
            channels.push(Box::new(pty::PtyChannel::new(
                "pty0",
                config.comms.pty.user_id.clone(),
                service.clone(),
                config.llm.mock.simulate_delay,
            )));
        }
    }

    #[cfg(feature = "channel-axum")]
    {
        if config.comms.http.enabled {
            info!(bind = %config.comms.http.bind, "loading http channel");
            channels.push(Box::new(http::HttpChannel::new(
                "http0",
                config.comms.http.bind.clone(),
                service.clone(),
            )));
        }
    }

    #[cfg(not(all(feature = "channel-pty", feature = "channel-axum")))]
    let _ = (config, service);

    channels
}

/// Spawn each channel as its own task.
///
/// Non-blocking: returns as soon as the tasks are spawned.
pub fn start(channels: Vec<Box<dyn Channel>>, shutdown: CancellationToken) -> CommsHandle {
    if channels.is_empty() {
        info!("no comms channels configured");
    }

    let inner = tokio::spawn(async move {
        let mut set: JoinSet<Result<(), AppError>> = JoinSet::new();
        for channel in channels {
            debug!(channel = %channel.id(), "spawning channel");
            set.spawn(channel.run(shutdown.clone()));
        }

        let mut first_err: Option<AppError> = None;
        while let Some(res) = set.join_next().await {
            match res {
                Err(e) => {
                    error!("channel panicked: {e}");
                    shutdown.cancel();
                    first_err.get_or_insert_with(|| AppError::Comms(format!("channel panicked: {e}")));
                }
                Ok(Err(e)) => {
                    error!("channel error: {e}");
                    shutdown.cancel();
                    first_err.get_or_insert(e);
                }
                Ok(Ok(())) => {}
            }
        }

        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    });

    CommsHandle { inner }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Finishes;
    impl Channel for Finishes {
        fn id(&self) -> &str { "ok" }
        fn run(self: Box<Self>, _shutdown: CancellationToken) -> ChannelFuture {
            Box::pin(async { Ok(()) })
        }
    }

    struct Fails;
    impl Channel for Fails {
        fn id(&self) -> &str { "bad" }
        fn run(self: Box<Self>, _shutdown: CancellationToken) -> ChannelFuture {
            Box::pin(async { Err(AppError::Comms("bind failed".into())) })
        }
    }

    struct WaitsForShutdown;
    impl Channel for WaitsForShutdown {
        fn id(&self) -> &str { "waits" }
        fn run(self: Box<Self>, shutdown: CancellationToken) -> ChannelFuture {
            Box::pin(async move {
                shutdown.cancelled().await;
                Ok(())
            })
        }
    }

    #[tokio::test]
    async fn clean_exit() {
        let handle = start(vec![Box::new(Finishes)], CancellationToken::new());
        assert!(handle.join().await.is_ok());
    }

    #[tokio::test]
    async fn error_cancels_siblings() {
        let token = CancellationToken::new();
        let handle = start(vec![Box::new(WaitsForShutdown), Box::new(Fails)], token.clone());
        let err = handle.join().await.unwrap_err();
        assert!(err.to_string().contains("bind failed"));
        assert!(token.is_cancelled());
    }

    #[tokio::test]
    async fn disabled_channels_are_skipped() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = Config::test_default(dir.path());
        let store = crate::store::StoreHandle::new(std::sync::Arc::new(
            crate::store::JsonStore::open(dir.path()).unwrap(),
        ));
        let service = TutorService::from_config(&config, store).unwrap();
        assert!(channels(&config, &service).is_empty());
    }
}
