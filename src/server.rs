//! Loopback listener for the OAuth redirect.
//!
//! A [`CallbackServer`] owns a dedicated router and listener for one login
//! attempt. The handler and a timer race to resolve a single [`Completion`];
//! whichever gets there first decides the result, and the listener is shut
//! down before [`CallbackServer::start`] returns.

use std::{net::SocketAddr, sync::Arc, time::Duration};

use axum::{Router, routing::get};
use tokio::{
    net::TcpListener,
    sync::{Mutex, oneshot},
};

use crate::{
    api,
    error::AuthError,
    logging::Logger,
    types::{CallbackFailure, CallbackResult},
};

pub const CALLBACK_PATH: &str = "/callback";

/// How long open connections get to finish after the result is decided.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// Single-use slot for the callback result.
#[derive(Clone)]
pub struct Completion {
    sender: Arc<Mutex<Option<oneshot::Sender<CallbackResult>>>>,
}

impl Completion {
    pub(crate) fn new() -> (Self, oneshot::Receiver<CallbackResult>) {
        let (tx, rx) = oneshot::channel();
        let completion = Self {
            sender: Arc::new(Mutex::new(Some(tx))),
        };
        (completion, rx)
    }

    /// Delivers `result` if nothing was delivered yet. Returns `false` when
    /// the attempt had already been resolved.
    pub async fn complete(&self, result: CallbackResult) -> bool {
        match self.sender.lock().await.take() {
            Some(tx) => {
                let _ = tx.send(result);
                true
            }
            None => false,
        }
    }
}

pub struct CallbackServer {
    addr: String,
    path: String,
    timeout: Duration,
    shutdown_grace: Duration,
    logger: Arc<dyn Logger>,
}

impl CallbackServer {
    pub fn new(
        addr: impl Into<String>,
        path: impl Into<String>,
        timeout: Duration,
        logger: Arc<dyn Logger>,
    ) -> Self {
        Self {
            addr: addr.into(),
            path: path.into(),
            timeout,
            shutdown_grace: SHUTDOWN_GRACE,
            logger,
        }
    }

    pub fn with_shutdown_grace(mut self, grace: Duration) -> Self {
        self.shutdown_grace = grace;
        self
    }

    /// Listens until a request hits the callback path or the timeout elapses.
    ///
    /// # Errors
    ///
    /// - [`AuthError::Config`] if the address or path cannot be used
    /// - [`AuthError::PortConflict`] if the address cannot be bound; there is
    ///   no retry, another login is most likely holding the port
    pub async fn start(&self) -> Result<CallbackResult, AuthError> {
        let addr: SocketAddr = self.addr.parse().map_err(|e| {
            AuthError::Config(format!("invalid server address {}: {}", self.addr, e))
        })?;
        if !self.path.starts_with('/') {
            return Err(AuthError::Config(format!(
                "callback path must start with '/': {}",
                self.path
            )));
        }

        let listener =
            TcpListener::bind(addr)
                .await
                .map_err(|source| AuthError::PortConflict {
                    addr: self.addr.clone(),
                    source,
                })?;

        let (completion, result_rx) = Completion::new();
        let app = Router::new()
            .route(&self.path, get(api::callback))
            .with_state(completion.clone());

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let mut server = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
        });

        let timer = {
            let completion = completion.clone();
            let timeout = self.timeout;
            tokio::spawn(async move {
                tokio::time::sleep(timeout).await;
                completion
                    .complete(CallbackResult::Failed(CallbackFailure::Timeout))
                    .await;
            })
        };

        self.logger.info(format_args!(
            "Waiting for the authorization callback on http://{}{} ...",
            addr, self.path
        ));

        // `completion` still holds the sender here, so the channel cannot close early.
        let result = result_rx
            .await
            .unwrap_or(CallbackResult::Failed(CallbackFailure::Timeout));
        timer.abort();

        // The listening socket closes on the signal. Connections still open
        // after the grace period are cut off.
        let _ = shutdown_tx.send(());
        match tokio::time::timeout(self.shutdown_grace, &mut server).await {
            Ok(Ok(Ok(()))) => {}
            Ok(Ok(Err(e))) => self
                .logger
                .warn(format_args!("Callback listener stopped with an error: {}", e)),
            Ok(Err(e)) => self
                .logger
                .warn(format_args!("Callback listener task failed: {}", e)),
            Err(_) => {
                server.abort();
                self.logger.warn(format_args!(
                    "Callback listener on {} did not drain within {}ms, closing it.",
                    addr,
                    self.shutdown_grace.as_millis()
                ));
            }
        }
        self.logger
            .debug(format_args!("Callback listener on {} closed", addr));

        if result == CallbackResult::Failed(CallbackFailure::Timeout) {
            self.logger.warn(format_args!(
                "Timeout reached after {}s, shutting down the callback listener.",
                self.timeout.as_secs()
            ));
        }

        Ok(result)
    }
}
