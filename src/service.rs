//! Supervision of the HTTP listener and the poll worker

use std::future::Future;
use std::sync::Arc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::auth::{self, Authorizer};
use crate::client::{GmailClient, ProductionGmailClient};
use crate::config::Config;
use crate::error::{GmailError, Result};
use crate::poller::Poller;
use crate::server;

/// Authorize, resolve the label, then poll until cancelled.
///
/// Authorization and label setup failures end the worker with an error.
/// Cancellation is honoured at every stage, including setup.
pub async fn run_worker(
    authorizer: Authorizer,
    config: Config,
    cancel: CancellationToken,
) -> Result<()> {
    let setup = async {
        let credential = authorizer.authorize().await?;
        let hub = auth::build_hub(&credential).await?;
        let client: Arc<dyn GmailClient> = Arc::new(ProductionGmailClient::new(hub));
        Poller::initialize(client, &config).await
    };

    let Some(poller) = until_cancelled(&cancel, setup).await? else {
        return Ok(());
    };
    info!("Auto-reply worker ready, label ID {}", poller.label_id());

    poller.run(cancel).await;
    Ok(())
}

/// Drive `task` unless `cancel` fires first, in which case `None` is returned
async fn until_cancelled<T, F>(cancel: &CancellationToken, task: F) -> Result<Option<T>>
where
    F: Future<Output = Result<T>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Ok(None),
        result = task => result.map(Some),
    }
}

async fn supervised<F>(name: &'static str, task: F) -> (&'static str, Result<()>)
where
    F: Future<Output = Result<()>>,
{
    (name, task.await)
}

async fn wait_for_shutdown_signal(cancel: CancellationToken) -> Result<()> {
    tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            signal?;
            info!("Shutdown signal received");
        }
        _ = cancel.cancelled() => {}
    }
    Ok(())
}

/// Run the HTTP listener and the poll worker side by side.
///
/// When either task ends, the shared token is cancelled so the other one
/// stops too. The first error reported wins.
pub async fn run(port: u16, authorizer: Authorizer, config: Config) -> Result<()> {
    let cancel = CancellationToken::new();
    let mut tasks = JoinSet::new();

    tasks.spawn(supervised("http server", server::serve(port, cancel.clone())));
    tasks.spawn(supervised(
        "poll worker",
        run_worker(authorizer, config, cancel.clone()),
    ));
    tasks.spawn(supervised("signal handler", wait_for_shutdown_signal(cancel.clone())));

    supervise(tasks, cancel).await
}

async fn supervise(
    mut tasks: JoinSet<(&'static str, Result<()>)>,
    cancel: CancellationToken,
) -> Result<()> {
    let mut first_error = None;

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((name, Ok(()))) => info!("{} stopped", name),
            Ok((name, Err(e))) => {
                error!("{} failed: {}", name, e);
                first_error.get_or_insert(e);
            }
            Err(e) => {
                error!("Task aborted: {}", e);
                first_error.get_or_insert(GmailError::Unknown(format!("Task aborted: {}", e)));
            }
        }
        cancel.cancel();
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
