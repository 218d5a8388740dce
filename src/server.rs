use crate::config::Config;
use crate::{database, routes, state};
use tokio::{net::TcpListener, signal, task::JoinSet};
use tokio_util::sync::CancellationToken;

/// Serves the API on `bind` until Ctrl+C or SIGTERM.
pub async fn run_until_done(config: &Config, bind: TcpListener) -> anyhow::Result<()> {
    let mut join_set: JoinSet<anyhow::Result<()>> = JoinSet::new();
    let shutdown_signal = CancellationToken::new();
    let pool = database::connect(&config.storage.database_location()).await?;
    // axum serve
    {
        let shutdown_signal = shutdown_signal.clone();
        let state = state::AppState::build(pool.clone(), config);
        join_set.spawn(async move {
            let app = routes::build(state);
            axum::serve(bind, app.into_make_service())
                .with_graceful_shutdown(async move {
                    shutdown_signal.cancelled().await;
                })
                .await?;
            Ok::<(), anyhow::Error>(())
        });
    }
    // register ctrl+c signal
    {
        let shutdown_signal = shutdown_signal.clone();
        join_set.spawn(async move {
            let _ = signal::ctrl_c().await;
            tracing::debug!("Received Ctrl+C, start terminating");
            shutdown_signal.cancel();
            Ok::<(), anyhow::Error>(())
        });
    }
    #[cfg(unix)]
    {
        let shutdown_signal = shutdown_signal.clone();
        join_set.spawn(async move {
            let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())?;
            sigterm.recv().await;
            tracing::debug!("Received SIGTERM signal, start terminating");
            shutdown_signal.cancel();
            Ok::<(), anyhow::Error>(())
        });
    }
    while let Some(r) = join_set.join_next().await {
        if shutdown_signal.is_cancelled() {
            join_set.shutdown().await;
            break;
        }
        match r {
            Ok(Ok(())) => (),
            Ok(Err(e)) => return Err(e),
            Err(e) => anyhow::bail!("Internal error in spawn: {e}"),
        }
    }
    pool.close().await;
    tracing::info!("Shutdown complete");
    Ok(())
}
