/// Fires `sender` once the process receives Ctrl-C or, on unix, SIGTERM.
pub fn create_term_signal_handler(sender: tokio::sync::oneshot::Sender<()>) {
    tokio::spawn(async move {
        let ctrl_c = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("ctrl-c signal error: {e}");
                std::future::pending::<()>().await;
            }
        };

        tokio::select! {
            _ = ctrl_c => tracing::info!("got interrupt signal"),
            _ = terminate() => tracing::info!("got terminate signal"),
        }

        let _: Result<(), _> = sender.send(());
    });
}

#[cfg(not(target_os = "windows"))]
async fn terminate() {
    use tokio::signal::unix::{SignalKind, signal};

    match signal(SignalKind::terminate()) {
        Ok(mut stream) => {
            tracing::info!("register terminate signal handler");

            stream.recv().await;
        }
        Err(e) => {
            tracing::error!("signal error: {e}");
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(target_os = "windows")]
async fn terminate() {
    std::future::pending::<()>().await;
}
