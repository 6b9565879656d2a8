use linkgate::api;
use linkgate::logger::*;
use linkgate::server::*;
use linkgate::settings::*;
use std::fs;
use std::sync::Arc;
use tokio::signal;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let logger = Logger::new_bootstrap();

    let project_settings = parse_settings(cli.settings.as_deref())?;
    info!(
        backend = %project_settings.token.backend,
        address = %project_settings.http.address,
        "settings loaded"
    );
    debug!(?project_settings);
    logger.reload_from_config(&LogConfig::from(&project_settings.log))?;

    let address: std::net::SocketAddr = project_settings.http.address.parse()?;
    let tls = project_settings.http.tls_paths()?;
    if let Some((cert_path, key_path)) = tls {
        if !fs::metadata(cert_path)?.is_file() {
            return Err(anyhow::anyhow!(
                "TLS cert is not a regular file: {:?}",
                cert_path
            ));
        }
        if !fs::metadata(key_path)?.is_file() {
            return Err(anyhow::anyhow!("TLS key is not a regular file: {:?}", key_path));
        }
    }

    let server = Arc::new(Server::try_new(&project_settings).await?);
    let routes = api::routes(server.clone());

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        signal::ctrl_c().await.expect("Could not register SIGINT");
        on_signal.cancel();
    });

    match tls {
        Some((cert_path, key_path)) => {
            info!(%address, "listening (tls)");
            warp::serve(routes)
                .tls()
                .cert_path(cert_path)
                .key_path(key_path)
                .bind_with_graceful_shutdown(address, cancel.clone().cancelled_owned())
                .1
                .await;
        }
        None => {
            info!(%address, "listening");
            let (_, serving) = warp::serve(routes)
                .try_bind_with_graceful_shutdown(address, cancel.clone().cancelled_owned())?;
            serving.await;
        }
    }

    let shutdown_timeout = std::time::Duration::from_secs(100);
    match tokio::time::timeout(shutdown_timeout, server.shutdown()).await {
        Ok(_) => info!("server shutdown successfully"),
        Err(_) => error!("server shutdown timed out"),
    }

    Ok(())
}
