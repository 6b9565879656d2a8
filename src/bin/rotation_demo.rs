/// Walks one owner through issue -> verify -> replay against the backend
/// named in the settings file. Useful for checking the Redis and MySQL
/// adapters by hand:
///
/// $ cargo run --bin rotation_demo -- --settings=settings/dev.toml
use chrono::Utc;
use linkgate::application_port::*;
use linkgate::domain_model::*;
use linkgate::logger::*;
use linkgate::server::Server;
use linkgate::settings::*;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let logger = Logger::new_bootstrap();
    let project_settings = parse_settings(cli.settings.as_deref())?;
    logger.reload_from_config(&LogConfig::from(&project_settings.log))?;

    let server = Server::try_new(&project_settings).await?;
    let service = server.rotation_service.clone();
    let window = service.policy().window;

    let owner: OwnerId = format!("demo-{}", nanoid::nanoid!(6)).parse()?;
    let issued = service.issue(&owner, Utc::now(), window).await?;
    info!(%owner, expires_at = %issued.expires_at, "issued");

    let verify = |token: TokenValue| VerifyInput {
        owner_id: Some(owner.clone()),
        presented_token: token,
        now: Utc::now(),
        window,
    };

    let first = service.verify_and_rotate(verify(issued.value.clone())).await;
    info!(?first, "first presentation");

    let replay = service.verify_and_rotate(verify(issued.value.clone())).await;
    info!(?replay, "replayed presentation");

    let wrong = service.verify_and_rotate(verify(TokenValue::from("not-a-token"))).await;
    info!(?wrong, "wrong token");

    let anonymous = service
        .verify_and_rotate(VerifyInput {
            owner_id: None,
            ..verify(issued.value.clone())
        })
        .await;
    info!(?anonymous, "no identity");

    server.shutdown().await;
    Ok(())
}
