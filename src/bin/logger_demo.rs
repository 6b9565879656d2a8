use linkgate::logger::*;

fn main() -> anyhow::Result<()> {
    let logger = Logger::new_bootstrap();
    trace!("bootstrap trace log");
    debug!("bootstrap debug log");
    info!("bootstrap info log");

    let config = LogConfig {
        filter: "linkgate=debug,warn".to_string(),
    };
    logger.reload_from_config(&config)?;
    trace!("application trace log");
    debug!("application debug log");
    info!("application info log");
    warn!("application warn log");

    // An invalid directive leaves the previous filter in place
    let bad = LogConfig {
        filter: "linkgate=loud".to_string(),
    };
    println!("Error on invalid filter: {:?}", logger.reload_from_config(&bad).is_err());

    Ok(())
}
