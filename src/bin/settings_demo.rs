use linkgate::settings::*;

fn main() -> anyhow::Result<()> {
    // Load settings from the default location
    let project_settings = parse_settings(None)?;
    println!("Loaded settings: {:?}", project_settings);
    println!("Rotation policy: {:?}", project_settings.token.policy());

    // Attempt to load from an invalid path (expected to fail)
    let is_err = parse_settings(Some("")).is_err();
    println!("Error on invalid path: {:?}", is_err);

    // Load from a custom path, with environment overrides applied on top
    // $ LINKGATE__TOKEN__WINDOW_HOURS=2 cargo run --bin settings_demo -- --settings=settings/dev.toml
    let cli = Cli::parse();
    let project_settings = parse_settings(cli.settings.as_deref())?;
    println!("Loaded settings: {:?}", project_settings);

    Ok(())
}
