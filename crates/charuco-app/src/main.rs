use charuco_app::cli::Args;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Args = argh::from_env();
    let print_config = args.print_config;
    let (config, command) = args.resolve()?;

    if print_config {
        println!("{}", config.to_json()?);
        return Ok(());
    }

    let Some(command) = command else {
        return Err("no mode given, use generate-board, capture or calibrate".into());
    };

    if let Err(e) = charuco_app::run(command, &config) {
        log::error!("{e}");
        return Err(e.into());
    }
    Ok(())
}
