use shopgate::config::{config_schema, load_config, DEFAULT_CONFIG_PATH};
use shopgate::startup::run;
use shopgate::utils::logger::init_logging;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    if std::env::args().any(|arg| arg == "--schema") {
        match config_schema() {
            Ok(schema) => println!("{}", schema),
            Err(e) => {
                eprintln!("Failed to render configuration schema: {}", e);
                std::process::exit(1);
            }
        }
        return;
    }

    let config_path =
        std::env::var("SHOPGATE_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let config = match load_config(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration from {}: {}", config_path, e);
            std::process::exit(1);
        }
    };

    if let Err(e) = init_logging(&config.logging) {
        eprintln!("{}", e);
        std::process::exit(1);
    }
    info!("Loaded configuration from {}", config_path);

    if let Err(e) = run(config).await {
        error!("{}", e);
        std::process::exit(1);
    }
}
