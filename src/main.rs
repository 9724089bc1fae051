use box_fit::api::{self, ApiState};
use box_fit::catalog::{load_catalog, reference_catalog};
use box_fit::config::{AppConfig, LoggingConfig};

#[tokio::main]
async fn main() {
    let dotenv_result = dotenvy::dotenv();

    let logging = LoggingConfig::from_env();
    tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(logging.level())
        .init();
    logging.report_rejected();

    if let Err(err) = dotenv_result {
        if !matches!(err, dotenvy::Error::Io(ref io_err) if io_err.kind() == std::io::ErrorKind::NotFound)
        {
            tracing::warn!("Could not load .env: {}", err);
        }
    }

    let app_config = AppConfig::from_env();
    let packing = app_config.packing.packing_config();

    let catalog = match app_config.catalog.path() {
        Some(path) => load_catalog(path).unwrap_or_else(|err| {
            tracing::warn!(
                path = %path.display(),
                "Could not load catalog: {}. Using reference catalog.",
                err
            );
            reference_catalog()
        }),
        None => reference_catalog(),
    };

    tracing::info!(
        boxes = catalog.len(),
        padding = packing.padding,
        parallel = packing.parallel,
        "box recommendation service starting"
    );

    let state = ApiState::new(packing, catalog);
    if let Err(err) = api::start_api_server(app_config.api, state).await {
        tracing::error!("Server stopped: {}", err);
        std::process::exit(1);
    }
}
