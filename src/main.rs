use push_deploy::api;
use push_deploy::config::{Settings, environment, load_secret};
use push_deploy::error::{DeployError, Result};
use push_deploy::logging::{FileLogger, setup_logging};
use push_deploy::registry::Registry;
use push_deploy::shutdown::shutdown_signal;
use push_deploy::signature::SignatureVerifier;
use push_deploy::{AppState, SharedState};
use std::sync::Arc;
use tracing::{error, info, warn};

fn log_exit(code: i32) {
    info!("Terminating the deployment service. Exit code: {}", code);
}

async fn run(settings: Settings, vars: &std::collections::HashMap<String, String>) -> Result<()> {
    let registry = Registry::build(vars)?;

    if registry.is_empty() {
        warn!("No deployment targets configured. Every push will be skipped.");
    }
    info!("Listening for updates on the following branches:");
    for target in registry.targets() {
        info!(
            "  [{}] {} --> {}",
            target.name, target.branch_name, target.script_path
        );
    }

    let verifier = SignatureVerifier::new(load_secret(&settings.secret_file));
    if verifier.is_enforced() {
        info!("Webhook signatures will be verified.");
    } else {
        warn!("Running in open mode: webhook signatures are not verified.");
    }

    let state: SharedState = Arc::new(AppState::new(registry, verifier));
    let app = api::router(state);

    let bind_address = settings.bind_address();
    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    info!(
        "The Deployment service has been successfully started. Listening on {}.",
        bind_address
    );
    if let Some(label) = &settings.deployment_label {
        info!("The deployment target is: {}.", label);
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(DeployError::from)
}

#[tokio::main]
async fn main() {
    let vars = environment();

    let settings = match Settings::from_vars(&vars) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    let file_logger =
        FileLogger::new(settings.log_dir.clone()).with_max_files(settings.max_log_files);
    let guard = match setup_logging(&file_logger) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to set up logging in {:?}: {}", settings.log_dir, e);
            std::process::exit(1);
        }
    };

    let code = match run(settings, &vars).await {
        Ok(()) => 0,
        Err(e) => {
            error!("{}", e);
            1
        }
    };

    log_exit(code);
    // Flush pending log lines before exiting
    drop(guard);
    std::process::exit(code);
}
