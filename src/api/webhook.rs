//! Webhook handler for push events

use axum::{
    body::Bytes,
    extract::State as AxumState,
    http::{HeaderMap, StatusCode},
};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::SharedState;
use crate::webhook::{Dispatch, EVENT_HEADER, SIGNATURE_HEADER, route};

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Handles the webhook POST request.
///
/// The status code depends only on the signature: 401 when a secret is
/// configured and the signature does not match, 202 otherwise. Routing and
/// the script launch happen after the response is returned.
pub async fn handle_webhook(
    AxumState(state): AxumState<SharedState>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    let signature = header(&headers, SIGNATURE_HEADER);
    if !state.verifier.verify(&body, signature) {
        error!("The signature is not valid.");
        return StatusCode::UNAUTHORIZED;
    }

    let event_type = header(&headers, EVENT_HEADER).map(str::to_owned);
    tokio::spawn(dispatch(state, event_type, body));

    StatusCode::ACCEPTED
}

/// Routes an accepted event and starts the deployment, if any.
///
/// Returns the launcher's handle when a script was started.
pub async fn dispatch(
    state: SharedState,
    event_type: Option<String>,
    body: Bytes,
) -> Option<JoinHandle<()>> {
    match route(&state.registry, event_type.as_deref(), &body) {
        Dispatch::Ignored { event_type } => {
            debug!("Ignoring {:?} event", event_type);
            None
        }
        Dispatch::MissingRef { raw_ref } => {
            error!(
                "Branch is undefined. REF: {}",
                raw_ref.as_deref().unwrap_or("(absent)")
            );
            None
        }
        Dispatch::Skipped { branch } => {
            info!("PUSH event to branch: {}. Skipped.", branch);
            None
        }
        Dispatch::Deploy(deployment) => {
            info!(
                "Starting the deployment for {}. Pulling the code from branch {}",
                deployment.target.name, deployment.branch
            );
            Some(state.launcher.launch(&deployment.target.script_path))
        }
    }
}
