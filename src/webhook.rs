//! Push event parsing and the branch routing decision.

use serde::Deserialize;
use serde_json::Value;

use crate::registry::{Registry, Target};

pub const EVENT_HEADER: &str = "X-GitHub-Event";
pub const SIGNATURE_HEADER: &str = "X-Hub-Signature-256";
pub const PUSH_EVENT: &str = "push";

/// An accepted deployment: the target plus the branch that triggered it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deployment {
    pub target: Target,
    pub branch: String,
}

/// What to do with a request whose signature has already been accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// Not a push event. Dropped silently.
    Ignored { event_type: Option<String> },
    /// Push event without a usable `ref`. Carries the raw value, if any.
    MissingRef { raw_ref: Option<String> },
    /// Push to a branch with no configured target.
    Skipped { branch: String },
    Deploy(Deployment),
}

/// Form-encoded delivery: either the JSON document in `payload` or bare fields.
#[derive(Debug, Default, Deserialize)]
struct FormBody {
    payload: Option<String>,
    #[serde(rename = "ref")]
    git_ref: Option<String>,
}

fn ref_from_json(payload: &Value) -> Option<String> {
    payload.get("ref").and_then(|r| r.as_str()).map(str::to_owned)
}

/// Extracts the `ref` field from a JSON or form-encoded body.
pub fn extract_ref(body: &[u8]) -> Option<String> {
    if let Ok(payload) = serde_json::from_slice::<Value>(body) {
        return ref_from_json(&payload);
    }

    let form: FormBody = serde_urlencoded::from_bytes(body).ok()?;
    match form.payload {
        Some(payload) => ref_from_json(&serde_json::from_str(&payload).ok()?),
        None => form.git_ref,
    }
}

/// Branch name of a ref: everything after the final `/`.
///
/// `refs/heads/main` gives `main`; a ref without slashes is its own branch.
pub fn branch_from_ref(git_ref: &str) -> Option<&str> {
    let branch = git_ref.rsplit('/').next().unwrap_or(git_ref);
    (!branch.is_empty()).then_some(branch)
}

/// Decides whether the event triggers a deployment.
pub fn route(registry: &Registry, event_type: Option<&str>, body: &[u8]) -> Dispatch {
    if event_type != Some(PUSH_EVENT) {
        return Dispatch::Ignored {
            event_type: event_type.map(str::to_owned),
        };
    }

    let raw_ref = extract_ref(body);
    let branch = match raw_ref.as_deref().and_then(branch_from_ref) {
        Some(branch) => branch.to_owned(),
        None => return Dispatch::MissingRef { raw_ref },
    };

    match registry.lookup(&branch) {
        Some(target) => Dispatch::Deploy(Deployment { target, branch }),
        None => Dispatch::Skipped { branch },
    }
}
