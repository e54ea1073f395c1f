//! The hook dispatcher (§4.12, boundary only): a one-shot process that reads
//! one JSON event from stdin, dispatches to the memory/index/scheduler APIs,
//! and writes one JSON response to stdout. Exit codes follow §7's policy:
//! 0 proceed, 1 non-blocking error, 2 blocking error. Never holds the store
//! open beyond this process's lifetime.

use std::io::Read;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::context::AppContext;

/// The exit code a hook invocation should terminate with.
pub enum HookExit {
    Proceed,
    NonBlocking,
    Blocking,
}

impl HookExit {
    pub fn code(&self) -> i32 {
        match self {
            Self::Proceed => 0,
            Self::NonBlocking => 1,
            Self::Blocking => 2,
        }
    }
}

/// One event read from stdin. `event` names the dispatch target; `payload`
/// is event-specific and validated by each handler.
#[derive(Debug, Deserialize)]
struct HookEvent {
    event: String,
    #[serde(default)]
    payload: Value,
}

#[derive(Debug, Serialize)]
struct HookResponse {
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Read one event from stdin, dispatch it, write one response to stdout,
/// and return the exit code the process should use.
pub async fn run(ctx: &AppContext) -> HookExit {
    let mut input = String::new();
    if let Err(err) = std::io::stdin().read_to_string(&mut input) {
        return respond_error(&format!("failed to read stdin: {err}"), HookExit::NonBlocking);
    }

    let event: HookEvent = match serde_json::from_str(&input) {
        Ok(event) => event,
        Err(err) => return respond_error(&format!("malformed event: {err}"), HookExit::NonBlocking),
    };

    match dispatch(ctx, &event).await {
        Ok(data) => {
            print_response(&HookResponse { ok: true, data: Some(data), error: None });
            HookExit::Proceed
        }
        Err(err) => respond_error(&err.to_string(), classify(&err)),
    }
}

async fn dispatch(ctx: &AppContext, event: &HookEvent) -> anyhow::Result<Value> {
    match event.event.as_str() {
        "session_start" => {
            let session_id: String = field(&event.payload, "session_id")?;
            let mode: String = field(&event.payload, "mode")?;
            let user_name: Option<String> = event
                .payload
                .get("user_name")
                .and_then(|v| serde_json::from_value(v.clone()).ok());
            let repo_root: Option<String> = event
                .payload
                .get("repo_root")
                .and_then(|v| serde_json::from_value(v.clone()).ok());
            let repo_id = match &repo_root {
                Some(root) => matrix_core::fingerprint::lookup_context(&ctx.store, std::path::Path::new(root))
                    .await?
                    .map(|c| c.id),
                None => None,
            };
            let session = matrix_core::session::SessionContext {
                session_id,
                mode,
                started_at: chrono::Utc::now(),
                user_name,
                repo_root,
                repo_id,
            };
            matrix_core::session::save(&ctx.layout.sessions_dir(), &session)?;
            Ok(serde_json::to_value(session)?)
        }
        "session_context" => {
            let session_id: String = field(&event.payload, "session_id")?;
            let session = matrix_core::session::load(&ctx.layout.sessions_dir(), &session_id)?;
            Ok(serde_json::to_value(session)?)
        }
        "recall" => {
            let query: String = field(&event.payload, "query")?;
            let cwd = std::env::current_dir()?;
            let results = matrix_core::memory::recall(
                &ctx.store,
                &cwd,
                matrix_core::memory::RecallQuery {
                    query,
                    ..Default::default()
                },
            )
            .await?;
            Ok(serde_json::to_value(results)?)
        }
        "check_warning" => {
            let target: String = field(&event.payload, "target")?;
            let warning_type: String = field(&event.payload, "type")?;
            let warning_type: matrix_core::domain::warning::WarningType = warning_type.parse()?;
            let repo_root = matrix_core::fingerprint::find_project_root(&std::env::current_dir()?);
            let repo_id = matrix_core::fingerprint::lookup_context(&ctx.store, &repo_root)
                .await?
                .map(|c| c.id);
            let warning =
                matrix_core::memory::check_warning(&ctx.store, warning_type, &target, repo_id.as_deref())
                    .await?;
            Ok(serde_json::to_value(warning)?)
        }
        "record_failure" => {
            let error_message: String = field(&event.payload, "error_message")?;
            let failure = matrix_core::memory::record_failure(
                &ctx.store,
                matrix_core::domain::failure::NewFailure {
                    error_message,
                    ..Default::default()
                },
            )
            .await?;
            Ok(serde_json::to_value(failure)?)
        }
        other => anyhow::bail!("unknown hook event '{other}'"),
    }
}

fn field<T: serde::de::DeserializeOwned>(payload: &Value, name: &str) -> anyhow::Result<T> {
    payload
        .get(name)
        .cloned()
        .ok_or_else(|| anyhow::anyhow!("missing field '{name}'"))
        .and_then(|v| serde_json::from_value(v).map_err(Into::into))
}

/// Errors that invalidate the input itself (malformed event, unknown event,
/// bad field) are non-blocking; store/schema failures are blocking.
fn classify(err: &anyhow::Error) -> HookExit {
    if err.downcast_ref::<matrix_core::Error>().is_some() {
        HookExit::Blocking
    } else {
        HookExit::NonBlocking
    }
}

fn respond_error(message: &str, exit: HookExit) -> HookExit {
    print_response(&HookResponse { ok: false, data: None, error: Some(message.to_string()) });
    exit
}

fn print_response(response: &HookResponse) {
    match serde_json::to_string(response) {
        Ok(json) => println!("{json}"),
        Err(_) => println!(r#"{{"ok":false,"error":"failed to serialize response"}}"#),
    }
}
