use crate::reply::{JsonReply, ScriptReply, SessionReply, TextReply};
use crate::state::{AppState, ServerConfig};
use crate::upload;
use std::collections::HashMap;
use std::convert::Infallible;
use upqueue::{UploadStatusItem, UpqueueResult};
use uuid::Uuid;
use warp::http::StatusCode;
use warp::multipart::FormData;
use warp::reply::Response;
use warp::{Filter, Rejection, Reply};

pub const ROUTE: &str = "upload";
pub const SESSION_COOKIE: &str = "upqueue_session";

const BOOTSTRAP: &str = include_str!("bootstrap.js");
const PKG_PLACEHOLDER: &str = "{PKG_URL}";

/// Browser session, `fresh` until the client sends its cookie back
#[derive(Debug, Clone)]
pub struct Session {
    id: String,
    fresh: bool,
}

impl Session {
    fn cookie(&self) -> Option<String> {
        if self.fresh {
            Some(format!(
                "{}={}; Path=/; HttpOnly; SameSite=Lax",
                SESSION_COOKIE, self.id
            ))
        } else {
            None
        }
    }
}

fn session() -> impl Filter<Extract = (Session,), Error = Infallible> + Clone {
    warp::cookie::optional(SESSION_COOKIE).map(|cookie: Option<String>| match cookie {
        Some(id) if !id.is_empty() => Session { id, fresh: false },
        _ => Session {
            id: Uuid::new_v4().simple().to_string(),
            fresh: true,
        },
    })
}

fn with_state(state: AppState) -> impl Filter<Extract = (AppState,), Error = Infallible> + Clone {
    warp::any().map(move || state.clone())
}

/// Passes requests carrying a `js` query parameter
fn wants_script() -> impl Filter<Extract = (), Error = Rejection> + Clone {
    warp::query::<HashMap<String, String>>()
        .and_then(|query: HashMap<String, String>| async move {
            if query.contains_key("js") {
                Ok(())
            } else {
                Err(warp::reject::not_found())
            }
        })
        .untuple_one()
}

pub fn routes(state: AppState) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    let max_length = state.config.max_length;

    // GET /upload?js
    let script = warp::get()
        .and(warp::path(ROUTE))
        .and(warp::path::end())
        .and(wants_script())
        .and(with_state(state.clone()))
        .and_then(serve_script);

    // GET /upload
    let status = warp::get()
        .and(warp::path(ROUTE))
        .and(warp::path::end())
        .and(with_state(state.clone()))
        .and(session())
        .and_then(upload_status);

    // POST /upload
    let upload = warp::post()
        .and(warp::path(ROUTE))
        .and(warp::path::end())
        .and(with_state(state))
        .and(session())
        .and(warp::header::optional::<u64>("content-length"))
        .and(warp::multipart::form().max_length(max_length))
        .and_then(upload_files);

    script.or(status).or(upload)
}

/// Client bootstrap with the page values substituted
pub fn bootstrap_script(config: &ServerConfig) -> UpqueueResult<String> {
    let pkg_url = serde_json::to_string(&config.pkg_url)?;
    Ok(config
        .page
        .render(BOOTSTRAP)?
        .replace(PKG_PLACEHOLDER, &pkg_url))
}

async fn serve_script(state: AppState) -> Result<Response, Infallible> {
    match bootstrap_script(&state.config) {
        Ok(script) => Ok(ScriptReply::from(script).into_response()),
        Err(e) => {
            log::error!("can't render bootstrap script: {}", e);
            Ok(StatusCode::INTERNAL_SERVER_ERROR.into_response())
        }
    }
}

async fn upload_status(
    state: AppState,
    session: Session,
) -> Result<SessionReply<JsonReply<Vec<UploadStatusItem>>>, Infallible> {
    let items = state
        .sessions
        .report(&session.id, state.config.retain)
        .unwrap_or_default();

    Ok(SessionReply::new(items.into(), session.cookie()))
}

async fn upload_files(
    state: AppState,
    session: Session,
    content_length: Option<u64>,
    form: FormData,
) -> Result<SessionReply<TextReply>, Infallible> {
    let tracker = state.sessions.register(&session.id);
    log::info!("upload {} started (session {})", tracker.id(), session.id);

    upload::receive(&state, &tracker, content_length, form).await;

    Ok(SessionReply::new(
        TextReply::from(String::new()),
        session.cookie(),
    ))
}
