use crate::AppState;
use actix_web::{
    App, HttpRequest, HttpResponse, HttpServer,
    cookie::{Cookie, SameSite},
    get,
    http::header::ContentType,
    post, web,
};
use internal::{IgnoreReason, SettingsForm, Submission, nonce::random_token};
use tokio::select;
use tokio_util::sync::CancellationToken;

pub const PAGE_PATH: &str = "/network/settings/amu-options";
pub const SESSION_COOKIE: &str = "amu_session";

const SESSION_LEN: usize = 32;

/// Session of the request, or a new one when the browser sent none
fn session_of(req: &HttpRequest) -> (String, bool) {
    match req.cookie(SESSION_COOKIE) {
        Some(cookie) if !cookie.value().is_empty() => (cookie.value().to_string(), false),
        _ => (random_token(SESSION_LEN), true),
    }
}

fn page_response(body: String, session: &str, issued: bool) -> HttpResponse {
    let mut response = HttpResponse::Ok();
    response.content_type(ContentType::html());

    if issued {
        response.cookie(
            Cookie::build(SESSION_COOKIE, session.to_string())
                .path("/")
                .http_only(true)
                .same_site(SameSite::Strict)
                .finish(),
        );
    }

    response.body(body)
}

fn internal_error(e: anyhow::Error) -> actix_web::Error {
    tracing::error!("Error: {}", e);
    actix_web::error::ErrorInternalServerError("Settings store unavailable")
}

#[get("/network/settings/amu-options")]
/// Show the settings form
async fn show_page(req: HttpRequest, data: web::Data<AppState>) -> actix_web::Result<HttpResponse> {
    let (session, issued) = session_of(&req);

    let mut page = data.lock().await;
    page.initialize().map_err(internal_error)?;
    let body = page.render(&session, None).map_err(internal_error)?;

    Ok(page_response(body, &session, issued))
}

#[post("/network/settings/amu-options")]
/// Validate and store a submitted settings form, then show the form again
async fn update(
    req: HttpRequest,
    form: Result<web::Form<SettingsForm>, actix_web::Error>,
    data: web::Data<AppState>,
) -> actix_web::Result<HttpResponse> {
    let (session, issued) = session_of(&req);

    let mut page = data.lock().await;
    page.initialize().map_err(internal_error)?;

    let submission = match form {
        // a freshly issued session cannot carry a valid nonce
        Ok(form) => page
            .handle_submission(&form, if issued { "" } else { session.as_str() })
            .map_err(internal_error)?,
        Err(e) => {
            tracing::warn!("Ignoring unreadable settings post: {}", e);
            Submission::Ignored(IgnoreReason::InvalidNonce)
        }
    };
    let body = page
        .render(&session, Some(&submission))
        .map_err(internal_error)?;

    Ok(page_response(body, &session, issued))
}

/// Mount the settings page on an app. The host is expected to put it behind its admin gate
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(show_page).service(update);
}

pub async fn webserver(
    addr: String,
    port: u16,
    app_state: AppState,
    cancel_token: CancellationToken,
) -> anyhow::Result<()> {
    let server = HttpServer::new(move || {
        let app_state = app_state.clone();
        App::new()
            .app_data(web::Data::new(app_state))
            .configure(configure)
    })
    .disable_signals()
    .bind((addr, port))?
    .run();

    let handle = server.handle();

    select! {
        result = server => result?,
        _ = cancel_token.cancelled() => {
            tracing::info!("Stopping web server");
            handle.stop(true).await;
        }
    }

    Ok(())
}
