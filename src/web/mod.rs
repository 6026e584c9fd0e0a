//! Embedded web page for medform.
//!
//! Provides a lightweight HTTP server (sync, via `tiny_http`) that serves:
//! - A single-page UI with the four prediction forms and the theme toggle
//! - JSON API endpoints for form submission, the theme preference and the
//!   backend model list
//!
//! Launched via `medform web` (default: `http://127.0.0.1:9747`).

mod api;
mod frontend;

use std::io::Cursor;
use std::sync::Arc;

use anyhow::{Context, Result};
use tiny_http::{Header, Method, Response, Server, StatusCode};

use crate::client::{PredictClient, Predictor};
use crate::config::{LoggingConfig, MedformConfig};
use crate::storage::{self, LocalStorage};

/// Everything a request handler needs.
pub struct WebContext {
    pub client: PredictClient,
    pub predictor: Arc<dyn Predictor>,
    pub storage: Box<dyn LocalStorage>,
    pub logging: LoggingConfig,
}

impl WebContext {
    /// Context backed by the configured backend and local storage.
    pub fn from_config(config: &MedformConfig) -> Self {
        let client = PredictClient::from_config(&config.backend);
        Self {
            predictor: Arc::new(client.clone()),
            client,
            storage: storage::open(config),
            logging: config.logging.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Server entry point
// ---------------------------------------------------------------------------

/// Start the web server on the given address.
///
/// Blocks the current thread. Handles requests sequentially (sufficient for
/// a local single-user page). Gracefully handles errors per-request without
/// crashing the server.
pub fn serve(config: &MedformConfig, addr: &str) -> Result<()> {
    let server = Server::http(addr)
        .map_err(|e| anyhow::anyhow!("failed to start HTTP server on {addr}: {e}"))?;

    println!("medform running at http://{addr}");
    println!("Backend: {}", config.backend.url);
    println!("Press Ctrl+C to stop.\n");

    if config.web.open_browser {
        let _ = open_browser(&format!("http://{addr}"));
    }

    run(server, WebContext::from_config(config));
    Ok(())
}

/// Answer requests from `server` until it shuts down.
pub fn run(server: Server, mut ctx: WebContext) {
    for mut request in server.incoming_requests() {
        let method = request.method().clone();
        let url = request.url().to_string();

        // Read body up-front for methods that carry one
        let body = if matches!(method, Method::Put | Method::Post | Method::Patch) {
            let mut buf = String::new();
            let _ = request.as_reader().read_to_string(&mut buf);
            Some(buf)
        } else {
            None
        };

        let result = dispatch(&mut ctx, &method, &url, body.as_deref());

        let status = match result {
            Ok(resp) => {
                let status = resp.status_code().0;
                let _ = request.respond(resp);
                status
            }
            Err(e) => {
                let resp = error_response(500, &format!("{e:#}"));
                let _ = request.respond(resp);
                500
            }
        };

        // Brief access log
        println!(
            "{} {} {} {}",
            method,
            url,
            status,
            chrono::Local::now().format("%H:%M:%S")
        );
    }
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Dispatch an incoming request to the appropriate handler.
fn dispatch(
    ctx: &mut WebContext,
    method: &Method,
    url: &str,
    body: Option<&str>,
) -> Result<Response<Cursor<Vec<u8>>>> {
    // Strip query string for path matching
    let path = url.split('?').next().unwrap_or(url);

    match (method, path) {
        // Frontend
        (&Method::Get, "/") | (&Method::Get, "/index.html") => Ok(serve_frontend()),

        // API: Forms
        (&Method::Get, "/api/forms") => api::get_forms(),
        (&Method::Post, p) if p.starts_with("/api/submit/") => {
            let name = &p["/api/submit/".len()..];
            api::post_submit(ctx, name, body.unwrap_or("{}"))
        }

        // API: Theme
        (&Method::Get, "/api/theme") => api::get_theme(ctx),
        (&Method::Put, "/api/theme") => api::put_theme(ctx, body.unwrap_or("{}")),

        // API: Backend
        (&Method::Get, "/api/models") => api::get_models(ctx),

        // 404
        _ => Ok(not_found()),
    }
}

// ---------------------------------------------------------------------------
// Response helpers
// ---------------------------------------------------------------------------

/// Serve the single-page frontend.
fn serve_frontend() -> Response<Cursor<Vec<u8>>> {
    Response::from_data(frontend::index_html().into_bytes())
        .with_header(content_type_html())
        .with_status_code(StatusCode(200))
}

/// 404 response.
fn not_found() -> Response<Cursor<Vec<u8>>> {
    error_response(404, "not found")
}

/// JSON `{"error": ...}` response with the given status.
pub(crate) fn error_response(status: u16, message: &str) -> Response<Cursor<Vec<u8>>> {
    let body = serde_json::json!({ "error": message }).to_string();
    Response::from_data(body.into_bytes())
        .with_header(content_type_json())
        .with_status_code(StatusCode(status))
}

/// JSON content type header.
pub(crate) fn content_type_json() -> Header {
    Header::from_bytes("Content-Type", "application/json; charset=utf-8").unwrap()
}

/// HTML content type header.
fn content_type_html() -> Header {
    Header::from_bytes("Content-Type", "text/html; charset=utf-8").unwrap()
}

/// Attempt to open a URL in the system default browser.
fn open_browser(url: &str) -> Result<()> {
    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/C", "start", url])
            .spawn()
            .context("failed to open browser")?;
    }

    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open")
            .arg(url)
            .spawn()
            .context("failed to open browser")?;
    }

    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open")
            .arg(url)
            .spawn()
            .context("failed to open browser")?;
    }

    Ok(())
}
