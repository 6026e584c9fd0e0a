//! JSON API handlers for the web page.
//!
//! Each handler corresponds to an API endpoint and returns a
//! `Response<Cursor<Vec<u8>>>` with JSON content.

use std::io::Cursor;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tiny_http::{Response, StatusCode};

use crate::controller::pipeline;
use crate::form::{FieldSpec, FormKind, RawFields};
use crate::render;
use crate::theme::{self, Theme};

use super::{WebContext, content_type_json, error_response};

// ---------------------------------------------------------------------------
// JSON response types
// ---------------------------------------------------------------------------

/// One entry of `GET /api/forms`.
#[derive(Serialize)]
struct FormInfo {
    name: &'static str,
    title: &'static str,
    model_id: &'static str,
    result_region: String,
    probabilities_region: String,
    coercion: &'static str,
    fields: &'static [FieldSpec],
}

/// Theme API response.
#[derive(Serialize)]
struct ThemeResponse {
    theme: Theme,
    /// Only set on writes: whether storage accepted the value.
    #[serde(skip_serializing_if = "Option::is_none")]
    persisted: Option<bool>,
}

/// `PUT /api/theme` body.
#[derive(Deserialize)]
struct ThemeUpdateRequest {
    theme: Theme,
}

#[derive(Serialize)]
struct ModelsResponse {
    backend: String,
    models: Vec<String>,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Build a JSON success response.
fn json_response<T: Serialize>(data: &T) -> Result<Response<Cursor<Vec<u8>>>> {
    let body = serde_json::to_string(data).context("failed to serialize JSON response")?;
    Ok(Response::from_data(body.into_bytes())
        .with_header(content_type_json())
        .with_status_code(StatusCode(200)))
}

/// Read a submission body (`{"field": value, ...}`) as raw string fields.
///
/// Values arrive as strings from the page; anything else is stringified the
/// way a browser form would.
fn parse_raw_fields(body: &str) -> Result<RawFields> {
    let value: Value = serde_json::from_str(body).context("invalid JSON in submission")?;
    let Value::Object(map) = value else {
        anyhow::bail!("submission must be a JSON object of field values");
    };

    Ok(map
        .into_iter()
        .map(|(name, value)| {
            let text = match value {
                Value::String(s) => s,
                Value::Null => String::new(),
                other => render::js_string(&other),
            };
            (name, text)
        })
        .collect())
}

// ---------------------------------------------------------------------------
// API Handlers
// ---------------------------------------------------------------------------

/// `GET /api/forms`: the form catalog.
pub fn get_forms() -> Result<Response<Cursor<Vec<u8>>>> {
    let forms: Vec<FormInfo> = FormKind::ALL
        .into_iter()
        .map(|kind| FormInfo {
            name: kind.name(),
            title: kind.title(),
            model_id: kind.model_id(),
            result_region: kind.result_region_id(),
            probabilities_region: kind.probabilities_region_id(),
            coercion: kind.coercion_summary(),
            fields: kind.fields(),
        })
        .collect();

    json_response(&forms)
}

/// `POST /api/submit/{form}`: run one submission server-side.
pub fn post_submit(
    ctx: &mut WebContext,
    name: &str,
    body: &str,
) -> Result<Response<Cursor<Vec<u8>>>> {
    let Some(form) = FormKind::from_name(name) else {
        return Ok(error_response(404, &format!("unknown form '{name}'")));
    };
    let raw = parse_raw_fields(body)?;

    let submission = pipeline::submit_once(ctx.predictor.as_ref(), form, &raw, &ctx.logging);
    json_response(&submission)
}

/// `GET /api/theme`: the stored theme preference.
pub fn get_theme(ctx: &WebContext) -> Result<Response<Cursor<Vec<u8>>>> {
    json_response(&ThemeResponse {
        theme: theme::load_preference(ctx.storage.as_ref()),
        persisted: None,
    })
}

/// `PUT /api/theme`: persist a theme.
///
/// Expects JSON body: `{ "theme": "dark" }`. A storage failure is reported
/// as `persisted: false`, never as an error.
pub fn put_theme(ctx: &mut WebContext, body: &str) -> Result<Response<Cursor<Vec<u8>>>> {
    let req: ThemeUpdateRequest =
        serde_json::from_str(body).context("invalid JSON in theme update request")?;

    let persisted = theme::persist_preference(ctx.storage.as_mut(), req.theme);
    json_response(&ThemeResponse {
        theme: req.theme,
        persisted: Some(persisted),
    })
}

/// `GET /api/models`: the backend's model list.
pub fn get_models(ctx: &WebContext) -> Result<Response<Cursor<Vec<u8>>>> {
    let models = ctx
        .client
        .list_models()
        .context("failed to list backend models")?;

    json_response(&ModelsResponse {
        backend: ctx.client.base_url().to_string(),
        models,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
