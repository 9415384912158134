use super::{
    error::{ApiError, Operation},
    AppState,
};
use crate::{media::MediaInfo, utils::validate_url};
use axum::{
    body::{Body, Bytes},
    extract::{rejection::BytesRejection, RawQuery, State},
    http::{
        header::{CONTENT_DISPOSITION, CONTENT_LENGTH, CONTENT_TYPE},
        HeaderMap, HeaderValue,
    },
    response::{IntoResponse, Response},
    Json,
};
use tokio_util::io::ReaderStream;
use tracing::info;

#[derive(Debug, Default)]
pub struct DownloadParams {
    url: Option<String>,
    format_id: Option<String>,
    filename: Option<String>,
    subfolder: Option<String>,
}

impl DownloadParams {
    /// Lenient query parsing: unknown keys are ignored and a repeated key keeps
    /// its last value, so a query string can never be rejected outright.
    fn from_query(query: Option<&str>) -> Self {
        let mut params = Self::default();

        for (key, value) in url::form_urlencoded::parse(query.unwrap_or_default().as_bytes()) {
            let slot = match key.as_ref() {
                "url" => &mut params.url,
                "format_id" => &mut params.format_id,
                "filename" => &mut params.filename,
                "subfolder" => &mut params.subfolder,
                _ => continue,
            };
            *slot = Some(value.into_owned());
        }

        params
    }
}

/// `POST /api/analyze/` with `url` as a form field or JSON body field.
pub async fn analyze(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<MediaInfo>, ApiError> {
    let body = body.map_err(|rejection| {
        ApiError::unreadable_body(rejection.status(), rejection.body_text())
    })?;
    let raw_url = url_from_body(&headers, &body)?;
    let url = validate_url(raw_url.as_deref().unwrap_or_default())
        .map_err(|_| ApiError::invalid_url())?;

    let info = state
        .service
        .analyze(&url)
        .await
        .map_err(|e| ApiError::from_media(e, Operation::Analyze))?;

    Ok(Json(info))
}

/// `GET /api/download/` streams the materialized file back as an attachment.
pub async fn download(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Result<Response, ApiError> {
    let params = DownloadParams::from_query(query.as_deref());
    let url = validate_url(params.url.as_deref().unwrap_or_default())
        .map_err(|_| ApiError::invalid_url())?;
    let format_id = params
        .format_id
        .as_deref()
        .filter(|id| !id.is_empty())
        .ok_or_else(ApiError::missing_format_id)?;

    let path = state
        .service
        .download(
            &url,
            format_id,
            params.subfolder.as_deref(),
            params.filename.as_deref(),
        )
        .await
        .map_err(|e| ApiError::from_media(e, Operation::Download))?;

    let file = tokio::fs::File::open(&path)
        .await
        .map_err(|e| ApiError::from_media(e.into(), Operation::Download))?;
    let length = file
        .metadata()
        .await
        .map_err(|e| ApiError::from_media(e.into(), Operation::Download))?
        .len();

    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "download.bin".to_string());
    info!("Sending {} ({} bytes)", filename, length);

    let mut headers = HeaderMap::new();
    headers.insert(
        CONTENT_TYPE,
        HeaderValue::from_static("application/octet-stream"),
    );
    headers.insert(CONTENT_LENGTH, HeaderValue::from(length));
    if let Ok(value) = HeaderValue::from_str(&content_disposition(&filename)) {
        headers.insert(CONTENT_DISPOSITION, value);
    }

    let body = Body::from_stream(ReaderStream::new(file));
    Ok((headers, body).into_response())
}

/// JSON bodies are parsed strictly; anything else is read as a urlencoded form.
fn url_from_body(headers: &HeaderMap, body: &[u8]) -> Result<Option<String>, ApiError> {
    let is_json = headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("application/json"));

    if is_json {
        let value: serde_json::Value =
            serde_json::from_slice(body).map_err(|_| ApiError::malformed_body())?;
        let object = value.as_object().ok_or_else(ApiError::malformed_body)?;
        return Ok(object
            .get("url")
            .and_then(|url| url.as_str())
            .map(|url| url.to_string()));
    }

    Ok(url::form_urlencoded::parse(body)
        .find(|(key, _)| key == "url")
        .map(|(_, value)| value.into_owned()))
}

fn content_disposition(filename: &str) -> String {
    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        ascii_filename(filename),
        urlencoding::encode(filename)
    )
}

fn ascii_filename(filename: &str) -> String {
    let sanitized: String = filename
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_' | ' ' | '(' | ')') {
                c
            } else {
                '_'
            }
        })
        .collect();

    match sanitized.trim() {
        "" => "download.bin".to_string(),
        name => name.to_string(),
    }
}
