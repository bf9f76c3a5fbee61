//! Request handlers for the contact resource.
//!
//! # Responsibility
//! - Decode path, query and body input.
//! - Call exactly one service operation per request.
//! - Encode results in the negotiated format.
//!
//! # Invariants
//! - The path `id` of PUT overrides any `id` carried in the body.
//! - Writes other than create answer `200` with an empty body.

use crate::error::ApiError;
use crate::negotiate::{respond_contact_list, BodyFormat};
use crate::{with_contact_service, AppState, CONTACTS_PATH};
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::header::{CONTENT_TYPE, LOCATION};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use contactbook_core::{
    core_version, Address, Contact, ContactId, ContactServiceError, ContactValidationError,
    PageRequest,
};
use log::info;
use serde::{Deserialize, Serialize};

const DEFAULT_PAGE_NUMBER: i64 = 1;
const OPENAPI_YAML: &str = include_str!("../openapi/openapi.yaml");

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub page: Option<i64>,
    pub name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

pub async fn healthz() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: core_version(),
    })
}

/// Serves the checked-in OpenAPI 3 description of the contact API.
pub async fn openapi() -> impl IntoResponse {
    (
        StatusCode::OK,
        [(CONTENT_TYPE, "application/yaml; charset=utf-8")],
        OPENAPI_YAML,
    )
}

/// `GET /api/contacts?page=N&name=S`
pub async fn list_contacts(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<ListParams>,
) -> Result<Response, ApiError> {
    let page = PageRequest::new(
        params.page.unwrap_or(DEFAULT_PAGE_NUMBER),
        state.page_size(),
    );
    let name = params.name.unwrap_or_default();

    let contacts = with_contact_service(&state, |service| service.list_by_name(&name, page))?;
    Ok(respond_contact_list(
        BodyFormat::preferred_response(&headers),
        &contacts,
    ))
}

/// `GET /api/contacts/{id}`
pub async fn get_contact(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<ContactId>,
) -> Result<Response, ApiError> {
    let contact = with_contact_service(&state, |service| service.find_by_id(id))?;
    Ok(BodyFormat::preferred_response(&headers).respond(StatusCode::OK, &contact))
}

/// `POST /api/contacts`
pub async fn create_contact(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    let contact = decode_body::<Contact>(&headers, &body)?.ok_or_else(|| {
        ApiError::Service(ContactServiceError::BadResource(vec![
            ContactValidationError::MissingContact,
        ]))
    })?;

    let created = with_contact_service(&state, |service| service.create(&contact))?;
    let id = created
        .id
        .ok_or_else(|| ApiError::Internal("created contact has no id".to_string()))?;
    let location = HeaderValue::from_str(&format!("{CONTACTS_PATH}/{id}"))
        .map_err(|err| ApiError::Internal(err.to_string()))?;
    info!("event=http_create module=server status=ok id={id}");

    let mut response =
        BodyFormat::preferred_response(&headers).respond(StatusCode::CREATED, &created);
    response.headers_mut().insert(LOCATION, location);
    Ok(response)
}

/// `PUT /api/contacts/{id}`
pub async fn update_contact(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<ContactId>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let mut contact = decode_body::<Contact>(&headers, &body)?.ok_or_else(|| {
        ApiError::Service(ContactServiceError::BadResource(vec![
            ContactValidationError::MissingContact,
        ]))
    })?;
    contact.id = Some(id);

    with_contact_service(&state, |service| service.update(&contact))?;
    Ok(StatusCode::OK.into_response())
}

/// `PATCH /api/contacts/{id}`
pub async fn update_address(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<ContactId>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let address = decode_body::<Address>(&headers, &body)?
        .ok_or_else(|| ApiError::BadRequest("address body is required".to_string()))?;

    with_contact_service(&state, |service| service.update_address(id, &address))?;
    Ok(StatusCode::OK.into_response())
}

/// `DELETE /api/contacts/{id}`
pub async fn delete_contact(
    State(state): State<AppState>,
    Path(id): Path<ContactId>,
) -> Result<Response, ApiError> {
    with_contact_service(&state, |service| service.delete_by_id(id))?;
    Ok(StatusCode::OK.into_response())
}

/// Decodes an optional body. An empty body or JSON `null` yields `None`.
fn decode_body<T>(headers: &HeaderMap, body: &[u8]) -> Result<Option<T>, ApiError>
where
    T: serde::de::DeserializeOwned,
{
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }

    let decoded = match BodyFormat::of_request(headers) {
        BodyFormat::Json => BodyFormat::Json.decode::<Option<T>>(body),
        BodyFormat::Xml => BodyFormat::Xml.decode::<T>(body).map(Some),
    };
    decoded.map_err(|err| ApiError::BadRequest(format!("cannot decode request body: {err}")))
}
