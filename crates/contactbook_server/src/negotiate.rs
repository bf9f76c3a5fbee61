//! JSON/XML content negotiation for request and response bodies.
//!
//! # Responsibility
//! - Pick the body format from `Content-Type` (requests) and `Accept`
//!   (responses).
//! - Encode and decode contact payloads in either format.
//!
//! # Invariants
//! - JSON is the default whenever a header is missing or unrecognized.
//! - Lists are wrapped as `<List><item>..</item></List>` in XML.

use axum::http::header::{ACCEPT, CONTENT_TYPE};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use contactbook_core::Contact;
use serde::de::DeserializeOwned;
use serde::Serialize;

const JSON_MEDIA_TYPE: &str = "application/json";
const XML_MEDIA_TYPE: &str = "application/xml";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyFormat {
    Json,
    Xml,
}

impl BodyFormat {
    /// Format of an incoming body, from its `Content-Type`.
    pub fn of_request(headers: &HeaderMap) -> Self {
        headers
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| {
                if is_xml_media_type(media_type(value)) {
                    Self::Xml
                } else {
                    Self::Json
                }
            })
            .unwrap_or(Self::Json)
    }

    /// Preferred response format, from `Accept`.
    ///
    /// The JSON or XML media type with the highest `q` weight wins; ties go
    /// to the earlier entry. `q=0` excludes a type. Wildcards and unknown
    /// types fall back to JSON.
    pub fn preferred_response(headers: &HeaderMap) -> Self {
        let Some(accept) = headers.get(ACCEPT).and_then(|value| value.to_str().ok()) else {
            return Self::Json;
        };

        let mut best: Option<(Self, f32)> = None;
        for entry in accept.split(',') {
            let candidate = media_type(entry);
            let format = if is_xml_media_type(candidate) {
                Self::Xml
            } else if candidate.eq_ignore_ascii_case(JSON_MEDIA_TYPE) {
                Self::Json
            } else {
                continue;
            };

            let weight = quality(entry);
            if weight <= 0.0 {
                continue;
            }
            if best.map_or(true, |(_, top)| weight > top) {
                best = Some((format, weight));
            }
        }
        best.map_or(Self::Json, |(format, _)| format)
    }

    pub fn content_type(self) -> HeaderValue {
        match self {
            Self::Json => HeaderValue::from_static(JSON_MEDIA_TYPE),
            Self::Xml => HeaderValue::from_static(XML_MEDIA_TYPE),
        }
    }

    /// Decodes a request body in this format.
    pub fn decode<T: DeserializeOwned>(self, body: &[u8]) -> Result<T, String> {
        match self {
            Self::Json => serde_json::from_slice(body).map_err(|err| err.to_string()),
            Self::Xml => {
                let text = std::str::from_utf8(body).map_err(|err| err.to_string())?;
                quick_xml::de::from_str(text).map_err(|err| err.to_string())
            }
        }
    }

    /// Encodes a response body in this format.
    pub fn encode<T: Serialize>(self, value: &T) -> Result<String, String> {
        match self {
            Self::Json => serde_json::to_string(value).map_err(|err| err.to_string()),
            Self::Xml => quick_xml::se::to_string(value).map_err(|err| err.to_string()),
        }
    }

    /// Builds a response with `status` and `value` encoded in this format.
    pub fn respond<T: Serialize>(self, status: StatusCode, value: &T) -> Response {
        match self.encode(value) {
            Ok(body) => (status, [(CONTENT_TYPE, self.content_type())], body).into_response(),
            Err(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("failed to encode response: {err}"),
            )
                .into_response(),
        }
    }
}

/// XML envelope for a page of contacts.
#[derive(Debug, Serialize)]
#[serde(rename = "List")]
pub struct ContactList<'a> {
    #[serde(rename = "item")]
    pub items: &'a [Contact],
}

/// Encodes a contact page: a bare array in JSON, a `<List>` in XML.
pub fn respond_contact_list(format: BodyFormat, contacts: &[Contact]) -> Response {
    match format {
        BodyFormat::Json => format.respond(StatusCode::OK, &contacts),
        BodyFormat::Xml => format.respond(StatusCode::OK, &ContactList { items: contacts }),
    }
}

fn media_type(value: &str) -> &str {
    value.split(';').next().unwrap_or_default().trim()
}

/// `q` parameter of one `Accept` entry; missing or malformed reads as 1.
fn quality(entry: &str) -> f32 {
    entry
        .split(';')
        .skip(1)
        .filter_map(|param| param.split_once('='))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("q"))
        .and_then(|(_, value)| value.trim().parse::<f32>().ok())
        .map_or(1.0, |value| value.clamp(0.0, 1.0))
}

fn is_xml_media_type(value: &str) -> bool {
    value.eq_ignore_ascii_case(XML_MEDIA_TYPE) || value.eq_ignore_ascii_case("text/xml")
}
