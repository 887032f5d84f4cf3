//! Superhero API (`superheroapi.com`).
//!
//! The API does not allow cross-origin calls, so requests go through the
//! configured relay: the full upstream URL, key included, is percent-encoded
//! and appended to the relay prefix. With an empty relay the upstream is
//! called directly. Logical errors come back as HTTP 200 with
//! `"response": "error"`.

use super::{ApiClient, Service, SourceError};
use crate::models::Hero;
use serde::Deserialize;
use serde_json::Value;

/// Highest character id the API serves.
pub const MAX_HERO_ID: u32 = 731;

/// Character used to verify a key.
pub const PROBE_HERO_ID: u32 = 70;

const SERVICE: Service = Service::Superhero;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<Hero>,
}

fn relayed(client: &ApiClient, upstream: &str) -> String {
    let relay = &client.endpoints().relay;
    if relay.is_empty() {
        upstream.to_string()
    } else {
        format!("{}{}", relay, urlencoding::encode(upstream))
    }
}

/// Surface `"response": "error"` bodies as payload faults.
fn check_envelope(body: &Value) -> Result<(), SourceError> {
    match body.get("response").and_then(Value::as_str) {
        Some("success") => Ok(()),
        _ => {
            let message = body
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or("request was not successful");
            Err(SourceError::payload(SERVICE, message))
        }
    }
}

async fn get(client: &ApiClient, path: &str) -> Result<Value, SourceError> {
    let key = client.key(SERVICE)?;
    let upstream = format!("{}/{}/{}", client.endpoints().superhero, key, path);
    let body: Value = client.get_json(SERVICE, &relayed(client, &upstream)).await?;
    check_envelope(&body)?;
    Ok(body)
}

/// Fetch one character by id.
pub async fn by_id(client: &ApiClient, id: u32) -> Result<Hero, SourceError> {
    let body = get(client, &id.to_string()).await?;
    serde_json::from_value(body).map_err(|e| SourceError::payload(SERVICE, e.to_string()))
}

/// Every character whose name matches `query`, in API order.
pub async fn search(client: &ApiClient, query: &str) -> Result<Vec<Hero>, SourceError> {
    let path = format!("search/{}", urlencoding::encode(query));
    let body = get(client, &path).await?;
    let response: SearchResponse =
        serde_json::from_value(body).map_err(|e| SourceError::payload(SERVICE, e.to_string()))?;
    Ok(response.results)
}

/// First character whose name matches `query`.
pub async fn search_first(client: &ApiClient, query: &str) -> Result<Hero, SourceError> {
    search(client, query)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| SourceError::payload(SERVICE, format!("no hero matches \"{}\"", query)))
}

/// Verify the key by fetching a known character.
pub async fn probe(client: &ApiClient) -> Result<String, SourceError> {
    let hero = by_id(client, PROBE_HERO_ID).await?;
    Ok(format!("connected (fetched {})", hero.name))
}
