//! NASA Astronomy Picture of the Day.

use super::{ApiClient, Service, SourceError};
use crate::models::Apod;
use chrono::NaiveDate;
use serde::Deserialize;

const SERVICE: Service = Service::Nasa;

/// `count=N` answers with an array, every other query with one object.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ApodResponse {
    Many(Vec<Apod>),
    One(Apod),
}

fn apod_url(client: &ApiClient, key: &str, extra: &str) -> String {
    format!(
        "{}/planetary/apod?api_key={}{}",
        client.endpoints().nasa,
        urlencoding::encode(key),
        extra
    )
}

async fn fetch(client: &ApiClient, extra: &str) -> Result<Apod, SourceError> {
    let key = client.key(SERVICE)?;
    let response: ApodResponse = client.get_json(SERVICE, &apod_url(client, key, extra)).await?;

    let apod = match response {
        ApodResponse::Many(items) => items
            .into_iter()
            .next()
            .ok_or_else(|| SourceError::payload(SERVICE, "empty APOD list"))?,
        ApodResponse::One(apod) => apod,
    };

    if apod.title.is_empty() && apod.url.is_empty() {
        return Err(SourceError::payload(SERVICE, "APOD entry has no title or url"));
    }

    Ok(apod)
}

/// A random picture from the archive.
pub async fn random(client: &ApiClient) -> Result<Apod, SourceError> {
    fetch(client, "&count=1").await
}

/// Today's picture.
pub async fn today(client: &ApiClient) -> Result<Apod, SourceError> {
    fetch(client, "").await
}

/// The picture published on `date`.
pub async fn on_date(client: &ApiClient, date: NaiveDate) -> Result<Apod, SourceError> {
    fetch(client, &format!("&date={}", date.format("%Y-%m-%d"))).await
}

/// Verify the key by fetching today's picture.
pub async fn probe(client: &ApiClient) -> Result<String, SourceError> {
    let apod = today(client).await?;
    Ok(format!("connected (today: {})", apod.title))
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::super::Fault;
    use super::*;
    use axum::extract::Query;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::json;
    use std::collections::HashMap;

    async fn apod(Query(params): Query<HashMap<String, String>>) -> axum::response::Response {
        if params.get("api_key").map(String::as_str) != Some("DEMO_KEY") {
            return (
                StatusCode::FORBIDDEN,
                Json(json!({"error": {"code": "API_KEY_INVALID"}})),
            )
                .into_response();
        }
        if params.contains_key("count") {
            return Json(json!([{"title": "Random Nebula", "url": "https://apod/r.jpg"}]))
                .into_response();
        }
        let date = params
            .get("date")
            .cloned()
            .unwrap_or_else(|| "2026-10-19".to_string());
        Json(json!({"title": format!("Sky on {}", date), "url": "https://apod/d.jpg", "date": date}))
            .into_response()
    }

    fn app() -> Router {
        Router::new().route("/nasa/planetary/apod", get(apod))
    }

    #[tokio::test]
    async fn test_random_unwraps_array() {
        let addr = start_server(app()).await;
        let apod = random(&client(addr, all_keys())).await.unwrap();
        assert_eq!(apod.title, "Random Nebula");
    }

    #[tokio::test]
    async fn test_probe_reports_todays_title() {
        let addr = start_server(app()).await;
        let detail = probe(&client(addr, all_keys())).await.unwrap();
        assert_eq!(detail, "connected (today: Sky on 2026-10-19)");
    }

    #[tokio::test]
    async fn test_on_date_passes_iso_date() {
        let addr = start_server(app()).await;
        let date = NaiveDate::from_ymd_opt(1999, 7, 4).unwrap();
        let apod = on_date(&client(addr, all_keys()), date).await.unwrap();
        assert_eq!(apod.date, "1999-07-04");
        assert_eq!(apod.title, "Sky on 1999-07-04");
    }

    #[tokio::test]
    async fn test_bad_key_is_transport_fault() {
        let addr = start_server(app()).await;
        let keys = crate::config::ApiKeys {
            nasa: Some("nope".to_string()),
            ..all_keys()
        };
        let err = today(&client(addr, keys)).await.unwrap_err();
        assert_eq!(err.fault(), Fault::Transport);
        assert!(err.to_string().contains("403"));
    }

    #[tokio::test]
    async fn test_empty_archive_is_payload_fault() {
        let app = Router::new().route(
            "/nasa/planetary/apod",
            get(|| async { Json(json!([])) }),
        );
        let addr = start_server(app).await;
        let err = random(&client(addr, all_keys())).await.unwrap_err();
        assert_eq!(err.fault(), Fault::Payload);
    }
}
