//! GIPHY GIF API. All queries are restricted to `rating=g`.

use super::{ApiClient, Service, SourceError};
use crate::models::Gif;
use serde::Deserialize;

const SERVICE: Service = Service::Giphy;

/// Page size of trending and search listings.
pub const LIST_LIMIT: u32 = 12;

/// `/random` answers with an object, `/search` and `/trending` with a list.
/// An empty `/random` comes back as `[]`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum GifData {
    Many(Vec<Gif>),
    One(Gif),
}

#[derive(Debug, Deserialize)]
struct GifResponse {
    data: Option<GifData>,
}

impl GifResponse {
    fn first(self, what: &str) -> Result<Gif, SourceError> {
        let gif = match self.data {
            Some(GifData::One(gif)) => Some(gif),
            Some(GifData::Many(gifs)) => gifs.into_iter().next(),
            None => None,
        };
        gif.filter(|g| g.image_url().is_some())
            .ok_or_else(|| SourceError::payload(SERVICE, format!("no GIF for {}", what)))
    }

    /// Every GIF that has a renderable image.
    fn all(self) -> Vec<Gif> {
        let gifs = match self.data {
            Some(GifData::Many(gifs)) => gifs,
            Some(GifData::One(gif)) => vec![gif],
            None => Vec::new(),
        };
        gifs.into_iter().filter(|g| g.image_url().is_some()).collect()
    }
}

async fn fetch(client: &ApiClient, endpoint: &str, query: &str) -> Result<GifResponse, SourceError> {
    let key = client.key(SERVICE)?;
    let url = format!(
        "{}/{}?api_key={}{}&rating=g",
        client.endpoints().giphy,
        endpoint,
        urlencoding::encode(key),
        query
    );
    client.get_json(SERVICE, &url).await
}

/// A random G-rated GIF.
pub async fn random(client: &ApiClient) -> Result<Gif, SourceError> {
    fetch(client, "random", "").await?.first("random pick")
}

/// Best match for `query`.
pub async fn search_first(client: &ApiClient, query: &str) -> Result<Gif, SourceError> {
    let q = format!("&q={}&limit=1", urlencoding::encode(query));
    fetch(client, "search", &q)
        .await?
        .first(&format!("\"{}\"", query))
}

/// Currently trending GIFs.
pub async fn trending(client: &ApiClient) -> Result<Vec<Gif>, SourceError> {
    let q = format!("&limit={}", LIST_LIMIT);
    Ok(fetch(client, "trending", &q).await?.all())
}

/// GIFs matching `query`, best first.
pub async fn search(client: &ApiClient, query: &str) -> Result<Vec<Gif>, SourceError> {
    let q = format!("&q={}&limit={}", urlencoding::encode(query), LIST_LIMIT);
    Ok(fetch(client, "search", &q).await?.all())
}

/// Verify the key with a one-item trending request.
pub async fn probe(client: &ApiClient) -> Result<String, SourceError> {
    let response = fetch(client, "trending", "&limit=1").await?;
    match response.data {
        Some(_) => Ok("connected".to_string()),
        None => Err(SourceError::payload(SERVICE, "response has no data field")),
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::super::Fault;
    use super::*;
    use axum::extract::Query;
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::{json, Value};
    use std::collections::HashMap;

    fn gif(id: &str) -> Value {
        json!({"id": id, "title": id, "images": {"fixed_height": {"url": format!("https://g/{}.gif", id)}}})
    }

    fn app() -> Router {
        Router::new()
            .route("/giphy/random", get(|| async { Json(json!({"data": gif("rnd")})) }))
            .route(
                "/giphy/search",
                get(|Query(params): Query<HashMap<String, String>>| async move {
                    assert_eq!(params.get("rating").map(String::as_str), Some("g"));
                    let q = params.get("q").cloned().unwrap_or_default();
                    if q == "zzzz" {
                        Json(json!({"data": []}))
                    } else {
                        Json(json!({"data": [gif(&q), gif("second")]}))
                    }
                }),
            )
            .route(
                "/giphy/trending",
                get(|Query(params): Query<HashMap<String, String>>| async move {
                    let limit: usize = params
                        .get("limit")
                        .and_then(|l| l.parse().ok())
                        .unwrap_or(25);
                    let mut data = vec![json!({"id": "broken", "images": {}})];
                    data.extend((0..20).map(|i| gif(&format!("hot{}", i))));
                    data.truncate(limit);
                    Json(json!({"data": data}))
                }),
            )
    }

    #[tokio::test]
    async fn test_random_object() {
        let addr = start_server(app()).await;
        let gif = random(&client(addr, all_keys())).await.unwrap();
        assert_eq!(gif.id, "rnd");
    }

    #[tokio::test]
    async fn test_search_first_match() {
        let addr = start_server(app()).await;
        let gif = search_first(&client(addr, all_keys()), "cats").await.unwrap();
        assert_eq!(gif.id, "cats");
        assert_eq!(gif.image_url(), Some("https://g/cats.gif"));
    }

    #[tokio::test]
    async fn test_search_no_results() {
        let addr = start_server(app()).await;
        let err = search_first(&client(addr, all_keys()), "zzzz")
            .await
            .unwrap_err();
        assert_eq!(err.fault(), Fault::Payload);
        assert!(err.to_string().contains("zzzz"));
    }

    #[tokio::test]
    async fn test_trending_skips_gifs_without_image() {
        let addr = start_server(app()).await;
        let gifs = trending(&client(addr, all_keys())).await.unwrap();
        // The server honours the limit; the imageless entry is dropped.
        assert_eq!(gifs.len(), LIST_LIMIT as usize - 1);
        assert_eq!(gifs[0].id, "hot0");
    }

    #[tokio::test]
    async fn test_search_lists_matches() {
        let addr = start_server(app()).await;
        let client = client(addr, all_keys());

        let gifs = search(&client, "dogs").await.unwrap();
        let ids: Vec<_> = gifs.iter().map(|g| g.id.as_str()).collect();
        assert_eq!(ids, ["dogs", "second"]);

        assert!(search(&client, "zzzz").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_probe() {
        let addr = start_server(app()).await;
        tokio_test::assert_ok!(probe(&client(addr, all_keys())).await);
    }

    #[tokio::test]
    async fn test_missing_key() {
        let addr = start_server(app()).await;
        let keys = crate::config::ApiKeys {
            giphy: None,
            ..all_keys()
        };
        let err = tokio_test::assert_err!(random(&client(addr, keys)).await);
        assert_eq!(err.fault(), Fault::Configuration);
    }
}
