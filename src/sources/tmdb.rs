//! The Movie Database (TMDB) v3 API.

use super::{ApiClient, Service, SourceError};
use crate::models::Movie;
use serde::Deserialize;

/// Random picks come from the first this-many pages of popular movies.
pub const POPULAR_PAGES: u32 = 50;

const SERVICE: Service = Service::Tmdb;

#[derive(Debug, Deserialize)]
struct MovieList {
    #[serde(default)]
    results: Vec<Movie>,
}

async fn list(client: &ApiClient, path: &str, query: &str) -> Result<Vec<Movie>, SourceError> {
    let key = client.key(SERVICE)?;
    let url = format!(
        "{}/{}?api_key={}{}",
        client.endpoints().tmdb,
        path,
        urlencoding::encode(key),
        query
    );
    let list: MovieList = client.get_json(SERVICE, &url).await?;
    Ok(list.results)
}

/// One page of popular movies.
pub async fn popular(client: &ApiClient, page: u32) -> Result<Vec<Movie>, SourceError> {
    list(client, "movie/popular", &format!("&page={}", page)).await
}

/// One page of movies currently in theaters.
pub async fn now_playing(client: &ApiClient, page: u32) -> Result<Vec<Movie>, SourceError> {
    list(client, "movie/now_playing", &format!("&page={}", page)).await
}

/// Entry `pick` (taken modulo the page length) of popular page `page`.
///
/// The page length is only known after the response, so callers pass a raw
/// random number and the index is reduced here.
pub async fn popular_pick(client: &ApiClient, page: u32, pick: usize) -> Result<Movie, SourceError> {
    let mut movies = popular(client, page).await?;
    if movies.is_empty() {
        return Err(SourceError::payload(
            SERVICE,
            format!("popular page {} is empty", page),
        ));
    }
    let index = pick % movies.len();
    Ok(movies.swap_remove(index))
}

/// Movies matching `query`, in relevance order.
pub async fn search(client: &ApiClient, query: &str) -> Result<Vec<Movie>, SourceError> {
    let q = format!("&query={}", urlencoding::encode(query));
    list(client, "search/movie", &q).await
}

/// Best match for `query`.
pub async fn search_first(client: &ApiClient, query: &str) -> Result<Movie, SourceError> {
    search(client, query)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| SourceError::payload(SERVICE, format!("no movie matches \"{}\"", query)))
}

/// Verify the key by fetching the first popular page.
pub async fn probe(client: &ApiClient) -> Result<String, SourceError> {
    let movies = popular(client, 1).await?;
    Ok(format!("connected ({} popular titles)", movies.len()))
}
