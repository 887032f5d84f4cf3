//! Data models for the dashboard.
//!
//! Upstream records keep only the fields the dashboard shows and default
//! everything else, since the public APIs are loose about what they return.
//! Output types (cards, dashboards, checks) are serialized as-is for
//! `--format json`.

use crate::sources::Service;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A character from the Superhero API.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Hero {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub biography: Biography,
    #[serde(default)]
    pub image: Option<ImageRef>,
    #[serde(default)]
    pub powerstats: PowerStats,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Biography {
    #[serde(rename = "full-name", default)]
    pub full_name: String,
    #[serde(default)]
    pub publisher: String,
    #[serde(rename = "first-appearance", default)]
    pub first_appearance: String,
}

/// Stats arrive as strings, with `"null"` for unknown values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PowerStats {
    #[serde(default)]
    pub intelligence: Option<String>,
    #[serde(default)]
    pub strength: Option<String>,
    #[serde(default)]
    pub speed: Option<String>,
}

impl PowerStats {
    /// "Intelligence 100 • Strength 26 • Speed ?" style summary.
    pub fn summary(&self) -> String {
        fn shown(value: &Option<String>) -> &str {
            match value.as_deref().map(str::trim) {
                None | Some("") | Some("null") => "?",
                Some(v) => v,
            }
        }
        format!(
            "Intelligence {} • Strength {} • Speed {}",
            shown(&self.intelligence),
            shown(&self.strength),
            shown(&self.speed)
        )
    }
}

/// `{ "url": ... }`, the shape both hero images and GIF renditions use.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageRef {
    #[serde(default)]
    pub url: String,
}

/// NASA Astronomy Picture of the Day.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Apod {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub explanation: String,
    #[serde(default)]
    pub media_type: String,
    #[serde(default)]
    pub copyright: Option<String>,
}

/// A GIPHY GIF.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Gif {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub images: GifImages,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GifImages {
    #[serde(default)]
    pub fixed_height: Option<ImageRef>,
}

impl Gif {
    pub fn image_url(&self) -> Option<&str> {
        self.images.fixed_height.as_ref().map(|i| i.url.as_str())
    }
}

/// A TMDB movie.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub vote_average: f64,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub overview: String,
}

/// Value produced by any dashboard task.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum DashboardItem {
    Hero(Hero),
    Apod(Apod),
    Gif(Gif),
    Movie(Movie),
}

/// Which dashboard was built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "theme", rename_all = "lowercase")]
pub enum DashboardKind {
    Random,
    Themed(String),
}

impl fmt::Display for DashboardKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DashboardKind::Random => write!(f, "Random"),
            DashboardKind::Themed(theme) => write!(f, "Themed: {}", theme),
        }
    }
}

/// One rendered dashboard slot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Card {
    /// Icon plus label, e.g. "🦸 Superhero" or "⚠️ Error".
    pub tag: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub caption: String,
    /// False for placeholder cards.
    pub loaded: bool,
    /// Why the slot failed, when it did.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// A fully rendered dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub kind: DashboardKind,
    pub generated_at: DateTime<Utc>,
    pub duration_seconds: f64,
    pub cards: Vec<Card>,
}

impl Dashboard {
    pub fn loaded(&self) -> usize {
        self.cards.iter().filter(|c| c.loaded).count()
    }

    pub fn failed(&self) -> usize {
        self.cards.len() - self.loaded()
    }
}

/// Cards for a single-service query, e.g. `movies now-playing`.
#[derive(Debug, Clone, Serialize)]
pub struct Panel {
    pub service: Service,
    /// What was asked, e.g. "Trending GIFs" or "Hero search: batman".
    pub query: String,
    pub generated_at: DateTime<Utc>,
    pub cards: Vec<Card>,
}

/// Result of probing one service.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConnectionCheck {
    pub service: Service,
    pub ok: bool,
    pub detail: String,
}

/// Which services have keys.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeyStatus {
    pub configured: Vec<Service>,
    pub missing: Vec<Service>,
}

impl KeyStatus {
    pub fn total(&self) -> usize {
        self.configured.len() + self.missing.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_powerstats_summary_marks_unknown() {
        let json = r#"{"intelligence": "100", "strength": "null", "speed": null}"#;
        let stats: PowerStats = serde_json::from_str(json).unwrap();
        assert_eq!(stats.summary(), "Intelligence 100 • Strength ? • Speed ?");
    }

    #[test]
    fn test_hero_from_superhero_payload() {
        let json = r#"{
            "response": "success",
            "id": "70",
            "name": "Batman",
            "biography": {"full-name": "Bruce Wayne", "publisher": "DC Comics"},
            "image": {"url": "https://example.com/batman.jpg"}
        }"#;

        let hero: Hero = serde_json::from_str(json).unwrap();
        assert_eq!(hero.name, "Batman");
        assert_eq!(hero.biography.full_name, "Bruce Wayne");
        assert_eq!(hero.biography.publisher, "DC Comics");
        assert_eq!(hero.image.unwrap().url, "https://example.com/batman.jpg");
    }

    #[test]
    fn test_gif_image_url() {
        let json = r#"{"id": "x1", "images": {"fixed_height": {"url": "https://g/x1.gif"}}}"#;
        let gif: Gif = serde_json::from_str(json).unwrap();
        assert_eq!(gif.image_url(), Some("https://g/x1.gif"));

        let bare: Gif = serde_json::from_str(r#"{"id": "x2"}"#).unwrap();
        assert_eq!(bare.image_url(), None);
    }

    #[test]
    fn test_movie_tolerates_nulls() {
        let json = r#"{"id": 1, "title": "Heat", "poster_path": null, "vote_average": 8.3}"#;
        let movie: Movie = serde_json::from_str(json).unwrap();
        assert_eq!(movie.title, "Heat");
        assert!(movie.poster_path.is_none());
        assert!(movie.release_date.is_none());
    }

    #[test]
    fn test_dashboard_counts() {
        let card = |loaded| Card {
            tag: "t".to_string(),
            title: "x".to_string(),
            image_url: None,
            caption: String::new(),
            loaded,
            error: None,
        };
        let dashboard = Dashboard {
            kind: DashboardKind::Random,
            generated_at: Utc::now(),
            duration_seconds: 0.5,
            cards: vec![card(true), card(false), card(true), card(true)],
        };

        assert_eq!(dashboard.loaded(), 3);
        assert_eq!(dashboard.failed(), 1);
    }

    #[test]
    fn test_dashboard_kind_display() {
        assert_eq!(DashboardKind::Random.to_string(), "Random");
        assert_eq!(
            DashboardKind::Themed("cats".to_string()).to_string(),
            "Themed: cats"
        );
    }
}
