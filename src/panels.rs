//! Single-service queries.
//!
//! A panel asks one API one question (a search, a listing, a date) and lists
//! what came back as cards. Unlike a dashboard there are no slots: a failed
//! request fails the whole panel, and an empty answer is an empty panel.

use crate::cli::{Command, GifAction, HeroAction, MovieAction};
use crate::models::{Apod, Card, Gif, Hero, Movie, Panel};
use crate::sources::{giphy, nasa, superhero, tmdb, ApiClient, Service, SourceError};
use chrono::{NaiveDate, Utc};
use rand::Rng;
use std::fmt;
use tracing::{debug, info};

/// Most cards a panel lists.
pub const MAX_CARDS: usize = 12;

/// Movie overviews are cut to this many characters.
const OVERVIEW_CHARS: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelQuery {
    HeroSearch(String),
    /// Random heroes are drawn by the caller, so this carries the id.
    HeroById(u32),
    SpaceToday,
    SpaceOn(NaiveDate),
    SpaceRandom,
    GifTrending,
    GifSearch(String),
    GifRandom,
    MoviePopular,
    MovieNowPlaying,
    MovieSearch(String),
}

impl PanelQuery {
    /// The query behind a single-service subcommand, or `None` for the other
    /// commands. A random hero id is drawn from `rng`.
    pub fn from_command<R: Rng>(command: &Command, rng: &mut R) -> Option<Self> {
        let query = match command {
            Command::Hero { action } => match action {
                HeroAction::Search { name } => PanelQuery::HeroSearch(name.trim().to_string()),
                HeroAction::Random => {
                    PanelQuery::HeroById(rng.gen_range(1..=superhero::MAX_HERO_ID))
                }
            },
            Command::Space { date, random } => match (date, *random) {
                (Some(date), _) => PanelQuery::SpaceOn(*date),
                (None, true) => PanelQuery::SpaceRandom,
                (None, false) => PanelQuery::SpaceToday,
            },
            Command::Gifs { action } => match action {
                GifAction::Trending => PanelQuery::GifTrending,
                GifAction::Search { query } => PanelQuery::GifSearch(query.trim().to_string()),
                GifAction::Random => PanelQuery::GifRandom,
            },
            Command::Movies { action } => match action {
                MovieAction::Popular => PanelQuery::MoviePopular,
                MovieAction::NowPlaying => PanelQuery::MovieNowPlaying,
                MovieAction::Search { query } => PanelQuery::MovieSearch(query.trim().to_string()),
            },
            _ => return None,
        };
        Some(query)
    }

    pub fn service(&self) -> Service {
        match self {
            PanelQuery::HeroSearch(_) | PanelQuery::HeroById(_) => Service::Superhero,
            PanelQuery::SpaceToday | PanelQuery::SpaceOn(_) | PanelQuery::SpaceRandom => {
                Service::Nasa
            }
            PanelQuery::GifTrending | PanelQuery::GifSearch(_) | PanelQuery::GifRandom => {
                Service::Giphy
            }
            PanelQuery::MoviePopular | PanelQuery::MovieNowPlaying | PanelQuery::MovieSearch(_) => {
                Service::Tmdb
            }
        }
    }
}

impl fmt::Display for PanelQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PanelQuery::HeroSearch(q) => write!(f, "Hero search: {}", q),
            PanelQuery::HeroById(id) => write!(f, "Superhero #{}", id),
            PanelQuery::SpaceToday => write!(f, "Today's space image"),
            PanelQuery::SpaceOn(date) => write!(f, "Space image for {}", date.format("%Y-%m-%d")),
            PanelQuery::SpaceRandom => write!(f, "Random space image"),
            PanelQuery::GifTrending => write!(f, "Trending GIFs"),
            PanelQuery::GifSearch(q) => write!(f, "GIF search: {}", q),
            PanelQuery::GifRandom => write!(f, "Random GIF"),
            PanelQuery::MoviePopular => write!(f, "Popular movies"),
            PanelQuery::MovieNowPlaying => write!(f, "Now playing"),
            PanelQuery::MovieSearch(q) => write!(f, "Movie search: {}", q),
        }
    }
}

/// Run `query` against its service and list the results.
pub async fn run(client: &ApiClient, query: PanelQuery) -> Result<Panel, SourceError> {
    debug!("Panel query: {:?}", query);
    let posters = client.endpoints().tmdb_images.as_str();

    let mut cards: Vec<Card> = match &query {
        PanelQuery::HeroSearch(q) => superhero::search(client, q)
            .await?
            .iter()
            .map(hero_card)
            .collect(),
        PanelQuery::HeroById(id) => vec![hero_card(&superhero::by_id(client, *id).await?)],
        PanelQuery::SpaceToday => vec![apod_card(&nasa::today(client).await?)],
        PanelQuery::SpaceOn(date) => vec![apod_card(&nasa::on_date(client, *date).await?)],
        PanelQuery::SpaceRandom => vec![apod_card(&nasa::random(client).await?)],
        PanelQuery::GifTrending => giphy::trending(client).await?.iter().map(gif_card).collect(),
        PanelQuery::GifSearch(q) => giphy::search(client, q)
            .await?
            .iter()
            .map(gif_card)
            .collect(),
        PanelQuery::GifRandom => vec![gif_card(&giphy::random(client).await?)],
        PanelQuery::MoviePopular => tmdb::popular(client, 1)
            .await?
            .iter()
            .map(|m| movie_card(m, posters))
            .collect(),
        PanelQuery::MovieNowPlaying => tmdb::now_playing(client, 1)
            .await?
            .iter()
            .map(|m| movie_card(m, posters))
            .collect(),
        PanelQuery::MovieSearch(q) => tmdb::search(client, q)
            .await?
            .iter()
            .map(|m| movie_card(m, posters))
            .collect(),
    };
    cards.truncate(MAX_CARDS);

    info!("{}: {} result(s)", query, cards.len());
    Ok(Panel {
        service: query.service(),
        query: query.to_string(),
        generated_at: Utc::now(),
        cards,
    })
}

fn or_unknown(value: &str) -> &str {
    if value.trim().is_empty() {
        "Unknown"
    } else {
        value
    }
}

fn card(service: Service, title: String, image_url: Option<String>, caption: String) -> Card {
    Card {
        tag: format!("{} {}", service.icon(), service.label()),
        title,
        image_url,
        caption,
        loaded: true,
        error: None,
    }
}

fn hero_card(hero: &Hero) -> Card {
    let bio = &hero.biography;
    let caption = format!(
        "Full name: {} • Publisher: {} • First appearance: {}\n\n{}",
        or_unknown(&bio.full_name),
        or_unknown(&bio.publisher),
        or_unknown(&bio.first_appearance),
        hero.powerstats.summary()
    );
    card(
        Service::Superhero,
        hero.name.clone(),
        hero.image.as_ref().map(|i| i.url.clone()),
        caption,
    )
}

fn apod_card(apod: &Apod) -> Card {
    let mut details = format!(
        "Date: {} • Media type: {}",
        or_unknown(&apod.date),
        or_unknown(&apod.media_type)
    );
    if let Some(ref copyright) = apod.copyright {
        details.push_str(&format!(" • © {}", copyright.trim()));
    }
    let caption = if apod.explanation.is_empty() {
        details
    } else {
        format!("{}\n\n{}", apod.explanation, details)
    };
    card(Service::Nasa, apod.title.clone(), Some(apod.url.clone()), caption)
}

fn gif_card(gif: &Gif) -> Card {
    let title = if gif.title.trim().is_empty() {
        "Untitled GIF".to_string()
    } else {
        gif.title.clone()
    };
    card(
        Service::Giphy,
        title,
        gif.image_url().map(String::from),
        format!("GIPHY id {}", gif.id),
    )
}

fn movie_card(movie: &Movie, poster_base: &str) -> Card {
    let rating = if movie.vote_average > 0.0 {
        format!("⭐ {:.1}", movie.vote_average)
    } else {
        "⭐ N/A".to_string()
    };
    let released = or_unknown(movie.release_date.as_deref().unwrap_or_default());
    let overview = if movie.overview.trim().is_empty() {
        "No description available.".to_string()
    } else if movie.overview.chars().count() > OVERVIEW_CHARS {
        let cut: String = movie.overview.chars().take(OVERVIEW_CHARS).collect();
        format!("{}...", cut.trim_end())
    } else {
        movie.overview.clone()
    };
    card(
        Service::Tmdb,
        movie.title.clone(),
        movie
            .poster_path
            .as_ref()
            .map(|p| format!("{}{}", poster_base, p)),
        format!("{} • Released: {}\n\n{}", rating, released, overview),
    )
}
