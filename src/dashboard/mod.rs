//! Dashboard assembly.
//!
//! A dashboard is four slots, one per upstream service, always in the same
//! order: hero, space picture, GIF, movie. The builders here produce the four
//! fetch tasks, hand them to the aggregator, and map each outcome to a card
//! through the slot table below.

pub mod aggregator;

pub use aggregator::{aggregate, FetchTask, Outcome};

use crate::models::{Card, ConnectionCheck, Dashboard, DashboardItem, DashboardKind};
use crate::sources::{giphy, nasa, superhero, tmdb, ApiClient, Service, SourceError};
use chrono::Utc;
use rand::Rng;
use std::future::Future;
use std::time::Instant;
use tracing::{debug, info, warn};

/// What a slot formatter needs besides the item itself.
pub struct RenderContext<'a> {
    pub kind: &'a DashboardKind,
    /// Prefix for TMDB poster paths.
    pub poster_base: &'a str,
}

impl RenderContext<'_> {
    fn theme(&self) -> Option<&str> {
        match self.kind {
            DashboardKind::Random => None,
            DashboardKind::Themed(theme) => Some(theme),
        }
    }
}

/// Title, image and caption of a loaded card.
type CardBody = (String, Option<String>, String);

/// Formats a fulfilled item. `None` means the item is not the variant this
/// slot expects.
type Formatter = fn(&DashboardItem, &RenderContext<'_>) -> Option<CardBody>;

/// Static description of one dashboard position.
pub struct Slot {
    pub service: Service,
    pub random_label: &'static str,
    pub themed_label: &'static str,
    format: Formatter,
}

impl Slot {
    pub fn label(&self, kind: &DashboardKind) -> &'static str {
        match kind {
            DashboardKind::Random => self.random_label,
            DashboardKind::Themed(_) => self.themed_label,
        }
    }
}

/// Slot table, indexed by position.
pub static SLOTS: [Slot; 4] = [
    Slot {
        service: Service::Superhero,
        random_label: "Superhero",
        themed_label: "Hero Search",
        format: format_hero,
    },
    Slot {
        service: Service::Nasa,
        random_label: "Space",
        themed_label: "Space News",
        format: format_apod,
    },
    Slot {
        service: Service::Giphy,
        random_label: "Reaction",
        themed_label: "Themed GIF",
        format: format_gif,
    },
    Slot {
        service: Service::Tmdb,
        random_label: "Movie",
        themed_label: "Themed Movie",
        format: format_movie,
    },
];

fn format_hero(item: &DashboardItem, _ctx: &RenderContext<'_>) -> Option<CardBody> {
    let DashboardItem::Hero(hero) = item else {
        return None;
    };
    let full_name = if hero.biography.full_name.is_empty() {
        &hero.name
    } else {
        &hero.biography.full_name
    };
    let publisher = if hero.biography.publisher.is_empty() {
        "Hero"
    } else {
        &hero.biography.publisher
    };
    Some((
        hero.name.clone(),
        hero.image.as_ref().map(|i| i.url.clone()),
        format!("{} • {}", full_name, publisher),
    ))
}

fn format_apod(item: &DashboardItem, ctx: &RenderContext<'_>) -> Option<CardBody> {
    let DashboardItem::Apod(apod) = item else {
        return None;
    };
    let caption = match ctx.kind {
        DashboardKind::Random => "Discovery from the cosmos",
        DashboardKind::Themed(_) => "Space discovery of the day",
    };
    Some((apod.title.clone(), Some(apod.url.clone()), caption.to_string()))
}

fn format_gif(item: &DashboardItem, ctx: &RenderContext<'_>) -> Option<CardBody> {
    let DashboardItem::Gif(gif) = item else {
        return None;
    };
    let (title, caption) = match ctx.theme() {
        None => ("Random Reaction".to_string(), "Powered by GIPHY".to_string()),
        Some(theme) => (
            format!("{} Reaction", theme.to_uppercase()),
            format!("Trending {} reaction", theme),
        ),
    };
    Some((title, gif.image_url().map(String::from), caption))
}

fn format_movie(item: &DashboardItem, ctx: &RenderContext<'_>) -> Option<CardBody> {
    let DashboardItem::Movie(movie) = item else {
        return None;
    };
    let caption = match ctx.kind {
        DashboardKind::Random => format!("Rating: ⭐ {}", movie.vote_average),
        DashboardKind::Themed(_) => format!(
            "Released: {}",
            movie
                .release_date
                .as_deref()
                .filter(|d| !d.is_empty())
                .unwrap_or("Unknown")
        ),
    };
    let image = movie
        .poster_path
        .as_ref()
        .map(|p| format!("{}{}", ctx.poster_base, p));
    Some((movie.title.clone(), image, caption))
}

fn placeholder(slot: &Slot, ctx: &RenderContext<'_>, reason: &str) -> Card {
    let label = slot.label(ctx.kind);
    let (tag, caption) = match ctx.theme() {
        None => (
            "⚠️ Error".to_string(),
            format!("Failed to load {} data. Check API configuration.", label),
        ),
        Some(theme) => (
            format!("⚠️ {}", label),
            format!("No matches found for \"{}\" in this category.", theme),
        ),
    };
    Card {
        tag,
        title: label.to_string(),
        image_url: None,
        caption,
        loaded: false,
        error: Some(reason.to_string()),
    }
}

/// Map every outcome to a card through the slot table.
///
/// Outcomes beyond the table, or items of the wrong variant for their
/// slot, render as placeholders.
pub fn render_cards(outcomes: &[Outcome<DashboardItem>], ctx: &RenderContext<'_>) -> Vec<Card> {
    outcomes
        .iter()
        .enumerate()
        .map(|(index, outcome)| {
            let Some(slot) = SLOTS.get(index) else {
                return Card {
                    tag: "⚠️ Error".to_string(),
                    title: format!("Slot {}", index),
                    image_url: None,
                    caption: "No renderer for this slot.".to_string(),
                    loaded: false,
                    error: outcome.reason().map(String::from),
                };
            };

            match outcome {
                Outcome::Fulfilled(item) => match (slot.format)(item, ctx) {
                    Some((title, image_url, caption)) => Card {
                        tag: format!("{} {}", slot.service.icon(), slot.label(ctx.kind)),
                        title,
                        image_url,
                        caption,
                        loaded: true,
                        error: None,
                    },
                    None => placeholder(slot, ctx, "unexpected item for this slot"),
                },
                Outcome::Rejected(reason) => placeholder(slot, ctx, reason),
            }
        })
        .collect()
}

fn task<T, F, Fut>(service: Service, name: &str, f: F) -> FetchTask<DashboardItem>
where
    T: Send + 'static,
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = Result<T, SourceError>> + Send + 'static,
    DashboardItem: From<T>,
{
    let name = format!("{}:{}", service.label(), name);
    let task_name = name.clone();
    FetchTask::new(name, move || async move {
        f().await.map(DashboardItem::from).map_err(|e| {
            warn!("{} failed ({:?} fault): {}", task_name, e.fault(), e);
            e
        })
    })
}

/// Tasks for the random dashboard. Random picks are drawn from `rng` now, so
/// the tasks themselves are deterministic.
pub fn random_tasks<R: Rng>(client: &ApiClient, rng: &mut R) -> Vec<FetchTask<DashboardItem>> {
    let hero_id = rng.gen_range(1..=superhero::MAX_HERO_ID);
    let movie_page = rng.gen_range(1..=tmdb::POPULAR_PAGES);
    let movie_pick: usize = rng.gen();
    debug!("Random picks: hero #{}, popular page {}", hero_id, movie_page);

    let (c0, c1, c2, c3) = (client.clone(), client.clone(), client.clone(), client.clone());
    vec![
        task(Service::Superhero, "random", move || async move {
            superhero::by_id(&c0, hero_id).await
        }),
        task(Service::Nasa, "random", move || async move { nasa::random(&c1).await }),
        task(Service::Giphy, "random", move || async move { giphy::random(&c2).await }),
        task(Service::Tmdb, "popular", move || async move {
            tmdb::popular_pick(&c3, movie_page, movie_pick).await
        }),
    ]
}

/// Tasks for a dashboard themed around `theme`. The space slot has no
/// search, so it stays a random picture.
pub fn themed_tasks(client: &ApiClient, theme: &str) -> Vec<FetchTask<DashboardItem>> {
    let (c0, c1, c2, c3) = (client.clone(), client.clone(), client.clone(), client.clone());
    let (t0, t2, t3) = (theme.to_string(), theme.to_string(), theme.to_string());
    vec![
        task(Service::Superhero, "search", move || async move {
            superhero::search_first(&c0, &t0).await
        }),
        task(Service::Nasa, "random", move || async move { nasa::random(&c1).await }),
        task(Service::Giphy, "search", move || async move {
            giphy::search_first(&c2, &t2).await
        }),
        task(Service::Tmdb, "search", move || async move {
            tmdb::search_first(&c3, &t3).await
        }),
    ]
}

/// Run `tasks` and render the outcome as a dashboard.
pub async fn build(
    client: &ApiClient,
    kind: DashboardKind,
    tasks: Vec<FetchTask<DashboardItem>>,
) -> Dashboard {
    let started = Instant::now();
    for t in &tasks {
        debug!("Dispatching {}", t.name());
    }

    let outcomes = aggregate(tasks).await;

    let ctx = RenderContext {
        kind: &kind,
        poster_base: &client.endpoints().tmdb_images,
    };
    let cards = render_cards(&outcomes, &ctx);
    let dashboard = Dashboard {
        generated_at: Utc::now(),
        duration_seconds: started.elapsed().as_secs_f64(),
        cards,
        kind,
    };

    info!(
        "{} dashboard: {} loaded, {} failed",
        dashboard.kind,
        dashboard.loaded(),
        dashboard.failed()
    );
    dashboard
}

/// Probe every service concurrently, in slot order.
pub async fn check(client: &ApiClient) -> Vec<ConnectionCheck> {
    let (c0, c1, c2, c3) = (client.clone(), client.clone(), client.clone(), client.clone());
    let tasks = vec![
        FetchTask::new("Superhero:probe", move || async move { superhero::probe(&c0).await }),
        FetchTask::new("NASA:probe", move || async move { nasa::probe(&c1).await }),
        FetchTask::new("GIPHY:probe", move || async move { giphy::probe(&c2).await }),
        FetchTask::new("TMDB:probe", move || async move { tmdb::probe(&c3).await }),
    ];

    aggregate(tasks)
        .await
        .into_iter()
        .zip(SLOTS.iter())
        .map(|(outcome, slot)| match outcome {
            Outcome::Fulfilled(detail) => ConnectionCheck {
                service: slot.service,
                ok: true,
                detail,
            },
            Outcome::Rejected(reason) => ConnectionCheck {
                service: slot.service,
                ok: false,
                detail: reason,
            },
        })
        .collect()
}

impl From<crate::models::Hero> for DashboardItem {
    fn from(hero: crate::models::Hero) -> Self {
        DashboardItem::Hero(hero)
    }
}

impl From<crate::models::Apod> for DashboardItem {
    fn from(apod: crate::models::Apod) -> Self {
        DashboardItem::Apod(apod)
    }
}

impl From<crate::models::Gif> for DashboardItem {
    fn from(gif: crate::models::Gif) -> Self {
        DashboardItem::Gif(gif)
    }
}

impl From<crate::models::Movie> for DashboardItem {
    fn from(movie: crate::models::Movie) -> Self {
        DashboardItem::Movie(movie)
    }
}
