//! Normalizer for raw upstream JSON
//!
//! The upstream API is inconsistent about field names: the same logical
//! value (cover image, description, genre list, episode count) shows up under
//! different keys depending on the call. Each logical value is described by
//! an [`AliasChain`], an ordered list of keys tried lazily; the first defined
//! value wins and aliases are never merged.

use std::collections::BTreeMap;

use serde_json::{Map, Value};
use tracing::trace;

use crate::constants::defaults;
use crate::models::{AnimeItem, Episode, Genre, HomepageData, Information, ScheduleData};

/// Ordered fallback list of field names for one logical value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AliasChain {
    /// Logical name, used in trace logs
    pub name: &'static str,
    /// Field names in priority order
    pub fields: &'static [&'static str],
}

impl AliasChain {
    pub const fn new(name: &'static str, fields: &'static [&'static str]) -> Self {
        Self { name, fields }
    }

    /// First defined value along the chain
    pub fn resolve<'a>(&self, object: &'a Map<String, Value>) -> Option<&'a Value> {
        self.resolve_with(object, |value| is_defined(value).then_some(value))
    }

    /// First value along the chain that `convert` accepts
    ///
    /// Lets a chain skip values that are present but unusable, such as a
    /// zero episode count.
    pub fn resolve_with<'a, T>(
        &self,
        object: &'a Map<String, Value>,
        convert: impl Fn(&'a Value) -> Option<T>,
    ) -> Option<T> {
        self.fields.iter().find_map(|field| {
            let resolved = object.get(*field).and_then(&convert)?;
            trace!(chain = self.name, field = *field, "alias resolved");
            Some(resolved)
        })
    }

    /// Field name the chain resolved to, if any
    pub fn resolved_field(&self, object: &Map<String, Value>) -> Option<&'static str> {
        self.fields
            .iter()
            .copied()
            .find(|field| object.get(*field).is_some_and(is_defined))
    }

    /// First defined value rendered as a string
    pub fn resolve_string(&self, object: &Map<String, Value>) -> Option<String> {
        self.resolve(object).and_then(value_to_string)
    }
}

/// Alias chains, highest priority first
pub mod chains {
    use super::AliasChain;

    pub const IMAGE: AliasChain =
        AliasChain::new("image", &["image_cover", "imageCover", "poster", "thumbnail"]);
    pub const DESCRIPTION: AliasChain = AliasChain::new("description", &["content", "description"]);
    pub const GENRES: AliasChain = AliasChain::new("genres", &["categories", "genres"]);
    pub const EPISODE_COUNT: AliasChain =
        AliasChain::new("episode_count", &["totalEpisode", "totalEpisodes"]);
    pub const YEAR: AliasChain = AliasChain::new("year", &["year", "tahun"]);
    pub const RECOMMENDED: AliasChain =
        AliasChain::new("recommended", &["recommend", "recommended", "popular"]);
}

/// Null and blank strings count as absent
fn is_defined(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.trim().is_empty(),
        _ => true,
    }
}

/// String form of a scalar; identifiers arrive as numbers or strings
pub fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn value_to_f64(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    n.is_finite().then_some(n)
}

fn value_to_u32(value: &Value) -> Option<u32> {
    value_to_f64(value)
        .filter(|n| *n >= 0.0 && *n <= u32::MAX as f64)
        .map(|n| n as u32)
}

fn string_field(object: &Map<String, Value>, field: &str) -> Option<String> {
    object.get(field).and_then(value_to_string)
}

/// Title lowercased with whitespace runs collapsed to `-`
pub fn slugify(title: &str) -> String {
    title
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}

/// Error message carried by an upstream or gateway error envelope
pub fn error_message(value: &Value) -> Option<String> {
    let error = value.as_object()?.get("error")?;
    match error {
        Value::Null | Value::Bool(false) => None,
        Value::String(s) => Some(s.clone()),
        Value::Object(inner) => inner
            .get("message")
            .and_then(value_to_string)
            .or_else(|| Some(error.to_string())),
        other => Some(other.to_string()),
    }
}

/// Normalize one episode entry
pub fn normalize_episode(value: &Value) -> Option<Episode> {
    let object = value.as_object()?;

    Some(Episode {
        id: string_field(object, "id").unwrap_or_default(),
        number: object.get("number").and_then(value_to_f64).unwrap_or(0.0),
        title: string_field(object, "title"),
        thumbnail: string_field(object, "thumbnail"),
    })
}

/// Sort ascending by number; equal numbers keep their input order
pub fn sort_episodes(episodes: &mut [Episode]) {
    episodes.sort_by(|a, b| a.number.total_cmp(&b.number));
}

fn normalize_genre_labels(value: &Value) -> Vec<String> {
    let Some(entries) = value.as_array() else {
        return Vec::new();
    };

    entries
        .iter()
        .filter_map(|entry| match entry {
            Value::Object(object) => string_field(object, "title"),
            other => value_to_string(other),
        })
        .collect()
}

/// Normalize one anime entry; `None` when the value is not an object
pub fn normalize_anime(value: &Value) -> Option<AnimeItem> {
    let object = value.as_object()?;

    let mut episodes: Vec<Episode> = object
        .get("episodes")
        .and_then(Value::as_array)
        .map(|entries| entries.iter().filter_map(normalize_episode).collect())
        .unwrap_or_default();
    sort_episodes(&mut episodes);

    Some(AnimeItem {
        id: string_field(object, "id").unwrap_or_default(),
        title: string_field(object, "title").unwrap_or_default(),
        other_title: string_field(object, "other_title"),
        image: chains::IMAGE
            .resolve_string(object)
            .unwrap_or_else(|| defaults::PLACEHOLDER_IMAGE.to_string()),
        rating: string_field(object, "rating"),
        status: string_field(object, "status"),
        anime_type: string_field(object, "type"),
        year: chains::YEAR.resolve_string(object),
        genres: chains::GENRES
            .resolve(object)
            .map(normalize_genre_labels)
            .unwrap_or_default(),
        description: chains::DESCRIPTION.resolve_string(object),
        episodes,
        episode_count: chains::EPISODE_COUNT
            .resolve_with(object, |value| value_to_u32(value).filter(|n| *n > 0)),
        current_episode: object.get("episode").and_then(value_to_u32),
    })
}

/// Normalize a list response; anything but an array yields an empty list
pub fn normalize_anime_list(value: &Value) -> Vec<AnimeItem> {
    value
        .as_array()
        .map(|entries| entries.iter().filter_map(normalize_anime).collect())
        .unwrap_or_default()
}

/// Normalize the genre list, preserving upstream order
pub fn normalize_genres(value: &Value) -> Vec<Genre> {
    let Some(entries) = value.as_array() else {
        return Vec::new();
    };

    entries
        .iter()
        .filter_map(|entry| {
            let object = entry.as_object()?;
            Some(Genre {
                id: string_field(object, "id").unwrap_or_default(),
                title: string_field(object, "title")?,
            })
        })
        .collect()
}

/// Id of the genre whose slug matches `slug` (case-insensitive)
pub fn find_genre_id<'a>(genres: &'a [Genre], slug: &str) -> Option<&'a str> {
    let wanted = slugify(slug);
    genres
        .iter()
        .find(|genre| genre.slug() == wanted)
        .map(|genre| genre.id.as_str())
}

fn normalize_schedule(value: &Value) -> Option<ScheduleData> {
    let object = value.as_object()?;

    let days: BTreeMap<u8, Vec<AnimeItem>> = object
        .iter()
        .filter_map(|(key, entries)| {
            let day: u8 = key.trim().parse().ok()?;
            (1..=7)
                .contains(&day)
                .then(|| (day, normalize_anime_list(entries)))
        })
        .collect();

    Some(ScheduleData(days))
}

fn normalize_information(value: &Value) -> Option<Vec<Information>> {
    let entries = value.as_array()?;

    Some(
        entries
            .iter()
            .filter_map(Value::as_object)
            .map(|object| Information {
                id: string_field(object, "id"),
                title: string_field(object, "title"),
                desc: string_field(object, "desc"),
            })
            .collect(),
    )
}

fn optional_list(object: &Map<String, Value>, field: &str) -> Option<Vec<AnimeItem>> {
    object
        .get(field)
        .filter(|value| value.is_array())
        .map(normalize_anime_list)
}

/// Normalize the homepage feed; sections missing upstream stay `None`
pub fn normalize_homepage(value: &Value) -> HomepageData {
    let Some(object) = value.as_object() else {
        return HomepageData::default();
    };

    HomepageData {
        recommended: chains::RECOMMENDED
            .resolve(object)
            .filter(|value| value.is_array())
            .map(normalize_anime_list),
        ongoing: optional_list(object, "ongoing"),
        latest: optional_list(object, "latest"),
        schedule: object.get("schedule").and_then(normalize_schedule),
        information: object.get("information").and_then(normalize_information),
    }
}
