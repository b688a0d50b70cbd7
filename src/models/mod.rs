//! Data models for shinime
//!
//! This module contains the gateway wire shapes and the normalized catalog
//! entities handed to view logic. Normalized entities are immutable value
//! snapshots; see [`crate::normalize`] for how they are built from raw
//! upstream JSON.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;

use crate::constants::{defaults, DAY_NAMES};
use crate::error::ClientError;
use crate::normalize::slugify;

// ============================================================================
// Gateway wire shapes
// ============================================================================

/// HTTP method the gateway uses towards the upstream
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request body accepted by the forwarding gateway
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct GatewayRequest {
    /// Upstream path, e.g. `/anime/list`
    pub endpoint: String,
    /// Method used towards the upstream (defaults to GET)
    #[serde(default)]
    pub method: HttpMethod,
    /// Form fields, only sent for POST
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub body: Option<Map<String, Value>>,
}

impl GatewayRequest {
    /// A bodiless GET request
    pub fn get(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            method: HttpMethod::Get,
            body: None,
        }
    }

    /// A POST request carrying the given form fields
    pub fn post<K, V, I>(endpoint: impl Into<String>, fields: I) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        let body = fields
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();

        Self {
            endpoint: endpoint.into(),
            method: HttpMethod::Post,
            body: Some(body),
        }
    }

    /// Value of a body field, if present
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.body.as_ref().and_then(|body| body.get(key))
    }
}

/// Error envelope returned by the gateway on relay failure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct GatewayErrorBody {
    /// Human-readable failure message
    pub error: String,
}

impl GatewayErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

// ============================================================================
// Catalog enumerations
// ============================================================================

/// Catalog category a list request is filtered by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnimeType {
    Series,
    Movie,
    Ova,
    LiveAction,
}

impl AnimeType {
    pub const ALL: [AnimeType; 4] = [
        AnimeType::Series,
        AnimeType::Movie,
        AnimeType::Ova,
        AnimeType::LiveAction,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AnimeType::Series => "series",
            AnimeType::Movie => "movie",
            AnimeType::Ova => "ova",
            AnimeType::LiveAction => "live-action",
        }
    }

    /// Upstream `jenisanime` code for this category
    pub fn category_code(&self) -> &'static str {
        match self {
            AnimeType::Series => "1",
            AnimeType::Ova => "2",
            AnimeType::Movie => "3",
            AnimeType::LiveAction => "4",
        }
    }

    /// Message listing every accepted type name
    pub fn available_types_message() -> String {
        let names: Vec<&str> = Self::ALL.iter().map(AnimeType::as_str).collect();
        format!("Available types: {}.", names.join(", "))
    }
}

impl fmt::Display for AnimeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnimeType {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ClientError::validation(Self::available_types_message()))
    }
}

/// Video quality requested from the upstream
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Quality {
    #[default]
    #[serde(rename = "HD")]
    Hd,
    #[serde(rename = "SD")]
    Sd,
}

impl Quality {
    pub fn as_str(&self) -> &'static str {
        match self {
            Quality::Hd => "HD",
            Quality::Sd => "SD",
        }
    }

    /// The other quality, offered as a retry when playback fails
    pub fn toggled(&self) -> Self {
        match self {
            Quality::Hd => Quality::Sd,
            Quality::Sd => Quality::Hd,
        }
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Quality {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "HD" => Ok(Quality::Hd),
            "SD" => Ok(Quality::Sd),
            _ => Err(ClientError::validation("Available qualities: HD, SD.")),
        }
    }
}

// ============================================================================
// Normalized entities
// ============================================================================

/// Represents one episode of an anime
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Episode {
    pub id: String,
    /// Ordinal number; 0 when the upstream omitted it
    pub number: f64,
    pub title: Option<String>,
    pub thumbnail: Option<String>,
}

impl Episode {
    /// Number shown to the viewer, falling back to the 1-based list position
    pub fn display_number(&self, index: usize) -> String {
        if self.number > 0.0 {
            format_number(self.number)
        } else {
            (index + 1).to_string()
        }
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

/// Represents an anime as consumed by view logic
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnimeItem {
    pub id: String,
    pub title: String,
    pub other_title: Option<String>,
    /// Cover image, or the placeholder when the upstream sent none
    pub image: String,
    pub rating: Option<String>,
    pub status: Option<String>,
    #[serde(rename = "type")]
    pub anime_type: Option<String>,
    pub year: Option<String>,
    /// Genre labels
    pub genres: Vec<String>,
    pub description: Option<String>,
    /// Episodes sorted ascending by number
    pub episodes: Vec<Episode>,
    /// Announced total; never the latest aired episode
    pub episode_count: Option<u32>,
    /// Latest aired episode of an ongoing show
    pub current_episode: Option<u32>,
}

impl AnimeItem {
    /// Episode count, falling back to the number of listed episodes
    pub fn total_episodes(&self) -> usize {
        self.episode_count
            .map(|n| n as usize)
            .filter(|n| *n > 0)
            .unwrap_or(self.episodes.len())
    }

    pub fn has_placeholder_image(&self) -> bool {
        self.image == defaults::PLACEHOLDER_IMAGE
    }
}

/// Represents a genre from the filter menu
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Genre {
    pub id: String,
    pub title: String,
}

impl Genre {
    /// Human-readable URL form of the title, e.g. "Slice of Life" -> "slice-of-life"
    pub fn slug(&self) -> String {
        slugify(&self.title)
    }
}

/// Homepage announcement entry
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Information {
    pub id: Option<String>,
    pub title: Option<String>,
    pub desc: Option<String>,
}

/// Airing schedule keyed by upstream weekday (1 = Sunday .. 7 = Saturday)
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct ScheduleData(pub BTreeMap<u8, Vec<AnimeItem>>);

impl ScheduleData {
    /// Anime airing on the given weekday key; empty when nothing is scheduled
    pub fn for_day(&self, day: u8) -> &[AnimeItem] {
        self.0.get(&day).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.0.values().all(Vec::is_empty)
    }
}

/// Display name of an upstream weekday key
pub fn day_name(day: u8) -> Option<&'static str> {
    match day {
        1..=7 => Some(DAY_NAMES[(day - 1) as usize]),
        _ => None,
    }
}

/// Aggregate homepage feed; every section is independently optional
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct HomepageData {
    pub recommended: Option<Vec<AnimeItem>>,
    pub ongoing: Option<Vec<AnimeItem>>,
    pub latest: Option<Vec<AnimeItem>>,
    pub schedule: Option<ScheduleData>,
    pub information: Option<Vec<Information>>,
}

impl HomepageData {
    pub fn recommended(&self) -> &[AnimeItem] {
        self.recommended.as_deref().unwrap_or(&[])
    }

    pub fn ongoing(&self) -> &[AnimeItem] {
        self.ongoing.as_deref().unwrap_or(&[])
    }

    pub fn latest(&self) -> &[AnimeItem] {
        self.latest.as_deref().unwrap_or(&[])
    }

    pub fn information(&self) -> &[Information] {
        self.information.as_deref().unwrap_or(&[])
    }

    pub fn scheduled_for(&self, day: u8) -> &[AnimeItem] {
        self.schedule
            .as_ref()
            .map(|schedule| schedule.for_day(day))
            .unwrap_or(&[])
    }
}

// ============================================================================
// Operation options
// ============================================================================

/// Options for a list-by-type request
#[derive(Debug, Clone, PartialEq)]
pub struct ListOptions {
    /// Zero-based page index
    pub page: u32,
    /// Page size
    pub count: u32,
    /// Genre slug; empty means unfiltered
    pub genre: String,
}

impl Default for ListOptions {
    fn default() -> Self {
        Self {
            page: 0,
            count: defaults::LIST_PAGE_SIZE,
            genre: String::new(),
        }
    }
}

/// Options for a search request
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOptions {
    pub page: u32,
    pub count: u32,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            page: 0,
            count: defaults::SEARCH_PAGE_SIZE,
        }
    }
}

/// Options for stream resolution
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StreamOptions {
    pub quality: Quality,
}
