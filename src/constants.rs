//! Constants module for shinime
//!
//! Upstream endpoint paths, form-field values and defaults shared by the
//! gateway and the client.

/// Logical endpoint paths on the upstream API
pub mod endpoints {
    /// Homepage feed (GET)
    pub const HOMEPAGE: &str = "/pages/homepage";
    /// Paginated list by type (POST)
    pub const ANIME_LIST: &str = "/anime/list";
    /// Genre list (GET)
    pub const GENRES: &str = "/anime/genre";
    /// Search (POST)
    pub const SEARCH: &str = "/anime/search";
    /// Anime detail with episodes (POST)
    pub const DETAIL: &str = "/anime/detail";
    /// Server/location descriptor for an episode (POST)
    pub const SERVER_LIST: &str = "/anime/get-server-list";
    /// Playable video URL for a server URL (POST)
    pub const VIDEO_URL: &str = "/anime/get-url-video";
}

/// Default values used when configuration or options are omitted
pub mod defaults {
    pub const HOST: &str = "127.0.0.1";
    pub const PORT: u16 = 8080;
    pub const UPSTREAM_BASE_URL: &str = "https://air.vunime.my.id/mobinime";
    pub const USER_AGENT: &str = "Dart/3.3 (dart:io)";
    pub const GATEWAY_URL: &str = "http://127.0.0.1:8080/proxy";

    /// Page size for list-by-type requests
    pub const LIST_PAGE_SIZE: u32 = 15;
    /// Page size for search requests
    pub const SEARCH_PAGE_SIZE: u32 = 25;
    /// Page size the list and search views request when loading more
    pub const VIEW_PAGE_SIZE: u32 = 20;

    /// Image used when an anime carries no image field at all
    pub const PLACEHOLDER_IMAGE: &str = "/placeholder.svg";
}

/// Fixed form values the upstream expects
pub mod form {
    /// `jenisAnime` sent with server-list lookups
    pub const SERVER_LIST_KIND: &str = "1";
    /// Playback position requested from the video URL endpoint
    pub const START_POSITION: &str = "0";
}

/// Headers attached to every gateway response
pub mod cors {
    pub const ALLOW_ORIGIN: &str = "*";
    pub const ALLOW_HEADERS: &str = "authorization, x-client-info, apikey, content-type";
}

/// Content type the upstream expects for request bodies
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded; charset=utf-8";

/// Schedule day names keyed by the upstream convention (1 = Sunday)
pub const DAY_NAMES: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];
