//! Typed client for the anime catalog
//!
//! [`AnimeClient`] exposes the catalog operations and normalizes what comes
//! back. It reaches the upstream only through a [`GatewayTransport`]: either
//! [`HttpTransport`] talking to a running gateway, or a [`Gateway`] used
//! in-process. Every operation catches failures at its boundary, logs them,
//! and surfaces one [`ClientError`] with a human-readable message.

use std::future::Future;
use std::time::Duration;

use reqwest::Client;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use crate::config::ClientConfig;
use crate::constants::{endpoints, form};
use crate::error::{ClientError, ClientResult};
use crate::gateway::Gateway;
use crate::models::{
    AnimeItem, AnimeType, GatewayRequest, Genre, HomepageData, ListOptions, SearchOptions,
    StreamOptions,
};
use crate::normalize::{
    error_message, find_genre_id, normalize_anime, normalize_anime_list, normalize_genres,
    normalize_homepage, value_to_string,
};

/// How the client reaches the forwarding gateway
pub trait GatewayTransport: Send + Sync {
    /// Send one logical request and return the relayed JSON
    fn call(&self, request: GatewayRequest) -> impl Future<Output = ClientResult<Value>> + Send;
}

/// Turn an error envelope in a relayed body into a client error
fn check_envelope(value: Value) -> ClientResult<Value> {
    match error_message(&value) {
        Some(message) => Err(ClientError::upstream(message)),
        None => Ok(value),
    }
}

impl GatewayTransport for Gateway {
    async fn call(&self, request: GatewayRequest) -> ClientResult<Value> {
        let value = self
            .forward(&request)
            .await
            .map_err(|e| ClientError::upstream(e.to_string()))?;
        check_envelope(value)
    }
}

/// Transport that POSTs gateway requests to a running gateway over HTTP
pub struct HttpTransport {
    client: Client,
    gateway_url: String,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| ClientError::upstream(e.to_string()))?;

        Ok(Self {
            client,
            gateway_url: config.gateway_url.clone(),
        })
    }
}

impl GatewayTransport for HttpTransport {
    async fn call(&self, request: GatewayRequest) -> ClientResult<Value> {
        let response = self
            .client
            .post(&self.gateway_url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!("Proxy request error: {}", e);
                let message = e.to_string();
                if message.is_empty() {
                    ClientError::upstream("Network Error")
                } else {
                    ClientError::upstream(message)
                }
            })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ClientError::upstream(e.to_string()))?;
        let parsed: Result<Value, _> = serde_json::from_str(&text);

        if !status.is_success() {
            let message = parsed
                .ok()
                .and_then(|value| error_message(&value))
                .unwrap_or_else(|| format!("Gateway returned status {}", status.as_u16()));
            return Err(ClientError::upstream(message));
        }

        let value = parsed
            .map_err(|e| ClientError::upstream(format!("Invalid gateway response: {}", e)))?;
        check_envelope(value)
    }
}

/// Log a failed operation and apply its fallback message
fn at_boundary<V>(result: ClientResult<V>, operation: &str, fallback: &str) -> ClientResult<V> {
    result.map_err(|e| {
        error!("{} error: {}", operation, e);
        e.or_message(fallback)
    })
}

/// Race an operation against a view's cancellation token
///
/// A cancelled operation resolves to [`ClientError::Cancelled`] and its
/// in-flight request is dropped, so a stale response never reaches the view.
pub async fn cancellable<F, V>(token: &CancellationToken, operation: F) -> ClientResult<V>
where
    F: Future<Output = ClientResult<V>>,
{
    if token.is_cancelled() {
        return Err(ClientError::Cancelled);
    }

    tokio::select! {
        biased;
        _ = token.cancelled() => {
            debug!("Operation cancelled by its owner");
            Err(ClientError::Cancelled)
        }
        result = operation => result,
    }
}

/// Catalog client over a gateway transport
pub struct AnimeClient<T = HttpTransport> {
    transport: T,
}

impl AnimeClient<HttpTransport> {
    /// Client talking to the gateway named in the config
    pub fn from_config(config: &ClientConfig) -> ClientResult<Self> {
        Ok(Self::new(HttpTransport::new(config)?))
    }
}

impl<T: GatewayTransport> AnimeClient<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Homepage feed: recommended, ongoing, schedule and announcements
    pub async fn homepage(&self) -> ClientResult<HomepageData> {
        at_boundary(
            self.fetch_homepage().await,
            "Homepage",
            "Failed to fetch homepage",
        )
    }

    /// One page of anime of the given type
    ///
    /// A non-empty `genre` slug is resolved against the genre list first; a
    /// slug that matches nothing lists unfiltered instead of failing. The
    /// caller accumulates pages; see [`crate::pagination::PageAccumulator`].
    pub async fn anime_list(
        &self,
        anime_type: &str,
        options: ListOptions,
    ) -> ClientResult<Vec<AnimeItem>> {
        at_boundary(
            self.fetch_anime_list(anime_type, options).await,
            "Anime list",
            "Failed to fetch anime list",
        )
    }

    /// All genres, in upstream order
    pub async fn genre_list(&self) -> ClientResult<Vec<Genre>> {
        at_boundary(
            self.fetch_genres().await,
            "Genre list",
            "Failed to fetch genres",
        )
    }

    /// One page of search results
    pub async fn search(&self, query: &str, options: SearchOptions) -> ClientResult<Vec<AnimeItem>> {
        at_boundary(
            self.fetch_search(query, options).await,
            "Search",
            "Failed to search anime",
        )
    }

    /// Full anime detail with episodes sorted ascending
    pub async fn detail(&self, id: &str) -> ClientResult<AnimeItem> {
        at_boundary(
            self.fetch_detail(id).await,
            "Detail",
            "Failed to fetch anime details",
        )
    }

    /// Resolve a playable URL for one episode
    ///
    /// Two sequential calls: the server list for the episode, then the video
    /// URL for that server at the requested quality.
    pub async fn stream(
        &self,
        anime_id: &str,
        episode_id: &str,
        options: StreamOptions,
    ) -> ClientResult<String> {
        at_boundary(
            self.fetch_stream(anime_id, episode_id, options).await,
            "Stream",
            "Failed to get stream URL",
        )
    }

    async fn fetch_homepage(&self) -> ClientResult<HomepageData> {
        let value = self
            .transport
            .call(GatewayRequest::get(endpoints::HOMEPAGE))
            .await?;
        Ok(normalize_homepage(&value))
    }

    async fn fetch_anime_list(
        &self,
        anime_type: &str,
        options: ListOptions,
    ) -> ClientResult<Vec<AnimeItem>> {
        let anime_type: AnimeType = anime_type.parse()?;

        let genre_id = if options.genre.is_empty() {
            String::new()
        } else {
            let genres = self.genre_list().await?;
            match find_genre_id(&genres, &options.genre) {
                Some(id) => id.to_string(),
                None => {
                    debug!("No genre matches '{}', listing unfiltered", options.genre);
                    String::new()
                }
            }
        };

        let request = GatewayRequest::post(
            endpoints::ANIME_LIST,
            [
                ("perpage", options.count.to_string()),
                ("startpage", options.page.to_string()),
                ("userid", String::new()),
                ("sort", String::new()),
                ("genre", genre_id),
                ("jenisanime", anime_type.category_code().to_string()),
            ],
        );

        let value = self.transport.call(request).await?;
        Ok(normalize_anime_list(&value))
    }

    async fn fetch_genres(&self) -> ClientResult<Vec<Genre>> {
        let value = self
            .transport
            .call(GatewayRequest::get(endpoints::GENRES))
            .await?;
        Ok(normalize_genres(&value))
    }

    async fn fetch_search(&self, query: &str, options: SearchOptions) -> ClientResult<Vec<AnimeItem>> {
        if query.is_empty() {
            return Err(ClientError::validation("Query is required."));
        }

        let request = GatewayRequest::post(
            endpoints::SEARCH,
            [
                ("perpage", options.count.to_string()),
                ("startpage", options.page.to_string()),
                ("q", query.to_string()),
            ],
        );

        let value = self.transport.call(request).await?;
        Ok(normalize_anime_list(&value))
    }

    async fn fetch_detail(&self, id: &str) -> ClientResult<AnimeItem> {
        let value = self
            .transport
            .call(GatewayRequest::post(endpoints::DETAIL, [("id", id)]))
            .await?;
        normalize_anime(&value).ok_or_else(|| ClientError::upstream("Anime not found"))
    }

    async fn fetch_stream(
        &self,
        anime_id: &str,
        episode_id: &str,
        options: StreamOptions,
    ) -> ClientResult<String> {
        if anime_id.is_empty() || episode_id.is_empty() {
            return Err(ClientError::validation("Anime id & episode id is required."));
        }

        let server = self
            .transport
            .call(GatewayRequest::post(
                endpoints::SERVER_LIST,
                [
                    ("id", episode_id),
                    ("animeId", anime_id),
                    ("jenisAnime", form::SERVER_LIST_KIND),
                    ("userId", ""),
                ],
            ))
            .await?;

        let server_url = server
            .get("serverurl")
            .and_then(value_to_string)
            .unwrap_or_else(|| {
                warn!("No serverurl for episode {}", episode_id);
                String::new()
            });

        let video = self
            .transport
            .call(GatewayRequest::post(
                endpoints::VIDEO_URL,
                [
                    ("url", server_url.as_str()),
                    ("quality", options.quality.as_str()),
                    ("position", form::START_POSITION),
                ],
            ))
            .await?;

        video
            .get("url")
            .and_then(value_to_string)
            .ok_or_else(|| ClientError::upstream("Stream url not found."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{HttpMethod, Quality};
    use mockito::{Matcher, Server};
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Transport double that records calls and replays scripted replies
    #[derive(Default)]
    struct RecordingTransport {
        calls: Mutex<Vec<GatewayRequest>>,
        replies: Mutex<VecDeque<ClientResult<Value>>>,
    }

    impl RecordingTransport {
        fn replying(replies: Vec<ClientResult<Value>>) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                replies: Mutex::new(replies.into()),
            }
        }

        fn calls(&self) -> Vec<GatewayRequest> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl GatewayTransport for RecordingTransport {
        async fn call(&self, request: GatewayRequest) -> ClientResult<Value> {
            self.calls.lock().unwrap().push(request);
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Ok(Value::Null))
        }
    }

    fn field<'a>(request: &'a GatewayRequest, key: &str) -> &'a str {
        request.field(key).and_then(Value::as_str).unwrap_or_default()
    }

    #[tokio::test]
    async fn test_unknown_type_fails_without_request() {
        let client = AnimeClient::new(RecordingTransport::default());
        let err = client
            .anime_list("tv", ListOptions::default())
            .await
            .unwrap_err();

        assert!(err.is_validation());
        assert_eq!(err.to_string(), "Available types: series, movie, ova, live-action.");
        assert!(client.transport().calls().is_empty());
    }

    #[tokio::test]
    async fn test_empty_search_fails_without_request() {
        let client = AnimeClient::new(RecordingTransport::default());
        let err = client.search("", SearchOptions::default()).await.unwrap_err();

        assert_eq!(err, ClientError::validation("Query is required."));
        assert!(client.transport().calls().is_empty());
    }

    #[tokio::test]
    async fn test_stream_requires_both_ids() {
        let client = AnimeClient::new(RecordingTransport::default());
        let err = client
            .stream("12", "", StreamOptions::default())
            .await
            .unwrap_err();

        assert_eq!(err, ClientError::validation("Anime id & episode id is required."));
        assert!(client.transport().calls().is_empty());
    }

    #[tokio::test]
    async fn test_anime_list_without_genre() {
        let transport = RecordingTransport::replying(vec![Ok(json!([
            { "id": 1, "title": "One", "poster": "p.jpg" },
            { "id": 2, "title": "Two" }
        ]))]);
        let client = AnimeClient::new(transport);

        let items = client
            .anime_list("movie", ListOptions { page: 2, count: 20, genre: String::new() })
            .await
            .unwrap();

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].image, "p.jpg");

        let calls = client.transport().calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].endpoint, "/anime/list");
        assert_eq!(calls[0].method, HttpMethod::Post);
        assert_eq!(field(&calls[0], "perpage"), "20");
        assert_eq!(field(&calls[0], "startpage"), "2");
        assert_eq!(field(&calls[0], "genre"), "");
        assert_eq!(field(&calls[0], "jenisanime"), "3");
    }

    #[tokio::test]
    async fn test_anime_list_resolves_genre_first() {
        let transport = RecordingTransport::replying(vec![
            Ok(json!([{ "id": "g1", "title": "Slice of Life" }, { "id": "g2", "title": "Action" }])),
            Ok(json!([])),
        ]);
        let client = AnimeClient::new(transport);

        let options = ListOptions { page: 0, count: 20, genre: "action".to_string() };
        client.anime_list("series", options).await.unwrap();

        let calls = client.transport().calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].endpoint, "/anime/genre");
        assert_eq!(calls[0].method, HttpMethod::Get);
        assert_eq!(calls[1].endpoint, "/anime/list");
        assert_eq!(field(&calls[1], "genre"), "g2");
        assert_eq!(field(&calls[1], "jenisanime"), "1");
    }

    #[tokio::test]
    async fn test_anime_list_unknown_genre_is_ignored() {
        let transport = RecordingTransport::replying(vec![
            Ok(json!([{ "id": "g1", "title": "Comedy" }])),
            Ok(json!([{ "id": 9, "title": "Anything" }])),
        ]);
        let client = AnimeClient::new(transport);

        let options = ListOptions { page: 0, count: 20, genre: "action".to_string() };
        let items = client.anime_list("series", options).await.unwrap();

        assert_eq!(items.len(), 1);
        let calls = client.transport().calls();
        assert_eq!(field(&calls[1], "genre"), "");
    }

    #[tokio::test]
    async fn test_genre_lookup_failure_propagates() {
        let transport = RecordingTransport::replying(vec![Err(ClientError::upstream("down"))]);
        let client = AnimeClient::new(transport);

        let options = ListOptions { genre: "action".to_string(), ..ListOptions::default() };
        let err = client.anime_list("ova", options).await.unwrap_err();

        assert_eq!(err, ClientError::upstream("down"));
        assert_eq!(client.transport().calls().len(), 1);
    }

    #[tokio::test]
    async fn test_whitespace_query_is_sent() {
        let client = AnimeClient::new(RecordingTransport::replying(vec![Ok(json!([]))]));
        let results = client.search(" ", SearchOptions::default()).await.unwrap();

        assert!(results.is_empty());
        let calls = client.transport().calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(field(&calls[0], "q"), " ");
    }

    #[tokio::test]
    async fn test_search_sends_query() {
        let transport = RecordingTransport::replying(vec![Ok(json!([{ "id": 1, "title": "Naruto" }]))]);
        let client = AnimeClient::new(transport);

        let results = client.search("naruto", SearchOptions::default()).await.unwrap();
        assert_eq!(results[0].title, "Naruto");

        let calls = client.transport().calls();
        assert_eq!(calls[0].endpoint, "/anime/search");
        assert_eq!(field(&calls[0], "q"), "naruto");
        assert_eq!(field(&calls[0], "perpage"), "25");
        assert_eq!(field(&calls[0], "startpage"), "0");
    }

    #[tokio::test]
    async fn test_detail_sorts_episodes() {
        let transport = RecordingTransport::replying(vec![Ok(json!({
            "id": "77",
            "title": "Frieren",
            "content": "An elf mage",
            "episodes": [
                { "id": "e2", "number": 2 },
                { "id": "e1", "number": 1 }
            ]
        }))]);
        let client = AnimeClient::new(transport);

        let anime = client.detail("77").await.unwrap();
        assert_eq!(anime.description.as_deref(), Some("An elf mage"));
        assert_eq!(anime.episodes[0].id, "e1");
        assert_eq!(field(&client.transport().calls()[0], "id"), "77");
    }

    #[tokio::test]
    async fn test_detail_non_object_is_upstream_error() {
        let client = AnimeClient::new(RecordingTransport::replying(vec![Ok(json!([]))]));
        let err = client.detail("1").await.unwrap_err();
        assert_eq!(err, ClientError::upstream("Anime not found"));
    }

    #[tokio::test]
    async fn test_stream_two_sequential_calls() {
        let transport = RecordingTransport::replying(vec![
            Ok(json!({ "serverurl": "https://srv.example/ep/5" })),
            Ok(json!({ "url": "https://cdn.example/ep5.m3u8" })),
        ]);
        let client = AnimeClient::new(transport);

        let url = client
            .stream("12", "5", StreamOptions { quality: Quality::Sd })
            .await
            .unwrap();
        assert_eq!(url, "https://cdn.example/ep5.m3u8");

        let calls = client.transport().calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].endpoint, "/anime/get-server-list");
        assert_eq!(field(&calls[0], "id"), "5");
        assert_eq!(field(&calls[0], "animeId"), "12");
        assert_eq!(field(&calls[0], "jenisAnime"), "1");
        assert_eq!(field(&calls[0], "userId"), "");
        assert_eq!(calls[1].endpoint, "/anime/get-url-video");
        assert_eq!(field(&calls[1], "url"), "https://srv.example/ep/5");
        assert_eq!(field(&calls[1], "quality"), "SD");
        assert_eq!(field(&calls[1], "position"), "0");
    }

    #[tokio::test]
    async fn test_stream_missing_url() {
        let transport = RecordingTransport::replying(vec![
            Ok(json!({ "serverurl": "https://srv.example/ep/5" })),
            Ok(json!({ "status": "ok" })),
        ]);
        let client = AnimeClient::new(transport);

        let err = client
            .stream("12", "5", StreamOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Stream url not found.");
        assert_eq!(client.transport().calls().len(), 2);
    }

    #[tokio::test]
    async fn test_stream_server_list_failure_stops() {
        let transport = RecordingTransport::replying(vec![Err(ClientError::upstream("gone"))]);
        let client = AnimeClient::new(transport);

        let err = client
            .stream("12", "5", StreamOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err, ClientError::upstream("gone"));
        assert_eq!(client.transport().calls().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_upstream_message_uses_fallback() {
        let client = AnimeClient::new(RecordingTransport::replying(vec![Err(
            ClientError::upstream(""),
        )]));
        let err = client.homepage().await.unwrap_err();
        assert_eq!(err, ClientError::upstream("Failed to fetch homepage"));
    }

    #[tokio::test]
    async fn test_homepage_normalized() {
        let client = AnimeClient::new(RecordingTransport::replying(vec![Ok(json!({
            "recommended": [{ "id": 1, "title": "R" }],
            "schedule": { "3": [{ "id": 2, "title": "Tue" }] }
        }))]));

        let homepage = client.homepage().await.unwrap();
        assert_eq!(homepage.recommended()[0].title, "R");
        assert_eq!(homepage.scheduled_for(3)[0].title, "Tue");
        assert_eq!(client.transport().calls()[0].endpoint, "/pages/homepage");
    }

    #[tokio::test]
    async fn test_cancellable_passes_result_through() {
        let token = CancellationToken::new();
        let result = cancellable(&token, async { Ok::<_, ClientError>(7) }).await;
        assert_eq!(result, Ok(7));
    }

    #[tokio::test]
    async fn test_cancellable_already_cancelled() {
        let token = CancellationToken::new();
        token.cancel();
        let client = AnimeClient::new(RecordingTransport::default());

        let result = cancellable(&token, client.genre_list()).await;
        assert!(result.unwrap_err().is_cancelled());
        assert!(client.transport().calls().is_empty());
    }

    #[tokio::test]
    async fn test_cancellable_drops_pending_operation() {
        let token = CancellationToken::new();
        let child = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            child.cancel();
        });

        let result: ClientResult<()> = cancellable(&token, std::future::pending()).await;
        assert_eq!(result, Err(ClientError::Cancelled));
    }

    #[tokio::test]
    async fn test_http_transport_posts_gateway_request() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/proxy")
            .match_header("content-type", "application/json")
            .match_body(Matcher::Json(json!({ "endpoint": "/anime/genre", "method": "GET" })))
            .with_status(200)
            .with_body(r#"[{"id":"1","title":"Action"}]"#)
            .create_async()
            .await;

        let config = ClientConfig {
            gateway_url: format!("{}/proxy", server.url()),
        };
        let client = AnimeClient::from_config(&config).unwrap();
        let genres = client.genre_list().await.unwrap();

        mock.assert_async().await;
        assert_eq!(genres, vec![Genre { id: "1".to_string(), title: "Action".to_string() }]);
    }

    #[tokio::test]
    async fn test_http_transport_error_envelope() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/proxy")
            .with_status(500)
            .with_body(r#"{"error":"Failed to connect to upstream: Connection timeout"}"#)
            .create_async()
            .await;

        let config = ClientConfig {
            gateway_url: format!("{}/proxy", server.url()),
        };
        let client = AnimeClient::from_config(&config).unwrap();
        let err = client.detail("1").await.unwrap_err();
        assert_eq!(
            err,
            ClientError::upstream("Failed to connect to upstream: Connection timeout")
        );
    }

    #[tokio::test]
    async fn test_http_transport_error_field_on_success() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/proxy")
            .with_status(200)
            .with_body(r#"{"error":"Invalid API key"}"#)
            .create_async()
            .await;

        let config = ClientConfig {
            gateway_url: format!("{}/proxy", server.url()),
        };
        let client = AnimeClient::from_config(&config).unwrap();
        let err = client.homepage().await.unwrap_err();
        assert_eq!(err, ClientError::upstream("Invalid API key"));
    }

    #[tokio::test]
    async fn test_http_transport_status_without_body() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/proxy")
            .with_status(503)
            .create_async()
            .await;

        let config = ClientConfig {
            gateway_url: format!("{}/proxy", server.url()),
        };
        let client = AnimeClient::from_config(&config).unwrap();
        let err = client.genre_list().await.unwrap_err();
        assert_eq!(err, ClientError::upstream("Gateway returned status 503"));
    }
}
