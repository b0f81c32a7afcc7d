use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::config::SearchConfig;
use crate::error::SearchError;
use crate::models::ResultItem;

/// Remote search capability consumed by the widget.
///
/// Implementations return hits in relevance order and must not hold
/// per-widget state: one instance is shared by every mounted widget.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SearchIndex: Send + Sync {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<ResultItem>, SearchError>;
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    hits: Vec<ResultItem>,
}

/// Meilisearch-backed index, queried through `POST /indexes/{index}/search`.
#[derive(Clone)]
pub struct MeiliSearchService {
    client: reqwest::Client,
    base_url: String,
    index: String,
}

impl MeiliSearchService {
    pub fn new(settings: &SearchConfig) -> Self {
        Self::with_client(reqwest::Client::new(), &settings.base_url, &settings.index)
    }

    pub fn with_client(client: reqwest::Client, base_url: &str, index: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            index: index.to_string(),
        }
    }

    pub fn index(&self) -> &str {
        &self.index
    }

    fn search_url(&self) -> String {
        format!("{}/indexes/{}/search", self.base_url, self.index)
    }
}

#[async_trait]
impl SearchIndex for MeiliSearchService {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<ResultItem>, SearchError> {
        debug!(index = %self.index, query, limit, "querying meilisearch");

        let response = self
            .client
            .post(self.search_url())
            .json(&json!({ "q": query, "limit": limit }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SearchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.bytes().await?;
        let parsed: SearchResponse = serde_json::from_slice(&body)?;
        Ok(parsed.hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{web, App, HttpResponse};
    use serde_json::Value;

    async fn fake_search(path: web::Path<String>, body: web::Json<Value>) -> HttpResponse {
        let index = path.into_inner();
        if index != "questions" {
            return HttpResponse::NotFound()
                .json(json!({ "message": format!("Index `{}` not found.", index) }));
        }
        let query = body["q"].as_str().unwrap_or_default().to_string();
        let limit = body["limit"].as_u64().unwrap_or(20);
        if query == "garbage" {
            return HttpResponse::Ok()
                .content_type("application/json")
                .body("{\"hits\": [");
        }
        let hits: Vec<Value> = (0..limit.min(2))
            .map(|n| json!({ "id": n, "title": format!("{} #{}", query, n) }))
            .collect();
        HttpResponse::Ok().json(json!({
            "hits": hits,
            "query": query,
            "limit": limit,
            "processingTimeMs": 1,
            "estimatedTotalHits": hits.len(),
        }))
    }

    fn start_fake_meili() -> actix_test::TestServer {
        actix_test::start(|| {
            App::new().route("/indexes/{index}/search", web::post().to(fake_search))
        })
    }

    #[actix_rt::test]
    async fn posts_query_and_limit_and_returns_hits_in_order() {
        let srv = start_fake_meili();
        let service = MeiliSearchService::with_client(reqwest::Client::new(), &srv.url(""), "questions");

        let hits = service.search("recursion", 5).await.unwrap();

        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].id(), Some(&json!(0)));
        assert_eq!(hits[0].get("title"), Some(&json!("recursion #0")));
        assert_eq!(hits[1].id(), Some(&json!(1)));
    }

    #[actix_rt::test]
    async fn non_success_status_is_reported_with_body() {
        let srv = start_fake_meili();
        let service = MeiliSearchService::with_client(reqwest::Client::new(), &srv.url(""), "books");

        let err = service.search("hobbit", 5).await.unwrap_err();

        match err {
            SearchError::Status { status, body } => {
                assert_eq!(status, 404);
                assert!(body.contains("books"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[actix_rt::test]
    async fn malformed_body_is_a_decode_error() {
        let srv = start_fake_meili();
        let service = MeiliSearchService::with_client(reqwest::Client::new(), &srv.url(""), "questions");

        let err = service.search("garbage", 5).await.unwrap_err();

        assert!(matches!(err, SearchError::Decode(_)));
    }

    #[actix_rt::test]
    async fn unreachable_host_is_a_transport_error() {
        let service =
            MeiliSearchService::with_client(reqwest::Client::new(), "http://127.0.0.1:1", "questions");

        let err = service.search("anything", 5).await.unwrap_err();

        assert!(matches!(err, SearchError::Transport(_)));
    }

    #[test]
    fn search_url_ignores_trailing_slash() {
        let service =
            MeiliSearchService::with_client(reqwest::Client::new(), "http://127.0.0.1:7700/", "questions");
        assert_eq!(service.search_url(), "http://127.0.0.1:7700/indexes/questions/search");
    }
}
