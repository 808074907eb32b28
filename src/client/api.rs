use std::{sync::Arc, time::Duration};

use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use thiserror::Error;

use super::{
    cache::{CacheStore, FileCacheStore, MemoryCacheStore},
    resource::Resource,
};
use crate::{
    config::ClientConfig,
    error::ErrorBody,
    posts::repo_types::Post,
    vocabulary::repo_types::{NewVocabulary, Vocabulary},
};

const DEFAULT_DEDUPE: Duration = Duration::from_secs(1);

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server answered {status}: {message}")]
    Status { status: u16, message: String },
}

#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    store: Arc<dyn CacheStore>,
    dedupe_interval: Duration,
}

impl ApiClient {
    /// Client with an in-memory cache.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            store: Arc::new(MemoryCacheStore::new()),
            dedupe_interval: DEFAULT_DEDUPE,
        }
    }

    /// Client with the durable file cache named in `config`.
    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.api_url.clone())
            .with_store(Arc::new(FileCacheStore::new(&config.cache_file)))
            .with_dedupe_interval(config.dedupe_interval)
    }

    pub fn with_store(mut self, store: Arc<dyn CacheStore>) -> Self {
        self.store = store;
        self
    }

    pub fn with_dedupe_interval(mut self, interval: Duration) -> Self {
        self.dedupe_interval = interval;
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn decode<T: DeserializeOwned>(res: Response) -> Result<T, ClientError> {
        let status = res.status();
        if !status.is_success() {
            let message = match res.json::<ErrorBody>().await {
                Ok(body) => body.message,
                Err(_) => status.canonical_reason().unwrap_or("error").to_string(),
            };
            return Err(ClientError::Status {
                status: status.as_u16(),
                message,
            });
        }
        Ok(res.json::<T>().await?)
    }

    pub async fn get_posts(&self) -> Result<Vec<Post>, ClientError> {
        let res = self.http.get(self.url("/api/posts")).send().await?;
        Self::decode(res).await
    }

    pub async fn get_post(&self, id: i64) -> Result<Option<Post>, ClientError> {
        let res = self.http.get(self.url(&format!("/api/posts/{id}"))).send().await?;
        Self::decode(res).await
    }

    pub async fn list_vocabulary(&self, keyword: Option<&str>) -> Result<Vec<Vocabulary>, ClientError> {
        let mut req = self.http.get(self.url("/api/vocabularys"));
        if let Some(keyword) = keyword {
            req = req.query(&[("keyword", keyword)]);
        }
        Self::decode(req.send().await?).await
    }

    pub async fn get_vocabulary(&self, id: i64) -> Result<Option<Vocabulary>, ClientError> {
        let res = self
            .http
            .get(self.url(&format!("/api/vocabularies/{id}")))
            .send()
            .await?;
        Self::decode(res).await
    }

    pub async fn create_vocabulary(&self, record: &NewVocabulary) -> Result<Vocabulary, ClientError> {
        let res = self
            .http
            .post(self.url("/api/vocabularies"))
            .json(record)
            .send()
            .await?;
        Self::decode(res).await
    }

    pub async fn update_vocabulary(
        &self,
        id: i64,
        record: &NewVocabulary,
    ) -> Result<Option<Vocabulary>, ClientError> {
        let res = self
            .http
            .put(self.url(&format!("/api/vocabularies/{id}")))
            .json(record)
            .send()
            .await?;
        Self::decode(res).await
    }

    pub async fn delete_vocabulary(&self, id: i64) -> Result<Option<Vocabulary>, ClientError> {
        let res = self
            .http
            .delete(self.url(&format!("/api/vocabularies/{id}")))
            .send()
            .await?;
        Self::decode(res).await
    }

    /// Cached `GET /api/posts`.
    pub async fn posts_resource(&self) -> Resource<Vec<Post>> {
        let client = self.clone();
        Resource::load(
            "/api/posts".into(),
            self.store.clone(),
            self.dedupe_interval,
            move || {
                let client = client.clone();
                async move { client.get_posts().await }
            },
        )
        .await
    }

    /// Cached `GET /api/vocabularys`, one cache entry per keyword.
    pub async fn vocabulary_resource(&self, keyword: Option<&str>) -> Resource<Vec<Vocabulary>> {
        let key = match keyword {
            Some(k) => format!("/api/vocabularys?keyword={k}"),
            None => "/api/vocabularys".to_string(),
        };
        let client = self.clone();
        let keyword = keyword.map(str::to_owned);
        Resource::load(key, self.store.clone(), self.dedupe_interval, move || {
            let client = client.clone();
            let keyword = keyword.clone();
            async move { client.list_vocabulary(keyword.as_deref()).await }
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{app::build_app, posts::repo, state::AppState};
    use sqlx::SqlitePool;

    async fn spawn_server() -> (String, SqlitePool) {
        let state = AppState::fake().await;
        let db = state.db.clone();
        let app = build_app(state);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{addr}"), db)
    }

    #[tokio::test]
    async fn vocabulary_crud_end_to_end() {
        let (url, _db) = spawn_server().await;
        let client = ApiClient::new(url);

        let created = client
            .create_vocabulary(&NewVocabulary::new("hello", "你好"))
            .await
            .unwrap();
        assert_eq!(created.id, 1);
        assert_eq!(created.translation, "你好");

        assert_eq!(client.get_vocabulary(1).await.unwrap(), Some(created.clone()));

        let updated = client
            .update_vocabulary(1, &NewVocabulary::new("hello", "您好"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.translation, "您好");

        let hits = client.list_vocabulary(Some("ell")).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert!(client.list_vocabulary(Some("zzz")).await.unwrap().is_empty());

        assert_eq!(client.delete_vocabulary(1).await.unwrap(), Some(updated));
        assert_eq!(client.get_vocabulary(1).await.unwrap(), None);
        assert_eq!(client.delete_vocabulary(1).await.unwrap(), None);
    }

    #[tokio::test]
    async fn invalid_write_surfaces_status() {
        let (url, _db) = spawn_server().await;
        let client = ApiClient::new(url);

        let err = client
            .create_vocabulary(&NewVocabulary::new("", "x"))
            .await
            .unwrap_err();
        match err {
            ClientError::Status { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "failed to create vocabulary");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn posts_resource_caches_until_mutated() {
        let (url, db) = spawn_server().await;
        let client = ApiClient::new(url).with_dedupe_interval(Duration::from_secs(60));
        let posts = client.posts_resource().await;

        assert_eq!(posts.revalidate().await.data, Some(vec![]));

        repo::tests::seed(&db, &[repo::tests::sample_post(5, "new")]).await;
        assert_eq!(posts.revalidate().await.data, Some(vec![]));

        let state = posts.mutate(None).await;
        let ids: Vec<i64> = state.data.unwrap().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![5]);
        assert_eq!(client.get_post(5).await.unwrap().unwrap().name, "new");
        assert_eq!(client.get_post(6).await.unwrap(), None);
    }

    #[tokio::test]
    async fn vocabulary_resources_are_keyed_by_keyword() {
        let (url, _db) = spawn_server().await;
        let client = ApiClient::new(url).with_dedupe_interval(Duration::ZERO);
        client
            .create_vocabulary(&NewVocabulary::new("apple", "苹果"))
            .await
            .unwrap();
        client
            .create_vocabulary(&NewVocabulary::new("banana", "香蕉"))
            .await
            .unwrap();

        let all = client.vocabulary_resource(None).await;
        let apples = client.vocabulary_resource(Some("app")).await;
        assert_ne!(all.key(), apples.key());

        assert_eq!(all.revalidate().await.data.unwrap().len(), 2);
        assert_eq!(apples.revalidate().await.data.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn unreachable_server_sets_error_without_retry() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let store = Arc::new(MemoryCacheStore::new());
        store
            .put("/api/posts", serde_json::json!([]))
            .await
            .unwrap();
        let client = ApiClient::new(format!("http://{addr}")).with_store(store);
        let posts = client.posts_resource().await;

        let state = posts.revalidate().await;
        assert_eq!(state.data, Some(vec![]));
        assert!(state.error.is_some());
        assert!(!state.is_validating);
    }

    #[tokio::test]
    async fn file_cache_is_shared_across_clients() {
        let (url, _db) = spawn_server().await;
        let dir = tempfile::tempdir().unwrap();
        let config = ClientConfig {
            api_url: url,
            cache_file: dir.path().join("cache.json"),
            dedupe_interval: Duration::from_millis(1000),
        };

        let first = ApiClient::from_config(&config);
        first.posts_resource().await.revalidate().await;

        let second = ApiClient::from_config(&config);
        let posts = second.posts_resource().await;
        assert_eq!(posts.snapshot().await.data, Some(vec![]));
    }
}
