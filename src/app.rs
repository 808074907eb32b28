use axum::{routing::get, Json, Router};
use serde::Serialize;
use tower_http::{catch_panic::CatchPanicLayer, cors::CorsLayer, trace::TraceLayer};

use crate::config::AppConfig;
use crate::error::panic_response;
use crate::state::AppState;
use crate::{posts, vocabulary};

#[derive(Debug, Serialize)]
pub struct RouteInfo {
    pub api: &'static str,
    pub desc: &'static str,
    pub method: &'static str,
}

const ROUTES: &[RouteInfo] = &[
    RouteInfo { api: "/api/posts", desc: "list all posts", method: "GET" },
    RouteInfo { api: "/api/posts/:id", desc: "get one post", method: "GET" },
    RouteInfo { api: "/api/vocabularys?keyword=", desc: "list or search vocabulary", method: "GET" },
    RouteInfo { api: "/api/vocabularies/:id", desc: "get one vocabulary entry", method: "GET" },
    RouteInfo { api: "/api/vocabularies", desc: "create a vocabulary entry", method: "POST" },
    RouteInfo { api: "/api/vocabularies/:id", desc: "replace a vocabulary entry", method: "PUT" },
    RouteInfo { api: "/api/vocabularies/:id", desc: "delete a vocabulary entry", method: "DELETE" },
];

async fn index() -> Json<&'static [RouteInfo]> {
    Json(ROUTES)
}

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .nest(
            "/api",
            Router::new()
                .merge(posts::router())
                .merge(vocabulary::router())
                .layer(CorsLayer::permissive()),
        )
        .route("/", get(index))
        .route("/health", get(|| async { "ok" }))
        .with_state(state)
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!("http_request", %method, uri = %uri, status = tracing::field::Empty)
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        if status.is_server_error() {
                            tracing::error!(%status, ?latency, "response");
                        } else {
                            tracing::info!(%status, ?latency, "response");
                        }
                    },
                ),
        )
}

pub async fn serve(app: Router, config: &AppConfig) -> anyhow::Result<()> {
    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
