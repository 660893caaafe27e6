//! HTTP exposition: `/metrics`, `/health` and a landing page.

use crate::collectors::exporter::{ExporterCollector, ScraperCollector};
use crate::collectors::{CollectionEngine, MetricFamily};
use anyhow::{Context, Result};
use axum::{
    Json, Router,
    body::Body,
    extract::State,
    http::{HeaderName, HeaderValue, Request, StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::get,
};
use prometheus::{Encoder, Registry, TextEncoder};
use serde_json::json;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};
use tracing::{error, info, info_span, warn};
use ulid::Ulid;

const REQUEST_ID: &str = "x-request-id";

#[derive(Clone, Default)]
struct MakeRequestUlid;

impl MakeRequestId for MakeRequestUlid {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Ulid::new().to_string())
            .ok()
            .map(RequestId::new)
    }
}

#[derive(Clone)]
pub struct AppState {
    engine: Arc<Mutex<CollectionEngine>>,
    exporter: ExporterCollector,
    registry: Registry,
}

impl AppState {
    /// Wire the engine to the exporter self-metrics.
    ///
    /// # Errors
    ///
    /// Returns an error if the self-metrics cannot be created or registered.
    pub fn new(engine: CollectionEngine) -> Result<Self> {
        let exporter = ExporterCollector::new()?;
        let registry = Registry::new();
        exporter.register_metrics(&registry)?;

        let engine = engine.with_scraper(Arc::clone(exporter.scraper()));

        Ok(Self {
            engine: Arc::new(Mutex::new(engine)),
            exporter,
            registry,
        })
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/metrics", get(metrics))
        .route("/health", get(health))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(
                    HeaderName::from_static(REQUEST_ID),
                    MakeRequestUlid,
                ))
                .layer(
                    TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                        let request_id = request
                            .headers()
                            .get(REQUEST_ID)
                            .and_then(|v| v.to_str().ok())
                            .unwrap_or_default();
                        info_span!(
                            "http.request",
                            method = %request.method(),
                            uri = %request.uri(),
                            request_id = %request_id,
                            otel.kind = "server"
                        )
                    }),
                )
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                    REQUEST_ID,
                )))
                .layer(SetResponseHeaderLayer::if_not_present(
                    header::SERVER,
                    HeaderValue::from_static(concat!(
                        env!("CARGO_PKG_NAME"),
                        "/",
                        env!("CARGO_PKG_VERSION")
                    )),
                )),
        )
        .with_state(state)
}

/// Serve until Ctrl-C.
///
/// # Errors
///
/// Returns an error if the listener cannot be bound or the server fails.
pub async fn new(port: u16, listen: Option<String>, engine: CollectionEngine) -> Result<()> {
    let app = router(AppState::new(engine)?);
    let listener = bind(port, listen.as_deref()).await?;

    info!(address = %listener.local_addr()?, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")
}

/// Bind `listen`, or `[::]` with a fallback to `0.0.0.0` when unset.
async fn bind(port: u16, listen: Option<&str>) -> Result<TcpListener> {
    if let Some(listen) = listen {
        let ip: IpAddr = listen
            .parse()
            .with_context(|| format!("invalid listen address '{listen}'"))?;
        return TcpListener::bind(SocketAddr::new(ip, port))
            .await
            .with_context(|| format!("failed to bind {ip}:{port}"));
    }

    match TcpListener::bind(SocketAddr::new(IpAddr::V6(Ipv6Addr::UNSPECIFIED), port)).await {
        Ok(listener) => Ok(listener),
        Err(e) => {
            warn!(error = %e, "IPv6 bind failed, falling back to IPv4");
            TcpListener::bind(SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), port))
                .await
                .with_context(|| format!("failed to bind 0.0.0.0:{port}"))
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for Ctrl-C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("shutting down");
}

async fn root() -> Html<&'static str> {
    Html(
        "<html><head><title>Informix Exporter</title></head><body><h1>Informix Exporter</h1><p><a href=\"/metrics\">Metrics</a></p><p><a href=\"/health\">Health</a></p></body></html>",
    )
}

/// Encode the scrape result followed by the exporter's own metrics.
fn render(
    families: &[MetricFamily],
    self_metrics: &Registry,
    scraper: &ScraperCollector,
) -> Result<String> {
    let registry = Registry::new();
    let mut registered: i64 = 0;
    for family in families {
        match family.register(&registry) {
            Ok(()) => registered += 1,
            Err(e) => warn!(family = family.name(), error = %e, "skipping metric family"),
        }
    }
    scraper.update_metrics_count(registered);

    let mut gathered = registry.gather();
    gathered.extend(self_metrics.gather());

    let mut buffer = Vec::new();
    TextEncoder::new().encode(&gathered, &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}

async fn metrics(State(state): State<AppState>) -> Response {
    state.exporter.refresh();

    let result = {
        let mut engine = state.engine.lock().await;
        engine.collect().await
    };

    let families = match result {
        Ok(families) => families,
        Err(e) => {
            error!(error = %e, "scrape failed");
            return (StatusCode::INTERNAL_SERVER_ERROR, format!("scrape failed: {e}\n"))
                .into_response();
        }
    };

    match render(&families, &state.registry, state.exporter.scraper()) {
        Ok(body) => (
            [(header::CONTENT_TYPE, TextEncoder::new().format_type().to_string())],
            body,
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "failed to encode metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, format!("encoding failed: {e}\n")).into_response()
        }
    }
}

async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    // never wait behind a running scrape
    let body = match state.engine.try_lock() {
        Ok(engine) => json!({
            "status": if engine.is_connected() { "ok" } else { "disconnected" },
            "connected": engine.is_connected(),
            "version": engine.version().major(),
            "server": engine.identity().dbhostname(),
        }),
        Err(_) => json!({
            "status": "scraping",
            "connected": null,
            "version": null,
        }),
    };

    Json(body)
}
