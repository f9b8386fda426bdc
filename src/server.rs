//! JSON HTTP API over the article store and the translation caches.

use crate::article::{is_all_categories, Article, NewArticle, ALL_CATEGORIES};
use crate::config::Config;
use crate::i18n::{
    Language, LanguageConfig, LanguageRegistry, MetricsReport, TranslationMetrics, UiStringCache,
    UiStrings, UnknownLanguage,
};
use crate::location::{GeoLocation, LocationDetector};
use crate::stats::ArticleStats;
use crate::storage::FileStorage;
use crate::store::ArticleStore;
use crate::translation::Translator;
use crate::translation_cache::TranslationCache;
use anyhow::Result;
use axum::{
    extract::{ConnectInfo, Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Shared handler state. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    store: Arc<Mutex<ArticleStore>>,
    translator: Translator,
    detector: LocationDetector,
    translations: Arc<TranslationCache>,
    ui_strings: Arc<UiStringCache>,
}

impl AppState {
    pub fn new(store: ArticleStore, translator: Translator, detector: LocationDetector) -> Self {
        Self {
            store: Arc::new(Mutex::new(store)),
            translator,
            detector,
            translations: Arc::new(TranslationCache::new()),
            ui_strings: Arc::new(UiStringCache::new()),
        }
    }

    /// Wire up file storage and the remote services described by `config`.
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = config.http_client()?;
        let storage = FileStorage::articles(&config.storage_dir);
        info!("Persisting articles to {}", storage.path().display());

        let metrics = Arc::new(TranslationMetrics::new());
        Ok(Self::new(
            ArticleStore::open(storage),
            Translator::from_config(client.clone(), config, metrics),
            LocationDetector::from_config(client, config),
        ))
    }

    // Never held across an await.
    fn store(&self) -> MutexGuard<'_, ArticleStore> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Translated rendition of `article` carrying its live view count.
    async fn localize(&self, article: Article, language: Language) -> Article {
        let translated = self
            .translations
            .ensure_translated(&self.translator, &article, language)
            .await;
        Article {
            views: article.views,
            ..translated
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/articles", get(list_articles).post(create_article))
        .route("/api/articles/:id", get(read_article))
        .route("/api/articles/:id/views", post(record_view))
        .route("/api/stats", get(stats))
        .route("/api/locale", get(locale))
        .route("/api/languages", get(languages))
        .route("/api/ui-strings", get(ui_strings))
        .route("/api/metrics", get(metrics))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the API on `listener` until the process is stopped.
pub async fn serve(listener: TcpListener, state: AppState) -> std::io::Result<()> {
    axum::serve(
        listener,
        router(state).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
}

// ==================== Errors ====================

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Article not found: {0}")]
    NotFound(String),

    #[error("Missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    #[error(transparent)]
    UnknownLanguage(#[from] UnknownLanguage),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::MissingFields(_) | ApiError::UnknownLanguage(_) => StatusCode::BAD_REQUEST,
        };
        let body = ErrorBody {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

// ==================== Request / Response Types ====================

#[derive(Debug, Deserialize)]
struct ListQuery {
    category: Option<String>,
    lang: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LangQuery {
    lang: Option<String>,
}

/// List entry with the content cut down to its preview.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ArticleSummary {
    id: String,
    title: String,
    preview: String,
    truncated: bool,
    category: String,
    created_at: DateTime<Utc>,
    views: u64,
}

impl From<Article> for ArticleSummary {
    fn from(article: Article) -> Self {
        Self {
            preview: article.preview().into_owned(),
            truncated: article.is_truncated(),
            id: article.id,
            title: article.title,
            category: article.category,
            created_at: article.created_at,
            views: article.views,
        }
    }
}

#[derive(Debug, Serialize)]
struct ArticleList {
    language: Language,
    category: String,
    articles: Vec<ArticleSummary>,
}

// ==================== Handlers ====================

async fn health() -> &'static str {
    "OK"
}

async fn list_articles(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ArticleList>, ApiError> {
    let language = resolve_language(query.lang.as_deref())?;
    let category = query
        .category
        .filter(|category| !category.trim().is_empty() && !is_all_categories(category))
        .unwrap_or_else(|| ALL_CATEGORIES.to_string());

    let articles = state.store().filter(&category);
    let translated = state
        .translations
        .translate_all(&state.translator, &articles, language)
        .await;

    let summaries = translated
        .into_iter()
        .zip(&articles)
        .map(|(translated, live)| {
            ArticleSummary::from(Article {
                views: live.views,
                ..translated
            })
        })
        .collect();

    Ok(Json(ArticleList {
        language,
        category,
        articles: summaries,
    }))
}

async fn create_article(
    State(state): State<AppState>,
    Json(input): Json<NewArticle>,
) -> Result<(StatusCode, Json<Article>), ApiError> {
    let missing = input.missing_fields();
    if !missing.is_empty() {
        return Err(ApiError::MissingFields(missing));
    }

    let article = state.store().create(input);
    Ok((StatusCode::CREATED, Json(article)))
}

/// Opening an article counts as a view.
async fn read_article(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<LangQuery>,
) -> Result<Json<Article>, ApiError> {
    let language = resolve_language(query.lang.as_deref())?;
    let article = state
        .store()
        .increment_view(&id)
        .ok_or_else(|| ApiError::NotFound(id.clone()))?;

    Ok(Json(state.localize(article, language).await))
}

async fn record_view(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let updated = state.store().increment_view(&id);
    match updated {
        Some(_) => Ok(StatusCode::NO_CONTENT),
        None => Err(ApiError::NotFound(id)),
    }
}

async fn stats(State(state): State<AppState>) -> Json<ArticleStats> {
    let now = Local::now();
    let stats = ArticleStats::compute(state.store().list(), &now);
    Json(stats)
}

async fn locale(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> Json<GeoLocation> {
    let ip = client_ip(&headers, peer);
    Json(state.detector.detect(Some(ip)).await)
}

/// Every supported language, canonical one included.
async fn languages() -> Json<Vec<&'static LanguageConfig>> {
    Json(LanguageRegistry::get().list_all())
}

async fn ui_strings(
    State(state): State<AppState>,
    Query(query): Query<LangQuery>,
) -> Result<Json<UiStrings>, ApiError> {
    let language = resolve_language(query.lang.as_deref())?;
    let strings = state.ui_strings.get(&state.translator, language).await;
    Ok(Json(strings.as_ref().clone()))
}

async fn metrics(State(state): State<AppState>) -> Json<MetricsReport> {
    Json(state.translator.metrics().report())
}

// ==================== Helpers ====================

/// Absent or blank `lang` means the canonical language.
fn resolve_language(lang: Option<&str>) -> Result<Language, UnknownLanguage> {
    match lang.map(str::trim).filter(|code| !code.is_empty()) {
        Some(code) => Language::from_code(code),
        None => Ok(Language::canonical()),
    }
}

/// First `X-Forwarded-For` hop when present and parseable, else the peer address.
fn client_ip(headers: &HeaderMap, peer: SocketAddr) -> IpAddr {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim);

    match forwarded {
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("Ignoring unparseable X-Forwarded-For value '{}'", raw);
            peer.ip()
        }),
        None => peer.ip(),
    }
}
