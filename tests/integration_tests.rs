//! Integration tests for the anonymous news service
//!
//! These drive the HTTP API through a real listener, with the translation and
//! geolocation services mocked by wiremock.

use std::sync::Arc;

use anonymous_news::{
    article::NewArticle,
    i18n::TranslationMetrics,
    location::LocationDetector,
    server::{self, AppState},
    storage::{ArticleStorage, FileStorage, MemoryStorage},
    store::ArticleStore,
    translation::Translator,
};
use serde_json::{json, Value};
use tempfile::TempDir;
use wiremock::{
    matchers::{body_partial_json, method, path},
    Mock, MockServer, ResponseTemplate,
};

// ==================== Test Helpers ====================

struct TestApp {
    base_url: String,
    client: reqwest::Client,
}

impl TestApp {
    async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(format!("{}{}", self.base_url, path))
            .send()
            .await
            .expect("request should complete")
    }

    async fn post_json(&self, path: &str, body: &Value) -> reqwest::Response {
        self.client
            .post(format!("{}{}", self.base_url, path))
            .json(body)
            .send()
            .await
            .expect("request should complete")
    }

    async fn create(&self, title: &str, content: &str, category: &str) -> Value {
        let response = self
            .post_json(
                "/api/articles",
                &json!({ "title": title, "content": content, "category": category }),
            )
            .await;
        assert_eq!(response.status(), 201);
        response.json().await.expect("article json")
    }
}

/// Start the API on an ephemeral port backed by `storage`.
async fn spawn_app(storage: impl ArticleStorage + 'static, services: &MockServer) -> TestApp {
    let client = reqwest::Client::new();
    let translator = Translator::new(
        client.clone(),
        format!("{}/translate", services.uri()),
        None,
        Arc::new(TranslationMetrics::new()),
    );
    let detector = LocationDetector::new(client.clone(), services.uri());
    let state = AppState::new(ArticleStore::open(storage), translator, detector);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(server::serve(listener, state));

    TestApp {
        base_url: format!("http://{}", addr),
        client,
    }
}

async fn mount_translation(server: &MockServer, q: &str, translated: &str) {
    Mock::given(method("POST"))
        .and(path("/translate"))
        .and(body_partial_json(json!({ "q": q })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "translatedText": translated })))
        .mount(server)
        .await;
}

// ==================== Health ====================

#[tokio::test]
async fn test_health() {
    let services = MockServer::start().await;
    let app = spawn_app(MemoryStorage::new(), &services).await;

    let response = app.get("/health").await;

    assert_eq!(response.status(), 200);
    assert_eq!(response.text().await.expect("body"), "OK");
}

// ==================== Create & List ====================

#[tokio::test]
async fn test_create_then_list() {
    let services = MockServer::start().await;
    let app = spawn_app(MemoryStorage::new(), &services).await;

    let created = app.create("A", &"B".repeat(400), "정치").await;
    assert_eq!(created["views"], 0);
    assert_eq!(created["content"].as_str().map(|c| c.len()), Some(400));

    let list: Value = app.get("/api/articles").await.json().await.expect("json");
    let articles = list["articles"].as_array().expect("array");

    assert_eq!(list["language"], "ko");
    assert_eq!(articles.len(), 1);
    assert_eq!(articles[0]["id"], created["id"]);
    assert_eq!(articles[0]["truncated"], true);
    assert_eq!(
        articles[0]["preview"],
        Value::String(format!("{}...", "B".repeat(300)))
    );
}

#[tokio::test]
async fn test_create_defaults_category() {
    let services = MockServer::start().await;
    let app = spawn_app(MemoryStorage::new(), &services).await;

    let response = app
        .post_json("/api/articles", &json!({ "title": "t", "content": "c" }))
        .await;

    assert_eq!(response.status(), 201);
    let article: Value = response.json().await.expect("json");
    assert_eq!(article["category"], "정치");
}

#[tokio::test]
async fn test_create_rejects_blank_fields() {
    let services = MockServer::start().await;
    let app = spawn_app(MemoryStorage::new(), &services).await;

    let response = app
        .post_json(
            "/api/articles",
            &json!({ "title": "  ", "content": "", "category": "기타" }),
        )
        .await;

    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.expect("json");
    assert!(body["error"].as_str().expect("message").contains("title"));

    let list: Value = app.get("/api/articles").await.json().await.expect("json");
    assert!(list["articles"].as_array().expect("array").is_empty());
}

#[tokio::test]
async fn test_list_newest_first_and_filtered() {
    let services = MockServer::start().await;
    let app = spawn_app(MemoryStorage::new(), &services).await;

    let first = app.create("first", "c", "정치").await;
    let second = app.create("second", "c", "경제").await;
    let third = app.create("third", "c", "정치").await;

    let all: Value = app
        .get("/api/articles?category=all")
        .await
        .json()
        .await
        .expect("json");
    let ids: Vec<_> = all["articles"]
        .as_array()
        .expect("array")
        .iter()
        .map(|a| a["id"].clone())
        .collect();
    assert_eq!(ids, vec![third["id"].clone(), second["id"].clone(), first["id"].clone()]);

    let politics: Value = app
        .get("/api/articles?category=%EC%A0%95%EC%B9%98")
        .await
        .json()
        .await
        .expect("json");
    let titles: Vec<_> = politics["articles"]
        .as_array()
        .expect("array")
        .iter()
        .map(|a| a["title"].as_str().expect("title").to_string())
        .collect();
    assert_eq!(politics["category"], "정치");
    assert_eq!(titles, vec!["third", "first"]);
}

#[tokio::test]
async fn test_list_all_alias_is_resolved_by_the_api() {
    let services = MockServer::start().await;
    let app = spawn_app(MemoryStorage::new(), &services).await;

    app.create("a", "c", "정치").await;
    app.create("b", "c", "경제").await;

    for query in ["category=all", "category=%20ALL%20", "category=%EC%A0%84%EC%B2%B4", "category="] {
        let list: Value = app
            .get(&format!("/api/articles?{}", query))
            .await
            .json()
            .await
            .expect("json");
        assert_eq!(list["category"], "전체", "query {}", query);
        assert_eq!(list["articles"].as_array().expect("array").len(), 2, "query {}", query);
    }
}

#[tokio::test]
async fn test_list_unknown_language_is_bad_request() {
    let services = MockServer::start().await;
    let app = spawn_app(MemoryStorage::new(), &services).await;

    assert_eq!(app.get("/api/articles?lang=xx").await.status(), 400);
}

// ==================== Views ====================

#[tokio::test]
async fn test_reading_and_clicking_increment_views() {
    let services = MockServer::start().await;
    let app = spawn_app(MemoryStorage::new(), &services).await;

    let created = app.create("A", "B", "기술").await;
    let id = created["id"].as_str().expect("id");

    let click = app
        .post_json(&format!("/api/articles/{}/views", id), &json!({}))
        .await;
    assert_eq!(click.status(), 204);

    let read: Value = app
        .get(&format!("/api/articles/{}", id))
        .await
        .json()
        .await
        .expect("json");
    assert_eq!(read["views"], 2);
    assert_eq!(read["content"], "B");
}

#[tokio::test]
async fn test_unknown_article_is_not_found_and_changes_nothing() {
    let services = MockServer::start().await;
    let app = spawn_app(MemoryStorage::new(), &services).await;
    app.create("A", "B", "기술").await;

    assert_eq!(app.get("/api/articles/404").await.status(), 404);
    assert_eq!(
        app.post_json("/api/articles/404/views", &json!({}))
            .await
            .status(),
        404
    );

    let list: Value = app.get("/api/articles").await.json().await.expect("json");
    assert_eq!(list["articles"].as_array().expect("array").len(), 1);
    assert_eq!(list["articles"][0]["views"], 0);
}

// ==================== Stats ====================

#[tokio::test]
async fn test_stats_count_todays_articles() {
    let services = MockServer::start().await;
    let app = spawn_app(MemoryStorage::new(), &services).await;

    let created = app.create("A", "B", "사회").await;
    app.create("C", "D", "사회").await;
    app.get(&format!("/api/articles/{}", created["id"].as_str().expect("id")))
        .await;

    let stats: Value = app.get("/api/stats").await.json().await.expect("json");

    assert_eq!(stats["totalCount"], 2);
    assert_eq!(stats["todayCount"], 2);
    assert_eq!(stats["todayViews"], 1);
}

// ==================== Translation ====================

#[tokio::test]
async fn test_translated_list_and_detail() {
    let services = MockServer::start().await;
    mount_translation(&services, "제목", "Title").await;
    mount_translation(&services, "내용", "Content").await;
    mount_translation(&services, "경제", "Economy").await;
    let app = spawn_app(MemoryStorage::new(), &services).await;

    let created = app.create("제목", "내용", "경제").await;
    let id = created["id"].as_str().expect("id");

    let list: Value = app
        .get("/api/articles?lang=en")
        .await
        .json()
        .await
        .expect("json");
    assert_eq!(list["language"], "en");
    assert_eq!(list["articles"][0]["title"], "Title");
    assert_eq!(list["articles"][0]["preview"], "Content");
    assert_eq!(list["articles"][0]["category"], "Economy");

    // The cached translation must not hide the new view count
    let detail: Value = app
        .get(&format!("/api/articles/{}?lang=en", id))
        .await
        .json()
        .await
        .expect("json");
    assert_eq!(detail["title"], "Title");
    assert_eq!(detail["views"], 1);

    // The stored article keeps its original text
    let original: Value = app.get("/api/articles").await.json().await.expect("json");
    assert_eq!(original["articles"][0]["title"], "제목");
}

#[tokio::test]
async fn test_failed_translation_shows_original_text() {
    let services = MockServer::start().await;
    mount_translation(&services, "제목", "Title").await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&services)
        .await;
    let app = spawn_app(MemoryStorage::new(), &services).await;

    let created = app.create("제목", "본문", "기타").await;

    let detail: Value = app
        .get(&format!(
            "/api/articles/{}?lang=ja",
            created["id"].as_str().expect("id")
        ))
        .await
        .json()
        .await
        .expect("json");

    assert_eq!(detail["title"], "Title");
    assert_eq!(detail["content"], "본문");
    assert_eq!(detail["category"], "기타");

    let metrics: Value = app.get("/api/metrics").await.json().await.expect("json");
    assert_eq!(metrics["apiCalls"], 3);
    assert_eq!(metrics["apiFailures"], 2);
    assert_eq!(metrics["cacheMisses"], 1);
}

#[tokio::test]
async fn test_ui_strings() {
    let services = MockServer::start().await;
    mount_translation(&services, "익명 뉴스", "Anonymous News").await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&services)
        .await;
    let app = spawn_app(MemoryStorage::new(), &services).await;

    let korean: Value = app.get("/api/ui-strings").await.json().await.expect("json");
    assert_eq!(korean["language"], "ko");
    assert_eq!(korean["texts"]["siteTitle"], "익명 뉴스");

    let english: Value = app
        .get("/api/ui-strings?lang=en")
        .await
        .json()
        .await
        .expect("json");
    assert_eq!(english["language"], "en");
    assert_eq!(english["texts"]["siteTitle"], "Anonymous News");
    assert_eq!(english["texts"]["publish"], "발행");
}

// ==================== Locale ====================

#[tokio::test]
async fn test_locale_detects_forwarded_client() {
    let services = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/203.0.113.7/json/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "country_name": "Germany",
            "country_code": "DE"
        })))
        .mount(&services)
        .await;
    let app = spawn_app(MemoryStorage::new(), &services).await;

    let locale: Value = app
        .client
        .get(format!("{}/api/locale", app.base_url))
        .header("x-forwarded-for", "203.0.113.7")
        .send()
        .await
        .expect("request")
        .json()
        .await
        .expect("json");

    assert_eq!(
        locale,
        json!({ "country": "Germany", "countryCode": "DE", "language": "de" })
    );
}

#[tokio::test]
async fn test_locale_falls_back_when_lookup_fails() {
    let services = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&services)
        .await;
    let app = spawn_app(MemoryStorage::new(), &services).await;

    let locale: Value = app.get("/api/locale").await.json().await.expect("json");

    assert_eq!(
        locale,
        json!({ "country": "Unknown", "countryCode": "US", "language": "en" })
    );
}

#[tokio::test]
async fn test_languages_lists_registry() {
    let services = MockServer::start().await;
    let app = spawn_app(MemoryStorage::new(), &services).await;

    let languages: Value = app.get("/api/languages").await.json().await.expect("json");
    let languages = languages.as_array().expect("array");

    assert_eq!(languages.len(), 8);
    assert_eq!(
        languages[0],
        json!({ "code": "ko", "name": "Korean", "nativeName": "한국어", "isCanonical": true })
    );
    assert!(languages
        .iter()
        .any(|lang| lang["code"] == "ru" && lang["nativeName"] == "Русский"));
}

// ==================== Persistence ====================

#[tokio::test]
async fn test_corrupted_file_starts_empty_and_is_replaced() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let storage = FileStorage::articles(temp_dir.path());
    storage.save("{not json").expect("seed corrupted blob");

    let services = MockServer::start().await;
    let app = spawn_app(storage.clone(), &services).await;

    let list: Value = app.get("/api/articles").await.json().await.expect("json");
    assert!(list["articles"].as_array().expect("array").is_empty());

    app.create("A", "B", "정치").await;

    let reopened = ArticleStore::open(storage);
    assert_eq!(reopened.len(), 1);
    assert_eq!(reopened.list()[0].title, "A");
}

#[test]
fn test_file_store_survives_restart() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");

    let mut store = ArticleStore::open(FileStorage::articles(temp_dir.path()));
    let article = store.create(NewArticle::new("A", "B", "정치"));
    store.increment_view(&article.id);
    store.increment_view(&article.id);
    drop(store);

    let reopened = ArticleStore::open(FileStorage::articles(temp_dir.path()));
    assert_eq!(reopened.get(&article.id).map(|a| a.views), Some(2));
}
