use async_trait::async_trait;
use chrono::{Duration, Utc};
use ghost_api::{
    AccessToken, ApiClient, ApiError, CredentialField, CredentialStore, EmailCredentials,
    Endpoint, InMemoryCredentialStore, JsonDecode, PageRequest, PersistedPost, Post,
    PostsRequestOptions, Request, Response, Tag, Transport, UploadSource,
};
use reqwest::Method;
use serde_json::{json, Value};
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

const BASE_URL: &str = "http://localhost:2368/ghost/api/v0.1/";

/// A request as seen by the transport
#[derive(Debug, Clone)]
struct Sent {
    endpoint: Endpoint,
    method: Method,
    url: String,
    content_type: Option<String>,
    body: Option<String>,
    token: Option<String>,
}

type Handler = Box<dyn Fn(&Request, Option<&AccessToken>) -> Response + Send + Sync>;

/// Transport answering from a handler and recording every request
struct ScriptedTransport {
    handler: Handler,
    sent: Mutex<Vec<Sent>>,
    token_calls: AtomicUsize,
    token_delay: std::time::Duration,
}

impl ScriptedTransport {
    fn new<F>(handler: F) -> Arc<Self>
    where
        F: Fn(&Request, Option<&AccessToken>) -> Response + Send + Sync + 'static,
    {
        Self::with_token_delay(handler, std::time::Duration::ZERO)
    }

    fn with_token_delay<F>(handler: F, token_delay: std::time::Duration) -> Arc<Self>
    where
        F: Fn(&Request, Option<&AccessToken>) -> Response + Send + Sync + 'static,
    {
        Arc::new(ScriptedTransport {
            handler: Box::new(handler),
            sent: Mutex::new(Vec::new()),
            token_calls: AtomicUsize::new(0),
            token_delay,
        })
    }

    fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: &Request, token: Option<&AccessToken>) -> ghost_api::Result<Response> {
        self.sent.lock().unwrap().push(Sent {
            endpoint: request.endpoint,
            method: request.method.clone(),
            url: request.url.to_string(),
            content_type: request.header("Content-Type").map(str::to_string),
            body: request.body_str().map(str::to_string),
            token: token.map(|t| t.token.clone()),
        });

        if request.endpoint == Endpoint::Token {
            self.token_calls.fetch_add(1, Ordering::SeqCst);
            if !self.token_delay.is_zero() {
                tokio::time::sleep(self.token_delay).await;
            }
        }

        Ok((self.handler)(request, token))
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn access_token(value: &str, expires_in: i64) -> AccessToken {
    AccessToken::new(
        "Bearer".to_string(),
        value.to_string(),
        "refresh-1".to_string(),
        Utc::now() + Duration::seconds(expires_in),
    )
}

fn client_with(transport: Arc<ScriptedTransport>, token: Option<AccessToken>) -> ApiClient {
    let store = match token {
        Some(token) => InMemoryCredentialStore::with_token(token),
        None => InMemoryCredentialStore::new(),
    };
    ApiClient::with_session(BASE_URL, transport, Arc::new(store)).unwrap()
}

fn post_json(id: i64, title: &str) -> Value {
    json!({"id": id, "title": title, "markdown": "text", "tags": []})
}

fn persisted(id: i64) -> PersistedPost {
    PersistedPost::decode(&post_json(id, "Existing")).unwrap()
}

#[tokio::test]
async fn login_posts_form_and_stores_token() {
    init_tracing();
    let transport = ScriptedTransport::new(|_, _| {
        Response::json(
            200,
            &json!({
                "access_token": "abc",
                "refresh_token": "def",
                "expires_in": 3600,
                "token_type": "Bearer"
            }),
        )
    });
    let client = client_with(transport.clone(), None);

    let token = client
        .login(&EmailCredentials::new("a@b.com", "x"))
        .unwrap()
        .await
        .unwrap();
    assert_eq!(token.token, "abc");
    assert_eq!(client.credentials_store().get(), Some(token));

    let sent = transport.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].method, Method::POST);
    assert_eq!(sent[0].url, format!("{}authentication/token/", BASE_URL));
    assert_eq!(
        sent[0].content_type.as_deref(),
        Some("application/x-www-form-urlencoded")
    );
    assert_eq!(
        sent[0].body.as_deref(),
        Some("username=a%40b.com&password=x&grant_type=password&client_id=ghost-admin")
    );
    assert!(sent[0].token.is_none());
}

#[test]
fn login_with_empty_fields_fails_before_sending() {
    let transport = ScriptedTransport::new(|_, _| Response::new(500, ""));
    let client = client_with(transport.clone(), None);

    let err = client.login(&EmailCredentials::new("", "123")).err().unwrap();
    assert!(matches!(
        err,
        ApiError::InvalidCredentials(CredentialField::Username)
    ));

    let err = client.login(&EmailCredentials::new("123", "")).err().unwrap();
    assert!(matches!(
        err,
        ApiError::InvalidCredentials(CredentialField::Password)
    ));

    assert!(transport.sent().is_empty());
}

#[tokio::test]
async fn posts_are_listed_with_pagination() {
    let transport = ScriptedTransport::new(|_, _| {
        Response::json(
            200,
            &json!({
                "posts": [post_json(1, "One"), post_json(2, "Two")],
                "meta": {"pagination": {"page": 1, "limit": 15, "pages": 3, "total": 31}}
            }),
        )
    });
    let client = client_with(transport.clone(), Some(access_token("valid", 3600)));

    let page = client.first_posts().await.unwrap();
    assert_eq!(page.items.len(), 2);
    assert_eq!(page.page(), Some(1));
    assert_eq!(page.limit(), Some(15));
    assert_eq!(page.total(), Some(31));
    assert_eq!(page.next_page(), Some(PageRequest::new(2, 15)));

    let sent = transport.sent();
    assert_eq!(sent[0].method, Method::GET);
    assert_eq!(
        sent[0].url,
        format!(
            "{}posts/?include=tags&limit=15&page=1&staticPages=all&status=all",
            BASE_URL
        )
    );
    assert_eq!(sent[0].token.as_deref(), Some("valid"));
}

#[tokio::test]
async fn add_post_sends_json_and_decodes_created_post() {
    let transport = ScriptedTransport::new(|_, _| {
        Response::json(
            201,
            &json!({"posts": [{"id": 7, "title": "T", "markdown": "M", "tags": []}]}),
        )
    });
    let client = client_with(transport.clone(), Some(access_token("valid", 3600)));

    let post = Post::new("T", "M").with_tags(vec![Tag::new("tag1")]);
    let posts = client.add_post(&post).unwrap().await.unwrap();
    assert_eq!(posts.first().map(PersistedPost::id), Some(7));

    let sent = transport.sent();
    assert_eq!(sent[0].method, Method::POST);
    assert!(sent[0].url.starts_with(&format!("{}posts/?", BASE_URL)));
    assert_eq!(sent[0].content_type.as_deref(), Some("application/json"));
    assert_eq!(
        sent[0].body.as_deref(),
        Some(r#"{"title":"T","markdown":"M","tags":[{"name":"tag1"}]}"#)
    );
}

#[tokio::test]
async fn update_post_puts_to_post_path_without_id_in_body() {
    let transport = ScriptedTransport::new(|request, _| {
        let body: Value = serde_json::from_slice(request.body.as_deref().unwrap()).unwrap();
        Response::json(
            200,
            &json!({"posts": [{"id": 4, "title": body["title"], "markdown": body["markdown"]}]}),
        )
    });
    let client = client_with(transport.clone(), Some(access_token("valid", 3600)));

    let mut post = persisted(4);
    post.title = "Updated Existing".to_string();
    let updated = client.update_post(&post).unwrap().await.unwrap();
    assert_eq!(updated.first().unwrap().title, "Updated Existing");

    let sent = transport.sent();
    assert_eq!(sent[0].method, Method::PUT);
    assert!(sent[0].url.starts_with(&format!("{}posts/4/?", BASE_URL)));
    assert!(!sent[0].body.as_deref().unwrap().contains("\"id\""));
}

#[tokio::test]
async fn delete_missing_post_yields_decode_failure() {
    let transport = ScriptedTransport::new(|_, _| {
        Response::json(
            404,
            &json!({"errors": [{"message": "Post not found.", "errorType": "NotFoundError"}]}),
        )
    });
    let client = client_with(transport.clone(), Some(access_token("valid", 3600)));

    let err = client.delete_post(&persisted(7)).await.unwrap_err();
    assert!(err.is_not_found());

    let sent = transport.sent();
    assert_eq!(sent[0].method, Method::DELETE);
    assert_eq!(sent[0].endpoint, Endpoint::DeletePost(7));
    assert!(sent[0].url.starts_with(&format!("{}posts/7/", BASE_URL)));
    assert!(sent[0].body.is_none());
}

#[tokio::test]
async fn post_with_id_and_tags() {
    let transport = ScriptedTransport::new(|request, _| match request.endpoint {
        Endpoint::GetPost(id) => Response::json(200, &json!({"posts": [post_json(id, "Found")]})),
        _ => Response::json(
            200,
            &json!({
                "tags": [{"id": 1, "uuid": "6ba7b810-9dad-11d1-80b4-00c04fd430c8", "name": "news", "slug": "news"}],
                "meta": {"pagination": {"page": 1, "limit": 15, "pages": 1, "total": 1}}
            }),
        ),
    });
    let client = client_with(transport.clone(), Some(access_token("valid", 3600)));

    let posts = client
        .post_with_id(12, PostsRequestOptions::default())
        .await
        .unwrap();
    assert_eq!(posts.first().unwrap().id(), 12);

    let tags = client.tags().await.unwrap();
    assert_eq!(tags.items.len(), 1);
    assert_eq!(tags.items[0].slug.as_deref(), Some("news"));

    let sent = transport.sent();
    assert_eq!(sent[1].url, format!("{}tags/", BASE_URL));
}

#[tokio::test]
async fn upload_sends_multipart_image() {
    let transport = ScriptedTransport::new(|_, _| {
        Response::json(200, &json!("/content/images/2015/10/photo.png"))
    });
    let client = client_with(transport.clone(), Some(access_token("valid", 3600)));

    let mut file = tempfile::Builder::new()
        .prefix("photo")
        .suffix(".png")
        .tempfile()
        .unwrap();
    file.write_all(b"\x89PNG\r\n").unwrap();
    let source = UploadSource::new(file.path());

    let location = client.upload(&source).unwrap().await.unwrap();
    assert_eq!(location, "/content/images/2015/10/photo.png");

    let sent = transport.sent();
    assert_eq!(sent[0].url, format!("{}uploads/", BASE_URL));
    assert!(sent[0]
        .content_type
        .as_deref()
        .unwrap()
        .starts_with("multipart/form-data; boundary="));
}

#[test]
fn upload_of_unknown_type_fails_before_sending() {
    let transport = ScriptedTransport::new(|_, _| Response::new(500, ""));
    let client = client_with(transport.clone(), Some(access_token("valid", 3600)));

    let result = client.upload(&UploadSource::new("notes.txt"));
    assert!(matches!(result, Err(ApiError::Encode { .. })));
    assert!(transport.sent().is_empty());
}

fn refreshing_handler(request: &Request, token: Option<&AccessToken>) -> Response {
    if request.endpoint == Endpoint::Token {
        return Response::json(
            200,
            &json!({"access_token": "fresh", "expires_in": 3600, "token_type": "Bearer"}),
        );
    }
    match token {
        Some(token) if token.token == "fresh" => Response::json(
            200,
            &json!({"posts": [], "meta": {"pagination": {"page": 1, "limit": 15, "pages": 1, "total": 0}}}),
        ),
        _ => Response::json(401, &json!({"errors": [{"message": "Access denied.", "errorType": "UnauthorizedError"}]})),
    }
}

#[tokio::test]
async fn concurrent_requests_share_one_refresh() {
    init_tracing();
    let transport =
        ScriptedTransport::with_token_delay(refreshing_handler, std::time::Duration::from_millis(50));
    let store = Arc::new(InMemoryCredentialStore::with_token(access_token("stale", -60)));
    let client = ApiClient::with_session(BASE_URL, transport.clone(), store.clone()).unwrap();

    let (first, second) = tokio::join!(
        client.posts(PostsRequestOptions::default()),
        client.tags()
    );
    assert!(first.is_ok());
    assert!(second.is_ok());

    assert_eq!(transport.token_calls.load(Ordering::SeqCst), 1);
    let signed: Vec<Sent> = transport
        .sent()
        .into_iter()
        .filter(|s| s.endpoint != Endpoint::Token)
        .collect();
    assert_eq!(signed.len(), 2);
    assert!(signed.iter().all(|s| s.token.as_deref() == Some("fresh")));
    assert_eq!(store.get().unwrap().token, "fresh");
}

#[tokio::test]
async fn spawned_requests_share_one_refresh() {
    let transport =
        ScriptedTransport::with_token_delay(refreshing_handler, std::time::Duration::from_millis(50));
    let store = Arc::new(InMemoryCredentialStore::with_token(access_token("stale", -60)));
    let client = ApiClient::with_session(BASE_URL, transport.clone(), store.clone()).unwrap();

    let handles: Vec<_> = (0..4)
        .map(|_| tokio::spawn(client.posts(PostsRequestOptions::default())))
        .collect();
    for handle in handles {
        assert!(handle.await.unwrap().is_ok());
    }

    assert_eq!(transport.token_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn rejected_token_is_retried_once_then_fails() {
    // Refresh succeeds but the server keeps rejecting every token
    let transport = ScriptedTransport::new(|request, _| {
        if request.endpoint == Endpoint::Token {
            Response::json(
                200,
                &json!({"access_token": "fresh", "expires_in": 3600, "token_type": "Bearer"}),
            )
        } else {
            Response::json(401, &json!({"errors": []}))
        }
    });
    let client = client_with(transport.clone(), Some(access_token("valid", 3600)));

    let err = client.tags().await.unwrap_err();
    assert!(err.is_authentication());

    let sent = transport.sent();
    let endpoints: Vec<Endpoint> = sent.iter().map(|s| s.endpoint).collect();
    assert_eq!(
        endpoints,
        vec![Endpoint::GetTags, Endpoint::Token, Endpoint::GetTags]
    );
    assert_eq!(sent[2].token.as_deref(), Some("fresh"));
}

#[tokio::test]
async fn rejected_token_after_expiry_refresh_is_not_refreshed_again() {
    let transport = ScriptedTransport::new(|request, _| {
        if request.endpoint == Endpoint::Token {
            Response::json(
                200,
                &json!({"access_token": "fresh", "expires_in": 3600, "token_type": "Bearer"}),
            )
        } else {
            Response::json(401, &json!({"errors": []}))
        }
    });
    let client = client_with(transport.clone(), Some(access_token("stale", -60)));

    let err = client.tags().await.unwrap_err();
    assert!(err.is_authentication());
    assert_eq!(transport.token_calls.load(Ordering::SeqCst), 1);

    let endpoints: Vec<Endpoint> = transport.sent().iter().map(|s| s.endpoint).collect();
    assert_eq!(endpoints, vec![Endpoint::Token, Endpoint::GetTags]);
}

#[tokio::test]
async fn server_errors_on_listings_are_not_empty_pages() {
    let transport = ScriptedTransport::new(|request, _| match request.endpoint {
        Endpoint::GetTags => Response::json(
            404,
            &json!({"errors": [{"message": "Resource not found", "errorType": "NotFoundError"}]}),
        ),
        _ => Response::json(
            500,
            &json!({"errors": [{"message": "Internal", "errorType": "InternalServerError"}]}),
        ),
    });
    let client = client_with(transport, Some(access_token("valid", 3600)));

    match client.first_posts().await.unwrap_err() {
        ApiError::Decode { status, message, .. } => {
            assert_eq!(status, 500);
            assert_eq!(message.as_deref(), Some("InternalServerError: Internal"));
        }
        other => panic!("expected decode error, got {:?}", other),
    }

    let err = client.tags().await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn failed_refresh_leaves_token_unchanged() {
    let transport = ScriptedTransport::new(|request, _| {
        if request.endpoint == Endpoint::Token {
            Response::json(
                401,
                &json!({"errors": [{"message": "Refresh token invalid", "errorType": "UnauthorizedError"}]}),
            )
        } else {
            Response::json(401, &json!({"errors": []}))
        }
    });
    let original = access_token("stale", -60);
    let client = client_with(transport.clone(), Some(original.clone()));

    let err = client.tags().await.unwrap_err();
    match err {
        ApiError::Authentication(message) => assert!(message.contains("401")),
        other => panic!("expected authentication error, got {:?}", other),
    }
    assert_eq!(client.credentials_store().get(), Some(original));

    let refresh = &transport.sent()[0];
    assert_eq!(refresh.endpoint, Endpoint::Token);
    assert_eq!(refresh.content_type.as_deref(), Some("application/json"));
    assert_eq!(
        refresh.body.as_deref(),
        Some(r#"{"refresh_token":"refresh-1","grant_type":"refresh_token","client_id":"ghost-admin"}"#)
    );
}

#[tokio::test]
async fn cancelled_task_does_not_block_shared_refresh() {
    let transport =
        ScriptedTransport::with_token_delay(refreshing_handler, std::time::Duration::from_millis(50));
    let store = Arc::new(InMemoryCredentialStore::with_token(access_token("stale", -60)));
    let client = ApiClient::with_session(BASE_URL, transport.clone(), store.clone()).unwrap();

    let (tx, rx) = tokio::sync::oneshot::channel::<()>();
    let cancelled = client.tags().spawn(move |_| {
        let _ = tx.send(());
    });
    // Let the spawned request start the refresh
    tokio::time::sleep(std::time::Duration::from_millis(10)).await;

    let waiting = client.first_posts();
    assert!(cancelled.cancel());

    assert!(waiting.await.is_ok());
    assert!(rx.await.is_err());
    assert_eq!(store.get().unwrap().token, "fresh");
    assert!(transport.token_calls.load(Ordering::SeqCst) >= 1);
}
