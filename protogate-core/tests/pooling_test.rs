use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use protogate_core::{
    BoxError, CallContext, Gateway, Handler, HandlerMap, Method, PathParams, async_trait,
    tonic::Status,
};
use std::{
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};
use tower::ServiceExt;
use user_service::pb::{IsAuthorizedReq, IsAuthorizedResp};

/// Hands out request instances from a pool and takes them back once released.
#[derive(Clone, Default)]
struct Pooled {
    pool: Arc<Mutex<Vec<IsAuthorizedReq>>>,
    released: Arc<AtomicUsize>,
    seen: Arc<Mutex<Vec<String>>>,
}

impl Pooled {
    fn seeded(stale: IsAuthorizedReq) -> Self {
        let pooled = Self::default();
        pooled.pool.lock().unwrap().push(stale);
        pooled
    }

    fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }

    fn pooled(&self) -> usize {
        self.pool.lock().unwrap().len()
    }
}

#[async_trait]
impl Method for Pooled {
    type Request = IsAuthorizedReq;
    type Response = IsAuthorizedResp;

    fn new_request(&self) -> IsAuthorizedReq {
        self.pool.lock().unwrap().pop().unwrap_or_default()
    }

    async fn call(
        &self,
        _ctx: CallContext,
        req: &IsAuthorizedReq,
    ) -> Result<IsAuthorizedResp, BoxError> {
        self.seen.lock().unwrap().push(req.token.clone());

        match req.token.as_str() {
            "denied" => Err(Status::permission_denied("denied").into()),
            "hang" => std::future::pending().await,
            _ => Ok(IsAuthorizedResp {
                is_authorized: true,
            }),
        }
    }

    fn release_request(&self, request: IsAuthorizedReq) {
        self.released.fetch_add(1, Ordering::SeqCst);
        self.pool.lock().unwrap().push(request);
    }
}

fn router(method: &Pooled) -> Router {
    let mut handlers = HandlerMap::new();
    handlers
        .register("/user.userservice/isauthorized", Handler::new(method.clone()))
        .unwrap();

    let gateway = Gateway::builder(PathParams::default(), handlers).build();
    Router::new().route("/test/{pkg}/{service}/{method}", gateway.into_route())
}

async fn post(app: &Router, path: &str, body: &'static str) -> StatusCode {
    app.clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(path)
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap()
        .status()
}

const PATH: &str = "/test/user/userservice/isauthorized";

#[tokio::test]
async fn test_request_is_released_after_success() {
    let method = Pooled::default();
    let app = router(&method);

    assert_eq!(post(&app, PATH, r#"{"token":"abc"}"#).await, StatusCode::OK);
    assert_eq!(method.released(), 1);
    assert_eq!(method.pooled(), 1);
}

#[tokio::test]
async fn test_request_is_released_after_handler_error() {
    let method = Pooled::default();
    let app = router(&method);

    assert_eq!(
        post(&app, PATH, r#"{"token":"denied"}"#).await,
        StatusCode::BAD_REQUEST
    );
    assert_eq!(method.released(), 1);
}

#[tokio::test]
async fn test_undecodable_request_is_not_released() {
    let method = Pooled::default();
    let app = router(&method);

    assert_eq!(
        post(&app, PATH, r#"{"token":"abc","age":3}"#).await,
        StatusCode::BAD_REQUEST
    );
    assert_eq!(
        post(&app, "/test/user/userservice/other", "{}").await,
        StatusCode::BAD_REQUEST
    );
    assert_eq!(method.released(), 0);
    assert!(method.seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_reused_request_starts_empty() {
    let method = Pooled::seeded(IsAuthorizedReq {
        token: "stale".to_string(),
    });
    let app = router(&method);

    assert_eq!(post(&app, PATH, "{}").await, StatusCode::OK);
    assert_eq!(post(&app, PATH, r#"{"token":"fresh"}"#).await, StatusCode::OK);
    assert_eq!(post(&app, PATH, "{}").await, StatusCode::OK);

    assert_eq!(*method.seen.lock().unwrap(), vec!["", "fresh", ""]);
    assert_eq!(method.released(), 3);
    assert_eq!(method.pooled(), 1);
}

#[tokio::test]
async fn test_request_is_released_when_call_is_cancelled() {
    let method = Pooled::default();
    let app = router(&method);

    let request = Request::builder()
        .method("POST")
        .uri(PATH)
        .body(Body::from(r#"{"token":"hang"}"#))
        .unwrap();
    let outcome = tokio::time::timeout(Duration::from_millis(50), app.oneshot(request)).await;

    assert!(outcome.is_err(), "the call should still be pending");
    assert_eq!(*method.seen.lock().unwrap(), vec!["hang"]);
    assert_eq!(method.released(), 1);
    assert_eq!(method.pooled(), 1);
}
