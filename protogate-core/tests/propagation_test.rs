use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use protogate_core::{
    BoxError, CallContext, Gateway, GatewayBuilder, Handler, HandlerMap, Method, PathParams,
    async_trait,
};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;
use user_service::pb::{IsAuthorizedReq, IsAuthorizedResp};

/// Records the context of every invocation.
#[derive(Clone, Default)]
struct Capture {
    seen: Arc<Mutex<Vec<CallContext>>>,
}

impl Capture {
    fn contexts(&self) -> Vec<CallContext> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl Method for Capture {
    type Request = IsAuthorizedReq;
    type Response = IsAuthorizedResp;

    async fn call(
        &self,
        ctx: CallContext,
        _req: &IsAuthorizedReq,
    ) -> Result<IsAuthorizedResp, BoxError> {
        self.seen.lock().unwrap().push(ctx);
        Ok(IsAuthorizedResp::default())
    }
}

#[derive(Clone, Debug, PartialEq)]
struct Tenant(&'static str);

#[derive(Clone, Debug, PartialEq)]
struct Steps(Vec<&'static str>);

fn router(capture: &Capture, build: impl FnOnce(GatewayBuilder) -> Gateway) -> Router {
    let mut handlers = HandlerMap::new();
    handlers
        .register("/user.userservice/isauthorized", Handler::new(capture.clone()))
        .unwrap();

    let gateway = build(Gateway::builder(PathParams::default(), handlers));
    Router::new().route("/test/{pkg}/{service}/{method}", gateway.into_route())
}

fn traced_request() -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/test/user/userservice/isauthorized")
        .header("x-trace", "t1")
        .header("x-trace", "t2")
        .header("authorization", "Bearer abc")
        .body(Body::from(r#"{"token":"abc"}"#))
        .unwrap()
}

#[tokio::test]
async fn test_headers_become_metadata() {
    let capture = Capture::default();
    let app = router(&capture, |builder| builder.propagate_headers(true).build());

    let response = app.oneshot(traced_request()).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let contexts = capture.contexts();
    assert_eq!(contexts.len(), 1);

    let ctx = &contexts[0];
    assert_eq!(ctx.key(), "/user.userservice/isauthorized");

    let metadata = ctx.metadata().expect("metadata should be propagated");
    let traces: Vec<_> = metadata
        .get_all("x-trace")
        .iter()
        .map(|value| value.to_str().unwrap().to_string())
        .collect();
    assert_eq!(traces, vec!["t1", "t2"]);
    assert_eq!(
        metadata.get("authorization").unwrap().to_str().unwrap(),
        "Bearer abc"
    );
}

#[tokio::test]
async fn test_headers_are_not_propagated_by_default() {
    let capture = Capture::default();
    let app = router(&capture, |builder| builder.build());

    let response = app.oneshot(traced_request()).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let contexts = capture.contexts();
    assert_eq!(contexts.len(), 1);
    assert!(contexts[0].metadata().is_none());
}

#[tokio::test]
async fn test_decorators_see_metadata_and_run_in_order() {
    let capture = Capture::default();
    let app = router(&capture, |builder| {
        builder
            .propagate_headers(true)
            .decorator(|ctx: CallContext| {
                let traced = ctx
                    .metadata()
                    .is_some_and(|metadata| metadata.contains_key("x-trace"));
                ctx.with_extension(Steps(vec![if traced { "traced" } else { "untraced" }]))
            })
            .decorator(|ctx: CallContext| {
                let mut steps = ctx.extension::<Steps>().cloned().unwrap_or(Steps(vec![]));
                steps.0.push("tenant");
                ctx.with_extension(steps).with_extension(Tenant("acme"))
            })
            .build()
    });

    let response = app.oneshot(traced_request()).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let contexts = capture.contexts();
    let ctx = &contexts[0];
    assert_eq!(ctx.extension::<Steps>(), Some(&Steps(vec!["traced", "tenant"])));
    assert_eq!(ctx.extension::<Tenant>(), Some(&Tenant("acme")));
}

#[tokio::test]
async fn test_handler_is_not_invoked_for_rejected_requests() {
    let capture = Capture::default();
    let app = router(&capture, |builder| builder.build());

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/test/user/userservice/isauthorized")
                .body(Body::from("not json"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/test/user/userservice/missing")
                .body(Body::from("{}"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    assert!(capture.contexts().is_empty());
}
