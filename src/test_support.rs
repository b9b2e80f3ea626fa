//! Router-level test harness over the in-memory store.

use axum::{
    body::{to_bytes, Body},
    extract::FromRef,
    http::{header, Method, Request},
    response::Response,
    Router,
};
use rust_decimal::Decimal;
use serde_json::Value;
use tower::ServiceExt;

use crate::{
    app::build_app,
    auth::{jwt::JwtKeys, repo_types::User, services},
    recipe::repo_types::{Recipe, RecipeFields},
    state::AppState,
    web::session::SESSION_COOKIE,
};

pub const PASSWORD: &str = "testpass1";

pub struct TestApp {
    pub state: AppState,
    pub router: Router,
}

impl TestApp {
    pub fn new() -> Self {
        let state = AppState::fake();
        let router = build_app(state.clone());
        Self { state, router }
    }

    pub fn keys(&self) -> JwtKeys {
        JwtKeys::from_ref(&self.state)
    }

    pub async fn user(&self, email: &str) -> User {
        services::create_user(self.state.store.as_ref(), email, PASSWORD)
            .await
            .unwrap()
    }

    pub async fn superuser(&self, email: &str) -> User {
        services::create_superuser(self.state.store.as_ref(), email, PASSWORD)
            .await
            .unwrap()
    }

    pub async fn recipe(&self, owner: &User, title: &str) -> Recipe {
        let fields = RecipeFields {
            title: title.into(),
            time_minutes: 5,
            price: Decimal::new(500, 2),
            link: None,
            tags: vec![],
            ingredients: vec![],
        };
        self.state
            .store
            .insert_recipe(owner.id, &fields)
            .await
            .unwrap()
    }

    fn token(&self, user: &User) -> String {
        self.keys().sign_access(user.id).unwrap()
    }

    /// API GET, with a bearer token when `user` is given.
    pub fn get(&self, uri: &str, user: Option<&User>) -> Request<Body> {
        let mut req = Request::builder().method(Method::GET).uri(uri);
        if let Some(user) = user {
            req = req.header(header::AUTHORIZATION, format!("Bearer {}", self.token(user)));
        }
        req.body(Body::empty()).unwrap()
    }

    pub fn json(&self, method: Method, uri: &str, user: &User, body: Value) -> Request<Body> {
        json_request(method, uri, Some(&self.token(user)), body)
    }

    pub fn delete(&self, uri: &str, user: &User) -> Request<Body> {
        Request::builder()
            .method(Method::DELETE)
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {}", self.token(user)))
            .body(Body::empty())
            .unwrap()
    }

    /// Browser GET, carrying the session cookie when `user` is given.
    pub fn page(&self, uri: &str, user: Option<&User>) -> Request<Body> {
        let mut req = Request::builder().method(Method::GET).uri(uri);
        if let Some(user) = user {
            req = req.header(header::COOKIE, format!("{SESSION_COOKIE}={}", self.token(user)));
        }
        req.body(Body::empty()).unwrap()
    }

    /// Browser form POST from a signed-in user.
    pub fn form(&self, uri: &str, user: &User, body: &str) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::COOKIE, format!("{SESSION_COOKIE}={}", self.token(user)))
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap()
    }
}

pub fn json_request(method: Method, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut req = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        req = req.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    req.body(Body::from(body.to_string())).unwrap()
}

pub async fn send(router: &Router, req: Request<Body>) -> Response {
    router.clone().oneshot(req).await.unwrap()
}

pub async fn body_string(res: Response) -> String {
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn body_json(res: Response) -> Value {
    serde_json::from_str(&body_string(res).await).unwrap()
}

pub fn assert_template(body: &str, name: &str) {
    let marker = format!("data-template=\"{name}\"");
    assert!(body.contains(&marker), "expected {marker} in:\n{body}");
}
