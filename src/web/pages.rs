use axum::{
    extract::{FromRef, Query, State},
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Router,
};
use axum_extra::extract::cookie::CookieJar;
use tracing::instrument;

use super::{
    forms::{LoginForm, NextQuery, SignupForm},
    found, render,
    session::{clear_session, safe_next, session_cookie, MaybeUser, SessionUser, LOGIN_URL},
    templates::{AboutPage, AdminIndexPage, HomePage, LoginPage, SignupPage},
    PageError,
};
use crate::{
    auth::{
        jwt::JwtKeys,
        repo_types::User,
        services::{authenticate, register},
    },
    error::AppError,
    recipe::repo_types::RecipeFilter,
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home))
        .route("/about/", get(about))
        .route("/login/", get(login_form).post(login))
        .route("/logout/", post(logout))
        .route("/accounts/login/", get(accounts_login))
        .route("/accounts/signup/", get(signup_form).post(signup))
        .route("/admin/", get(admin_index))
}

async fn home(viewer: MaybeUser) -> Result<Response, PageError> {
    render(&HomePage {
        viewer: viewer.viewer(),
    })
}

async fn about(viewer: MaybeUser) -> Result<Response, PageError> {
    render(&AboutPage {
        viewer: viewer.viewer(),
    })
}

async fn login_form(viewer: MaybeUser, Query(q): Query<NextQuery>) -> Result<Response, PageError> {
    render(&LoginPage {
        viewer: viewer.viewer(),
        email: String::new(),
        next: q.next.unwrap_or_default(),
        error: String::new(),
    })
}

fn start_session(state: &AppState, jar: CookieJar, user: &User, next: &str) -> Result<Response, PageError> {
    let keys = JwtKeys::from_ref(state);
    let token = keys.sign_access(user.id)?;
    Ok((jar.add(session_cookie(token, &keys)), found(safe_next(next))).into_response())
}

#[instrument(skip(state, jar, form), fields(email = %form.email))]
async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<Response, PageError> {
    match authenticate(state.store.as_ref(), &form.email, &form.password).await {
        Ok(user) => start_session(&state, jar, &user, &form.next),
        Err(AppError::Unauthorized) => render(&LoginPage {
            viewer: String::new(),
            email: form.email,
            next: form.next,
            error: "Please enter a correct email and password.".into(),
        }),
        Err(e) => Err(e.into()),
    }
}

async fn logout(jar: CookieJar) -> Response {
    (clear_session(jar), found("/")).into_response()
}

async fn accounts_login() -> Response {
    found(LOGIN_URL)
}

async fn signup_form(viewer: MaybeUser) -> Result<Response, PageError> {
    render(&SignupPage {
        viewer: viewer.viewer(),
        email: String::new(),
        error: String::new(),
    })
}

#[instrument(skip(state, jar, form), fields(email = %form.email))]
async fn signup(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<SignupForm>,
) -> Result<Response, PageError> {
    match register(state.store.as_ref(), &form.email, &form.password1, &form.password2).await {
        Ok(user) => start_session(&state, jar, &user, "/"),
        Err(e @ (AppError::BadRequest(_) | AppError::Conflict(_))) => render(&SignupPage {
            viewer: String::new(),
            email: form.email,
            error: e.to_string(),
        }),
        Err(e) => Err(e.into()),
    }
}

#[instrument(skip(state, user))]
async fn admin_index(
    State(state): State<AppState>,
    SessionUser(user): SessionUser,
) -> Result<Response, PageError> {
    if !user.is_staff {
        return Err(AppError::Forbidden.into());
    }
    let users = state.store.list_users().await?;
    let tag_count = state.store.list_tags(None).await?.len();
    let ingredient_count = state.store.list_ingredients(None).await?.len();
    let recipe_count = state.store.list_recipes(&RecipeFilter::default()).await?.len();
    render(&AdminIndexPage {
        viewer: user.email,
        users,
        tag_count,
        ingredient_count,
        recipe_count,
    })
}
