use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::WithRejection;
use tracing::{info, instrument};

use super::{
    dto::{AuthResponse, DetailResponse, LoginRequest, PublicUser, RefreshRequest, RegisterRequest},
    extractors::CurrentUser,
    jwt::JwtKeys,
    services::{authenticate, issue_tokens, register},
};
use crate::{error::AppError, state::AppState};

pub fn rest_auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login/", post(login))
        .route("/logout/", post(logout))
        .route("/user/", get(current_user))
        .route("/registration/", post(registration))
        .route("/token/refresh/", post(refresh))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    WithRejection(Json(payload), _): WithRejection<Json<LoginRequest>, AppError>,
) -> Result<Json<AuthResponse>, AppError> {
    let user = authenticate(state.store.as_ref(), &payload.email, &payload.password).await?;
    let keys = JwtKeys::from_ref(&state);
    Ok(Json(issue_tokens(&keys, &user)?))
}

/// Tokens are stateless; the client discards them.
pub async fn logout() -> Json<DetailResponse> {
    Json(DetailResponse {
        detail: "Successfully logged out.".into(),
    })
}

#[instrument(skip(state, payload))]
pub async fn registration(
    State(state): State<AppState>,
    WithRejection(Json(payload), _): WithRejection<Json<RegisterRequest>, AppError>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    let user = register(
        state.store.as_ref(),
        &payload.email,
        &payload.password1,
        &payload.password2,
    )
    .await?;
    let keys = JwtKeys::from_ref(&state);
    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok((StatusCode::CREATED, Json(issue_tokens(&keys, &user)?)))
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    WithRejection(Json(payload), _): WithRejection<Json<RefreshRequest>, AppError>,
) -> Result<Json<AuthResponse>, AppError> {
    let keys = JwtKeys::from_ref(&state);
    let claims = keys
        .verify_refresh(&payload.refresh_token)
        .map_err(|_| AppError::Unauthorized)?;

    let user = state
        .store
        .find_user(claims.sub)
        .await?
        .filter(|u| u.is_active)
        .ok_or(AppError::Unauthorized)?;

    Ok(Json(issue_tokens(&keys, &user)?))
}

pub async fn current_user(CurrentUser(user): CurrentUser) -> Json<PublicUser> {
    Json(PublicUser::from(&user))
}
