use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, warn};

use super::{
    dto::{AuthResponse, PublicUser},
    jwt::JwtKeys,
    password::hash_password,
    repo_types::{normalize_email, NewUser, User},
};
use crate::{
    config::BootstrapAdmin,
    error::AppError,
    store::{DuplicateEmail, Store},
};

pub const MIN_PASSWORD_LEN: usize = 8;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex =
            Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("static email regex");
    }
    EMAIL_RE.is_match(email)
}

pub async fn create_user(store: &dyn Store, email: &str, password: &str) -> Result<User, AppError> {
    let new = NewUser::regular(email, String::new())?;
    insert_account(store, new, password).await
}

pub async fn create_superuser(
    store: &dyn Store,
    email: &str,
    password: &str,
) -> Result<User, AppError> {
    let new = NewUser::superuser(email, String::new())?;
    insert_account(store, new, password).await
}

async fn insert_account(
    store: &dyn Store,
    mut new: NewUser,
    password: &str,
) -> Result<User, AppError> {
    if store.find_user_by_email(&new.email).await?.is_some() {
        warn!(email = %new.email, "email already registered");
        return Err(AppError::Conflict("Email already registered".into()));
    }
    new.password_hash = hash_password(password)?;
    let user = store.insert_user(new).await.map_err(account_insert_error)?;
    info!(user_id = %user.id, email = %user.email, superuser = user.is_superuser, "user created");
    Ok(user)
}

/// A concurrent signup can still win the race past the lookup above; the
/// store's unique constraint then reports the duplicate.
fn account_insert_error(e: anyhow::Error) -> AppError {
    match e.downcast_ref::<DuplicateEmail>() {
        Some(dup) => {
            warn!(error = %dup, "email already registered");
            AppError::Conflict("Email already registered".into())
        }
        None => AppError::Internal(e),
    }
}

/// Self-service signup: checks the email format and the password pair
/// before creating a regular account.
pub async fn register(
    store: &dyn Store,
    email: &str,
    password1: &str,
    password2: &str,
) -> Result<User, AppError> {
    let email = normalize_email(email);
    if !is_valid_email(&email) {
        warn!(email = %email, "invalid email");
        return Err(AppError::BadRequest("Invalid email".into()));
    }
    if password1 != password2 {
        return Err(AppError::BadRequest("The two password fields didn't match".into()));
    }
    if password1.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::BadRequest("Password too short".into()));
    }
    create_user(store, &email, password1).await
}

pub async fn authenticate(store: &dyn Store, email: &str, password: &str) -> Result<User, AppError> {
    let email = normalize_email(email);
    let Some(user) = store.find_user_by_email(&email).await? else {
        warn!(email = %email, "login unknown email");
        return Err(AppError::Unauthorized);
    };
    if !user.is_active || !user.check_password(password)? {
        warn!(email = %email, user_id = %user.id, "login rejected");
        return Err(AppError::Unauthorized);
    }
    info!(user_id = %user.id, "user logged in");
    Ok(user)
}

pub fn issue_tokens(keys: &JwtKeys, user: &User) -> Result<AuthResponse, AppError> {
    Ok(AuthResponse {
        access_token: keys.sign_access(user.id)?,
        refresh_token: keys.sign_refresh(user.id)?,
        user: PublicUser::from(user),
    })
}

/// Creates the configured superuser unless that email already exists.
pub async fn seed_admin(store: &dyn Store, admin: &BootstrapAdmin) -> anyhow::Result<()> {
    let email = normalize_email(&admin.email);
    if store.find_user_by_email(&email).await?.is_some() {
        return Ok(());
    }
    create_superuser(store, &email, &admin.password)
        .await
        .map_err(|e| anyhow::anyhow!("seed superuser {email}: {e}"))?;
    Ok(())
}
