use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use diesel::{prelude::*, result::DatabaseErrorKind};
use serde::{Deserialize, Serialize};

use crate::{
    auth::{password, AuthenticatedUser},
    error::{AppError, AppResult},
    models::{NewUser, User},
    schema::users::dsl,
    state::AppState,
};

const DEFAULT_ROLE: &str = "USER";

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub division: String,
}

#[derive(Serialize)]
pub struct RegisterResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub division: String,
    pub role: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

#[derive(Deserialize)]
pub struct DeviceTokenRequest {
    pub device_token: Option<String>,
}

pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<RegisterResponse>)> {
    let mut errors = Vec::new();
    for (value, field) in [
        (&payload.username, "username"),
        (&payload.email, "email"),
        (&payload.password, "password"),
        (&payload.division, "division"),
    ] {
        if value.trim().is_empty() {
            errors.push(format!("{field} is required"));
        }
    }
    if !errors.is_empty() {
        return Err(AppError::bad_request(errors.join(", ")));
    }

    let password_hash = password::hash_password(&payload.password)?;
    let new_user = NewUser {
        username: payload.username.trim().to_string(),
        email: payload.email.trim().to_string(),
        password_hash,
        division: payload.division.trim().to_string(),
        role: DEFAULT_ROLE.to_string(),
    };

    let mut conn = state.db()?;
    let user: User = match diesel::insert_into(dsl::users)
        .values(&new_user)
        .get_result(&mut conn)
    {
        Ok(user) => user,
        Err(diesel::result::Error::DatabaseError(DatabaseErrorKind::UniqueViolation, _)) => {
            return Err(AppError::conflict("email is already registered"));
        }
        Err(err) => return Err(AppError::from(err)),
    };

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            id: user.id,
            username: user.username,
            email: user.email,
            division: user.division,
            role: user.role,
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let mut conn = state.db()?;

    let user: User = dsl::users
        .filter(dsl::email.eq(&payload.email))
        .first(&mut conn)
        .map_err(|_| AppError::unauthorized())?;

    let valid = password::verify_password(&payload.password, &user.password_hash)
        .map_err(|_| AppError::unauthorized())?;
    if !valid {
        return Err(AppError::unauthorized());
    }

    let access_token = state.jwt.generate_token(&user).map_err(AppError::from)?;

    Ok(Json(LoginResponse {
        access_token,
        token_type: "Bearer".to_string(),
        expires_in: state.config.jwt_expiry_minutes * 60,
    }))
}

pub async fn me(user: AuthenticatedUser) -> Json<AuthenticatedUser> {
    Json(user)
}

/// Registers (or clears) the caller's push token; this is the lookup the
/// notification dispatcher performs delivery against.
pub async fn update_device_token(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<DeviceTokenRequest>,
) -> AppResult<impl IntoResponse> {
    let device_token = payload
        .device_token
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty());

    let mut conn = state.db()?;
    diesel::update(dsl::users.find(user.user_id))
        .set((
            dsl::device_token.eq(device_token),
            dsl::updated_at.eq(Utc::now().naive_utc()),
        ))
        .execute(&mut conn)?;

    Ok(StatusCode::NO_CONTENT)
}
