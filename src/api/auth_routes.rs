use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use tracing::{error, info};
use uuid::Uuid;

use crate::api::types::*;
use crate::api::{AppState, AuthBearer};
use crate::models::user::{Preferences, User, UserResponse, UserRole};
use crate::utils::crypto::PasswordManager;
use crate::utils::validation::Validator;

/// Register a campus user and issue a token.
#[utoipa::path(post, path = "/api/user-auth/register", request_body = RegisterRequest,
    responses(
        (status = 201, body = AuthResponse),
        (status = 400, body = ErrorResponse),
        (status = 409, body = ErrorResponse)
    ))]
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Response {
    if let Err(e) = Validator::validate_email(&req.email)
        .and_then(|_| Validator::validate_password(&req.password))
    {
        return (StatusCode::BAD_REQUEST, Json(ErrorResponse::new(e.to_string()))).into_response();
    }

    match state.db.get_user_by_email(&req.email).await {
        Ok(Some(_)) => {
            info!(action = "register_email_conflict", user = %req.email);
            return (
                StatusCode::CONFLICT,
                Json(ErrorResponse::new("User already exists with this email")),
            )
                .into_response();
        }
        Ok(None) => {}
        Err(e) => {
            error!(action = "register_lookup_failed", error = %e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new("Internal server error during registration")),
            )
                .into_response();
        }
    }

    // Role-specific details must match the declared role.
    let detail_ok = match req.role {
        UserRole::Student => req.student_details.is_some(),
        UserRole::Teacher => req.teacher_details.is_some(),
        UserRole::Principal => req.principal_details.is_some(),
    };
    if !detail_ok {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(format!(
                "Missing {} details",
                req.role.as_str()
            ))),
        )
            .into_response();
    }

    let password_hash = match PasswordManager::hash_password(&req.password) {
        Ok(h) => h,
        Err(e) => {
            error!(action = "register_hash_failed", error = %e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new("Internal server error during registration")),
            )
                .into_response();
        }
    };

    let now = Utc::now();
    let user = User {
        id: Uuid::new_v4(),
        email: req.email.trim().to_lowercase(),
        password_hash,
        role: req.role,
        profile: req.profile,
        student_details: req.student_details,
        teacher_details: req.teacher_details,
        principal_details: req.principal_details,
        preferences: Preferences::default(),
        is_active: true,
        last_login: None,
        created_at: now,
        updated_at: now,
    };

    if let Err(e) = state.db.create_user(&user).await {
        error!(action = "register_create_failed", user = %user.email, error = %e);
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::new("Could not create account")),
        )
            .into_response();
    }

    let token = match state.auth.issue_token(&user).await {
        Ok(t) => t,
        Err(e) => {
            error!(action = "register_token_failed", user = %user.email, error = %e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new("Internal server error during registration")),
            )
                .into_response();
        }
    };

    info!(action = "register_success", user = %user.email, role = user.role.as_str());
    (
        StatusCode::CREATED,
        Json(AuthResponse {
            message: "User registered successfully".to_string(),
            token,
            user: user.into(),
        }),
    )
        .into_response()
}

#[utoipa::path(post, path = "/api/user-auth/login", request_body = LoginRequest,
    responses((status = 200, body = AuthResponse), (status = 401, body = ErrorResponse)))]
pub async fn login(State(state): State<AppState>, Json(req): Json<LoginRequest>) -> Response {
    match state.auth.login(&req.email, &req.password).await {
        Ok((user, token)) => {
            info!(action = "login_success", user = %req.email);
            (
                StatusCode::OK,
                Json(AuthResponse {
                    message: "Login successful".to_string(),
                    token,
                    user: user.into(),
                }),
            )
                .into_response()
        }
        Err(e) => {
            info!(action = "login_failed", user = %req.email, error = %e);
            (
                StatusCode::UNAUTHORIZED,
                Json(ErrorResponse::new("Invalid email or password")),
            )
                .into_response()
        }
    }
}

#[utoipa::path(get, path = "/api/user-auth/profile",
    responses((status = 200, body = ProfileResponse), (status = 401, body = ErrorResponse)))]
pub async fn get_profile(State(state): State<AppState>, AuthBearer(token): AuthBearer) -> Response {
    let identity = match state.auth.validate_token(&token).await {
        Ok(u) => u,
        Err(_) => return unauthorized(),
    };
    match state.db.get_user_by_id(&identity.user_id).await {
        Ok(Some(user)) => (
            StatusCode::OK,
            Json(ProfileResponse {
                user: UserResponse::from(user),
            }),
        )
            .into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new("User not found")),
        )
            .into_response(),
        Err(e) => {
            error!(action = "profile_fetch_failed", error = %e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new("Error fetching profile")),
            )
                .into_response()
        }
    }
}

#[utoipa::path(put, path = "/api/user-auth/profile", request_body = UpdateProfileRequest,
    responses((status = 200, body = ProfileResponse), (status = 401, body = ErrorResponse)))]
pub async fn update_profile(
    State(state): State<AppState>,
    AuthBearer(token): AuthBearer,
    Json(req): Json<UpdateProfileRequest>,
) -> Response {
    let identity = match state.auth.validate_token(&token).await {
        Ok(u) => u,
        Err(_) => return unauthorized(),
    };
    let user = match state.db.get_user_by_id(&identity.user_id).await {
        Ok(Some(u)) => u,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(ErrorResponse::new("User not found")),
            )
                .into_response();
        }
        Err(e) => {
            error!(action = "profile_update_failed", error = %e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new("Error updating profile")),
            )
                .into_response();
        }
    };

    let profile = req.profile.unwrap_or(user.profile);
    let preferences = req.preferences.unwrap_or(user.preferences);
    if let Err(e) = state
        .db
        .update_user_profile(&identity.user_id, &profile, &preferences)
        .await
    {
        error!(action = "profile_update_failed", error = %e);
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::new("Error updating profile")),
        )
            .into_response();
    }

    info!(action = "profile_updated", user = %identity.email);
    match state.db.get_user_by_id(&identity.user_id).await {
        Ok(Some(updated)) => (
            StatusCode::OK,
            Json(ProfileResponse {
                user: UserResponse::from(updated),
            }),
        )
            .into_response(),
        _ => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::new("Error updating profile")),
        )
            .into_response(),
    }
}

#[utoipa::path(post, path = "/api/user-auth/change-password", request_body = ChangePasswordRequest,
    responses(
        (status = 200, body = SimpleResponse),
        (status = 400, body = ErrorResponse),
        (status = 401, body = ErrorResponse)
    ))]
pub async fn change_password(
    State(state): State<AppState>,
    AuthBearer(token): AuthBearer,
    Json(req): Json<ChangePasswordRequest>,
) -> Response {
    let identity = match state.auth.validate_token(&token).await {
        Ok(u) => u,
        Err(_) => return unauthorized(),
    };
    let user = match state.db.get_user_by_id(&identity.user_id).await {
        Ok(Some(u)) => u,
        _ => return unauthorized(),
    };

    match PasswordManager::verify_password(&req.current_password, &user.password_hash) {
        Ok(true) => {}
        _ => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::new("Current password is incorrect")),
            )
                .into_response();
        }
    }
    if let Err(e) = Validator::validate_password(&req.new_password) {
        return (StatusCode::BAD_REQUEST, Json(ErrorResponse::new(e.to_string()))).into_response();
    }

    let hash = match PasswordManager::hash_password(&req.new_password) {
        Ok(h) => h,
        Err(e) => {
            error!(action = "change_password_failed", error = %e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new("Error changing password")),
            )
                .into_response();
        }
    };
    if let Err(e) = state.db.update_user_password(&identity.user_id, &hash).await {
        error!(action = "change_password_failed", error = %e);
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::new("Error changing password")),
        )
            .into_response();
    }

    info!(action = "password_changed", user = %identity.email);
    (
        StatusCode::OK,
        Json(SimpleResponse {
            success: true,
            message: "Password changed successfully".to_string(),
        }),
    )
        .into_response()
}

#[utoipa::path(post, path = "/api/user-auth/logout",
    responses((status = 200, body = SimpleResponse), (status = 401, body = ErrorResponse)))]
pub async fn logout(State(state): State<AppState>, AuthBearer(token): AuthBearer) -> Response {
    match state.auth.logout(&token).await {
        Ok(()) => (
            StatusCode::OK,
            Json(SimpleResponse {
                success: true,
                message: "Logout successful".to_string(),
            }),
        )
            .into_response(),
        Err(_) => unauthorized(),
    }
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(ErrorResponse::new("Missing or invalid credentials")),
    )
        .into_response()
}
