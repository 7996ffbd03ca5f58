//! Authentication endpoints: login, logout, me

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use shared::client::{CurrentUserResponse, LoginRequest, LoginResponse, UserInfo};
use shared::error::{ApiResponse, AppError, ErrorCode};

use crate::auth::CurrentUser;
use crate::connections::{Credentials, Role, current_role};
use crate::db;
use crate::db::users::UserAccount;
use crate::error::ServiceError;
use crate::state::AppState;
use crate::utils::validation::{validate_email, validate_password};
use crate::utils::verify_password;

use super::ApiResult;

/// Account ID carried by the built-in administrator's token
const ADMIN_ACCOUNT_ID: u64 = 0;

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<LoginResponse> {
    let Json(req) =
        payload.map_err(|rejection| AppError::invalid_request(rejection.body_text()))?;
    let email = req.email.trim();
    validate_email(email)?;
    validate_password(&req.password)?;

    if state.config.is_admin_identity(email) && req.password == state.config.admin_password {
        return admin_login(&state, email).await;
    }

    let account = db::users::find_by_username(&state.pool, email)
        .await
        .map_err(ServiceError::from)?
        .ok_or_else(|| {
            tracing::info!(email = %email, "Login failed: unknown account");
            AppError::invalid_credentials()
        })?;

    if !verify_password(&req.password, &account.usu_contrasena) {
        tracing::info!(email = %email, "Login failed: wrong password");
        return Err(AppError::invalid_credentials());
    }

    let role = account.role().ok_or_else(|| {
        tracing::warn!(
            email = %email,
            stored_role = %account.usu_rol,
            "Login failed: unknown stored role"
        );
        AppError::new(ErrorCode::InvalidUserRole)
    })?;

    let user_id = token_subject(&account, role)?;

    // The database login is the email itself
    let credentials = Credentials::new(email, req.password.as_str());
    state
        .registry
        .acquire(email, &credentials, role.label())
        .await?;
    state.registry.log_status();

    let token = issue_token(&state, user_id, email, role.label())?;
    tracing::info!(email = %email, role = %role, "User logged in");

    Ok(Json(LoginResponse {
        token,
        user_type: role.label().to_string(),
        user: UserInfo {
            id: user_id,
            email: email.to_string(),
            role: role.label().to_string(),
        },
    }))
}

/// Tokens carry the employee or client ID that downstream handlers key on
fn token_subject(account: &UserAccount, role: Role) -> Result<u64, AppError> {
    account.profile_id(role).map(u64::from).ok_or_else(|| {
        tracing::warn!(
            account = account.usu_id,
            role = %role,
            "Login failed: account has no linked profile"
        );
        AppError::with_message(ErrorCode::InvalidUserRole, "Account has no linked profile")
    })
}

/// Administrator takeover: every other user session is dropped
async fn admin_login(state: &AppState, email: &str) -> ApiResult<LoginResponse> {
    let config = &state.config;
    state
        .registry
        .evict_all(|identity| config.is_admin_identity(identity))
        .await;
    state.registry.log_status();

    let token = issue_token(state, ADMIN_ACCOUNT_ID, email, Role::Admin.label())?;
    tracing::info!(email = %email, "Administrator logged in");

    Ok(Json(LoginResponse {
        token,
        user_type: Role::Admin.label().to_string(),
        user: UserInfo {
            id: ADMIN_ACCOUNT_ID,
            email: email.to_string(),
            role: Role::Admin.label().to_string(),
        },
    }))
}

fn issue_token(
    state: &AppState,
    user_id: u64,
    email: &str,
    user_type: &str,
) -> Result<String, AppError> {
    state
        .jwt
        .generate_token(user_id, email, user_type)
        .map_err(|e| {
            tracing::error!(error = %e, "JWT creation failed");
            AppError::internal()
        })
}

/// POST /api/auth/logout
pub async fn logout(State(state): State<AppState>, user: CurrentUser) -> ApiResponse<()> {
    if !state.config.is_admin_identity(&user.email) {
        state.registry.evict(&user.email).await;
        state.registry.log_status();
    }
    tracing::info!(email = %user.email, "User logged out");
    ApiResponse::ok_with_message("Logged out successfully")
}

/// GET /api/auth/me
pub async fn me(
    State(state): State<AppState>,
    user: CurrentUser,
) -> ApiResult<CurrentUserResponse> {
    let db_role = if state.config.is_admin_identity(&user.email) {
        None
    } else {
        let session = state
            .registry
            .get(&user.email)
            .ok_or_else(AppError::session_expired)?;
        let mut conn = session
            .connection()
            .await
            .ok_or_else(AppError::session_expired)?;
        let queried = current_role(&mut conn).await;
        drop(conn);

        match queried {
            Ok(role) => role,
            Err(e) => {
                // Dead connection: drop it so the next login opens a new one
                tracing::warn!(email = %user.email, error = %e, "User connection query failed");
                state.registry.evict_session(&session).await;
                return Err(AppError::session_expired());
            }
        }
    };

    Ok(Json(CurrentUserResponse {
        id: user.id,
        email: user.email,
        user_type: user.user_type,
        db_role,
    }))
}
