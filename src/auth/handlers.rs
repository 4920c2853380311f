use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Router,
};
use axum_extra::extract::cookie::CookieJar;
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        cookie::{cleared_cookie, session_cookie},
        dto::{
            AuthResponse, CurrentUserResponse, LoginRequest, LogoutResponse, PublicUser,
            RegisterRequest,
        },
        extractors::SessionUser,
        password,
        repo::CreateUserError,
        services::validate_credentials,
    },
    error::{method_not_allowed, AppError, AppResult, Json},
    state::AppState,
};

const INVALID_CREDENTIALS: &str = "Invalid credentials";

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register).fallback(method_not_allowed))
        .route("/auth/login", post(login).fallback(method_not_allowed))
        .route("/auth/logout", post(logout).fallback(method_not_allowed))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/user", get(current_user).fallback(method_not_allowed))
}

#[instrument(skip(state, jar, payload))]
pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<RegisterRequest>,
) -> AppResult<(StatusCode, CookieJar, Json<AuthResponse>)> {
    let email = validate_credentials(&payload.email, &payload.password).inspect_err(|e| {
        warn!(error = %e, "register rejected");
    })?;

    if state.users.find_by_email(&email).await?.is_some() {
        warn!(email = %email, "email already registered");
        return Err(AppError::Conflict("User already exists"));
    }

    let hash = password::hash_blocking(payload.password).await?;

    // A concurrent registration can still win the race; the store reports it.
    let user = match state.users.create(&email, &hash).await {
        Ok(u) => u,
        Err(CreateUserError::EmailTaken) => {
            warn!(email = %email, "email registered concurrently");
            return Err(AppError::Conflict("User already exists"));
        }
        Err(CreateUserError::Other(e)) => return Err(e.into()),
    };

    let token = state.keys.issue(user.id)?;
    let jar = jar.add(session_cookie(
        token,
        state.config.secure_cookies(),
        state.keys.ttl(),
    ));

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok((
        StatusCode::CREATED,
        jar,
        Json(AuthResponse {
            success: true,
            user: PublicUser::from(&user),
        }),
    ))
}

#[instrument(skip(state, jar, payload))]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<LoginRequest>,
) -> AppResult<(CookieJar, Json<AuthResponse>)> {
    let email = validate_credentials(&payload.email, &payload.password).inspect_err(|e| {
        warn!(error = %e, "login rejected");
    })?;

    // Unknown email and wrong password must look the same to the caller.
    let Some(user) = state.users.find_by_email(&email).await? else {
        warn!(email = %email, "login unknown email");
        return Err(AppError::Unauthorized(INVALID_CREDENTIALS));
    };

    if !password::verify_blocking(payload.password, user.password_hash.clone()).await? {
        warn!(user_id = %user.id, "login invalid password");
        return Err(AppError::Unauthorized(INVALID_CREDENTIALS));
    }

    state.users.record_login(user.id).await?;

    let token = state.keys.issue(user.id)?;
    let jar = jar.add(session_cookie(
        token,
        state.config.secure_cookies(),
        state.keys.ttl(),
    ));

    info!(user_id = %user.id, "user logged in");
    Ok((
        jar,
        Json(AuthResponse {
            success: true,
            user: PublicUser::from(&user),
        }),
    ))
}

/// Clears the cookie only. Tokens are stateless, so a copy taken before
/// logout stays valid until it expires.
#[instrument(skip(state, jar))]
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> (CookieJar, Json<LogoutResponse>) {
    let jar = jar.add(cleared_cookie(state.config.secure_cookies()));
    info!("session cookie cleared");
    (
        jar,
        Json(LogoutResponse {
            success: true,
            message: "Logged out successfully",
        }),
    )
}

#[instrument(skip_all)]
pub async fn current_user(SessionUser(user): SessionUser) -> Json<CurrentUserResponse> {
    Json(CurrentUserResponse {
        success: true,
        user: user.into(),
    })
}

#[cfg(test)]
mod tests {
    use axum::http::{header, Method, StatusCode};
    use serde_json::json;
    use uuid::Uuid;

    use crate::test_util::{cookie_pair, json_request, register, send, test_app, test_state};

    const EMAIL: &str = "a@b.com";
    const PASSWORD: &str = "Abcdef1!";

    #[tokio::test]
    async fn register_login_me_logout_flow() {
        let app = test_app();

        let (status, headers, body) = send(
            &app,
            json_request(Method::POST, "/api/auth/register", json!({"email": EMAIL, "password": PASSWORD}), None),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert!(cookie_pair(&headers).is_some());
        let registered_id = body["user"]["id"].as_str().unwrap().to_string();
        assert_eq!(body["user"]["email"], EMAIL);
        assert_eq!(body["user"]["name"], "a");
        assert!(body["user"].get("password_hash").is_none());

        let (status, headers, body) = send(
            &app,
            json_request(Method::POST, "/api/auth/login", json!({"email": EMAIL, "password": PASSWORD}), None),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user"]["id"], registered_id.as_str());
        let set_cookie = headers.get(header::SET_COOKIE).unwrap().to_str().unwrap();
        assert!(set_cookie.contains("HttpOnly"));
        assert!(set_cookie.contains("SameSite=Strict"));
        assert!(set_cookie.contains("Secure"));
        assert!(set_cookie.contains("Path=/"));
        assert!(set_cookie.contains("Max-Age=604800"));
        let cookie = cookie_pair(&headers).unwrap();

        let (status, _, body) = send(&app, json_request(Method::GET, "/api/user", json!(null), Some(&cookie))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user"]["email"], EMAIL);
        assert!(!body["user"]["last_login"].is_null());
        assert!(body["user"].get("password_hash").is_none());

        let (status, headers, body) =
            send(&app, json_request(Method::POST, "/api/auth/logout", json!(null), Some(&cookie))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        let cleared = headers.get(header::SET_COOKIE).unwrap().to_str().unwrap();
        assert!(cleared.starts_with("token=;"));
        assert!(cleared.contains("1970"));

        let (status, _, _) = send(&app, json_request(Method::GET, "/api/user", json!(null), None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        // Stateless tokens: the pre-logout cookie still authenticates if replayed.
        let (status, _, _) = send(&app, json_request(Method::GET, "/api/user", json!(null), Some(&cookie))).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn register_normalizes_email() {
        let app = test_app();
        let (status, _, body) = send(
            &app,
            json_request(Method::POST, "/api/auth/register", json!({"email": "  Mixed@Case.COM ", "password": PASSWORD}), None),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["user"]["email"], "mixed@case.com");
    }

    #[tokio::test]
    async fn register_rejects_invalid_input() {
        let app = test_app();
        for payload in [
            json!({"email": "not-an-email", "password": PASSWORD}),
            json!({"email": EMAIL, "password": "short"}),
            json!({"email": EMAIL}),
        ] {
            let (status, headers, body) =
                send(&app, json_request(Method::POST, "/api/auth/register", payload, None)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert!(headers.get(header::SET_COOKIE).is_none());
            assert_eq!(body["success"], false);
        }
    }

    #[tokio::test]
    async fn duplicate_registration_conflicts_and_keeps_first_user() {
        let state = test_state();
        let app = crate::app::build_app(state.clone());
        register(&app, EMAIL, PASSWORD).await;
        let first = state.users.find_by_email(EMAIL).await.unwrap().unwrap();

        let (status, headers, body) = send(
            &app,
            json_request(Method::POST, "/api/auth/register", json!({"email": EMAIL, "password": "Different1!"}), None),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert!(headers.get(header::SET_COOKIE).is_none());
        assert_eq!(body["message"], "User already exists");

        let after = state.users.find_by_email(EMAIL).await.unwrap().unwrap();
        assert_eq!(after.id, first.id);
        assert_eq!(after.password_hash, first.password_hash);
    }

    #[tokio::test]
    async fn unknown_email_and_wrong_password_look_identical() {
        let app = test_app();
        register(&app, EMAIL, PASSWORD).await;

        let (s1, h1, b1) = send(
            &app,
            json_request(Method::POST, "/api/auth/login", json!({"email": "nobody@b.com", "password": PASSWORD}), None),
        )
        .await;
        let (s2, h2, b2) = send(
            &app,
            json_request(Method::POST, "/api/auth/login", json!({"email": EMAIL, "password": "Wrong-pass1"}), None),
        )
        .await;

        assert_eq!(s1, StatusCode::UNAUTHORIZED);
        assert_eq!(s1, s2);
        assert_eq!(b1, b2);
        assert_eq!(b1["message"], "Invalid credentials");
        assert!(h1.get(header::SET_COOKIE).is_none());
        assert!(h2.get(header::SET_COOKIE).is_none());
    }

    #[tokio::test]
    async fn logout_requires_post() {
        let app = test_app();
        let (status, headers, body) =
            send(&app, json_request(Method::GET, "/api/auth/logout", json!(null), None)).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Method not allowed");
        assert!(cookie_pair(&headers).is_none());
    }

    #[tokio::test]
    async fn current_user_rejects_bad_tokens() {
        let state = test_state();
        let app = crate::app::build_app(state.clone());

        let (status, _, body) =
            send(&app, json_request(Method::GET, "/api/user", json!(null), Some("token=garbage"))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["success"], false);

        let expired = state
            .keys
            .issue_at(Uuid::new_v4(), time::OffsetDateTime::now_utc() - time::Duration::days(30))
            .unwrap();
        let (status, _, _) = send(
            &app,
            json_request(Method::GET, "/api/user", json!(null), Some(&format!("token={expired}"))),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn current_user_for_missing_user_is_not_found() {
        let state = test_state();
        let app = crate::app::build_app(state.clone());
        let orphan = state.keys.issue(Uuid::new_v4()).unwrap();
        let (status, _, body) = send(
            &app,
            json_request(Method::GET, "/api/user", json!(null), Some(&format!("token={orphan}"))),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "User not found");
    }
}
