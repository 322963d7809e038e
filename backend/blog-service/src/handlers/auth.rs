/// Signup, sign-in and session cookie handlers
use crate::error::{AppError, Result};
use crate::middleware::{AuthenticatedUser, CookieSettings, SESSION_COOKIE};
use crate::models::{User, UserView};
use crate::services::auth::{SignInRequest, SignupRequest, VerifyOtpRequest};
use crate::services::AuthService;
use actix_web::{web, HttpRequest, HttpResponse};
use crypto_core::jwt;
use serde_json::json;

/// POST /api/Auth/otp
pub async fn request_otp(
    auth: web::Data<AuthService>,
    body: web::Json<SignupRequest>,
) -> Result<HttpResponse> {
    let id = auth.request_otp(body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({ "message": "OTP sent to your email", "id": id })))
}

/// POST /api/Auth/verify-otp
pub async fn verify_otp(
    auth: web::Data<AuthService>,
    cookies: web::Data<CookieSettings>,
    body: web::Json<VerifyOtpRequest>,
) -> Result<HttpResponse> {
    let user = auth.verify_otp(body.into_inner()).await?;
    signed_in(&cookies, &user, "Account created successfully")
}

/// POST /api/Auth/signin
pub async fn sign_in(
    req: HttpRequest,
    auth: web::Data<AuthService>,
    cookies: web::Data<CookieSettings>,
    body: web::Json<SignInRequest>,
) -> Result<HttpResponse> {
    if cookies.authenticate(req.cookie(SESSION_COOKIE)).is_ok() {
        return Err(AppError::BadRequest("You are already signed in".into()));
    }

    let user = auth.sign_in(body.into_inner()).await?;
    signed_in(&cookies, &user, "Signed in successfully")
}

/// POST /api/Auth/signOut
pub async fn sign_out(
    user: AuthenticatedUser,
    cookies: web::Data<CookieSettings>,
) -> Result<HttpResponse> {
    tracing::info!(user_id = %user.id, "signed out");
    Ok(HttpResponse::Ok()
        .cookie(cookies.removal_cookie())
        .json(json!({ "message": "Signed out successfully" })))
}

/// GET /api/Auth/checkLogin
pub async fn check_login(
    auth: web::Data<AuthService>,
    user: AuthenticatedUser,
) -> Result<HttpResponse> {
    let user = auth.current_user(user.id).await?;
    Ok(HttpResponse::Ok().json(json!({
        "message": "User is signed in",
        "user": UserView::from(&user),
    })))
}

fn signed_in(cookies: &CookieSettings, user: &User, message: &str) -> Result<HttpResponse> {
    let token = jwt::generate_session_token(user.id, &user.email)
        .map_err(|e| AppError::Internal(format!("Failed to issue session token: {e}")))?;

    Ok(HttpResponse::Ok()
        .cookie(cookies.session_cookie(&token))
        .json(json!({ "message": message, "user": UserView::from(user) })))
}
