/// Cookie-based session authentication
///
/// The session is an RS256 token stored in the signed, HTTP-only `token`
/// cookie. `SessionAuth` rejects requests without a valid session and puts
/// the caller's identity into request extensions for `AuthenticatedUser`.
use crate::error::AppError;
use actix_web::{
    cookie::{time, Cookie, CookieJar, Key, SameSite},
    dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform},
    Error, FromRequest, HttpMessage, HttpRequest,
};
use crypto_core::jwt;
use futures::future::{ready, LocalBoxFuture, Ready};
use std::rc::Rc;
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "token";

/// Identity of the signed-in caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub id: Uuid,
    pub email: String,
}

/// Cookie signing key and attributes shared by the middleware and auth handlers
#[derive(Clone)]
pub struct CookieSettings {
    key: Key,
    secure: bool,
}

impl CookieSettings {
    pub fn new(key: Key, secure: bool) -> Self {
        Self { key, secure }
    }

    /// Key from a configured secret, or a random one for local development
    pub fn from_secret(secret: Option<&str>, secure: bool) -> Result<Self, String> {
        let key = match secret {
            Some(secret) => Key::try_from(secret.as_bytes())
                .map_err(|e| format!("Invalid session cookie secret: {e}"))?,
            None => {
                tracing::warn!("SESSION_COOKIE_SECRET not set; sessions will not survive restarts");
                Key::generate()
            }
        };
        Ok(Self::new(key, secure))
    }

    /// Signed session cookie carrying `token`
    pub fn session_cookie(&self, token: &str) -> Cookie<'static> {
        let cookie = Cookie::build(SESSION_COOKIE, token.to_owned())
            .path("/")
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::Strict)
            .max_age(time::Duration::days(jwt::SESSION_TOKEN_EXPIRY_DAYS))
            .finish();

        let mut jar = CookieJar::new();
        jar.signed_mut(&self.key).add(cookie);
        jar.get(SESSION_COOKIE)
            .cloned()
            .unwrap_or_else(|| Cookie::named(SESSION_COOKIE))
    }

    /// Cookie that clears the session in the browser
    pub fn removal_cookie(&self) -> Cookie<'static> {
        let mut cookie = Cookie::build(SESSION_COOKIE, "")
            .path("/")
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::Strict)
            .finish();
        cookie.make_removal();
        cookie
    }

    /// Token from a correctly signed session cookie, if any
    pub fn verified_token(&self, cookie: Option<Cookie<'static>>) -> Option<String> {
        let mut jar = CookieJar::new();
        jar.add_original(cookie?);
        jar.signed(&self.key)
            .get(SESSION_COOKIE)
            .map(|c| c.value().to_string())
    }

    /// Resolve the caller from the request's cookie. Any failure is `Unauthorized`.
    pub fn authenticate(&self, cookie: Option<Cookie<'static>>) -> Result<AuthenticatedUser, AppError> {
        let token = self
            .verified_token(cookie)
            .ok_or_else(|| AppError::Unauthorized("Please sign in to continue".into()))?;

        let claims = jwt::validate_token(&token)
            .map_err(|e| {
                tracing::debug!("Session token rejected: {}", e);
                AppError::Unauthorized("Session expired or invalid".into())
            })?
            .claims;

        let id = claims
            .user_id()
            .map_err(|_| AppError::Unauthorized("Session expired or invalid".into()))?;

        Ok(AuthenticatedUser {
            id,
            email: claims.email,
        })
    }
}

/// Session authentication middleware factory
pub struct SessionAuth {
    cookies: CookieSettings,
}

impl SessionAuth {
    pub fn new(cookies: CookieSettings) -> Self {
        Self { cookies }
    }
}

impl<S, B> Transform<S, ServiceRequest> for SessionAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = SessionAuthService<S>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(SessionAuthService {
            service: Rc::new(service),
            cookies: self.cookies.clone(),
        }))
    }
}

pub struct SessionAuthService<S> {
    service: Rc<S>,
    cookies: CookieSettings,
}

impl<S, B> Service<ServiceRequest> for SessionAuthService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        // Read the cookie before taking extensions_mut; both borrow the request head
        let user = self.cookies.authenticate(req.cookie(SESSION_COOKIE));

        Box::pin(async move {
            let user = user?;
            req.extensions_mut().insert(user);
            service.call(req).await
        })
    }
}

impl FromRequest for AuthenticatedUser {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        match req.extensions().get::<AuthenticatedUser>().cloned() {
            Some(user) => ready(Ok(user)),
            None => ready(Err(AppError::Unauthorized(
                "Please sign in to continue".into(),
            )
            .into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> CookieSettings {
        CookieSettings::new(Key::generate(), false)
    }

    #[test]
    fn test_session_cookie_attributes() {
        let cookie = settings().session_cookie("abc.def.ghi");
        assert_eq!(cookie.name(), SESSION_COOKIE);
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Strict));
        assert_eq!(cookie.max_age(), Some(time::Duration::days(7)));
        // Signed value is the token plus a MAC prefix
        assert_ne!(cookie.value(), "abc.def.ghi");
        assert!(cookie.value().ends_with("abc.def.ghi"));
    }

    #[test]
    fn test_signed_cookie_round_trip() {
        let settings = settings();
        let cookie = settings.session_cookie("abc.def.ghi");
        assert_eq!(
            settings.verified_token(Some(cookie)),
            Some("abc.def.ghi".to_string())
        );
    }

    #[test]
    fn test_unsigned_or_foreign_cookie_rejected() {
        let settings = settings();
        let forged = Cookie::new(SESSION_COOKIE, "abc.def.ghi");
        assert_eq!(settings.verified_token(Some(forged)), None);

        let other_key = settings_with_other_key().session_cookie("abc.def.ghi");
        assert_eq!(settings.verified_token(Some(other_key)), None);
        assert_eq!(settings.verified_token(None), None);
    }

    fn settings_with_other_key() -> CookieSettings {
        CookieSettings::new(Key::generate(), false)
    }

    #[test]
    fn test_removal_cookie_expires() {
        let cookie = settings().removal_cookie();
        assert_eq!(cookie.value(), "");
        assert_eq!(cookie.max_age(), Some(time::Duration::ZERO));
    }

    #[test]
    fn test_short_secret_rejected() {
        assert!(CookieSettings::from_secret(Some("short"), false).is_err());
        assert!(CookieSettings::from_secret(Some(&"k".repeat(64)), true).is_ok());
    }

    #[test]
    fn test_missing_cookie_is_unauthorized() {
        let err = settings().authenticate(None).unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }
}
