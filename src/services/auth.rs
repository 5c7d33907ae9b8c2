use actix_web::{
    FromRequest, HttpRequest,
    cookie::{Cookie, SameSite, time::Duration as CookieDuration},
    dev::Payload,
    http::header,
    web::Data,
};
use anyhow::{Result, anyhow};
use bcrypt::verify;
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::future::{Ready, ready};

use crate::AppState;
use crate::config::Config;
use crate::database::models::{Role, User};
use crate::database::repositories::UserRepository;
use crate::error::AppError;

pub const SESSION_COOKIE: &str = "session";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64, // user id
    pub username: String,
    pub role: Role,
    pub exp: usize, // expiration time
}

impl Claims {
    pub fn user_id(&self) -> i64 {
        self.sub
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

fn token_from_request(req: &HttpRequest) -> Option<String> {
    if let Some(cookie) = req.cookie(SESSION_COOKIE) {
        return Some(cookie.value().to_string());
    }

    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::to_string)
}

impl FromRequest for Claims {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let Some(token) = token_from_request(req) else {
            return ready(Err(AppError::Unauthenticated));
        };

        let Some(state) = req.app_data::<Data<AppState>>() else {
            log::error!("Application state missing from request");
            return ready(Err(AppError::internal_server_error_message(
                "application state not configured",
            )));
        };

        ready(
            decode_token(&token, &state.config.jwt_secret).map_err(|e| {
                log::debug!("Rejected session token: {}", e);
                AppError::Unauthenticated
            }),
        )
    }
}

/// Extractor that only admits admin sessions; everyone else gets a 403.
#[derive(Debug, Clone)]
pub struct AdminClaims(pub Claims);

impl FromRequest for AdminClaims {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let claims = match Claims::from_request(req, payload).into_inner() {
            Ok(claims) => claims,
            Err(AppError::Unauthenticated) => return ready(Err(AppError::admins_only())),
            Err(e) => return ready(Err(e)),
        };

        if claims.is_admin() {
            ready(Ok(AdminClaims(claims)))
        } else {
            log::warn!("User {} denied access to admin route", claims.username);
            ready(Err(AppError::admins_only()))
        }
    }
}

fn decode_token(token: &str, secret: &str) -> Result<Claims> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_ref()),
        &Validation::new(Algorithm::HS256),
    )?;

    Ok(token_data.claims)
}

#[derive(Debug)]
pub struct LoginSession {
    pub token: String,
    pub user: User,
}

#[derive(Clone)]
pub struct AuthService {
    user_repository: UserRepository,
    config: Config,
}

impl AuthService {
    pub fn new(user_repository: UserRepository, config: Config) -> Self {
        Self {
            user_repository,
            config,
        }
    }

    /// Unknown users and wrong passwords fail identically.
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginSession, AppError> {
        let user = self
            .user_repository
            .find_by_username(username)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        let matches = verify(password, &user.password_hash).map_err(|e| {
            log::error!("Stored hash for {} is unreadable: {}", username, e);
            AppError::InvalidCredentials
        })?;
        if !matches {
            return Err(AppError::InvalidCredentials);
        }

        let token = self.generate_token(&user)?;

        Ok(LoginSession { token, user })
    }

    pub fn verify_token(&self, token: &str) -> Result<Claims> {
        decode_token(token, &self.config.jwt_secret)
    }

    pub fn generate_token(&self, user: &User) -> Result<String> {
        let expiration = Utc::now()
            .checked_add_signed(Duration::hours(self.config.session_expiration_hours))
            .ok_or_else(|| anyhow!("Session expiry out of range"))?
            .timestamp() as usize;

        let claims = Claims {
            sub: user.id,
            username: user.username.clone(),
            role: user.role,
            exp: expiration,
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_ref()),
        )?;

        Ok(token)
    }

    pub fn session_cookie(&self, token: String) -> Cookie<'static> {
        Cookie::build(SESSION_COOKIE, token)
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.config.is_production())
            .max_age(CookieDuration::hours(self.config.session_expiration_hours))
            .finish()
    }

    pub fn removal_cookie(&self) -> Cookie<'static> {
        let mut cookie = Cookie::build(SESSION_COOKIE, "")
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .finish();
        cookie.make_removal();
        cookie
    }
}
