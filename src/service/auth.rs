use std::future::{ready, Ready};
use std::rc::Rc;

use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::{HttpMessage, HttpRequest};
use futures_util::future::LocalBoxFuture;
use uuid::Uuid;

use crate::errors::ApiError;
use crate::models::UserRole;
use crate::{db, PGPool};

/// Identity resolved from the bearer token, attached to the request by
/// `AuthMiddleware` and passed explicitly into the service layer.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub role: UserRole,
}

/// Reads the request's identity, if the middleware attached one.
pub fn current_user(req: &HttpRequest) -> Option<AuthUser> {
    req.extensions().get::<AuthUser>().cloned()
}

/// Pure authorization predicate: no identity -> unauthenticated, identity
/// with a role outside the allowed set -> forbidden.
pub fn require_roles(user: Option<AuthUser>, allowed: &[UserRole]) -> Result<AuthUser, ApiError> {
    match user {
        None => Err(ApiError::Unauthenticated),
        Some(user) if allowed.contains(&user.role) => Ok(user),
        Some(_) => Err(ApiError::Forbidden),
    }
}

/// Shorthand for endpoints open to every authenticated account.
pub fn require_authenticated(user: Option<AuthUser>) -> Result<AuthUser, ApiError> {
    require_roles(user, &[UserRole::User, UserRole::Admin, UserRole::SuperAdmin])
}

/// Resolves `Authorization: Bearer <token>` to an `AuthUser`. A missing
/// header leaves the request anonymous; an invalid or expired token is a
/// hard 401; a valid token for a user that no longer exists is a 404.
pub struct AuthMiddleware {
    pub db_pool: PGPool,
    pub jwt_secret: String,
}

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = actix_web::Error;
    type Transform = AuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService {
            service: Rc::new(service),
            db_pool: self.db_pool.clone(),
            jwt_secret: self.jwt_secret.clone(),
        }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: Rc<S>,
    db_pool: PGPool,
    jwt_secret: String,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let pool = self.db_pool.clone();
        let secret = self.jwt_secret.clone();
        Box::pin(async move {
            if let Some(token) = jwt::bearer_token(&req) {
                let claims = jwt::decode_claims(&token, &secret)
                    .map_err(|_| ApiError::Unauthenticated)?;
                let user = db::user::get_by_id(claims.sub, &pool)
                    .await
                    .map_err(ApiError::from)?
                    .ok_or(ApiError::UserNotFound)?;
                req.extensions_mut().insert(AuthUser {
                    id: user.id,
                    role: user.role,
                });
            }
            service.call(req).await
        })
    }
}

pub mod jwt {
    use actix_web::dev::ServiceRequest;
    use chrono::{DateTime, Duration, Utc};
    use jsonwebtoken::{
        decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation,
    };
    use uuid::Uuid;

    use crate::dto::Claims;
    use crate::errors::ApiError;

    /// Tokens stay valid for 24 hours; there is no refresh flow and no
    /// revocation list.
    pub const TOKEN_TTL_SECS: i64 = 24 * 60 * 60;

    pub fn create_token(
        user_id: Uuid,
        secret: &str,
        ttl_secs: i64,
    ) -> Result<(String, DateTime<Utc>), ApiError> {
        let expires_at = Utc::now() + Duration::seconds(ttl_secs);
        let claims = Claims {
            sub: user_id,
            exp: expires_at.timestamp() as usize,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_ref()),
        )
        .map_err(|_| ApiError::Internal)?;
        Ok((token, expires_at))
    }

    /// Fails on signature mismatch or expiry; the caller decides whether
    /// that means "anonymous" or a hard 401.
    pub fn decode_claims(token: &str, secret: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(secret.as_ref()),
            &Validation::new(Algorithm::HS256),
        )?;
        Ok(data.claims)
    }

    pub fn bearer_token(req: &ServiceRequest) -> Option<String> {
        let auth_header = req.headers().get("Authorization")?;
        let auth_value = auth_header.to_str().ok()?;
        auth_value
            .strip_prefix("Bearer ")
            .map(|token| token.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::auth::jwt::{create_token, decode_claims, TOKEN_TTL_SECS};

    const SECRET: &str = "test-secret";

    fn auth_user(role: UserRole) -> AuthUser {
        AuthUser {
            id: Uuid::new_v4(),
            role,
        }
    }

    #[test]
    fn token_round_trip_carries_the_user_id() {
        let user_id = Uuid::new_v4();
        let (token, expires_at) = create_token(user_id, SECRET, TOKEN_TTL_SECS).unwrap();
        let claims = decode_claims(&token, SECRET).unwrap();
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.exp, expires_at.timestamp() as usize);
    }

    #[test]
    fn expired_tokens_are_rejected() {
        let (token, _) = create_token(Uuid::new_v4(), SECRET, -2 * 60 * 60).unwrap();
        assert!(decode_claims(&token, SECRET).is_err());
    }

    #[test]
    fn tokens_signed_with_another_secret_are_rejected() {
        let (token, _) = create_token(Uuid::new_v4(), "other-secret", TOKEN_TTL_SECS).unwrap();
        assert!(decode_claims(&token, SECRET).is_err());
    }

    #[test]
    fn guard_rejects_anonymous_callers() {
        let res = require_roles(None, &[UserRole::User]);
        assert!(matches!(res, Err(ApiError::Unauthenticated)));
    }

    #[test]
    fn guard_rejects_roles_outside_the_allowed_set() {
        let res = require_roles(Some(auth_user(UserRole::User)), &[UserRole::Admin, UserRole::SuperAdmin]);
        assert!(matches!(res, Err(ApiError::Forbidden)));
    }

    #[test]
    fn guard_passes_matching_roles_through() {
        let user = auth_user(UserRole::Admin);
        let id = user.id;
        let allowed = require_roles(Some(user), &[UserRole::Admin, UserRole::SuperAdmin]).unwrap();
        assert_eq!(allowed.id, id);
    }

    #[test]
    fn every_account_role_is_authenticated() {
        for role in [UserRole::User, UserRole::Admin, UserRole::SuperAdmin] {
            assert!(require_authenticated(Some(auth_user(role))).is_ok());
        }
        assert!(require_authenticated(None).is_err());
    }
}
