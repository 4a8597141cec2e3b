use chrono::Duration;
use chrono::Local;
use hmac::{Hmac, Mac};
use jwt::SignWithKey;
use jwt::VerifyWithKey;
use serde::Deserialize;
use serde::Serialize;
use sha2::Sha256;

use crate::database::error::ApiError;
use crate::database::schema::User;
use crate::error::HttpError;
use crate::schema::UserRole;

use super::permissions::ActionType;

fn session_key() -> Hmac<Sha256> {
    let secret =
        std::env::var("JWT_SECRET").unwrap_or_else(|_| String::from("insecure-dev-secret"));
    Hmac::new_from_slice(secret.as_bytes()).unwrap()
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct JwtSessionData {
    pub user_id: i32,
    pub username: String,
    pub user_role: UserRole,
    iat: i64,
    exp: i64,
}

impl JwtSessionData {
    pub fn new(id: i32, username: String, role: UserRole) -> Self {
        let now = Local::now();
        let iat = now.timestamp();
        let exp = (now + Duration::hours(1)).timestamp();

        Self {
            user_id: id,
            username,
            user_role: role,
            iat,
            exp,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SessionData {
    pub user_id: i32,
    pub username: String,
    pub user_role: UserRole,
    pub is_admin: bool,
}

impl SessionData {
    pub fn authenticate(&self, action: ActionType) -> Result<(), ApiError> {
        if !action.authenticate(self) {
            return Err(
                HttpError::Unauthorized.new("You don't have permission to perform this action")
            );
        }
        Ok(())
    }
}

impl Into<SessionData> for JwtSessionData {
    fn into(self) -> SessionData {
        SessionData {
            username: self.username,
            user_id: self.user_id,
            is_admin: self.user_role == UserRole::Admin,
            user_role: self.user_role,
        }
    }
}

pub fn generate_jwt_session(user: &User) -> String {
    let claims = JwtSessionData::new(user.id, user.username.to_owned(), user.role.to_owned());

    claims.sign_with_key(&session_key()).unwrap()
}

pub fn verify_jwt_session(token: String) -> Result<JwtSessionData, ApiError> {
    token
        .verify_with_key(&session_key())
        .map_err(|_| HttpError::InvalidSession.new("Invalid session; Invalid token"))
        .map(|session: JwtSessionData| {
            let now = Local::now().timestamp();

            if (session.exp - now).is_negative() {
                return Err(HttpError::InvalidSession.new("Invalid session; Token expired"));
            }
            Ok(session)
        })?
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        User {
            id: 7,
            username: String::from("cook"),
            email: String::from("cook@example.com"),
            first_name: String::from("Carla"),
            last_name: String::from("Cook"),
            password: String::from("<hash>"),
            role: UserRole::User,
        }
    }

    #[test]
    fn session_round_trip() {
        let token = generate_jwt_session(&user());
        let session = verify_jwt_session(token).unwrap();
        assert_eq!(session.user_id, 7);
        assert_eq!(session.username, "cook");
        assert_eq!(session.user_role, UserRole::User);
    }

    #[test]
    fn tampered_token_is_rejected() {
        let mut token = generate_jwt_session(&user());
        token.push('x');
        assert!(verify_jwt_session(token).is_err());
    }

    #[test]
    fn admin_flag_follows_role() {
        let claims = JwtSessionData::new(1, String::from("root"), UserRole::Admin);
        let session: SessionData = claims.into();
        assert!(session.is_admin);
    }
}
