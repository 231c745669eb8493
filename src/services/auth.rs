use std::sync::Arc;

use chrono::{Duration, Utc};
use sha2::{Digest, Sha256};
use tracing::info;
use uuid::Uuid;

use crate::database::sqlite::SqliteDatabase;
use crate::errors::{AppError, Result};
use crate::models::user::{User, UserRole};
use crate::services::jwt::{AuthenticatedUser, JwtManager};
use crate::utils::crypto::PasswordManager;

pub struct AuthService {
    jwt_manager: JwtManager,
    database: Arc<SqliteDatabase>,
}

impl AuthService {
    pub fn new(database: Arc<SqliteDatabase>, jwt_secret: String) -> Self {
        Self {
            jwt_manager: JwtManager::new(jwt_secret),
            database,
        }
    }

    pub async fn authenticate_user(&self, email: &str, password: &str) -> Result<User> {
        let user = self
            .database
            .get_user_by_email(email)
            .await?
            .ok_or_else(|| AppError::AuthenticationError("Invalid email or password".to_string()))?;

        if !user.is_active {
            return Err(AppError::AuthenticationError(
                "Account is deactivated. Please contact administration.".to_string(),
            ));
        }
        if !PasswordManager::verify_password(password, &user.password_hash)? {
            return Err(AppError::AuthenticationError(
                "Invalid email or password".to_string(),
            ));
        }

        Ok(user)
    }

    /// Issue a JWT for a user and record its hash in the token table.
    pub async fn issue_token(&self, user: &User) -> Result<String> {
        let token = self
            .jwt_manager
            .generate_token(&user.id, &user.email, user.role)?;
        let token_data = self.jwt_manager.validate_token(&token)?;
        let token_id = &token_data.claims.jti;
        let token_hash = self.hash_token(&token);
        let expires_at = Utc::now() + Duration::hours(24);

        self.database
            .store_user_token(&user.id, token_id, &token_hash, expires_at)
            .await?;
        let _ = self.database.cleanup_expired_tokens().await;

        info!(action = "token_issued", user = %user.email);
        Ok(token)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<(User, String)> {
        let user = self.authenticate_user(email, password).await?;
        let token = self.issue_token(&user).await?;
        self.database.update_last_login(&user.id, Utc::now()).await?;
        Ok((user, token))
    }

    /// Validate the JWT signature and expiry, then check the token is still
    /// live in the database.
    pub async fn validate_token(&self, token: &str) -> Result<AuthenticatedUser> {
        let token_data = self.jwt_manager.validate_token(token)?;
        if !self.database.is_token_valid(&token_data.claims.jti).await? {
            return Err(AppError::AuthenticationError(
                "Token not found or inactive".to_string(),
            ));
        }
        AuthenticatedUser::try_from(token_data.claims)
    }

    /// Validate a token and require a specific role.
    pub async fn authorize(&self, token: &str, allowed: &[UserRole]) -> Result<AuthenticatedUser> {
        let user = self.validate_token(token).await?;
        if !allowed.contains(&user.role) {
            return Err(AppError::AuthorizationError(format!(
                "Access denied for role {}",
                user.role.as_str()
            )));
        }
        Ok(user)
    }

    pub async fn logout(&self, token: &str) -> Result<()> {
        let token_data = self.jwt_manager.validate_token(token)?;
        self.database.revoke_token(&token_data.claims.jti).await?;
        Ok(())
    }

    #[allow(dead_code)]
    pub async fn logout_all_devices(&self, user_id: &Uuid) -> Result<()> {
        self.database.revoke_all_user_tokens(user_id).await
    }

    fn hash_token(&self, token: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(token.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::{Preferences, Profile};

    async fn service() -> AuthService {
        let db = Arc::new(SqliteDatabase::in_memory().await.unwrap());
        AuthService::new(db, "test-secret".to_string())
    }

    fn test_user(email: &str, password: &str, role: UserRole) -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            password_hash: PasswordManager::hash_password(password).unwrap(),
            role,
            profile: Profile {
                first_name: "Asha".to_string(),
                last_name: "Sharma".to_string(),
                avatar: None,
                phone: None,
                address: None,
            },
            student_details: None,
            teacher_details: None,
            principal_details: None,
            preferences: Preferences::default(),
            is_active: true,
            last_login: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn login_validate_logout_cycle() {
        let auth = service();
        let auth = auth.await;
        let user = test_user("asha@jecrc.ac.in", "Pass@w0rd", UserRole::Student);
        auth.database.create_user(&user).await.unwrap();

        let (_, token) = auth.login("asha@jecrc.ac.in", "Pass@w0rd").await.unwrap();
        let identity = auth.validate_token(&token).await.unwrap();
        assert_eq!(identity.user_id, user.id);

        auth.logout(&token).await.unwrap();
        assert!(auth.validate_token(&token).await.is_err());
    }

    #[tokio::test]
    async fn wrong_password_rejected() {
        let auth = service().await;
        let user = test_user("x@jecrc.ac.in", "Pass@w0rd", UserRole::Teacher);
        auth.database.create_user(&user).await.unwrap();
        assert!(auth.login("x@jecrc.ac.in", "nope").await.is_err());
    }

    #[tokio::test]
    async fn authorize_checks_role() {
        let auth = service().await;
        let user = test_user("t@jecrc.ac.in", "Pass@w0rd", UserRole::Teacher);
        auth.database.create_user(&user).await.unwrap();
        let (_, token) = auth.login("t@jecrc.ac.in", "Pass@w0rd").await.unwrap();

        assert!(auth.authorize(&token, &[UserRole::Teacher]).await.is_ok());
        let denied = auth.authorize(&token, &[UserRole::Principal]).await;
        assert!(matches!(denied, Err(AppError::AuthorizationError(_))));
    }
}
