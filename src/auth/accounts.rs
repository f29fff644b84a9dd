//! Registration and login flows over a [`CredentialStore`].

use crate::auth::jwt::{SignedAccessToken, TokenIdentity};
use crate::auth::responses::{Credentials, Registration};
use crate::auth::{AuthError, AuthResult, AuthState};
use crate::models::{NewUser, PublicUser};
use crate::store::CredentialStore;

/// Create a user and return its public fields.
///
/// The lookup before inserting only short-circuits the common case; the
/// store's uniqueness constraint decides races between concurrent signups.
pub async fn register(
    state: &AuthState,
    users: &dyn CredentialStore,
    registration: Registration,
) -> AuthResult<PublicUser> {
    if users.find_by_email(&registration.email).await?.is_some() {
        log::debug!("registration rejected: email already registered");
        return Err(AuthError::DuplicateEmail);
    }

    let password_hash = state
        .password_service
        .hash_password(&registration.password)?;

    let user = users
        .create(NewUser {
            email: registration.email,
            password_hash,
            username: registration.username,
        })
        .await?;

    log::info!("registered user {}", user.id);
    Ok(PublicUser::from(&user))
}

/// Check credentials and issue an access token bound to the user.
pub async fn login(
    state: &AuthState,
    users: &dyn CredentialStore,
    credentials: Credentials,
) -> AuthResult<SignedAccessToken> {
    let Some(user) = users.find_by_email(&credentials.email).await? else {
        log::debug!("login rejected: unknown email");
        return Err(if state.config.unify_login_errors {
            AuthError::InvalidCredentials
        } else {
            AuthError::UserNotFound
        });
    };

    let verified = state
        .password_service
        .verify_password(&credentials.password, &user.password_hash)
        .inspect_err(|err| {
            if let AuthError::CorruptCredential(detail) = err {
                log::error!("stored password hash for user {} is corrupt: {}", user.id, detail);
            }
        })?;

    if !verified {
        log::debug!("login rejected for user {}: wrong password", user.id);
        return Err(AuthError::InvalidCredentials);
    }

    state.token_service.issue_access_token(&TokenIdentity {
        user_id: user.id,
        email: user.email,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AuthConfig, PasswordService};
    use crate::models::User;
    use crate::store::{MemoryCredentialStore, StoreResult};

    fn state(unify_login_errors: bool) -> AuthState {
        let mut config = AuthConfig::new("dGVzdC1zZWNyZXQ=");
        config.unify_login_errors = unify_login_errors;
        AuthState::new(
            config,
            PasswordService::with_cost(1024, 1).expect("password service"),
        )
    }

    fn registration(email: &str) -> Registration {
        Registration {
            email: email.into(),
            password: "secret1".into(),
            username: None,
        }
    }

    fn credentials(email: &str, password: &str) -> Credentials {
        Credentials {
            email: email.into(),
            password: password.into(),
        }
    }

    #[tokio::test]
    async fn register_then_login_yields_token_for_user() {
        let state = state(false);
        let users = MemoryCredentialStore::new();

        let user = register(&state, &users, registration("a@b.com"))
            .await
            .expect("register");
        assert_eq!(user, PublicUser { id: 1, email: "a@b.com".into() });

        let stored = users
            .find_by_email("a@b.com")
            .await
            .expect("lookup")
            .expect("stored user");
        assert_ne!(stored.password_hash, "secret1");

        let token = login(&state, &users, credentials("a@b.com", "secret1"))
            .await
            .expect("login");
        let identity = state.token_service.verify(&token.token).expect("verify");
        assert_eq!(identity.user_id, 1);
        assert_eq!(identity.email, "a@b.com");
    }

    #[tokio::test]
    async fn second_registration_is_duplicate() {
        let state = state(false);
        let users = MemoryCredentialStore::new();
        register(&state, &users, registration("a@b.com"))
            .await
            .expect("first");

        let err = register(&state, &users, registration("a@b.com"))
            .await
            .expect_err("second");
        assert!(matches!(err, AuthError::DuplicateEmail));
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_email_are_distinct_by_default() {
        let state = state(false);
        let users = MemoryCredentialStore::new();
        register(&state, &users, registration("a@b.com"))
            .await
            .expect("register");

        let wrong = login(&state, &users, credentials("a@b.com", "secret2"))
            .await
            .expect_err("wrong password");
        assert!(matches!(wrong, AuthError::InvalidCredentials));

        let unknown = login(&state, &users, credentials("x@b.com", "secret1"))
            .await
            .expect_err("unknown email");
        assert!(matches!(unknown, AuthError::UserNotFound));
    }

    #[tokio::test]
    async fn unified_mode_hides_unknown_emails() {
        let state = state(true);
        let users = MemoryCredentialStore::new();

        let unknown = login(&state, &users, credentials("x@b.com", "secret1"))
            .await
            .expect_err("unknown email");
        assert!(matches!(unknown, AuthError::InvalidCredentials));
    }

    /// Always reports the email as free, as a racing insert would see it.
    struct RacingStore(MemoryCredentialStore);

    #[rocket::async_trait]
    impl CredentialStore for RacingStore {
        async fn find_by_email(&self, _email: &str) -> StoreResult<Option<User>> {
            Ok(None)
        }

        async fn create(&self, user: NewUser) -> StoreResult<User> {
            self.0.create(user).await
        }
    }

    #[tokio::test]
    async fn constraint_catches_duplicates_the_lookup_missed() {
        let state = state(false);
        let users = RacingStore(MemoryCredentialStore::new());
        register(&state, &users, registration("a@b.com"))
            .await
            .expect("first");

        let err = register(&state, &users, registration("a@b.com"))
            .await
            .expect_err("second");
        assert!(matches!(err, AuthError::DuplicateEmail));
    }

    #[tokio::test]
    async fn corrupt_stored_hash_is_not_a_wrong_password() {
        let state = state(false);
        let users = MemoryCredentialStore::new();
        users
            .create(NewUser {
                email: "a@b.com".into(),
                password_hash: "garbage".into(),
                username: None,
            })
            .await
            .expect("seed");

        let err = login(&state, &users, credentials("a@b.com", "secret1"))
            .await
            .expect_err("corrupt hash");
        assert!(matches!(err, AuthError::CorruptCredential(_)));
    }
}
