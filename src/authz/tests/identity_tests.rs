//! Identity resolution and authentication flow tests

use pixntalk_authz::{
    config::AuthConfig,
    error::AuthzError,
    identity::{
        EmailRequest, IdentityResolver, InMemoryUserDirectory, NewUser, TokenAuthenticator,
        TokenScope, UserDirectory, UserRecord,
    },
    role::Role,
    Guard, OwnedResource,
};
use proptest::prelude::*;
use std::sync::Arc;

const SECRET: &str = "identity-test-secret-0123456789";

struct Fixture {
    directory: Arc<InMemoryUserDirectory>,
    auth: TokenAuthenticator<InMemoryUserDirectory>,
}

impl Fixture {
    fn new() -> Self {
        let directory = Arc::new(InMemoryUserDirectory::new());
        let auth = TokenAuthenticator::from_config(directory.clone(), &AuthConfig::new(SECRET));
        Self { directory, auth }
    }

    async fn register(&self, name: &str, password: &str, active: bool) -> UserRecord {
        let password_hash = self.auth.passwords().hash(password).unwrap();
        let user = self
            .directory
            .create_user(NewUser {
                name: name.to_string(),
                email: format!("{}@example.com", name),
                password_hash,
            })
            .await
            .unwrap();

        if active {
            self.directory.activate(&user.id).await.unwrap();
        }
        user
    }
}

// ============================================================================
// LOGIN
// ============================================================================

#[tokio::test]
async fn test_login_and_resolve() {
    let fx = Fixture::new();
    let admin = fx.register("alice", "s3cret", true).await;

    let pair = fx.auth.login("alice@example.com", "s3cret").await.unwrap();
    assert_eq!(pair.token_type, "bearer");

    let caller = fx.auth.resolve(&pair.access_token).await.unwrap();
    assert_eq!(caller.id(), &admin.id);
    assert_eq!(caller.role(), Role::Admin);
}

#[tokio::test]
async fn test_login_rejections() {
    let fx = Fixture::new();
    fx.register("alice", "s3cret", true).await;
    let bob = fx.register("bob", "hunter2", false).await;

    assert!(matches!(
        fx.auth.login("nobody@example.com", "x").await,
        Err(AuthzError::InvalidCredentials)
    ));
    assert!(matches!(
        fx.auth.login("alice@example.com", "wrong").await,
        Err(AuthzError::InvalidCredentials)
    ));
    assert!(matches!(
        fx.auth.login("bob@example.com", "hunter2").await,
        Err(AuthzError::UserInactive)
    ));

    fx.directory.activate(&bob.id).await.unwrap();
    fx.directory.toggle_ban(&bob.id).await.unwrap();
    assert!(matches!(
        fx.auth.login("bob@example.com", "hunter2").await,
        Err(AuthzError::UserBanned)
    ));
}

#[tokio::test]
async fn test_unknown_account_login_matches_wrong_password() {
    let fx = Fixture::new();
    fx.register("alice", "s3cret", true).await;

    let unknown = fx.auth.login("nobody@example.com", "s3cret").await.unwrap_err();
    let wrong = fx.auth.login("alice@example.com", "nope").await.unwrap_err();
    assert_eq!(unknown.to_string(), wrong.to_string());
}

// ============================================================================
// SIGNUP AND EMAIL CONFIRMATION
// ============================================================================

#[tokio::test]
async fn test_signup_then_confirm_then_login() {
    let fx = Fixture::new();

    let (user, email_token) = fx
        .auth
        .signup("alice", "alice@example.com", "s3cret")
        .await
        .unwrap();
    assert_eq!(user.role, Role::Admin);
    assert!(!user.is_active);
    assert!(fx.auth.passwords().verify("s3cret", &user.password_hash));

    assert!(matches!(
        fx.auth.login("alice@example.com", "s3cret").await,
        Err(AuthzError::UserInactive)
    ));

    fx.auth.confirm_email(&email_token).await.unwrap();
    assert!(fx.auth.login("alice@example.com", "s3cret").await.is_ok());
}

#[tokio::test]
async fn test_signup_rejects_taken_email() {
    let fx = Fixture::new();
    fx.auth.signup("alice", "a@x.io", "s3cret").await.unwrap();

    let err = fx.auth.signup("alice again", "a@x.io", "other").await.unwrap_err();
    assert!(matches!(err, AuthzError::AlreadyExists(_)));
    assert_eq!(fx.directory.len().await, 1);
}

#[tokio::test]
async fn test_signup_validates_input() {
    let fx = Fixture::new();

    assert!(matches!(
        fx.auth.signup("alice", "not-an-email", "s3cret").await,
        Err(AuthzError::InvalidInput(_))
    ));
    assert!(matches!(
        fx.auth.signup("alice", "alice@example.com", "").await,
        Err(AuthzError::InvalidInput(_))
    ));
    assert!(fx.directory.is_empty().await);
}

#[tokio::test]
async fn test_request_email() {
    let fx = Fixture::new();
    fx.register("alice", "s3cret", false).await;

    let EmailRequest::Issued(token) = fx.auth.request_email("alice@example.com").await.unwrap()
    else {
        panic!("unconfirmed account should receive a token");
    };
    fx.auth.confirm_email(&token).await.unwrap();

    assert_eq!(
        fx.auth.request_email("alice@example.com").await.unwrap(),
        EmailRequest::AlreadyConfirmed
    );
    assert!(matches!(
        fx.auth.request_email("ghost@example.com").await,
        Err(AuthzError::UserNotFound(_))
    ));
}

#[tokio::test]
async fn test_bad_email_token_is_invalid_input() {
    let fx = Fixture::new();
    fx.register("alice", "s3cret", false).await;

    let ghost = fx.auth.tokens().create_email_token("ghost@example.com").unwrap();
    for token in ["garbage".to_string(), ghost] {
        let err = fx.auth.confirm_email(&token).await.unwrap_err();
        assert!(matches!(err, AuthzError::InvalidInput(_)));
    }
}

// ============================================================================
// TOKENS
// ============================================================================

#[tokio::test]
async fn test_refresh_issues_new_pair() {
    let fx = Fixture::new();
    fx.register("alice", "s3cret", true).await;

    let pair = fx.auth.login("alice@example.com", "s3cret").await.unwrap();
    let refreshed = fx.auth.refresh(&pair.refresh_token).await.unwrap();

    assert!(fx.auth.resolve(&refreshed.access_token).await.is_ok());
    assert!(fx.auth.refresh(&pair.access_token).await.is_err());
}

#[tokio::test]
async fn test_replayed_refresh_token_revokes_session() {
    let fx = Fixture::new();
    fx.register("alice", "s3cret", true).await;

    let pair = fx.auth.login("alice@example.com", "s3cret").await.unwrap();
    let rotated = fx.auth.refresh(&pair.refresh_token).await.unwrap();
    assert_ne!(rotated.refresh_token, pair.refresh_token);

    let err = fx.auth.refresh(&pair.refresh_token).await.unwrap_err();
    assert!(matches!(err, AuthzError::Unauthenticated(_)));

    // Reuse ends the session, so the legitimately rotated token is gone too.
    assert!(fx.auth.refresh(&rotated.refresh_token).await.is_err());
    let stored = fx.directory.find_by_email("alice@example.com").await.unwrap().unwrap();
    assert_eq!(stored.refresh_token, None);
}

#[tokio::test]
async fn test_logout_revokes_refresh_token() {
    let fx = Fixture::new();
    fx.register("alice", "s3cret", true).await;

    let pair = fx.auth.login("alice@example.com", "s3cret").await.unwrap();
    let caller = fx.auth.resolve(&pair.access_token).await.unwrap();

    fx.auth.logout(&caller).await.unwrap();

    assert!(matches!(
        fx.auth.refresh(&pair.refresh_token).await,
        Err(AuthzError::Unauthenticated(_))
    ));
    assert!(fx.auth.login("alice@example.com", "s3cret").await.is_ok());
}

#[tokio::test]
async fn test_refresh_token_is_not_a_bearer_credential() {
    let fx = Fixture::new();
    fx.register("alice", "s3cret", true).await;

    let pair = fx.auth.login("alice@example.com", "s3cret").await.unwrap();
    let err = fx.auth.resolve(&pair.refresh_token).await.unwrap_err();
    assert!(matches!(err, AuthzError::Unauthenticated(_)));
}

#[tokio::test]
async fn test_expired_access_token() {
    let fx = Fixture::new();
    fx.register("alice", "s3cret", true).await;

    let token = fx
        .auth
        .tokens()
        .issue("alice@example.com", TokenScope::AccessToken, 0)
        .unwrap();
    assert!(matches!(fx.auth.resolve(&token).await, Err(AuthzError::TokenExpired)));
}

#[tokio::test]
async fn test_unknown_subject() {
    let fx = Fixture::new();
    let token = fx.auth.tokens().create_access_token("ghost@example.com").unwrap();

    let err = fx.auth.resolve(&token).await.unwrap_err();
    assert!(err.is_authentication_failure());
}

#[tokio::test]
async fn test_confirm_email_activates_account() {
    let fx = Fixture::new();
    fx.register("alice", "s3cret", false).await;

    let email_token = fx.auth.tokens().create_email_token("alice@example.com").unwrap();
    let user = fx.auth.confirm_email(&email_token).await.unwrap();
    assert!(user.is_active);

    assert!(fx.auth.login("alice@example.com", "s3cret").await.is_ok());

    let access = fx.auth.tokens().create_access_token("alice@example.com").unwrap();
    assert!(fx.auth.confirm_email(&access).await.is_err());
}

// ============================================================================
// END TO END
// ============================================================================

#[tokio::test]
async fn test_role_change_takes_effect_on_next_resolve() {
    let fx = Fixture::new();
    fx.register("alice", "s3cret", true).await;
    let bob = fx.register("bob", "hunter2", true).await;
    let carol = fx.register("carol", "pw", true).await;

    let guard = Guard::new();
    let photo = OwnedResource::photo("99", carol.id.clone());
    let pair = fx.auth.login("bob@example.com", "hunter2").await.unwrap();

    let caller = guard.authenticate(&fx.auth, &pair.access_token).await.unwrap();
    assert_eq!(caller.role(), Role::User);
    assert!(guard.authorize_resource(&caller, &photo).unwrap_err().is_access_denied());

    fx.directory.change_role(&bob.id, "moderator").await.unwrap();

    let caller = guard.authenticate(&fx.auth, &pair.access_token).await.unwrap();
    assert_eq!(caller.role(), Role::Moderator);
    assert!(guard.authorize_resource(&caller, &photo).is_ok());
}

#[tokio::test]
async fn test_banned_user_cannot_resolve() {
    let fx = Fixture::new();
    fx.register("alice", "s3cret", true).await;
    let bob = fx.register("bob", "hunter2", true).await;

    let pair = fx.auth.login("bob@example.com", "hunter2").await.unwrap();
    fx.directory.toggle_ban(&bob.id).await.unwrap();

    let guard = Guard::new();
    let err = guard.authenticate(&fx.auth, &pair.access_token).await.unwrap_err();
    assert!(matches!(err, AuthzError::UserBanned));
    assert_eq!(guard.metrics().authentication_failures, 1);
}

proptest! {
    #[test]
    fn test_resolved_role_follows_directory(role in prop::sample::select(Role::ALL.to_vec())) {
        tokio_test::block_on(async {
            let fx = Fixture::new();
            let directory = &fx.directory;
            directory
                .create_user(NewUser {
                    name: "root".to_string(),
                    email: "root@example.com".to_string(),
                    password_hash: "unused".to_string(),
                })
                .await
                .unwrap();
            let user = directory
                .create_user(NewUser {
                    name: "dave".to_string(),
                    email: "dave@example.com".to_string(),
                    password_hash: "unused".to_string(),
                })
                .await
                .unwrap();
            directory.activate(&user.id).await.unwrap();
            directory.change_role(&user.id, role.as_str()).await.unwrap();

            let token = fx.auth.tokens().create_access_token("dave@example.com").unwrap();
            let caller = fx.auth.resolve(&token).await.unwrap();

            assert_eq!(caller.id(), &user.id);
            assert_eq!(caller.role(), role);
        });
    }
}
