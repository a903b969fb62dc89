use crate::auth::forms::{LoginForm, SignupForm};
use crate::auth::token::{Claims, Tokens};
use crate::remote::{
    structs::{NewUser, User, UserId},
    Client,
};
use crate::twoface::{Cause, Fallible, TfError, Validated};
use chrono::offset::Utc;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::info;
use uuid::Uuid;

const BAD_LOGIN: &str = "Invalid username or password";

/// Sent back whenever a session starts or is renewed.
#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
    /// Seconds until the token expires
    pub expires_in: i64,
}

/// Who's calling, according to their token.
#[derive(Debug, Clone)]
pub struct Session {
    pub user_id: UserId,
    pub claims: Claims,
}

/// Tokens that were logged out or replaced before they expired, keyed by `jti`, with their expiry.
/// Clones share the same set, so every worker sees every logout.
#[derive(Clone, Default, Debug)]
pub struct Revocations {
    revoked: Arc<Mutex<HashMap<Uuid, i64>>>,
}

impl Revocations {
    fn revoke(&self, claims: &Claims) {
        let now = Utc::now().timestamp();
        let mut revoked = self.revoked.lock().unwrap_or_else(PoisonError::into_inner);
        // Expired tokens fail verification anyway, so there's no need to remember them.
        revoked.retain(|_, exp| *exp > now);
        revoked.insert(claims.jti, claims.exp);
    }

    fn contains(&self, claims: &Claims) -> bool {
        self.revoked
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&claims.jti)
    }
}

#[derive(Clone)]
pub struct Auth<C> {
    client: C,
    tokens: Tokens,
    revocations: Revocations,
}

impl<C: Client> Auth<C> {
    pub fn new(client: C, tokens: Tokens, revocations: Revocations) -> Self {
        Self {
            client,
            tokens,
            revocations,
        }
    }

    /// Users log in with their username or their email. The remote service doesn't know about
    /// passwords, so any well-formed password is accepted.
    pub async fn login(&self, form: LoginForm) -> Fallible<AuthResponse> {
        form.validated()?;
        let users = self.client.list_users().await?;
        let Some(user) = users
            .into_iter()
            .find(|u| u.username == form.username || u.email == form.username)
        else {
            return Err(TfError::user(Cause::UserBadAuth, BAD_LOGIN));
        };
        info!(user_id = user.id, name = display_name(Some(&user)), "user logged in");
        self.respond(user)
    }

    pub async fn signup(&self, form: SignupForm) -> Fallible<AuthResponse> {
        form.validated()?;
        let existing = self.client.list_users().await?;
        if existing.iter().any(|u| u.username == form.username) {
            return Err(TfError::user(Cause::UserConflict, "Username already exists"));
        }
        if existing.iter().any(|u| u.email == form.email) {
            return Err(TfError::user(Cause::UserConflict, "Email already exists"));
        }
        let created = self
            .client
            .create_user(NewUser {
                name: form.name,
                username: form.username,
                email: form.email,
            })
            .await?;
        let user = assign_id(created, &existing);
        info!(user_id = user.id, name = display_name(Some(&user)), "user signed up");
        self.respond(user)
    }

    /// Swap a session's token for a fresh one. The old token stops working.
    pub async fn refresh(&self, session: &Session) -> Fallible<AuthResponse> {
        let user = self.current_user(session).await?;
        let response = self.respond(user)?;
        self.revocations.revoke(&session.claims);
        Ok(response)
    }

    pub fn logout(&self, session: &Session) {
        self.revocations.revoke(&session.claims);
        info!(user_id = session.user_id, "user logged out");
    }

    /// Check a bearer token and find out whose it is.
    pub fn authenticate(&self, token: &str) -> Fallible<Session> {
        let claims = self.tokens.verify(token)?;
        if self.revocations.contains(&claims) {
            return Err(TfError::user(Cause::UserBadAuth, "Session has ended"));
        }
        Ok(Session {
            user_id: claims.user_id()?,
            claims,
        })
    }

    pub async fn current_user(&self, session: &Session) -> Fallible<User> {
        self.client
            .get_user(session.user_id)
            .await?
            .ok_or_else(|| TfError::user(Cause::NotFound, "User not found"))
    }

    fn respond(&self, user: User) -> Fallible<AuthResponse> {
        let (token, _) = self.tokens.issue(user.id)?;
        Ok(AuthResponse {
            token,
            user,
            expires_in: self.tokens.ttl_secs(),
        })
    }
}

/// Some remote services echo new users back without an id. Give them the next one along.
fn assign_id(mut created: User, existing: &[User]) -> User {
    if created.id == 0 {
        created.id = existing.len() as UserId + 1;
    }
    created
}

/// What to call a (possibly missing) user in the UI.
pub fn display_name(user: Option<&User>) -> &str {
    user.map_or("User", User::display_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::mock;

    fn auth() -> Auth<mock::Client> {
        Auth::new(
            mock::seeded(),
            Tokens::new("test-secret", 3600),
            Revocations::default(),
        )
    }

    fn login_form(username: &str) -> LoginForm {
        LoginForm {
            username: username.to_owned(),
            password: "whatever".to_owned(),
        }
    }

    fn signup_form(username: &str, email: &str) -> SignupForm {
        SignupForm {
            name: "New Person".to_owned(),
            username: username.to_owned(),
            email: email.to_owned(),
            password: "Passw0rd".to_owned(),
            confirm_password: "Passw0rd".to_owned(),
        }
    }

    #[actix_rt::test]
    async fn test_login_by_username() {
        let auth = auth();
        let resp = auth.login(login_form("Bret")).await.unwrap();
        assert_eq!(resp.user.id, 1);
        assert_eq!(resp.expires_in, 3600);

        let session = auth.authenticate(&resp.token).unwrap();
        assert_eq!(session.user_id, 1);
        assert_eq!(auth.current_user(&session).await.unwrap().name, "Leanne Graham");
    }

    #[actix_rt::test]
    async fn test_unknown_user_cant_log_in() {
        let err = auth().login(login_form("Nobody")).await.unwrap_err();
        assert!(matches!(err.cause(), Cause::UserBadAuth));
        assert_eq!(err.to_string(), "UserBadAuth: Invalid username or password");
    }

    #[actix_rt::test]
    async fn test_signup_conflicts() {
        let auth = auth();
        let err = auth
            .signup(signup_form("Bret", "someone@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err.cause(), Cause::UserConflict));
        assert_eq!(err.external.text, "Username already exists");

        let err = auth
            .signup(signup_form("fresh_name", "Sincere@april.biz"))
            .await
            .unwrap_err();
        assert_eq!(err.external.text, "Email already exists");
    }

    #[actix_rt::test]
    async fn test_signup_issues_a_session() {
        let auth = auth();
        let resp = auth
            .signup(signup_form("fresh_name", "fresh@example.com"))
            .await
            .unwrap();
        assert_eq!(resp.user.id, 4);
        assert_eq!(resp.user.username, "fresh_name");
        assert_eq!(auth.authenticate(&resp.token).unwrap().user_id, 4);
    }

    #[test]
    fn test_missing_ids_are_assigned() {
        let existing = mock::users();
        let created = mock::user(0, "New Person", "fresh_name", "fresh@example.com");
        assert_eq!(assign_id(created, &existing).id, 4);

        let created = mock::user(11, "New Person", "fresh_name", "fresh@example.com");
        assert_eq!(assign_id(created, &existing).id, 11);
    }

    #[actix_rt::test]
    async fn test_logout_revokes_the_token() {
        let auth = auth();
        let resp = auth.login(login_form("Bret")).await.unwrap();
        let session = auth.authenticate(&resp.token).unwrap();
        auth.logout(&session);
        let err = auth.authenticate(&resp.token).unwrap_err();
        assert!(matches!(err.cause(), Cause::UserBadAuth));
    }

    #[actix_rt::test]
    async fn test_refresh_replaces_the_token() {
        let auth = auth();
        let resp = auth.login(login_form("Antonette")).await.unwrap();
        let session = auth.authenticate(&resp.token).unwrap();
        let refreshed = auth.refresh(&session).await.unwrap();
        assert_eq!(refreshed.user.id, 2);
        assert!(auth.authenticate(&resp.token).is_err());
        assert!(auth.authenticate(&refreshed.token).is_ok());
    }

    #[actix_rt::test]
    async fn test_refresh_for_a_vanished_user() {
        let auth = auth();
        let (token, _) = Tokens::new("test-secret", 3600).issue(99).unwrap();
        let session = auth.authenticate(&token).unwrap();
        let err = auth.refresh(&session).await.unwrap_err();
        assert!(matches!(err.cause(), Cause::NotFound));
        assert_eq!(err.external.text, "User not found");
    }

    #[test]
    fn test_display_name() {
        let users = mock::users();
        assert_eq!(display_name(Some(&users[0])), "Leanne Graham");
        let nameless = mock::user(5, "", "ghost", "ghost@example.com");
        assert_eq!(display_name(Some(&nameless)), "ghost");
        assert_eq!(display_name(None), "User");
    }
}
