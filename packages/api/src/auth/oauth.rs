//! # Third-party OAuth 2.0 login
//!
//! Authorization Code flow with PKCE against one configured provider
//! (`oauth.*` settings; GitHub endpoints by default, any provider with a JSON
//! userinfo endpoint works).
//!
//! ## Flow
//!
//! 1. **[`authorize_url`](OAuthClient::authorize_url)**: builds the provider URL,
//!    generates a random PKCE challenge and persists the CSRF state + verifier
//!    through the [`Store`] with a 10-minute expiry. Served by `GET /auth/login`.
//!
//! 2. **[`exchange_code`](OAuthClient::exchange_code)**: called by
//!    `GET /auth/callback`. It:
//!    - Consumes the matching state (single use, expiry checked).
//!    - Exchanges the authorization code + PKCE verifier for an access token.
//!    - Fetches the provider profile from the userinfo endpoint (and GitHub's
//!      `/user/emails` when the profile email is private).
//!    - Upserts the user keyed on provider + provider id, so returning users get
//!      their name and avatar refreshed.

use chrono::{Duration, Utc};
use oauth2::basic::BasicClient;
use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, EndpointNotSet, EndpointSet,
    PkceCodeChallenge, PkceCodeVerifier, RedirectUrl, Scope, TokenResponse, TokenUrl,
};
use reqwest::Client;
use serde::Deserialize;
use store::{NewUser, Store, User};

use crate::settings::OAuth;

/// How long a login attempt may take between redirect and callback.
const STATE_TTL_MINUTES: i64 = 10;

/// Profile returned by the provider's userinfo endpoint.
///
/// Covers both GitHub (`id` number, `login`, `avatar_url`) and
/// OpenID-style providers (`id`/`sub` string, `picture`).
#[derive(Debug, Deserialize)]
pub struct OAuthProfile {
    #[serde(alias = "sub")]
    id: serde_json::Value,
    email: Option<String>,
    name: Option<String>,
    login: Option<String>,
    avatar_url: Option<String>,
    picture: Option<String>,
}

impl OAuthProfile {
    fn provider_id(&self) -> String {
        match &self.id {
            serde_json::Value::String(id) => id.clone(),
            other => other.to_string(),
        }
    }

    /// Map to a user row. Providers that withhold the email cannot sign in.
    pub fn into_new_user(self, provider: &str) -> Result<NewUser, String> {
        let provider_id = self.provider_id();
        let email = self
            .email
            .map(|e| e.trim().to_lowercase())
            .filter(|e| !e.is_empty())
            .ok_or("No email returned by provider")?;

        Ok(NewUser {
            email,
            name: self.name.or(self.login),
            image: self.avatar_url.or(self.picture),
            password_hash: None,
            provider: provider.to_string(),
            provider_id,
        })
    }
}

/// Entry of GitHub's `/user/emails` list, used when the profile email is private.
#[derive(Debug, Deserialize)]
struct ProviderEmail {
    email: String,
    primary: bool,
    verified: bool,
}

fn primary_email(emails: Vec<ProviderEmail>) -> Option<String> {
    emails
        .into_iter()
        .find(|e| e.primary && e.verified)
        .map(|e| e.email)
}

/// OAuth client type with auth URL and token URL set.
type ConfiguredClient = oauth2::Client<
    oauth2::basic::BasicErrorResponse,
    oauth2::basic::BasicTokenResponse,
    oauth2::basic::BasicTokenIntrospectionResponse,
    oauth2::StandardRevocableToken,
    oauth2::basic::BasicRevocationErrorResponse,
    EndpointSet,
    EndpointNotSet,
    EndpointNotSet,
    EndpointNotSet,
    EndpointSet,
>;

/// OAuth handler for the configured provider.
pub struct OAuthClient {
    config: OAuth,
    client: ConfiguredClient,
}

impl OAuthClient {
    /// Returns an error when OAuth is disabled or an endpoint URL is invalid.
    pub fn new(config: &OAuth) -> Result<Self, String> {
        if !config.enabled() {
            return Err("OAuth is not configured".to_string());
        }

        let client = BasicClient::new(ClientId::new(config.client_id.clone()))
            .set_client_secret(ClientSecret::new(config.client_secret.clone()))
            .set_auth_uri(AuthUrl::new(config.auth_url.clone()).map_err(|e| e.to_string())?)
            .set_token_uri(TokenUrl::new(config.token_url.clone()).map_err(|e| e.to_string())?)
            .set_redirect_uri(
                RedirectUrl::new(config.redirect_url.clone()).map_err(|e| e.to_string())?,
            );

        Ok(Self {
            config: config.clone(),
            client,
        })
    }

    fn scopes(&self) -> &'static [&'static str] {
        match self.config.provider.as_str() {
            "github" => &["read:user", "user:email"],
            _ => &["openid", "email", "profile"],
        }
    }

    /// Generate the provider authorization URL with PKCE.
    pub async fn authorize_url(&self, store: &dyn Store) -> Result<String, String> {
        let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();

        let mut request = self.client.authorize_url(CsrfToken::new_random);
        for scope in self.scopes() {
            request = request.add_scope(Scope::new(scope.to_string()));
        }
        let (auth_url, csrf_state) = request.set_pkce_challenge(pkce_challenge).url();

        store
            .save_oauth_state(
                csrf_state.secret(),
                pkce_verifier.secret(),
                Utc::now() + Duration::minutes(STATE_TTL_MINUTES),
            )
            .await
            .map_err(|e| e.to_string())?;

        Ok(auth_url.to_string())
    }

    /// Exchange an authorization code for tokens and upsert the provider's user.
    pub async fn exchange_code(
        &self,
        store: &dyn Store,
        code: &str,
        state: &str,
    ) -> Result<User, String> {
        let pkce_verifier = store
            .take_oauth_state(state, Utc::now())
            .await
            .map_err(|e| e.to_string())?
            .ok_or("Invalid or expired OAuth state")?;

        // Token endpoint must not be followed through redirects
        let http_client = reqwest::ClientBuilder::new()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| e.to_string())?;

        let token_result = self
            .client
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .set_pkce_verifier(PkceCodeVerifier::new(pkce_verifier))
            .request_async(&http_client)
            .await
            .map_err(|e| format!("Token exchange failed: {}", e))?;

        let access_token = token_result.access_token().secret();

        let api_client = Client::new();
        let mut profile: OAuthProfile = api_client
            .get(&self.config.userinfo_url)
            .header("Authorization", format!("Bearer {}", access_token))
            .header("User-Agent", "FocusFuel")
            .send()
            .await
            .map_err(|e| e.to_string())?
            .error_for_status()
            .map_err(|e| e.to_string())?
            .json()
            .await
            .map_err(|e| e.to_string())?;

        if profile.email.is_none() && self.config.provider == "github" {
            let emails: Vec<ProviderEmail> = api_client
                .get(format!("{}/emails", self.config.userinfo_url.trim_end_matches('/')))
                .header("Authorization", format!("Bearer {}", access_token))
                .header("User-Agent", "FocusFuel")
                .send()
                .await
                .map_err(|e| e.to_string())?
                .error_for_status()
                .map_err(|e| e.to_string())?
                .json()
                .await
                .map_err(|e| e.to_string())?;
            profile.email = primary_email(emails);
        }

        let new_user = profile.into_new_user(&self.config.provider)?;
        store
            .upsert_oauth_user(new_user)
            .await
            .map_err(|e| e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::json;
    use store::MemoryStore;

    fn configured() -> OAuth {
        OAuth {
            client_id: "client-123".to_string(),
            client_secret: "shh".to_string(),
            ..OAuth::default()
        }
    }

    #[test]
    fn test_disabled_without_client_id() {
        assert!(OAuthClient::new(&OAuth::default()).is_err());
    }

    #[test]
    fn test_github_profile_mapping() {
        let profile: OAuthProfile = serde_json::from_str(
            r#"{"id": 42, "login": "ada", "email": "Ada@Example.com", "name": null,
                "avatar_url": "https://avatars.example.com/42"}"#,
        )
        .unwrap();

        let user = profile.into_new_user("github").unwrap();
        assert_eq!(user.provider_id, "42");
        assert_eq!(user.email, "ada@example.com");
        assert_eq!(user.name.as_deref(), Some("ada"));
        assert_eq!(user.image.as_deref(), Some("https://avatars.example.com/42"));
        assert!(user.password_hash.is_none());
    }

    #[test]
    fn test_openid_profile_mapping() {
        let profile: OAuthProfile = serde_json::from_str(
            r#"{"sub": "1098", "email": "ada@example.com", "name": "Ada",
                "picture": "https://img.example.com/ada"}"#,
        )
        .unwrap();

        let user = profile.into_new_user("google").unwrap();
        assert_eq!(user.provider_id, "1098");
        assert_eq!(user.image.as_deref(), Some("https://img.example.com/ada"));
    }

    #[test]
    fn test_profile_without_email_rejected() {
        let profile: OAuthProfile = serde_json::from_str(r#"{"id": 7, "login": "ghost"}"#).unwrap();
        assert!(profile.into_new_user("github").is_err());
    }

    #[test]
    fn test_primary_email_must_be_verified() {
        let emails: Vec<ProviderEmail> = serde_json::from_str(
            r#"[{"email": "old@example.com", "primary": false, "verified": true},
                {"email": "ada@example.com", "primary": true, "verified": true}]"#,
        )
        .unwrap();
        assert_eq!(primary_email(emails).as_deref(), Some("ada@example.com"));

        let unverified = vec![ProviderEmail {
            email: "ada@example.com".to_string(),
            primary: true,
            verified: false,
        }];
        assert_eq!(primary_email(unverified), None);
    }

    #[tokio::test]
    async fn test_authorize_url_persists_state() {
        let store = MemoryStore::new();
        let client = OAuthClient::new(&configured()).unwrap();

        let url = client.authorize_url(&store).await.unwrap();
        assert!(url.starts_with("https://github.com/login/oauth/authorize?"));
        assert!(url.contains("client_id=client-123"));
        assert!(url.contains("code_challenge_method=S256"));

        let state = url
            .split('&')
            .find_map(|pair| pair.strip_prefix("state="))
            .unwrap()
            .to_string();
        assert!(store.take_oauth_state(&state, Utc::now()).await.unwrap().is_some());
    }

    /// A GitHub-like provider on a local port whose profile hides the email.
    /// `/user/emails` answers with `emails_status` and a verified primary address.
    async fn provider(emails_status: StatusCode) -> OAuth {
        let app = Router::new()
            .route(
                "/token",
                post(|| async { Json(json!({"access_token": "gho_token", "token_type": "bearer"})) }),
            )
            .route(
                "/user",
                get(|| async { Json(json!({"id": 42, "login": "ada", "email": null})) }),
            )
            .route(
                "/user/emails",
                get(move || async move {
                    (
                        emails_status,
                        Json(json!([{"email": "ada@example.com", "primary": true, "verified": true}])),
                    )
                }),
            );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

        OAuth {
            auth_url: format!("{base}/authorize"),
            token_url: format!("{base}/token"),
            userinfo_url: format!("{base}/user"),
            ..configured()
        }
    }

    async fn sign_in(config: &OAuth, store: &MemoryStore) -> Result<User, String> {
        store
            .save_oauth_state("state-1", "verifier-1", Utc::now() + Duration::minutes(5))
            .await
            .unwrap();
        OAuthClient::new(config)
            .unwrap()
            .exchange_code(store, "code-1", "state-1")
            .await
    }

    #[tokio::test]
    async fn test_private_email_read_from_email_list() {
        let store = MemoryStore::new();
        let config = provider(StatusCode::OK).await;

        let user = sign_in(&config, &store).await.unwrap();
        assert_eq!(user.email, "ada@example.com");
        assert_eq!(user.provider_id, "42");
        assert_eq!(user.name.as_deref(), Some("ada"));
    }

    #[tokio::test]
    async fn test_email_list_error_status_fails_sign_in() {
        let store = MemoryStore::new();
        let config = provider(StatusCode::FORBIDDEN).await;

        let err = sign_in(&config, &store).await.unwrap_err();
        assert!(err.contains("403"), "{err}");
        assert!(store.find_user_by_email("ada@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unknown_state_rejected_before_network() {
        let store = MemoryStore::new();
        let client = OAuthClient::new(&configured()).unwrap();

        let err = client
            .exchange_code(&store, "code", "forged-state")
            .await
            .unwrap_err();
        assert_eq!(err, "Invalid or expired OAuth state");
    }
}
