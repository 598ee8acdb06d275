//! # Session Context
//!
//! Who is calling, with which token, against which backend.
//!
//! A `Session` is built once from the configuration and passed by reference
//! into every service call. Nothing in the client reads credentials from
//! ambient global state.

use reqwest::RequestBuilder;
use serde::{Deserialize, Serialize};
use stockdesk_core::{Capability, Role};
use url::Url;

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

/// The signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub username: String,
    pub role: Role,
}

/// Explicit request context for one signed-in user.
#[derive(Debug, Clone)]
pub struct Session {
    base_url: Url,
    token: Option<String>,
    user: UserProfile,
}

impl Session {
    /// `base_url` should end with `/` so endpoints join beneath it.
    pub fn new(base_url: Url, token: Option<String>, user: UserProfile) -> Self {
        Session {
            base_url,
            token,
            user,
        }
    }

    pub fn from_config(config: &ClientConfig) -> ClientResult<Self> {
        Ok(Session::new(
            config.base_url()?,
            config.session.token.clone(),
            UserProfile {
                username: config.session.username.clone(),
                role: config.session.role,
            },
        ))
    }

    pub fn user(&self) -> &UserProfile {
        &self.user
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Resolves an API path such as `"sales/"` against the base URL.
    pub fn endpoint(&self, path: &str) -> ClientResult<Url> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    /// Adds `Authorization: Token <token>` when the session has one.
    pub fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.header(reqwest::header::AUTHORIZATION, format!("Token {}", token)),
            None => request,
        }
    }

    pub fn can(&self, capability: Capability) -> bool {
        self.user.role.can(capability)
    }

    /// `Err(Forbidden)` unless the role grants `capability`.
    pub fn require(&self, capability: Capability) -> ClientResult<()> {
        if self.can(capability) {
            Ok(())
        } else {
            Err(ClientError::Forbidden(capability))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(role: Role) -> Session {
        Session::new(
            Url::parse("https://shop.example.com/api/").unwrap(),
            Some("abc".into()),
            UserProfile {
                username: "amina".into(),
                role,
            },
        )
    }

    #[test]
    fn test_endpoint_joins_under_base() {
        let s = session(Role::Staff);
        assert_eq!(
            s.endpoint("/products/42/").unwrap().as_str(),
            "https://shop.example.com/api/products/42/"
        );
    }

    #[test]
    fn test_require_capability() {
        assert!(session(Role::Staff).require(Capability::RecordSales).is_ok());
        assert!(matches!(
            session(Role::Staff).require(Capability::ManageUsers),
            Err(ClientError::Forbidden(Capability::ManageUsers))
        ));
    }

    #[test]
    fn test_authorize_sets_token_header() {
        let client = reqwest::Client::new();
        let s = session(Role::Admin);
        let request = s
            .authorize(client.get("https://shop.example.com/api/sales/"))
            .build()
            .unwrap();
        assert_eq!(
            request.headers().get(reqwest::header::AUTHORIZATION).unwrap(),
            "Token abc"
        );
    }

    #[test]
    fn test_from_config() {
        let mut config = ClientConfig::default();
        config.session.role = Role::Manager;
        let s = Session::from_config(&config).unwrap();
        assert!(!s.is_authenticated());
        assert_eq!(s.user().role, Role::Manager);
        assert!(s.base_url().as_str().ends_with('/'));
    }
}
