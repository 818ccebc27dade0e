//! This module provides an authenticator that simply allows everyone.

use super::{AuthenticationError, Authenticator, DefaultUser, LoginGrant, LoginRequest};
use async_trait::async_trait;

/// [`Authenticator`] implementation that accepts any username/password combination and drops
/// every session into the same storage root. Useful for anonymous servers and tests.
#[derive(Debug)]
pub struct AnonymousAuthenticator {
    root: String,
}

impl AnonymousAuthenticator {
    /// Every granted session will use the given `bucket[/prefix]` root.
    pub fn new<S: Into<String>>(root: S) -> Self {
        AnonymousAuthenticator { root: root.into() }
    }
}

#[async_trait]
impl Authenticator<DefaultUser> for AnonymousAuthenticator {
    #[tracing_attributes::instrument]
    async fn login(&self, _request: LoginRequest) -> Result<LoginGrant<DefaultUser>, AuthenticationError> {
        Ok(LoginGrant::new(DefaultUser, self.root.clone()))
    }

    fn name(&self) -> &str {
        "anonymous"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr};

    #[tokio::test]
    async fn accepts_anyone() {
        let authenticator = AnonymousAuthenticator::new("bucket/ftp");
        let grant = authenticator
            .login(LoginRequest {
                username: "anonymous".to_string(),
                password: "x@y".into(),
                source_ip: IpAddr::V4(Ipv4Addr::LOCALHOST),
                session_id: "0123456789abcdef".to_string(),
                secure: false,
            })
            .await
            .unwrap();
        assert_eq!(grant.root, "bucket/ftp");
        assert!(grant.whitelist.is_empty());
    }
}
