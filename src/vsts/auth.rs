//! VSTS Authentication
//!
//! VSTS accepts HTTP basic authentication with the account name as the user
//! and a personal access token as the password.

use std::fmt;

/// Account and token used for every request
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    account: String,
    token: String,
}

impl Credential {
    pub fn new(account: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            account: account.into(),
            token: token.into(),
        }
    }

    pub fn account(&self) -> &str {
        &self.account
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// Default base URL for this account
    pub fn base_url(&self) -> String {
        format!("https://{}.visualstudio.com/", self.account)
    }
}

// Security: keep the token out of debug logs
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("account", &self.account)
            .field("token", &"***")
            .finish()
    }
}
