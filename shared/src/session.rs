//! Session context.
//!
//! The session is an explicit value inside the model, changed only through
//! [`Session::login`] and [`Session::logout`]. Request builders read it to
//! decide whether to attach a bearer token.

use secrecy::{ExposeSecret, SecretString};

#[derive(Debug, Clone, Default)]
pub enum Session {
    #[default]
    Anonymous,
    Authenticated {
        user_id: String,
        token: SecretString,
    },
}

impl Session {
    #[must_use]
    pub fn login(user_id: impl Into<String>, token: SecretString) -> Self {
        Self::Authenticated {
            user_id: user_id.into(),
            token,
        }
    }

    #[must_use]
    pub fn logout(self) -> Self {
        Self::Anonymous
    }

    pub const fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated { .. })
    }

    pub fn user_id(&self) -> Option<&str> {
        match self {
            Self::Authenticated { user_id, .. } => Some(user_id),
            Self::Anonymous => None,
        }
    }

    /// `Authorization` header value, when logged in.
    pub fn bearer(&self) -> Option<String> {
        match self {
            Self::Authenticated { token, .. } => {
                Some(format!("Bearer {}", token.expose_secret()))
            }
            Self::Anonymous => None,
        }
    }
}
