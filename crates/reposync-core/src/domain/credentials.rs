//! Credentials handed to the sync engine

use super::newtypes::AccessToken;

/// Authorization material for one sync call
///
/// The engine never inspects the token; it only passes it to the
/// [`IRemoteConnector`](crate::ports::IRemoteConnector) that builds the
/// platform client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    token: AccessToken,
}

impl Credentials {
    pub fn new(token: AccessToken) -> Self {
        Self { token }
    }

    pub fn token(&self) -> &AccessToken {
        &self.token
    }
}

impl From<AccessToken> for Credentials {
    fn from(token: AccessToken) -> Self {
        Self::new(token)
    }
}
