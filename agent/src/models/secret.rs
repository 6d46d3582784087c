//! Orbit secret model

use std::fmt;

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use uuid::Uuid;

/// An orbit-scoped secret fetched from the platform.
///
/// The value never appears in Debug output or serialized form; it is only
/// exposed at the moment it is injected into a container environment or a
/// compute request.
#[derive(Deserialize)]
pub struct Secret {
    pub id: Uuid,
    pub name: String,
    pub value: SecretString,
}

impl Secret {
    /// Expose the plaintext value for injection
    pub fn expose(&self) -> &str {
        self.value.expose_secret()
    }
}

impl Clone for Secret {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            name: self.name.clone(),
            value: SecretString::from(self.value.expose_secret().to_string()),
        }
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Secret")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("value", &"[REDACTED]")
            .finish()
    }
}
