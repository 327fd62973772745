// ABOUTME: Identity fields entered by the user and the portal role split
// ABOUTME: Completeness rules are shared by the producer and the scanner

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Which portal a user belongs to. Wire strings are fixed by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UserKind {
    #[serde(rename = "ESTUDIANTE")]
    Estudiante,
    #[serde(rename = "AYUDANTE")]
    Ayudante,
}

impl UserKind {
    /// Key suffix used when scoping stored identities per role.
    pub fn storage_key(&self) -> &'static str {
        match self {
            UserKind::Estudiante => "estudiante",
            UserKind::Ayudante => "ayudante",
        }
    }
}

impl fmt::Display for UserKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserKind::Estudiante => write!(f, "ESTUDIANTE"),
            UserKind::Ayudante => write!(f, "AYUDANTE"),
        }
    }
}

/// Free-text identity fields as entered by the user.
///
/// No uniqueness is enforced client-side; the backend owns identity
/// reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub name: String,
    pub surname: String,
    pub email: String,
}

impl Identity {
    pub fn new(
        name: impl Into<String>,
        surname: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            surname: surname.into(),
            email: email.into(),
        }
    }

    /// Copy with every field trimmed. All downstream consumers (payload
    /// encoding, validation requests) operate on trimmed fields.
    pub fn trimmed(&self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            surname: self.surname.trim().to_string(),
            email: self.email.trim().to_string(),
        }
    }

    /// All three fields non-empty after trimming, and the email carries
    /// an `@`. This is the only local validation the flow performs.
    pub fn is_complete(&self) -> bool {
        let t = self.trimmed();
        !t.name.is_empty() && !t.surname.is_empty() && !t.email.is_empty() && t.email.contains('@')
    }

    /// Completeness as a result, with the user-facing reason.
    pub fn ensure_complete(&self) -> CoreResult<Self> {
        if !self.is_complete() {
            return Err(CoreError::IncompleteIdentity(
                "name, surname and a valid email are required".to_string(),
            ));
        }
        Ok(self.trimmed())
    }
}
