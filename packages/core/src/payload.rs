// ABOUTME: The scannable token payload and its JSON encoding
// ABOUTME: The encoded string is exactly what a reader displays and a consumer decodes

use serde::{Deserialize, Serialize};

use crate::error::CoreResult;
use crate::identity::{Identity, UserKind};
use crate::timing::EXPIRY_WINDOW_MS;

/// Validity marker carried inside the payload so a consumer can detect
/// staleness from the code alone, without asking the producer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenStatus {
    #[serde(rename = "VALID")]
    Valid,
    #[serde(rename = "EXPIRED")]
    Expired,
}

/// The self-describing token content rendered as a scannable code.
///
/// `timestamp` always reflects the most recent render or renewal, never
/// the original creation instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenPayload {
    pub name: String,
    pub surname: String,
    pub email: String,
    /// Epoch milliseconds of the last render/renewal.
    pub timestamp: i64,
    #[serde(rename = "tipoUsuario")]
    pub tipo_usuario: UserKind,
    pub status: TokenStatus,
    /// Present (true) only while auto-renewal is active.
    #[serde(rename = "autoRenewal", skip_serializing_if = "Option::is_none")]
    pub auto_renewal: Option<bool>,
    /// Present (true) only once the expiry window has elapsed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expired: Option<bool>,
}

impl TokenPayload {
    /// Fresh valid payload for a trimmed identity, stamped now.
    pub fn valid(identity: &Identity, kind: UserKind, timestamp: i64) -> Self {
        let id = identity.trimmed();
        Self {
            name: id.name,
            surname: id.surname,
            email: id.email,
            timestamp,
            tipo_usuario: kind,
            status: TokenStatus::Valid,
            auto_renewal: None,
            expired: None,
        }
    }

    pub fn identity(&self) -> Identity {
        Identity::new(self.name.clone(), self.surname.clone(), self.email.clone())
    }

    /// Encode to the literal string a reader displays.
    pub fn encode(&self) -> CoreResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decode a scanned string back into a payload.
    pub fn decode(raw: &str) -> CoreResult<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Whether the payload is stale as observed at `now_ms`, judged the
    /// way the backend does: auto-renewing codes never go stale, others
    /// expire once the window elapses.
    pub fn is_stale(&self, now_ms: i64) -> bool {
        if self.auto_renewal == Some(true) {
            return false;
        }
        if self.status == TokenStatus::Expired || self.expired == Some(true) {
            return true;
        }
        now_ms.saturating_sub(self.timestamp) > EXPIRY_WINDOW_MS as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn identity() -> Identity {
        Identity::new("Grace", "Hopper", "grace@uni.edu")
    }

    #[test]
    fn valid_payload_omits_optional_fields() {
        let payload = TokenPayload::valid(&identity(), UserKind::Estudiante, 1_000);
        let encoded = payload.encode().unwrap();
        assert!(!encoded.contains("autoRenewal"));
        assert!(!encoded.contains("expired"));
        assert!(encoded.contains("\"tipoUsuario\":\"ESTUDIANTE\""));
        assert!(encoded.contains("\"status\":\"VALID\""));
    }

    #[test]
    fn encode_trims_identity_fields() {
        let id = Identity::new(" Grace ", "Hopper ", " grace@uni.edu");
        let payload = TokenPayload::valid(&id, UserKind::Ayudante, 42);
        assert_eq!(payload.name, "Grace");
        assert_eq!(payload.email, "grace@uni.edu");
    }

    #[test]
    fn round_trip_preserves_fields() {
        let mut payload = TokenPayload::valid(&identity(), UserKind::Ayudante, 99);
        payload.auto_renewal = Some(true);
        let decoded = TokenPayload::decode(&payload.encode().unwrap()).unwrap();
        assert_eq!(decoded, payload);
    }

    #[test]
    fn expired_marker_round_trips() {
        let mut payload = TokenPayload::valid(&identity(), UserKind::Estudiante, 7);
        payload.status = TokenStatus::Expired;
        payload.expired = Some(true);
        let encoded = payload.encode().unwrap();
        assert!(encoded.contains("\"status\":\"EXPIRED\""));
        assert!(encoded.contains("\"expired\":true"));
    }

    #[test]
    fn staleness_follows_the_expiry_window() {
        let payload = TokenPayload::valid(&identity(), UserKind::Estudiante, 0);
        assert!(!payload.is_stale(EXPIRY_WINDOW_MS as i64));
        assert!(payload.is_stale(EXPIRY_WINDOW_MS as i64 + 1));
    }

    #[test]
    fn auto_renewing_payload_never_goes_stale() {
        let mut payload = TokenPayload::valid(&identity(), UserKind::Ayudante, 0);
        payload.auto_renewal = Some(true);
        assert!(!payload.is_stale(i64::MAX));
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(TokenPayload::decode("not json").is_err());
    }
}
