// ABOUTME: Validator client: the single request/response exchange of the core flow
// ABOUTME: Plus the attendance endpoints consumed by the display layer

use reqwest::Client;
use tracing::{debug, info, warn};
use url::Url;

use labgate_core::Identity;

use crate::error::{ClientError, ClientResult};
use crate::types::{AccessResult, AccumulatedHours, HoursResponse, PresentStudent, ValidateRequest};

/// Client for the access backend.
///
/// No explicit timeout is set beyond the transport defaults; a transport
/// failure surfaces as [`ClientError::Network`] and leaves the caller
/// free to retry.
#[derive(Clone)]
pub struct ValidatorClient {
    http: Client,
    base_url: String,
}

impl ValidatorClient {
    /// Create a client against a base URL such as
    /// `http://localhost:5000/api`.
    pub fn new(base_url: impl Into<String>) -> ClientResult<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Url::parse(&base_url).map_err(|e| ClientError::Configuration(e.to_string()))?;
        Ok(Self {
            http: Client::new(),
            base_url,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Submit a reader token with the identity fields for an access
    /// decision.
    ///
    /// A 2xx answer is returned as-is. A non-2xx answer with a parseable
    /// body is the denial path; its `error` field is carried verbatim.
    /// HTTP status codes are not distinguished beyond success/failure.
    pub async fn validate(&self, token: &str, identity: &Identity) -> ClientResult<AccessResult> {
        let url = format!("{}/lector/validar", self.base_url);
        let request = ValidateRequest::new(token, identity);
        debug!("Submitting token for validation to {url}");

        let response = self
            .http
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        let status = response.status();
        let result: AccessResult = response
            .json()
            .await
            .map_err(|e| ClientError::InvalidResponse(e.to_string()))?;

        if !status.is_success() {
            let reason = result
                .error
                .clone()
                .unwrap_or_else(|| "No se pudo registrar el acceso".to_string());
            warn!("Validation denied: {reason}");
            return Err(ClientError::Denied { reason, result });
        }

        info!(
            "Access {} ({})",
            result.tipo.as_deref().unwrap_or("registrado"),
            result.estado.as_deref().unwrap_or("-")
        );
        Ok(result)
    }

    /// Students currently inside the laboratory.
    pub async fn present_students(&self) -> ClientResult<Vec<PresentStudent>> {
        let url = format!("{}/estudiantes/estudiantes_presentes", self.base_url);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ClientError::InvalidResponse(format!(
                "present-students listing answered {}",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::InvalidResponse(e.to_string()))
    }

    /// Mark an exit for a student by identity fields.
    pub async fn mark_exit(&self, identity: &Identity) -> ClientResult<AccessResult> {
        let url = format!("{}/estudiantes/registros_estudiantes", self.base_url);
        let id = identity.trimmed();
        let body = serde_json::json!({
            "nombre": id.name,
            "apellido": id.surname,
            "email": id.email,
        });

        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        let status = response.status();
        let result: AccessResult = response
            .json()
            .await
            .map_err(|e| ClientError::InvalidResponse(e.to_string()))?;

        if !status.is_success() {
            let reason = result
                .error
                .clone()
                .unwrap_or_else(|| "Error al marcar salida".to_string());
            return Err(ClientError::Denied { reason, result });
        }
        Ok(result)
    }

    /// Accumulated helper hours, accepting both response shapes the
    /// backend has shipped.
    pub async fn accumulated_hours(&self) -> ClientResult<Vec<AccumulatedHours>> {
        let url = format!("{}/ayudantes/horas_acumuladas", self.base_url);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ClientError::InvalidResponse(format!(
                "hours listing answered {}",
                response.status()
            )));
        }

        let parsed: HoursResponse = response
            .json()
            .await
            .map_err(|e| ClientError::InvalidResponse(e.to_string()))?;
        Ok(parsed.into_rows())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_is_normalized() {
        let client = ValidatorClient::new("http://localhost:5000/api/").unwrap();
        assert_eq!(client.base_url(), "http://localhost:5000/api");
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        assert!(matches!(
            ValidatorClient::new("not a url"),
            Err(ClientError::Configuration(_))
        ));
    }
}
