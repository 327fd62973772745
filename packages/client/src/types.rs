// ABOUTME: Wire types for the validator and attendance endpoints
// ABOUTME: Field names match the backend exactly, including the Spanish vocabulary

use serde::{Deserialize, Serialize};

use labgate_core::Identity;

/// Body of `POST /lector/validar`.
#[derive(Debug, Clone, Serialize)]
pub struct ValidateRequest {
    pub token: String,
    pub nombre: String,
    pub apellido: String,
    pub email: String,
}

impl ValidateRequest {
    pub fn new(token: impl Into<String>, identity: &Identity) -> Self {
        let id = identity.trimmed();
        Self {
            token: token.into(),
            nombre: id.name,
            apellido: id.surname,
            email: id.email,
        }
    }
}

/// Backend access decision. `success` is the sole branch discriminator
/// for the UI outcome; everything else is descriptive.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccessResult {
    #[serde(default)]
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tipo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estado: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub station_id: Option<String>,
}

/// One row of the present-students listing.
#[derive(Debug, Clone, Deserialize)]
pub struct PresentStudent {
    #[serde(default)]
    pub id: Option<i64>,
    pub nombre: String,
    pub apellido: String,
    pub email: String,
    #[serde(default)]
    pub ultima_entrada: Option<String>,
    #[serde(default)]
    pub foto_url: Option<String>,
}

/// One row of the accumulated-hours listing.
#[derive(Debug, Clone, Deserialize)]
pub struct AccumulatedHours {
    pub nombre: String,
    #[serde(default)]
    pub apellido: String,
    pub email: String,
    #[serde(default)]
    pub horas_totales: f64,
    #[serde(default)]
    pub dias_asistidos: u32,
    #[serde(default)]
    pub dias_calendario: u32,
}

/// The hours endpoint answers either `{status, data, timestamp}` or a
/// bare array, depending on deployment vintage.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum HoursResponse {
    Wrapped {
        #[allow(dead_code)]
        status: String,
        data: Vec<AccumulatedHours>,
    },
    Bare(Vec<AccumulatedHours>),
}

impl HoursResponse {
    pub(crate) fn into_rows(self) -> Vec<AccumulatedHours> {
        match self {
            HoursResponse::Wrapped { data, .. } => data,
            HoursResponse::Bare(rows) => rows,
        }
    }
}
