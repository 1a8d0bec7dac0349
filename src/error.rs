use std::path::PathBuf;

/// Name of the secret looked up in the secret store.
pub const SECRET_KEY_NAME: &str = "gemini_api_key";

/// Environment variable used when the secret store has no key.
pub const API_KEY_ENV_VAR: &str = "GEMINI_API_KEY";

/// Failures outside the AI call itself: startup, storage and form input.
#[derive(Debug, thiserror::Error)]
pub enum NutriaError {
    #[error(
        "Error: Clave API de Gemini no encontrada. Configura `{SECRET_KEY_NAME}` en \
         {secrets_path} o la variable de entorno {API_KEY_ENV_VAR}."
    )]
    CredentialMissing { secrets_path: PathBuf },

    #[error("Failed to parse environment variable '{var}': {detail}")]
    ConfigEnvParseError { var: String, detail: String },

    #[error("Failed to create plan directory {path}: {detail}")]
    StorageDirFailed { path: PathBuf, detail: String },

    #[error("{detail}")]
    PlanWriteFailed { path: PathBuf, detail: String },

    #[error("{detail}")]
    PlanReadFailed { path: PathBuf, detail: String },

    #[error("Error al leer la carpeta de planes: {detail}")]
    PlanListFailed { path: PathBuf, detail: String },

    #[error("Invalid plan file name '{name}'")]
    InvalidPlanName { name: String },

    #[error("HTTP client could not be built: {detail}")]
    HttpClientFailed { detail: String },
}
