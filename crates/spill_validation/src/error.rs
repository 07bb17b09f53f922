use thiserror::Error;

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Schema violation: {0}")]
    SchemaViolation(String),

    #[error("Unsupported coordinate reference system: EPSG:{code}")]
    InvalidCrs { code: i32 },

    #[error("Projection error: {0}")]
    Projection(String),

    #[error("Degenerate input: {0}")]
    DegenerateInput(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),
}

pub type Result<T> = std::result::Result<T, ValidationError>;
