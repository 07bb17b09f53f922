use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use spill_validation::{
    io::{bands_to_geojson, observation_to_geojson, overlap_to_geojson},
    Crs, FeatureSet, ValidationConfig, ValidationError, ValidationOutput, ValidationPipeline,
};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum SpillCliError {
    #[error(transparent)]
    SerdeError(#[from] serde_json::Error),
    #[error(transparent)]
    TomlDeError(#[from] toml::de::Error),
    #[error(transparent)]
    TomlSerError(#[from] toml::ser::Error),
    #[error(transparent)]
    IoError(#[from] std::io::Error),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Unsupported file format. Please use .toml or .json files")]
    UnsupportedFileFormat,
}

fn default_output_dir() -> String {
    "output".to_string()
}

/// Input files, modes and output location for one validation run
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct RunConfig {
    /// GeoJSON observation collection
    pub obs_file: String,
    /// GeoJSON model collection
    pub model_file: String,
    /// Optional GeoJSON collection of confirmed oil-free areas
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub no_oil_file: Option<String>,
    #[serde(flatten)]
    pub validation: ValidationConfig,
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
}

impl RunConfig {
    /// Load RunConfig from a TOML file
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self, SpillCliError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Load RunConfig from TOML string
    pub fn from_toml(content: &str) -> Result<Self, SpillCliError> {
        Ok(toml::from_str(content)?)
    }

    /// Load RunConfig from a JSON file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, SpillCliError> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Load RunConfig from JSON string
    pub fn from_json(content: &str) -> Result<Self, SpillCliError> {
        Ok(serde_json::from_str(content)?)
    }

    /// Auto-detect file format and load configuration
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SpillCliError> {
        let path_ref = path.as_ref();
        match path_ref.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml_file(path),
            Some("json") => Self::from_json_file(path),
            _ => Err(SpillCliError::UnsupportedFileFormat),
        }
    }

    /// Convert RunConfig to TOML string
    pub fn to_toml(&self) -> Result<String, SpillCliError> {
        Ok(toml::to_string_pretty(&self)?)
    }

    /// Convert RunConfig to JSON string
    pub fn to_json(&self) -> Result<String, SpillCliError> {
        Ok(serde_json::to_string_pretty(&self)?)
    }

    /// Get the JSON schema for run configuration files
    pub fn schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(RunConfig)
    }

    /// Load the input collections and run the pipeline
    pub fn run(&self) -> Result<ValidationOutput, SpillCliError> {
        let pipeline = ValidationPipeline::builder()
            .with_config(self.validation.clone())
            .build()?;
        info!("{}", pipeline.info());

        let observation = load_feature_set(&self.obs_file)?;
        let model = load_feature_set(&self.model_file)?;
        let mask = self.no_oil_file.as_ref().map(load_feature_set).transpose()?;

        Ok(pipeline.run(&observation, &model, mask.as_ref())?)
    }
}

/// Read a GeoJSON feature collection from disk
pub fn load_feature_set<P: AsRef<Path>>(path: P) -> Result<FeatureSet, SpillCliError> {
    let path = path.as_ref();
    let set = FeatureSet::from_geojson_file(path)?;
    info!(path = %path.display(), features = set.len(), crs = %set.crs, "Loaded collection");
    Ok(set)
}

/// Write the report and the result collections into `output_dir`
pub fn write_outputs<P: AsRef<Path>>(
    output: &ValidationOutput,
    crs: Crs,
    output_dir: P,
) -> Result<Vec<PathBuf>, SpillCliError> {
    let output_dir = output_dir.as_ref();
    fs::create_dir_all(output_dir)?;

    let overlap = &output.overlap;
    let files = [
        ("report.json", output.report.to_json_string()?),
        (
            "model_known.geojson",
            bands_to_geojson(&overlap.model_known, crs).to_geojson_string()?,
        ),
        (
            "overlap.geojson",
            overlap_to_geojson(overlap.outcome.records(), crs).to_geojson_string()?,
        ),
        (
            "observation.geojson",
            observation_to_geojson(&overlap.observation, crs).to_geojson_string()?,
        ),
    ];

    let mut written = Vec::with_capacity(files.len());
    for (name, content) in files {
        let path = output_dir.join(name);
        fs::write(&path, content)?;
        written.push(path);
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use spill_validation::{ModelType, ValidationType};

    const TOML_CONFIG: &str = r#"
obs_file = "data/obs.geojson"
model_file = "data/model.geojson"
model_type = "Prob"
validation_type = "Satellite"
"#;

    #[test]
    fn test_toml_config_with_defaults() {
        let config = RunConfig::from_toml(TOML_CONFIG).unwrap();

        assert_eq!(config.validation.model_type, ModelType::Probabilistic);
        assert_eq!(config.validation.validation_type, ValidationType::Satellite);
        assert_eq!(config.validation.crs, 3857);
        assert_eq!(config.no_oil_file, None);
        assert_eq!(config.output_dir, "output");
    }

    #[test]
    fn test_json_config_matches_toml() {
        let json = r#"{
            "obs_file": "data/obs.geojson",
            "model_file": "data/model.geojson",
            "no_oil_file": "data/no_oil.geojson",
            "model_type": "BE",
            "validation_type": "Coastal",
            "crs": 32631,
            "output_dir": "results"
        }"#;

        let config = RunConfig::from_json(json).unwrap();
        assert_eq!(config.validation.model_type, ModelType::BestEstimate);
        assert_eq!(config.validation.crs, 32631);
        assert_eq!(config.no_oil_file.as_deref(), Some("data/no_oil.geojson"));

        let reparsed = RunConfig::from_toml(&config.to_toml().unwrap()).unwrap();
        assert_eq!(reparsed, config);
    }

    #[test]
    fn test_unsupported_extension() {
        assert!(matches!(
            RunConfig::from_file("config.yaml"),
            Err(SpillCliError::UnsupportedFileFormat)
        ));
    }

    #[test]
    fn test_missing_input_is_io_error() {
        let mut config = RunConfig::from_toml(TOML_CONFIG).unwrap();
        config.obs_file = "does/not/exist.geojson".to_string();

        assert!(matches!(
            config.run(),
            Err(SpillCliError::Validation(ValidationError::Io(_)))
        ));
    }

    #[test]
    fn test_run_writes_outputs() {
        let dir = std::env::temp_dir().join(format!("spill_cli_test_{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();

        let obs = r#"{ "type": "FeatureCollection",
            "crs": { "type": "name", "properties": { "name": "urn:ogc:def:crs:EPSG::3857" } },
            "features": [ { "type": "Feature", "properties": { "test-case": "a" },
                "geometry": { "type": "Polygon", "coordinates": [[[0,0],[4000,0],[4000,4000],[0,4000],[0,0]]] } } ] }"#;
        let model = r#"{ "type": "FeatureCollection",
            "crs": { "type": "name", "properties": { "name": "urn:ogc:def:crs:EPSG::3857" } },
            "features": [ { "type": "Feature", "properties": { "test-case": "a", "level": 1 },
                "geometry": { "type": "Polygon", "coordinates": [[[1000,500],[5000,500],[5000,3500],[1000,3500],[1000,500]]] } } ] }"#;
        fs::write(dir.join("obs.geojson"), obs).unwrap();
        fs::write(dir.join("model.geojson"), model).unwrap();

        let config = RunConfig {
            obs_file: dir.join("obs.geojson").display().to_string(),
            model_file: dir.join("model.geojson").display().to_string(),
            no_oil_file: None,
            validation: ValidationConfig::default(),
            output_dir: dir.join("out").display().to_string(),
        };

        let output = config.run().unwrap();
        assert_eq!(output.report.case_name.as_deref(), Some("a"));
        assert!(output.report.skill_scores.is_some());

        let written = write_outputs(&output, Crs::WebMercator, &config.output_dir).unwrap();
        assert_eq!(written.len(), 4);
        for path in &written {
            assert!(path.exists(), "{} missing", path.display());
        }

        let report: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&written[0]).unwrap()).unwrap();
        assert_eq!(report["moe"]["status"], "computed");

        fs::remove_dir_all(&dir).unwrap();
    }
}
