// ============================================================
// Layer 6 — Config File Loading
// ============================================================
// Reads a YAML document of RunParams from a local path or a
// gs:// URI through the same ArtifactStore interface. A file
// that does not exist is a configuration error, reported before
// anything else happens.

use anyhow::{Context, Result};

use crate::domain::error::ConfigError;
use crate::domain::params::RunParams;
use crate::infra::storage::Location;

pub fn load_run_params(source: &str) -> Result<RunParams> {
    let location      = Location::parse(source)?;
    let (store, name) = location.open_object()?;

    if !store.exists(&name)? {
        return Err(ConfigError::MissingConfigFile(source.to_string()).into());
    }

    let bytes = store.get(&name)?;
    let text  = String::from_utf8(bytes)
        .with_context(|| format!("Config file '{source}' is not valid UTF-8"))?;
    let params = RunParams::from_yaml(&text)
        .with_context(|| format!("Cannot parse config file '{source}'"))?;

    tracing::info!("Loaded run parameters from '{}'", store.describe(&name));
    Ok(params)
}
