use peak_field_core::world::PeakField;
use peak_field_core::FieldConfig;
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

/// Minimal PyO3 module exposing peak-field-core to Python.
#[pyfunction]
fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[pyfunction]
fn default_config_json() -> PyResult<String> {
    serde_json::to_string(&FieldConfig::default())
        .map_err(|e| PyValueError::new_err(format!("failed to serialize default config: {e}")))
}

#[pyfunction]
fn validate_config_json(config_json: &str) -> PyResult<bool> {
    let config = parse_config(config_json).map_err(PyValueError::new_err)?;
    PeakField::try_new(config)
        .map(|_| true)
        .map_err(|e| PyValueError::new_err(format!("invalid field configuration: {e}")))
}

#[pyfunction]
fn run_experiment_json(config_json: &str, steps: usize, sample_every: usize) -> PyResult<String> {
    run_experiment(config_json, steps, sample_every).map_err(PyValueError::new_err)
}

fn parse_config(config_json: &str) -> Result<FieldConfig, String> {
    serde_json::from_str(config_json).map_err(|e| format!("invalid config json: {e}"))
}

fn run_experiment(config_json: &str, steps: usize, sample_every: usize) -> Result<String, String> {
    let config = parse_config(config_json)?;
    let mut field =
        PeakField::try_new(config).map_err(|e| format!("invalid field configuration: {e}"))?;
    let summary = field
        .try_run_experiment(steps, sample_every)
        .map_err(|e| format!("invalid experiment: {e}"))?;
    serde_json::to_string(&summary).map_err(|e| format!("failed to serialize summary: {e}"))
}

#[pymodule]
fn _core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(version, m)?)?;
    m.add_function(wrap_pyfunction!(default_config_json, m)?)?;
    m.add_function(wrap_pyfunction!(validate_config_json, m)?)?;
    m.add_function(wrap_pyfunction!(run_experiment_json, m)?)?;
    Ok(())
}
