//! Request files
//!
//! A JSON `RequestConfig` on disk, turned into the same `Job` the prompts
//! produce.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use stepseq_core::NumericMode;
use stepseq_engine::{RequestConfig, RequestError};
use thiserror::Error;
use tracing::debug;

use crate::output::csv_filename;
use crate::prompt::Job;

pub const DEFAULT_OUTPUT: &str = "sequence.csv";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid request file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{0}")]
    Request(#[from] RequestError),
}

pub fn parse_config(text: &str) -> Result<RequestConfig, serde_json::Error> {
    serde_json::from_str(text)
}

/// Build a job from a parsed config
///
/// `mode_override` wins over the file's `mode`.
pub fn config_job(
    config: &RequestConfig,
    mode_override: Option<NumericMode>,
) -> Result<Job, ConfigError> {
    let request = config.to_request(mode_override)?;
    let output = csv_filename(config.output.as_deref().unwrap_or(DEFAULT_OUTPUT));
    Ok(Job { request, output })
}

pub fn load_job(path: &Path, mode_override: Option<NumericMode>) -> Result<Job, ConfigError> {
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let config = parse_config(&text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), operation = %config.operation, "loaded request file");
    config_job(&config, mode_override)
}

#[cfg(test)]
mod tests {
    use super::*;
    use stepseq_core::Number;
    use stepseq_engine::{generate, OperationKind, RunState};

    #[test]
    fn test_config_job_defaults() {
        let config =
            parse_config(r#"{"start": 0, "operation": "add", "operand": 2, "length": 5}"#).unwrap();
        let job = config_job(&config, None).unwrap();
        assert_eq!(job.output, PathBuf::from(DEFAULT_OUTPUT));
        assert_eq!(job.request.mode(), NumericMode::Real);
        assert_eq!(job.request.operation().kind(), OperationKind::Add);
    }

    #[test]
    fn test_intonly_overrides_file_mode() {
        let config = parse_config(
            r#"{"mode": "real", "start": "5", "operation": "multiply", "operand": "1",
                "length": 10, "output": "fixed"}"#,
        )
        .unwrap();
        let job = config_job(&config, Some(NumericMode::Integer)).unwrap();
        assert_eq!(job.request.mode(), NumericMode::Integer);
        assert_eq!(job.output, PathBuf::from("fixed.csv"));

        let outcome = generate(&job.request).unwrap();
        assert_eq!(outcome.sequence, vec![Number::from_i64(5), Number::from_i64(5)]);
        assert_eq!(outcome.state(), RunState::Converged);
    }

    #[test]
    fn test_config_request_error() {
        let config = parse_config(
            r#"{"start": 1, "operation": "custom", "expression": "y + 1", "length": 3}"#,
        )
        .unwrap();
        assert!(matches!(config_job(&config, None), Err(ConfigError::Request(_))));
    }

    #[test]
    fn test_load_job_from_file() {
        let path =
            std::env::temp_dir().join(format!("stepseq-request-{}.json", std::process::id()));
        std::fs::write(
            &path,
            r#"{"mode": "integer", "start": 1, "operation": "custom", "expression": "-x",
                "length": 10}"#,
        )
        .unwrap();
        let job = load_job(&path, None);
        std::fs::remove_file(&path).unwrap();

        let outcome = generate(&job.unwrap().request).unwrap();
        assert_eq!(outcome.state(), RunState::CycleDetected);
    }

    #[test]
    fn test_load_job_errors() {
        let missing = std::env::temp_dir().join("stepseq-no-such-request.json");
        assert!(matches!(load_job(&missing, None), Err(ConfigError::Read { .. })));

        let path =
            std::env::temp_dir().join(format!("stepseq-bad-request-{}.json", std::process::id()));
        std::fs::write(&path, r#"{"start": 1, "colour": "blue"}"#).unwrap();
        let result = load_job(&path, None);
        std::fs::remove_file(&path).unwrap();
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }
}
