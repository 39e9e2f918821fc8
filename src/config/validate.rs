// src/config/validate.rs

use std::time::Duration;

use crate::config::model::{BuildOptions, ConfigFile, RawConfigFile};
use crate::errors::DagbuildError;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = DagbuildError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        let task_timeout = match raw.build.task_timeout.as_deref() {
            Some(s) => Some(parse_duration(s).map_err(|e| {
                DagbuildError::ConfigError(format!("[build].task_timeout: {e}"))
            })?),
            None => None,
        };

        let build = BuildOptions {
            workers: raw.build.workers,
            fail_fast: raw.build.fail_fast,
            task_timeout,
        };
        build
            .validate()
            .map_err(|e| match e {
                DagbuildError::ConfigError(msg) => DagbuildError::ConfigError(format!("[build].{msg}")),
                other => other,
            })?;

        Ok(ConfigFile {
            build,
            workflow: raw.workflow,
        })
    }
}

/// Parse a simple duration string like `"3s"`, `"250ms"`, `"1m"`, `"2h"`.
pub fn parse_duration(s: &str) -> std::result::Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty duration string".to_string());
    }

    // Find the boundary between digits and suffix.
    let idx = s
        .chars()
        .position(|c| !c.is_ascii_digit())
        .ok_or_else(|| "duration missing unit suffix".to_string())?;

    let (num_part, unit_part) = s.split_at(idx);
    let value: u64 = num_part
        .parse()
        .map_err(|e| format!("invalid duration number '{}': {}", num_part, e))?;
    let unit = unit_part.trim().to_lowercase();

    match unit.as_str() {
        "ms" => Ok(Duration::from_millis(value)),
        "s" => Ok(Duration::from_secs(value)),
        "m" => scaled_secs(value, 60),
        "h" => scaled_secs(value, 60 * 60),
        _ => Err(format!(
            "unsupported duration unit '{}'; expected ms, s, m, or h",
            unit
        )),
    }
}

fn scaled_secs(value: u64, factor: u64) -> std::result::Result<Duration, String> {
    value
        .checked_mul(factor)
        .map(Duration::from_secs)
        .ok_or_else(|| "duration too large".to_string())
}
