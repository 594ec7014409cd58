// src/config/validate.rs

use std::collections::BTreeMap;
use std::time::Duration;

use crate::config::model::{ConfigFile, DaemonSettings, RawConfigFile, RawDaemonSection, ServerConfig};
use crate::errors::{GamedError, Result};
use crate::types::TargetId;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = GamedError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        let daemon = validate_daemon(&raw.daemon)?;
        validate_api(&raw)?;
        let servers = validate_servers(raw.server)?;
        Ok(ConfigFile::new_unchecked(daemon, raw.api, raw.scripts, servers))
    }
}

fn validate_daemon(raw: &RawDaemonSection) -> Result<DaemonSettings> {
    if raw.work_path.trim().is_empty() {
        return Err(GamedError::ConfigError(
            "[daemon].work_path must not be empty".to_string(),
        ));
    }

    Ok(DaemonSettings {
        work_path: raw.work_path.clone(),
        tick_interval: non_zero_duration("tick_interval", &raw.tick_interval)?,
        cache_ttl: non_zero_duration("cache_ttl", &raw.cache_ttl)?,
        command_timeout: non_zero_duration("command_timeout", &raw.command_timeout)?,
        stop_grace: non_zero_duration("stop_grace", &raw.stop_grace)?,
        concurrency: raw.concurrency,
    })
}

fn validate_api(raw: &RawConfigFile) -> Result<()> {
    if raw.api.host.trim().is_empty() {
        return Err(GamedError::ConfigError(
            "[api].host must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_servers(
    raw: BTreeMap<String, ServerConfig>,
) -> Result<BTreeMap<TargetId, ServerConfig>> {
    let mut servers = BTreeMap::new();

    for (key, server) in raw {
        let id: TargetId = key.trim().parse().map_err(|_| {
            GamedError::ConfigError(format!(
                "server key '{key}' is not a numeric id (expected [server.<id>])"
            ))
        })?;

        if server.dir.trim().is_empty() {
            return Err(GamedError::ConfigError(format!(
                "server {id} has an empty `dir`"
            )));
        }

        servers.insert(id, server);
    }

    Ok(servers)
}

fn non_zero_duration(field: &str, value: &str) -> Result<Duration> {
    let duration = parse_duration(value).map_err(|e| {
        GamedError::ConfigError(format!("[daemon].{field}: {e}"))
    })?;

    if duration.is_zero() {
        return Err(GamedError::ConfigError(format!(
            "[daemon].{field} must be greater than zero"
        )));
    }

    Ok(duration)
}

/// Parse durations like `"500ms"`, `"5s"`, `"10m"` or `"1h"`.
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

    let secs_per_unit = match unit.as_str() {
        "ms" => return Ok(Duration::from_millis(value)),
        "s" => 1,
        "m" => 60,
        "h" => 60 * 60,
        other => return Err(format!("unknown duration unit '{other}'")),
    };

    value
        .checked_mul(secs_per_unit)
        .map(Duration::from_secs)
        .ok_or_else(|| format!("duration '{s}' is too large"))
}
