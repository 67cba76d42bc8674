//! systemd unit helpers (Linux).

use crate::error::{Result, ShellError};
use crate::process::{run_args, RunOptions, RunOutput};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

/// Kind of a systemd unit, taken from its file suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnitType {
    Service,
    Timer,
    Socket,
    Device,
    Mount,
    Automount,
    Swap,
    Target,
    Path,
    Slice,
    Scope,
}

impl UnitType {
    /// Unit type of a unit file such as `nginx.service`; `None` for unknown suffixes.
    pub fn from_path(path: impl AsRef<Path>) -> Option<Self> {
        path.as_ref().extension()?.to_str()?.parse().ok()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UnitType::Service => "service",
            UnitType::Timer => "timer",
            UnitType::Socket => "socket",
            UnitType::Device => "device",
            UnitType::Mount => "mount",
            UnitType::Automount => "automount",
            UnitType::Swap => "swap",
            UnitType::Target => "target",
            UnitType::Path => "path",
            UnitType::Slice => "slice",
            UnitType::Scope => "scope",
        }
    }

    /// Whether `systemctl enable` applies to this unit type.
    pub fn supports_enable(&self) -> bool {
        matches!(
            self,
            UnitType::Service
                | UnitType::Timer
                | UnitType::Socket
                | UnitType::Mount
                | UnitType::Automount
                | UnitType::Swap
                | UnitType::Target
                | UnitType::Path
        )
    }

    /// Whether `systemctl start` applies to this unit type.
    pub fn supports_start(&self) -> bool {
        matches!(
            self,
            UnitType::Service
                | UnitType::Timer
                | UnitType::Socket
                | UnitType::Mount
                | UnitType::Swap
                | UnitType::Target
        )
    }
}

impl FromStr for UnitType {
    type Err = ShellError;

    fn from_str(s: &str) -> Result<Self> {
        Ok(match s {
            "service" => UnitType::Service,
            "timer" => UnitType::Timer,
            "socket" => UnitType::Socket,
            "device" => UnitType::Device,
            "mount" => UnitType::Mount,
            "automount" => UnitType::Automount,
            "swap" => UnitType::Swap,
            "target" => UnitType::Target,
            "path" => UnitType::Path,
            "slice" => UnitType::Slice,
            "scope" => UnitType::Scope,
            other => {
                return Err(ShellError::invalid(
                    "unit_type",
                    format!("unknown systemd unit type {:?}", other),
                ))
            }
        })
    }
}

impl fmt::Display for UnitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parse `key=value` lines. Lines without `=` are skipped; values keep any
/// further `=` characters.
pub fn parse_properties(text: &str) -> BTreeMap<String, String> {
    text.lines()
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}

/// Run `systemctl <action> <unit>` without a shell.
pub fn systemctl(action: &str, unit: &str) -> Result<RunOutput> {
    run_args("systemctl", &[action, unit], &RunOptions::default())
}

/// Properties of a unit as reported by `systemctl show`.
///
/// A non-zero exit yields an empty map.
pub fn unit_properties(unit: &str) -> Result<BTreeMap<String, String>> {
    let output = systemctl("show", unit)?;
    if !output.success() {
        debug!("systemctl show {} exited with {:?}", unit, output.code);
        return Ok(BTreeMap::new());
    }
    Ok(parse_properties(output.stdout_str()))
}

/// True when the unit's `ActiveState` is `inactive`.
pub fn unit_inactive(unit: &str) -> Result<bool> {
    let properties = unit_properties(unit)?;
    Ok(properties.get("ActiveState").map(String::as_str) == Some("inactive"))
}
