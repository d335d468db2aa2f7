use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

/// What to do when the dependency graph of the working set contains a cycle.
///
/// - `Abort`: refuse to deploy anything (default).
/// - `PriorityFallback`: deploy in pure priority-class order with no
///   dependency guarantee. Logged at ERROR level every time it kicks in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CyclePolicy {
    #[default]
    Abort,
    PriorityFallback,
}

impl FromStr for CyclePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "abort" => Ok(CyclePolicy::Abort),
            "priority-fallback" | "priority_fallback" => Ok(CyclePolicy::PriorityFallback),
            other => Err(format!(
                "invalid cycle_policy: {other} (expected \"abort\" or \"priority-fallback\")"
            )),
        }
    }
}

/// Behaviour when a single artifact fails to deploy.
///
/// - `Continue`: keep deploying the rest of the plan and report an aggregate
///   failure count at the end (default).
/// - `Abort`: stop at the first failure; the rest of the plan is skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailurePolicy {
    #[default]
    Continue,
    Abort,
}

impl FromStr for FailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "continue" => Ok(FailurePolicy::Continue),
            "abort" => Ok(FailurePolicy::Abort),
            other => Err(format!(
                "invalid failure_policy: {other} (expected \"continue\" or \"abort\")"
            )),
        }
    }
}

/// Parse a simple duration string like `"30s"`, `"250ms"`, `"10m"`, `"1h"`.
pub fn parse_duration(s: &str) -> Result<Duration, String> {
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
        "m" => Ok(Duration::from_secs(value * 60)),
        "h" => Ok(Duration::from_secs(value * 60 * 60)),
        _ => Err(format!(
            "unsupported duration unit '{}'; expected ms, s, m, or h",
            unit
        )),
    }
}
