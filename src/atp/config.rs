//! Supervisor timing configuration.

use crate::imports::*;

/// Timing knobs of the control loop. The defaults are the operational
/// values; tests shrink them to keep wall-clock time down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AtpConfig {
    /// Period of the control loop.
    pub tick: Duration,
    /// Longest tolerated silence between driver setpoints before the
    /// engine records a heartbeat alarm.
    pub heartbeat_timeout: Duration,
    /// Dwell in `Warning` before escalation to `Alarm`.
    pub warning_timeout: Duration,
}

impl Default for AtpConfig {
    fn default() -> Self {
        Self {
            tick: Duration::from_millis(200),
            heartbeat_timeout: Duration::from_secs(5),
            warning_timeout: Duration::from_secs(5),
        }
    }
}

impl AtpConfig {
    /// Builds the default configuration, overridden by the environment
    /// variables `ATP_TICK_MS`, `ATP_HEARTBEAT_TIMEOUT_MS` and
    /// `ATP_WARNING_TIMEOUT_MS` where set and parseable.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(tick) = read_millis("ATP_TICK_MS") {
            config.tick = tick;
        }
        if let Some(heartbeat) = read_millis("ATP_HEARTBEAT_TIMEOUT_MS") {
            config.heartbeat_timeout = heartbeat;
        }
        if let Some(warning) = read_millis("ATP_WARNING_TIMEOUT_MS") {
            config.warning_timeout = warning;
        }
        config
    }
}

fn read_millis(key: &str) -> Option<Duration> {
    let raw = std::env::var(key).ok()?;
    match raw.parse::<u64>() {
        Ok(ms) => Some(Duration::from_millis(ms)),
        Err(_) => {
            warn!("ignoring {key}: {raw:?} is not a millisecond count");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_operational_values() {
        let config = AtpConfig::default();
        assert_eq!(config.tick, Duration::from_millis(200));
        assert_eq!(config.heartbeat_timeout, Duration::from_secs(5));
        assert_eq!(config.warning_timeout, Duration::from_secs(5));
    }

    #[test]
    fn environment_overrides_apply_individually() {
        std::env::set_var("ATP_TICK_MS", "50");
        std::env::set_var("ATP_WARNING_TIMEOUT_MS", "not-a-number");
        let config = AtpConfig::from_env();
        std::env::remove_var("ATP_TICK_MS");
        std::env::remove_var("ATP_WARNING_TIMEOUT_MS");

        assert_eq!(config.tick, Duration::from_millis(50));
        assert_eq!(config.heartbeat_timeout, Duration::from_secs(5));
        assert_eq!(config.warning_timeout, Duration::from_secs(5));
    }
}
