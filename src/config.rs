use alloc::string::String;
use core::fmt;

/// Backward scan limit used by [`EngineConfig::default`], in instructions.
pub const DEFAULT_MAX_SCAN_DISTANCE: u32 = 512;
/// Frame limit used by [`EngineConfig::default`].
pub const DEFAULT_MAX_FRAME_DEPTH: usize = 32;

/// The configuration was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError(String);

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid unwinder configuration: {}", self.0)
    }
}

impl core::error::Error for ConfigError {}

/// Bounds for a single walk. These are what guarantee that a walk over garbage
/// memory terminates, so neither of them can be zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    max_scan_distance: u32,
    max_frame_depth: usize,
}

impl EngineConfig {
    pub fn new(max_scan_distance: u32, max_frame_depth: usize) -> Result<Self, ConfigError> {
        if max_scan_distance == 0 {
            return Err(ConfigError(
                "max_scan_distance must be at least 1 instruction".into(),
            ));
        }
        if max_frame_depth == 0 {
            return Err(ConfigError("max_frame_depth must be at least 1 frame".into()));
        }
        Ok(Self {
            max_scan_distance,
            max_frame_depth,
        })
    }

    /// How many instructions a single function boundary search may look at.
    pub fn max_scan_distance(&self) -> u32 {
        self.max_scan_distance
    }

    /// How many frames a walk may produce.
    pub fn max_frame_depth(&self) -> usize {
        self.max_frame_depth
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_scan_distance: DEFAULT_MAX_SCAN_DISTANCE,
            max_frame_depth: DEFAULT_MAX_FRAME_DEPTH,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_bounds() {
        assert!(EngineConfig::new(0, 10).is_err());
        assert!(EngineConfig::new(10, 0).is_err());

        let config = EngineConfig::new(10, 3).unwrap();
        assert_eq!(config.max_scan_distance(), 10);
        assert_eq!(config.max_frame_depth(), 3);
    }

    #[test]
    fn error_mentions_field() {
        let err = EngineConfig::new(0, 1).unwrap_err();
        assert!(err.to_string().contains("max_scan_distance"));
    }
}
