use serde::{Deserialize, Serialize};

/// One of the four alignment/compaction passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SweepDirection {
    UpperLeft,
    UpperRight,
    LowerLeft,
    LowerRight,
}

impl SweepDirection {
    pub const ALL: [Self; 4] = [
        Self::UpperLeft,
        Self::UpperRight,
        Self::LowerLeft,
        Self::LowerRight,
    ];

    /// Upper sweeps walk layers top-to-bottom and align toward parents.
    pub fn is_upper(self) -> bool {
        matches!(self, Self::UpperLeft | Self::UpperRight)
    }

    /// Left sweeps walk each layer left-to-right.
    pub fn is_left(self) -> bool {
        matches!(self, Self::UpperLeft | Self::LowerLeft)
    }
}

/// How the four per-sweep horizontal coordinates are turned into one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SweepCombineMode {
    /// Average the four sweep results per vertex. The default.
    Balanced,
    /// Use a single sweep's result. Mainly useful when debugging the
    /// alignment stage in isolation.
    Single(SweepDirection),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Minimum horizontal gap between vertices sharing a layer.
    pub horizontal_gap: f64,
    /// Vertical gap between adjacent layer bands.
    pub vertical_gap: f64,
    /// Centers and route points closer than this are considered unchanged
    /// by the diff stage.
    pub position_tolerance: f64,
    pub combine_mode: SweepCombineMode,
    /// How long the engine keeps waiting for more mutations once a burst
    /// has started, in milliseconds.
    pub coalesce_window_ms: u64,
    /// Upper bound on how long the worker parks between shutdown checks,
    /// in milliseconds.
    pub park_timeout_ms: u64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            horizontal_gap: 20.0,
            vertical_gap: 40.0,
            position_tolerance: 0.01,
            combine_mode: SweepCombineMode::Balanced,
            coalesce_window_ms: 5,
            park_timeout_ms: 50,
        }
    }
}
