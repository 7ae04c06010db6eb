//! Axis and node level types exchanged with the motion stack.
//!
//! Drive states mirror what the servo layer reports; the sequencer derives
//! its own lifecycle phase from them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Opaque identifier for a connected axis. Invalid after disconnect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AxisHandle(pub u32);

/// Opaque identifier for a connected communication node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeHandle(pub u32);

impl fmt::Display for AxisHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "axis#{}", self.0)
    }
}

impl fmt::Display for NodeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

/// Host layer operating mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum HostMode {
    /// Drives are simulated by the vendor stack.
    #[default]
    Simulation,
    /// Drives are reached over the real control bus.
    Network,
}

/// Where an axis loads its parameters from on initialize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ParameterSource {
    /// Parameters stored in the drive's flash.
    #[default]
    Flash,
    /// Built-in drive defaults.
    Defaults,
}

/// State reported by the servo layer for one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum DriveState {
    /// Connected, not initialized.
    Idle = 0,
    /// Initialized, power stage inactive.
    Inactive = 1,
    /// Motor aligned, drive free (no position control).
    Free = 2,
    /// Position loop closed, not homed.
    Locked = 3,
    /// Locked and homed, ready for motion.
    Ready = 4,
    /// Executing a motion.
    Moving = 5,
    /// Decelerating after a stop request.
    Stopping = 6,
    /// Drive error; needs a reset.
    Error = 7,
}

impl DriveState {
    /// Convert from raw `u8`. Returns `None` for invalid values.
    #[inline]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Idle),
            1 => Some(Self::Inactive),
            2 => Some(Self::Free),
            3 => Some(Self::Locked),
            4 => Some(Self::Ready),
            5 => Some(Self::Moving),
            6 => Some(Self::Stopping),
            7 => Some(Self::Error),
            _ => None,
        }
    }
}

/// Completion events an axis can be synchronized on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncRequest {
    Initialize,
    AlignMotor,
    Lock,
    HomingCompleted,
    MotionStopped,
    Reset,
    Shutdown,
}

impl SyncRequest {
    /// Short name used in logs and failure locations.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Initialize => "initialize",
            Self::AlignMotor => "align_motor",
            Self::Lock => "lock",
            Self::HomingCompleted => "homing_completed",
            Self::MotionStopped => "motion_stopped",
            Self::Reset => "reset",
            Self::Shutdown => "shutdown",
        }
    }
}

/// Drive state plus the request still in flight (the drive sub-state).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriveStatus {
    pub state: DriveState,
    pub pending: Option<SyncRequest>,
}

impl DriveStatus {
    /// A settled drive with nothing in flight.
    pub const fn settled(state: DriveState) -> Self {
        Self { state, pending: None }
    }
}

/// Motor technology reported in the axis configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MotorType {
    /// Brushless AC: commutation must be aligned before locking.
    #[default]
    BrushlessAc,
    BrushlessDc,
    Stepper,
    Other,
}

impl MotorType {
    /// Whether the motor needs an electrical alignment after initialize.
    #[inline]
    pub const fn requires_alignment(&self) -> bool {
        matches!(self, Self::BrushlessAc)
    }
}

/// Subset of the drive's axis configuration the sequencer consumes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisConfiguration {
    pub motor_type: MotorType,
}

/// Bound applied to a wait-for-completion call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WaitTimeout {
    /// Give up after the given duration.
    Bounded(Duration),
    /// Wait until the event happens.
    Indefinite,
}

impl WaitTimeout {
    /// Bounded wait of `seconds`.
    ///
    /// Never panics: a value too large for a [`Duration`] waits
    /// indefinitely, a negative or NaN value does not wait at all.
    pub fn seconds(seconds: f64) -> Self {
        match Duration::try_from_secs_f64(seconds) {
            Ok(duration) => Self::Bounded(duration),
            Err(_) if seconds > 0.0 => Self::Indefinite,
            Err(_) => Self::Bounded(Duration::ZERO),
        }
    }

    /// Bounded wait of `seconds`, or `None` when `seconds` is negative,
    /// NaN or out of range for a [`Duration`].
    pub fn try_seconds(seconds: f64) -> Option<Self> {
        Duration::try_from_secs_f64(seconds).ok().map(Self::Bounded)
    }

    /// `Some(seconds)` for a bounded wait, `None` for an indefinite one.
    pub fn as_secs_f64(&self) -> Option<f64> {
        match self {
            Self::Bounded(d) => Some(d.as_secs_f64()),
            Self::Indefinite => None,
        }
    }
}

impl fmt::Display for WaitTimeout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bounded(d) => write!(f, "{:.1}s", d.as_secs_f64()),
            Self::Indefinite => f.write_str("indefinite"),
        }
    }
}
