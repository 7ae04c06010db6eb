//! Status codes reported by the simulation stack.

pub const HOST_NOT_INITIALIZED: u32 = 0x0001_0001;
pub const HOST_ALREADY_INITIALIZED: u32 = 0x0001_0002;
pub const NOT_FOUND: u32 = 0x0002_0001;
pub const ALREADY_CONNECTED: u32 = 0x0002_0002;
pub const INVALID_HANDLE: u32 = 0x0002_0003;
pub const WRONG_STATE: u32 = 0x0003_0001;
pub const REQUEST_PENDING: u32 = 0x0003_0002;
pub const SYNC_TIMEOUT: u32 = 0x0003_0003;
pub const KINEMATICS_FAILED: u32 = 0x0004_0001;
pub const BINDING_MISMATCH: u32 = 0x0004_0002;
pub const BUFFER_TOO_SMALL: u32 = 0x0004_0003;
pub const INVALID_PARAMETER: u32 = 0x0004_0004;
pub const NO_TRAJECTORY: u32 = 0x0004_0005;
pub const INJECTED_FAULT: u32 = 0x00FF_0001;

/// Description for a status code.
pub fn describe(code: u32) -> &'static str {
    match code {
        HOST_NOT_INITIALIZED => "host not initialized",
        HOST_ALREADY_INITIALIZED => "host already initialized",
        NOT_FOUND => "name not found on the bus",
        ALREADY_CONNECTED => "already connected",
        INVALID_HANDLE => "invalid handle",
        WRONG_STATE => "request not allowed in the current drive state",
        REQUEST_PENDING => "another request is still pending",
        SYNC_TIMEOUT => "synchronization timed out",
        KINEMATICS_FAILED => "kinematic solution failed",
        BINDING_MISMATCH => "joint binding does not match the kinematic model",
        BUFFER_TOO_SMALL => "spline buffer too small",
        INVALID_PARAMETER => "invalid trajectory parameter",
        NO_TRAJECTORY => "no trajectory available",
        INJECTED_FAULT => "simulated drive fault",
        _ => "unknown status",
    }
}
