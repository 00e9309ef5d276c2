use thiserror::Error;

use super::types::HandleKind;

/// The caller broke the calling convention: bad arguments, wrong handle kind,
/// or a handle that has already been released.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum UsageError {
    #[error("bad argument #{position} ({expected} expected, got {got})")]
    BadArgument {
        /// 1-based position, as scripts count arguments.
        position: usize,
        expected: &'static str,
        got: &'static str,
    },
    #[error("{kind} handle is stale or already released")]
    StaleHandle { kind: HandleKind },
    #[error("unknown function '{0}'")]
    UnknownFunction(String),
    #[error("time step must be finite and positive, got {0}")]
    InvalidTimeStep(f32),
}

/// The physics library would reject the request.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResourceError {
    #[error("invalid {what}: {value}")]
    InvalidParameter { what: &'static str, value: f32 },
    #[error("slide joint limits are inverted (min {min} > max {max})")]
    InvertedLimits { min: f32, max: f32 },
    #[error("a constraint needs two distinct bodies")]
    SelfConstraint,
    #[error("body is not in the target space")]
    BodyNotInSpace,
    #[error("{kind} lost its native resource when its owner was released")]
    Orphaned { kind: HandleKind },
    #[error("the static body of a space cannot be moved to another space")]
    NotOwned,
}

/// A `BridgeConfig` the bridge cannot run with.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("malformed config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("fixed_dt must be finite and positive, got {0}")]
    FixedDt(f32),
    #[error("{0} must be at least 1")]
    CapacityStep(&'static str),
}

/// Every fallible bridge operation returns this.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BridgeError {
    #[error(transparent)]
    Usage(#[from] UsageError),
    #[error(transparent)]
    Resource(#[from] ResourceError),
}

impl BridgeError {
    pub fn is_usage(&self) -> bool {
        matches!(self, BridgeError::Usage(_))
    }

    pub fn is_resource(&self) -> bool {
        matches!(self, BridgeError::Resource(_))
    }

    pub(crate) fn stale(kind: HandleKind) -> Self {
        BridgeError::Usage(UsageError::StaleHandle { kind })
    }

    pub(crate) fn orphaned(kind: HandleKind) -> Self {
        BridgeError::Resource(ResourceError::Orphaned { kind })
    }
}
