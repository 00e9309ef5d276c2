pub mod api;
pub mod core;
pub mod bridge;
pub mod script;

// Re-export key types at crate root for convenience
pub use api::config::BridgeConfig;
pub use api::error::{BridgeError, ConfigError, ResourceError, UsageError};
pub use api::extension::{Extension, KindBinding, PhysicsExtension, ScriptHost};
pub use api::types::{
    BodyId, ConstraintId, ConstraintKind, HandleKind, HandleRef, ShapeId, ShapeKind, SpaceId,
};
pub use bridge::{PhysicsBridge, SpaceStats};
pub use crate::core::physics::{BodyDesc, BodyType, ConstraintDesc, PhysicsWorld, ShapeDesc, WorldStats};
pub use crate::core::slot_table::{Key, SlotTable};
pub use crate::core::time::StepClock;
pub use script::{Args, FunctionTable, NativeFunction, Value};
