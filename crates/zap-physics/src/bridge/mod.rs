//! Handle registry and lifetime bridge.
//!
//! `PhysicsBridge` owns one slot table per resource kind. Scripts only ever
//! see typed generational ids; the native Rapier values live in the records.
//! A member's native value is either detached (owned by its record),
//! resident in a space's Rapier sets, or orphaned after its body went away.

mod attach;
mod query;
mod release;

use std::mem;

use glam::Vec2;
use rapier2d::prelude::*;

use crate::api::config::BridgeConfig;
use crate::api::error::{BridgeError, ResourceError};
use crate::api::types::{
    BodyId, ConstraintId, ConstraintKind, HandleKind, ShapeId, ShapeKind, SpaceId,
};
use crate::core::physics::{BodyDesc, ConstraintDesc, PhysicsWorld, ShapeDesc};
use crate::core::slot_table::SlotTable;

pub use query::SpaceStats;

/// Where a member's native resource currently lives.
pub(crate) enum Residency<N, H> {
    Detached(N),
    Resident { space: SpaceId, handle: H },
    Orphaned,
}

impl<N, H: Copy> Residency<N, H> {
    pub(crate) fn resident_in(&self) -> Option<(SpaceId, H)> {
        match self {
            Residency::Resident { space, handle } => Some((*space, *handle)),
            _ => None,
        }
    }

    pub(crate) fn is_orphaned(&self) -> bool {
        matches!(self, Residency::Orphaned)
    }

    /// Move the detached value out, leaving the residency orphaned.
    /// Resident and orphaned states are left untouched.
    pub(crate) fn take_detached(&mut self) -> Option<N> {
        match mem::replace(self, Residency::Orphaned) {
            Residency::Detached(native) => Some(native),
            other => {
                *self = other;
                None
            }
        }
    }
}

pub(crate) struct SpaceRecord {
    pub(crate) world: PhysicsWorld,
}

pub(crate) struct BodyRecord {
    pub(crate) native: Residency<RigidBody, RigidBodyHandle>,
    /// Space passed to the last successful `add_body`.
    pub(crate) attached: Option<SpaceId>,
    /// `false` for handles on a space's built-in static body.
    pub(crate) owned: bool,
}

pub(crate) struct ShapeRecord {
    pub(crate) body: BodyId,
    pub(crate) kind: ShapeKind,
    pub(crate) native: Residency<Collider, ColliderHandle>,
    pub(crate) attached: Option<SpaceId>,
}

pub(crate) struct ConstraintRecord {
    pub(crate) bodies: [BodyId; 2],
    pub(crate) kind: ConstraintKind,
    pub(crate) native: Residency<GenericJoint, ImpulseJointHandle>,
    pub(crate) attached: Option<SpaceId>,
}

/// The physics bridge context. One per host session.
pub struct PhysicsBridge {
    config: BridgeConfig,
    pub(crate) spaces: SlotTable<SpaceRecord>,
    pub(crate) bodies: SlotTable<BodyRecord>,
    pub(crate) shapes: SlotTable<ShapeRecord>,
    pub(crate) constraints: SlotTable<ConstraintRecord>,
}

impl PhysicsBridge {
    pub fn new(config: BridgeConfig) -> Self {
        Self {
            spaces: SlotTable::with_step(config.capacity_step(HandleKind::Space)),
            bodies: SlotTable::with_step(config.capacity_step(HandleKind::Body)),
            shapes: SlotTable::with_step(config.capacity_step(HandleKind::Shape)),
            constraints: SlotTable::with_step(config.capacity_step(HandleKind::Constraint)),
            config,
        }
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    // -- Spaces --

    /// Create a space with the given gravity.
    pub fn new_space(&mut self, gravity: Vec2) -> Result<SpaceId, BridgeError> {
        if !gravity.is_finite() {
            return Err(ResourceError::InvalidParameter {
                what: "gravity",
                value: if gravity.x.is_finite() { gravity.y } else { gravity.x },
            }
            .into());
        }
        let id = SpaceId(self.spaces.insert(SpaceRecord {
            world: PhysicsWorld::new(gravity),
        }));
        log::debug!("new space {:?} ({}/{})", id, self.spaces.len(), self.spaces.capacity());
        Ok(id)
    }

    // -- Bodies --

    pub fn new_body(&mut self, desc: &BodyDesc) -> Result<BodyId, BridgeError> {
        let body = desc.build()?;
        let id = BodyId(self.bodies.insert(BodyRecord {
            native: Residency::Detached(body),
            attached: None,
            owned: true,
        }));
        log::debug!("new body {:?} ({}/{})", id, self.bodies.len(), self.bodies.capacity());
        Ok(id)
    }

    pub fn new_circle_body(&mut self, radius: f32, mass: f32) -> Result<BodyId, BridgeError> {
        self.new_body(&BodyDesc::circle(radius, mass)?)
    }

    pub fn new_box_body(
        &mut self,
        width: f32,
        height: f32,
        mass: f32,
    ) -> Result<BodyId, BridgeError> {
        self.new_body(&BodyDesc::boxed(width, height, mass)?)
    }

    pub fn new_static_body(&mut self) -> Result<BodyId, BridgeError> {
        self.new_body(&BodyDesc::fixed())
    }

    /// A new, non-owning handle on the space's built-in static body.
    /// Releasing it never frees the native body.
    pub fn get_static_body(&mut self, space: SpaceId) -> Result<BodyId, BridgeError> {
        let handle = self.space_record(space)?.world.static_body();
        let id = BodyId(self.bodies.insert(BodyRecord {
            native: Residency::Resident { space, handle },
            attached: None,
            owned: false,
        }));
        log::debug!("static body {:?} of space {:?}", id, space);
        Ok(id)
    }

    // -- Shapes --

    /// Create a shape anchored to `body`. The shape starts detached.
    pub fn new_shape(&mut self, body: BodyId, desc: &ShapeDesc) -> Result<ShapeId, BridgeError> {
        if self.body_record(body)?.native.is_orphaned() {
            return Err(BridgeError::orphaned(HandleKind::Body));
        }
        let collider = desc.build()?;
        let id = ShapeId(self.shapes.insert(ShapeRecord {
            body,
            kind: desc.kind(),
            native: Residency::Detached(collider),
            attached: None,
        }));
        log::debug!("new shape {:?} on {:?} ({}/{})", id, body, self.shapes.len(), self.shapes.capacity());
        Ok(id)
    }

    pub fn new_circle_shape(&mut self, body: BodyId, radius: f32) -> Result<ShapeId, BridgeError> {
        self.new_shape(body, &ShapeDesc::Circle { radius })
    }

    pub fn new_box_shape(
        &mut self,
        body: BodyId,
        width: f32,
        height: f32,
        radius: f32,
    ) -> Result<ShapeId, BridgeError> {
        self.new_shape(body, &ShapeDesc::Box { width, height, radius })
    }

    pub fn new_segment_shape(
        &mut self,
        body: BodyId,
        a: Vec2,
        b: Vec2,
        thickness: f32,
    ) -> Result<ShapeId, BridgeError> {
        self.new_shape(body, &ShapeDesc::Segment { a, b, thickness })
    }

    // -- Constraints --

    /// Create a constraint between two distinct bodies. It starts detached.
    pub fn new_constraint(
        &mut self,
        body_a: BodyId,
        body_b: BodyId,
        desc: &ConstraintDesc,
    ) -> Result<ConstraintId, BridgeError> {
        for body in [body_a, body_b] {
            if self.body_record(body)?.native.is_orphaned() {
                return Err(BridgeError::orphaned(HandleKind::Body));
            }
        }
        if body_a == body_b {
            return Err(ResourceError::SelfConstraint.into());
        }
        let joint = desc.build()?;
        let id = ConstraintId(self.constraints.insert(ConstraintRecord {
            bodies: [body_a, body_b],
            kind: desc.kind(),
            native: Residency::Detached(joint),
            attached: None,
        }));
        log::debug!("new constraint {:?} ({}/{})", id, self.constraints.len(), self.constraints.capacity());
        Ok(id)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn new_damped_spring(
        &mut self,
        body_a: BodyId,
        body_b: BodyId,
        anchor_a: Vec2,
        anchor_b: Vec2,
        rest_length: f32,
        stiffness: f32,
        damping: f32,
    ) -> Result<ConstraintId, BridgeError> {
        self.new_constraint(
            body_a,
            body_b,
            &ConstraintDesc::DampedSpring { anchor_a, anchor_b, rest_length, stiffness, damping },
        )
    }

    pub fn new_slide_joint(
        &mut self,
        body_a: BodyId,
        body_b: BodyId,
        anchor_a: Vec2,
        anchor_b: Vec2,
        min: f32,
        max: f32,
    ) -> Result<ConstraintId, BridgeError> {
        self.new_constraint(
            body_a,
            body_b,
            &ConstraintDesc::SlideJoint { anchor_a, anchor_b, min, max },
        )
    }

    // -- Record lookups --

    pub(crate) fn space_record(&self, id: SpaceId) -> Result<&SpaceRecord, BridgeError> {
        self.spaces.get(id.0).ok_or(BridgeError::stale(HandleKind::Space))
    }

    pub(crate) fn body_record(&self, id: BodyId) -> Result<&BodyRecord, BridgeError> {
        self.bodies.get(id.0).ok_or(BridgeError::stale(HandleKind::Body))
    }

    pub(crate) fn shape_record(&self, id: ShapeId) -> Result<&ShapeRecord, BridgeError> {
        self.shapes.get(id.0).ok_or(BridgeError::stale(HandleKind::Shape))
    }

    pub(crate) fn constraint_record(
        &self,
        id: ConstraintId,
    ) -> Result<&ConstraintRecord, BridgeError> {
        self.constraints
            .get(id.0)
            .ok_or(BridgeError::stale(HandleKind::Constraint))
    }
}

impl Default for PhysicsBridge {
    fn default() -> Self {
        Self::new(BridgeConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::error::UsageError;

    #[test]
    fn allocate_one_of_each() {
        let mut bridge = PhysicsBridge::default();
        let space = bridge.new_space(Vec2::new(0.0, -100.0)).unwrap();
        let a = bridge.new_circle_body(10.0, 1.0).unwrap();
        let b = bridge.new_box_body(4.0, 2.0, 3.0).unwrap();
        let shape = bridge.new_circle_shape(a, 10.0).unwrap();
        let spring = bridge
            .new_damped_spring(a, b, Vec2::ZERO, Vec2::ZERO, 10.0, 50.0, 1.0)
            .unwrap();

        assert_eq!(bridge.count(HandleKind::Space), 1);
        assert_eq!(bridge.count(HandleKind::Body), 2);
        assert_eq!(bridge.count(HandleKind::Shape), 1);
        assert_eq!(bridge.count(HandleKind::Constraint), 1);
        assert_eq!(bridge.shape_body(shape).unwrap(), a);
        assert_eq!(bridge.constraint_bodies(spring).unwrap(), [a, b]);
        assert_eq!(bridge.space_stats(space).unwrap().bodies, 1);
    }

    #[test]
    fn ninth_space_grows_capacity_by_step() {
        let mut bridge = PhysicsBridge::default();
        for _ in 0..8 {
            bridge.new_space(Vec2::ZERO).unwrap();
        }
        assert_eq!(bridge.capacity(HandleKind::Space), 8);

        bridge.new_space(Vec2::ZERO).unwrap();
        assert_eq!(bridge.count(HandleKind::Space), 9);
        assert_eq!(bridge.capacity(HandleKind::Space), 16);
    }

    #[test]
    fn body_table_grows_by_its_own_step() {
        let mut bridge = PhysicsBridge::default();
        for _ in 0..129 {
            bridge.new_static_body().unwrap();
        }
        assert_eq!(bridge.capacity(HandleKind::Body), 256);
    }

    #[test]
    fn failed_construction_registers_nothing() {
        let mut bridge = PhysicsBridge::default();
        let body = bridge.new_static_body().unwrap();

        assert!(bridge.new_circle_body(-3.0, 1.0).unwrap_err().is_resource());
        assert!(bridge.new_circle_shape(body, f32::NAN).unwrap_err().is_resource());
        assert!(bridge
            .new_slide_joint(body, body, Vec2::ZERO, Vec2::ZERO, 0.0, 1.0)
            .unwrap_err()
            .is_resource());
        assert!(bridge.new_space(Vec2::new(f32::INFINITY, 0.0)).is_err());

        assert_eq!(bridge.count(HandleKind::Body), 1);
        assert_eq!(bridge.count(HandleKind::Shape), 0);
        assert_eq!(bridge.count(HandleKind::Constraint), 0);
        assert_eq!(bridge.count(HandleKind::Space), 0);
    }

    #[test]
    fn shape_on_released_body_is_a_usage_error() {
        let mut bridge = PhysicsBridge::default();
        let body = bridge.new_static_body().unwrap();
        bridge.release_body(body).unwrap();

        let err = bridge.new_circle_shape(body, 1.0).unwrap_err();
        assert_eq!(err, BridgeError::Usage(UsageError::StaleHandle { kind: HandleKind::Body }));
    }

    #[test]
    fn static_body_handles_share_the_native_body() {
        let mut bridge = PhysicsBridge::default();
        let space = bridge.new_space(Vec2::ZERO).unwrap();
        let first = bridge.get_static_body(space).unwrap();
        let second = bridge.get_static_body(space).unwrap();

        assert_ne!(first, second);
        assert!(bridge.body_is_static(first).unwrap());
        assert_eq!(bridge.space_stats(space).unwrap().bodies, 1);

        bridge.release_body(first).unwrap();
        assert_eq!(bridge.space_stats(space).unwrap().bodies, 1);
        assert!(bridge.body_position(second).is_ok());
    }
}
