use glam::Vec2;
use rapier2d::na;
use rapier2d::prelude::*;

use super::{PhysicsBridge, Residency};
use crate::api::error::BridgeError;
use crate::api::types::{
    BodyId, ConstraintId, ConstraintKind, HandleKind, HandleRef, ShapeId, ShapeKind, SpaceId,
};
use crate::core::physics::{finite, finite_vec, na_to_vec2, non_negative, vec2_to_na};

/// Snapshot of one space, for debugging and tests.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpaceStats {
    pub gravity: Vec2,
    /// Rigid bodies in the world, including its built-in static body.
    pub bodies: usize,
    pub colliders: usize,
    pub joints: usize,
}

impl PhysicsBridge {
    // -- Native access --

    /// The native body, wherever it currently lives.
    pub(crate) fn rigid_body(&self, body: BodyId) -> Result<&RigidBody, BridgeError> {
        match &self.body_record(body)?.native {
            Residency::Detached(native) => Ok(native),
            Residency::Resident { space, handle } => self
                .spaces
                .get(space.0)
                .and_then(|record| record.world.body(*handle))
                .ok_or(BridgeError::orphaned(HandleKind::Body)),
            Residency::Orphaned => Err(BridgeError::orphaned(HandleKind::Body)),
        }
    }

    pub(crate) fn rigid_body_mut(&mut self, body: BodyId) -> Result<&mut RigidBody, BridgeError> {
        let record = self
            .bodies
            .get_mut(body.0)
            .ok_or(BridgeError::stale(HandleKind::Body))?;
        match &mut record.native {
            Residency::Detached(native) => Ok(native),
            Residency::Resident { space, handle } => self
                .spaces
                .get_mut(space.0)
                .and_then(|record| record.world.body_mut(*handle))
                .ok_or(BridgeError::orphaned(HandleKind::Body)),
            Residency::Orphaned => Err(BridgeError::orphaned(HandleKind::Body)),
        }
    }

    pub(crate) fn collider(&self, shape: ShapeId) -> Result<&Collider, BridgeError> {
        match &self.shape_record(shape)?.native {
            Residency::Detached(native) => Ok(native),
            Residency::Resident { space, handle } => self
                .spaces
                .get(space.0)
                .and_then(|record| record.world.collider(*handle))
                .ok_or(BridgeError::orphaned(HandleKind::Shape)),
            Residency::Orphaned => Err(BridgeError::orphaned(HandleKind::Shape)),
        }
    }

    pub(crate) fn collider_mut(&mut self, shape: ShapeId) -> Result<&mut Collider, BridgeError> {
        let record = self
            .shapes
            .get_mut(shape.0)
            .ok_or(BridgeError::stale(HandleKind::Shape))?;
        match &mut record.native {
            Residency::Detached(native) => Ok(native),
            Residency::Resident { space, handle } => self
                .spaces
                .get_mut(space.0)
                .and_then(|record| record.world.collider_mut(*handle))
                .ok_or(BridgeError::orphaned(HandleKind::Shape)),
            Residency::Orphaned => Err(BridgeError::orphaned(HandleKind::Shape)),
        }
    }

    // -- Spaces --

    pub fn space_gravity(&self, space: SpaceId) -> Result<Vec2, BridgeError> {
        Ok(self.space_record(space)?.world.gravity())
    }

    pub fn set_space_gravity(&mut self, space: SpaceId, gravity: Vec2) -> Result<(), BridgeError> {
        let gravity = finite_vec("gravity", gravity)?;
        let record = self
            .spaces
            .get_mut(space.0)
            .ok_or(BridgeError::stale(HandleKind::Space))?;
        record.world.set_gravity(gravity);
        Ok(())
    }

    pub fn space_stats(&self, space: SpaceId) -> Result<SpaceStats, BridgeError> {
        let world = &self.space_record(space)?.world;
        let stats = world.stats();
        Ok(SpaceStats {
            gravity: world.gravity(),
            bodies: stats.bodies,
            colliders: stats.colliders,
            joints: stats.joints,
        })
    }

    // -- Bodies --

    /// Teleport a body. Parentless colliders placed from a static body stay
    /// where they were inserted.
    pub fn set_body_position(&mut self, body: BodyId, position: Vec2) -> Result<(), BridgeError> {
        let position = finite_vec("position", position)?;
        self.rigid_body_mut(body)?
            .set_translation(vec2_to_na(position), true);
        Ok(())
    }

    pub fn body_position(&self, body: BodyId) -> Result<Vec2, BridgeError> {
        Ok(na_to_vec2(self.rigid_body(body)?.translation()))
    }

    /// Rotation angle in radians.
    pub fn body_rotation(&self, body: BodyId) -> Result<f32, BridgeError> {
        Ok(self.rigid_body(body)?.rotation().angle())
    }

    pub fn set_body_rotation(&mut self, body: BodyId, angle: f32) -> Result<(), BridgeError> {
        let angle = finite("angle", angle)?;
        self.rigid_body_mut(body)?
            .set_rotation(na::UnitComplex::new(angle), true);
        Ok(())
    }

    pub fn body_velocity(&self, body: BodyId) -> Result<Vec2, BridgeError> {
        Ok(na_to_vec2(self.rigid_body(body)?.linvel()))
    }

    pub fn set_body_velocity(&mut self, body: BodyId, velocity: Vec2) -> Result<(), BridgeError> {
        let velocity = finite_vec("velocity", velocity)?;
        self.rigid_body_mut(body)?
            .set_linvel(vec2_to_na(velocity), true);
        Ok(())
    }

    pub fn body_is_static(&self, body: BodyId) -> Result<bool, BridgeError> {
        Ok(self.rigid_body(body)?.is_fixed())
    }

    /// Space passed to the body's last successful `add_body`.
    pub fn body_space(&self, body: BodyId) -> Result<Option<SpaceId>, BridgeError> {
        Ok(self.body_record(body)?.attached)
    }

    // -- Shapes --

    pub fn set_shape_friction(&mut self, shape: ShapeId, friction: f32) -> Result<(), BridgeError> {
        let friction = non_negative("friction", friction)?;
        self.collider_mut(shape)?.set_friction(friction);
        Ok(())
    }

    pub fn shape_friction(&self, shape: ShapeId) -> Result<f32, BridgeError> {
        Ok(self.collider(shape)?.friction())
    }

    /// Elasticity maps onto the collider's restitution coefficient.
    pub fn set_shape_elasticity(
        &mut self,
        shape: ShapeId,
        elasticity: f32,
    ) -> Result<(), BridgeError> {
        let elasticity = non_negative("elasticity", elasticity)?;
        self.collider_mut(shape)?.set_restitution(elasticity);
        Ok(())
    }

    pub fn shape_elasticity(&self, shape: ShapeId) -> Result<f32, BridgeError> {
        Ok(self.collider(shape)?.restitution())
    }

    pub fn shape_space(&self, shape: ShapeId) -> Result<Option<SpaceId>, BridgeError> {
        Ok(self.shape_record(shape)?.attached)
    }

    pub fn shape_body(&self, shape: ShapeId) -> Result<BodyId, BridgeError> {
        Ok(self.shape_record(shape)?.body)
    }

    pub fn shape_kind(&self, shape: ShapeId) -> Result<ShapeKind, BridgeError> {
        Ok(self.shape_record(shape)?.kind)
    }

    // -- Constraints --

    pub fn constraint_space(&self, constraint: ConstraintId) -> Result<Option<SpaceId>, BridgeError> {
        Ok(self.constraint_record(constraint)?.attached)
    }

    pub fn constraint_bodies(&self, constraint: ConstraintId) -> Result<[BodyId; 2], BridgeError> {
        Ok(self.constraint_record(constraint)?.bodies)
    }

    pub fn constraint_kind(&self, constraint: ConstraintId) -> Result<ConstraintKind, BridgeError> {
        Ok(self.constraint_record(constraint)?.kind)
    }

    // -- Tables --

    /// Number of live handles of one kind.
    pub fn count(&self, kind: HandleKind) -> usize {
        match kind {
            HandleKind::Space => self.spaces.len(),
            HandleKind::Body => self.bodies.len(),
            HandleKind::Shape => self.shapes.len(),
            HandleKind::Constraint => self.constraints.len(),
        }
    }

    pub fn capacity(&self, kind: HandleKind) -> usize {
        match kind {
            HandleKind::Space => self.spaces.capacity(),
            HandleKind::Body => self.bodies.capacity(),
            HandleKind::Shape => self.shapes.capacity(),
            HandleKind::Constraint => self.constraints.capacity(),
        }
    }

    /// Current table position of a live handle.
    pub fn index_of(&self, handle: HandleRef) -> Option<usize> {
        let key = handle.key();
        match handle.kind() {
            HandleKind::Space => self.spaces.index_of(key),
            HandleKind::Body => self.bodies.index_of(key),
            HandleKind::Shape => self.shapes.index_of(key),
            HandleKind::Constraint => self.constraints.index_of(key),
        }
    }

    pub fn contains(&self, handle: HandleRef) -> bool {
        self.index_of(handle).is_some()
    }

    /// Debug string for a live handle, as shown by the host's `tostring`.
    pub fn describe(&self, handle: HandleRef) -> Result<&'static str, BridgeError> {
        if self.contains(handle) {
            Ok(handle.kind().label())
        } else {
            Err(BridgeError::stale(handle.kind()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::error::ResourceError;

    #[test]
    fn position_round_trips_exactly() {
        let mut bridge = PhysicsBridge::default();
        let body = bridge.new_circle_body(10.0, 1.0).unwrap();

        bridge.set_body_position(body, Vec2::new(5.0, 7.0)).unwrap();
        assert_eq!(bridge.body_position(body).unwrap(), Vec2::new(5.0, 7.0));

        let space = bridge.new_space(Vec2::ZERO).unwrap();
        bridge.add_body(space, body).unwrap();
        bridge.set_body_position(body, Vec2::new(-3.0, 2.5)).unwrap();
        assert_eq!(bridge.body_position(body).unwrap(), Vec2::new(-3.0, 2.5));
    }

    #[test]
    fn velocity_and_rotation() {
        let mut bridge = PhysicsBridge::default();
        let body = bridge.new_box_body(2.0, 2.0, 1.0).unwrap();

        bridge.set_body_velocity(body, Vec2::new(3.0, -4.0)).unwrap();
        assert_eq!(bridge.body_velocity(body).unwrap(), Vec2::new(3.0, -4.0));

        bridge.set_body_rotation(body, 0.5).unwrap();
        assert!((bridge.body_rotation(body).unwrap() - 0.5).abs() < 1e-5);
        assert!(!bridge.body_is_static(body).unwrap());
    }

    #[test]
    fn moving_body_keeps_its_velocity_in_space() {
        let mut bridge = PhysicsBridge::default();
        let space = bridge.new_space(Vec2::ZERO).unwrap();
        let body = bridge.new_circle_body(1.0, 1.0).unwrap();
        bridge.add_body(space, body).unwrap();
        bridge.set_body_velocity(body, Vec2::new(60.0, 0.0)).unwrap();

        bridge.step(space, 1.0 / 60.0).unwrap();

        let pos = bridge.body_position(body).unwrap();
        assert!((pos.x - 1.0).abs() < 0.01, "x={}", pos.x);
    }

    #[test]
    fn shape_material() {
        let mut bridge = PhysicsBridge::default();
        let body = bridge.new_static_body().unwrap();
        let shape = bridge
            .new_segment_shape(body, Vec2::new(-10.0, 0.0), Vec2::new(10.0, 0.0), 1.0)
            .unwrap();

        assert_eq!(bridge.shape_friction(shape).unwrap(), 0.0);
        assert_eq!(bridge.shape_elasticity(shape).unwrap(), 0.0);

        bridge.set_shape_friction(shape, 0.7).unwrap();
        bridge.set_shape_elasticity(shape, 0.9).unwrap();
        assert!((bridge.shape_friction(shape).unwrap() - 0.7).abs() < 1e-6);
        assert!((bridge.shape_elasticity(shape).unwrap() - 0.9).abs() < 1e-6);
        assert_eq!(bridge.shape_kind(shape).unwrap(), ShapeKind::Segment);

        assert_eq!(
            bridge.set_shape_friction(shape, -1.0).unwrap_err(),
            BridgeError::Resource(ResourceError::InvalidParameter { what: "friction", value: -1.0 })
        );
    }

    #[test]
    fn material_survives_attach() {
        let mut bridge = PhysicsBridge::default();
        let space = bridge.new_space(Vec2::ZERO).unwrap();
        let body = bridge.new_circle_body(1.0, 1.0).unwrap();
        let shape = bridge.new_circle_shape(body, 1.0).unwrap();
        bridge.set_shape_friction(shape, 0.4).unwrap();

        bridge.add_body(space, body).unwrap();
        bridge.add_shape(space, shape).unwrap();

        assert!((bridge.shape_friction(shape).unwrap() - 0.4).abs() < 1e-6);
    }

    #[test]
    fn gravity_can_change() {
        let mut bridge = PhysicsBridge::default();
        let space = bridge.new_space(Vec2::new(0.0, -100.0)).unwrap();
        assert_eq!(bridge.space_gravity(space).unwrap(), Vec2::new(0.0, -100.0));

        bridge.set_space_gravity(space, Vec2::new(10.0, 0.0)).unwrap();
        assert_eq!(bridge.space_stats(space).unwrap().gravity, Vec2::new(10.0, 0.0));
        assert!(bridge.set_space_gravity(space, Vec2::NAN).is_err());
    }

    #[test]
    fn describe_live_and_stale_handles() {
        let mut bridge = PhysicsBridge::default();
        let space = bridge.new_space(Vec2::ZERO).unwrap();
        let body = bridge.new_static_body().unwrap();
        let a = bridge.new_circle_body(1.0, 1.0).unwrap();
        let joint = bridge
            .new_slide_joint(body, a, Vec2::ZERO, Vec2::ZERO, 1.0, 2.0)
            .unwrap();

        assert_eq!(bridge.describe(space.into()).unwrap(), "[Space]");
        assert_eq!(bridge.describe(body.into()).unwrap(), "[Body]");
        assert_eq!(bridge.describe(joint.into()).unwrap(), "[Constraint]");
        assert_eq!(bridge.constraint_kind(joint).unwrap(), ConstraintKind::SlideJoint);

        bridge.release_space(space).unwrap();
        assert!(bridge.describe(space.into()).unwrap_err().is_usage());
        assert!(!bridge.contains(space.into()));
    }

    #[test]
    fn stale_handle_never_reaches_a_reused_slot() {
        let mut bridge = PhysicsBridge::default();
        let old = bridge.new_circle_body(1.0, 1.0).unwrap();
        bridge.release_body(old).unwrap();
        let new = bridge.new_circle_body(1.0, 1.0).unwrap();

        assert_eq!(old.key().slot(), new.key().slot());
        assert!(bridge.body_position(old).unwrap_err().is_usage());
        assert!(bridge.body_position(new).is_ok());
    }
}
