use rapier2d::na;
use rapier2d::prelude::*;

use super::{PhysicsBridge, Residency};
use crate::api::error::{BridgeError, ResourceError, UsageError};
use crate::api::types::{BodyId, ConstraintId, HandleKind, ShapeId, SpaceId};

/// Where a collider goes when its shape is added to a space.
enum Placement {
    /// Parented to a body resident in the space.
    Parent(RigidBodyHandle),
    /// Fixed geometry at the pose of a static body outside the space.
    Fixed(na::Isometry2<f32>),
}

impl PhysicsBridge {
    /// Add a body to a space.
    ///
    /// Adding it again to the same space only refreshes the record. Adding it
    /// to a different space first pulls it, with its resident shapes and
    /// constraints, out of the old one.
    pub fn add_body(&mut self, space: SpaceId, body: BodyId) -> Result<(), BridgeError> {
        self.space_record(space)?;
        let (current, owned, orphaned) = {
            let record = self.body_record(body)?;
            (record.native.resident_in(), record.owned, record.native.is_orphaned())
        };
        if orphaned {
            return Err(BridgeError::orphaned(HandleKind::Body));
        }

        match current {
            Some((resident, _)) if resident == space => {
                self.set_body_attached(body, Some(space));
                return Ok(());
            }
            Some(_) if !owned => return Err(ResourceError::NotOwned.into()),
            Some(_) => self.evict_body(body),
            None => {}
        }

        let record = self
            .bodies
            .get_mut(body.0)
            .ok_or(BridgeError::stale(HandleKind::Body))?;
        let native = record
            .native
            .take_detached()
            .ok_or(BridgeError::orphaned(HandleKind::Body))?;
        let world = &mut self
            .spaces
            .get_mut(space.0)
            .ok_or(BridgeError::stale(HandleKind::Space))?
            .world;
        let handle = world.insert_body(native);
        record.native = Residency::Resident { space, handle };
        record.attached = Some(space);
        log::debug!("add body {:?} to space {:?}", body, space);
        Ok(())
    }

    /// Add a shape to a space.
    ///
    /// The shape's body must be resident in that space, unless it is static:
    /// then the collider becomes fixed geometry at the body's current pose.
    pub fn add_shape(&mut self, space: SpaceId, shape: ShapeId) -> Result<(), BridgeError> {
        self.space_record(space)?;
        let (body, current) = {
            let record = self.shape_record(shape)?;
            if record.native.is_orphaned() {
                return Err(BridgeError::orphaned(HandleKind::Shape));
            }
            (record.body, record.native.resident_in())
        };

        if let Some((resident, _)) = current {
            if resident == space {
                self.set_shape_attached(shape, Some(space));
                return Ok(());
            }
        }

        let placement = self.placement(space, body)?;

        let record = self
            .shapes
            .get_mut(shape.0)
            .ok_or(BridgeError::stale(HandleKind::Shape))?;
        let collider = match current {
            Some((old, handle)) => self
                .spaces
                .get_mut(old.0)
                .and_then(|old| old.world.take_collider(handle)),
            None => record.native.take_detached(),
        };
        let mut collider = collider.ok_or(BridgeError::orphaned(HandleKind::Shape))?;

        let world = &mut self
            .spaces
            .get_mut(space.0)
            .ok_or(BridgeError::stale(HandleKind::Space))?
            .world;
        let handle = match placement {
            Placement::Parent(parent) => world.insert_collider(collider, Some(parent)),
            Placement::Fixed(pose) => {
                collider.set_position(pose);
                world.insert_collider(collider, None)
            }
        };
        record.native = Residency::Resident { space, handle };
        record.attached = Some(space);
        log::debug!("add shape {:?} to space {:?}", shape, space);
        Ok(())
    }

    /// Add a constraint to a space. Both of its bodies must already be in it.
    pub fn add_constraint(
        &mut self,
        space: SpaceId,
        constraint: ConstraintId,
    ) -> Result<(), BridgeError> {
        self.space_record(space)?;
        let (bodies, current) = {
            let record = self.constraint_record(constraint)?;
            if record.native.is_orphaned() {
                return Err(BridgeError::orphaned(HandleKind::Constraint));
            }
            (record.bodies, record.native.resident_in())
        };

        if let Some((resident, _)) = current {
            if resident == space {
                self.set_constraint_attached(constraint, Some(space));
                return Ok(());
            }
        }

        let body_a = self.resident_body(space, bodies[0])?;
        let body_b = self.resident_body(space, bodies[1])?;

        let record = self
            .constraints
            .get_mut(constraint.0)
            .ok_or(BridgeError::stale(HandleKind::Constraint))?;
        let joint = match current {
            Some((old, handle)) => self
                .spaces
                .get_mut(old.0)
                .and_then(|old| old.world.take_joint(handle)),
            None => record.native.take_detached(),
        };
        let joint = joint.ok_or(BridgeError::orphaned(HandleKind::Constraint))?;

        let world = &mut self
            .spaces
            .get_mut(space.0)
            .ok_or(BridgeError::stale(HandleKind::Space))?
            .world;
        let handle = world.insert_joint(body_a, body_b, joint);
        record.native = Residency::Resident { space, handle };
        record.attached = Some(space);
        log::debug!("add constraint {:?} to space {:?}", constraint, space);
        Ok(())
    }

    /// Advance one space by `dt` seconds.
    pub fn step(&mut self, space: SpaceId, dt: f32) -> Result<(), BridgeError> {
        if !dt.is_finite() || dt <= 0.0 {
            return Err(UsageError::InvalidTimeStep(dt).into());
        }
        let record = self
            .spaces
            .get_mut(space.0)
            .ok_or(BridgeError::stale(HandleKind::Space))?;
        record.world.step(dt);
        Ok(())
    }

    /// Advance every live space by `dt` seconds.
    pub fn step_all(&mut self, dt: f32) -> Result<(), BridgeError> {
        if !dt.is_finite() || dt <= 0.0 {
            return Err(UsageError::InvalidTimeStep(dt).into());
        }
        for (_, record) in self.spaces.iter_mut() {
            record.world.step(dt);
        }
        Ok(())
    }

    // -- private helpers --

    fn placement(&self, space: SpaceId, body: BodyId) -> Result<Placement, BridgeError> {
        let record = self.body_record(body)?;
        match &record.native {
            Residency::Resident { space: resident, handle } if *resident == space => {
                Ok(Placement::Parent(*handle))
            }
            Residency::Orphaned => Err(BridgeError::orphaned(HandleKind::Body)),
            _ => {
                let native = self.rigid_body(body)?;
                if native.is_fixed() {
                    Ok(Placement::Fixed(*native.position()))
                } else {
                    Err(ResourceError::BodyNotInSpace.into())
                }
            }
        }
    }

    fn resident_body(&self, space: SpaceId, body: BodyId) -> Result<RigidBodyHandle, BridgeError> {
        match self.body_record(body)?.native.resident_in() {
            Some((resident, handle)) if resident == space => Ok(handle),
            _ => Err(ResourceError::BodyNotInSpace.into()),
        }
    }

    /// Pull a resident body back to detached, together with the shapes and
    /// constraints that depend on it in the same space.
    fn evict_body(&mut self, body: BodyId) {
        let Some((space, handle)) = self
            .bodies
            .get(body.0)
            .and_then(|record| record.native.resident_in())
        else {
            return;
        };
        let Some(space_record) = self.spaces.get_mut(space.0) else {
            return;
        };
        let world = &mut space_record.world;

        for (_, record) in self.constraints.iter_mut() {
            if !record.bodies.contains(&body) {
                continue;
            }
            if let Some((resident, joint)) = record.native.resident_in() {
                if resident == space {
                    record.native = match world.take_joint(joint) {
                        Some(joint) => Residency::Detached(joint),
                        None => Residency::Orphaned,
                    };
                    record.attached = None;
                }
            }
        }

        for (_, record) in self.shapes.iter_mut() {
            if record.body != body {
                continue;
            }
            if let Some((resident, collider)) = record.native.resident_in() {
                if resident == space {
                    record.native = match world.take_collider(collider) {
                        Some(collider) => Residency::Detached(collider),
                        None => Residency::Orphaned,
                    };
                    record.attached = None;
                }
            }
        }

        if let Some(record) = self.bodies.get_mut(body.0) {
            record.native = match world.take_body(handle) {
                Some(native) => Residency::Detached(native),
                None => Residency::Orphaned,
            };
            record.attached = None;
        }
        log::debug!("evicted body {:?} from space {:?}", body, space);
    }

    fn set_body_attached(&mut self, body: BodyId, space: Option<SpaceId>) {
        if let Some(record) = self.bodies.get_mut(body.0) {
            record.attached = space;
        }
    }

    fn set_shape_attached(&mut self, shape: ShapeId, space: Option<SpaceId>) {
        if let Some(record) = self.shapes.get_mut(shape.0) {
            record.attached = space;
        }
    }

    fn set_constraint_attached(&mut self, constraint: ConstraintId, space: Option<SpaceId>) {
        if let Some(record) = self.constraints.get_mut(constraint.0) {
            record.attached = space;
        }
    }
}
