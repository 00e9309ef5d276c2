use super::{PhysicsBridge, Residency, SpaceRecord};
use crate::api::error::BridgeError;
use crate::api::types::{BodyId, ConstraintId, HandleKind, HandleRef, ShapeId, SpaceId};
use crate::core::physics::PhysicsWorld;
use crate::core::slot_table::SlotTable;

impl PhysicsBridge {
    /// Release any handle. This is the finalizer registered for every kind.
    pub fn release(&mut self, handle: HandleRef) -> Result<(), BridgeError> {
        match handle {
            HandleRef::Space(id) => self.release_space(id),
            HandleRef::Body(id) => self.release_body(id),
            HandleRef::Shape(id) => self.release_shape(id),
            HandleRef::Constraint(id) => self.release_constraint(id),
        }
    }

    /// Release a space.
    ///
    /// Resident constraints, shapes and bodies are pulled back out, in that
    /// order, and keep living detached. Handles on the space's built-in
    /// static body are orphaned, since that body goes down with the world.
    pub fn release_space(&mut self, space: SpaceId) -> Result<(), BridgeError> {
        let SpaceRecord { mut world } = self
            .spaces
            .remove(space.0)
            .ok_or(BridgeError::stale(HandleKind::Space))?;

        for (_, record) in self.constraints.iter_mut() {
            if let Some((resident, handle)) = record.native.resident_in() {
                if resident == space {
                    record.native = match world.take_joint(handle) {
                        Some(joint) => Residency::Detached(joint),
                        None => Residency::Orphaned,
                    };
                }
            }
            if record.attached == Some(space) {
                record.attached = None;
            }
        }

        for (_, record) in self.shapes.iter_mut() {
            if let Some((resident, handle)) = record.native.resident_in() {
                if resident == space {
                    record.native = match world.take_collider(handle) {
                        Some(collider) => Residency::Detached(collider),
                        None => Residency::Orphaned,
                    };
                }
            }
            if record.attached == Some(space) {
                record.attached = None;
            }
        }

        for (_, record) in self.bodies.iter_mut() {
            if let Some((resident, handle)) = record.native.resident_in() {
                if resident == space {
                    let body = if record.owned { world.take_body(handle) } else { None };
                    record.native = match body {
                        Some(body) => Residency::Detached(body),
                        None => Residency::Orphaned,
                    };
                }
            }
            if record.attached == Some(space) {
                record.attached = None;
            }
        }

        log::debug!(
            "release space {:?} ({} left, {:?} dropped with it)",
            space,
            self.spaces.len(),
            world.stats()
        );
        Ok(())
    }

    /// Release a body. Its shapes and constraints are orphaned first, so no
    /// native collider or joint outlives the body it hangs on.
    pub fn release_body(&mut self, body: BodyId) -> Result<(), BridgeError> {
        let record = self
            .bodies
            .remove(body.0)
            .ok_or(BridgeError::stale(HandleKind::Body))?;

        for (_, constraint) in self.constraints.iter_mut() {
            if constraint.bodies.contains(&body) {
                drop_native(&mut self.spaces, &mut constraint.native, PhysicsWorld::take_joint);
            }
        }
        for (_, shape) in self.shapes.iter_mut() {
            if shape.body == body {
                drop_native(&mut self.spaces, &mut shape.native, PhysicsWorld::take_collider);
            }
        }

        if record.owned {
            let mut native = record.native;
            drop_native(&mut self.spaces, &mut native, PhysicsWorld::take_body);
        }
        log::debug!("release body {:?} ({} left)", body, self.bodies.len());
        Ok(())
    }

    pub fn release_shape(&mut self, shape: ShapeId) -> Result<(), BridgeError> {
        let mut record = self
            .shapes
            .remove(shape.0)
            .ok_or(BridgeError::stale(HandleKind::Shape))?;
        drop_native(&mut self.spaces, &mut record.native, PhysicsWorld::take_collider);
        log::debug!("release shape {:?} ({} left)", shape, self.shapes.len());
        Ok(())
    }

    pub fn release_constraint(&mut self, constraint: ConstraintId) -> Result<(), BridgeError> {
        let mut record = self
            .constraints
            .remove(constraint.0)
            .ok_or(BridgeError::stale(HandleKind::Constraint))?;
        drop_native(&mut self.spaces, &mut record.native, PhysicsWorld::take_joint);
        log::debug!("release constraint {:?} ({} left)", constraint, self.constraints.len());
        Ok(())
    }
}

/// Free a member's native value wherever it lives and leave it orphaned.
fn drop_native<N, H: Copy>(
    spaces: &mut SlotTable<SpaceRecord>,
    native: &mut Residency<N, H>,
    take: fn(&mut PhysicsWorld, H) -> Option<N>,
) {
    if let Some((space, handle)) = native.resident_in() {
        if let Some(record) = spaces.get_mut(space.0) {
            take(&mut record.world, handle);
        }
    }
    *native = Residency::Orphaned;
}
