use glam::Vec2;
use rapier2d::na;
use rapier2d::parry::mass_properties::MassProperties;
use rapier2d::prelude::*;

use crate::api::error::ResourceError;
use crate::api::types::{ConstraintKind, ShapeKind};

// ---------------------------------------------------------------------------
// Conversion helpers (glam to nalgebra and back)
// ---------------------------------------------------------------------------

pub(crate) fn vec2_to_na(v: Vec2) -> na::Vector2<f32> {
    na::Vector2::new(v.x, v.y)
}

fn vec2_to_point(v: Vec2) -> na::Point2<f32> {
    na::Point2::new(v.x, v.y)
}

pub(crate) fn na_to_vec2(v: &na::Vector2<f32>) -> Vec2 {
    Vec2::new(v.x, v.y)
}

// ---------------------------------------------------------------------------
// Parameter checks: values Rapier would reject or panic on
// ---------------------------------------------------------------------------

pub(crate) fn finite(what: &'static str, value: f32) -> Result<f32, ResourceError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ResourceError::InvalidParameter { what, value })
    }
}

fn positive(what: &'static str, value: f32) -> Result<f32, ResourceError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(ResourceError::InvalidParameter { what, value })
    }
}

pub(crate) fn non_negative(what: &'static str, value: f32) -> Result<f32, ResourceError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(ResourceError::InvalidParameter { what, value })
    }
}

pub(crate) fn finite_vec(what: &'static str, v: Vec2) -> Result<Vec2, ResourceError> {
    finite(what, v.x)?;
    finite(what, v.y)?;
    Ok(v)
}

// ---------------------------------------------------------------------------
// Descriptions
// ---------------------------------------------------------------------------

/// The kind of rigid body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyType {
    Dynamic,
    Static,
}

/// Mass and inertia for a body before creation.
/// Shapes never add mass; the body carries all of it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyDesc {
    pub body_type: BodyType,
    pub mass: f32,
    pub moment: f32,
}

impl BodyDesc {
    /// Dynamic body with the moment of inertia of a solid disc.
    pub fn circle(radius: f32, mass: f32) -> Result<Self, ResourceError> {
        let radius = positive("radius", radius)?;
        let mass = positive("mass", mass)?;
        Ok(Self {
            body_type: BodyType::Dynamic,
            mass,
            moment: mass * radius * radius / 2.0,
        })
    }

    /// Dynamic body with the moment of inertia of a solid box.
    pub fn boxed(width: f32, height: f32, mass: f32) -> Result<Self, ResourceError> {
        let width = positive("width", width)?;
        let height = positive("height", height)?;
        let mass = positive("mass", mass)?;
        Ok(Self {
            body_type: BodyType::Dynamic,
            mass,
            moment: mass * (width * width + height * height) / 12.0,
        })
    }

    /// Static body: infinite mass, never moved by the solver.
    pub fn fixed() -> Self {
        Self {
            body_type: BodyType::Static,
            mass: 0.0,
            moment: 0.0,
        }
    }

    pub fn validate(&self) -> Result<(), ResourceError> {
        if self.body_type == BodyType::Dynamic {
            positive("mass", self.mass)?;
            non_negative("moment", self.moment)?;
        }
        Ok(())
    }

    pub(crate) fn build(&self) -> Result<RigidBody, ResourceError> {
        self.validate()?;
        let body = match self.body_type {
            BodyType::Dynamic => RigidBodyBuilder::dynamic()
                .additional_mass_properties(MassProperties::new(
                    na::Point2::origin(),
                    self.mass,
                    self.moment,
                ))
                .build(),
            BodyType::Static => RigidBodyBuilder::fixed().build(),
        };
        Ok(body)
    }
}

/// Collision geometry, always centered on its body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ShapeDesc {
    Circle { radius: f32 },
    /// Box of full `width` × `height`, corners rounded outward by `radius`.
    Box { width: f32, height: f32, radius: f32 },
    /// Segment from `a` to `b` in body space; `thickness` is the capsule radius.
    Segment { a: Vec2, b: Vec2, thickness: f32 },
}

impl ShapeDesc {
    pub fn kind(&self) -> ShapeKind {
        match self {
            ShapeDesc::Circle { .. } => ShapeKind::Circle,
            ShapeDesc::Box { .. } => ShapeKind::Box,
            ShapeDesc::Segment { .. } => ShapeKind::Segment,
        }
    }

    pub fn validate(&self) -> Result<(), ResourceError> {
        match *self {
            ShapeDesc::Circle { radius } => {
                positive("radius", radius)?;
            }
            ShapeDesc::Box { width, height, radius } => {
                positive("width", width)?;
                positive("height", height)?;
                non_negative("radius", radius)?;
            }
            ShapeDesc::Segment { a, b, thickness } => {
                finite_vec("endpoint", a)?;
                finite_vec("endpoint", b)?;
                non_negative("thickness", thickness)?;
                if thickness == 0.0 && a == b {
                    return Err(ResourceError::InvalidParameter {
                        what: "segment length",
                        value: 0.0,
                    });
                }
            }
        }
        Ok(())
    }

    pub(crate) fn build(&self) -> Result<Collider, ResourceError> {
        self.validate()?;
        let builder = match *self {
            ShapeDesc::Circle { radius } => ColliderBuilder::ball(radius),
            ShapeDesc::Box { width, height, radius } if radius > 0.0 => {
                ColliderBuilder::round_cuboid(width / 2.0, height / 2.0, radius)
            }
            ShapeDesc::Box { width, height, .. } => {
                ColliderBuilder::cuboid(width / 2.0, height / 2.0)
            }
            ShapeDesc::Segment { a, b, thickness } if thickness > 0.0 => {
                ColliderBuilder::new(SharedShape::capsule(
                    vec2_to_point(a),
                    vec2_to_point(b),
                    thickness,
                ))
            }
            ShapeDesc::Segment { a, b, .. } => {
                ColliderBuilder::segment(vec2_to_point(a), vec2_to_point(b))
            }
        };
        Ok(builder.friction(0.0).restitution(0.0).density(0.0).build())
    }
}

/// Description of a constraint between two bodies. Anchors are in body space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConstraintDesc {
    /// Spring pulling the anchors toward `rest_length`.
    DampedSpring {
        anchor_a: Vec2,
        anchor_b: Vec2,
        rest_length: f32,
        stiffness: f32,
        damping: f32,
    },
    /// Keeps the anchor distance within `[min, max]`. The two bodies do not collide.
    SlideJoint {
        anchor_a: Vec2,
        anchor_b: Vec2,
        min: f32,
        max: f32,
    },
}

impl ConstraintDesc {
    pub fn kind(&self) -> ConstraintKind {
        match self {
            ConstraintDesc::DampedSpring { .. } => ConstraintKind::DampedSpring,
            ConstraintDesc::SlideJoint { .. } => ConstraintKind::SlideJoint,
        }
    }

    pub fn validate(&self) -> Result<(), ResourceError> {
        match *self {
            ConstraintDesc::DampedSpring { anchor_a, anchor_b, rest_length, stiffness, damping } => {
                finite_vec("anchor", anchor_a)?;
                finite_vec("anchor", anchor_b)?;
                non_negative("rest length", rest_length)?;
                non_negative("stiffness", stiffness)?;
                non_negative("damping", damping)?;
            }
            ConstraintDesc::SlideJoint { anchor_a, anchor_b, min, max } => {
                finite_vec("anchor", anchor_a)?;
                finite_vec("anchor", anchor_b)?;
                non_negative("min distance", min)?;
                non_negative("max distance", max)?;
                if min > max {
                    return Err(ResourceError::InvertedLimits { min, max });
                }
            }
        }
        Ok(())
    }

    pub(crate) fn build(&self) -> Result<GenericJoint, ResourceError> {
        self.validate()?;
        let joint: GenericJoint = match *self {
            ConstraintDesc::DampedSpring { anchor_a, anchor_b, rest_length, stiffness, damping } => {
                SpringJointBuilder::new(rest_length, stiffness, damping)
                    .local_anchor1(vec2_to_point(anchor_a))
                    .local_anchor2(vec2_to_point(anchor_b))
                    .build()
                    .into()
            }
            // Same construction as Rapier's rope joint, with a lower limit too.
            ConstraintDesc::SlideJoint { anchor_a, anchor_b, min, max } => {
                GenericJointBuilder::new(JointAxesMask::empty())
                    .coupled_axes(JointAxesMask::LIN_AXES)
                    .limits(JointAxis::LinX, [min, max])
                    .local_anchor1(vec2_to_point(anchor_a))
                    .local_anchor2(vec2_to_point(anchor_b))
                    .contacts_enabled(false)
                    .build()
            }
        };
        Ok(joint)
    }
}

/// Rigid-body, collider and joint counts of one world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WorldStats {
    pub bodies: usize,
    pub colliders: usize,
    pub joints: usize,
}

// ---------------------------------------------------------------------------
// PhysicsWorld
// ---------------------------------------------------------------------------

/// Wraps all Rapier2D boilerplate for one space.
///
/// Bodies, colliders and joints move in with `insert_*` and back out with
/// `take_*`, which returns the native value so it can live on detached.
pub struct PhysicsWorld {
    gravity: na::Vector2<f32>,
    integration_parameters: IntegrationParameters,
    physics_pipeline: PhysicsPipeline,
    island_manager: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    query_pipeline: QueryPipeline,
    /// Built-in fixed body, present for the whole life of the world.
    static_body: RigidBodyHandle,
}

impl PhysicsWorld {
    /// Create a new world with the given gravity vector.
    pub fn new(gravity: Vec2) -> Self {
        let mut bodies = RigidBodySet::new();
        let static_body = bodies.insert(RigidBodyBuilder::fixed().build());
        Self {
            gravity: vec2_to_na(gravity),
            integration_parameters: IntegrationParameters::default(),
            physics_pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies,
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
            static_body,
        }
    }

    pub fn gravity(&self) -> Vec2 {
        na_to_vec2(&self.gravity)
    }

    pub fn set_gravity(&mut self, gravity: Vec2) {
        self.gravity = vec2_to_na(gravity);
    }

    pub fn static_body(&self) -> RigidBodyHandle {
        self.static_body
    }

    /// Advance the simulation by `dt` seconds.
    pub fn step(&mut self, dt: f32) {
        self.integration_parameters.dt = dt;
        self.physics_pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &(),
            &(),
        );
    }

    // -- Bodies --

    pub fn insert_body(&mut self, body: RigidBody) -> RigidBodyHandle {
        self.bodies.insert(body)
    }

    /// Remove a body, keeping its state. Colliders still parented to it are
    /// left in the world without a parent.
    pub fn take_body(&mut self, handle: RigidBodyHandle) -> Option<RigidBody> {
        self.bodies.remove(
            handle,
            &mut self.island_manager,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            false,
        )
    }

    pub fn body(&self, handle: RigidBodyHandle) -> Option<&RigidBody> {
        self.bodies.get(handle)
    }

    pub fn body_mut(&mut self, handle: RigidBodyHandle) -> Option<&mut RigidBody> {
        self.bodies.get_mut(handle)
    }

    // -- Colliders --

    /// Insert a collider on `parent`, or as fixed geometry at its current
    /// position when `parent` is `None`.
    pub fn insert_collider(
        &mut self,
        mut collider: Collider,
        parent: Option<RigidBodyHandle>,
    ) -> ColliderHandle {
        match parent {
            Some(parent) => {
                collider.set_position(na::Isometry2::identity());
                self.colliders
                    .insert_with_parent(collider, parent, &mut self.bodies)
            }
            None => self.colliders.insert(collider),
        }
    }

    pub fn take_collider(&mut self, handle: ColliderHandle) -> Option<Collider> {
        self.colliders
            .remove(handle, &mut self.island_manager, &mut self.bodies, true)
    }

    pub fn collider(&self, handle: ColliderHandle) -> Option<&Collider> {
        self.colliders.get(handle)
    }

    pub fn collider_mut(&mut self, handle: ColliderHandle) -> Option<&mut Collider> {
        self.colliders.get_mut(handle)
    }

    // -- Joints --

    pub fn insert_joint(
        &mut self,
        body_a: RigidBodyHandle,
        body_b: RigidBodyHandle,
        joint: GenericJoint,
    ) -> ImpulseJointHandle {
        self.impulse_joints.insert(body_a, body_b, joint, true)
    }

    pub fn take_joint(&mut self, handle: ImpulseJointHandle) -> Option<GenericJoint> {
        self.impulse_joints.remove(handle, true).map(|joint| joint.data)
    }

    /// Counts, including the built-in static body.
    pub fn stats(&self) -> WorldStats {
        WorldStats {
            bodies: self.bodies.len(),
            colliders: self.colliders.len(),
            joints: self.impulse_joints.len(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn ball(world: &mut PhysicsWorld, at: Vec2) -> RigidBodyHandle {
        let mut body = BodyDesc::circle(5.0, 1.0).unwrap().build().unwrap();
        body.set_translation(vec2_to_na(at), true);
        let handle = world.insert_body(body);
        let collider = ShapeDesc::Circle { radius: 5.0 }.build().unwrap();
        world.insert_collider(collider, Some(handle));
        handle
    }

    fn position(world: &PhysicsWorld, handle: RigidBodyHandle) -> Vec2 {
        na_to_vec2(world.body(handle).unwrap().translation())
    }

    #[test]
    fn new_world_has_static_body() {
        let world = PhysicsWorld::new(Vec2::ZERO);
        let stats = world.stats();
        assert_eq!(stats.bodies, 1);
        assert!(world.body(world.static_body()).unwrap().is_fixed());
    }

    #[test]
    fn gravity_affects_dynamic_body() {
        let mut world = PhysicsWorld::new(Vec2::new(0.0, -100.0));
        let body = ball(&mut world, Vec2::ZERO);

        for _ in 0..10 {
            world.step(1.0 / 60.0);
        }

        let pos = position(&world, body);
        assert!(pos.y < 0.0, "Body should fall: y={}", pos.y);
    }

    #[test]
    fn fixed_body_does_not_move() {
        let mut world = PhysicsWorld::new(Vec2::new(0.0, -100.0));
        let mut body = BodyDesc::fixed().build().unwrap();
        body.set_translation(na::Vector2::new(0.0, 500.0), true);
        let handle = world.insert_body(body);

        for _ in 0..10 {
            world.step(1.0 / 60.0);
        }

        assert!((position(&world, handle).y - 500.0).abs() < 0.001);
    }

    #[test]
    fn take_body_keeps_state() {
        let mut world = PhysicsWorld::new(Vec2::ZERO);
        let handle = ball(&mut world, Vec2::new(3.0, 4.0));
        world
            .body_mut(handle)
            .unwrap()
            .set_linvel(na::Vector2::new(7.0, 0.0), true);

        let body = world.take_body(handle).expect("body should come out");
        assert_eq!(na_to_vec2(body.translation()), Vec2::new(3.0, 4.0));
        assert!((body.linvel().x - 7.0).abs() < 0.001);
        assert_eq!(world.stats().bodies, 1);

        let again = world.insert_body(body);
        assert_eq!(position(&world, again), Vec2::new(3.0, 4.0));
    }

    #[test]
    fn take_collider_and_joint() {
        let mut world = PhysicsWorld::new(Vec2::ZERO);
        let a = ball(&mut world, Vec2::ZERO);
        let b = ball(&mut world, Vec2::new(50.0, 0.0));
        assert_eq!(world.stats().colliders, 2);

        let joint = ConstraintDesc::SlideJoint {
            anchor_a: Vec2::ZERO,
            anchor_b: Vec2::ZERO,
            min: 10.0,
            max: 60.0,
        }
        .build()
        .unwrap();
        let handle = world.insert_joint(a, b, joint);
        assert_eq!(world.stats().joints, 1);
        assert!(world.take_joint(handle).is_some());
        assert!(world.take_joint(handle).is_none());
        assert_eq!(world.stats().joints, 0);
    }

    #[test]
    fn parentless_collider_sits_at_given_pose() {
        let mut world = PhysicsWorld::new(Vec2::ZERO);
        let mut collider = ShapeDesc::Box { width: 100.0, height: 20.0, radius: 0.0 }
            .build()
            .unwrap();
        collider.set_position(na::Isometry2::translation(0.0, -40.0));
        let handle = world.insert_collider(collider, None);

        let collider = world.collider(handle).unwrap();
        assert!(collider.parent().is_none());
        assert!((collider.translation().y + 40.0).abs() < 0.001);
    }

    #[test]
    fn spring_pulls_bodies_together() {
        let mut world = PhysicsWorld::new(Vec2::ZERO);
        let a = ball(&mut world, Vec2::ZERO);
        let b = ball(&mut world, Vec2::new(100.0, 0.0));

        let spring = ConstraintDesc::DampedSpring {
            anchor_a: Vec2::ZERO,
            anchor_b: Vec2::ZERO,
            rest_length: 30.0,
            stiffness: 500.0,
            damping: 5.0,
        }
        .build()
        .unwrap();
        world.insert_joint(a, b, spring);

        for _ in 0..60 {
            world.step(1.0 / 60.0);
        }

        let distance = position(&world, b).x - position(&world, a).x;
        assert!(distance < 100.0, "Spring should pull bodies closer: distance={}", distance);
    }

    #[test]
    fn slide_joint_caps_distance() {
        let mut world = PhysicsWorld::new(Vec2::ZERO);
        let a = ball(&mut world, Vec2::ZERO);
        let b = ball(&mut world, Vec2::new(40.0, 0.0));
        world
            .body_mut(b)
            .unwrap()
            .set_linvel(na::Vector2::new(200.0, 0.0), true);

        let joint = ConstraintDesc::SlideJoint {
            anchor_a: Vec2::ZERO,
            anchor_b: Vec2::ZERO,
            min: 0.0,
            max: 50.0,
        }
        .build()
        .unwrap();
        world.insert_joint(a, b, joint);

        for _ in 0..60 {
            world.step(1.0 / 60.0);
        }

        let distance = position(&world, a).distance(position(&world, b));
        assert!(distance < 55.0, "Slide joint should hold max distance: {}", distance);
    }

    #[test]
    fn body_desc_moments() {
        let circle = BodyDesc::circle(10.0, 2.0).unwrap();
        assert!((circle.moment - 100.0).abs() < 0.001);

        let boxed = BodyDesc::boxed(3.0, 4.0, 12.0).unwrap();
        assert!((boxed.moment - 25.0).abs() < 0.001);

        assert_eq!(BodyDesc::fixed().body_type, BodyType::Static);
    }

    #[test]
    fn invalid_descriptions_are_rejected() {
        assert!(BodyDesc::circle(-1.0, 1.0).is_err());
        assert!(BodyDesc::circle(1.0, 0.0).is_err());
        assert!(BodyDesc::boxed(1.0, f32::NAN, 1.0).is_err());
        assert!(ShapeDesc::Circle { radius: 0.0 }.build().is_err());
        assert!(ShapeDesc::Segment { a: Vec2::ONE, b: Vec2::ONE, thickness: 0.0 }
            .build()
            .is_err());
        assert_eq!(
            ConstraintDesc::SlideJoint {
                anchor_a: Vec2::ZERO,
                anchor_b: Vec2::ZERO,
                min: 5.0,
                max: 1.0,
            }
            .validate(),
            Err(ResourceError::InvertedLimits { min: 5.0, max: 1.0 })
        );
    }

    #[test]
    fn shape_kinds() {
        assert_eq!(ShapeDesc::Circle { radius: 1.0 }.kind(), ShapeKind::Circle);
        assert_eq!(
            ShapeDesc::Segment { a: Vec2::ZERO, b: Vec2::X, thickness: 1.0 }.kind(),
            ShapeKind::Segment
        );
    }
}
