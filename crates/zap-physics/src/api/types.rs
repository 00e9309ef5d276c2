use std::fmt;

use crate::core::slot_table::Key;

/// The four kinds of resource a script can hold a handle to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandleKind {
    Space,
    Body,
    Shape,
    Constraint,
}

impl HandleKind {
    pub const ALL: [HandleKind; 4] = [
        HandleKind::Space,
        HandleKind::Body,
        HandleKind::Shape,
        HandleKind::Constraint,
    ];

    /// Inverse of [`HandleKind::name`].
    pub fn from_name(name: &str) -> Option<Self> {
        HandleKind::ALL.into_iter().find(|kind| kind.name() == name)
    }

    /// Lowercase name used in argument errors and host type tags.
    pub fn name(self) -> &'static str {
        match self {
            HandleKind::Space => "space",
            HandleKind::Body => "body",
            HandleKind::Shape => "shape",
            HandleKind::Constraint => "constraint",
        }
    }

    /// Debug string handed to the host's `tostring` hook.
    pub fn label(self) -> &'static str {
        match self {
            HandleKind::Space => "[Space]",
            HandleKind::Body => "[Body]",
            HandleKind::Shape => "[Shape]",
            HandleKind::Constraint => "[Constraint]",
        }
    }
}

impl fmt::Display for HandleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

macro_rules! handle_id {
    ($(#[$meta:meta])* $name:ident => $kind:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name(pub(crate) Key);

        impl $name {
            pub const KIND: HandleKind = HandleKind::$kind;

            pub fn key(&self) -> Key {
                self.0
            }
        }

        impl From<$name> for HandleRef {
            fn from(id: $name) -> Self {
                HandleRef::$kind(id)
            }
        }
    };
}

handle_id!(
    /// Handle to a simulation space (a Rapier world).
    SpaceId => Space
);
handle_id!(
    /// Handle to a rigid body, attached to at most one space.
    BodyId => Body
);
handle_id!(
    /// Handle to collision geometry anchored to a body.
    ShapeId => Shape
);
handle_id!(
    /// Handle to a joint or spring between two bodies.
    ConstraintId => Constraint
);

/// A handle of any kind, as it travels through the script calling convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandleRef {
    Space(SpaceId),
    Body(BodyId),
    Shape(ShapeId),
    Constraint(ConstraintId),
}

impl HandleRef {
    /// Rebuild a handle a host stored as kind plus key.
    pub fn from_key(kind: HandleKind, key: Key) -> Self {
        match kind {
            HandleKind::Space => HandleRef::Space(SpaceId(key)),
            HandleKind::Body => HandleRef::Body(BodyId(key)),
            HandleKind::Shape => HandleRef::Shape(ShapeId(key)),
            HandleKind::Constraint => HandleRef::Constraint(ConstraintId(key)),
        }
    }

    pub fn kind(&self) -> HandleKind {
        match self {
            HandleRef::Space(_) => HandleKind::Space,
            HandleRef::Body(_) => HandleKind::Body,
            HandleRef::Shape(_) => HandleKind::Shape,
            HandleRef::Constraint(_) => HandleKind::Constraint,
        }
    }

    pub fn key(&self) -> Key {
        match self {
            HandleRef::Space(id) => id.0,
            HandleRef::Body(id) => id.0,
            HandleRef::Shape(id) => id.0,
            HandleRef::Constraint(id) => id.0,
        }
    }
}

/// Shape geometry family, kept for introspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeKind {
    Circle,
    Box,
    Segment,
}

/// Constraint family, kept for introspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintKind {
    DampedSpring,
    SlideJoint,
}
