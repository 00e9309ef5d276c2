use glam::Vec2;

use crate::api::error::{BridgeError, UsageError};
use crate::api::types::{BodyId, ConstraintId, HandleRef, ShapeId, SpaceId};

/// A value crossing the script boundary. The surface only passes numbers
/// and handles; anything else the host has is `Nil` here.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Value {
    #[default]
    Nil,
    Number(f64),
    Handle(HandleRef),
}

impl Value {
    /// Type name as it appears in argument errors.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Number(_) => "number",
            Value::Handle(handle) => handle.kind().name(),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_handle(&self) -> Option<HandleRef> {
        match self {
            Value::Handle(handle) => Some(*handle),
            _ => None,
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<f32> for Value {
    fn from(n: f32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<HandleRef> for Value {
    fn from(handle: HandleRef) -> Self {
        Value::Handle(handle)
    }
}

macro_rules! value_from_id {
    ($($id:ty),*) => {
        $(
            impl From<$id> for Value {
                fn from(id: $id) -> Self {
                    Value::Handle(id.into())
                }
            }
        )*
    };
}

value_from_id!(SpaceId, BodyId, ShapeId, ConstraintId);

/// Positional view over a call's arguments.
///
/// Positions are 1-based, the way scripts count them, so error messages
/// point at the argument the script author wrote.
#[derive(Debug, Clone, Copy)]
pub struct Args<'a> {
    values: &'a [Value],
}

impl<'a> Args<'a> {
    pub fn new(values: &'a [Value]) -> Self {
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Argument at `position`, `Nil` past the end.
    pub fn get(&self, position: usize) -> Value {
        position
            .checked_sub(1)
            .and_then(|i| self.values.get(i))
            .copied()
            .unwrap_or(Value::Nil)
    }

    pub fn number(&self, position: usize) -> Result<f32, BridgeError> {
        match self.get(position) {
            Value::Number(n) => Ok(n as f32),
            other => Err(bad_argument(position, "number", &other)),
        }
    }

    /// Like `number`, but a missing or nil argument yields `default`.
    pub fn number_or(&self, position: usize, default: f32) -> Result<f32, BridgeError> {
        match self.get(position) {
            Value::Nil => Ok(default),
            _ => self.number(position),
        }
    }

    /// Two consecutive numbers read as `(x, y)`.
    pub fn vec2(&self, position: usize) -> Result<Vec2, BridgeError> {
        Ok(Vec2::new(self.number(position)?, self.number(position + 1)?))
    }

    pub fn space(&self, position: usize) -> Result<SpaceId, BridgeError> {
        match self.get(position) {
            Value::Handle(HandleRef::Space(id)) => Ok(id),
            other => Err(bad_argument(position, "space", &other)),
        }
    }

    pub fn body(&self, position: usize) -> Result<BodyId, BridgeError> {
        match self.get(position) {
            Value::Handle(HandleRef::Body(id)) => Ok(id),
            other => Err(bad_argument(position, "body", &other)),
        }
    }

    pub fn shape(&self, position: usize) -> Result<ShapeId, BridgeError> {
        match self.get(position) {
            Value::Handle(HandleRef::Shape(id)) => Ok(id),
            other => Err(bad_argument(position, "shape", &other)),
        }
    }

    pub fn constraint(&self, position: usize) -> Result<ConstraintId, BridgeError> {
        match self.get(position) {
            Value::Handle(HandleRef::Constraint(id)) => Ok(id),
            other => Err(bad_argument(position, "constraint", &other)),
        }
    }
}

fn bad_argument(position: usize, expected: &'static str, got: &Value) -> BridgeError {
    UsageError::BadArgument {
        position,
        expected,
        got: got.type_name(),
    }
    .into()
}
