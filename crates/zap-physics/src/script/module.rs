use crate::api::error::{BridgeError, UsageError};
use crate::bridge::PhysicsBridge;

use super::value::{Args, Value};

/// Signature shared by every function in the table.
pub type NativeFn = fn(&mut PhysicsBridge, Args<'_>) -> Result<Vec<Value>, BridgeError>;

/// One named entry of the function table.
#[derive(Clone, Copy)]
pub struct NativeFunction {
    pub name: &'static str,
    pub call: NativeFn,
}

/// Everything a script can call, in registration order.
pub const MODULE_FUNCTIONS: &[NativeFunction] = &[
    NativeFunction { name: "new_space", call: new_space },
    NativeFunction { name: "new_circle_body", call: new_circle_body },
    NativeFunction { name: "new_box_body", call: new_box_body },
    NativeFunction { name: "new_static_body", call: new_static_body },
    NativeFunction { name: "get_static_body", call: get_static_body },
    NativeFunction { name: "new_circle_shape", call: new_circle_shape },
    NativeFunction { name: "new_box_shape", call: new_box_shape },
    NativeFunction { name: "new_segment_shape", call: new_segment_shape },
    NativeFunction { name: "set_shape_friction", call: set_shape_friction },
    NativeFunction { name: "set_shape_elasticity", call: set_shape_elasticity },
    NativeFunction { name: "add_body", call: add_body },
    NativeFunction { name: "add_shape", call: add_shape },
    NativeFunction { name: "add_constraint", call: add_constraint },
    NativeFunction { name: "space_step", call: space_step },
    NativeFunction { name: "set_body_position", call: set_body_position },
    NativeFunction { name: "get_body_position", call: get_body_position },
    NativeFunction { name: "get_body_rotation", call: get_body_rotation },
    NativeFunction { name: "get_body_velocity", call: get_body_velocity },
    NativeFunction { name: "set_body_velocity", call: set_body_velocity },
    NativeFunction { name: "new_damped_spring", call: new_damped_spring },
    NativeFunction { name: "new_slide_joint", call: new_slide_joint },
];

/// The flat function table registered with the host under one namespace.
#[derive(Clone)]
pub struct FunctionTable {
    namespace: String,
    functions: &'static [NativeFunction],
}

impl FunctionTable {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            functions: MODULE_FUNCTIONS,
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn functions(&self) -> &'static [NativeFunction] {
        self.functions
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.functions.iter().map(|f| f.name)
    }

    pub fn get(&self, name: &str) -> Option<NativeFn> {
        self.functions.iter().find(|f| f.name == name).map(|f| f.call)
    }

    /// Look up `name` and run it against the bridge.
    pub fn call(
        &self,
        bridge: &mut PhysicsBridge,
        name: &str,
        args: &[Value],
    ) -> Result<Vec<Value>, BridgeError> {
        let function = self
            .get(name)
            .ok_or_else(|| UsageError::UnknownFunction(format!("{}.{}", self.namespace, name)))?;
        function(bridge, Args::new(args))
    }
}

// ---------------------------------------------------------------------------
// Entries. Argument order follows the script API: handles first, then x/y
// pairs, then scalars.
// ---------------------------------------------------------------------------

fn new_space(bridge: &mut PhysicsBridge, args: Args<'_>) -> Result<Vec<Value>, BridgeError> {
    let gravity = args.vec2(1)?;
    Ok(vec![bridge.new_space(gravity)?.into()])
}

fn new_circle_body(bridge: &mut PhysicsBridge, args: Args<'_>) -> Result<Vec<Value>, BridgeError> {
    let radius = args.number(1)?;
    let mass = args.number(2)?;
    Ok(vec![bridge.new_circle_body(radius, mass)?.into()])
}

fn new_box_body(bridge: &mut PhysicsBridge, args: Args<'_>) -> Result<Vec<Value>, BridgeError> {
    let width = args.number(1)?;
    let height = args.number(2)?;
    let mass = args.number(3)?;
    Ok(vec![bridge.new_box_body(width, height, mass)?.into()])
}

fn new_static_body(bridge: &mut PhysicsBridge, _args: Args<'_>) -> Result<Vec<Value>, BridgeError> {
    Ok(vec![bridge.new_static_body()?.into()])
}

fn get_static_body(bridge: &mut PhysicsBridge, args: Args<'_>) -> Result<Vec<Value>, BridgeError> {
    let space = args.space(1)?;
    Ok(vec![bridge.get_static_body(space)?.into()])
}

fn new_circle_shape(bridge: &mut PhysicsBridge, args: Args<'_>) -> Result<Vec<Value>, BridgeError> {
    let body = args.body(1)?;
    let radius = args.number(2)?;
    Ok(vec![bridge.new_circle_shape(body, radius)?.into()])
}

fn new_box_shape(bridge: &mut PhysicsBridge, args: Args<'_>) -> Result<Vec<Value>, BridgeError> {
    let body = args.body(1)?;
    let width = args.number(2)?;
    let height = args.number(3)?;
    let radius = args.number_or(4, 0.0)?;
    Ok(vec![bridge.new_box_shape(body, width, height, radius)?.into()])
}

fn new_segment_shape(bridge: &mut PhysicsBridge, args: Args<'_>) -> Result<Vec<Value>, BridgeError> {
    let body = args.body(1)?;
    let a = args.vec2(2)?;
    let b = args.vec2(4)?;
    let thickness = args.number_or(6, 0.0)?;
    Ok(vec![bridge.new_segment_shape(body, a, b, thickness)?.into()])
}

fn set_shape_friction(bridge: &mut PhysicsBridge, args: Args<'_>) -> Result<Vec<Value>, BridgeError> {
    let shape = args.shape(1)?;
    bridge.set_shape_friction(shape, args.number(2)?)?;
    Ok(Vec::new())
}

fn set_shape_elasticity(bridge: &mut PhysicsBridge, args: Args<'_>) -> Result<Vec<Value>, BridgeError> {
    let shape = args.shape(1)?;
    bridge.set_shape_elasticity(shape, args.number(2)?)?;
    Ok(Vec::new())
}

fn add_body(bridge: &mut PhysicsBridge, args: Args<'_>) -> Result<Vec<Value>, BridgeError> {
    bridge.add_body(args.space(1)?, args.body(2)?)?;
    Ok(Vec::new())
}

fn add_shape(bridge: &mut PhysicsBridge, args: Args<'_>) -> Result<Vec<Value>, BridgeError> {
    bridge.add_shape(args.space(1)?, args.shape(2)?)?;
    Ok(Vec::new())
}

fn add_constraint(bridge: &mut PhysicsBridge, args: Args<'_>) -> Result<Vec<Value>, BridgeError> {
    bridge.add_constraint(args.space(1)?, args.constraint(2)?)?;
    Ok(Vec::new())
}

fn space_step(bridge: &mut PhysicsBridge, args: Args<'_>) -> Result<Vec<Value>, BridgeError> {
    bridge.step(args.space(1)?, args.number(2)?)?;
    Ok(Vec::new())
}

fn set_body_position(bridge: &mut PhysicsBridge, args: Args<'_>) -> Result<Vec<Value>, BridgeError> {
    let body = args.body(1)?;
    bridge.set_body_position(body, args.vec2(2)?)?;
    Ok(Vec::new())
}

fn get_body_position(bridge: &mut PhysicsBridge, args: Args<'_>) -> Result<Vec<Value>, BridgeError> {
    let pos = bridge.body_position(args.body(1)?)?;
    Ok(vec![pos.x.into(), pos.y.into()])
}

fn get_body_rotation(bridge: &mut PhysicsBridge, args: Args<'_>) -> Result<Vec<Value>, BridgeError> {
    Ok(vec![bridge.body_rotation(args.body(1)?)?.into()])
}

fn get_body_velocity(bridge: &mut PhysicsBridge, args: Args<'_>) -> Result<Vec<Value>, BridgeError> {
    let vel = bridge.body_velocity(args.body(1)?)?;
    Ok(vec![vel.x.into(), vel.y.into()])
}

fn set_body_velocity(bridge: &mut PhysicsBridge, args: Args<'_>) -> Result<Vec<Value>, BridgeError> {
    let body = args.body(1)?;
    bridge.set_body_velocity(body, args.vec2(2)?)?;
    Ok(Vec::new())
}

fn new_damped_spring(bridge: &mut PhysicsBridge, args: Args<'_>) -> Result<Vec<Value>, BridgeError> {
    let body_a = args.body(1)?;
    let body_b = args.body(2)?;
    let anchor_a = args.vec2(3)?;
    let anchor_b = args.vec2(5)?;
    let rest_length = args.number(7)?;
    let stiffness = args.number(8)?;
    let damping = args.number(9)?;
    let id = bridge.new_damped_spring(
        body_a,
        body_b,
        anchor_a,
        anchor_b,
        rest_length,
        stiffness,
        damping,
    )?;
    Ok(vec![id.into()])
}

fn new_slide_joint(bridge: &mut PhysicsBridge, args: Args<'_>) -> Result<Vec<Value>, BridgeError> {
    let body_a = args.body(1)?;
    let body_b = args.body(2)?;
    let anchor_a = args.vec2(3)?;
    let anchor_b = args.vec2(5)?;
    let min = args.number(7)?;
    let max = args.number(8)?;
    let id = bridge.new_slide_joint(body_a, body_b, anchor_a, anchor_b, min, max)?;
    Ok(vec![id.into()])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::{HandleKind, HandleRef};

    fn num(n: f64) -> Value {
        Value::Number(n)
    }

    fn one(values: Vec<Value>) -> Value {
        assert_eq!(values.len(), 1, "expected one return value: {:?}", values);
        values[0]
    }

    #[test]
    fn table_lists_every_entry_once() {
        let table = FunctionTable::new("physics");
        let names: Vec<_> = table.names().collect();
        assert_eq!(names.len(), 21);
        for name in &names {
            assert_eq!(names.iter().filter(|n| *n == name).count(), 1, "{} listed twice", name);
        }
        assert!(table.get("space_step").is_some());
        assert!(table.get("cpSpaceStep").is_none());
        assert_eq!(table.namespace(), "physics");
    }

    #[test]
    fn script_falling_ball() {
        let table = FunctionTable::new("physics");
        let mut bridge = PhysicsBridge::default();

        let space = one(table.call(&mut bridge, "new_space", &[num(0.0), num(-100.0)]).unwrap());
        let body = one(table.call(&mut bridge, "new_circle_body", &[num(10.0), num(1.0)]).unwrap());
        let shape = one(table.call(&mut bridge, "new_circle_shape", &[body, num(10.0)]).unwrap());
        table.call(&mut bridge, "add_body", &[space, body]).unwrap();
        table.call(&mut bridge, "add_shape", &[space, shape]).unwrap();

        for _ in 0..60 {
            table.call(&mut bridge, "space_step", &[space, num(1.0 / 60.0)]).unwrap();
        }

        let pos = table.call(&mut bridge, "get_body_position", &[body]).unwrap();
        let vel = table.call(&mut bridge, "get_body_velocity", &[body]).unwrap();
        assert_eq!(pos.len(), 2);
        assert!(pos[1].as_number().unwrap() < 0.0);
        assert!(vel[1].as_number().unwrap() < 0.0);
    }

    #[test]
    fn script_position_round_trip() {
        let table = FunctionTable::new("physics");
        let mut bridge = PhysicsBridge::default();
        let body = one(table.call(&mut bridge, "new_box_body", &[num(2.0), num(2.0), num(1.0)]).unwrap());

        table
            .call(&mut bridge, "set_body_position", &[body, num(5.0), num(7.0)])
            .unwrap();
        let pos = table.call(&mut bridge, "get_body_position", &[body]).unwrap();
        assert_eq!(pos, vec![num(5.0), num(7.0)]);
        let rot = table.call(&mut bridge, "get_body_rotation", &[body]).unwrap();
        assert_eq!(rot, vec![num(0.0)]);
    }

    #[test]
    fn script_constraints_and_static_geometry() {
        let table = FunctionTable::new("physics");
        let mut bridge = PhysicsBridge::default();
        let space = one(table.call(&mut bridge, "new_space", &[num(0.0), num(-10.0)]).unwrap());
        let ground = one(table.call(&mut bridge, "get_static_body", &[space]).unwrap());
        let floor = one(
            table
                .call(
                    &mut bridge,
                    "new_segment_shape",
                    &[ground, num(-100.0), num(0.0), num(100.0), num(0.0), num(1.0)],
                )
                .unwrap(),
        );
        table.call(&mut bridge, "set_shape_friction", &[floor, num(0.8)]).unwrap();
        table.call(&mut bridge, "set_shape_elasticity", &[floor, num(0.2)]).unwrap();
        table.call(&mut bridge, "add_shape", &[space, floor]).unwrap();

        let a = one(table.call(&mut bridge, "new_circle_body", &[num(1.0), num(1.0)]).unwrap());
        let b = one(table.call(&mut bridge, "new_circle_body", &[num(1.0), num(1.0)]).unwrap());
        table.call(&mut bridge, "add_body", &[space, a]).unwrap();
        table.call(&mut bridge, "add_body", &[space, b]).unwrap();
        let spring = one(
            table
                .call(
                    &mut bridge,
                    "new_damped_spring",
                    &[a, b, num(0.0), num(0.0), num(0.0), num(0.0), num(5.0), num(20.0), num(1.0)],
                )
                .unwrap(),
        );
        let slide = one(
            table
                .call(
                    &mut bridge,
                    "new_slide_joint",
                    &[ground, a, num(0.0), num(0.0), num(0.0), num(0.0), num(0.0), num(50.0)],
                )
                .unwrap(),
        );
        table.call(&mut bridge, "add_constraint", &[space, spring]).unwrap();
        table.call(&mut bridge, "add_constraint", &[space, slide]).unwrap();
        table
            .call(&mut bridge, "set_body_velocity", &[b, num(3.0), num(0.0)])
            .unwrap();

        assert_eq!(bridge.count(HandleKind::Constraint), 2);
        let Value::Handle(HandleRef::Space(space)) = space else {
            panic!("new_space should return a space handle");
        };
        assert_eq!(bridge.space_stats(space).unwrap().joints, 2);
    }

    #[test]
    fn wrong_arguments_are_usage_errors() {
        let table = FunctionTable::new("physics");
        let mut bridge = PhysicsBridge::default();
        let body = one(table.call(&mut bridge, "new_static_body", &[]).unwrap());

        let err = table.call(&mut bridge, "add_body", &[body, body]).unwrap_err();
        assert_eq!(err.to_string(), "bad argument #1 (space expected, got body)");

        let err = table.call(&mut bridge, "new_circle_body", &[num(1.0)]).unwrap_err();
        assert_eq!(err.to_string(), "bad argument #2 (number expected, got nil)");

        let err = table.call(&mut bridge, "no_such_fn", &[]).unwrap_err();
        assert_eq!(err, BridgeError::Usage(UsageError::UnknownFunction("physics.no_such_fn".into())));
    }

    #[test]
    fn optional_trailing_numbers() {
        let table = FunctionTable::new("physics");
        let mut bridge = PhysicsBridge::default();
        let body = one(table.call(&mut bridge, "new_static_body", &[]).unwrap());

        table
            .call(&mut bridge, "new_box_shape", &[body, num(4.0), num(2.0)])
            .unwrap();
        table
            .call(&mut bridge, "new_segment_shape", &[body, num(0.0), num(0.0), num(1.0), num(0.0)])
            .unwrap();
        assert_eq!(bridge.count(HandleKind::Shape), 2);
    }
}
