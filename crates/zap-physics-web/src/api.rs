//! Script surface. `physics_call` runs any registered function by its
//! qualified name through the function table; the typed exports are
//! shortcuts for the same operations.

use glam::Vec2;
use js_sys::{Array, Reflect};
use wasm_bindgen::prelude::*;
use zap_physics::{HandleKind, Key, Value};

use crate::handles::{self, Body, Constraint, Shape, Space};
use crate::host::{with_bridge, CallArg, HandleToken};

fn pair(v: Vec2) -> Array {
    Array::of2(&JsValue::from_f64(v.x as f64), &JsValue::from_f64(v.y as f64))
}

// ---- Dynamic calls ----

/// Call `namespace.name` with an array of numbers and handles. Returns the
/// results as an array; handles come back as wrapper objects.
#[wasm_bindgen]
pub fn physics_call(name: &str, args: Array) -> Result<Array, JsValue> {
    let args: Vec<CallArg> = args.iter().map(|arg| call_arg(&arg)).collect();
    let (results, epoch) = with_bridge(|s| Ok((s.call(name, &args)?, s.epoch())))?;
    Ok(results
        .into_iter()
        .map(|value| match value {
            Value::Nil => JsValue::UNDEFINED,
            Value::Number(n) => JsValue::from_f64(n),
            Value::Handle(handle) => handles::wrap(handle, epoch),
        })
        .collect())
}

fn call_arg(value: &JsValue) -> CallArg {
    if let Some(n) = value.as_f64() {
        return CallArg::Value(Value::Number(n));
    }
    match handle_token(value) {
        Some(token) => CallArg::Handle(token),
        None => CallArg::Value(Value::Nil),
    }
}

/// Read a wrapper's getters back into a token. Anything else is `None`.
fn handle_token(value: &JsValue) -> Option<HandleToken> {
    if !value.is_object() {
        return None;
    }
    let field = |name: &str| Reflect::get(value, &JsValue::from_str(name)).ok();
    let kind = HandleKind::from_name(&field("kind")?.as_string()?)?;
    let slot = field("slot")?.as_f64()? as u32;
    let generation = field("generation")?.as_f64()? as u32;
    let epoch = field("epoch")?.as_f64()? as u32;
    Some(HandleToken {
        kind,
        key: Key::from_parts(slot, generation),
        epoch,
    })
}

// ---- Construction ----

#[wasm_bindgen]
pub fn new_space(gravity_x: f32, gravity_y: f32) -> Result<Space, JsValue> {
    Ok(with_bridge(|s| {
        let id = s.bridge_mut().new_space(Vec2::new(gravity_x, gravity_y))?;
        Ok(Space::new(id, s.epoch()))
    })?)
}

#[wasm_bindgen]
pub fn new_circle_body(radius: f32, mass: f32) -> Result<Body, JsValue> {
    Ok(with_bridge(|s| {
        let id = s.bridge_mut().new_circle_body(radius, mass)?;
        Ok(Body::new(id, s.epoch()))
    })?)
}

#[wasm_bindgen]
pub fn new_box_body(width: f32, height: f32, mass: f32) -> Result<Body, JsValue> {
    Ok(with_bridge(|s| {
        let id = s.bridge_mut().new_box_body(width, height, mass)?;
        Ok(Body::new(id, s.epoch()))
    })?)
}

#[wasm_bindgen]
pub fn new_static_body() -> Result<Body, JsValue> {
    Ok(with_bridge(|s| {
        let id = s.bridge_mut().new_static_body()?;
        Ok(Body::new(id, s.epoch()))
    })?)
}

#[wasm_bindgen]
pub fn get_static_body(space: &Space) -> Result<Body, JsValue> {
    Ok(with_bridge(|s| {
        let space = s.live(space)?;
        let id = s.bridge_mut().get_static_body(space)?;
        Ok(Body::new(id, s.epoch()))
    })?)
}

#[wasm_bindgen]
pub fn new_circle_shape(body: &Body, radius: f32) -> Result<Shape, JsValue> {
    Ok(with_bridge(|s| {
        let body = s.live(body)?;
        let id = s.bridge_mut().new_circle_shape(body, radius)?;
        Ok(Shape::new(id, s.epoch()))
    })?)
}

#[wasm_bindgen]
pub fn new_box_shape(
    body: &Body,
    width: f32,
    height: f32,
    radius: Option<f32>,
) -> Result<Shape, JsValue> {
    let radius = radius.unwrap_or(0.0);
    Ok(with_bridge(|s| {
        let body = s.live(body)?;
        let id = s.bridge_mut().new_box_shape(body, width, height, radius)?;
        Ok(Shape::new(id, s.epoch()))
    })?)
}

#[wasm_bindgen]
pub fn new_segment_shape(
    body: &Body,
    ax: f32,
    ay: f32,
    bx: f32,
    by: f32,
    thickness: Option<f32>,
) -> Result<Shape, JsValue> {
    let thickness = thickness.unwrap_or(0.0);
    Ok(with_bridge(|s| {
        let body = s.live(body)?;
        let id = s
            .bridge_mut()
            .new_segment_shape(body, Vec2::new(ax, ay), Vec2::new(bx, by), thickness)?;
        Ok(Shape::new(id, s.epoch()))
    })?)
}

#[allow(clippy::too_many_arguments)]
#[wasm_bindgen]
pub fn new_damped_spring(
    body_a: &Body,
    body_b: &Body,
    anchor_ax: f32,
    anchor_ay: f32,
    anchor_bx: f32,
    anchor_by: f32,
    rest_length: f32,
    stiffness: f32,
    damping: f32,
) -> Result<Constraint, JsValue> {
    Ok(with_bridge(|s| {
        let (a, b) = (s.live(body_a)?, s.live(body_b)?);
        let id = s.bridge_mut().new_damped_spring(
            a,
            b,
            Vec2::new(anchor_ax, anchor_ay),
            Vec2::new(anchor_bx, anchor_by),
            rest_length,
            stiffness,
            damping,
        )?;
        Ok(Constraint::new(id, s.epoch()))
    })?)
}

#[allow(clippy::too_many_arguments)]
#[wasm_bindgen]
pub fn new_slide_joint(
    body_a: &Body,
    body_b: &Body,
    anchor_ax: f32,
    anchor_ay: f32,
    anchor_bx: f32,
    anchor_by: f32,
    min: f32,
    max: f32,
) -> Result<Constraint, JsValue> {
    Ok(with_bridge(|s| {
        let (a, b) = (s.live(body_a)?, s.live(body_b)?);
        let id = s.bridge_mut().new_slide_joint(
            a,
            b,
            Vec2::new(anchor_ax, anchor_ay),
            Vec2::new(anchor_bx, anchor_by),
            min,
            max,
        )?;
        Ok(Constraint::new(id, s.epoch()))
    })?)
}

// ---- Attach and step ----

#[wasm_bindgen]
pub fn add_body(space: &Space, body: &Body) -> Result<(), JsValue> {
    Ok(with_bridge(|s| {
        let (space, body) = (s.live(space)?, s.live(body)?);
        s.bridge_mut().add_body(space, body)
    })?)
}

#[wasm_bindgen]
pub fn add_shape(space: &Space, shape: &Shape) -> Result<(), JsValue> {
    Ok(with_bridge(|s| {
        let (space, shape) = (s.live(space)?, s.live(shape)?);
        s.bridge_mut().add_shape(space, shape)
    })?)
}

#[wasm_bindgen]
pub fn add_constraint(space: &Space, constraint: &Constraint) -> Result<(), JsValue> {
    Ok(with_bridge(|s| {
        let (space, constraint) = (s.live(space)?, s.live(constraint)?);
        s.bridge_mut().add_constraint(space, constraint)
    })?)
}

#[wasm_bindgen]
pub fn space_step(space: &Space, dt: f32) -> Result<(), JsValue> {
    Ok(with_bridge(|s| {
        let space = s.live(space)?;
        s.bridge_mut().step(space, dt)
    })?)
}

// ---- Properties ----

#[wasm_bindgen]
pub fn set_shape_friction(shape: &Shape, friction: f32) -> Result<(), JsValue> {
    Ok(with_bridge(|s| {
        let shape = s.live(shape)?;
        s.bridge_mut().set_shape_friction(shape, friction)
    })?)
}

#[wasm_bindgen]
pub fn set_shape_elasticity(shape: &Shape, elasticity: f32) -> Result<(), JsValue> {
    Ok(with_bridge(|s| {
        let shape = s.live(shape)?;
        s.bridge_mut().set_shape_elasticity(shape, elasticity)
    })?)
}

#[wasm_bindgen]
pub fn set_body_position(body: &Body, x: f32, y: f32) -> Result<(), JsValue> {
    Ok(with_bridge(|s| {
        let body = s.live(body)?;
        s.bridge_mut().set_body_position(body, Vec2::new(x, y))
    })?)
}

/// `[x, y]`
#[wasm_bindgen]
pub fn get_body_position(body: &Body) -> Result<Array, JsValue> {
    let position = with_bridge(|s| s.bridge().body_position(s.live(body)?))?;
    Ok(pair(position))
}

#[wasm_bindgen]
pub fn get_body_rotation(body: &Body) -> Result<f32, JsValue> {
    Ok(with_bridge(|s| s.bridge().body_rotation(s.live(body)?))?)
}

/// `[vx, vy]`
#[wasm_bindgen]
pub fn get_body_velocity(body: &Body) -> Result<Array, JsValue> {
    let velocity = with_bridge(|s| s.bridge().body_velocity(s.live(body)?))?;
    Ok(pair(velocity))
}

#[wasm_bindgen]
pub fn set_body_velocity(body: &Body, vx: f32, vy: f32) -> Result<(), JsValue> {
    Ok(with_bridge(|s| {
        let body = s.live(body)?;
        s.bridge_mut().set_body_velocity(body, Vec2::new(vx, vy))
    })?)
}
