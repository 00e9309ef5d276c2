use wasm_bindgen::prelude::*;
use zap_physics::{BodyId, ConstraintId, HandleRef, ShapeId, SpaceId};

use crate::host;

/// Common view of the JS wrapper classes.
pub trait Wrapper {
    type Id: Copy + Into<HandleRef>;

    fn id(&self) -> Self::Id;

    /// Session the wrapper was created in.
    fn epoch(&self) -> u32;

    fn handle(&self) -> HandleRef {
        self.id().into()
    }
}

/// Generate a JS-visible wrapper owning one handle.
///
/// Freeing the wrapper from JS (explicitly, or through the finalization
/// registry) releases the handle through its kind's finalizer. The `kind`,
/// `slot`, `generation` and `epoch` getters let `physics_call` read the
/// handle back from a plain JS value.
macro_rules! handle_wrapper {
    ($(#[$meta:meta])* $name:ident => $id:ty) => {
        $(#[$meta])*
        #[wasm_bindgen]
        pub struct $name {
            id: $id,
            epoch: u32,
        }

        impl $name {
            pub(crate) fn new(id: $id, epoch: u32) -> Self {
                Self { id, epoch }
            }
        }

        impl Wrapper for $name {
            type Id = $id;

            fn id(&self) -> $id {
                self.id
            }

            fn epoch(&self) -> u32 {
                self.epoch
            }
        }

        #[wasm_bindgen]
        impl $name {
            #[wasm_bindgen(getter)]
            pub fn kind(&self) -> String {
                <$id>::KIND.name().to_string()
            }

            #[wasm_bindgen(getter)]
            pub fn slot(&self) -> u32 {
                self.id.key().slot()
            }

            #[wasm_bindgen(getter)]
            pub fn generation(&self) -> u32 {
                self.id.key().generation()
            }

            #[wasm_bindgen(getter = epoch)]
            pub fn session_epoch(&self) -> u32 {
                self.epoch
            }

            #[wasm_bindgen(js_name = toString)]
            pub fn to_js_string(&self) -> String {
                host::describe(self.handle(), self.epoch)
            }
        }

        impl Drop for $name {
            fn drop(&mut self) {
                if let Err(err) = host::finalize(self.handle(), self.epoch) {
                    log::warn!("release of {:?} failed: {}", self.handle(), err);
                }
            }
        }
    };
}

handle_wrapper!(
    /// A simulation space.
    Space => SpaceId
);
handle_wrapper!(
    /// A rigid body.
    Body => BodyId
);
handle_wrapper!(
    /// Collision geometry on a body.
    Shape => ShapeId
);
handle_wrapper!(
    /// A spring or joint between two bodies.
    Constraint => ConstraintId
);

/// Wrap a handle returned from the function table.
pub fn wrap(handle: HandleRef, epoch: u32) -> JsValue {
    match handle {
        HandleRef::Space(id) => Space::new(id, epoch).into(),
        HandleRef::Body(id) => Body::new(id, epoch).into(),
        HandleRef::Shape(id) => Shape::new(id, epoch).into(),
        HandleRef::Constraint(id) => Constraint::new(id, epoch).into(),
    }
}
