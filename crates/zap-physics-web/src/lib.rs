//! JavaScript host for `zap-physics`.
//!
//! JS drives the lifecycle through the `physics_*` exports and calls the
//! function table through `physics_call` or the typed shortcuts in [`api`].
//! Handles come back as wrapper objects; freeing one releases its handle in
//! the bridge.

pub mod api;
pub mod handles;
pub mod host;

use js_sys::Array;
use wasm_bindgen::prelude::*;
use zap_physics::{BridgeConfig, Extension, PhysicsExtension};

use crate::host::{with_bridge, with_session, HostError, Session};

#[wasm_bindgen]
pub fn physics_app_init() {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Info);
}

/// Start a session. `config_json` is an optional `BridgeConfig` JSON blob.
#[wasm_bindgen]
pub fn physics_init(config_json: Option<String>) -> Result<(), JsValue> {
    physics_app_init();

    let invalid = |err: zap_physics::ConfigError| {
        JsValue::from_str(&format!("invalid physics config: {}", err))
    };
    let config = match config_json.as_deref() {
        Some(json) => BridgeConfig::from_json(json).map_err(invalid)?,
        None => BridgeConfig::default(),
    };
    let extension = PhysicsExtension::new(config).map_err(invalid)?;
    let session = Session::start(extension).map_err(HostError::from)?;

    let epoch = host::install(session);
    log::info!("physics: initialized (session {})", epoch);
    Ok(())
}

/// Per-frame tick. Steps spaces only when `auto_step` is configured.
#[wasm_bindgen]
pub fn physics_update(dt: f32) -> Result<(), JsValue> {
    Ok(with_bridge(|session| session.extension.update(dt))?)
}

#[wasm_bindgen]
pub fn physics_final() -> Result<(), JsValue> {
    Ok(with_bridge(|session| session.extension.instance_final())?)
}

/// Tear the session down. Wrappers still alive in JS become stale: calls
/// with them fail, and freeing them releases nothing.
#[wasm_bindgen]
pub fn physics_app_final() -> Result<(), JsValue> {
    if let Some(mut session) = host::uninstall() {
        session.extension.app_final().map_err(HostError::from)?;
        log::info!("physics: finalized");
    }
    Ok(())
}

/// Registered function names, `namespace.name`, as `physics_call` takes them.
#[wasm_bindgen]
pub fn physics_functions() -> Result<Array, JsValue> {
    Ok(with_session(|session| {
        session
            .host
            .qualified_names()
            .into_iter()
            .map(JsValue::from)
            .collect::<Array>()
    })?)
}

/// Live handle count per kind, in `space, body, shape, constraint` order.
#[wasm_bindgen]
pub fn physics_counts() -> Result<Array, JsValue> {
    Ok(with_session(|session| {
        session
            .host
            .kinds()
            .map(|kind| JsValue::from(session.bridge().count(kind) as u32))
            .collect::<Array>()
    })?)
}
