use crate::api::config::BridgeConfig;
use crate::api::error::{BridgeError, ConfigError};
use crate::api::types::{HandleKind, HandleRef};
use crate::bridge::PhysicsBridge;
use crate::core::time::StepClock;
use crate::script::{FunctionTable, Value};

/// Finalizer and debug-string hooks for one handle kind.
#[derive(Clone, Copy)]
pub struct KindBinding {
    pub kind: HandleKind,
    /// Run when the host collects a wrapper of this kind.
    pub finalize: fn(&mut PhysicsBridge, HandleRef) -> Result<(), BridgeError>,
    /// Backs the host's `tostring` for this kind.
    pub describe: fn(&PhysicsBridge, HandleRef) -> Result<&'static str, BridgeError>,
}

impl KindBinding {
    pub fn for_kind(kind: HandleKind) -> Self {
        Self {
            kind,
            finalize: PhysicsBridge::release,
            describe: PhysicsBridge::describe,
        }
    }
}

/// What the scripting runtime offers an extension at registration time.
pub trait ScriptHost {
    /// Register the flat function table under `table.namespace()`.
    fn register_module(&mut self, table: &FunctionTable);

    /// Register the object type for one handle kind.
    fn register_kind(&mut self, binding: KindBinding);
}

/// Engine lifecycle callbacks. Everything except `instance_init` defaults
/// to doing nothing.
pub trait Extension {
    fn app_init(&mut self) -> Result<(), BridgeError> {
        Ok(())
    }

    fn app_final(&mut self) -> Result<(), BridgeError> {
        Ok(())
    }

    /// Called when a script instance starts; registers the script surface.
    fn instance_init(&mut self, host: &mut dyn ScriptHost) -> Result<(), BridgeError>;

    fn instance_final(&mut self) -> Result<(), BridgeError> {
        Ok(())
    }

    /// Per-frame tick with the elapsed frame time in seconds.
    fn update(&mut self, _dt: f32) -> Result<(), BridgeError> {
        Ok(())
    }
}

/// The physics extension: one bridge, one function table.
pub struct PhysicsExtension {
    bridge: PhysicsBridge,
    table: FunctionTable,
    clock: StepClock,
    registered: bool,
}

impl PhysicsExtension {
    /// Build the extension, refusing a config the step clock cannot run.
    pub fn new(config: BridgeConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: BridgeConfig) -> Self {
        let table = FunctionTable::new(config.namespace.clone());
        let clock = StepClock::new(config.fixed_dt);
        Self {
            bridge: PhysicsBridge::new(config),
            table,
            clock,
            registered: false,
        }
    }

    pub fn bridge(&self) -> &PhysicsBridge {
        &self.bridge
    }

    pub fn bridge_mut(&mut self) -> &mut PhysicsBridge {
        &mut self.bridge
    }

    pub fn table(&self) -> &FunctionTable {
        &self.table
    }

    pub fn is_registered(&self) -> bool {
        self.registered
    }

    /// Run one script call by name.
    pub fn call(&mut self, name: &str, args: &[Value]) -> Result<Vec<Value>, BridgeError> {
        self.table.call(&mut self.bridge, name, args)
    }

    /// Host finalizer entry point.
    pub fn finalize(&mut self, handle: HandleRef) -> Result<(), BridgeError> {
        self.bridge.release(handle)
    }
}

impl Default for PhysicsExtension {
    fn default() -> Self {
        Self::build(BridgeConfig::default())
    }
}

impl Extension for PhysicsExtension {
    fn instance_init(&mut self, host: &mut dyn ScriptHost) -> Result<(), BridgeError> {
        if self.registered {
            log::debug!("'{}' already registered", self.table.namespace());
            return Ok(());
        }
        host.register_module(&self.table);
        for kind in HandleKind::ALL {
            host.register_kind(KindBinding::for_kind(kind));
        }
        self.registered = true;
        log::info!(
            "registered '{}' ({} functions, {} handle kinds)",
            self.table.namespace(),
            self.table.functions().len(),
            HandleKind::ALL.len()
        );
        Ok(())
    }

    fn instance_final(&mut self) -> Result<(), BridgeError> {
        self.clock.reset();
        Ok(())
    }

    fn update(&mut self, dt: f32) -> Result<(), BridgeError> {
        if !self.bridge.config().auto_step {
            return Ok(());
        }
        let steps = self.clock.advance(dt);
        for _ in 0..steps {
            self.bridge.step_all(self.clock.dt())?;
        }
        Ok(())
    }
}
