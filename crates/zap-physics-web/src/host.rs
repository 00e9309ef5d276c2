use std::cell::{Cell, RefCell};

use thiserror::Error;
use wasm_bindgen::prelude::*;
use zap_physics::{
    BridgeError, Extension, FunctionTable, HandleKind, HandleRef, Key, KindBinding,
    PhysicsBridge, PhysicsExtension, ScriptHost, UsageError, Value,
};

use crate::handles::Wrapper;

/// Registration record kept by the JS host: the namespace and function
/// names scripts call through `physics_call`, plus one binding per kind.
#[derive(Default)]
pub struct WebHost {
    namespace: String,
    functions: Vec<&'static str>,
    bindings: Vec<KindBinding>,
}

impl WebHost {
    /// Registered functions as `namespace.name`.
    pub fn qualified_names(&self) -> Vec<String> {
        self.functions
            .iter()
            .map(|name| format!("{}.{}", self.namespace, name))
            .collect()
    }

    pub fn kinds(&self) -> impl Iterator<Item = HandleKind> + '_ {
        self.bindings.iter().map(|binding| binding.kind)
    }

    pub fn binding(&self, kind: HandleKind) -> KindBinding {
        self.bindings
            .iter()
            .copied()
            .find(|binding| binding.kind == kind)
            .unwrap_or_else(|| KindBinding::for_kind(kind))
    }

    /// Strip the registered namespace off `namespace.name`.
    fn local_name<'a>(&self, qualified: &'a str) -> Option<&'a str> {
        qualified
            .strip_prefix(self.namespace.as_str())?
            .strip_prefix('.')
            .filter(|name| self.functions.iter().any(|f| f == name))
    }
}

impl ScriptHost for WebHost {
    fn register_module(&mut self, table: &FunctionTable) {
        self.namespace = table.namespace().to_string();
        self.functions = table.names().collect();
        log::debug!("module '{}': {:?}", self.namespace, self.functions);
    }

    fn register_kind(&mut self, binding: KindBinding) {
        log::debug!("handle kind {}", binding.kind.label());
        self.bindings.push(binding);
    }
}

/// A handle as JS hands it back to `physics_call`: the wrapper's `kind`,
/// `slot`, `generation` and `epoch` properties.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HandleToken {
    pub kind: HandleKind,
    pub key: Key,
    pub epoch: u32,
}

/// One `physics_call` argument after conversion from JS.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CallArg {
    Value(Value),
    Handle(HandleToken),
}

/// Failures at the JS boundary.
#[derive(Debug, Error)]
pub enum HostError {
    #[error("physics not initialized. Call physics_init() first.")]
    NotInitialized,
    #[error("physics session is busy")]
    Busy,
    #[error(transparent)]
    Bridge(#[from] BridgeError),
}

impl From<HostError> for JsValue {
    fn from(err: HostError) -> Self {
        log::warn!("{}", err);
        JsValue::from_str(&err.to_string())
    }
}

/// Everything one page session holds.
///
/// Slot tables restart empty in every session, so each installed session
/// gets a fresh epoch. Wrappers carry the epoch they were created in and
/// are treated as stale once it no longer matches.
pub struct Session {
    pub extension: PhysicsExtension,
    pub host: WebHost,
    epoch: u32,
}

impl Session {
    /// Run the extension's startup hooks against a fresh `WebHost`.
    pub fn start(mut extension: PhysicsExtension) -> Result<Self, BridgeError> {
        let mut host = WebHost::default();
        extension.app_init()?;
        extension.instance_init(&mut host)?;
        Ok(Self {
            extension,
            host,
            epoch: 0,
        })
    }

    pub fn epoch(&self) -> u32 {
        self.epoch
    }

    pub fn bridge(&self) -> &PhysicsBridge {
        self.extension.bridge()
    }

    pub fn bridge_mut(&mut self) -> &mut PhysicsBridge {
        self.extension.bridge_mut()
    }

    /// Id behind a wrapper, if the wrapper belongs to this session.
    pub fn live<W: Wrapper>(&self, wrapper: &W) -> Result<W::Id, BridgeError> {
        self.check_epoch(wrapper.epoch(), wrapper.handle().kind())?;
        Ok(wrapper.id())
    }

    pub fn resolve(&self, token: HandleToken) -> Result<HandleRef, BridgeError> {
        self.check_epoch(token.epoch, token.kind)?;
        Ok(HandleRef::from_key(token.kind, token.key))
    }

    fn check_epoch(&self, epoch: u32, kind: HandleKind) -> Result<(), BridgeError> {
        if epoch == self.epoch {
            Ok(())
        } else {
            Err(UsageError::StaleHandle { kind }.into())
        }
    }

    /// Run `namespace.name` from the function table.
    pub fn call(&mut self, qualified: &str, args: &[CallArg]) -> Result<Vec<Value>, BridgeError> {
        let name = self
            .host
            .local_name(qualified)
            .ok_or_else(|| UsageError::UnknownFunction(qualified.to_string()))?;
        let values = args
            .iter()
            .map(|arg| match *arg {
                CallArg::Value(value) => Ok(value),
                CallArg::Handle(token) => self.resolve(token).map(Value::Handle),
            })
            .collect::<Result<Vec<_>, _>>()?;
        self.extension.call(name, &values)
    }

    /// Release through the kind's registered finalizer.
    pub fn finalize(&mut self, handle: HandleRef) -> Result<(), BridgeError> {
        let binding = self.host.binding(handle.kind());
        (binding.finalize)(self.bridge_mut(), handle)
    }

    pub fn describe(&self, handle: HandleRef) -> Result<&'static str, BridgeError> {
        let binding = self.host.binding(handle.kind());
        (binding.describe)(self.bridge(), handle)
    }
}

thread_local! {
    static SESSION: RefCell<Option<Session>> = const { RefCell::new(None) };
    static LAST_EPOCH: Cell<u32> = const { Cell::new(0) };
    /// Releases requested while the session was borrowed.
    static DEFERRED: RefCell<Vec<(HandleRef, u32)>> = const { RefCell::new(Vec::new()) };
}

/// Make `session` current under a new epoch and return that epoch.
pub fn install(mut session: Session) -> u32 {
    let epoch = LAST_EPOCH.with(|last| {
        let next = last.get().wrapping_add(1);
        last.set(next);
        next
    });
    session.epoch = epoch;
    SESSION.with(|cell| {
        *cell.borrow_mut() = Some(session);
    });
    epoch
}

pub fn uninstall() -> Option<Session> {
    SESSION.with(|cell| cell.borrow_mut().take())
}

/// Run `f` against the live session, or fail if `physics_init` has not run.
/// Releases deferred while the session was busy are applied first.
pub fn with_session<R>(f: impl FnOnce(&mut Session) -> R) -> Result<R, HostError> {
    SESSION.with(|cell| {
        let mut borrow = cell.try_borrow_mut().map_err(|_| HostError::Busy)?;
        let session = borrow.as_mut().ok_or(HostError::NotInitialized)?;
        release_deferred(session);
        Ok(f(session))
    })
}

/// Run a bridge operation against the live session.
pub fn with_bridge<R>(
    f: impl FnOnce(&mut Session) -> Result<R, BridgeError>,
) -> Result<R, HostError> {
    Ok(with_session(f)??)
}

fn release_deferred(session: &mut Session) {
    let deferred = DEFERRED.with(|queue| queue.take());
    for (handle, epoch) in deferred {
        if epoch != session.epoch {
            continue;
        }
        if let Err(err) = session.finalize(handle) {
            log::warn!("deferred release of {:?} failed: {}", handle, err);
        }
    }
}

/// Release a handle from a wrapper's `Drop`. Never panics.
///
/// With no session there is nothing left to release. While the session is
/// borrowed (JS freeing a wrapper from inside a call) the release is queued
/// for the next call. A wrapper from an earlier session is stale.
pub fn finalize(handle: HandleRef, epoch: u32) -> Result<(), HostError> {
    let result = SESSION.try_with(|cell| match cell.try_borrow_mut() {
        Ok(mut borrow) => match borrow.as_mut() {
            Some(session) => {
                session.check_epoch(epoch, handle.kind())?;
                Ok(session.finalize(handle)?)
            }
            None => Ok(()),
        },
        Err(_) => {
            let _ = DEFERRED.try_with(|queue| queue.borrow_mut().push((handle, epoch)));
            Ok(())
        }
    });
    // Thread-local storage already torn down.
    result.unwrap_or(Ok(()))
}

/// Debug string for a wrapper's `toString`.
pub fn describe(handle: HandleRef, epoch: u32) -> String {
    with_session(|session| {
        session.check_epoch(epoch, handle.kind())?;
        session.describe(handle)
    })
    .ok()
    .and_then(Result::ok)
    .unwrap_or("[released]")
    .to_string()
}
