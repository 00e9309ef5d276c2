//! Script calling convention: values, argument checking and the flat
//! function table a host registers under one namespace.

pub mod module;
pub mod value;

pub use module::{FunctionTable, NativeFn, NativeFunction, MODULE_FUNCTIONS};
pub use value::{Args, Value};
