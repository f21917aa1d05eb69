//! Python bindings for wealthmc.

pub mod bindings;
pub mod numpy_bridge;
