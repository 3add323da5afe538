//! Library side of the `transmogrifier` binary.

pub mod logging;
pub mod pipeline;
