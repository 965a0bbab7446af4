// Domain layer: core models and ports (interfaces). No external dependencies
// beyond std/serde/chrono; everything remote lives behind the port traits.

pub mod model;
pub mod ports;
