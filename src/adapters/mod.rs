// Adapters layer: concrete implementations of the domain ports (sheet API,
// mail service, asset host) plus in-memory fakes for tests and offline runs.

pub mod assets;
pub mod memory;
pub mod notify;
pub mod sheet;
