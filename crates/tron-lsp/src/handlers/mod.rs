pub mod commands;
mod completion;
pub mod configuration;
mod lifecycle;
mod notifications;
mod symbols;

pub use commands::*;
pub use completion::*;
pub use configuration::*;
pub use lifecycle::*;
pub use notifications::*;
pub use symbols::*;
