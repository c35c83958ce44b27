// ABOUTME: Command module aggregator for the dockyard CLI.
// ABOUTME: Re-exports the lifecycle, exec, logs and status command handlers.

mod engine_connection;
mod exec;
mod lifecycle;
mod logs;
mod status;

pub use engine_connection::{connect_engine, load_config, load_engine_config};
pub use exec::exec_command;
pub use lifecycle::{down, up};
pub use logs::logs;
pub use status::{info, ps};
