// Library surface for headless/integration tests and reuse.
// Terminal rendering stays in the binary.
pub mod app_dirs;
pub mod autoplay;
pub mod config;
pub mod error;
pub mod layout;
pub mod runtime;
pub mod scheduler;
pub mod sequencer;
pub mod session;
pub mod target;
pub mod util;

pub use error::GameError;
pub use session::{Attempt, Game, GameConfig, Ignored, Status};
