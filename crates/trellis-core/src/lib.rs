pub mod config;
pub mod error;
pub mod event;
pub mod message;
pub mod state;
pub mod traits;
pub mod types;

pub use config::EngineConfig;
pub use error::{Result, TrellisError, ValidationRule};
pub use event::{EventBus, RunEvent};
pub use message::{Author, Message};
pub use state::{PartialResult, State};
pub use traits::{ActionCapability, DecisionCapability};
pub use types::*;
