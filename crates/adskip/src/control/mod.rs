// Control plane: activation protocol, persisted state and the blackhole proxy

pub mod local;
pub mod protocol;
pub mod proxy;
pub mod service;
pub mod store;

pub use local::ActivationFlag;
pub use protocol::{ControlAction, ControlResponse, NO_ACTION, Status, UNKNOWN_ACTION};
pub use proxy::{BlackholeProxy, PacFileProxy};
pub use service::ControlService;
pub use store::{ActivationStore, DEFAULT_ACTIVE, JsonFileStore, MemoryStore};
