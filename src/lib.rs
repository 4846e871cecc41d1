pub mod config;
pub mod kernel;
pub mod link;
pub mod node;
pub mod outputs;
pub mod publisher;
pub mod storage;

pub use config::NodeConfig;
pub use kernel::connectivity::ConnectivityStateMachine;
pub use node::{FieldNode, RecordSource, Shutdown};
pub use storage::DurableQueue;
