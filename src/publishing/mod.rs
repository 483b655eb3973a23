pub mod publisher;
pub mod transport;
pub mod twin;

pub use publisher::TwinPublisher;
pub use transport::{LineTransport, Transport};
pub use twin::{BaseMessage, DeviceTwinUpdate, MsgTwin};
