pub mod bounce;
pub mod callback;
pub mod complaint;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod mail;
pub mod notification;
pub mod payload;
pub mod storage;
pub mod subscription;
pub mod suppression;
pub mod transport;

pub use error::CallbackError;
pub use notification::NotificationType;
pub use payload::Payload;
