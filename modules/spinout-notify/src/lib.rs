pub mod dispatcher;
pub mod email;
pub mod error;
pub mod gate;
pub mod payload;
pub mod slack;
pub mod traits;

pub use dispatcher::{DispatchReport, Dispatcher};
pub use email::EmailNotifier;
pub use error::DispatchError;
pub use gate::{should_notify, NotificationGate};
pub use payload::NotificationPayload;
pub use slack::SlackWebhook;
pub use traits::NotifyBackend;
