//! Background jobs processed by `jobs work`.

mod notification_email;

pub use notification_email::{notification_email_handler, NotificationEmailJob};
