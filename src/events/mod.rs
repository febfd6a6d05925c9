//! Inbound domain events and outbound notifications.

mod domain_event;
mod notification;

pub use domain_event::{DomainEvent, start_of_day};
pub use notification::Notification;
