//! The person aggregate root.
//!
//! Every domain event for one person enters through [`Person::handle`], which
//! resolves the obligation in effect, routes period events to the newest
//! correction of their chain, and returns the resulting notifications.

mod aggregate;

pub use aggregate::Person;
