//! Mutation pipelines for HP, major status, stat stages and switching.
//!
//! Each handler is a short-lived view over `Logic`. A call runs the matching
//! prevention band, commits the change if nothing vetoed it, then fires the
//! post-mutation notifications.

pub mod damage;
pub mod stat_change;
pub mod status;
pub mod switch;

pub use damage::{DamageHandler, DamageOutcome};
pub use stat_change::StatChangeHandler;
pub use status::StatusHandler;
pub use switch::SwitchHandler;
