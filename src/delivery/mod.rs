//! Email delivery lifecycle.
//!
//! `EmailDispatcher` ties the record store, the template store and the
//! mailer together:
//!
//! ```text
//! request -> validate -> (resolve + render template) -> insert queued
//!         -> transport (bounded) -> sent | failed
//! ```

mod dispatcher;
mod error;

pub use dispatcher::{
    BodyFormat, DeliveryReceipt, DispatcherStats, DispatcherStatsSnapshot, EmailDispatcher,
    TemplateSend,
};
pub use error::{template_error_code, DispatchError};
