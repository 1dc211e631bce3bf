//! Run-scoped sink coordination
//!
//! The [`Coordinator`] binds a [`crate::sink::RotatingFileSink`] into the root
//! and run hierarchies and re-binds it whenever the current run changes:
//! - **Lazy:** nothing is created until a run identity is first observed
//! - **Replace, never append twice:** its own slot is found by tag
//! - **Pure decisions:** [`next_state`] decides when to re-initialize

mod core;
mod error;
mod request;
mod state;

pub use self::core::Coordinator;
pub use error::CoordinatorError;
pub use request::{InitReport, ReconfigureRequest};
pub use state::{BindState, Transition, next_state};
