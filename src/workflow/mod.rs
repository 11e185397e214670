//! The transaction-building workflow: a state machine over an immutable
//! [`context::WorkflowContext`], and the step components it drives.

pub mod approval;
pub mod consolidate;
pub mod context;
pub mod controller;
pub mod dispatcher;
pub mod error;
pub mod fee_resolver;
pub mod flags;
pub mod menu;
pub mod proof_builder;

pub use controller::Outcome;
pub use controller::TransactionWorkflow;
pub use controller::Transition;
