//! The workflow's data model.

pub mod address;
pub mod amount;
pub mod approval;
pub mod fee;
pub mod intent;
pub mod proven_transaction;
pub mod secret;
pub mod selection;
