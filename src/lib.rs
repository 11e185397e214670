//! Interactive workflow for building, proving and dispatching private-pool
//! transactions.
//!
//! The [`workflow`] module holds the state machine. Everything it talks to
//! (prompts, chain, prover, broadcasters, key-chain) sits behind the traits
//! in [`api`].

pub mod api;
pub mod config_models;
pub mod mock_services;
pub mod models;
pub mod state;
pub mod workflow;
