pub mod logging;
pub mod simulated_session;
