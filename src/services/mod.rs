// src/services/mod.rs
// DOCUMENTATION: Services module organization
// PURPOSE: Re-export service components

pub mod api_client;
pub mod session;

pub use api_client::*;
pub use session::*;
