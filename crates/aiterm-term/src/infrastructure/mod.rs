//! Infrastructure layer providing external integrations.
//!
//! This module contains implementations for the model backends the session
//! talks to.

pub mod clients;
