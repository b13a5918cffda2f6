//! Tripico Load Harness Library
//!
//! Credential caching against the identity provider, the weighted workload
//! profiles for the itinerary platform, and the seeding/cleanup routines.
//! The `loadtest` binary drives everything from the command line.

pub mod auth;
pub mod cleanup;
pub mod clock;
pub mod config;
pub mod data;
pub mod error;
pub mod http;
pub mod pool;
pub mod runner;
pub mod seed;
pub mod stats;
pub mod weighted;
pub mod workload;

pub use error::{AuthError, CallError, ProfileError};
