//! Gantry — Procore SDK authentication core for Rust
//!
//! Hand-written core of a Procore API client: OAuth2 authorization-code
//! flow with PKCE, a refresh-capable token manager with pluggable storage,
//! and a Bearer-injecting HTTP client for the REST surface.
//!
//! # Quick Start
//!
//! ```no_run
//! use gantry::prelude::*;
//!
//! # async fn example() -> gantry::error::Result<()> {
//! let options = AuthOptions::from_env()?;
//! let flow = OAuthFlow::new(options)?;
//! let session = flow.authorization_url(None);
//! println!("Visit: {}", session.authorize_url);
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod logging;
pub mod prelude;
pub mod util;

#[cfg(feature = "cli")]
pub mod cli;
