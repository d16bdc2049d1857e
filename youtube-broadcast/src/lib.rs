//! Lifecycle management for YouTube live broadcasts.
//!
//! The pieces, from the outside in:
//!
//! - [`config`] loads and validates the operator's JSON configuration and writes it back once a
//!   broadcast id has to be remembered.
//! - [`credentials`] keeps one cached OAuth credential usable across unattended runs, using the
//!   flows in [`oauth`].
//! - [`orchestrator`] runs each command as a fixed sequence of calls against
//!   [`youtube_api::LiveStreamingApi`].

pub mod config;
pub mod credentials;
pub mod error;
pub mod oauth;
pub mod orchestrator;
pub mod youtube_api;

pub use error::{AuthError, Error, Precondition, RemoteOperation};
