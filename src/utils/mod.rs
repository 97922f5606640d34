//! Configuration utilities.
//!
//! All three services read the same environment (optionally seeded from a
//! `.env` file); see [`config::Config`].

pub mod config;
