//! Pokemon battle helper service.
//!
//! Keeps the owned collection in a realtime database and asks a generative
//! model which owned pokemon to send out against a wild one.

pub mod config;
pub mod handlers;
pub mod models;
pub mod services;
pub mod startup;
