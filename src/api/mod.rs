//! HTTP routes for the Palisade demo server

pub mod health;
