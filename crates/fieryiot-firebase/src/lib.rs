// Firebase Client Implementation
//
// This crate talks to the two Firebase services the gateway depends on:
// - Authentication (Identity Toolkit + Secure Token APIs): implements IdentityProvider
// - Realtime Database REST API: implements EventDatabase

mod auth;
mod config;
mod database;
mod push_id;
mod types;

pub use auth::FirebaseAuth;
pub use config::{FirebaseConfig, FirebaseError};
pub use database::RealtimeDatabase;
pub use push_id::PushIdGenerator;
