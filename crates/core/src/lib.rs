//! Core business logic for carmeet.
//!
//! The heart of the crate is [`RelationshipToggle`], a single toggle engine
//! shared by car likes, follows and event attendance. The domain services
//! wrap it with the rules of each relationship kind.

pub mod services;

pub use services::*;
