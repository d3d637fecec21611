//! Domain types for the Assistant domain

pub mod command;
pub mod entities;
pub mod envelope;
pub mod intent;
pub mod replies;
pub mod role;
