//! Shared utilities for the Gym Manager backend.
//!
//! This crate provides functionality used across the other crates:
//! - JWT token issuing and validation
//! - Password hashing with Argon2id
//! - Offset pagination helpers
//! - Common validation logic

pub mod jwt;
pub mod pagination;
pub mod password;
pub mod validation;
