//! Shared fixtures for integration tests: a mockito server, a scripted
//! transport double and service model documents.

#![allow(dead_code)]

pub mod fixtures;
pub mod mock_server;
pub mod scripted;
