//! Test module for zrapi-rpc
//!
//! Client behaviour is exercised against in-memory transports:
//! - Envelope construction and reply interpretation
//! - Transport failures and rendezvous recovery
//! - Reply correlation across sequential and shared calls
//! - Diagnostics as a side channel
//! - Remote object introspection
