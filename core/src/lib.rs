//! Proxy-agnostic intermediate representation of gateway routing.
//!
//! The translator lowers Gateway API routes into these types; a downstream
//! component lowers them further into the data plane's native configuration.
//! Nothing in this crate knows about Kubernetes.

#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

pub mod ir;
