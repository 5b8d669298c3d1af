//! Runtime module — process lifecycle: boot and conversion.

pub mod boot;
pub mod convert;
