//! Some abstractions over wgpu.

#![allow(dead_code)]

pub mod context;
pub mod teardown;
