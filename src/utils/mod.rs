//! Helpers shared by the evaluation kernels.

pub mod thread;
