//! File domain entities.

pub mod descriptor;

pub use descriptor::FileDescriptor;
