//! Terminal output and host checks shared by both binaries.

pub mod output;
pub mod privilege;
