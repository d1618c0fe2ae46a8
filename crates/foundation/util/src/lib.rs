//! Small utilities without functionality specific to the map editor core, for small
//! Rust-specific tasks shared across the workspace's crates.

// Exports a small macro
mod declare_and_pub_use;
mod inspect_none;
mod lock_or_panic;
mod u64_equals_usize;


pub use self::{
    inspect_none::InspectNone,
    lock_or_panic::LockOrPanic,
    u64_equals_usize::u64_equals_usize,
};
