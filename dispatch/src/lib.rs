#![deny(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]

// lets `#[derive(SlotLayout)]` refer to `::dispatch` from inside this crate too
extern crate self as dispatch;

mod errors;

pub mod allocation;
pub mod demo;
pub mod identifier;
pub mod person;
pub mod registry;
pub mod student;
pub mod vtable;

pub use errors::Error;
