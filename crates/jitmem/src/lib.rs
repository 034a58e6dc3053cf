//! Memory regions that can hold and run generated machine code.
//!
//! A region moves through one permission cycle: it is mapped, written to,
//! made executable, called, and unmapped. It is never writable and
//! executable at the same time.
//!
//! There are two layers here. [MappedRegion], [WritableRegion] and
//! [ExecutableRegion] encode the permission states as separate types, so
//! most misuse is a compile error. [CodeBuffer] wraps them in a single
//! value that tracks its state at runtime, for callers that need to hold
//! "a buffer" across the whole cycle and want misuse reported as
//! [MappingError::InvalidStateTransition].

mod code_buffer;
mod entry_point;
mod error;
mod executable_region;
mod mapped_region;
mod writable_region;

pub mod examples;

pub use crate::code_buffer::{BufferState, CodeBuffer};
pub use crate::entry_point::{Callable, EntryPoint};
pub use crate::error::{MappingError, Result};
pub use crate::executable_region::ExecutableRegion;
pub use crate::mapped_region::{page_size, MappedRegion};
pub use crate::writable_region::WritableRegion;
