//! Error surface for this crate. Everything that can actually fail does so
//! at compile time (a budget too small for even `V0` is unreachable, since
//! `V0`'s floor is always `0`) — this enum exists for the one genuinely
//! runtime-fallible corner: [`crate::str::Str`]'s length check.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    #[error("string literal of {len} bytes exceeds the obfuscated buffer capacity of {capacity}")]
    StringTooLong { len: usize, capacity: usize },
}
