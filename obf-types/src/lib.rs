//! Typed wrappers around `obf-core`'s engine: [`Variable`], [`Literal`],
//! and [`Str`], plus the runtime state ([`cell::ContextCell`],
//! [`probe::being_debugged`]) their root contexts need. `obf-macros` is
//! the only crate that should need to name these directly — application
//! code goes through its macros instead.
#![cfg_attr(not(feature = "std"), no_std)]

pub mod cell;
pub mod error;
pub mod literal;
pub mod probe;
pub mod str;
pub mod unsigned;
pub mod variable;

pub use error::Error;
pub use literal::Literal;
pub use str::Str;
pub use unsigned::Unsigned;
pub use variable::Variable;
