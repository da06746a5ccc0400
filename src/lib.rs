//! Compile-time obfuscation of integer variables, integer literals, and
//! short string literals.
//!
//! ```
//! use obf::obf_int;
//!
//! let hidden: u32 = obf_int!(u32; 0xDEAD_BEEF).get();
//! assert_eq!(hidden, 0xDEAD_BEEF);
//! ```
//!
//! Three macros cover the three things this crate knows how to hide:
//!
//! - [`obf_var!`] wraps a local variable. Its on-the-wire form never
//!   equals the plaintext, and `.get()`/`.set()` read and write it like a
//!   normal value.
//! - [`obf_int!`] wraps an integer literal. The obfuscated form is baked
//!   into the binary at compile time; `.get()` reconstructs the original.
//! - [`obf_str!`] wraps a short string literal (32 bytes or fewer),
//!   splitting it into independent 32-bit blocks each obfuscated under
//!   its own tree.
//!
//! Every call site gets its own injection tree, seeded from
//! `file!()`/`line!()`/`column!()` plus a process-wide `OBF_SEED` (set at
//! build time; see [`obf_core::config`]), so identical literals at
//! different call sites obfuscate differently. Call [`init`] once, early
//! in `main`, before relying on the `anti-debug` feature's context.
#![cfg_attr(not(feature = "std"), no_std)]

pub use obf_core;
pub use obf_macros::{obf_int, obf_str, obf_var};
pub use obf_types::{self, Error, Literal, Str, Unsigned, Variable};

/// Primes whatever process-wide state the enabled contexts need before
/// the first obfuscated value is constructed.
///
/// With the `anti-debug` feature, this takes one reading of the debugger
/// probe so its first real use isn't paying for a cold `/proc` read on
/// the hot path; without that feature it's a no-op. Safe to call more
/// than once.
pub fn init() {
    tracing::debug!("obf: initializing");
    #[cfg(feature = "anti-debug")]
    {
        let _ = obf_types::probe::being_debugged();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn macros_are_reachable_through_the_facade() {
        let mut v = obf_var!(10u32);
        v.set(v.get() + 1);
        assert_eq!(v.get(), 11);

        let lit = obf_int!(u32; 99);
        assert_eq!(lit.get(), 99);

        let s = obf_str!("hi");
        assert_eq!(&s.get(), b"hi");
    }

    #[test]
    fn init_is_idempotent() {
        init();
        init();
    }
}
