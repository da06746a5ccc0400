//! Call-site macros for `obf`: `obf_var!`, `obf_int!`, `obf_str!`.
//!
//! These are declarative macros, not proc-macros — there's no AST to
//! rewrite, only a `SEED`/`CYCLES` pair to compute from the call site's
//! `file!()`/`line!()`/`column!()` and splice into a `Variable`/`Literal`/
//! `Str` instantiation. `column!()` plays the role the original design's
//! translation-unit counter played: disambiguating more than one call on
//! the same line.
#![no_std]

#[doc(hidden)]
pub use obf_core as __core;
#[doc(hidden)]
pub use obf_types as __types;

/// Default tier (spec.md §6) used when a macro call doesn't name one
/// explicitly. `3` sits in the middle of the `0..=6` range.
#[doc(hidden)]
pub const DEFAULT_VAR_TIER: u32 = 3;
#[doc(hidden)]
pub const DEFAULT_LITERAL_TIER: u32 = 5;

/// Wraps a value in an obfuscated in-memory [`obf_types::Variable`].
///
/// ```ignore
/// let mut x = obf_var!(41u32);
/// x.set(x.get() + 1);
/// assert_eq!(x.get(), 42);
/// ```
#[macro_export]
macro_rules! obf_var {
    ($val:expr) => {
        $crate::obf_var!($val, tier = $crate::DEFAULT_VAR_TIER)
    };
    ($val:expr, tier = $tier:expr) => {{
        const __OBF_SEED: u64 = $crate::__core::prng::seed_from_site(
            $crate::__core::config::GLOBAL_SEED,
            file!(),
            line!(),
            column!(),
        );
        const __OBF_CYCLES: i32 = $crate::__core::tier::tier_cycles($tier);
        $crate::__types::Variable::<_, __OBF_SEED, __OBF_CYCLES>::new($val)
    }};
}

/// Wraps an integer literal in an obfuscated [`obf_types::Literal`]. The
/// type is inferred from how the result is used; `obf_int!(T; value)`
/// names it explicitly when that isn't possible.
///
/// ```ignore
/// let hidden: u32 = obf_int!(0xDEAD_BEEFu32).get();
/// ```
#[macro_export]
macro_rules! obf_int {
    ($val:expr) => {
        $crate::obf_int!($val, tier = $crate::DEFAULT_LITERAL_TIER)
    };
    ($val:expr, tier = $tier:expr) => {{
        const __OBF_SEED: u64 = $crate::__core::prng::seed_from_site(
            $crate::__core::config::GLOBAL_SEED,
            file!(),
            line!(),
            column!(),
        );
        const __OBF_CYCLES: i32 = $crate::__core::tier::tier_cycles($tier);
        const __OBF_VALUE: u64 = ($val) as u64;
        $crate::__types::Literal::<_, __OBF_VALUE, __OBF_SEED, __OBF_CYCLES>::new()
    }};
    ($ty:ty; $val:expr) => {
        $crate::obf_int!($ty; $val, tier = $crate::DEFAULT_LITERAL_TIER)
    };
    ($ty:ty; $val:expr, tier = $tier:expr) => {{
        const __OBF_SEED: u64 = $crate::__core::prng::seed_from_site(
            $crate::__core::config::GLOBAL_SEED,
            file!(),
            line!(),
            column!(),
        );
        const __OBF_CYCLES: i32 = $crate::__core::tier::tier_cycles($tier);
        const __OBF_VALUE: u64 = ($val) as u64;
        $crate::__types::Literal::<$ty, __OBF_VALUE, __OBF_SEED, __OBF_CYCLES>::new()
    }};
}

/// Wraps a short string literal in an obfuscated [`obf_types::Str`]. The
/// buffer is sized to the literal's own length.
///
/// ```ignore
/// let greeting = obf_str!("hello, world");
/// assert_eq!(greeting.as_string().unwrap(), "hello, world");
/// ```
#[macro_export]
macro_rules! obf_str {
    ($lit:expr) => {
        $crate::obf_str!($lit, tier = $crate::DEFAULT_LITERAL_TIER)
    };
    ($lit:expr, tier = $tier:expr) => {{
        const __OBF_PLAIN: &str = $lit;
        const __OBF_N: usize = __OBF_PLAIN.len();
        const __OBF_BLOCKS: usize = $crate::__types::str::block_count(__OBF_N);
        const __OBF_SEED: u64 = $crate::__core::prng::seed_from_site(
            $crate::__core::config::GLOBAL_SEED,
            file!(),
            line!(),
            column!(),
        );
        const __OBF_CYCLES: i32 = $crate::__core::tier::tier_cycles($tier);
        const __OBF_PLAIN_BYTES: [u8; __OBF_N] = $crate::__types::str::bytes_from_str::<__OBF_N>(__OBF_PLAIN);
        const __OBF_STORED: [u32; __OBF_BLOCKS] = $crate::__types::Str::<
            __OBF_N,
            __OBF_BLOCKS,
            __OBF_SEED,
            __OBF_CYCLES,
        >::obfuscate(&__OBF_PLAIN_BYTES);
        $crate::__types::Str::<__OBF_N, __OBF_BLOCKS, __OBF_SEED, __OBF_CYCLES>::from_stored(__OBF_STORED)
    }};
}
