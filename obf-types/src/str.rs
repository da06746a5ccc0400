//! `Str<N, BLOCKS, SEED, CYCLES>` (spec.md §4.5, "Obfuscated short string
//! literal"): a string literal split into `⌈N/4⌉` independent 32-bit
//! little-endian blocks, each obfuscated under its own injection tree
//! rooted at a forced "zero-context" (`Identity`, never one of the five
//! literal-context variants — a block has no business owning a live
//! mutable cell). Splitting per-block rather than running one shared tree
//! byte-by-byte means two equal bytes in the same literal don't produce
//! the same stored byte, since each block's tree is keyed off its own
//! seed, not the byte value.
//!
//! `N` and `BLOCKS` both come from the literal at the macro call site
//! (`obf_str!("hi")` produces a `Str<2, 1, ..>`); `BLOCKS` must equal
//! `⌈N/4⌉`, and `N` must be at most 32 — both are compile-time-enforced
//! (`CAP_CHECK`), so an over-length literal is ill-formed by construction
//! rather than a runtime `Result`.

use obf_core::{build_plan, config, injection, prng::compile_time_prng, surjection, GlobalConsts, Plan};

use crate::error::Error;

/// The hard cap on a single string literal's length (spec.md §6/§7).
pub const MAX_LEN: usize = 32;

/// `⌈n/4⌉`, the number of 32-bit blocks a literal of length `n` packs into.
pub const fn block_count(n: usize) -> usize {
    (n + 3) / 4
}

pub struct Str<const N: usize, const BLOCKS: usize, const SEED: u64, const CYCLES: i32> {
    stored: [u32; BLOCKS],
}

impl<const N: usize, const BLOCKS: usize, const SEED: u64, const CYCLES: i32> Str<N, BLOCKS, SEED, CYCLES> {
    const GLOBAL_CONSTS: GlobalConsts = GlobalConsts::derive(config::GLOBAL_SEED);
    const ANTI_DEBUG_ENABLED: bool = cfg!(feature = "anti-debug");

    /// Forces `N <= MAX_LEN` and `BLOCKS == block_count(N)` at compile
    /// time; referenced from every constructor so it's evaluated no
    /// matter which path a caller takes.
    const CAP_CHECK: () = {
        assert!(N <= MAX_LEN, "obf_str!: string literal exceeds the 32-byte cap");
        assert!(
            BLOCKS == (N + 3) / 4,
            "obf_str!: BLOCKS does not match ceil(N/4) for this literal"
        );
    };

    const fn block_seed(index: usize) -> u64 {
        compile_time_prng(SEED, (index as u32) + 1)
    }

    /// Each block's own independent tree, forced to the 32-bit zero
    /// context by passing `literal_mode = false` — `build_plan` only
    /// consults the five-way literal context chooser when `literal_mode`
    /// is `true`.
    const fn block_plan(index: usize) -> Plan {
        build_plan(
            Self::block_seed(index),
            32,
            CYCLES,
            false,
            &Self::GLOBAL_CONSTS,
            Self::ANTI_DEBUG_ENABLED,
        )
    }

    /// The byte at logical position `idx` of the padded (`BLOCKS * 4`
    /// bytes) buffer: the literal's own byte when `idx < N`, otherwise a
    /// seed-derived pad byte rather than a fixed `0` (so the padding
    /// itself doesn't leak a recognizable constant pattern).
    const fn byte_at(plain: &[u8; N], idx: usize) -> u8 {
        if idx < N {
            plain[idx]
        } else {
            let s = compile_time_prng(SEED ^ 0x5054_4144_4259_5445, (idx as u32) + 1);
            (s & 0xff) as u8
        }
    }

    const fn pack_block(plain: &[u8; N], block: usize) -> u32 {
        let b0 = Self::byte_at(plain, block * 4) as u32;
        let b1 = Self::byte_at(plain, block * 4 + 1) as u32;
        let b2 = Self::byte_at(plain, block * 4 + 2) as u32;
        let b3 = Self::byte_at(plain, block * 4 + 3) as u32;
        b0 | (b1 << 8) | (b2 << 16) | (b3 << 24)
    }

    /// Obfuscates every block of `plain` under its own tree. `const fn` so
    /// `obf_str!` can bake the stored blocks directly into the binary.
    pub const fn obfuscate(plain: &[u8; N]) -> [u32; BLOCKS] {
        let () = Self::CAP_CHECK;
        let mut out = [0u32; BLOCKS];
        let mut i = 0;
        while i < BLOCKS {
            let raw = Self::pack_block(plain, i) as u64;
            out[i] = if config::DEBUG_PASSTHROUGH {
                raw as u32
            } else {
                injection(&Self::block_plan(i), raw) as u32
            };
            i += 1;
        }
        out
    }

    /// Builds a `Str` from a plaintext buffer, obfuscating it in place.
    pub const fn from_plain(plain: [u8; N]) -> Self {
        Str {
            stored: Self::obfuscate(&plain),
        }
    }

    /// Builds a `Str` from already-obfuscated blocks, skipping the
    /// obfuscation step — what `obf_str!` expands to, since the literal's
    /// blocks are computed once at macro-expansion time via `obfuscate`.
    pub const fn from_stored(stored: [u32; BLOCKS]) -> Self {
        Str { stored }
    }

    /// Alias for [`Self::from_plain`], for callers constructing one
    /// directly rather than through `obf_str!`.
    pub fn new(plain: [u8; N]) -> Self {
        Self::from_plain(plain)
    }

    pub fn get(&self) -> [u8; N] {
        let mut out = [0u8; N];
        let mut i = 0;
        while i < BLOCKS {
            let raw = if config::DEBUG_PASSTHROUGH {
                self.stored[i] as u64
            } else {
                surjection(&Self::block_plan(i), self.stored[i] as u64, 0)
            } as u32;
            let mut k = 0;
            while k < 4 {
                let idx = i * 4 + k;
                if idx < N {
                    out[idx] = ((raw >> (k * 8)) & 0xff) as u8;
                }
                k += 1;
            }
            i += 1;
        }
        out
    }

    #[cfg(feature = "std")]
    pub fn as_string(&self) -> Result<std::string::String, core::str::Utf8Error> {
        let bytes = self.get();
        core::str::from_utf8(&bytes).map(std::string::ToString::to_string)
    }
}

/// Copies a `&str`'s bytes into a fixed-size array. Used by `obf_str!` to
/// turn a string literal into the `[u8; N]` `Str::obfuscate` expects, with
/// `N` inferred from the literal's own length.
pub const fn bytes_from_str<const N: usize>(s: &str) -> [u8; N] {
    let b = s.as_bytes();
    assert!(b.len() == N, "obf_str!: literal length doesn't match N");
    let mut out = [0u8; N];
    let mut i = 0;
    while i < N {
        out[i] = b[i];
        i += 1;
    }
    out
}

/// Validates a runtime-sized payload against a fixed capacity, for
/// callers assembling a zero-padded `Str<CAP, ..>` from a slice whose
/// length isn't known at compile time. `obf_str!`'s own 32-byte cap is
/// enforced separately and at compile time (`Str::CAP_CHECK`); this is
/// for the orthogonal runtime case spec.md names ("string longer than
/// capacity").
pub fn check_capacity(len: usize, capacity: usize) -> Result<(), Error> {
    if len > capacity {
        Err(Error::StringTooLong { len, capacity })
    } else {
        Ok(())
    }
}
