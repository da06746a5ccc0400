//! Root-level contexts (spec.md §4.3). Only the root of an injection tree
//! carries a context (spec.md §3, "Injection tree": "The root node
//! additionally carries a context..."); every other node in the tree is
//! plain arithmetic over the universal `u64` register (see `DESIGN.md`
//! for why nested "intermediate"/"recursive" half-width contexts from the
//! original design collapse to that single root-level application here).
//!
//! This module only computes the *compile-time* half of each context: the
//! constants, and for the invariant-mutating variant, the recurrence
//! parameters. The runtime halves that need a live mutable cell or an
//! anti-debug probe live in `obf-types::cell`, which is the only place in
//! this workspace that touches `AtomicU64`/process state.

use crate::{
    consts::GlobalConsts,
    descriptor::{random_obf_from_list, Descriptor},
    prng::{compile_time_prng, weak_random},
    width::mask_for,
};

/// Which literal-context variant was chosen for this site. `Identity` also
/// doubles as "no outer concealment" for the variable context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum ContextKind {
    Identity = 0,
    VolatileGlobal = 1,
    AliasedPointer = 2,
    AntiDebug = 3,
    InvariantMutating = 4,
}

/// Everything about the root wrapper that's knowable at compile time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ContextPlan {
    pub kind: ContextKind,
    pub bits: u32,
    /// `CC` for `VolatileGlobal`/`AntiDebug`; the recurrence's `CC` for
    /// `InvariantMutating`; unused for `Identity`/`AliasedPointer`.
    pub cc: u64,
    /// `InvariantMutating` recurrence parameters; `0` otherwise.
    pub modulus: u64,
    pub delta: u64,
    pub delta_modulus: u64,
    /// The cell's initial value (`InvariantMutating` only).
    pub initial_cell: u64,
}

impl ContextPlan {
    pub const fn identity(bits: u32) -> Self {
        ContextPlan {
            kind: ContextKind::Identity,
            bits,
            cc: 0,
            modulus: 0,
            delta: 0,
            delta_modulus: 0,
            initial_cell: 0,
        }
    }

    /// Fixed cost the root reserves for this context, matching the
    /// original design's per-variant floors.
    pub const fn context_cycles(kind: ContextKind) -> i32 {
        match kind {
            ContextKind::Identity => 0,
            ContextKind::VolatileGlobal => 6,
            ContextKind::AliasedPointer => 20,
            ContextKind::AntiDebug => 10,
            ContextKind::InvariantMutating => 100,
        }
    }

    /// `x + CC`, masked to `bits`. Used by `injection` for every variant
    /// that adds a constant (`VolatileGlobal`, `AntiDebug`,
    /// `InvariantMutating`); `Identity`/`AliasedPointer` pass `x` through.
    pub const fn final_injection(&self, x: u64) -> u64 {
        match self.kind {
            ContextKind::Identity | ContextKind::AliasedPointer => x,
            ContextKind::VolatileGlobal | ContextKind::AntiDebug | ContextKind::InvariantMutating => {
                x.wrapping_add(self.cc) & mask_for(self.bits)
            }
        }
    }

    /// Next invariant-mutating cell value, given the current one.
    pub const fn advance_invariant(&self, c: u64) -> u64 {
        (c.wrapping_add(self.delta)) % self.delta_modulus
    }

    /// The subtrahend a live cell contributes to surjection: `c` itself for
    /// `VolatileGlobal`, `c mod MOD` for `InvariantMutating`. `AntiDebug`
    /// also takes `c` unchanged here — its probe-dependent scaling
    /// (`cc * (1 + being_debugged())`) happens in `obf-types::cell` before
    /// `c` ever reaches this function, since the probe is runtime state
    /// this `const fn` layer has no business touching.
    pub const fn cell_subtrahend(&self, c: u64) -> u64 {
        match self.kind {
            ContextKind::InvariantMutating => c % self.modulus,
            _ => c,
        }
    }
}

/// Literal-context descriptors, in `ContextKind` discriminant order.
/// `volatile_ok`/`anti_debug_ok` gate features that aren't always
/// compiled in (`anti-debug` requires the `anti-debug` crate feature; the
/// debug-only `disable-anti-debug-probe` feature doesn't change
/// selection, only the probe's runtime answer).
const fn descriptors(anti_debug_enabled: bool) -> [Descriptor; 5] {
    [
        Descriptor::new(false, 0, 1),
        Descriptor::new(true, 6, 100),
        Descriptor::new(true, 20, 100),
        Descriptor::new(true, 10, if anti_debug_enabled { 100 } else { 0 }),
        Descriptor::new(true, 100, 100),
    ]
}

const fn kind_from_index(i: usize) -> ContextKind {
    match i {
        0 => ContextKind::Identity,
        1 => ContextKind::VolatileGlobal,
        2 => ContextKind::AliasedPointer,
        3 => ContextKind::AntiDebug,
        _ => ContextKind::InvariantMutating,
    }
}

/// Chooses and fully parameterizes the root context for a literal site.
/// Variable sites never call this — they always get `ContextPlan::identity`.
pub const fn choose_literal_context(
    seed: u64,
    bits: u32,
    budget: i32,
    consts: &GlobalConsts,
    anti_debug_enabled: bool,
) -> ContextPlan {
    let descr = descriptors(anti_debug_enabled);
    let which = match random_obf_from_list(compile_time_prng(seed, 1), budget, &descr, -1) {
        Some(w) => w,
        None => 0, // identity's floor is 0, always affordable; unreachable in practice
    };
    let kind = kind_from_index(which);
    let const_seed = compile_time_prng(seed, 2);
    match kind {
        ContextKind::Identity | ContextKind::AliasedPointer => ContextPlan {
            kind,
            bits,
            cc: 0,
            modulus: 0,
            delta: 0,
            delta_modulus: 0,
            initial_cell: 0,
        },
        ContextKind::VolatileGlobal | ContextKind::AntiDebug => {
            let pool = consts.as_array();
            let cc = pool[weak_random(const_seed, 3) as usize];
            ContextPlan {
                kind,
                bits,
                cc,
                modulus: 0,
                delta: 0,
                delta_modulus: 0,
                initial_cell: cc,
            }
        }
        ContextKind::InvariantMutating => derive_invariant_mutating(const_seed, bits),
    }
}

/// Derives `MOD`/`MUL1..3`/`DELTA`/`DELTAMOD`/`CC`/`CC0` such that the
/// recurrence `c <- (c + DELTA) mod DELTAMOD` preserves `c mod MOD == CC`
/// on every step, for any choice of the multipliers — see `DESIGN.md` for
/// why this lets us skip the original's square-root-bounded multiplier
/// search and still prove the invariant algebraically.
const fn derive_invariant_mutating(seed: u64, bits: u32) -> ContextPlan {
    let half_bits = if bits >= 2 { bits / 2 } else { 1 };
    let mod_bound = (1u64 << half_bits).saturating_sub(1).max(1);
    let modulus = 1 + weak_random(compile_time_prng(seed, 1), mod_bound);
    let cc = weak_random(compile_time_prng(seed, 2), modulus);
    let mul1 = 1 + weak_random(compile_time_prng(seed, 3), 6);
    let mul2 = 1 + weak_random(compile_time_prng(seed, 4), 6);
    let mul3 = 1 + weak_random(compile_time_prng(seed, 5), 6);
    let delta = modulus * mul1;
    let delta_modulus = modulus * mul2;
    let initial_cell = (cc + mul3 * modulus) % delta_modulus;
    ContextPlan {
        kind: ContextKind::InvariantMutating,
        bits,
        cc,
        modulus,
        delta,
        delta_modulus,
        initial_cell,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invariant_holds_for_100_steps() {
        for seed in 0..64u64 {
            let ctx = derive_invariant_mutating(seed, 32);
            let mut c = ctx.initial_cell;
            for _ in 0..100 {
                assert_eq!(ctx.cell_subtrahend(c), ctx.cc);
                c = ctx.advance_invariant(c);
            }
        }
    }

    #[test]
    fn volatile_global_round_trips() {
        let consts = GlobalConsts::derive(99);
        let ctx = choose_literal_context(123, 32, 1000, &consts, true);
        let x = 0xABCDu64;
        let y = ctx.final_injection(x);
        let recovered = y.wrapping_sub(ctx.cell_subtrahend(ctx.initial_cell)) & mask_for(32);
        if matches!(
            ctx.kind,
            ContextKind::VolatileGlobal | ContextKind::AntiDebug | ContextKind::InvariantMutating
        ) {
            assert_eq!(recovered, x);
        }
    }

    #[test]
    fn low_budget_falls_back_to_identity() {
        let consts = GlobalConsts::derive(1);
        let ctx = choose_literal_context(7, 16, 0, &consts, true);
        assert_eq!(ctx.kind, ContextKind::Identity);
    }
}
