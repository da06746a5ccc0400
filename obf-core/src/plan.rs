//! The injection tree itself: a fixed-capacity array of [`PlanNode`]s built
//! once (at compile time, from a per-call-site seed and cycle budget) and
//! then walked twice — `injection` at compile time to produce the stored
//! value, `surjection` at runtime to recover it.
//!
//! Every node operates on a `u64` register masked to an explicit `bits`
//! width (see `width.rs`) rather than on a distinct generic type per
//! level — the tree is data, not nested types (`DESIGN.md` covers why:
//! Rust has no template-style "a new type per recursion level", and this
//! representation is monomorphized per call site anyway through the
//! `SEED`/`CYCLES` const generics on `obf-types`'s wrapper types).
//!
//! Only the root carries a [`ContextPlan`] (spec.md §3); every other node,
//! including the half-width subtrees `V2`/`V3`/`V5`/`V6` recurse into, is
//! plain context-free arithmetic.

use crate::{
    catalog::{self, V0_IDENTITY, V1_ADD_CONST, V2_FEISTEL, V3_SPLIT_JOIN, V4_MUL_ODD, V5_SPLIT_NO_JOIN, V6_LOW_HALF},
    consts::GlobalConsts,
    context::ContextPlan,
    descriptor::{random_obf_from_list, random_split2},
    inner,
    prng::{compile_time_prng, weak_random},
    width::{half_of, mask_for},
};

/// Upper bound on tree size for any single call site. Budgets in practice
/// (see `tier.rs`) never come close to needing this many nodes; it exists
/// so the tree can live in a fixed-size array inside a `const`.
pub const MAX_NODES: usize = 64;

const NO_CHILD: i16 = -1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PlanNode {
    pub version: u8,
    pub bits: u32,
    /// `V1`: the additive constant. `V4`: the multiplicative constant
    /// (`c`); its inverse is recomputed from it rather than stored twice.
    pub k1: u64,
    /// `V1`: `1` to negate the input before adding `k1`. `V2`: which
    /// inner helper.
    pub k2: u64,
    pub child: i16,
    pub child_lo: i16,
    pub child_hi: i16,
}

impl PlanNode {
    const fn leaf(version: u8, bits: u32) -> Self {
        PlanNode {
            version,
            bits,
            k1: 0,
            k2: 0,
            child: NO_CHILD,
            child_lo: NO_CHILD,
            child_hi: NO_CHILD,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Plan {
    pub nodes: [PlanNode; MAX_NODES],
    pub len: usize,
    pub root: i16,
    pub bits: u32,
    pub context: ContextPlan,
}

struct Builder {
    nodes: [PlanNode; MAX_NODES],
    len: usize,
}

impl Builder {
    const fn new() -> Self {
        Builder {
            nodes: [PlanNode::leaf(0, 8); MAX_NODES],
            len: 0,
        }
    }

    const fn push(&mut self, node: PlanNode) -> i16 {
        assert!(self.len < MAX_NODES, "obf: injection tree exceeded MAX_NODES");
        let idx = self.len;
        self.nodes[idx] = node;
        self.len += 1;
        idx as i16
    }
}

/// Builds the whole tree for a call site: picks the root context (literal
/// sites only; variable sites always get [`ContextPlan::identity`]), then
/// the body under the remaining budget.
pub const fn build_plan(
    seed: u64,
    bits: u32,
    cycles: i32,
    literal_mode: bool,
    consts: &GlobalConsts,
    anti_debug_enabled: bool,
) -> Plan {
    let context = if literal_mode {
        crate::context::choose_literal_context(
            compile_time_prng(seed, 1),
            bits,
            cycles,
            consts,
            anti_debug_enabled,
        )
    } else {
        ContextPlan::identity(bits)
    };
    let body_budget = cycles - ContextPlan::context_cycles(context.kind);
    let body_budget = if body_budget < 0 { 0 } else { body_budget };
    let mut builder = Builder::new();
    let root = build_node(
        &mut builder,
        compile_time_prng(seed, 2),
        bits,
        body_budget,
        literal_mode,
        consts,
        -1,
    );
    Plan {
        nodes: builder.nodes,
        len: builder.len,
        root,
        bits,
        context,
    }
}

const fn build_node(
    b: &mut Builder,
    seed: u64,
    bits: u32,
    budget: i32,
    literal_mode: bool,
    consts: &GlobalConsts,
    exclude: i8,
) -> i16 {
    let descr = catalog::descriptors(bits, literal_mode);
    let which = match random_obf_from_list(compile_time_prng(seed, 1), budget, &descr, exclude) {
        Some(w) => w,
        None => V0_IDENTITY,
    };
    let floor = descr[which].min_cycles;
    let leftover = if budget > floor { budget - floor } else { 0 };
    let child_seed = compile_time_prng(seed, 2);

    match which {
        V1_ADD_CONST => {
            let pool = consts.v1_pool();
            let k1 = pool[weak_random(compile_time_prng(seed, 3), 5) as usize];
            let k2 = weak_random(compile_time_prng(seed, 4), 2);
            let mut node = PlanNode::leaf(V1_ADD_CONST as u8, bits);
            node.k1 = k1;
            node.k2 = k2;
            node.child = build_node(b, child_seed, bits, leftover, literal_mode, consts, -1);
            b.push(node)
        }
        V2_FEISTEL if half_of(bits).is_some() => {
            let helper = weak_random(compile_time_prng(seed, 3), 3);
            let mut node = PlanNode::leaf(V2_FEISTEL as u8, bits);
            node.k2 = helper;
            node.child = build_node(b, child_seed, bits, leftover, literal_mode, consts, -1);
            b.push(node)
        }
        V3_SPLIT_JOIN if half_of(bits).is_some() => {
            let half = match half_of(bits) {
                Some(h) => h,
                None => bits,
            };
            let (continue_b, rest) = random_split2(compile_time_prng(seed, 3), leftover, 0, 0, 200, 200);
            let (lo_b, hi_b) = random_split2(compile_time_prng(seed, 4), rest, 0, 0, 100, 100);
            let mut node = PlanNode::leaf(V3_SPLIT_JOIN as u8, bits);
            node.child_lo = build_node(
                b,
                compile_time_prng(seed, 5),
                half,
                lo_b,
                literal_mode,
                consts,
                -1,
            );
            node.child_hi = build_node(
                b,
                compile_time_prng(seed, 6),
                half,
                hi_b,
                literal_mode,
                consts,
                -1,
            );
            node.child = build_node(b, child_seed, bits, continue_b, literal_mode, consts, -1);
            b.push(node)
        }
        V4_MUL_ODD => {
            let pool = consts.as_array();
            let k1 = pool[weak_random(compile_time_prng(seed, 3), 3) as usize];
            let mut node = PlanNode::leaf(V4_MUL_ODD as u8, bits);
            node.k1 = k1;
            node.child = build_node(b, child_seed, bits, leftover, literal_mode, consts, V4_MUL_ODD as i8);
            b.push(node)
        }
        V5_SPLIT_NO_JOIN if half_of(bits).is_some() => {
            let half = match half_of(bits) {
                Some(h) => h,
                None => bits,
            };
            let (lo_b, hi_b) = random_split2(compile_time_prng(seed, 3), leftover, 0, 0, 100, 100);
            let mut node = PlanNode::leaf(V5_SPLIT_NO_JOIN as u8, bits);
            node.child_lo = build_node(
                b,
                compile_time_prng(seed, 4),
                half,
                lo_b,
                literal_mode,
                consts,
                -1,
            );
            node.child_hi = build_node(
                b,
                compile_time_prng(seed, 5),
                half,
                hi_b,
                literal_mode,
                consts,
                -1,
            );
            b.push(node)
        }
        V6_LOW_HALF if half_of(bits).is_some() => {
            let half = match half_of(bits) {
                Some(h) => h,
                None => bits,
            };
            let (continue_b, lo_b) = random_split2(compile_time_prng(seed, 3), leftover, 0, 0, 200, 100);
            let mut node = PlanNode::leaf(V6_LOW_HALF as u8, bits);
            node.child_lo = build_node(
                b,
                compile_time_prng(seed, 4),
                half,
                lo_b,
                literal_mode,
                consts,
                -1,
            );
            node.child = build_node(b, child_seed, bits, continue_b, literal_mode, consts, -1);
            b.push(node)
        }
        _ => b.push(PlanNode::leaf(V0_IDENTITY as u8, bits)),
    }
}

/// Compile-time-evaluable injection: `T -> T` mapping a plaintext value to
/// its stored (obfuscated) form.
pub const fn injection(plan: &Plan, x: u64) -> u64 {
    let body = apply_node(plan, plan.root, x);
    plan.context.final_injection(body)
}

const fn apply_node(plan: &Plan, idx: i16, x: u64) -> u64 {
    let node = plan.nodes[idx as usize];
    let mask = mask_for(node.bits);
    let x = x & mask;
    match node.version as usize {
        V0_IDENTITY => x,
        V1_ADD_CONST => {
            let negated = if node.k2 == 1 { x.wrapping_neg() & mask } else { x };
            let y = negated.wrapping_add(node.k1) & mask;
            apply_node(plan, node.child, y)
        }
        V2_FEISTEL => {
            let half = half_of(node.bits).unwrap_or(node.bits);
            let half_mask = mask_for(half);
            let lo = x & half_mask;
            let hi = (x >> half) & half_mask;
            let hi2 = hi.wrapping_add(inner::apply(node.k2 as usize, lo, half)) & half_mask;
            let joined = (hi2 << half) | lo;
            apply_node(plan, node.child, joined & mask)
        }
        V3_SPLIT_JOIN => {
            let half = half_of(node.bits).unwrap_or(node.bits);
            let half_mask = mask_for(half);
            let lo = x & half_mask;
            let hi = (x >> half) & half_mask;
            let lo_obf = apply_node(plan, node.child_lo, lo);
            let hi_obf = apply_node(plan, node.child_hi, hi);
            let joined = ((hi_obf & half_mask) << half) | (lo_obf & half_mask);
            apply_node(plan, node.child, joined & mask)
        }
        V4_MUL_ODD => {
            let inv = catalog::mod_inverse_odd(node.k1, node.bits);
            let y = x.wrapping_mul(inv) & mask;
            apply_node(plan, node.child, y)
        }
        V5_SPLIT_NO_JOIN => {
            let half = half_of(node.bits).unwrap_or(node.bits);
            let half_mask = mask_for(half);
            let lo = x & half_mask;
            let hi = (x >> half) & half_mask;
            let lo_obf = apply_node(plan, node.child_lo, lo);
            let hi_obf = apply_node(plan, node.child_hi, hi);
            ((hi_obf & half_mask) << half) | (lo_obf & half_mask)
        }
        V6_LOW_HALF => {
            let half = half_of(node.bits).unwrap_or(node.bits);
            let half_mask = mask_for(half);
            let lo = x & half_mask;
            let lo_obf = apply_node(plan, node.child_lo, lo);
            let mid = (x & !half_mask) | (lo_obf & half_mask);
            apply_node(plan, node.child, mid & mask)
        }
        _ => x,
    }
}

/// Runtime surjection: `T -> T` recovering the plaintext from a stored
/// value. `cell` is the root context's live runtime state (only read by
/// `VolatileGlobal`/`InvariantMutating`; ignored otherwise) — see
/// `obf-types::cell` for who owns and advances it.
pub fn surjection(plan: &Plan, y: u64, cell: u64) -> u64 {
    let body = match plan.context.kind {
        crate::context::ContextKind::Identity | crate::context::ContextKind::AliasedPointer => y,
        _ => y.wrapping_sub(plan.context.cell_subtrahend(cell)) & mask_for(plan.bits),
    };
    invert_node(plan, plan.root, body)
}

fn invert_node(plan: &Plan, idx: i16, y: u64) -> u64 {
    let node = plan.nodes[idx as usize];
    let mask = mask_for(node.bits);
    let y = y & mask;
    match node.version as usize {
        V0_IDENTITY => y,
        V1_ADD_CONST => {
            let inner = invert_node(plan, node.child, y);
            let pre_neg = inner.wrapping_sub(node.k1) & mask;
            if node.k2 == 1 {
                pre_neg.wrapping_neg() & mask
            } else {
                pre_neg
            }
        }
        V2_FEISTEL => {
            let half = half_of(node.bits).unwrap_or(node.bits);
            let half_mask = mask_for(half);
            let joined = invert_node(plan, node.child, y);
            let lo = joined & half_mask;
            let hi2 = (joined >> half) & half_mask;
            let hi = hi2.wrapping_sub(inner::apply(node.k2 as usize, lo, half)) & half_mask;
            (hi << half) | lo
        }
        V3_SPLIT_JOIN => {
            let half = half_of(node.bits).unwrap_or(node.bits);
            let half_mask = mask_for(half);
            let joined = invert_node(plan, node.child, y);
            let lo_obf = joined & half_mask;
            let hi_obf = (joined >> half) & half_mask;
            let lo = invert_node(plan, node.child_lo, lo_obf);
            let hi = invert_node(plan, node.child_hi, hi_obf);
            ((hi & half_mask) << half) | (lo & half_mask)
        }
        V4_MUL_ODD => {
            let inner = invert_node(plan, node.child, y);
            inner.wrapping_mul(node.k1) & mask
        }
        V5_SPLIT_NO_JOIN => {
            let half = half_of(node.bits).unwrap_or(node.bits);
            let half_mask = mask_for(half);
            let lo_obf = y & half_mask;
            let hi_obf = (y >> half) & half_mask;
            let lo = invert_node(plan, node.child_lo, lo_obf);
            let hi = invert_node(plan, node.child_hi, hi_obf);
            ((hi & half_mask) << half) | (lo & half_mask)
        }
        V6_LOW_HALF => {
            let half = half_of(node.bits).unwrap_or(node.bits);
            let half_mask = mask_for(half);
            let mid = invert_node(plan, node.child, y);
            let lo_obf = mid & half_mask;
            let lo = invert_node(plan, node.child_lo, lo_obf);
            (mid & !half_mask) | (lo & half_mask)
        }
        _ => y,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(bits: u32, literal_mode: bool, cycles: i32) {
        let consts = GlobalConsts::derive(0xC0FFEE);
        for seed in 0..64u64 {
            let plan = build_plan(seed, bits, cycles, literal_mode, &consts, true);
            let samples: &[u64] = match bits {
                8 => &[0, 1, 0x7f, 0xff],
                16 => &[0, 1, 0x1234, 0xffff],
                32 => &[0, 1, 0xdead_beef, 0xffff_ffff],
                _ => &[0, 1, 0x1122_3344_5566_7788, u64::MAX],
            };
            for &x in samples {
                let x = x & mask_for(bits);
                let y = injection(&plan, x);
                assert_eq!(y & mask_for(bits), y);
                let c = plan.context.initial_cell;
                let x2 = surjection(&plan, y, c);
                assert_eq!(x2, x, "bits={bits} literal={literal_mode} cycles={cycles} seed={seed}");
            }
        }
    }

    #[test]
    fn round_trips_every_width_variable() {
        for bits in [8u32, 16, 32, 64] {
            round_trip(bits, false, 40);
        }
    }

    #[test]
    fn round_trips_every_width_literal() {
        for bits in [8u32, 16, 32, 64] {
            round_trip(bits, true, 200);
        }
    }

    #[test]
    fn zero_budget_is_still_a_bijection() {
        round_trip(32, false, 0);
    }

    #[test]
    fn exhaustive_u8_round_trip() {
        let consts = GlobalConsts::derive(1);
        let plan = build_plan(77, 8, 30, true, &consts, true);
        for x in 0u64..=255 {
            let y = injection(&plan, x);
            assert_eq!(surjection(&plan, y, plan.context.initial_cell), x);
        }
    }
}
