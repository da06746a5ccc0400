//! Tier-6 demo: a factorial function whose accumulator is a tier-6,
//! 64-bit signed obfuscated variable (spec.md §8 S1), with its loop
//! counter and a handful of constants obfuscated too — styled after the
//! introductory example that ships with the design this crate implements.

use obf::{obf_int, obf_str, obf_var};

fn factorial(x: i64) -> i64 {
    if x == 0 {
        return obf_int!(i64; 1, tier = 5).get();
    }
    let mut ret = obf_var!(1i64, tier = 6);
    let mut i = obf_var!(1i64, tier = 3);
    while i.get() <= x {
        ret.set(ret.get() * i.get());
        i.set(i.get() + 1);
    }
    ret.get()
}

fn main() {
    obf::init();
    let banner = obf_str!("factorial demo");
    println!("{}", banner.as_string().unwrap());
    for n in [0i64, 1, 5, 10, 20] {
        println!("{n}! = {}", factorial(n));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_the_textbook_values() {
        assert_eq!(factorial(0), 1);
        assert_eq!(factorial(1), 1);
        assert_eq!(factorial(5), 120);
        assert_eq!(factorial(10), 3_628_800);
    }
}
