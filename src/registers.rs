/// Register reserved for pseudo-instruction expansion (`x31`, spelled `at`).
pub const SCRATCH: u8 = 31;
pub const SCRATCH_NAME: &str = "at";

/// Register mnemonics and ABI aliases. `at` shares x31 with `t6`.
pub const REGISTERS: &[(&str, u8)] = &[
    ("zero", 0),
    ("ra", 1),
    ("sp", 2),
    ("gp", 3),
    ("tp", 4),
    ("t0", 5),
    ("t1", 6),
    ("t2", 7),
    ("s0", 8),
    ("fp", 8),
    ("s1", 9),
    ("a0", 10),
    ("a1", 11),
    ("a2", 12),
    ("a3", 13),
    ("a4", 14),
    ("a5", 15),
    ("a6", 16),
    ("a7", 17),
    ("s2", 18),
    ("s3", 19),
    ("s4", 20),
    ("s5", 21),
    ("s6", 22),
    ("s7", 23),
    ("s8", 24),
    ("s9", 25),
    ("s10", 26),
    ("s11", 27),
    ("t3", 28),
    ("t4", 29),
    ("t5", 30),
    ("t6", 31),
    ("at", 31),
];

/// Look up `x0`..`x31` or an ABI alias; case-insensitive.
pub fn lookup(token: &str) -> Option<u8> {
    let t = token.trim().to_ascii_lowercase();
    if let Some(num) = t.strip_prefix('x') {
        // reject "x01" and friends so each index has one numeric spelling
        if num.is_empty() || (num.len() > 1 && num.starts_with('0')) {
            return None;
        }
        return num.parse::<u8>().ok().filter(|n| *n < 32);
    }
    REGISTERS
        .iter()
        .find(|(name, _)| *name == t)
        .map(|(_, idx)| *idx)
}

pub fn is_register(token: &str) -> bool {
    lookup(token).is_some()
}
