use rv_asm::pseudo::{self, PSEUDOS};
use rv_asm::{assemble, parse_source, expand_pseudos, ErrorKind, Instruction};

fn expand(line: &str) -> rv_asm::Result<Vec<Instruction>> {
    let lines = expand_pseudos(&parse_source([line]), PSEUDOS)?;
    Ok(lines.into_iter().filter_map(|l| l.instruction).collect())
}

fn expand_err(line: &str) -> ErrorKind {
    expand(line).unwrap_err().kind()
}

fn encoded(src: &[&str]) -> Vec<u32> {
    assemble(src).unwrap().into_iter().map(u32::from).collect()
}

/// Expansion must be core-only, use every caller operand, and name nothing
/// outside `allowed`, the scratch register, integers (when `imm`), or the
/// final branch/jump target (when `targets`).
fn check(code: &[Instruction], lengths: &[usize], allowed: &[&str], imm: bool, targets: bool) {
    assert!(lengths.contains(&code.len()), "length {} not in {lengths:?}: {code:?}", code.len());
    for sym in allowed {
        assert!(
            code.iter().any(|i| i.operands.iter().any(|o| o.contains(sym))),
            "{sym} unused in {code:?}"
        );
    }
    for i in code {
        assert!(rv_asm::instructions::is_core(&i.mnemonic), "{i} is not core");
        let mut ops: Vec<&str> = i
            .operands
            .iter()
            .flat_map(|o| o.trim_end_matches(')').split('('))
            .filter(|o| !o.is_empty())
            .collect();
        if targets && ["beq", "bne", "blt", "bge", "jal"].contains(&i.mnemonic.as_str()) {
            ops.pop();
        }
        for op in ops {
            let ok = allowed.contains(&op)
                || ["at", "x31"].contains(&op)
                || (imm && op.parse::<i64>().is_ok());
            assert!(ok, "unexpected operand {op} in {i}");
        }
    }
}

#[test]
fn double() {
    check(&expand("double t0, t0").unwrap(), &[1], &["t0"], false, false);
    check(&expand("double t1, s0").unwrap(), &[1], &["t1", "s0"], false, false);
}

#[test]
fn double_operands() {
    assert_eq!(expand_err("double t0, t0, t1"), ErrorKind::BadOperands);
    assert_eq!(expand_err("double t0"), ErrorKind::BadOperands);
    assert_eq!(expand_err("double t0, 4"), ErrorKind::BadRegister);
    assert_eq!(expand_err("double t0, LABEL"), ErrorKind::BadRegister);
}

#[test]
fn diffsums() {
    let all = ["a0", "t1", "t2", "t3", "t4"];
    check(&expand("diffsums a0, t1, t2, t3, t4").unwrap(), &[3], &all, false, false);
    check(&expand("diffsums a0, t1, a0, a0, t4").unwrap(), &[3], &["a0", "t1", "t4"], false, false);
}

#[test]
fn diffsums_operands() {
    assert_eq!(expand_err("diffsums a0, t1, t2, t3"), ErrorKind::BadOperands);
    assert_eq!(expand_err("diffsums a0, t1, t2, t3, t4, t5"), ErrorKind::BadOperands);
    assert_eq!(expand_err("diffsums a0, t1, t2, t3, 4"), ErrorKind::BadRegister);
    assert_eq!(expand_err("diffsums a0, LABEL, t2, t3, t4"), ErrorKind::BadRegister);
}

#[test]
fn diffsums_rejects_scratch_operand() {
    assert_eq!(expand_err("diffsums at, t1, t2, t3, t4"), ErrorKind::BadRegister);
    assert_eq!(expand_err("diffsums a0, t1, t6, t3, t4"), ErrorKind::BadRegister);
}

#[test]
fn diffsums_computes_both_differences() {
    let words = encoded(&["diffsums a0, t1, t2, t3, t4"]);
    // sub at,t1,t2 / sub a0,t3,t4 / add a0,at,a0
    assert_eq!(words, vec![0x4073_0FB3, 0x41DE_0533, 0x00AF_8533]);
}

#[test]
fn push_and_pop() {
    check(&expand("push t0").unwrap(), &[2], &["t0", "sp"], true, false);
    check(&expand("push a0").unwrap(), &[2], &["a0", "sp"], true, false);
    check(&expand("pop ra").unwrap(), &[2], &["ra", "sp"], true, false);
    let words = encoded(&["push t0", "pop ra"]);
    assert_eq!(words, vec![0xFFC1_0113, 0x0051_2023, 0x0001_2083, 0x0041_0113]);
}

#[test]
fn push_operands() {
    assert_eq!(expand_err("push"), ErrorKind::BadOperands);
    assert_eq!(expand_err("push t0 t1"), ErrorKind::BadOperands);
    assert_eq!(expand_err("push 4"), ErrorKind::BadRegister);
    assert_eq!(expand_err("push LABEL"), ErrorKind::BadRegister);
}

#[test]
fn li() {
    check(&expand("li t0, 1").unwrap(), &[1, 2], &["t0"], true, false);
    check(&expand("li t0, -1").unwrap(), &[1, 2], &["t0"], true, false);
    // 0x888
    check(&expand("li t0, 2184").unwrap(), &[2], &["t0"], true, false);
    // 0x8888
    check(&expand("li t3, 34952").unwrap(), &[2], &["t3"], true, false);
    // 0x0FFF_FFFF
    check(&expand("li t0, 268435455").unwrap(), &[2], &["t0"], true, false);
    check(&expand("li t0, 4096").unwrap(), &[1], &["t0"], true, false);
}

#[test]
fn li_loads_the_value() {
    let words = encoded(&["li t0, 0x12345678", "li a0, 0x888", "li a0, -1"]);
    assert_eq!(
        words,
        vec![0x1234_52B7, 0x6782_8293, 0x0000_1537, 0x8885_0513, 0x0000_0537, 0xFFF5_0513]
    );
}

#[test]
fn li_operands() {
    assert_eq!(expand_err("li t0, t0, 123"), ErrorKind::BadOperands);
    assert_eq!(expand_err("li 123"), ErrorKind::BadOperands);
    assert_eq!(expand_err("li 123 123"), ErrorKind::BadRegister);
    assert_eq!(expand_err("li t0 t0"), ErrorKind::BadImmediate);
    assert_eq!(expand_err("li t0, 0x100000000"), ErrorKind::BadImmediate);
}

#[test]
fn beqz_and_bnez() {
    check(&expand("beqz t0, LABEL").unwrap(), &[1], &["t0", "LABEL", "zero"], false, true);
    check(&expand("beqz a0, LABEL").unwrap(), &[1], &["a0", "LABEL", "zero"], false, true);
    check(&expand("bnez a0, LABEL").unwrap(), &[1], &["a0", "LABEL", "zero"], false, true);
    check(&expand("beqz a0, 400").unwrap(), &[1], &["a0", "400", "zero"], true, false);
    check(&expand("beqz a0, -400").unwrap(), &[1], &["a0", "-400", "zero"], true, false);
    let words = encoded(&["beqz a0, 8", "bnez t0, -4"]);
    assert_eq!(words, vec![0x0005_0463, 0xFE02_9EE3]);
}

#[test]
fn beqz_operands() {
    assert_eq!(expand_err("beqz a0"), ErrorKind::BadOperands);
    assert_eq!(expand_err("beqz t0, a0, LABEL"), ErrorKind::BadOperands);
    assert_eq!(expand_err("beqz 0, LABEL"), ErrorKind::BadRegister);
    assert_eq!(expand_err("beqz a0, t0"), ErrorKind::BadImmediate);
    assert_eq!(assemble(["beqz a0, 8193"]).unwrap_err().kind(), ErrorKind::BadImmediate);
}

#[test]
fn jalif() {
    check(&expand("jalif t0, t0, LABEL").unwrap(), &[2, 3], &["t0", "LABEL", "ra"], true, true);
    let syms = ["a0", "s0", "PLACE", "ra"];
    check(&expand("jalif a0, s0, PLACE").unwrap(), &[2, 3], &syms, true, true);
    check(&expand("jalif a0, s0, 400").unwrap(), &[2, 3], &["a0", "s0", "400", "ra"], true, true);
    check(&expand("jalif a0, s0, -400").unwrap(), &[2, 3], &["a0", "s0", "-400", "ra"], true, true);
}

#[test]
fn jalif_operands() {
    assert_eq!(expand_err("jalif t0, t0"), ErrorKind::BadOperands);
    assert_eq!(expand_err("jalif t0, t0, t0, LABEL"), ErrorKind::BadOperands);
    assert_eq!(expand_err("jalif t0, 0, LABEL"), ErrorKind::BadRegister);
    assert_eq!(expand_err("jalif t0, t0, t0"), ErrorKind::BadImmediate);
    assert_eq!(assemble(["jalif t0, t0, 2097153"]).unwrap_err().kind(), ErrorKind::BadImmediate);
}

#[test]
fn mv_and_j() {
    check(&expand("mv a0, a1").unwrap(), &[1], &["a0", "a1"], true, false);
    let words = encoded(&["top: mv a0, a1", "j top"]);
    // addi a0,a1,0 / jal zero,-4
    assert_eq!(words, vec![0x0005_8513, 0xFFDF_F06F]);
}

#[test]
fn registry_lookup() {
    assert!(pseudo::is_pseudo("PUSH"));
    assert!(!pseudo::is_pseudo("add"));
    for def in PSEUDOS {
        let mn = def.mnemonic;
        assert!(!rv_asm::instructions::is_core(mn), "{mn} shadows a core instruction");
    }
}

#[test]
fn custom_registry() {
    fn nop(_: &[&str], src: usize) -> rv_asm::Result<Vec<Instruction>> {
        Ok(vec![Instruction::new("addi", ["zero", "zero", "0"], src)])
    }
    let defs = [pseudo::PseudoDef {
        mnemonic: "nop",
        slots: &[],
        uses_scratch: false,
        expand: nop,
    }];
    let out = expand_pseudos(&parse_source(["nop", "push t0"]), &defs).unwrap();
    assert_eq!(out.len(), 2);
    assert_eq!(out[0].instruction.as_ref().unwrap().mnemonic, "addi");
    assert_eq!(out[1].instruction.as_ref().unwrap().mnemonic, "push");
}

#[test]
fn label_survives_empty_expansion() {
    fn nothing(_: &[&str], _: usize) -> rv_asm::Result<Vec<Instruction>> {
        Ok(Vec::new())
    }
    let defs = [pseudo::PseudoDef {
        mnemonic: "nothing",
        slots: &[],
        uses_scratch: false,
        expand: nothing,
    }];
    let out = expand_pseudos(&parse_source(["L: nothing", "jal x0, L"]), &defs).unwrap();
    let (code, labels) = rv_asm::resolve_labels(&out).unwrap();
    assert_eq!(code.len(), 1);
    assert_eq!(labels.get("L"), Some(rv_asm::BASE_ADDRESS));
}

#[test]
fn expansion_fn_rejects_short_operand_list() {
    let def = pseudo::lookup(PSEUDOS, "jalif").unwrap();
    assert_eq!((def.expand)(&["t0", "t0"], 1).unwrap_err().kind(), ErrorKind::BadOperands);
}
