// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

use super::*;

fn try_assemble(cpu: &str, options: AsmOptions, source: &str) -> Result<AssemblyOutput, AsmRunError> {
    let registry = ModuleRegistry::with_defaults();
    assemble_source(&registry, cpu, options, &[], source)
}

fn assemble(cpu: &str, source: &str) -> AssemblyOutput {
    match try_assemble(cpu, AsmOptions::default(), source) {
        Ok(output) => output,
        Err(err) => panic!("{err}: {:?}", err.diagnostics()),
    }
}

fn binary(output: &AssemblyOutput) -> Vec<u8> {
    let mut out = Vec::new();
    output.write_binary(&mut out, 0xff).expect("write binary");
    out
}

fn error_kinds(cpu: &str, source: &str) -> Vec<AsmErrorKind> {
    match try_assemble(cpu, AsmOptions::default(), source) {
        Ok(_) => panic!("expected errors"),
        Err(err) => err.diagnostics().iter().map(Diagnostic::kind).collect(),
    }
}

#[test]
fn m68k_forward_short_branch() {
    let output = assemble(
        "68000",
        "        ORG $1000\n\
         start   MOVEQ #0,D0\n\
         \x20       BRA.S done\n\
         \x20       NOP\n\
         done    RTS\n",
    );
    assert_eq!(
        binary(&output),
        vec![0x70, 0x00, 0x60, 0x02, 0x4E, 0x71, 0x4E, 0x75]
    );
    assert_eq!(output.symbols.resolve_value("start", &output.sections), Some(0x1000));
    assert_eq!(output.symbols.resolve_value("DONE", &output.sections), Some(0x1006));
}

#[test]
fn opt_off_keeps_long_forms() {
    let output = assemble(
        "68000",
        "  ADD.L #1,D0\n  LEA (0,A0),A1\n  OPT OFF\n  ADD.L #1,D0\n  LEA (0,A0),A1\n",
    );
    assert_eq!(
        binary(&output),
        vec![
            0x52, 0x80, 0x43, 0xD0, 0x06, 0x80, 0x00, 0x00, 0x00, 0x01, 0x43, 0xE8, 0x00, 0x00
        ]
    );
}

#[test]
fn opt_on_restores_optimization() {
    let options = AsmOptions {
        optimize: false,
        ..AsmOptions::default()
    };
    let output = try_assemble("68000", options, "  ADD.L #1,D0\n  OPT ON\n  ADD.L #1,D0\n")
        .expect("assemble");
    assert_eq!(
        binary(&output),
        vec![0x06, 0x80, 0x00, 0x00, 0x00, 0x01, 0x52, 0x80]
    );
}

#[test]
fn opt_needs_on_or_off() {
    assert_eq!(error_kinds("68000", "  OPT MAYBE\n"), vec![AsmErrorKind::Directive]);
}

#[test]
fn mos6502_forward_branch_out_of_range() {
    let source = "  CPU 6502\n  BNE far\n  DS.B 200\nfar RTS\n";
    let err = try_assemble("68000", AsmOptions::default(), source)
        .err()
        .expect("branch too far");
    assert_eq!(err.diagnostics().len(), 1);
    assert_eq!(err.diagnostics()[0].kind(), AsmErrorKind::Range);
    assert_eq!(err.diagnostics()[0].line(), 2);
    assert_eq!(err.error().kind(), AsmErrorKind::Range);
    assert_eq!(err.to_string(), "1 error(s) in source. No output written.");
}

#[test]
fn cpu_directive_switches_family_mid_source() {
    let output = assemble("68000", "  CPU 65C02\n  STZ $10\n  CPU 68000\n  NOP\n");
    assert_eq!(binary(&output), vec![0x64, 0x10, 0x4E, 0x71]);
    assert_eq!(output.cpu.as_str(), "68000");
}

#[test]
fn unknown_cpu_is_reported() {
    assert_eq!(error_kinds("68000", "  CPU Z80\n"), vec![AsmErrorKind::Cpu]);
}

#[test]
fn dcpu16_forward_data_reference() {
    let output = assemble("dcpu16", "  SET A, data\ndata DW $1234\n");
    assert_eq!(binary(&output), vec![0x7C, 0x01, 0x00, 0x04, 0x12, 0x34]);
}

#[test]
fn labelled_set_with_one_value_is_assignment() {
    let output = assemble("dcpu16", "count SET 3\ncount SET count+1\n  SET A, count\n");
    assert_eq!(output.symbols.resolve_value("count", &output.sections), Some(4));
    assert_eq!(binary(&output), vec![0x90, 0x01]);
}

#[test]
fn chip8_sprite_after_code() {
    let output = assemble(
        "chip8",
        "  LD I, sprite\n  DRW V0, V1, 2\nsprite DB $F0, $90\n",
    );
    assert_eq!(binary(&output), vec![0xA2, 0x04, 0xD0, 0x12, 0xF0, 0x90]);
    assert_eq!(output.symbols.resolve_value("sprite", &output.sections), Some(0x204));
}

#[test]
fn riscv_load_address_of_string() {
    let output = assemble("rv32i", "  LA a0, msg\n  RET\nmsg DB \"hi\", 0\n");
    assert_eq!(
        binary(&output),
        vec![
            0x37, 0x05, 0x00, 0x00, 0x13, 0x05, 0xC5, 0x00, 0x67, 0x80, 0x00, 0x00, 0x68, 0x69,
            0x00
        ]
    );
}

#[test]
fn equ_values_and_deferred_equ() {
    let output = assemble(
        "68000",
        "LEN     EQU finish-start\n\
         COUNT   = 3\n\
         start   DC.B LEN,COUNT\n\
         finish\n",
    );
    assert_eq!(binary(&output), vec![0x02, 0x03]);
    assert_eq!(output.symbols.resolve_value("LEN", &output.sections), Some(2));
    assert_eq!(output.listing[1].status, LineStatus::DirEqu);
    assert_eq!(output.listing[1].aux, 3);
}

#[test]
fn equ_cannot_be_redefined() {
    assert_eq!(
        error_kinds("68000", "X EQU 1\nX EQU 2\n"),
        vec![AsmErrorKind::Symbol]
    );
}

#[test]
fn mutually_defined_equates_are_circular() {
    let source = "A EQU B\nB EQU A\n  DC.W A\n";
    assert_eq!(
        error_kinds("68000", source),
        vec![AsmErrorKind::Symbol, AsmErrorKind::Symbol]
    );
    let Err(err) = try_assemble("68000", AsmOptions::default(), source) else {
        panic!("expected errors");
    };
    assert!(err.diagnostics()[0].message().contains("circular"));
    assert_eq!(err.diagnostics()[1].line(), 3);
}

#[test]
fn sections_are_placed_after_fixed_code() {
    let output = assemble(
        "68000",
        "        ORG $100\n\
         \x20       DC.W msg\n\
         \x20       SECTION data\n\
         msg     DC.B 1,2,3\n\
         \x20       SECTION CODE\n\
         \x20       NOP\n",
    );
    assert_eq!(output.sections.base(1), Some(0x104));
    assert_eq!(output.symbols.resolve_value("msg", &output.sections), Some(0x104));
    assert_eq!(
        binary(&output),
        vec![0x01, 0x04, 0x4E, 0x71, 0x01, 0x02, 0x03]
    );
}

#[test]
fn org_gap_is_filled() {
    let output = assemble("6502", "  ORG $10\n  NOP\n  ORG $13\n  NOP\n");
    assert_eq!(binary(&output), vec![0xEA, 0xFF, 0xFF, 0xEA]);
}

#[test]
fn ds_and_align_use_fill_byte() {
    let options = AsmOptions {
        fill: 0x00,
        ..AsmOptions::default()
    };
    let output = try_assemble("6502", options, "  NOP\n  DS.W 1\n  ALIGN 4\n  NOP\n")
        .expect("assemble");
    assert_eq!(binary(&output), vec![0xEA, 0x00, 0x00, 0x00, 0xEA]);
    assert_eq!(output.listing[1].status, LineStatus::DirDs);
    assert_eq!(output.listing[1].aux, 2);
}

#[test]
fn data_widths_follow_family_endianness() {
    let m68k = assemble("68000", "  DC.L $12345678\n  DW -1\n");
    assert_eq!(binary(&m68k), vec![0x12, 0x34, 0x56, 0x78, 0xFF, 0xFF]);
    let mos = assemble("6502", "  .WORD $1234\n  .BYTE \"A\", 1\n");
    assert_eq!(binary(&mos), vec![0x34, 0x12, 0x41, 0x01]);
}

#[test]
fn data_value_out_of_range() {
    assert_eq!(error_kinds("6502", "  DB 300\n"), vec![AsmErrorKind::Range]);
}

#[test]
fn strings_need_byte_data() {
    assert_eq!(error_kinds("6502", "  DW \"AB\"\n"), vec![AsmErrorKind::Directive]);
}

#[test]
fn duplicate_label_is_a_symbol_error() {
    assert_eq!(
        error_kinds("68000", "here NOP\nhere NOP\n"),
        vec![AsmErrorKind::Symbol]
    );
}

#[test]
fn unknown_mnemonic_is_a_syntax_error() {
    let err = try_assemble("68000", AsmOptions::default(), "  FROB D0\n")
        .err()
        .expect("unknown mnemonic");
    assert_eq!(err.diagnostics()[0].kind(), AsmErrorKind::Syntax);
    assert_eq!(
        err.diagnostics()[0].message(),
        "Unknown instruction or directive: FROB"
    );
}

#[test]
fn undefined_symbol_is_unresolved() {
    assert_eq!(
        error_kinds("6502", "  JMP nowhere\n"),
        vec![AsmErrorKind::Unresolved]
    );
}

#[test]
fn source_after_end_warns_once() {
    let output = assemble("6502", "  NOP\n  END\n  NOP\n  NOP\n");
    assert_eq!(binary(&output), vec![0xEA]);
    assert_eq!(output.diagnostics.len(), 1);
    assert_eq!(output.diagnostics[0].severity(), Severity::Warning);
    assert_eq!(output.diagnostics[0].line(), 3);
    assert_eq!(output.listing[2].status, LineStatus::Warning);
}

#[test]
fn comments_and_blank_lines_produce_nothing() {
    let output = assemble("6502", "* header\n\n  ; note\n  NOP ; trailing\n");
    assert_eq!(binary(&output), vec![0xEA]);
    assert_eq!(output.listing.len(), 4);
}

#[test]
fn defines_are_visible_to_source() {
    let registry = ModuleRegistry::with_defaults();
    let defines = vec![("BASE".to_string(), 0x1234)];
    let output = assemble_source(
        &registry,
        "6502",
        AsmOptions::default(),
        &defines,
        "  LDA BASE\n",
    )
    .expect("assemble");
    assert_eq!(binary(&output), vec![0xAD, 0x34, 0x12]);
}

#[test]
fn define_clashing_with_label_is_an_error() {
    let registry = ModuleRegistry::with_defaults();
    let defines = vec![("here".to_string(), 1)];
    let err = assemble_source(
        &registry,
        "6502",
        AsmOptions::default(),
        &defines,
        "here NOP\n",
    )
    .err()
    .expect("duplicate");
    assert_eq!(err.diagnostics()[0].kind(), AsmErrorKind::Symbol);
}

#[test]
fn unknown_starting_cpu_is_a_cli_error() {
    let err = try_assemble("pdp11", AsmOptions::default(), "  NOP\n")
        .err()
        .expect("unknown cpu");
    assert_eq!(err.error().kind(), AsmErrorKind::Cli);
}

#[test]
fn listing_shows_patched_bytes_and_symbols() {
    let output = assemble("6502", "  ORG $C000\nstart JMP later\nlater RTS\n");
    let mut out = Vec::new();
    output
        .write_listing(&mut out, "asmforge 6502 Assembler")
        .expect("listing");
    let text = String::from_utf8(out).expect("utf8");
    assert!(text.starts_with("asmforge 6502 Assembler\n"));
    assert!(text.contains("0000C000  4C 03 C0"));
    assert!(text.contains("0000C003  60"));
    assert!(text.contains("Lines: 3  Errors: 0  Warnings: 0"));
    assert!(text.contains("SYMBOL TABLE"));
    assert!(text.contains("later"));
}

#[test]
fn hex_output_has_data_and_end_records() {
    let output = assemble("6502", "  DB $12, $34\n");
    let mut out = Vec::new();
    output.write_hex(&mut out).expect("hex");
    let text = String::from_utf8(out).expect("utf8");
    assert_eq!(text, ":020000001234B8\n:00000001FF\n");
}

#[test]
fn cpu_directive_parses_names_and_labels() {
    assert_eq!(cpu_directive("  CPU 65C02"), Some((None, "65C02", 7)));
    assert_eq!(cpu_directive("top cpu rv32im"), Some((Some("top"), "rv32im", 9)));
    assert_eq!(cpu_directive("  NOP"), None);
}

#[test]
fn data_width_from_directive_and_suffix() {
    let span = Span::new(1, 0, 1);
    assert_eq!(data_width("DB", None).ok(), Some(1));
    assert_eq!(data_width("DC", None).ok(), Some(2));
    assert_eq!(data_width("DC", Some(&("L".to_string(), span))).ok(), Some(4));
    assert!(data_width("DW", Some(&("B".to_string(), span))).is_err());
    assert!(data_width("DS", Some(&("Q".to_string(), span))).is_err());
}
