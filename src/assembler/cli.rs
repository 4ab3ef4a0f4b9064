// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Command-line interface parsing and argument validation.

use std::path::{Path, PathBuf};

use clap::{ArgAction, Parser};
use tracing::Level;

use crate::core::assembler::error::{AsmError, AsmErrorKind, AsmRunError};
use crate::core::context::AsmOptions;
use crate::core::text_utils::{is_ident_char, is_ident_start};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

const LONG_ABOUT: &str = "Single-pass assembler for the 680x0, 6502/65C02, DCPU-16, RV32I/M and CHIP-8.

Outputs are opt-in: specify at least one of -o/--outfile, -x/--hex or -l/--list.
-x and -l take an optional file name (--hex=FILE); without one, the input path
with a .hex or .lst extension is used.
The starting CPU comes from -c/--cpu and can be changed in the source with CPU.";

#[derive(Parser, Debug)]
#[command(
    name = "asmforge",
    version = VERSION,
    about = "Single-pass retargetable assembler",
    long_about = LONG_ABOUT
)]
pub struct Cli {
    #[arg(value_name = "FILE", help = "Assembly source file")]
    pub infile: PathBuf,
    #[arg(
        short = 'o',
        long = "outfile",
        value_name = "FILE",
        long_help = "Write a flat binary image from the lowest to the highest emitted address."
    )]
    pub outfile: Option<PathBuf>,
    #[arg(
        short = 'x',
        long = "hex",
        value_name = "FILE",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "",
        long_help = "Emit an Intel Hex file. FILE is optional; when omitted, the input base is used and a .hex extension is added."
    )]
    pub hex_name: Option<String>,
    #[arg(
        short = 'l',
        long = "list",
        value_name = "FILE",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "",
        long_help = "Emit a listing file. FILE is optional; when omitted, the input base is used and a .lst extension is added."
    )]
    pub list_name: Option<String>,
    #[arg(
        short = 'c',
        long = "cpu",
        value_name = "NAME",
        default_value = "68000",
        long_help = "CPU to start with (68000, 68020, CPU32, 6502, 65C02, DCPU16, RV32I, RV32IM, CHIP8, SCHIP, ...)."
    )]
    pub cpu: String,
    #[arg(
        long = "no-opt",
        action = ArgAction::SetTrue,
        long_help = "Turn off encoding optimizations (quick forms, short branches, displacement folding). OPT ON in the source turns them back on."
    )]
    pub no_opt: bool,
    #[arg(
        short = 'D',
        long = "define",
        value_name = "NAME[=VAL]",
        action = ArgAction::Append,
        long_help = "Predefine a constant (repeatable). If VAL is omitted, defaults to 1. VAL may be decimal, $hex or 0xhex."
    )]
    pub defines: Vec<String>,
    #[arg(
        short = 'f',
        long = "fill",
        value_name = "hh",
        long_help = "Fill byte for gaps, ORG padding and DS (2 hex digits). Defaults to FF."
    )]
    pub fill_byte: Option<String>,
    /// One of `TRACE`, `DEBUG`, `INFO`, `WARN`, or `ERROR`
    #[arg(long = "log-level", value_name = "LEVEL", default_value_t = Level::WARN)]
    pub log_level: Level,
}

/// Validated settings derived from [`Cli`].
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub options: AsmOptions,
    pub defines: Vec<(String, i32)>,
}

fn cli_error(message: &str, param: Option<&str>) -> AsmRunError {
    AsmRunError::new(
        AsmError::new(AsmErrorKind::Cli, message, param),
        Vec::new(),
        Vec::new(),
    )
}

pub fn is_valid_hex_2(s: &str) -> bool {
    s.len() == 2 && s.chars().all(|c| c.is_ascii_hexdigit())
}

/// Parse `-D` values: decimal, `$hex` or `0xhex`, optionally negative.
fn parse_number(text: &str) -> Option<i32> {
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    let hex = digits
        .strip_prefix('$')
        .or_else(|| digits.strip_prefix("0x"))
        .or_else(|| digits.strip_prefix("0X"));
    let value = match hex {
        Some(hex) => u32::from_str_radix(hex, 16).ok()?,
        None => digits.parse::<u32>().ok()?,
    };
    let value = value as i32;
    Some(if negative { value.wrapping_neg() } else { value })
}

/// Split `NAME[=VAL]`.
pub fn parse_define(arg: &str) -> Option<(String, i32)> {
    let (name, value) = match arg.split_once('=') {
        Some((name, value)) => (name, parse_number(value.trim())?),
        None => (arg, 1),
    };
    let valid = name.bytes().next().is_some_and(is_ident_start) && name.bytes().all(is_ident_char);
    valid.then(|| (name.to_string(), value))
}

pub fn resolve_output_path(base: &str, name: Option<String>, extension: &str) -> Option<String> {
    let name = name?;
    if name.is_empty() {
        return Some(format!("{base}.{extension}"));
    }
    let mut path = PathBuf::from(&name);
    if path.extension().is_none() {
        path = PathBuf::from(format!("{name}.{extension}"));
    }
    Some(path.to_string_lossy().to_string())
}

/// Input path without its extension, used to name default outputs.
pub fn input_base_from_path(path: &Path) -> Result<String, AsmRunError> {
    if path.file_name().is_none() {
        return Err(cli_error("Invalid input file name", None));
    }
    Ok(path.with_extension("").to_string_lossy().to_string())
}

pub fn validate_cli(cli: &Cli) -> Result<CliConfig, AsmRunError> {
    if cli.outfile.is_none() && cli.hex_name.is_none() && cli.list_name.is_none() {
        return Err(cli_error(
            "No outputs selected. Use -o/--outfile, -x/--hex or -l/--list",
            None,
        ));
    }

    let fill = match cli.fill_byte.as_deref() {
        Some(hex) if is_valid_hex_2(hex) => u8::from_str_radix(hex, 16)
            .map_err(|_| cli_error("Invalid -f/--fill value", Some(hex)))?,
        Some(hex) => {
            return Err(cli_error(
                "-f/--fill expects exactly 2 hex digits",
                Some(hex),
            ))
        }
        None => AsmOptions::default().fill,
    };

    let defines = cli
        .defines
        .iter()
        .map(|arg| parse_define(arg).ok_or_else(|| cli_error("Invalid -D/--define", Some(arg))))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(CliConfig {
        options: AsmOptions {
            optimize: !cli.no_opt,
            fill,
        },
        defines,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_outputs_and_options() {
        let cli = Cli::parse_from([
            "asmforge",
            "prog.asm",
            "-l",
            "--hex=out.hex",
            "-o",
            "prog.bin",
            "-c",
            "6502",
            "--no-opt",
            "-D",
            "DEBUG=2",
            "-f",
            "aa",
        ]);
        assert_eq!(cli.infile, PathBuf::from("prog.asm"));
        assert_eq!(cli.list_name, Some(String::new()));
        assert_eq!(cli.hex_name, Some("out.hex".to_string()));
        assert_eq!(cli.outfile, Some(PathBuf::from("prog.bin")));
        assert_eq!(cli.cpu, "6502");
        assert!(cli.no_opt);

        let config = validate_cli(&cli).expect("validate cli");
        assert!(!config.options.optimize);
        assert_eq!(config.options.fill, 0xaa);
        assert_eq!(config.defines, vec![("DEBUG".to_string(), 2)]);
    }

    #[test]
    fn cli_defaults() {
        let cli = Cli::parse_from(["asmforge", "prog.asm", "-x"]);
        assert_eq!(cli.cpu, "68000");
        assert_eq!(cli.log_level, Level::WARN);
        let config = validate_cli(&cli).expect("validate cli");
        assert!(config.options.optimize);
        assert_eq!(config.options.fill, 0xff);
    }

    #[test]
    fn validate_cli_requires_an_output() {
        let cli = Cli::parse_from(["asmforge", "prog.asm"]);
        let err = validate_cli(&cli).unwrap_err();
        assert_eq!(
            err.to_string(),
            "No outputs selected. Use -o/--outfile, -x/--hex or -l/--list"
        );
    }

    #[test]
    fn validate_cli_rejects_bad_fill() {
        let cli = Cli::parse_from(["asmforge", "prog.asm", "-x", "-f", "1ff"]);
        assert!(validate_cli(&cli).is_err());
    }

    #[test]
    fn defines_take_numbers_in_several_bases() {
        assert_eq!(parse_define("FLAG"), Some(("FLAG".to_string(), 1)));
        assert_eq!(parse_define("BASE=$1000"), Some(("BASE".to_string(), 0x1000)));
        assert_eq!(parse_define("MASK=0xff"), Some(("MASK".to_string(), 0xff)));
        assert_eq!(parse_define("OFS=-4"), Some(("OFS".to_string(), -4)));
        assert_eq!(parse_define("1ST=3"), None);
        assert_eq!(parse_define("X=abc"), None);
    }

    #[test]
    fn resolve_output_path_uses_base_on_empty_name() {
        assert_eq!(
            resolve_output_path("dir/prog", Some(String::new()), "lst"),
            Some("dir/prog.lst".to_string())
        );
    }

    #[test]
    fn resolve_output_path_keeps_or_appends_extension() {
        assert_eq!(
            resolve_output_path("prog", Some("out.txt".to_string()), "lst"),
            Some("out.txt".to_string())
        );
        assert_eq!(
            resolve_output_path("prog", Some("out".to_string()), "hex"),
            Some("out.hex".to_string())
        );
        assert_eq!(resolve_output_path("prog", None, "hex"), None);
    }

    #[test]
    fn input_base_strips_extension() {
        assert_eq!(
            input_base_from_path(Path::new("src/demo.s")).expect("base"),
            "src/demo"
        );
    }
}
