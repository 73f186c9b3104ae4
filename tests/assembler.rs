//! End-to-end runs over real files: source in, artifacts out.

use std::fs;

use asm24::assembler;

const PROGRAM: &str = "\
; demo program
.extern X
mcro INIT
    mov #-1, r3
mcroend
MAIN: add r1, r2
INIT
jmp &MAIN
prn X
.entry MAIN
STR: .string \"AB\"
LEN: .data 4, -2
";

#[test]
fn clean_program_produces_all_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let stem = dir.path().join("prog").to_string_lossy().into_owned();
    fs::write(format!("{stem}.as"), PROGRAM).unwrap();

    assert!(assembler::assemble(&stem));

    let expanded = fs::read_to_string(format!("{stem}.am")).unwrap();
    assert_eq!(
        expanded,
        "; demo program\n\
         .extern X\n\
         MAIN: add r1, r2\n\
         mov #-1, r3\n\
         jmp &MAIN\n\
         prn X\n\
         .entry MAIN\n\
         STR: .string \"AB\"\n\
         LEN: .data 4, -2\n"
    );

    let object = fs::read_to_string(format!("{stem}.ob")).unwrap();
    assert_eq!(
        object,
        "     7 5\n\
         0000100 0b3a0c\n\
         0000101 001b04\n\
         0000102 fffffc\n\
         0000103 24100c\n\
         0000104 ffffec\n\
         0000105 340804\n\
         0000106 000001\n\
         0000107 000041\n\
         0000108 000042\n\
         0000109 000000\n\
         0000110 000004\n\
         0000111 fffffe\n"
    );

    let entries = fs::read_to_string(format!("{stem}.ent")).unwrap();
    assert_eq!(entries, "MAIN 0000100\n");

    let externals = fs::read_to_string(format!("{stem}.ext")).unwrap();
    assert_eq!(externals, "X 0000106\n");

    // the trimmed scratch copy is gone
    assert!(!dir.path().join("trimmed_prog.as").exists());
}

#[test]
fn diagnosed_program_produces_no_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let stem = dir.path().join("broken").to_string_lossy().into_owned();
    fs::write(format!("{stem}.as"), "bogus r1\n").unwrap();

    assert!(!assembler::assemble(&stem));

    // the expanded file is written before the passes run, but no output
    // artifacts appear
    assert!(fs::metadata(format!("{stem}.am")).is_ok());
    assert!(fs::metadata(format!("{stem}.ob")).is_err());
    assert!(fs::metadata(format!("{stem}.ent")).is_err());
    assert!(fs::metadata(format!("{stem}.ext")).is_err());
}

#[test]
fn entry_and_extern_files_are_omitted_when_empty() {
    let dir = tempfile::tempdir().unwrap();
    let stem = dir.path().join("plain").to_string_lossy().into_owned();
    fs::write(format!("{stem}.as"), "mov #5, r1\nstop\n").unwrap();

    assert!(assembler::assemble(&stem));
    assert!(fs::metadata(format!("{stem}.ob")).is_ok());
    assert!(fs::metadata(format!("{stem}.ent")).is_err());
    assert!(fs::metadata(format!("{stem}.ext")).is_err());
}

#[test]
fn missing_source_file_fails_without_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let stem = dir.path().join("absent").to_string_lossy().into_owned();

    assert!(!assembler::assemble(&stem));
    assert!(fs::metadata(format!("{stem}.am")).is_err());
    assert!(fs::metadata(format!("{stem}.ob")).is_err());
}
