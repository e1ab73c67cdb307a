//! File-level pipeline tests: .omni in, .c out.

use omnic::{compile_file, CompilerConfig, OptLevel};
use std::fs;

#[test]
fn compile_file_writes_c_translation_unit() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = dir.path().join("demo.omni");
    let output = dir.path().join("demo.c");
    fs::write(&input, "func main(): int { return 0xFF + 1 }\n").unwrap();

    compile_file(&input, &output, &CompilerConfig::new()).expect("compilation succeeds");

    let c_text = fs::read_to_string(&output).unwrap();
    assert!(c_text.starts_with("#include \"omni_rt.h\"\n"), "{}", c_text);
    assert!(c_text.contains("#include <stdio.h>"), "{}", c_text);
    assert!(c_text.contains("int32_t omni_main(void)"), "{}", c_text);
    assert!(c_text.contains("int main(int argc, char** argv)"), "{}", c_text);
    assert!(c_text.contains("omni_args_init(argc, argv);"), "{}", c_text);
}

#[test]
fn compile_file_reports_diagnostics() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = dir.path().join("bad.omni");
    let output = dir.path().join("bad.c");
    fs::write(&input, "func f() { return 1 } else {}\n").unwrap();

    let err = compile_file(&input, &output, &CompilerConfig::new()).unwrap_err();
    assert!(err.contains("unexpected"), "{}", err);
    assert!(err.contains("ELSE"), "{}", err);
    assert!(!output.exists());
}

#[test]
fn project_config_sets_opt_level() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(dir.path().join("Omni.toml"), "opt-level = \"2\"\n").unwrap();
    let input = dir.path().join("demo.omni");
    let output = dir.path().join("demo.c");
    fs::write(
        &input,
        "func scale(x: int): int { return x * 8 }\nfunc main(): int { return scale(2) }\n",
    )
    .unwrap();

    compile_file(&input, &output, &CompilerConfig::new()).expect("compilation succeeds");
    let c_text = fs::read_to_string(&output).unwrap();
    assert!(c_text.contains("x << 3"), "{}", c_text);
}

#[test]
fn optimizer_is_idempotent_over_real_output() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = dir.path().join("demo.omni");
    fs::write(
        &input,
        "func main(): int { let s = \"a\" + \"b\"\n return 0 }\n",
    )
    .unwrap();
    let source = fs::read_to_string(&input).unwrap();

    for level in [OptLevel::O0, OptLevel::O1, OptLevel::O2] {
        let config = CompilerConfig::new().with_opt_level(level);
        let once = omnic::compile_source("demo.omni", &source, &config).unwrap();
        let again = omnic::optimizer::optimize(&once, level);
        assert_eq!(once, again, "level {:?} not idempotent", level);
    }
}
