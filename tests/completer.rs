//! Tab completion through a live instance, including delegates and paths

mod helpers;

use class_shell::Candidate;
use helpers::*;
use pretty_assertions::assert_eq;

fn replacements(candidates: &[Candidate]) -> Vec<&str> {
    candidates.iter().map(|c| c.replacement.as_str()).collect()
}

#[test]
fn test_complete_command_names() {
    let (mut cli, _) = captured(&parser_program(), ());
    let candidates = cli.complete("oper_", 5);
    assert_eq!(
        replacements(&candidates),
        vec!["oper_args", "oper_kwargs", "oper_both", "oper_type", "oper_all"]
    );
    assert!(candidates.iter().all(|c| c.start == 0));

    // offered even without declared settings
    assert_eq!(replacements(&cli.complete(".", 1)), vec![".setting", ".read"]);
}

#[test]
fn test_complete_settings() {
    let (mut cli, _) = captured(&settings_program(), Tester::default());
    assert_eq!(
        replacements(&cli.complete(".set set_i", 10)),
        vec!["set_int", "set_iterable"]
    );
    assert_eq!(
        replacements(&cli.complete(".set set_iterable ", 18)),
        choice_keys()
    );
    assert_eq!(
        replacements(&cli.complete(".set set_dict D", 15)),
        vec!["dict"]
    );
}

#[test]
fn test_complete_operation_arguments() {
    let (mut cli, _) = captured(&methods_program(), Tester::default());
    assert_eq!(replacements(&cli.complete("op_iterable n", 13)), vec!["new"]);
    assert!(cli.complete("op_str ", 7).is_empty());
    assert_eq!(replacements(&cli.complete("op_str -", 8)), vec!["--help"]);
}

#[test]
fn test_complete_forwards_into_delegate() {
    let (mut cli, _) = captured(&parser_program(), ());
    cli.delegate_to("delegate").unwrap().delegate_to("delegate").unwrap();

    let line = "delegate oper_k";
    let candidates = cli.complete(line, line.len());
    assert_eq!(replacements(&candidates), vec!["oper_kwargs"]);
    assert_eq!(candidates[0].start, 9);

    let line = "delegate delegate oper_t";
    let candidates = cli.complete(line, line.len());
    assert_eq!(replacements(&candidates), vec!["oper_type"]);
    assert_eq!(candidates[0].start, 18);
}

#[test]
fn test_complete_skips_delegates_not_yet_entered() {
    let (mut cli, _) = captured(&parser_program(), ());
    assert!(cli.complete("delegate oper_k", 15).is_empty());

    // the first level is cached, the nested one is not
    cli.delegate_to("delegate").unwrap();
    assert_eq!(replacements(&cli.complete("delegate oper_k", 15)), vec!["oper_kwargs"]);
    assert!(cli.complete("delegate delegate oper_t", 24).is_empty());
}

#[test]
fn test_complete_read_paths() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("commands.txt"), "").unwrap();
    let (mut cli, _) = captured(&parser_program(), ());

    let line = format!(".read {}/comm", dir.path().display());
    let candidates = cli.complete(&line, line.len());
    assert_eq!(candidates.len(), 1);
    assert!(candidates[0].replacement.ends_with("commands.txt"));
    assert!(candidates[0].start >= 6);
}

#[test]
fn test_complete_comment_colors() {
    let (mut cli, _) = captured(&parser_program(), ());
    assert_eq!(replacements(&cli.complete("#g", 2)), vec!["#green#"]);
}
