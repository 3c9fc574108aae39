//! Token resolution: positional, variadic and keyword arguments

mod helpers;

use std::collections::BTreeMap;

use class_shell::{ResolveError, Value};
use helpers::*;
use pretty_assertions::assert_eq;

fn parse(line: &str) -> Option<Value> {
    let (mut cli, _) = captured(&parser_program(), ());
    cli.set_silent(true);
    cli.run_line(line).unwrap()
}

fn parse_error(line: &str) -> ResolveError {
    let (mut cli, _) = captured(&parser_program(), ());
    cli.set_silent(true);
    match cli.run_line(line) {
        Err(error) => error
            .resolve_error()
            .cloned()
            .unwrap_or_else(|| panic!("not a resolution error: {}", error)),
        Ok(value) => panic!("expected an error for {:?}, got {:?}", line, value),
    }
}

#[test]
fn test_varargs() {
    assert_eq!(parse("oper_args"), Some(strs(&[])));
    assert_eq!(parse("oper_args a b c"), Some(strs(&["a", "b", "c"])));
    assert_eq!(
        parse_error("oper_args a k=v"),
        ResolveError::UnexpectedKeyword {
            key: "k".to_string()
        }
    );
}

#[test]
fn test_varkw() {
    assert_eq!(parse("oper_kwargs"), Some(Value::Map(BTreeMap::new())));
    assert_eq!(
        parse("oper_kwargs a=1 b=x=y"),
        Some(map(&[("a", "1"), ("b", "x=y")]))
    );
    assert!(parse_error("oper_kwargs positional").is_arity());
}

#[test]
fn test_mixed_positional_and_keywords() {
    assert_eq!(
        parse("oper_both a k=v b"),
        Some(Value::List(vec![strs(&["a", "b"]), map(&[("k", "v")])]))
    );
    assert_eq!(
        parse("oper_both a=1 a b b=2 c c=3"),
        Some(Value::List(vec![
            strs(&["a", "b", "c"]),
            map(&[("a", "1"), ("b", "2"), ("c", "3")]),
        ]))
    );
    // without a key the token stays positional
    assert_eq!(
        parse("oper_both =v"),
        Some(Value::List(vec![strs(&["=v"]), map(&[])]))
    );
}

#[test]
fn test_typed_argument() {
    assert_eq!(parse("oper_type 42"), Some(Value::Int(42)));
    assert!(parse_error("oper_type forty").is_coercion());
    assert_eq!(
        parse_error("oper_type"),
        ResolveError::MissingArgument {
            param: "value".to_string()
        }
    );
    assert!(parse_error("oper_type 1 2").is_arity());
}

#[test]
fn test_all_forms() {
    assert_eq!(
        parse("oper_all 7 a b k=v"),
        Some(Value::List(vec![
            Value::Int(7),
            strs(&["a", "b"]),
            map(&[("k", "v")]),
        ]))
    );
}

#[test]
fn test_quoting() {
    assert_eq!(
        parse("oper_args 'a b' \"c d\" e"),
        Some(strs(&["a b", "c d", "e"]))
    );
    assert_eq!(
        parse("oper_kwargs 'k=with space'"),
        Some(map(&[("k", "with space")]))
    );

    let (mut cli, _) = captured(&parser_program(), ());
    assert!(cli.run_line("oper_args 'open").unwrap_err().is_input());
}

#[test]
fn test_delegate_prefix() {
    assert_eq!(parse("delegate oper_type 3"), Some(Value::Int(3)));
    assert_eq!(
        parse("delegate delegate oper_args x y"),
        Some(strs(&["x", "y"]))
    );
}

#[test]
fn test_delegate_prefix_errors_propagate_when_silent() {
    let (mut cli, _) = captured(&parser_program(), ());
    let error = cli.execute(&["delegate", "oper_type", "x"]).unwrap_err();
    assert!(error.resolve_error().is_some_and(ResolveError::is_coercion));
}

#[test]
fn test_delegate_prefix_errors_are_reported() {
    let (mut cli, capture) = captured(&parser_program(), ());
    assert_eq!(cli.run(&["delegate", "oper_type", "x"]).unwrap(), None);
    assert!(capture.output().is_empty());
    assert!(capture.errors().contains("invalid value for 'value'"));
}
