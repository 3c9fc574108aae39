//! Live status line and line validation through a live instance

mod helpers;

use class_shell::Value;
use helpers::*;
use pretty_assertions::assert_eq;

fn status(cli: &mut class_shell::Cli<()>, line: &str) -> String {
    match cli.inspect(line) {
        Ok(status) => status.to_string(),
        Err(error) => panic!("unexpected error for {:?}: {}", line, error),
    }
}

#[test]
fn test_status_for_operations() {
    let (mut cli, _) = captured(&parser_program(), ());
    assert_eq!(status(&mut cli, "oper_type"), "value");
    assert_eq!(status(&mut cli, "oper_type 1"), "value  :  int");
    assert_eq!(status(&mut cli, "oper_type 1 "), "");
    assert_eq!(
        status(&mut cli, "oper_both a"),
        "{*args, **kwargs}  :  list [items=1], dict [items=0]"
    );
    assert_eq!(
        status(&mut cli, "oper_all 1 a k=v "),
        "value {*args, **kwargs}  :  list [items=1], dict [items=1]"
    );
}

#[test]
fn test_blocking_errors() {
    let (mut cli, _) = captured(&parser_program(), ());
    assert_eq!(
        cli.inspect("oper_type x ").unwrap_err().message,
        "invalid value for 'value': invalid literal for int: 'x'"
    );
    assert_eq!(
        cli.inspect("oper_type 1 2 ").unwrap_err().message,
        "too many inputs for 'oper_type'"
    );
    assert_eq!(
        cli.inspect("oper_type 'open").map(|s| s.to_string()),
        Ok("value  :  int".to_string())
    );
}

#[test]
fn test_status_forwards_into_delegate() {
    let (mut cli, _) = captured(&parser_program(), ());
    cli.delegate_to("delegate").unwrap().delegate_to("delegate").unwrap();
    assert_eq!(status(&mut cli, "delegate oper_type 1"), "value  :  int");
    assert_eq!(status(&mut cli, "delegate delegate oper_type"), "value");
    assert!(cli.inspect("delegate oper_type x ").is_err());
}

#[test]
fn test_status_leaves_delegates_not_yet_entered_alone() {
    let (mut cli, _) = captured(&delegate_program(), ());
    cli.call("locked", vec![Value::Bool(true)]).unwrap();

    // failing delegate validations only surface on submission
    assert_eq!(status(&mut cli, "del_locked oper x"), "");
    assert_eq!(status(&mut cli, "del_new oper"), "");

    cli.call("unlock", vec![]).unwrap();
    cli.delegate_to("del_new").unwrap();
    assert_eq!(status(&mut cli, "del_new oper"), "value");
}

#[test]
fn test_settings_status() {
    let (mut cli, _) = captured(&settings_program(), Tester::default());
    let status = cli.inspect(".set set_int 4").unwrap();
    assert_eq!(status.to_string(), "value  :  int");
    assert_eq!(status.active, Some(0));
    assert!(cli.inspect(".set set_int x ").is_err());
    assert_eq!(cli.inspect("no_such_command x y z").unwrap().to_string(), "");
}
