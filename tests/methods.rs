//! Operations through the direct and the string surfaces

mod helpers;

use class_shell::{ResolveError, Value};
use helpers::*;
use pretty_assertions::assert_eq;

#[test]
fn test_operation_str() {
    let (mut cli, _) = captured(&methods_program(), Tester::default());
    assert_eq!(cli.host().value, None);

    assert_eq!(cli.call("op_str", vec![Value::from("1")]).unwrap(), Value::from("1"));
    assert_eq!(cli.host().value, Some(Value::from("1")));
    assert_eq!(cli.execute(&["op_str", "2"]).unwrap(), Some(Value::from("2")));
    assert_eq!(cli.host().value, Some(Value::from("2")));
}

#[test]
fn test_operation_int() {
    let (mut cli, _) = captured(&methods_program(), Tester::default());
    assert_eq!(cli.call("op_int", vec![Value::Int(1)]).unwrap(), Value::Int(1));
    assert_eq!(cli.execute(&["op_int", "2"]).unwrap(), Some(Value::Int(2)));
    assert_eq!(cli.host().value, Some(Value::Int(2)));
}

#[test]
fn test_operation_args() {
    let (mut cli, _) = captured(&methods_program(), Tester::default());
    let ints: Vec<Value> = (1..=4).map(Value::Int).collect();
    assert_eq!(cli.call("op_args", ints.clone()).unwrap(), Value::List(ints));

    assert_eq!(
        cli.execute(&["op_args", "1", "2", "3", "4"]).unwrap(),
        Some(strs(&["1", "2", "3", "4"]))
    );
    assert_eq!(cli.host().value, Some(strs(&["1", "2", "3", "4"])));
}

#[test]
fn test_operation_kwargs() {
    let (mut cli, _) = captured(&methods_program(), Tester::default());
    let direct = cli
        .call_kw(
            "op_kwargs",
            vec![],
            vec![("_1", Value::Int(1)), ("_2", Value::Int(2))],
        )
        .unwrap();
    assert_eq!(direct.as_map().map(|m| m.len()), Some(2));
    assert_eq!(direct.as_map().and_then(|m| m.get("_2")), Some(&Value::Int(2)));

    assert_eq!(
        cli.execute(&["op_kwargs", "1=1", "2=2", "3=3", "4=4"]).unwrap(),
        Some(map(&[("1", "1"), ("2", "2"), ("3", "3"), ("4", "4")]))
    );
}

#[test]
fn test_operation_dict() {
    let (mut cli, _) = captured(&methods_program(), Tester::default());
    for (key, expected) in choice_values() {
        assert_eq!(cli.execute(&["op_dict", key]).unwrap(), Some(expected.clone()));
        assert_eq!(cli.host().value, Some(expected));
    }
}

#[test]
fn test_operation_iterable() {
    let (mut cli, _) = captured(&methods_program(), Tester::default());
    for key in choice_keys() {
        assert_eq!(cli.execute(&["op_iterable", key]).unwrap(), Some(Value::from(key)));
        assert_eq!(cli.host().value, Some(Value::from(key)));
    }

    let error = cli.execute(&["op_iterable", "-"]).unwrap_err();
    assert!(error.is_input());
    assert!(error.resolve_error().is_some_and(ResolveError::is_coercion));
}

#[test]
fn test_operation_exception() {
    let (mut cli, capture) = captured(&methods_program(), Tester::default());

    let error = cli.call("op_exception", vec![Value::from("0")]).unwrap_err();
    assert!(error.is_command());
    assert_eq!(cli.host().value, None);

    // the router reports and contains the failure
    assert_eq!(cli.execute(&["op_exception", "0"]).unwrap(), None);
    assert_eq!(cli.host().value, None);
    assert_eq!(capture.errors(), "");
    assert_eq!(cli.run(&["op_exception", "0"]).unwrap(), None);
    assert_eq!(capture.errors(), "error: validation is not silenced\n");

    cli.host_mut().silenced = true;
    assert_eq!(cli.call("op_exception", vec![Value::from("")]).unwrap(), Value::from(""));
    assert_eq!(cli.host().value, Some(Value::from("")));
    assert_eq!(cli.execute(&["op_exception", "0"]).unwrap(), Some(Value::from("0")));
    assert_eq!(cli.host().value, Some(Value::from("0")));
}

#[test]
fn test_direct_call_arity() {
    let (mut cli, _) = captured(&methods_program(), Tester::default());
    let error = cli.call("op_str", vec![]).unwrap_err();
    assert_eq!(
        error.resolve_error(),
        Some(&ResolveError::MissingArgument {
            param: "value".to_string()
        })
    );
    assert!(cli
        .call("op_str", vec![Value::from("a"), Value::from("b")])
        .unwrap_err()
        .resolve_error()
        .is_some_and(ResolveError::is_arity));
    assert!(cli.call("missing", vec![]).unwrap_err().is_input());
}

#[test]
fn test_operation_isolation() {
    let program = methods_program();
    let (mut first, _) = captured(&program, Tester::default());
    let (mut second, _) = captured(&program, Tester::default());

    first.call("op_str", vec![Value::from("value")]).unwrap();
    assert_eq!(first.host().value, Some(Value::from("value")));
    assert_eq!(second.host().value, None);
    second.call("op_str", vec![Value::from("value")]).unwrap();
    assert_eq!(first.host().value, second.host().value);
}
