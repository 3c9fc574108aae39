//! Shared fixtures for the class-shell integration tests
#![allow(dead_code)]

use std::collections::BTreeMap;
use std::io::Write;
use std::rc::Rc;

use anyhow::bail;
use class_shell::{
    Annotation, Arguments, Capture, Cli, Console, Param, Program, SessionRef, Signature, Value,
};
use tempfile::NamedTempFile;

/// Host recording the last value a command received
#[derive(Debug, Default)]
pub struct Tester {
    pub silenced: bool,
    pub value: Option<Value>,
}

/// Keys and values offered by the mapping annotations
pub fn choice_values() -> Vec<(&'static str, Value)> {
    vec![
        ("int", Value::Int(0)),
        ("str", Value::from("")),
        ("dict", Value::Map(BTreeMap::new())),
        ("list", Value::List(Vec::new())),
        ("new", Value::from("New Value")),
    ]
}

pub fn choice_keys() -> Vec<&'static str> {
    choice_values().into_iter().map(|(key, _)| key).collect()
}

fn record(cli: &mut Cli<Tester>, value: Value) -> anyhow::Result<Value> {
    cli.host_mut().value = Some(value.clone());
    Ok(value)
}

fn first(args: &Arguments) -> Value {
    args.value(0).cloned().unwrap_or_default()
}

fn unless_silenced(cli: &Cli<Tester>, _: &Arguments) -> anyhow::Result<()> {
    if !cli.host().silenced {
        bail!("validation is not silenced");
    }
    Ok(())
}

/// One operation per annotation style
pub fn methods_program() -> Rc<Program<Tester>> {
    let mut builder = Program::<Tester>::builder("tester");
    builder
        .operation("op_str", Signature::new().arg("value"), |cli, args| {
            record(cli, first(args))
        })
        .unwrap()
        .operation(
            "op_int",
            Signature::new().with(Param::new("value").annotated(Annotation::int())),
            |cli, args| record(cli, first(args)),
        )
        .unwrap()
        .operation("op_args", Signature::new().varargs("values"), |cli, args| {
            record(cli, Value::List(args.extra().to_vec()))
        })
        .unwrap()
        .operation("op_kwargs", Signature::new().varkw("values"), |cli, args| {
            record(cli, Value::Map(args.keywords().clone()))
        })
        .unwrap()
        .operation(
            "op_dict",
            Signature::new().with(Param::new("value").annotated(Annotation::mapping(choice_values()))),
            |cli, args| record(cli, first(args)),
        )
        .unwrap()
        .operation(
            "op_iterable",
            Signature::new().with(Param::new("value").annotated(Annotation::choices(choice_keys()))),
            |cli, args| record(cli, first(args)),
        )
        .unwrap()
        .validate("op_exception", Signature::new().arg("value"), unless_silenced)
        .unwrap()
        .operation("op_exception", Signature::new().arg("value"), |cli, args| {
            record(cli, first(args))
        })
        .unwrap();
    builder.build()
}

/// One setting per annotation style
pub fn settings_program() -> Rc<Program<Tester>> {
    let mut builder = Program::<Tester>::builder("tester");
    builder
        .setting("set_str", Signature::new().arg("value"), "", true, |_, args| {
            Ok(first(args))
        })
        .unwrap()
        .setting(
            "set_int",
            Signature::new().with(Param::new("value").annotated(Annotation::int())),
            0,
            true,
            |_, args| Ok(first(args)),
        )
        .unwrap()
        .setting(
            "set_dict",
            Signature::new().with(Param::new("value").annotated(Annotation::mapping(choice_values()))),
            Value::None,
            true,
            |_, args| Ok(first(args)),
        )
        .unwrap()
        .setting(
            "set_iterable",
            Signature::new().with(Param::new("value").annotated(Annotation::choices(choice_keys()))),
            Value::None,
            true,
            |_, args| Ok(first(args)),
        )
        .unwrap()
        .setting(
            "set_constant",
            Signature::new().arg("value"),
            Value::None,
            false,
            |_, args| Ok(first(args)),
        )
        .unwrap()
        .validate("set_exception", Signature::new().arg("value"), unless_silenced)
        .unwrap()
        .setting(
            "set_exception",
            Signature::new().arg("value"),
            Value::None,
            true,
            |_, args| Ok(first(args)),
        )
        .unwrap();
    builder.build()
}

/// Delegates with and without reuse, guarded by a `locked` setting
pub fn delegate_program() -> Rc<Program<()>> {
    let mut builder = Program::<()>::builder("tester");
    builder
        .setting(
            "locked",
            Signature::new().with(Param::new("state").annotated(Annotation::choices([true, false]))),
            false,
            true,
            |_, args| Ok(first(args)),
        )
        .unwrap()
        .operation("unlock", Signature::new(), |cli, _| {
            cli.call("locked", vec![Value::Bool(false)])?;
            Ok(Value::None)
        })
        .unwrap()
        .operation("oper", Signature::new().arg("value"), |_, args| Ok(first(args)))
        .unwrap()
        .delegate("del_new", true, fresh_session)
        .unwrap()
        .delegate("del_discard", false, fresh_session)
        .unwrap()
        .validate("del_locked", Signature::new(), |cli, _| {
            if cli.setting("locked") == Some(&Value::Bool(true)) {
                bail!("Cannot delegate while locked");
            }
            Ok(())
        })
        .unwrap()
        .delegate("del_locked", true, fresh_session)
        .unwrap();
    builder.build()
}

fn fresh_session(cli: &mut Cli<()>) -> anyhow::Result<SessionRef> {
    let sub = cli.program().instantiate(())?;
    Ok(SessionRef::new(sub))
}

/// The grammar exercised by parser and status tests
pub fn parser_program() -> Rc<Program<()>> {
    let mut builder = Program::<()>::builder("parser");
    builder
        .operation("oper_args", Signature::new().varargs("args"), |_, args| {
            Ok(Value::List(args.extra().to_vec()))
        })
        .unwrap()
        .operation("oper_kwargs", Signature::new().varkw("kwargs"), |_, args| {
            Ok(Value::Map(args.keywords().clone()))
        })
        .unwrap()
        .operation(
            "oper_both",
            Signature::new().varargs("args").varkw("kwargs"),
            |_, args| {
                Ok(Value::List(vec![
                    Value::List(args.extra().to_vec()),
                    Value::Map(args.keywords().clone()),
                ]))
            },
        )
        .unwrap()
        .operation(
            "oper_type",
            Signature::new().with(Param::new("value").annotated(Annotation::int())),
            |_, args| Ok(first(args)),
        )
        .unwrap()
        .operation(
            "oper_all",
            Signature::new()
                .with(Param::new("value").annotated(Annotation::int()))
                .varargs("args")
                .varkw("kwargs"),
            |_, args| {
                Ok(Value::List(vec![
                    first(args),
                    Value::List(args.extra().to_vec()),
                    Value::Map(args.keywords().clone()),
                ]))
            },
        )
        .unwrap()
        .delegate("delegate", true, |cli| {
            let sub = cli.program().instantiate(())?;
            Ok(SessionRef::new(sub))
        })
        .unwrap();
    builder.build()
}

/// Instance whose console writes into buffers
pub fn captured<T: 'static>(program: &Rc<Program<T>>, host: T) -> (Cli<T>, Capture) {
    let mut cli = program.instantiate(host).unwrap();
    let (console, capture) = Console::capture();
    cli.set_console(console);
    (cli, capture)
}

pub fn strs(items: &[&str]) -> Value {
    Value::List(items.iter().map(|item| Value::from(*item)).collect())
}

pub fn map(pairs: &[(&str, &str)]) -> Value {
    Value::Map(
        pairs
            .iter()
            .map(|(key, value)| (key.to_string(), Value::from(*value)))
            .collect(),
    )
}

/// Script file with one command per line
pub fn script(lines: &[&str]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    for line in lines {
        writeln!(file, "{}", line).unwrap();
    }
    file.flush().unwrap();
    file
}
