//! Usage banner and help text

use std::fmt::Write;

use crate::compiler::{CompiledCommand, CompiledSet};
use crate::program::ProgramInfo;
use crate::registry::KindTag;
use crate::reserved;

fn quoted(tokens: &[&str]) -> String {
    tokens
        .iter()
        .map(|t| format!("'{}'", t))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Banner printed when an interactive session starts
pub fn usage_banner(info: &ProgramInfo, has_settings: bool) -> String {
    let mut text = String::new();
    match &info.version {
        Some(version) => {
            let _ = writeln!(text, "{} v{}:", info.name, version);
        }
        None => {
            let _ = writeln!(text, "{}:", info.name);
        }
    }
    if let Some(description) = &info.description {
        for line in description.lines() {
            let _ = writeln!(text, "\t{}", line);
        }
    }
    text.push('\n');
    let _ = writeln!(
        text,
        "\tTo exit, enter one of the following: {}",
        quoted(reserved::QUIT)
    );
    let _ = writeln!(
        text,
        "\tTo read commands from a file, enter one of the following: {}",
        quoted(reserved::READ)
    );
    if has_settings {
        let _ = writeln!(
            text,
            "\tTo access the program settings, enter one of the following: {}",
            quoted(reserved::SETTINGS)
        );
    }
    text.push('\n');
    let _ = write!(
        text,
        "\tAt any time, add '{}' flag to the command for help.",
        reserved::HELP[0]
    );
    text
}

/// Help for a whole session: every command with its description
pub fn overview<T>(info: &ProgramInfo, commands: &CompiledSet<T>) -> String {
    let mut text = String::new();
    let _ = writeln!(text, "usage: {} <command> [arguments ...]", info.name);
    if let Some(description) = &info.description {
        let _ = writeln!(text, "\n{}", description);
    }

    let width = commands.iter().map(|c| c.name().len()).max().unwrap_or(0);
    for (title, tag) in [
        ("commands", KindTag::Operation),
        ("delegates", KindTag::Delegate),
        ("settings", KindTag::Setting),
    ] {
        let group: Vec<_> = commands.of_kind(tag).collect();
        if group.is_empty() {
            continue;
        }
        let _ = writeln!(text, "\n{}:", title);
        for command in group {
            let _ = writeln!(
                text,
                "  {:width$}  {}",
                command.name(),
                command.description().unwrap_or(""),
                width = width
            );
        }
    }
    text.trim_end().to_string()
}

/// One-line usage of a command
pub fn usage_line<T>(command: &CompiledCommand<T>) -> String {
    let signature = command.signature();
    let mut parts = vec!["usage:".to_string()];
    if command.tag() == KindTag::Setting {
        parts.push(reserved::SETTINGS[0].to_string());
    }
    parts.push(command.name().to_string());
    for param in signature.params() {
        if param.has_default() {
            parts.push(format!("[{}]", param.name));
        } else {
            parts.push(param.name.clone());
        }
    }
    if let Some(name) = signature.varargs_name() {
        parts.push(format!("[{} ...]", name));
    }
    if signature.varkw_name().is_some() {
        parts.push("[key=value ...]".to_string());
    }
    parts.join(" ")
}

/// Full help of a command: usage, description, parameters, validation notes
pub fn command_help<T>(command: &CompiledCommand<T>) -> String {
    let signature = command.signature();
    let mut text = usage_line(command);
    if let Some(description) = command.description() {
        let _ = write!(text, "\n\n{}", description);
    }

    let mut rows: Vec<(String, String)> = signature
        .params()
        .iter()
        .map(|param| {
            let mut info = param.type_label();
            if let Some(default) = &param.default {
                let _ = write!(info, " (default: {})", default);
            }
            if let Some(doc) = &param.doc {
                let _ = write!(info, "  {}", doc);
            }
            (param.name.clone(), info)
        })
        .collect();
    if let Some(name) = signature.varargs_name() {
        rows.push((format!("*{}", name), "extra positional values".to_string()));
    }
    if let Some(name) = signature.varkw_name() {
        rows.push((format!("**{}", name), "key=value pairs".to_string()));
    }

    if !rows.is_empty() {
        let width = rows.iter().map(|(name, _)| name.len()).max().unwrap_or(0);
        text.push_str("\n\narguments:");
        for (name, info) in rows {
            let _ = write!(text, "\n  {:width$}  {}", name, info, width = width);
        }
    }

    if !command.notes().is_empty() {
        text.push('\n');
        for note in command.notes() {
            let _ = write!(text, "\n* {}", note);
        }
    }
    text
}
