//! Command Compiler
//!
//! Turns registry entries into [`CompiledCommand`]s for one instance. This is the
//! binding phase: every check that needs the full declaration of a name runs here.
//!
//! - A name with validations must have an execution
//! - Every validation's signature must match the execution's attribute by attribute
//! - A delegate takes no parameters

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use shell_types::Signature;

use crate::error::BindingError;
use crate::registry::{CommandEntry, CommandKind, ExecutionFn, KindTag, Registry, ValidationFn};

/// Signature attribute named in a mismatch, in comparison order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureAttribute {
    Args,
    Defaults,
    Annotations,
    VarArgs,
    VarKw,
}

impl fmt::Display for SignatureAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SignatureAttribute::Args => "args",
            SignatureAttribute::Defaults => "defaults",
            SignatureAttribute::Annotations => "annotations",
            SignatureAttribute::VarArgs => "varargs",
            SignatureAttribute::VarKw => "varkw",
        };
        write!(f, "{}", name)
    }
}

/// A command bound for one instance
pub struct CompiledCommand<T> {
    name: String,
    kind: CommandKind,
    signature: Signature,
    description: Option<String>,
    notes: Vec<String>,
    execution: ExecutionFn<T>,
    validations: Vec<ValidationFn<T>>,
}

impl<T> CompiledCommand<T> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &CommandKind {
        &self.kind
    }

    pub fn tag(&self) -> KindTag {
        self.kind.tag()
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Descriptions of the validations, in order
    pub fn notes(&self) -> &[String] {
        &self.notes
    }

    pub(crate) fn execution(&self) -> &ExecutionFn<T> {
        &self.execution
    }

    pub(crate) fn validations(&self) -> &[ValidationFn<T>] {
        &self.validations
    }
}

/// Compiled commands of one instance, in declaration order
pub struct CompiledSet<T> {
    commands: Vec<Rc<CompiledCommand<T>>>,
    index: HashMap<String, usize>,
}

impl<T> CompiledSet<T> {
    pub fn get(&self, name: &str) -> Option<&Rc<CompiledCommand<T>>> {
        self.index.get(name).map(|&i| &self.commands[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rc<CompiledCommand<T>>> {
        self.commands.iter()
    }

    pub fn of_kind(&self, tag: KindTag) -> impl Iterator<Item = &Rc<CompiledCommand<T>>> {
        self.commands.iter().filter(move |c| c.tag() == tag)
    }

    pub fn has_settings(&self) -> bool {
        self.of_kind(KindTag::Setting).next().is_some()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

// =============================================================================
// COMPILATION
// =============================================================================

/// Compile every declared name
pub fn compile_all<T>(registry: &Registry<T>) -> Result<CompiledSet<T>, BindingError> {
    let mut commands = Vec::with_capacity(registry.len());
    let mut index = HashMap::with_capacity(registry.len());
    for entry in registry.entries() {
        index.insert(entry.name().to_string(), commands.len());
        commands.push(Rc::new(compile(entry)?));
    }
    Ok(CompiledSet { commands, index })
}

/// Compile one declared name
pub fn compile<T>(entry: &CommandEntry<T>) -> Result<CompiledCommand<T>, BindingError> {
    let execution = entry
        .execution()
        .ok_or_else(|| BindingError::MissingExecution {
            name: entry.name().to_string(),
        })?;
    let tag = execution.kind().tag();

    for validation in entry.validations() {
        compare_signatures(tag, entry.name(), execution.signature(), validation.signature())?;
    }

    if tag == KindTag::Delegate && !execution.signature().is_empty() {
        return Err(BindingError::DelegateArguments {
            name: entry.name().to_string(),
        });
    }

    Ok(CompiledCommand {
        name: entry.name().to_string(),
        kind: execution.kind().clone(),
        signature: execution.signature().clone(),
        description: execution.description().map(str::to_string),
        notes: entry
            .validations()
            .iter()
            .filter_map(|v| v.description().map(str::to_string))
            .collect(),
        execution: Rc::clone(execution.body()),
        validations: entry
            .validations()
            .iter()
            .map(|v| Rc::clone(v.body()))
            .collect(),
    })
}

/// Compare two signatures field by field; the first differing attribute is reported
pub fn compare_signatures(
    kind: KindTag,
    name: &str,
    execution: &Signature,
    validation: &Signature,
) -> Result<(), BindingError> {
    let checks = [
        (SignatureAttribute::Args, render_args(execution), render_args(validation)),
        (
            SignatureAttribute::Defaults,
            render_defaults(execution),
            render_defaults(validation),
        ),
        (
            SignatureAttribute::Annotations,
            render_annotations(execution),
            render_annotations(validation),
        ),
        (
            SignatureAttribute::VarArgs,
            render_optional(execution.varargs_name(), "*"),
            render_optional(validation.varargs_name(), "*"),
        ),
        (
            SignatureAttribute::VarKw,
            render_optional(execution.varkw_name(), "**"),
            render_optional(validation.varkw_name(), "**"),
        ),
    ];

    for (attribute, expected, found) in checks {
        if attribute == SignatureAttribute::Annotations {
            // rendered labels can collide; compare the annotations themselves
            let same = execution.fixed_count() == validation.fixed_count()
                && execution
                    .params()
                    .iter()
                    .zip(validation.params())
                    .all(|(a, b)| a.annotation == b.annotation);
            if same {
                continue;
            }
        } else if expected == found {
            continue;
        }
        return Err(BindingError::SignatureMismatch {
            kind,
            name: name.to_string(),
            attribute,
            expected,
            found,
        });
    }
    Ok(())
}

fn render_args(signature: &Signature) -> String {
    let names: Vec<&str> = signature.params().iter().map(|p| p.name.as_str()).collect();
    format!("[{}]", names.join(", "))
}

fn render_defaults(signature: &Signature) -> String {
    let pattern: Vec<&str> = signature
        .params()
        .iter()
        .map(|p| if p.has_default() { "default" } else { "required" })
        .collect();
    format!("[{}]", pattern.join(", "))
}

fn render_annotations(signature: &Signature) -> String {
    let labels: Vec<String> = signature
        .params()
        .iter()
        .map(|p| {
            p.annotation
                .as_ref()
                .map(|a| a.label())
                .unwrap_or_else(|| "-".to_string())
        })
        .collect();
    format!("[{}]", labels.join(", "))
}

fn render_optional(name: Option<&str>, prefix: &str) -> String {
    match name {
        Some(name) => format!("{}{}", prefix, name),
        None => "none".to_string(),
    }
}

// =============================================================================
// TESTS
// =============================================================================
