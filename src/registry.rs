//! Command Registry
//!
//! Declaration-time store of executions and validations keyed by command name.
//!
//! - Exactly one execution per name; a second one is a [`StructuralError`] raised
//!   immediately, whatever the kinds involved
//! - Validations keep registration order and are de-duplicated by identity
//! - Executions and validations may be declared in either order
//!
//! Compatibility between a validation and its execution is checked later, once per
//! instance, by [`crate::compiler`].

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use shell_types::{Signature, Value};

use crate::error::StructuralError;
use crate::reserved;
use crate::resolver::Arguments;
use crate::session::{Cli, SessionRef};

// =============================================================================
// TYPES
// =============================================================================

/// Bound execution body
pub type ExecutionFn<T> = Rc<dyn Fn(&mut Cli<T>, &Arguments) -> anyhow::Result<Outcome>>;

/// Bound validation body; an `Err` aborts the invocation
pub type ValidationFn<T> = Rc<dyn Fn(&Cli<T>, &Arguments) -> anyhow::Result<()>>;

/// What an execution body produced
#[derive(Clone)]
pub enum Outcome {
    Value(Value),
    Session(SessionRef),
}

impl Outcome {
    pub fn into_value(self) -> Option<Value> {
        match self {
            Outcome::Value(value) => Some(value),
            Outcome::Session(_) => None,
        }
    }

    pub fn into_session(self) -> Option<SessionRef> {
        match self {
            Outcome::Session(session) => Some(session),
            Outcome::Value(_) => None,
        }
    }
}

impl From<Value> for Outcome {
    fn from(value: Value) -> Self {
        Outcome::Value(value)
    }
}

impl From<SessionRef> for Outcome {
    fn from(session: SessionRef) -> Self {
        Outcome::Session(session)
    }
}

impl fmt::Debug for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Outcome::Session(session) => f.debug_tuple("Session").field(&session.name()).finish(),
        }
    }
}

/// Kind of a command without its attributes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KindTag {
    Operation,
    Setting,
    Delegate,
}

impl fmt::Display for KindTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KindTag::Operation => write!(f, "operation"),
            KindTag::Setting => write!(f, "setting"),
            KindTag::Delegate => write!(f, "delegate"),
        }
    }
}

/// Kind of a command with its kind-specific attributes
#[derive(Debug, Clone, PartialEq)]
pub enum CommandKind {
    Operation,
    Setting {
        /// Seeded into every instance's settings store
        initial_value: Value,
        /// Store the execution result after each successful call
        updates_value: bool,
    },
    Delegate {
        /// Memoise the sub-session per instance
        reuse: bool,
    },
}

impl CommandKind {
    pub fn tag(&self) -> KindTag {
        match self {
            CommandKind::Operation => KindTag::Operation,
            CommandKind::Setting { .. } => KindTag::Setting,
            CommandKind::Delegate { .. } => KindTag::Delegate,
        }
    }
}

/// The single implementation of a command
pub struct Execution<T> {
    kind: CommandKind,
    signature: Signature,
    description: Option<String>,
    body: ExecutionFn<T>,
}

impl<T: 'static> Execution<T> {
    pub fn operation<F>(signature: Signature, body: F) -> Self
    where
        F: Fn(&mut Cli<T>, &Arguments) -> anyhow::Result<Value> + 'static,
    {
        Self {
            kind: CommandKind::Operation,
            signature,
            description: None,
            body: Rc::new(move |cli, args| body(cli, args).map(Outcome::Value)),
        }
    }

    pub fn setting<F>(
        signature: Signature,
        initial_value: impl Into<Value>,
        updates_value: bool,
        body: F,
    ) -> Self
    where
        F: Fn(&mut Cli<T>, &Arguments) -> anyhow::Result<Value> + 'static,
    {
        Self {
            kind: CommandKind::Setting {
                initial_value: initial_value.into(),
                updates_value,
            },
            signature,
            description: None,
            body: Rc::new(move |cli, args| body(cli, args).map(Outcome::Value)),
        }
    }

    /// Delegate whose body always yields a sub-session
    pub fn delegate<F>(reuse: bool, body: F) -> Self
    where
        F: Fn(&mut Cli<T>) -> anyhow::Result<SessionRef> + 'static,
    {
        Self {
            kind: CommandKind::Delegate { reuse },
            signature: Signature::new(),
            description: None,
            body: Rc::new(move |cli, _| body(cli).map(Outcome::Session)),
        }
    }

    /// Delegate with an explicit signature and an unchecked outcome. A declared
    /// parameter fails at instantiation; a non-session outcome fails at call time.
    pub fn delegate_with<F>(signature: Signature, reuse: bool, body: F) -> Self
    where
        F: Fn(&mut Cli<T>, &Arguments) -> anyhow::Result<Outcome> + 'static,
    {
        Self {
            kind: CommandKind::Delegate { reuse },
            signature,
            description: None,
            body: Rc::new(body),
        }
    }
}

impl<T> Execution<T> {
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn kind(&self) -> &CommandKind {
        &self.kind
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub(crate) fn body(&self) -> &ExecutionFn<T> {
        &self.body
    }
}

/// A precondition run before the execution with the same arguments
pub struct Validation<T> {
    signature: Signature,
    description: Option<String>,
    body: ValidationFn<T>,
}

impl<T: 'static> Validation<T> {
    pub fn new<F>(signature: Signature, body: F) -> Self
    where
        F: Fn(&Cli<T>, &Arguments) -> anyhow::Result<()> + 'static,
    {
        Self {
            signature,
            description: None,
            body: Rc::new(body),
        }
    }
}

impl<T> Validation<T> {
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Identity comparison: clones of one validation are the same validation
    pub fn same_as(&self, other: &Validation<T>) -> bool {
        Rc::ptr_eq(&self.body, &other.body)
    }

    pub(crate) fn body(&self) -> &ValidationFn<T> {
        &self.body
    }
}

impl<T> Clone for Validation<T> {
    fn clone(&self) -> Self {
        Self {
            signature: self.signature.clone(),
            description: self.description.clone(),
            body: Rc::clone(&self.body),
        }
    }
}

/// Everything declared under one name
pub struct CommandEntry<T> {
    name: String,
    execution: Option<Execution<T>>,
    validations: Vec<Validation<T>>,
}

impl<T> CommandEntry<T> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn execution(&self) -> Option<&Execution<T>> {
        self.execution.as_ref()
    }

    pub fn validations(&self) -> &[Validation<T>] {
        &self.validations
    }
}

// =============================================================================
// REGISTRY
// =============================================================================

/// Declared commands in declaration order
pub struct Registry<T> {
    entries: Vec<CommandEntry<T>>,
    index: HashMap<String, usize>,
}

impl<T> Default for Registry<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<T> Registry<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare the execution of `name`
    pub fn register_execution(
        &mut self,
        name: &str,
        execution: Execution<T>,
    ) -> Result<(), StructuralError> {
        check_name(name)?;
        execution
            .signature()
            .check()
            .map_err(|source| StructuralError::InvalidSignature {
                name: name.to_string(),
                source,
            })?;

        let entry = self.entry_mut(name);
        if let Some(existing) = &entry.execution {
            return Err(StructuralError::DuplicateExecution {
                name: name.to_string(),
                kind: execution.kind().tag(),
                existing: existing.kind().tag(),
            });
        }

        tracing::debug!(command = name, kind = %execution.kind().tag(), "registered execution");
        entry.execution = Some(execution);
        Ok(())
    }

    /// Append a validation to `name` unless this validation is already there
    pub fn register_validation(
        &mut self,
        name: &str,
        validation: Validation<T>,
    ) -> Result<(), StructuralError> {
        check_name(name)?;
        let entry = self.entry_mut(name);
        if entry.validations.iter().any(|v| v.same_as(&validation)) {
            return Ok(());
        }
        entry.validations.push(validation);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&CommandEntry<T>> {
        self.index.get(name).map(|&i| &self.entries[i])
    }

    pub fn entries(&self) -> &[CommandEntry<T>] {
        &self.entries
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    fn entry_mut(&mut self, name: &str) -> &mut CommandEntry<T> {
        let i = match self.index.get(name) {
            Some(&i) => i,
            None => {
                self.entries.push(CommandEntry {
                    name: name.to_string(),
                    execution: None,
                    validations: Vec::new(),
                });
                let i = self.entries.len() - 1;
                self.index.insert(name.to_string(), i);
                i
            }
        };
        &mut self.entries[i]
    }
}

fn check_name(name: &str) -> Result<(), StructuralError> {
    if name.is_empty() || name.chars().any(char::is_whitespace) || reserved::is_reserved(name) {
        return Err(StructuralError::InvalidName {
            name: name.to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================
