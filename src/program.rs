//! Program declaration
//!
//! A [`Program`] is the declared command set of one host type plus its metadata.
//! It is built once through [`ProgramBuilder`] and shared by every instance created
//! with [`Program::instantiate`].

use std::rc::Rc;

use serde::{Deserialize, Serialize};
use shell_types::{Signature, Value};

use crate::compiler::compile_all;
use crate::config::ShellConfig;
use crate::error::{CliError, StructuralError};
use crate::registry::{Execution, Registry, Validation};
use crate::resolver::Arguments;
use crate::session::{Cli, SessionRef};

/// Name, version and description shown in banners and help
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProgramInfo {
    pub name: String,
    pub version: Option<String>,
    pub description: Option<String>,
}

pub struct Program<T> {
    info: ProgramInfo,
    config: ShellConfig,
    silent: bool,
    registry: Registry<T>,
}

impl<T: 'static> Program<T> {
    pub fn builder(name: impl Into<String>) -> ProgramBuilder<T> {
        ProgramBuilder {
            program: Program {
                info: ProgramInfo {
                    name: name.into(),
                    version: None,
                    description: None,
                },
                config: ShellConfig::default(),
                silent: false,
                registry: Registry::new(),
            },
        }
    }

    pub fn info(&self) -> &ProgramInfo {
        &self.info
    }

    pub fn config(&self) -> &ShellConfig {
        &self.config
    }

    /// Instances start silent
    pub fn silent(&self) -> bool {
        self.silent
    }

    pub fn registry(&self) -> &Registry<T> {
        &self.registry
    }

    /// Compile the command set against `host` and seed the settings store.
    ///
    /// Fails with [`CliError::Binding`] when a validation does not match its execution.
    pub fn instantiate(self: &Rc<Self>, host: T) -> Result<Cli<T>, CliError> {
        let commands = compile_all(&self.registry)?;
        tracing::debug!(program = %self.info.name, commands = commands.len(), "instantiated");
        Ok(Cli::new(Rc::clone(self), host, commands))
    }
}

pub struct ProgramBuilder<T> {
    program: Program<T>,
}

impl<T: 'static> ProgramBuilder<T> {
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.program.info.version = Some(version.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.program.info.description = Some(description.into());
        self
    }

    pub fn silent(mut self, silent: bool) -> Self {
        self.program.silent = silent;
        self
    }

    pub fn config(mut self, config: ShellConfig) -> Self {
        self.program.config = config;
        self
    }

    pub fn operation<F>(
        &mut self,
        name: &str,
        signature: Signature,
        body: F,
    ) -> Result<&mut Self, StructuralError>
    where
        F: Fn(&mut Cli<T>, &Arguments) -> anyhow::Result<Value> + 'static,
    {
        self.execution(name, Execution::operation(signature, body))
    }

    pub fn setting<F>(
        &mut self,
        name: &str,
        signature: Signature,
        initial_value: impl Into<Value>,
        updates_value: bool,
        body: F,
    ) -> Result<&mut Self, StructuralError>
    where
        F: Fn(&mut Cli<T>, &Arguments) -> anyhow::Result<Value> + 'static,
    {
        self.execution(
            name,
            Execution::setting(signature, initial_value, updates_value, body),
        )
    }

    pub fn delegate<F>(&mut self, name: &str, reuse: bool, body: F) -> Result<&mut Self, StructuralError>
    where
        F: Fn(&mut Cli<T>) -> anyhow::Result<SessionRef> + 'static,
    {
        self.execution(name, Execution::delegate(reuse, body))
    }

    /// Declare a prepared execution, e.g. one carrying a description
    pub fn execution(&mut self, name: &str, execution: Execution<T>) -> Result<&mut Self, StructuralError> {
        self.program.registry.register_execution(name, execution)?;
        Ok(self)
    }

    /// Attach a validation to `name`; the execution may be declared later
    pub fn validation(
        &mut self,
        name: &str,
        validation: Validation<T>,
    ) -> Result<&mut Self, StructuralError> {
        self.program.registry.register_validation(name, validation)?;
        Ok(self)
    }

    pub fn validate<F>(&mut self, name: &str, signature: Signature, body: F) -> Result<&mut Self, StructuralError>
    where
        F: Fn(&Cli<T>, &Arguments) -> anyhow::Result<()> + 'static,
    {
        self.validation(name, Validation::new(signature, body))
    }

    pub fn build(self) -> Rc<Program<T>> {
        Rc::new(self.program)
    }
}
