//! CLI Session
//!
//! A [`Cli`] is one bound instance of a [`Program`]: the host value, its compiled
//! commands, its settings store and its delegation cache. It exposes two surfaces:
//!
//! - String surface: [`Cli::run`], [`Cli::execute`], [`Cli::run_line`] and the
//!   interactive loop. Tokens are resolved and coerced; failures of a command body
//!   are reported on the console and contained.
//! - Direct surface: [`Cli::call`], [`Cli::call_kw`], [`Cli::delegate_to`]. Values
//!   are taken as-is and command errors propagate to the caller unmodified.
//!
//! Both surfaces share [`Cli::invoke`], so validations, setting updates and
//! delegation caching behave identically.
//!
//! Sub-sessions are type-erased behind [`Shell`] and shared through [`SessionRef`],
//! so a delegate may hand out a session of any host type.

use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

use shell_types::Value;

use crate::compiler::{CompiledCommand, CompiledSet};
use crate::completion::{self, Candidate, Completion};
use crate::console::Console;
use crate::error::{CliError, CliResult, InputError};
use crate::help;
use crate::program::Program;
use crate::registry::{CommandKind, KindTag, Outcome};
use crate::reserved;
use crate::resolver::{self, Arguments};
use crate::settings::{DelegationCache, SettingsStore};
use crate::status::{self, Inspection, LineError, StatusLine};
use crate::terminal::{self, LineSource, SharedInput, Terminal};
use crate::tokenizer;

/// Minimum jaro-winkler similarity for a "did you mean" suggestion
const SUGGESTION_THRESHOLD: f64 = 0.8;

// =============================================================================
// TYPES
// =============================================================================

/// How dispatching one line ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    /// A quit token was entered
    Finished,
    /// A command failed and the failure was reported
    Failed,
}

/// Context handed to a sub-session when a parent enters it
pub struct Delegation {
    /// Names of the enclosing sessions, outermost first
    pub parents: Vec<String>,
    /// The parent's console, whose sinks and silence the sub-session adopts
    pub console: Console,
    /// The parent's input, reused by the sub-session's loop
    pub input: SharedInput,
}

/// Object-safe view of a session of any host type
pub trait Shell {
    fn name(&self) -> &str;

    fn setting_value(&self, name: &str) -> Option<Value>;

    fn call_command(&mut self, name: &str, args: Vec<Value>) -> CliResult<Value>;

    fn delegate_session(&mut self, name: &str) -> CliResult<SessionRef>;

    fn run_args(&mut self, args: &[String]) -> CliResult<Option<Value>>;

    /// Dispatch `args` once, or run an interactive loop when `args` is empty
    fn enter(&mut self, delegation: Delegation, args: &[String]) -> CliResult<Option<Value>>;

    fn complete(&mut self, line: &str, cursor: usize) -> Vec<Candidate>;

    fn inspect(&mut self, line: &str) -> Result<StatusLine, LineError>;
}

/// Shared handle to a sub-session
#[derive(Clone)]
pub struct SessionRef(Rc<RefCell<dyn Shell>>);

impl std::fmt::Debug for SessionRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("SessionRef").field(&self.name()).finish()
    }
}

impl SessionRef {
    pub fn new<S: Shell + 'static>(shell: S) -> Self {
        Self(Rc::new(RefCell::new(shell)))
    }

    pub fn name(&self) -> String {
        match self.0.try_borrow() {
            Ok(shell) => shell.name().to_string(),
            Err(_) => "<active session>".to_string(),
        }
    }

    pub fn ptr_eq(&self, other: &SessionRef) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Run `f` on the session; fails if the session is already running
    pub fn with<R>(&self, f: impl FnOnce(&mut dyn Shell) -> R) -> CliResult<R> {
        let mut shell = self
            .0
            .try_borrow_mut()
            .map_err(|_| CliError::Internal("session is already active".to_string()))?;
        Ok(f(&mut *shell))
    }

    pub fn setting(&self, name: &str) -> Option<Value> {
        self.0.try_borrow().ok()?.setting_value(name)
    }

    pub fn call(&self, name: &str, args: Vec<Value>) -> CliResult<Value> {
        self.with(|shell| shell.call_command(name, args))?
    }

    /// The session's own delegate, for chained direct delegation
    pub fn delegate_to(&self, name: &str) -> CliResult<SessionRef> {
        self.with(|shell| shell.delegate_session(name))?
    }

    pub fn run<S: AsRef<str>>(&self, args: &[S]) -> CliResult<Option<Value>> {
        let args: Vec<String> = args.iter().map(|a| a.as_ref().to_string()).collect();
        self.with(|shell| shell.run_args(&args))?
    }
}

/// A name resolved against one instance
pub enum Attribute<'a, T> {
    Setting(&'a Value),
    Command(&'a CompiledCommand<T>),
}

// =============================================================================
// CLI
// =============================================================================

pub struct Cli<T> {
    program: Rc<Program<T>>,
    host: T,
    commands: CompiledSet<T>,
    settings: SettingsStore,
    cache: DelegationCache,
    parents: Vec<String>,
    console: Console,
    input: Option<SharedInput>,
    last_result: Option<Value>,
    replay_depth: usize,
}

impl<T: 'static> Cli<T> {
    pub(crate) fn new(program: Rc<Program<T>>, host: T, commands: CompiledSet<T>) -> Self {
        let mut settings = SettingsStore::new();
        for command in commands.of_kind(KindTag::Setting) {
            if let CommandKind::Setting { initial_value, .. } = command.kind() {
                settings.set(command.name(), initial_value.clone());
            }
        }
        let mut console = Console::stdout();
        console.set_color(program.config().color);
        console.set_silent(program.silent());
        Self {
            program,
            host,
            commands,
            settings,
            cache: DelegationCache::default(),
            parents: Vec::new(),
            console,
            input: None,
            last_result: None,
            replay_depth: 0,
        }
    }

    pub fn host(&self) -> &T {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut T {
        &mut self.host
    }

    pub fn program(&self) -> &Rc<Program<T>> {
        &self.program
    }

    pub fn name(&self) -> &str {
        &self.program.info().name
    }

    pub fn commands(&self) -> &CompiledSet<T> {
        &self.commands
    }

    pub fn settings(&self) -> &SettingsStore {
        &self.settings
    }

    pub fn setting(&self, name: &str) -> Option<&Value> {
        self.settings.get(name)
    }

    /// Settings shadow commands of the same name
    pub fn lookup(&self, name: &str) -> Option<Attribute<'_, T>> {
        if let Some(value) = self.settings.get(name) {
            return Some(Attribute::Setting(value));
        }
        self.commands
            .get(name)
            .map(|command| Attribute::Command(command.as_ref()))
    }

    pub fn last_result(&self) -> Option<&Value> {
        self.last_result.as_ref()
    }

    pub fn is_silent(&self) -> bool {
        self.console.is_silent()
    }

    /// Returns the previous state
    pub fn set_silent(&mut self, silent: bool) -> bool {
        self.console.set_silent(silent)
    }

    pub fn set_console(&mut self, console: Console) {
        let silent = self.console.is_silent();
        self.console = console;
        self.console.set_silent(silent);
    }

    pub fn console_mut(&mut self) -> &mut Console {
        &mut self.console
    }

    /// Replace the terminal used by the interactive loop
    pub fn set_input(&mut self, input: impl LineSource + 'static) {
        let input: SharedInput = Rc::new(RefCell::new(input));
        self.input = Some(input);
    }

    /// Breadcrumb of enclosing sessions followed by the prompt marker
    pub fn prompt(&self) -> String {
        let config = self.program.config();
        let mut path = self.parents.clone();
        path.push(self.name().to_string());
        format!("{}{}", path.join(&config.path_separator), config.prompt_marker)
    }

    pub fn usage(&self) -> String {
        help::usage_banner(self.program.info(), self.commands.has_settings())
    }

    // -------------------------------------------------------------------------
    // direct surface
    // -------------------------------------------------------------------------

    pub fn call(&mut self, name: &str, args: Vec<Value>) -> CliResult<Value> {
        self.call_kw(name, args, Vec::new())
    }

    /// Call with already-typed values; keywords may name fixed parameters
    pub fn call_kw(
        &mut self,
        name: &str,
        args: Vec<Value>,
        keywords: Vec<(&str, Value)>,
    ) -> CliResult<Value> {
        let command = self.command(name)?;
        if command.tag() == KindTag::Delegate {
            return Err(CliError::Internal(format!(
                "'{}' is a delegate and yields a session, use delegate_to",
                name
            )));
        }
        let keywords = keywords
            .into_iter()
            .map(|(key, value)| (key.to_string(), value))
            .collect();
        let arguments = resolver::bind_values(command.signature(), args, keywords).map_err(
            |source| InputError::Resolve {
                command: name.to_string(),
                source,
            },
        )?;
        match self.invoke(name, &arguments)? {
            Outcome::Value(value) => Ok(value),
            Outcome::Session(_) => Err(CliError::Internal(format!(
                "'{}' returned a session instead of a value",
                name
            ))),
        }
    }

    /// The sub-session of a delegate, from the cache when the delegate reuses it
    pub fn delegate_to(&mut self, name: &str) -> CliResult<SessionRef> {
        let command = self.command(name)?;
        if command.tag() != KindTag::Delegate {
            return Err(CliError::Internal(format!("'{}' is not a delegate", name)));
        }
        match self.invoke(name, &Arguments::empty())? {
            Outcome::Session(session) => Ok(session),
            Outcome::Value(_) => Err(CliError::Internal(format!(
                "delegate '{}' did not return a session",
                name
            ))),
        }
    }

    /// Validations, then the body, then the kind-specific post-processing
    pub fn invoke(&mut self, name: &str, args: &Arguments) -> CliResult<Outcome> {
        let command = self.command(name)?;
        tracing::debug!(command = name, kind = %command.tag(), "invoking");

        for validation in command.validations() {
            validation(&*self, args).map_err(CliError::Command)?;
        }

        if let CommandKind::Delegate { reuse: true } = command.kind() {
            if let Some(session) = self.cache.get(name) {
                return Ok(Outcome::Session(session.clone()));
            }
        }

        let outcome = (command.execution())(self, args).map_err(CliError::Command)?;

        match command.kind() {
            CommandKind::Setting {
                updates_value: true,
                ..
            } => {
                if let Outcome::Value(value) = &outcome {
                    self.settings.set(name, value.clone());
                }
            }
            CommandKind::Delegate { reuse } => match &outcome {
                Outcome::Session(session) if *reuse => self.cache.insert(name, session.clone()),
                Outcome::Session(_) => {}
                Outcome::Value(value) => {
                    return Err(CliError::Internal(format!(
                        "delegate '{}' returned {} instead of a session",
                        name, value
                    )))
                }
            },
            _ => {}
        }
        Ok(outcome)
    }

    fn command(&self, name: &str) -> CliResult<Rc<CompiledCommand<T>>> {
        self.commands.get(name).cloned().ok_or_else(|| {
            InputError::UnknownCommand {
                name: name.to_string(),
                suggestion: self.suggest(name),
            }
            .into()
        })
    }

    // -------------------------------------------------------------------------
    // string surface
    // -------------------------------------------------------------------------

    /// Dispatch one argument vector; no arguments starts the interactive loop
    pub fn run<S: AsRef<str>>(&mut self, args: &[S]) -> CliResult<Option<Value>> {
        let args: Vec<String> = args.iter().map(|a| a.as_ref().to_string()).collect();
        if args.is_empty() {
            self.shell_loop()?;
        } else {
            self.dispatch(&args)?;
        }
        Ok(self.last_result.clone())
    }

    /// [`Cli::run`] with the console silenced; errors propagate instead of printing
    pub fn execute<S: AsRef<str>>(&mut self, args: &[S]) -> CliResult<Option<Value>> {
        let previous = self.console.set_silent(true);
        let result = self.run(args);
        self.console.set_silent(previous);
        result
    }

    /// Tokenize `line` and dispatch it; a blank line does nothing
    pub fn run_line(&mut self, line: &str) -> CliResult<Option<Value>> {
        let tokens = tokenizer::split(line).map_err(InputError::from)?;
        if tokens.is_empty() {
            return Ok(None);
        }
        self.run(&tokens)
    }

    /// Replay a file line by line in this session
    pub fn read_file(&mut self, path: impl AsRef<Path>) -> CliResult<Flow> {
        let path = path.as_ref();
        if !path.is_file() {
            self.console
                .error(format!("file '{}' doesn't exist", path.display()));
            return Ok(Flow::Failed);
        }
        let content = std::fs::read_to_string(path)?;
        tracing::info!(path = %path.display(), "replaying file");

        self.replay_depth += 1;
        let flow = self.replay(path, &content);
        self.replay_depth -= 1;
        flow
    }

    fn replay(&mut self, path: &Path, content: &str) -> CliResult<Flow> {
        for (number, line) in content.lines().enumerate() {
            let outcome = match tokenizer::split(line) {
                Ok(tokens) if tokens.is_empty() => continue,
                Ok(tokens) => self
                    .dispatch(&tokens)
                    .map(|flow| (flow, reserved::is_read(&tokens[0]))),
                Err(error) => Err(InputError::from(error).into()),
            };
            let failed = match outcome {
                Ok((Flow::Finished, _)) => return Ok(Flow::Finished),
                Ok((Flow::Continue, _)) => false,
                // a nested replay already reported its own abort
                Ok((Flow::Failed, nested)) => !nested,
                Err(error) if self.is_silent() => return Err(error),
                Err(error) => {
                    self.report(&error);
                    true
                }
            };
            if !failed {
                continue;
            }
            tracing::warn!(path = %path.display(), line = number + 1, "replay aborted");
            self.console.error(format!(
                "execution from file '{}' raised errors and is terminated",
                path.display()
            ));
            return Ok(Flow::Failed);
        }
        Ok(Flow::Continue)
    }

    fn input(&mut self) -> SharedInput {
        let config = self.program.config();
        let input = self.input.get_or_insert_with(|| {
            let terminal: SharedInput = Rc::new(RefCell::new(Terminal::new(config)));
            terminal
        });
        Rc::clone(input)
    }

    fn shell_loop(&mut self) -> CliResult<()> {
        let input = self.input();
        let delegated = !self.parents.is_empty() || self.replay_depth > 0;
        if !delegated && self.program.config().banner {
            let banner = self.usage();
            self.console.print(banner);
        }

        loop {
            let prompt = self.prompt();
            let line = input.borrow_mut().read_line(&prompt, self)?;
            let Some(line) = line else {
                break;
            };
            let outcome = match tokenizer::split(&line) {
                Ok(tokens) if tokens.is_empty() => Ok(Flow::Continue),
                Ok(tokens) => self.dispatch(&tokens),
                Err(error) => Err(InputError::from(error).into()),
            };
            match outcome {
                Ok(Flow::Finished) => break,
                Ok(_) => {}
                Err(error) if self.is_silent() => return Err(error),
                Err(error) => {
                    self.report(&error);
                    if delegated {
                        break;
                    }
                }
            }
        }
        tracing::debug!(session = %self.name(), "leaving loop");
        Ok(())
    }

    fn dispatch(&mut self, args: &[String]) -> CliResult<Flow> {
        let Some(first) = args.first() else {
            return Ok(Flow::Continue);
        };
        if reserved::is_quit(first) {
            return Ok(Flow::Finished);
        }
        self.last_result = None;

        if reserved::is_comment(first) {
            self.console.comment(&args.join(" "));
            return Ok(Flow::Continue);
        }
        if reserved::is_settings(first) && args.len() == 2 {
            if let Some(value) = self.settings.get(&args[1]).cloned() {
                self.console.print(format!("{}={}", args[1], value));
                self.last_result = Some(value);
                return Ok(Flow::Continue);
            }
        }
        if self
            .commands
            .get(first)
            .is_some_and(|c| c.tag() == KindTag::Delegate)
        {
            return self.delegate_line(first, &args[1..]);
        }
        if args.iter().any(|a| reserved::is_help(a)) {
            self.print_help(args);
            return Ok(Flow::Continue);
        }
        if reserved::is_read(first) {
            if args.len() < 2 {
                return Err(InputError::MissingPath {
                    token: first.clone(),
                }
                .into());
            }
            return self.read_file(args[1..].join(" "));
        }
        if reserved::is_settings(first) && args.len() == 1 {
            let listing: Vec<String> = self
                .settings
                .iter()
                .map(|(name, value)| format!("{}={}", name, value))
                .collect();
            for line in listing {
                self.console.print(line);
            }
            return Ok(Flow::Continue);
        }
        self.run_command(args)
    }

    fn delegate_line(&mut self, name: &str, rest: &[String]) -> CliResult<Flow> {
        let session = match self.delegate_to(name) {
            Ok(session) => session,
            Err(CliError::Command(error)) => {
                self.console.error(format!("{:#}", error));
                return Ok(Flow::Failed);
            }
            Err(error) => return Err(error),
        };

        let mut parents = self.parents.clone();
        parents.push(self.name().to_string());
        let delegation = Delegation {
            parents,
            console: self.console.clone(),
            input: self.input(),
        };
        self.last_result = session.with(|shell| shell.enter(delegation, rest))??;
        Ok(Flow::Continue)
    }

    fn print_help(&mut self, args: &[String]) {
        let target = if reserved::is_settings(&args[0]) {
            args.get(1)
        } else {
            args.first()
        };
        let text = match target.and_then(|name| self.commands.get(name)) {
            Some(command) => help::command_help(command),
            None => help::overview(self.program.info(), &self.commands),
        };
        self.console.print(text);
    }

    fn run_command(&mut self, args: &[String]) -> CliResult<Flow> {
        let via_settings = reserved::is_settings(&args[0]);
        let (name, rest) = if via_settings {
            (&args[1], &args[2..])
        } else {
            (&args[0], &args[1..])
        };

        let command = match self.commands.get(name) {
            Some(command) => Rc::clone(command),
            None => {
                return Err(InputError::UnknownCommand {
                    name: name.clone(),
                    suggestion: self.suggest(name),
                }
                .into())
            }
        };
        match (command.tag(), via_settings) {
            (KindTag::Setting, false) => {
                return Err(InputError::SettingNeedsAccess { name: name.clone() }.into())
            }
            (KindTag::Setting, true) => {}
            (_, true) => return Err(InputError::NotASetting { name: name.clone() }.into()),
            (_, false) => {}
        }

        let arguments =
            resolver::resolve(command.signature(), rest).map_err(|source| InputError::Resolve {
                command: name.clone(),
                source,
            })?;

        match self.invoke(name, &arguments) {
            Ok(outcome) => {
                let value = outcome.into_value().unwrap_or_default();
                if command.tag() == KindTag::Setting {
                    self.console.print(format!("{}={}", name, value));
                } else if !value.is_none() {
                    self.console.print(&value);
                }
                self.last_result = (!value.is_none()).then_some(value);
                Ok(Flow::Continue)
            }
            Err(CliError::Command(error)) => {
                self.console.error(format!("{:#}", error));
                Ok(Flow::Failed)
            }
            Err(error) => Err(error),
        }
    }

    fn report(&mut self, error: &CliError) {
        match error {
            CliError::Command(error) => self.console.error(format!("{:#}", error)),
            other => self.console.error(other),
        }
    }

    fn suggest(&self, name: &str) -> Option<String> {
        let candidates = self
            .commands
            .iter()
            .map(|c| c.name())
            .chain([
                reserved::READ_CANONICAL,
                reserved::SETTINGS_CANONICAL,
                reserved::HELP_CANONICAL,
            ]);
        candidates
            .map(|candidate| (strsim::jaro_winkler(name, candidate), candidate))
            .filter(|(score, _)| *score >= SUGGESTION_THRESHOLD)
            .max_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, candidate)| candidate.to_string())
    }

    // -------------------------------------------------------------------------
    // terminal assistance
    // -------------------------------------------------------------------------

    /// Candidates for the word under `cursor`; forwards into delegates already entered
    pub fn complete(&mut self, line: &str, cursor: usize) -> Vec<Candidate> {
        match completion::complete(&self.commands, line, cursor) {
            Completion::Candidates(candidates) => candidates,
            Completion::Path { anchor } => {
                let partial = line.get(anchor..cursor).unwrap_or("");
                terminal::complete_path(partial)
                    .into_iter()
                    .map(|candidate| Candidate {
                        start: candidate.start + anchor,
                        ..candidate
                    })
                    .collect()
            }
            Completion::Forward { delegate, offset } => {
                let Some(rest) = line.get(offset..) else {
                    return Vec::new();
                };
                // only sessions already entered; completion never runs a delegate
                let Some(session) = self.cache.get(&delegate).cloned() else {
                    return Vec::new();
                };
                let inner = cursor.saturating_sub(offset);
                session
                    .with(|shell| shell.complete(rest, inner))
                    .unwrap_or_default()
                    .into_iter()
                    .map(|candidate| Candidate {
                        start: candidate.start + offset,
                        ..candidate
                    })
                    .collect()
            }
        }
    }

    /// Status line for a partial line, or the message blocking its submission
    pub fn inspect(&mut self, line: &str) -> Result<StatusLine, LineError> {
        match status::inspect(&self.commands, line)? {
            Inspection::Status(status) => Ok(status),
            Inspection::Forward { delegate, offset } => {
                let rest = line.get(offset..).unwrap_or("");
                let Some(session) = self.cache.get(&delegate).cloned() else {
                    return Ok(StatusLine::empty());
                };
                session
                    .with(|shell| shell.inspect(rest))
                    .map_err(|e| LineError::new(e.to_string()))?
            }
        }
    }
}

impl<T: 'static> Shell for Cli<T> {
    fn name(&self) -> &str {
        Cli::name(self)
    }

    fn setting_value(&self, name: &str) -> Option<Value> {
        self.setting(name).cloned()
    }

    fn call_command(&mut self, name: &str, args: Vec<Value>) -> CliResult<Value> {
        self.call(name, args)
    }

    fn delegate_session(&mut self, name: &str) -> CliResult<SessionRef> {
        self.delegate_to(name)
    }

    fn run_args(&mut self, args: &[String]) -> CliResult<Option<Value>> {
        self.run(args)
    }

    fn enter(&mut self, delegation: Delegation, args: &[String]) -> CliResult<Option<Value>> {
        let parents = std::mem::replace(&mut self.parents, delegation.parents);
        let input = self.input.replace(delegation.input);
        let console = std::mem::replace(&mut self.console, delegation.console);

        let result = if args.is_empty() {
            self.shell_loop()
        } else {
            match self.dispatch(args) {
                Ok(_) => Ok(()),
                Err(error) if self.is_silent() => Err(error),
                Err(error) => {
                    self.report(&error);
                    Ok(())
                }
            }
        };

        self.console = console;
        self.input = input;
        self.parents = parents;
        result.map(|_| self.last_result.clone())
    }

    fn complete(&mut self, line: &str, cursor: usize) -> Vec<Candidate> {
        Cli::complete(self, line, cursor)
    }

    fn inspect(&mut self, line: &str) -> Result<StatusLine, LineError> {
        Cli::inspect(self, line)
    }
}
