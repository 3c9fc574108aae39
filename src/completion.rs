//! Completion Engine
//!
//! Pure analysis of `(line, cursor)` against compiled command metadata. Detection
//! first works out what the word under the cursor is ([`CompletionContext`]), then
//! each context produces its candidates. Paths and delegated remainders are left to
//! the session, which owns the file-system completer and the sub-sessions.

use shell_types::Signature;

use crate::compiler::CompiledSet;
use crate::registry::KindTag;
use crate::reserved;
use crate::tokenizer::{self, Mode};

/// Comment colour codes offered after `#`
pub const COLOR_CODES: &[&str] = &[
    "#red#",
    "#green#",
    "#yellow#",
    "#blue#",
    "#magenta#",
    "#cyan#",
    "#white#",
];

/// One completion candidate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Text inserted in place of the current word (quoted if needed)
    pub replacement: String,
    /// Text shown in the candidate list
    pub display: String,
    /// Byte offset where the replaced word starts
    pub start: usize,
}

impl Candidate {
    fn new(option: &str, start: usize) -> Self {
        Self {
            replacement: tokenizer::quote(option),
            display: option.to_string(),
            start,
        }
    }
}

/// Result of analysing a line
#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    Candidates(Vec<Candidate>),
    /// Complete a file-system path written from byte `anchor` to the cursor
    Path { anchor: usize },
    /// Hand the text after byte `offset` to the sub-session of `delegate`
    Forward { delegate: String, offset: usize },
}

/// What the word under the cursor is
#[derive(Debug, Clone, PartialEq)]
pub enum CompletionContext {
    CommandName {
        prefix: String,
    },
    Comment {
        prefix: String,
    },
    SettingName {
        prefix: String,
    },
    Argument {
        command: String,
        index: usize,
        prefix: String,
    },
    Path {
        anchor: usize,
    },
    Delegate {
        command: String,
        offset: usize,
    },
    None,
}

/// Word under the cursor
#[derive(Debug, Clone, PartialEq)]
struct Word {
    text: String,
    start: usize,
}

// =============================================================================
// DETECTION
// =============================================================================

/// Work out what is being completed in `line[..cursor]`
pub fn detect_completion_context<T>(
    commands: &CompiledSet<T>,
    line: &str,
    cursor: usize,
) -> (CompletionContext, Option<String>) {
    match detect(commands, line, cursor) {
        Some((context, word)) => (context, Some(word.text)),
        None => (CompletionContext::None, None),
    }
}

fn detect<T>(commands: &CompiledSet<T>, line: &str, cursor: usize) -> Option<(CompletionContext, Word)> {
    let text = line.get(..cursor)?;
    let tokens = tokenizer::split_spans(text, Mode::Lenient).ok()?;

    let trailing = tokens.last().map_or(true, |last| last.end < text.len());
    let word = match tokens.last() {
        Some(last) if !trailing => Word {
            text: last.text.clone(),
            start: last.start,
        },
        _ => Word {
            text: String::new(),
            start: cursor,
        },
    };

    if let Some(open) = tokens.last().filter(|_| !trailing).and_then(|t| t.open_quote) {
        if word.text.contains('/') || word.text.contains('\\') {
            let context = CompletionContext::Path {
                anchor: open.position + 1,
            };
            return Some((context, word));
        }
    }

    // help tokens only matter as the word being completed
    let last_index = tokens.len().saturating_sub(1);
    // (text, end offset) of the words that count
    let mut words: Vec<(&str, usize)> = tokens
        .iter()
        .enumerate()
        .filter(|(i, t)| (*i == last_index && !trailing) || !reserved::is_help(&t.text))
        .map(|(_, t)| (t.text.as_str(), t.end))
        .collect();
    if trailing {
        words.push(("", cursor));
    }

    let (first, first_end) = words[0];
    let prefix = word.text.clone();
    let context = if words.len() == 1 {
        if reserved::is_comment(first) {
            CompletionContext::Comment { prefix }
        } else if reserved::is_settings(first) || reserved::is_read(first) {
            CompletionContext::None
        } else {
            CompletionContext::CommandName { prefix }
        }
    } else if reserved::is_settings(first) {
        if words.len() == 2 {
            CompletionContext::SettingName { prefix }
        } else {
            match commands.get(words[1].0) {
                Some(command) if command.tag() == KindTag::Setting => CompletionContext::Argument {
                    command: words[1].0.to_string(),
                    index: words.len() - 3,
                    prefix,
                },
                _ => CompletionContext::None,
            }
        }
    } else if reserved::is_read(first) {
        let anchor = tokens.get(1).map_or(cursor, |t| t.start);
        CompletionContext::Path { anchor }
    } else {
        match commands.get(first).map(|c| c.tag()) {
            Some(KindTag::Delegate) => CompletionContext::Delegate {
                command: first.to_string(),
                offset: first_end,
            },
            Some(KindTag::Operation) => CompletionContext::Argument {
                command: first.to_string(),
                index: words.len() - 2,
                prefix,
            },
            _ => CompletionContext::None,
        }
    };

    Some((context, word))
}

// =============================================================================
// CANDIDATES
// =============================================================================

/// Analyse `line` with the cursor at byte `cursor`
pub fn complete<T>(commands: &CompiledSet<T>, line: &str, cursor: usize) -> Completion {
    let Some((context, word)) = detect(commands, line, cursor) else {
        return Completion::Candidates(Vec::new());
    };

    tracing::trace!(?context, "completion context");

    let options: Vec<String> = match context {
        CompletionContext::Path { anchor } => return Completion::Path { anchor },
        CompletionContext::Delegate { command, offset } => {
            return Completion::Forward {
                delegate: command,
                offset,
            }
        }
        CompletionContext::CommandName { prefix } => complete_command_names(commands, &prefix),
        CompletionContext::Comment { prefix } => COLOR_CODES
            .iter()
            .filter(|code| code.starts_with(&prefix))
            .map(|code| code.to_string())
            .collect(),
        CompletionContext::SettingName { prefix } => commands
            .of_kind(KindTag::Setting)
            .map(|c| c.name())
            .filter(|name| name.starts_with(&prefix))
            .map(str::to_string)
            .collect(),
        CompletionContext::Argument {
            command,
            index,
            prefix,
        } => match commands.get(&command) {
            Some(command) => complete_argument(command.signature(), index, &prefix),
            None => Vec::new(),
        },
        CompletionContext::None => Vec::new(),
    };

    let mut candidates = Vec::with_capacity(options.len() + 1);
    if word.text.starts_with('-') {
        candidates.push(Candidate::new(reserved::HELP_CANONICAL, word.start));
    }
    candidates.extend(options.iter().map(|option| Candidate::new(option, word.start)));
    Completion::Candidates(candidates)
}

/// Operations and delegates, then the reserved entry points
fn complete_command_names<T>(commands: &CompiledSet<T>, prefix: &str) -> Vec<String> {
    let mut names: Vec<String> = commands
        .iter()
        .filter(|c| c.tag() != KindTag::Setting)
        .map(|c| c.name().to_string())
        .collect();
    names.push(reserved::SETTINGS_CANONICAL.to_string());
    names.push(reserved::READ_CANONICAL.to_string());
    names.retain(|name| name.starts_with(prefix));
    names
}

/// Choice members of the parameter at `index`; past the fixed parameters of a
/// variadic signature the index stays on the last fixed parameter
fn complete_argument(signature: &Signature, index: usize, prefix: &str) -> Vec<String> {
    let fixed = signature.fixed_count();
    let index = if index >= fixed && signature.has_variadic() {
        fixed.saturating_sub(1)
    } else {
        index
    };
    signature
        .param(index)
        .and_then(|param| param.annotation.as_ref())
        .map(|annotation| annotation.complete(prefix))
        .unwrap_or_default()
}

// =============================================================================
// TESTS
// =============================================================================
