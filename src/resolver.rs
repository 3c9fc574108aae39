//! Argument Resolver
//!
//! Maps the raw tokens of one command onto its [`Signature`]:
//!
//! 1. `key=value` tokens (non-empty key) are keyword tokens wherever they appear
//! 2. positional tokens fill fixed parameters left to right, surplus goes to the
//!    variadic-positional form
//! 3. keyword tokens go to the variadic-keyword form, the last duplicate wins
//! 4. bound fixed parameters are coerced by their annotation
//!
//! Resolution is all-or-nothing. Variadic tokens stay text.

use std::collections::BTreeMap;

use shell_types::{Param, Signature, Value};

use crate::error::{ResolveError, ResolveResult};

/// Resolved arguments handed to validations and executions
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Arguments {
    params: Vec<(String, Value)>,
    extra: Vec<Value>,
    keywords: BTreeMap<String, Value>,
}

impl Arguments {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Fixed parameter by name
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.params
            .iter()
            .find(|(param, _)| param == name)
            .map(|(_, value)| value)
    }

    /// Fixed parameter by position
    pub fn value(&self, index: usize) -> Option<&Value> {
        self.params.get(index).map(|(_, value)| value)
    }

    pub fn int(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(Value::as_int)
    }

    pub fn bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(Value::as_bool)
    }

    pub fn str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    pub fn params(&self) -> &[(String, Value)] {
        &self.params
    }

    /// Variadic-positional values
    pub fn extra(&self) -> &[Value] {
        &self.extra
    }

    /// Variadic-keyword values
    pub fn keywords(&self) -> &BTreeMap<String, Value> {
        &self.keywords
    }
}

/// Split `key=value` at the first `=`; the key must be non-empty
pub fn keyword_token(token: &str) -> Option<(&str, &str)> {
    match token.split_once('=') {
        Some((key, value)) if !key.is_empty() => Some((key, value)),
        _ => None,
    }
}

/// Coerce one raw token for `param`
pub fn coerce(param: &Param, token: &str) -> ResolveResult<Value> {
    match &param.annotation {
        None => Ok(Value::Str(token.to_string())),
        Some(annotation) => annotation
            .coerce(token)
            .map_err(|message| ResolveError::Coercion {
                param: param.name.clone(),
                message,
            }),
    }
}

/// Resolve raw tokens against a signature
pub fn resolve<S: AsRef<str>>(signature: &Signature, tokens: &[S]) -> ResolveResult<Arguments> {
    let mut positional: Vec<&str> = Vec::new();
    let mut keyword: Vec<(&str, &str)> = Vec::new();
    for token in tokens {
        let token = token.as_ref();
        match keyword_token(token) {
            Some(pair) => keyword.push(pair),
            None => positional.push(token),
        }
    }

    let (bound, extra) = bind_positional(signature, positional)?;

    let mut keywords = BTreeMap::new();
    for (key, value) in keyword {
        if signature.varkw_name().is_none() {
            return Err(ResolveError::UnexpectedKeyword {
                key: key.to_string(),
            });
        }
        keywords.insert(key.to_string(), Value::Str(value.to_string()));
    }

    let mut params = Vec::with_capacity(signature.fixed_count());
    for (param, token) in signature.params().iter().zip(bound) {
        let value = match token {
            Some(token) => coerce(param, token)?,
            None => param.default.clone().unwrap_or_default(),
        };
        params.push((param.name.clone(), value));
    }

    tracing::trace!(
        params = params.len(),
        extra = extra.len(),
        keywords = keywords.len(),
        "resolved arguments"
    );

    Ok(Arguments {
        params,
        extra: extra
            .into_iter()
            .map(|token| Value::Str(token.to_string()))
            .collect(),
        keywords,
    })
}

/// Bind already-typed values with the same arity rules and no coercion.
/// A keyword naming a fixed parameter binds that parameter.
pub fn bind_values(
    signature: &Signature,
    values: Vec<Value>,
    keywords: Vec<(String, Value)>,
) -> ResolveResult<Arguments> {
    let mut slots: Vec<Option<Value>> = vec![None; signature.fixed_count()];
    let mut values = values.into_iter();
    for slot in slots.iter_mut() {
        match values.next() {
            Some(value) => *slot = Some(value),
            None => break,
        }
    }
    let extra: Vec<Value> = values.collect();
    if !extra.is_empty() && signature.varargs_name().is_none() {
        return Err(ResolveError::ExtraPositional {
            extra: extra.iter().map(ToString::to_string).collect(),
        });
    }

    let mut rest = BTreeMap::new();
    for (key, value) in keywords {
        match signature.params().iter().position(|p| p.name == key) {
            Some(i) if slots[i].is_none() => slots[i] = Some(value),
            Some(_) => return Err(ResolveError::UnexpectedKeyword { key }),
            None if signature.varkw_name().is_some() => {
                rest.insert(key, value);
            }
            None => return Err(ResolveError::UnexpectedKeyword { key }),
        }
    }

    let mut params = Vec::with_capacity(slots.len());
    for (param, slot) in signature.params().iter().zip(slots) {
        let value = match slot.or_else(|| param.default.clone()) {
            Some(value) => value,
            None => {
                return Err(ResolveError::MissingArgument {
                    param: param.name.clone(),
                })
            }
        };
        params.push((param.name.clone(), value));
    }

    Ok(Arguments {
        params,
        extra,
        keywords: rest,
    })
}

/// Assign positional tokens to fixed parameters; surplus goes to the variadic form
fn bind_positional<'t>(
    signature: &Signature,
    positional: Vec<&'t str>,
) -> ResolveResult<(Vec<Option<&'t str>>, Vec<&'t str>)> {
    let mut tokens = positional.into_iter();
    let mut bound = Vec::with_capacity(signature.fixed_count());
    for param in signature.params() {
        match tokens.next() {
            Some(token) => bound.push(Some(token)),
            None if param.has_default() => bound.push(None),
            None => {
                return Err(ResolveError::MissingArgument {
                    param: param.name.clone(),
                })
            }
        }
    }

    let extra: Vec<&str> = tokens.collect();
    if !extra.is_empty() && signature.varargs_name().is_none() {
        return Err(ResolveError::ExtraPositional {
            extra: extra.iter().map(|s| s.to_string()).collect(),
        });
    }
    Ok((bound, extra))
}
