//! Parameter binding
//!
//! A request's `params` member arrives in one of four shapes, parsed once
//! into [`Params`] and then turned into the positional/keyword pair a
//! method is called with ([`CallArgs`]):
//!
//! - absent or null: no arguments
//! - array: positional arguments
//! - object: keyword arguments
//! - object under subspec `"1a"` carrying `__args__` and/or `__kwargs__`:
//!   mixed positional and keyword arguments
//!
//! A subspec `"1a"` object with neither member falls back to the
//! whole-object-as-keywords rule.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use super::error::{ApplicationError, HookError, ServiceError};
use super::hook::{encode_value, Transmittable};
use super::value::{RpcMap, RpcValue};

/// Subspec tag enabling mixed positional/keyword params
pub const SUBSPEC_1A: &str = "1a";
/// Positional arguments member
pub const ARGS_KEY: &str = "__args__";
/// Keyword arguments member
pub const KWARGS_KEY: &str = "__kwargs__";

#[derive(Debug, Clone, Default, PartialEq)]
pub enum Params {
    #[default]
    None,
    Positional(Vec<RpcValue>),
    Keyword(RpcMap),
    /// Subspec 1a. Either half may be missing.
    Mixed {
        positional: Option<Vec<RpcValue>>,
        keyword: Option<RpcMap>,
    },
}

impl Params {
    /// Classifies a decoded `params` member.
    pub fn parse(params: Option<RpcValue>, subspec: Option<&str>) -> Result<Self, ServiceError> {
        match params {
            None | Some(RpcValue::Null) => Ok(Params::None),
            Some(RpcValue::Array(items)) => Ok(Params::Positional(items)),
            Some(RpcValue::Object(mut map)) => {
                let mixed = subspec == Some(SUBSPEC_1A)
                    && (map.contains_key(ARGS_KEY) || map.contains_key(KWARGS_KEY));
                if !mixed {
                    return Ok(Params::Keyword(map));
                }
                let (positional, keyword) =
                    split_signature(&mut map).map_err(ServiceError::Decode)?;
                Ok(Params::Mixed {
                    positional,
                    keyword,
                })
            }
            Some(other) => Err(ServiceError::Decode(format!(
                "Invalid type \"{}\" for value of \"params\" keyword. Must be list or dict.",
                other.type_name()
            ))),
        }
    }

    /// Builds subspec 1a params, dropping whichever half is empty.
    pub fn mixed(positional: Vec<RpcValue>, keyword: RpcMap) -> Self {
        if positional.is_empty() && keyword.is_empty() {
            return Params::None;
        }
        Params::Mixed {
            positional: (!positional.is_empty()).then_some(positional),
            keyword: (!keyword.is_empty()).then_some(keyword),
        }
    }

    pub fn into_call_args(self) -> CallArgs {
        match self {
            Params::None => CallArgs::default(),
            Params::Positional(positional) => CallArgs::from_parts(positional, RpcMap::new()),
            Params::Keyword(keyword) => CallArgs::from_parts(Vec::new(), keyword),
            Params::Mixed {
                positional,
                keyword,
            } => CallArgs::from_parts(positional.unwrap_or_default(), keyword.unwrap_or_default()),
        }
    }

    /// Wire form of the params, or `None` when the member should be omitted.
    pub fn to_wire(&self) -> Result<Option<Value>, HookError> {
        Ok(match self {
            Params::None => None,
            Params::Positional(items) => Some(encode_array(items)?),
            Params::Keyword(map) => Some(encode_map(map)?),
            Params::Mixed {
                positional: None,
                keyword: None,
            } => None,
            Params::Mixed {
                positional,
                keyword,
            } => {
                let mut fields = Map::new();
                if let Some(items) = positional {
                    fields.insert(ARGS_KEY.to_string(), encode_array(items)?);
                }
                if let Some(map) = keyword {
                    fields.insert(KWARGS_KEY.to_string(), encode_map(map)?);
                }
                Some(Value::Object(fields))
            }
        })
    }
}

fn encode_array(items: &[RpcValue]) -> Result<Value, HookError> {
    items
        .iter()
        .map(encode_value)
        .collect::<Result<Vec<_>, _>>()
        .map(Value::Array)
}

fn encode_map(map: &RpcMap) -> Result<Value, HookError> {
    let mut out = Map::with_capacity(map.len());
    for (key, value) in map {
        out.insert(key.clone(), encode_value(value)?);
    }
    Ok(Value::Object(out))
}

/// Pulls the `__args__`/`__kwargs__` members out of a subspec 1a mapping.
pub(crate) fn split_signature(
    map: &mut RpcMap,
) -> Result<(Option<Vec<RpcValue>>, Option<RpcMap>), String> {
    let positional = match map.remove(ARGS_KEY) {
        None => None,
        Some(RpcValue::Array(items)) => Some(items),
        Some(other) => {
            return Err(format!(
                "\"{}\" must be a list, got {}",
                ARGS_KEY,
                other.type_name()
            ))
        }
    };
    let keyword = match map.remove(KWARGS_KEY) {
        None => None,
        Some(RpcValue::Object(kwargs)) => Some(kwargs),
        Some(other) => {
            return Err(format!(
                "\"{}\" must be a dict, got {}",
                KWARGS_KEY,
                other.type_name()
            ))
        }
    };
    Ok((positional, keyword))
}

/// Binds a decoded `params` member to call arguments in one step.
pub fn bind(params: Option<RpcValue>, subspec: Option<&str>) -> Result<CallArgs, ServiceError> {
    Params::parse(params, subspec).map(Params::into_call_args)
}

/// Positional and keyword arguments for one call.
///
/// The accessors look an argument up by position first and by keyword
/// second, the way a function signature binds, and report binding
/// problems as invalid-params errors.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallArgs {
    pub positional: Vec<RpcValue>,
    pub keyword: RpcMap,
}

impl CallArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_parts(positional: Vec<RpcValue>, keyword: RpcMap) -> Self {
        Self {
            positional,
            keyword,
        }
    }

    pub fn arg(mut self, value: impl Into<RpcValue>) -> Self {
        self.positional.push(value.into());
        self
    }

    pub fn kwarg(mut self, name: impl Into<String>, value: impl Into<RpcValue>) -> Self {
        self.keyword.insert(name.into(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.positional.is_empty() && self.keyword.is_empty()
    }

    pub fn into_params(self) -> Params {
        Params::mixed(self.positional, self.keyword)
    }

    /// Looks up the argument bound to slot `index` / keyword `name`.
    pub fn get(&self, index: usize, name: &str) -> Result<Option<&RpcValue>, ApplicationError> {
        match (self.positional.get(index), self.keyword.get(name)) {
            (Some(_), Some(_)) => Err(ApplicationError::invalid_params(format!(
                "got multiple values for argument '{name}'"
            ))),
            (Some(value), None) | (None, Some(value)) => Ok(Some(value)),
            (None, None) => Ok(None),
        }
    }

    pub fn required(&self, index: usize, name: &str) -> Result<&RpcValue, ApplicationError> {
        self.get(index, name)?.ok_or_else(|| {
            ApplicationError::invalid_params(format!("missing required argument '{name}'"))
        })
    }

    /// Deserializes a required plain-data argument.
    pub fn arg_as<T: DeserializeOwned>(&self, index: usize, name: &str) -> Result<T, ApplicationError> {
        convert(self.required(index, name)?, name)
    }

    /// Deserializes an optional argument; missing and null both give `None`.
    pub fn optional_as<T: DeserializeOwned>(
        &self,
        index: usize,
        name: &str,
    ) -> Result<Option<T>, ApplicationError> {
        match self.get(index, name)? {
            None | Some(RpcValue::Null) => Ok(None),
            Some(value) => convert(value, name).map(Some),
        }
    }

    /// Borrows a domain-object argument of type `T`.
    pub fn instance<T: Transmittable>(&self, index: usize, name: &str) -> Result<&T, ApplicationError> {
        let value = self.required(index, name)?;
        value.downcast_ref::<T>().ok_or_else(|| {
            ApplicationError::invalid_params(format!(
                "argument '{name}' has the wrong type ({})",
                value.type_name()
            ))
        })
    }

    /// Rejects arguments that no parameter in `names` would bind.
    pub fn accept(&self, names: &[&str]) -> Result<(), ApplicationError> {
        if self.positional.len() > names.len() {
            return Err(ApplicationError::invalid_params(format!(
                "takes at most {} positional arguments ({} given)",
                names.len(),
                self.positional.len()
            )));
        }
        if let Some(unexpected) = self.keyword.keys().find(|key| !names.contains(&key.as_str())) {
            return Err(ApplicationError::invalid_params(format!(
                "got an unexpected keyword argument '{unexpected}'"
            )));
        }
        Ok(())
    }
}

fn convert<T: DeserializeOwned>(value: &RpcValue, name: &str) -> Result<T, ApplicationError> {
    let json = value.as_plain_json().ok_or_else(|| {
        ApplicationError::invalid_params(format!(
            "argument '{name}' must be plain data, got {}",
            value.type_name()
        ))
    })?;
    serde_json::from_value(json)
        .map_err(|err| ApplicationError::invalid_params(format!("argument '{name}': {err}")))
}
