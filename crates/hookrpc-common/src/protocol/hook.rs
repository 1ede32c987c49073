//! Object hooks
//!
//! Domain objects travel as a tagged JSON structure:
//!
//! ```json
//! {"__classhook__": {
//!     "name": "Person",
//!     "__init__": {"__args__": ["shawn", "adams"], "__kwargs__": {"middle": "m"}}
//! }}
//! ```
//!
//! Encoding asks the object for its [`ReconstructionSpec`] and reads the
//! named attributes. Decoding looks `name` up in an [`ObjectHookRegistry`]
//! and calls the registered handler with the declared arguments.
//!
//! # Example
//!
//! ```
//! use hookrpc_common::protocol::{
//!     CallArgs, ObjectHookRegistry, Reconstruct, ReconstructionSpec, RpcValue, Transmittable,
//! };
//! use std::any::Any;
//!
//! #[derive(Debug, PartialEq)]
//! struct Person { first: String, middle: Option<String> }
//!
//! impl Transmittable for Person {
//!     fn class_name(&self) -> &str { Self::CLASS_NAME }
//!     fn reconstruction_spec(&self) -> ReconstructionSpec {
//!         ReconstructionSpec::new().positional("first").keyword("middle", "middle")
//!     }
//!     fn attribute(&self, name: &str) -> Option<RpcValue> {
//!         match name {
//!             "first" => Some(self.first.as_str().into()),
//!             "middle" => Some(self.middle.clone().into()),
//!             _ => None,
//!         }
//!     }
//!     fn as_any(&self) -> &dyn Any { self }
//! }
//!
//! impl Reconstruct for Person {
//!     const CLASS_NAME: &'static str = "Person";
//!     fn reconstruct(args: CallArgs) -> anyhow::Result<Self> {
//!         Ok(Person { first: args.arg_as(0, "first")?, middle: args.optional_as(1, "middle")? })
//!     }
//! }
//!
//! let hooks = ObjectHookRegistry::new();
//! hooks.register_type::<Person>();
//!
//! let person = RpcValue::instance(Person { first: "shawn".into(), middle: None });
//! let wire = hooks.encode(&person).unwrap();
//! let back = hooks.decode(wire).unwrap();
//! assert_eq!(back.downcast_ref::<Person>(), person.downcast_ref::<Person>());
//! ```

use serde_json::{Map, Value};
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use super::error::HookError;
use super::params::{split_signature, CallArgs, ARGS_KEY, KWARGS_KEY};
use super::value::{RpcMap, RpcValue};

/// Tag marking an encoded domain object
pub const CLASSHOOK_KEY: &str = "__classhook__";
/// Class name member of the descriptor
pub const HOOK_NAME_KEY: &str = "name";
/// Constructor-argument member of the descriptor
pub const HOOK_INIT_KEY: &str = "__init__";

/// A domain object that can cross the wire.
pub trait Transmittable: fmt::Debug + Send + Sync + 'static {
    /// Name written to the descriptor and used for the registry lookup.
    fn class_name(&self) -> &str;

    /// How to rebuild this object. The default declares no arguments, so
    /// the receiving side constructs it with an empty argument list.
    fn reconstruction_spec(&self) -> ReconstructionSpec {
        ReconstructionSpec::default()
    }

    /// Reads an attribute named in the reconstruction spec.
    fn attribute(&self, name: &str) -> Option<RpcValue>;

    fn as_any(&self) -> &dyn Any;
}

/// A [`Transmittable`] that knows how to rebuild itself, for use with
/// [`ObjectHookRegistry::register_type`].
pub trait Reconstruct: Transmittable + Sized {
    const CLASS_NAME: &'static str;

    fn reconstruct(args: CallArgs) -> anyhow::Result<Self>;
}

/// Which attributes feed which constructor slots.
///
/// Positional slots keep their declaration order. Keyword slots map a
/// keyword name to the attribute holding its value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconstructionSpec {
    positional: Vec<String>,
    keyword: Vec<(String, String)>,
    skip_null_keywords: bool,
}

impl ReconstructionSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn positional(mut self, attribute: impl Into<String>) -> Self {
        self.positional.push(attribute.into());
        self
    }

    pub fn keyword(mut self, name: impl Into<String>, attribute: impl Into<String>) -> Self {
        self.keyword.push((name.into(), attribute.into()));
        self
    }

    /// Leave out keyword entries whose attribute is null.
    pub fn skip_null_keywords(mut self) -> Self {
        self.skip_null_keywords = true;
        self
    }

    pub fn positional_attributes(&self) -> &[String] {
        &self.positional
    }

    pub fn keyword_attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.keyword
            .iter()
            .map(|(name, attribute)| (name.as_str(), attribute.as_str()))
    }

    pub fn skips_null_keywords(&self) -> bool {
        self.skip_null_keywords
    }
}

type HookHandler = Arc<dyn Fn(CallArgs) -> anyhow::Result<Arc<dyn Transmittable>> + Send + Sync>;

/// Class-name to reconstruction-handler table.
///
/// Each registry owns its table; share one between a dispatcher and a
/// client by wrapping it in an `Arc`. Registration takes `&self`, so hooks
/// can be added after startup. A new hook is visible to decodes that look
/// the class up after the registration returns.
#[derive(Default)]
pub struct ObjectHookRegistry {
    hooks: RwLock<HashMap<String, HookHandler>>,
}

impl ObjectHookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler for `class_name`, replacing any previous one.
    pub fn register<F>(&self, class_name: impl Into<String>, handler: F)
    where
        F: Fn(CallArgs) -> anyhow::Result<Arc<dyn Transmittable>> + Send + Sync + 'static,
    {
        let class_name = class_name.into();
        tracing::debug!("Registering object hook for class {}", class_name);
        let previous = self
            .hooks
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(class_name.clone(), Arc::new(handler));
        if previous.is_some() {
            tracing::warn!("Object hook for class {} replaced", class_name);
        }
    }

    /// Registers `T` under [`Reconstruct::CLASS_NAME`].
    pub fn register_type<T: Reconstruct>(&self) {
        self.register(T::CLASS_NAME, |args| {
            T::reconstruct(args).map(|object| Arc::new(object) as Arc<dyn Transmittable>)
        });
    }

    pub fn contains(&self, class_name: &str) -> bool {
        self.hooks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(class_name)
    }

    pub fn class_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .hooks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }

    fn handler(&self, class_name: &str) -> Option<HookHandler> {
        self.hooks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(class_name)
            .cloned()
    }

    /// Decodes a JSON value, rebuilding every `__classhook__` descriptor.
    ///
    /// Inner values are decoded first, so constructor arguments may
    /// themselves be domain objects.
    pub fn decode(&self, value: Value) -> Result<RpcValue, HookError> {
        match value {
            Value::Array(items) => items
                .into_iter()
                .map(|item| self.decode(item))
                .collect::<Result<Vec<_>, _>>()
                .map(RpcValue::Array),
            Value::Object(fields) => {
                let mut object = RpcMap::new();
                for (key, field) in fields {
                    object.insert(key, self.decode(field)?);
                }
                self.apply_hook(object)
            }
            scalar => Ok(RpcValue::from(scalar)),
        }
    }

    fn apply_hook(&self, mut object: RpcMap) -> Result<RpcValue, HookError> {
        let Some(hint) = object.remove(CLASSHOOK_KEY) else {
            return Ok(RpcValue::Object(object));
        };
        let mut hint = match hint {
            RpcValue::Object(hint) => hint,
            other => {
                return Err(HookError::Malformed(format!(
                    "`{}` must be an object, got {}",
                    CLASSHOOK_KEY,
                    other.type_name()
                )))
            }
        };
        let name = match hint.remove(HOOK_NAME_KEY) {
            Some(RpcValue::String(name)) => name,
            _ => {
                return Err(HookError::Malformed(format!(
                    "`{}` requires a string `{}`",
                    CLASSHOOK_KEY, HOOK_NAME_KEY
                )))
            }
        };

        let handler = self
            .handler(&name)
            .ok_or_else(|| HookError::UnknownClass(name.clone()))?;

        let args = match hint.remove(HOOK_INIT_KEY) {
            None | Some(RpcValue::Null) => CallArgs::default(),
            Some(RpcValue::Object(mut init)) => {
                let (positional, keyword) =
                    split_signature(&mut init).map_err(HookError::Malformed)?;
                CallArgs::from_parts(positional.unwrap_or_default(), keyword.unwrap_or_default())
            }
            Some(other) => {
                return Err(HookError::Malformed(format!(
                    "`{}` must be an object, got {}",
                    HOOK_INIT_KEY,
                    other.type_name()
                )))
            }
        };

        handler(args)
            .map(RpcValue::Instance)
            .map_err(|err| HookError::Construction {
                class: name,
                message: format!("{err:#}"),
            })
    }

    /// Encodes a value, describing domain objects through their
    /// reconstruction spec.
    pub fn encode(&self, value: &RpcValue) -> Result<Value, HookError> {
        encode_value(value)
    }
}

impl fmt::Debug for ObjectHookRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectHookRegistry")
            .field("classes", &self.class_names())
            .finish()
    }
}

/// Encodes a value without needing a registry; the objects describe
/// themselves.
pub fn encode_value(value: &RpcValue) -> Result<Value, HookError> {
    Ok(match value {
        RpcValue::Null => Value::Null,
        RpcValue::Bool(b) => Value::Bool(*b),
        RpcValue::Number(n) => Value::Number(n.clone()),
        RpcValue::String(s) => Value::String(s.clone()),
        RpcValue::Array(items) => Value::Array(
            items
                .iter()
                .map(encode_value)
                .collect::<Result<Vec<_>, _>>()?,
        ),
        RpcValue::Object(map) => {
            let mut out = Map::with_capacity(map.len());
            for (key, field) in map {
                out.insert(key.clone(), encode_value(field)?);
            }
            Value::Object(out)
        }
        RpcValue::Instance(object) => encode_instance(object.as_ref())?,
    })
}

fn encode_instance(object: &dyn Transmittable) -> Result<Value, HookError> {
    let spec = object.reconstruction_spec();
    let read = |attribute: &str| {
        object
            .attribute(attribute)
            .ok_or_else(|| HookError::MissingAttribute {
                class: object.class_name().to_string(),
                attribute: attribute.to_string(),
            })
    };

    let mut init = Map::new();
    if !spec.positional.is_empty() {
        let mut args = Vec::with_capacity(spec.positional.len());
        for attribute in &spec.positional {
            args.push(encode_value(&read(attribute)?)?);
        }
        init.insert(ARGS_KEY.to_string(), Value::Array(args));
    }
    if !spec.keyword.is_empty() {
        let mut kwargs = Map::new();
        for (name, attribute) in &spec.keyword {
            let value = read(attribute)?;
            if spec.skip_null_keywords && value.is_null() {
                continue;
            }
            kwargs.insert(name.clone(), encode_value(&value)?);
        }
        init.insert(KWARGS_KEY.to_string(), Value::Object(kwargs));
    }

    let mut hint = Map::new();
    hint.insert(
        HOOK_NAME_KEY.to_string(),
        Value::String(object.class_name().to_string()),
    );
    hint.insert(HOOK_INIT_KEY.to_string(), Value::Object(init));

    let mut descriptor = Map::new();
    descriptor.insert(CLASSHOOK_KEY.to_string(), Value::Object(hint));
    Ok(Value::Object(descriptor))
}
