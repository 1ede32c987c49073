//! Method Registry
//!
//! Maps dotted method names to exposed callables.
//!
//! # Architecture
//!
//! A [`MethodRegistry`] holds named [`Namespace`]s plus an optional
//! unnamed default namespace. A method name resolves as:
//!
//! - `divide` - member `divide` of the default namespace
//! - `Calc.divide` - member `divide` of namespace `Calc`
//! - anything with more than one `.` or an empty segment - not found
//!
//! Only methods explicitly added to a namespace are reachable; there is no
//! reflection over a service type.
//!
//! # Example
//!
//! ```
//! use hookrpc_server::{MethodRegistry, Namespace};
//! use hookrpc_common::{CallArgs, RpcValue};
//!
//! let calc = Namespace::new().service_method("add", |args: &CallArgs| {
//!     let a: i64 = args.arg_as(0, "a")?;
//!     let b: i64 = args.arg_as(1, "b")?;
//!     Ok(RpcValue::from(a + b))
//! });
//!
//! let mut registry = MethodRegistry::new();
//! registry.register("Calc", calc);
//!
//! let add = registry.resolve("Calc.add").unwrap();
//! let sum = add(&CallArgs::new().arg(2).arg(3)).unwrap();
//! assert_eq!(sum, RpcValue::from(5));
//! assert!(registry.resolve("Calc.sub").is_err());
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use hookrpc_common::protocol::{CallArgs, RpcValue, ServiceError};

/// An exposed callable.
pub type MethodHandler = Arc<dyn Fn(&CallArgs) -> anyhow::Result<RpcValue> + Send + Sync>;

/// Signature of a method on a [`Service`] type.
pub type ServiceMethod<S> = fn(&S, &CallArgs) -> anyhow::Result<RpcValue>;

/// A type whose instances serve a namespace.
///
/// `service_methods` lists exactly the methods to expose; anything else on
/// the type stays private.
pub trait Service: Send + Sync + 'static {
    fn service_methods() -> Vec<(&'static str, ServiceMethod<Self>)>
    where
        Self: Sized;
}

/// A named group of exposed methods.
#[derive(Clone, Default)]
pub struct Namespace {
    methods: HashMap<String, MethodHandler>,
}

impl Namespace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Exposes `handler` as `name`.
    pub fn service_method<F>(mut self, name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&CallArgs) -> anyhow::Result<RpcValue> + Send + Sync + 'static,
    {
        self.methods.insert(name.into(), Arc::new(handler));
        self
    }

    /// Builds a namespace from the exposed methods of one service instance.
    pub fn from_service<S: Service>(service: Arc<S>) -> Self {
        S::service_methods()
            .into_iter()
            .fold(Self::new(), |namespace, (name, method)| {
                let service = Arc::clone(&service);
                namespace.service_method(name, move |args: &CallArgs| method(&service, args))
            })
    }

    pub fn method(&self, name: &str) -> Option<MethodHandler> {
        self.methods.get(name).cloned()
    }

    pub fn method_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.methods.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}

impl fmt::Debug for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Namespace")
            .field("methods", &self.method_names())
            .finish()
    }
}

/// Namespace table owned by one service.
///
/// Built up front with `&mut self` and shared read-only afterwards, usually
/// behind the `Arc` inside a [`Dispatcher`](crate::Dispatcher).
#[derive(Debug, Clone, Default)]
pub struct MethodRegistry {
    namespaces: HashMap<Option<String>, Namespace>,
}

impl MethodRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `namespace` under `name`, replacing any earlier namespace
    /// of that name.
    pub fn register(&mut self, name: impl Into<String>, namespace: Namespace) -> &mut Self {
        let name = name.into();
        tracing::debug!(
            "Registering namespace {} ({} methods)",
            name,
            namespace.len()
        );
        self.namespaces.insert(Some(name), namespace);
        self
    }

    /// Registers the namespace used for undotted method names.
    pub fn register_default(&mut self, namespace: Namespace) -> &mut Self {
        tracing::debug!("Registering default namespace ({} methods)", namespace.len());
        self.namespaces.insert(None, namespace);
        self
    }

    /// Instantiates `S` once and registers it under `name`.
    pub fn register_service<S: Service + Default>(&mut self, name: impl Into<String>) -> &mut Self {
        self.register_instance(name, Arc::new(S::default()))
    }

    /// Registers an existing service instance under `name`.
    pub fn register_instance<S: Service>(
        &mut self,
        name: impl Into<String>,
        service: Arc<S>,
    ) -> &mut Self {
        self.register(name, Namespace::from_service(service))
    }

    pub fn namespace(&self, name: Option<&str>) -> Option<&Namespace> {
        self.namespaces.get(&name.map(str::to_string))
    }

    /// Resolves a method name to its handler.
    pub fn resolve(&self, method: &str) -> Result<MethodHandler, ServiceError> {
        let not_found = || ServiceError::MethodNotFound(method.to_string());

        let (namespace, name) = match method.split_once('.') {
            None => (None, method),
            Some((namespace, name)) => {
                if namespace.is_empty() || name.is_empty() || name.contains('.') {
                    return Err(not_found());
                }
                (Some(namespace), name)
            }
        };

        self.namespace(namespace)
            .and_then(|namespace| namespace.method(name))
            .ok_or_else(not_found)
    }
}
