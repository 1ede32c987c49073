// Copyright 2025 HookRPC Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Demo service
//!
//! What `hookrpc serve` and `hookrpc cgi` expose:
//!
//! - `divide(a, b)` and `Calc.divide(a, b)`: floor division for integers,
//!   true division otherwise
//! - `Geometry.midpoint(a, b)`: midpoint of two `Point`s
//! - `Geometry.translate(p, dx=0, dy=0)`: a moved copy of `p`
//!
//! `Point` is registered as an object hook, so points travel as
//! `__classhook__` descriptors in both directions.

use std::any::Any;
use std::sync::Arc;

use hookrpc_common::protocol::{
    ApplicationError, CallArgs, ObjectHookRegistry, Reconstruct, ReconstructionSpec, RpcValue,
    Transmittable,
};
use hookrpc_server::{Dispatcher, MethodRegistry, Namespace, Service, ServiceMethod};

/// Arithmetic service.
#[derive(Debug, Default)]
pub struct TestService;

impl TestService {
    fn divide(&self, args: &CallArgs) -> anyhow::Result<RpcValue> {
        args.accept(&["a", "b"])?;
        let a = args.required(0, "a")?;
        let b = args.required(1, "b")?;
        Ok(divide(a, b)?)
    }
}

impl Service for TestService {
    fn service_methods() -> Vec<(&'static str, ServiceMethod<Self>)> {
        vec![("divide", TestService::divide as ServiceMethod<Self>)]
    }
}

/// Divides two numbers, flooring when both are integers.
pub fn divide(a: &RpcValue, b: &RpcValue) -> Result<RpcValue, ApplicationError> {
    if let (Some(a), Some(b)) = (a.as_i64(), b.as_i64()) {
        return floor_div(a, b).map(RpcValue::from);
    }

    match (a.as_f64(), b.as_f64()) {
        (Some(_), Some(b)) if b == 0.0 => Err(ApplicationError::new("float division by zero")),
        (Some(a), Some(b)) => Ok(RpcValue::from_f64(a / b)),
        _ => Err(ApplicationError::invalid_params(format!(
            "unsupported operand type(s) for /: '{}' and '{}'",
            a.type_name(),
            b.type_name()
        ))),
    }
}

fn floor_div(a: i64, b: i64) -> Result<i64, ApplicationError> {
    if b == 0 {
        return Err(ApplicationError::new("integer division or modulo by zero"));
    }
    let overflow = || ApplicationError::new("integer division overflow");
    let quotient = a.checked_div(b).ok_or_else(overflow)?;
    let remainder = a.checked_rem(b).ok_or_else(overflow)?;
    if remainder != 0 && (remainder < 0) != (b < 0) {
        Ok(quotient - 1)
    } else {
        Ok(quotient)
    }
}

/// A point in the plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl Transmittable for Point {
    fn class_name(&self) -> &str {
        Self::CLASS_NAME
    }

    fn reconstruction_spec(&self) -> ReconstructionSpec {
        ReconstructionSpec::new().positional("x").positional("y")
    }

    fn attribute(&self, name: &str) -> Option<RpcValue> {
        match name {
            "x" => Some(RpcValue::from_f64(self.x)),
            "y" => Some(RpcValue::from_f64(self.y)),
            _ => None,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Reconstruct for Point {
    const CLASS_NAME: &'static str = "Point";

    fn reconstruct(args: CallArgs) -> anyhow::Result<Self> {
        args.accept(&["x", "y"])?;
        Ok(Point::new(args.arg_as(0, "x")?, args.arg_as(1, "y")?))
    }
}

fn geometry() -> Namespace {
    Namespace::new()
        .service_method("midpoint", |args: &CallArgs| {
            args.accept(&["a", "b"])?;
            let a = args.instance::<Point>(0, "a")?;
            let b = args.instance::<Point>(1, "b")?;
            Ok(RpcValue::instance(Point::new(
                (a.x + b.x) / 2.0,
                (a.y + b.y) / 2.0,
            )))
        })
        .service_method("translate", |args: &CallArgs| {
            args.accept(&["p", "dx", "dy"])?;
            let p = args.instance::<Point>(0, "p")?;
            let dx: f64 = args.optional_as(1, "dx")?.unwrap_or(0.0);
            let dy: f64 = args.optional_as(2, "dy")?.unwrap_or(0.0);
            Ok(RpcValue::instance(Point::new(p.x + dx, p.y + dy)))
        })
}

/// Method table of the demo service.
pub fn demo_methods() -> MethodRegistry {
    let service = Arc::new(TestService);
    let mut methods = MethodRegistry::new();
    methods
        .register_default(Namespace::from_service(Arc::clone(&service)))
        .register_instance("Calc", service)
        .register("Geometry", geometry());
    methods
}

/// Object hooks of the demo service.
pub fn demo_hooks() -> Arc<ObjectHookRegistry> {
    let hooks = ObjectHookRegistry::new();
    hooks.register_type::<Point>();
    Arc::new(hooks)
}

pub fn demo_dispatcher(show_stack_trace: bool) -> Dispatcher {
    Dispatcher::with_hooks(demo_methods(), demo_hooks()).with_stack_trace(show_stack_trace)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn call(request: Value) -> Value {
        let raw = demo_dispatcher(false).handle(request.to_string());
        serde_json::from_str(&raw).unwrap()
    }

    fn point(x: f64, y: f64) -> Value {
        json!({"__classhook__": {"name": "Point", "__init__": {"__args__": [x, y]}}})
    }

    #[test]
    fn test_floor_division() {
        assert_eq!(floor_div(7, 2).unwrap(), 3);
        assert_eq!(floor_div(-7, 2).unwrap(), -4);
        assert_eq!(floor_div(7, -2).unwrap(), -4);
        assert_eq!(floor_div(-8, 2).unwrap(), -4);
        assert!(floor_div(1, 0).is_err());
        assert!(floor_div(i64::MIN, -1).is_err());
    }

    #[test]
    fn test_divide_mixed_params() {
        let response = call(json!({
            "jsonrpc": "2.0", "__subspec__": "1a", "id": 1, "method": "Calc.divide",
            "params": {"__args__": [10], "__kwargs__": {"b": 4}}
        }));
        assert_eq!(
            response,
            json!({"jsonrpc": "2.0", "__subspec__": "1a", "id": 1, "result": 2})
        );
    }

    #[test]
    fn test_divide_default_namespace_floats() {
        let response = call(json!({
            "jsonrpc": "2.0", "id": 1, "method": "divide", "params": {"a": 1.0, "b": 4}
        }));
        assert_eq!(response["result"], json!(0.25));
    }

    #[test]
    fn test_divide_by_zero() {
        let response = call(json!({
            "jsonrpc": "2.0", "id": 2, "method": "divide", "params": [1, 0]
        }));
        assert_eq!(response["code"], json!(-32000));
        assert_eq!(response["error"], json!("integer division or modulo by zero"));
    }

    #[test]
    fn test_divide_rejects_strings() {
        let response = call(json!({
            "jsonrpc": "2.0", "id": 3, "method": "divide", "params": ["1", 2]
        }));
        assert_eq!(response["code"], json!(-32602));
    }

    #[test]
    fn test_midpoint_round_trip() {
        let response = call(json!({
            "jsonrpc": "2.0", "id": 4, "method": "Geometry.midpoint",
            "params": [point(0.0, 0.0), point(2.0, 4.0)]
        }));
        assert_eq!(response["result"], point(1.0, 2.0));
    }

    #[test]
    fn test_translate_defaults() {
        let response = call(json!({
            "jsonrpc": "2.0", "__subspec__": "1a", "id": 5, "method": "Geometry.translate",
            "params": {"__args__": [point(1.0, 1.0)], "__kwargs__": {"dy": 2.5}}
        }));
        assert_eq!(response["result"], point(1.0, 3.5));
    }

    #[test]
    fn test_midpoint_needs_points() {
        let response = call(json!({
            "jsonrpc": "2.0", "id": 6, "method": "Geometry.midpoint", "params": [1, 2]
        }));
        assert_eq!(response["code"], json!(-32602));
    }
}
