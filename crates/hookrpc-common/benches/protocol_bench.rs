// Criterion benchmarks for the hookrpc-common protocol layer
//
// Run benchmarks with:
//   cargo bench -p hookrpc-common

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use hookrpc_common::{
    encode_value, CallArgs, ErrorMapper, ObjectHookRegistry, Reconstruct, ReconstructionSpec,
    RequestEnvelope, RequestMeta, ResponseBuilder, RpcValue, ServiceError, Transmittable,
};
use serde_json::json;
use std::any::Any;

#[derive(Debug)]
struct Vector {
    x: f64,
    y: f64,
}

impl Transmittable for Vector {
    fn class_name(&self) -> &str {
        Self::CLASS_NAME
    }

    fn reconstruction_spec(&self) -> ReconstructionSpec {
        ReconstructionSpec::new().positional("x").keyword("y", "y")
    }

    fn attribute(&self, name: &str) -> Option<RpcValue> {
        match name {
            "x" => Some(self.x.into()),
            "y" => Some(self.y.into()),
            _ => None,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Reconstruct for Vector {
    const CLASS_NAME: &'static str = "Vector";

    fn reconstruct(args: CallArgs) -> anyhow::Result<Self> {
        Ok(Vector {
            x: args.arg_as(0, "x")?,
            y: args.arg_as(1, "y")?,
        })
    }
}

fn bench_request_decoding(c: &mut Criterion) {
    let mut group = c.benchmark_group("request_decoding");
    let hooks = ObjectHookRegistry::new();
    hooks.register_type::<Vector>();

    let positional = r#"{"jsonrpc":"2.0","method":"Calc.divide","params":[10,2],"id":1}"#;
    let mixed = r#"{"jsonrpc":"2.0","__subspec__":"1a","method":"Calc.divide","params":{"__args__":[10],"__kwargs__":{"b":2}},"id":2}"#;
    let hooked = serde_json::to_string(&json!({
        "jsonrpc": "2.0", "method": "Geometry.sum", "id": 3,
        "params": (0..16).map(|i| json!({"__classhook__": {
            "name": "Vector", "__init__": {"__args__": [i], "__kwargs__": {"y": i}}
        }})).collect::<Vec<_>>()
    }))
    .unwrap_or_default();

    for (name, text) in [("positional", positional), ("mixed", mixed), ("hooked", hooked.as_str())] {
        group.bench_function(name, |b| {
            b.iter(|| {
                let message = serde_json::from_str(black_box(text)).unwrap_or_default();
                RequestEnvelope::decode(message, &hooks).map(|request| request.params.into_call_args())
            })
        });
    }

    group.finish();
}

fn bench_hook_encoding(c: &mut Criterion) {
    let mut group = c.benchmark_group("hook_encoding");
    let single = RpcValue::instance(Vector { x: 1.0, y: 2.0 });
    let many = RpcValue::Array(
        (0..64)
            .map(|i| RpcValue::instance(Vector { x: i as f64, y: -(i as f64) }))
            .collect(),
    );

    group.bench_function("single", |b| b.iter(|| encode_value(black_box(&single))));
    group.bench_function("array_64", |b| b.iter(|| encode_value(black_box(&many))));

    group.finish();
}

fn bench_response_serialization(c: &mut Criterion) {
    let mut group = c.benchmark_group("response_serialization");
    let meta = RequestMeta {
        version: Some("2.0".into()),
        id: Some(json!(1)),
        subspec: Some("1a".into()),
    };

    let success = ResponseBuilder::success(&meta, json!({"result": 42}));
    let error = ErrorMapper::to_error_envelope(
        &ServiceError::MethodNotFound("Calc.nope".into()),
        &meta,
        false,
    );

    group.bench_function("serialize_success", |b| {
        b.iter(|| black_box(&success).to_json_string())
    });
    group.bench_function("serialize_error", |b| {
        b.iter(|| black_box(&error).to_json_string())
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_request_decoding,
    bench_hook_encoding,
    bench_response_serialization,
);
criterion_main!(benches);
