pub mod error;
pub mod hook;
pub mod params;
pub mod requests;
pub mod responses;
pub mod value;


pub use error::{
    ApplicationError, HookError, ServiceError, INTERNAL_ERROR, INVALID_PARAMS, INVALID_REQUEST,
    METHOD_NOT_FOUND, PARSE_ERROR, SERVER_ERROR,
};
pub use hook::{
    encode_value, ObjectHookRegistry, Reconstruct, ReconstructionSpec, Transmittable,
    CLASSHOOK_KEY,
};
pub use params::{bind, CallArgs, Params, ARGS_KEY, KWARGS_KEY, SUBSPEC_1A};
pub use requests::{RequestEnvelope, RequestMeta, JSONRPC_VERSION, SUBSPEC_KEY};
pub use responses::{ErrorMapper, ErrorPayload, Outcome, ResponseBuilder, ResponseEnvelope};
pub use value::{RpcMap, RpcValue};
