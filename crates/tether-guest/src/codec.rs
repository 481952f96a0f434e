//! Payload codecs for the boundary.
//!
//! Two encodings cross the boundary. Addressing metadata (owner identity,
//! resource selectors, findings, mutations) travels as protobuf through
//! [`prost`]; application payloads (specs, resource bodies) travel as UTF-8
//! JSON through [`serde_json`].
//!
//! Decoders are plain functions with the shape [`DecodeFn`]; the client
//! facade is parameterised over one of them per call instead of reflecting
//! on the target type at runtime.

use prost::encoding::{encode_key, encode_varint, WireType};
use prost::DecodeError;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::GuestError;

pub use prost::Message;

/// Turns an owned payload into a typed value.
pub type DecodeFn<T> = fn(Vec<u8>) -> Result<T, GuestError>;

/// Encode a protobuf message into a fresh buffer.
pub fn encode<M: Message>(msg: &M) -> Vec<u8> {
    msg.encode_to_vec()
}

/// Decode a protobuf message. Unknown fields are skipped.
pub fn decode<M: Message + Default>(bytes: Vec<u8>) -> Result<M, GuestError> {
    Ok(M::decode(bytes.as_slice())?)
}

/// Decode a UTF-8 JSON payload.
pub fn decode_json<T: DeserializeOwned>(bytes: Vec<u8>) -> Result<T, GuestError> {
    let text = String::from_utf8(bytes)?;
    Ok(serde_json::from_str(&text)?)
}

/// Encode a value as JSON text.
pub fn encode_json<T: Serialize + ?Sized>(value: &T) -> Result<String, GuestError> {
    Ok(serde_json::to_string(value)?)
}

/// Attach `message.field` to a decode error, the way generated code does.
pub(crate) fn in_field(
    message: &'static str,
    field: &'static str,
) -> impl FnOnce(DecodeError) -> DecodeError {
    move |mut err| {
        err.push(message, field);
        err
    }
}

/// Append a field this schema does not know about. Used to exercise
/// forward compatibility in tests and by the fake host.
pub fn append_unknown_varint(buf: &mut Vec<u8>, tag: u32, value: u64) {
    encode_key(tag, WireType::Varint, buf);
    encode_varint(value, buf);
}

/// Length-delimited counterpart of [`append_unknown_varint`].
pub fn append_unknown_bytes(buf: &mut Vec<u8>, tag: u32, value: &[u8]) {
    encode_key(tag, WireType::LengthDelimited, buf);
    encode_varint(value.len() as u64, buf);
    buf.extend_from_slice(value);
}
