//! Protobuf codec for [`Message`].
//!
//! Bulk columns are packed repeated fields. Structured payloads (render
//! config, recorded pictures) travel as `google.protobuf.Value` trees built
//! from their serde JSON form.

use std::sync::Arc;

use canvas::camera::AxisBounds;
use canvas::surface::Picture;
use prost::Message as _;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::{Completion, DataUpdate, Geometry, Message, RenderKind, RenderTask, WorkerInit};

/// Largest integer an f64 holds exactly.
const MAX_EXACT_INT: f64 = 9_007_199_254_740_992.0;

/// Codec error for decoding and converting protocol messages.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("failed to decode protobuf message: {0}")]
    Decode(#[from] prost::DecodeError),
    #[error("invalid message kind value: {0}")]
    InvalidKind(i32),
    #[error("invalid render kind value: {0}")]
    InvalidRenderKind(i32),
    #[error("`{0}` message is missing its {1}")]
    MissingField(&'static str, &'static str),
    #[error("{0} does not fit in this platform's index type")]
    IndexOutOfRange(&'static str),
    #[error("payload conversion failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// Encode a message into protobuf bytes.
///
/// # Errors
///
/// Returns [`CodecError::Json`] if a structured payload cannot be
/// represented as a JSON value.
pub fn encode_message(message: &Message) -> Result<Vec<u8>, CodecError> {
    let wire = message_to_wire(message)?;
    let mut out = Vec::with_capacity(wire.encoded_len());
    // A growable Vec never reports `BufferTooSmall`.
    wire.encode(&mut out).unwrap_or_default();
    Ok(out)
}

/// Decode protobuf bytes into a message.
///
/// # Errors
///
/// Returns [`CodecError::Decode`] for malformed bytes,
/// [`CodecError::InvalidKind`] / [`CodecError::InvalidRenderKind`] for
/// out-of-range enum values, [`CodecError::MissingField`] when a message
/// lacks a required part, and [`CodecError::Json`] when a structured
/// payload does not match its type.
pub fn decode_message(bytes: &[u8]) -> Result<Message, CodecError> {
    let wire = WireMessage::decode(bytes)?;
    wire_to_message(wire)
}

fn message_to_wire(message: &Message) -> Result<WireMessage, CodecError> {
    let mut wire = WireMessage::default();
    match message {
        Message::Init(init) => {
            wire.kind = WireKind::Init as i32;
            wire.config = Some(to_value(&init.config)?);
        }
        Message::Reset => wire.kind = WireKind::Reset as i32,
        Message::Data(data) => {
            wire.kind = WireKind::Data as i32;
            wire.data = Some(data_to_wire(data));
        }
        Message::AddTarget { index } => {
            wire.kind = WireKind::AddTarget as i32;
            wire.target = index_to_wire(*index);
        }
        Message::RenderPlot(task) | Message::RenderSelection(task) => {
            wire.kind = if matches!(message, Message::RenderPlot(_)) {
                WireKind::RenderPlot as i32
            } else {
                WireKind::RenderSelection as i32
            };
            wire.uid = task.uid;
            wire.target = index_to_wire(task.target);
            wire.geometry = Some(geometry_to_wire(&task.geometry));
        }
        Message::Completion(done) => {
            wire.kind = WireKind::Completion as i32;
            wire.uid = done.uid;
            wire.target = index_to_wire(done.target);
            wire.render_kind = match done.kind {
                RenderKind::Plot => WireRenderKind::Plot as i32,
                RenderKind::Selection => WireRenderKind::Selection as i32,
            };
            wire.main = done.main.as_ref().map(to_value).transpose()?;
            wire.highlight = done.highlight.as_ref().map(to_value).transpose()?;
            wire.selection = done.selection.as_ref().map(to_value).transpose()?;
        }
    }
    Ok(wire)
}

fn wire_to_message(wire: WireMessage) -> Result<Message, CodecError> {
    let kind = WireKind::try_from(wire.kind).map_err(|_| CodecError::InvalidKind(wire.kind))?;
    Ok(match kind {
        WireKind::Init => {
            let config = wire.config.ok_or(CodecError::MissingField("init", "config"))?;
            Message::Init(WorkerInit { config: from_value(&config)? })
        }
        WireKind::Reset => Message::Reset,
        WireKind::Data => Message::Data(wire.data.map(wire_to_data).unwrap_or_default()),
        WireKind::AddTarget => Message::AddTarget { index: index_from_wire(wire.target)? },
        WireKind::RenderPlot => Message::RenderPlot(wire_to_task("plot", &wire)?),
        WireKind::RenderSelection => Message::RenderSelection(wire_to_task("sele", &wire)?),
        WireKind::Completion => {
            let kind = match WireRenderKind::try_from(wire.render_kind) {
                Ok(WireRenderKind::Plot) => RenderKind::Plot,
                Ok(WireRenderKind::Selection) => RenderKind::Selection,
                Err(_) => return Err(CodecError::InvalidRenderKind(wire.render_kind)),
            };
            Message::Completion(Completion {
                uid: wire.uid,
                target: index_from_wire(wire.target)?,
                kind,
                main: picture_from_wire(wire.main.as_ref())?,
                highlight: picture_from_wire(wire.highlight.as_ref())?,
                selection: picture_from_wire(wire.selection.as_ref())?,
            })
        }
    })
}

fn wire_to_task(name: &'static str, wire: &WireMessage) -> Result<RenderTask, CodecError> {
    let geometry = wire.geometry.as_ref().ok_or(CodecError::MissingField(name, "geometry"))?;
    Ok(RenderTask {
        uid: wire.uid,
        target: index_from_wire(wire.target)?,
        geometry: Geometry {
            width: geometry.width,
            height: geometry.height,
            pan_x: geometry.pan_x,
            pan_y: geometry.pan_y,
            scale: geometry.scale,
        },
    })
}

fn geometry_to_wire(geometry: &Geometry) -> WireGeometry {
    WireGeometry {
        width: geometry.width,
        height: geometry.height,
        pan_x: geometry.pan_x,
        pan_y: geometry.pan_y,
        scale: geometry.scale,
    }
}

fn data_to_wire(data: &DataUpdate) -> WireData {
    let floats = |v: &[f64]| WireFloats { values: v.to_vec() };
    let flags = |v: &[bool]| WireFlags { values: v.to_vec() };
    WireData {
        x: data.x.as_deref().map(floats),
        y: data.y.as_deref().map(floats),
        size: data.size.as_deref().map(floats),
        color: data.color.as_deref().map(|v| WireStrings { values: v.to_vec() }),
        masked: data.masked.as_deref().map(flags),
        picked: data.picked.as_deref().map(flags),
        highlighted: data.highlighted.as_deref().map(<[u8]>::to_vec),
        bounds: data.bounds.map(|b| WireBounds {
            x_min: b.x_min,
            x_max: b.x_max,
            y_min: b.y_min,
            y_max: b.y_max,
        }),
    }
}

fn wire_to_data(wire: WireData) -> DataUpdate {
    DataUpdate {
        x: wire.x.map(|f| Arc::from(f.values)),
        y: wire.y.map(|f| Arc::from(f.values)),
        size: wire.size.map(|f| Arc::from(f.values)),
        color: wire.color.map(|s| Arc::from(s.values)),
        masked: wire.masked.map(|f| Arc::from(f.values)),
        picked: wire.picked.map(|f| Arc::from(f.values)),
        highlighted: wire.highlighted.map(Arc::from),
        bounds: wire.bounds.map(|b| AxisBounds::new(b.x_min, b.x_max, b.y_min, b.y_max)),
    }
}

fn index_to_wire(index: usize) -> u64 {
    u64::try_from(index).unwrap_or(u64::MAX)
}

fn index_from_wire(value: u64) -> Result<usize, CodecError> {
    usize::try_from(value).map_err(|_| CodecError::IndexOutOfRange("target"))
}

fn picture_from_wire(value: Option<&prost_types::Value>) -> Result<Option<Picture>, CodecError> {
    value.map(from_value).transpose()
}

fn to_value<T: Serialize>(payload: &T) -> Result<prost_types::Value, CodecError> {
    Ok(json_to_proto_value(&serde_json::to_value(payload)?))
}

fn from_value<T: DeserializeOwned>(value: &prost_types::Value) -> Result<T, CodecError> {
    Ok(serde_json::from_value(proto_to_json_value(value))?)
}

fn json_to_proto_value(value: &Value) -> prost_types::Value {
    let kind = match value {
        Value::Null => {
            prost_types::value::Kind::NullValue(prost_types::NullValue::NullValue as i32)
        }
        Value::Bool(v) => prost_types::value::Kind::BoolValue(*v),
        Value::Number(v) => prost_types::value::Kind::NumberValue(v.as_f64().unwrap_or(0.0)),
        Value::String(v) => prost_types::value::Kind::StringValue(v.clone()),
        Value::Array(v) => prost_types::value::Kind::ListValue(prost_types::ListValue {
            values: v.iter().map(json_to_proto_value).collect(),
        }),
        Value::Object(v) => prost_types::value::Kind::StructValue(prost_types::Struct {
            fields: v
                .iter()
                .map(|(k, v)| (k.clone(), json_to_proto_value(v)))
                .collect(),
        }),
    };

    prost_types::Value { kind: Some(kind) }
}

/// Integral numbers come back as JSON integers so that integer-typed
/// fields (chunk sizes, tick counts) deserialize.
#[allow(clippy::cast_possible_truncation, clippy::float_cmp)]
fn number_to_json(v: f64) -> Value {
    if v.is_finite() && v.fract() == 0.0 && v.abs() <= MAX_EXACT_INT {
        return Value::from(v as i64);
    }
    serde_json::Number::from_f64(v).map_or(Value::Null, Value::Number)
}

fn proto_to_json_value(value: &prost_types::Value) -> Value {
    let Some(kind) = &value.kind else {
        return Value::Null;
    };

    match kind {
        prost_types::value::Kind::NullValue(_) => Value::Null,
        prost_types::value::Kind::NumberValue(v) => number_to_json(*v),
        prost_types::value::Kind::StringValue(v) => Value::String(v.clone()),
        prost_types::value::Kind::BoolValue(v) => Value::Bool(*v),
        prost_types::value::Kind::StructValue(v) => Value::Object(
            v.fields
                .iter()
                .map(|(k, v)| (k.clone(), proto_to_json_value(v)))
                .collect(),
        ),
        prost_types::value::Kind::ListValue(v) => {
            Value::Array(v.values.iter().map(proto_to_json_value).collect())
        }
    }
}

#[derive(Clone, PartialEq, prost::Message)]
struct WireMessage {
    #[prost(enumeration = "WireKind", tag = "1")]
    kind: i32,
    #[prost(uint64, tag = "2")]
    uid: u64,
    #[prost(uint64, tag = "3")]
    target: u64,
    #[prost(message, optional, tag = "4")]
    geometry: Option<WireGeometry>,
    #[prost(message, optional, tag = "5")]
    data: Option<WireData>,
    #[prost(message, optional, tag = "6")]
    config: Option<prost_types::Value>,
    #[prost(enumeration = "WireRenderKind", tag = "7")]
    render_kind: i32,
    #[prost(message, optional, tag = "8")]
    main: Option<prost_types::Value>,
    #[prost(message, optional, tag = "9")]
    highlight: Option<prost_types::Value>,
    #[prost(message, optional, tag = "10")]
    selection: Option<prost_types::Value>,
}

#[derive(Clone, PartialEq, prost::Message)]
struct WireGeometry {
    #[prost(double, tag = "1")]
    width: f64,
    #[prost(double, tag = "2")]
    height: f64,
    #[prost(double, tag = "3")]
    pan_x: f64,
    #[prost(double, tag = "4")]
    pan_y: f64,
    #[prost(double, tag = "5")]
    scale: f64,
}

#[derive(Clone, PartialEq, prost::Message)]
struct WireData {
    #[prost(message, optional, tag = "1")]
    x: Option<WireFloats>,
    #[prost(message, optional, tag = "2")]
    y: Option<WireFloats>,
    #[prost(message, optional, tag = "3")]
    size: Option<WireFloats>,
    #[prost(message, optional, tag = "4")]
    color: Option<WireStrings>,
    #[prost(message, optional, tag = "5")]
    masked: Option<WireFlags>,
    #[prost(message, optional, tag = "6")]
    picked: Option<WireFlags>,
    #[prost(bytes = "vec", optional, tag = "7")]
    highlighted: Option<Vec<u8>>,
    #[prost(message, optional, tag = "8")]
    bounds: Option<WireBounds>,
}

#[derive(Clone, PartialEq, prost::Message)]
struct WireFloats {
    #[prost(double, repeated, tag = "1")]
    values: Vec<f64>,
}

#[derive(Clone, PartialEq, prost::Message)]
struct WireFlags {
    #[prost(bool, repeated, tag = "1")]
    values: Vec<bool>,
}

#[derive(Clone, PartialEq, prost::Message)]
struct WireStrings {
    #[prost(string, repeated, tag = "1")]
    values: Vec<String>,
}

#[derive(Clone, PartialEq, prost::Message)]
struct WireBounds {
    #[prost(double, tag = "1")]
    x_min: f64,
    #[prost(double, tag = "2")]
    x_max: f64,
    #[prost(double, tag = "3")]
    y_min: f64,
    #[prost(double, tag = "4")]
    y_max: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, prost::Enumeration)]
#[repr(i32)]
enum WireKind {
    Init = 0,
    Reset = 1,
    Data = 2,
    AddTarget = 3,
    RenderPlot = 4,
    RenderSelection = 5,
    Completion = 6,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, prost::Enumeration)]
#[repr(i32)]
enum WireRenderKind {
    Plot = 0,
    Selection = 1,
}

#[cfg(test)]
#[path = "codec_test.rs"]
mod tests;
