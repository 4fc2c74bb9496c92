//! ---
//! vcb_section: "02-wire-vocabulary"
//! vcb_subsection: "module"
//! vcb_type: "source"
//! vcb_scope: "code"
//! vcb_description: "Cluster state model and payload codecs."
//! vcb_version: "v0.1.0-dev"
//! vcb_owner: "tbd"
//! ---
use std::fmt::Display;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value as JsonValue};
use tracing::trace;

use crate::state::ClusterState;
use crate::update::{FieldKey, FieldUpdate, FieldValue};

/// Grammar for one legacy chunk: identifier, separator, value token.
static CHUNK_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*([A-Za-z_][A-Za-z0-9_]*)\s*[-:=\s]\s*([A-Za-z0-9.+-]+)\s*$")
        .expect("valid chunk pattern")
});

/// Strategy interface for one wire format.
///
/// `decode` returns `None` when the text is not in this decoder's format at
/// all; `Some` claims the payload even when no recognised field was found,
/// which stops later decoders from reinterpreting it. Decoders never fail:
/// malformed input is simply unclaimed or empty.
pub trait PayloadDecoder: Send + Sync {
    /// Attempt to decode the payload text into field updates.
    fn decode(&self, text: &str) -> Option<Vec<FieldUpdate>>;
    /// Decoder name for logging.
    fn name(&self) -> &'static str;
}

/// Decoder for the structured JSON vocabulary.
///
/// Accepts flat JSON objects; every member whose key resolves to a
/// [`FieldKey`] becomes one typed update, unknown keys are ignored, and
/// missing keys mean "no change". Non-object documents are unclaimed.
#[derive(Debug, Default)]
pub struct JsonDecoder;

impl JsonDecoder {
    fn value_of(value: &JsonValue) -> Option<FieldValue> {
        match value {
            JsonValue::String(text) => Some(FieldValue::Text(text.clone())),
            JsonValue::Bool(flag) => Some(FieldValue::Boolean(*flag)),
            JsonValue::Number(number) => {
                if let Some(int) = number.as_i64() {
                    Some(FieldValue::Integer(int))
                } else {
                    number.as_f64().map(FieldValue::Float)
                }
            }
            // null and nested structures carry no field value
            JsonValue::Null | JsonValue::Array(_) | JsonValue::Object(_) => None,
        }
    }

    fn decode_object(object: &Map<String, JsonValue>) -> Vec<FieldUpdate> {
        let mut updates = Vec::new();
        for (name, value) in object {
            let Some(key) = FieldKey::resolve(name) else {
                continue;
            };
            if let Some(value) = Self::value_of(value) {
                updates.push(FieldUpdate::new(key, value));
            }
        }
        updates
    }
}

impl PayloadDecoder for JsonDecoder {
    fn decode(&self, text: &str) -> Option<Vec<FieldUpdate>> {
        match serde_json::from_str::<JsonValue>(text) {
            Ok(JsonValue::Object(object)) => Some(Self::decode_object(&object)),
            _ => None,
        }
    }

    fn name(&self) -> &'static str {
        "json"
    }
}

/// Decoder for the legacy `key<sep>value` vocabulary.
///
/// The text is split on newline, comma, and semicolon; each chunk must match
/// the chunk grammar (`speed-100`, `speed:100`, `speed = 100`, `speed 100`).
/// Non-matching chunks and unrecognised identifiers are silently skipped.
/// Values stay raw text; typed coercion happens in the reducer.
#[derive(Debug, Default)]
pub struct KeyValueDecoder;

impl PayloadDecoder for KeyValueDecoder {
    fn decode(&self, text: &str) -> Option<Vec<FieldUpdate>> {
        let mut updates = Vec::new();
        let mut matched = false;
        for chunk in text.split(['\n', ',', ';']) {
            let Some(captures) = CHUNK_PATTERN.captures(chunk) else {
                continue;
            };
            matched = true;
            let Some(key) = FieldKey::resolve(&captures[1]) else {
                continue;
            };
            updates.push(FieldUpdate::text(key, &captures[2]));
        }
        matched.then_some(updates)
    }

    fn name(&self) -> &'static str {
        "key_value"
    }
}

/// Ordered decoder chain applied to every inbound payload.
///
/// The default chain tries structured JSON first and falls back to the
/// legacy key-value grammar, matching the formats the cluster historically
/// accepted. Additional formats plug in without touching the reducer or the
/// store.
pub struct PayloadCodec {
    decoders: Vec<Box<dyn PayloadDecoder>>,
}

impl Default for PayloadCodec {
    fn default() -> Self {
        Self {
            decoders: vec![Box::new(JsonDecoder), Box::new(KeyValueDecoder)],
        }
    }
}

impl PayloadCodec {
    /// Build a codec from an explicit decoder chain.
    pub fn with_decoders(decoders: Vec<Box<dyn PayloadDecoder>>) -> Self {
        Self { decoders }
    }

    /// Decode a raw payload into field updates.
    ///
    /// Never fails: undecodable bytes, unclaimed text, and payloads without
    /// recognised fields all produce an empty list. Updates are returned in
    /// parse order, so a duplicated key resolves to its last occurrence once
    /// reduced.
    pub fn decode(&self, payload: &[u8]) -> Vec<FieldUpdate> {
        let Ok(text) = std::str::from_utf8(payload) else {
            trace!("payload is not valid utf-8; no updates");
            return Vec::new();
        };
        for decoder in &self.decoders {
            if let Some(updates) = decoder.decode(text) {
                trace!(decoder = decoder.name(), count = updates.len(), "payload decoded");
                return updates;
            }
        }
        Vec::new()
    }
}

/// Serialise a full snapshot into the structured JSON vocabulary.
///
/// The key set mirrors what the decoder recognises, so a published snapshot
/// parses back to the same field values.
pub fn encode_state_json(state: &ClusterState) -> JsonValue {
    serde_json::json!({
        "TypeOfVehicle": state.vehicle_type.code(),
        "Gear": state.gear.to_string(),
        "CruiseControl": state.cruise_control,
        "CruiseControlSpeed": state.cruise_control_speed,
        "ShareLocation": state.share_location,
        "Speed": state.speed,
        "SpeedUnit": state.speed_unit,
        "RPM": state.rpm,
        "Economy": state.economy,
        "AmbientTemperature": state.ambient_temp_c,
        "EngineTemperature": state.engine_temp,
        "TemperatureUnit": state.temp_unit,
        "Battery": state.battery,
        "Range": state.range_remaining,
        "ModeTop": state.mode_top,
        "ModeMid": state.mode_mid,
        "ModeBottom": state.mode_bottom,
        "CentralScreen": state.central_screen.ordinal(),
    })
}

/// Format a single field push in the legacy vocabulary (`key-value`).
pub fn encode_key_value(key: &str, value: impl Display) -> String {
    format!("{key}-{value}")
}
