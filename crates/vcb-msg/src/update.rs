//! ---
//! vcb_section: "02-wire-vocabulary"
//! vcb_subsection: "module"
//! vcb_type: "source"
//! vcb_scope: "code"
//! vcb_description: "Cluster state model and payload codecs."
//! vcb_version: "v0.1.0-dev"
//! vcb_owner: "tbd"
//! ---
use serde::{Deserialize, Serialize};

/// Logical cluster field addressed by an inbound update.
///
/// Wire names resolve case-insensitively and through a fixed synonym table;
/// spaces and underscores in the name are ignored, so `"Engine Temperature"`
/// and `"EngineTemperature"` address the same field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKey {
    /// Vehicle speed.
    Speed,
    /// Speed unit label.
    SpeedUnit,
    /// Cruise-control engagement flag.
    CruiseControl,
    /// Cruise-control set speed.
    CruiseControlSpeed,
    /// Engine revolutions.
    Rpm,
    /// Engine temperature.
    EngineTemp,
    /// Transmission gear.
    Gear,
    /// Ambient temperature in Celsius.
    AmbientTemp,
    /// Fuel economy display string.
    Economy,
    /// Battery charge percentage.
    Battery,
    /// Remaining range.
    Range,
    /// Temperature unit selector.
    TempUnit,
    /// Location-sharing flag.
    ShareLocation,
    /// Drivetrain variant.
    VehicleType,
    /// Central display selection.
    CentralScreen,
    /// Top driving-mode label.
    ModeTop,
    /// Middle driving-mode label.
    ModeMid,
    /// Bottom driving-mode label.
    ModeBottom,
}

impl FieldKey {
    /// Resolve a wire name to a field key.
    ///
    /// Returns `None` for names outside the recognised vocabulary.
    pub fn resolve(name: &str) -> Option<Self> {
        let folded: String = name
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '_')
            .map(|c| c.to_ascii_lowercase())
            .collect();
        match folded.as_str() {
            "speed" => Some(FieldKey::Speed),
            "speedunit" => Some(FieldKey::SpeedUnit),
            "cruisecontrol" => Some(FieldKey::CruiseControl),
            "cruisecontrolspeed" => Some(FieldKey::CruiseControlSpeed),
            "rpm" => Some(FieldKey::Rpm),
            "enginetemp" | "enginetemperature" => Some(FieldKey::EngineTemp),
            "gear" => Some(FieldKey::Gear),
            "ambienttempc" | "ambient" | "temp" | "tempc" | "ambienttemperature" => {
                Some(FieldKey::AmbientTemp)
            }
            "economy" => Some(FieldKey::Economy),
            "battery" => Some(FieldKey::Battery),
            "range" => Some(FieldKey::Range),
            "temperatureunit" | "tempunit" => Some(FieldKey::TempUnit),
            "sharelocation" | "location" => Some(FieldKey::ShareLocation),
            "typeofvehicle" | "vehicletype" => Some(FieldKey::VehicleType),
            "centralscreen" => Some(FieldKey::CentralScreen),
            "mode" | "modetop" => Some(FieldKey::ModeTop),
            "modemid" => Some(FieldKey::ModeMid),
            "modebottom" => Some(FieldKey::ModeBottom),
            _ => None,
        }
    }

    /// Canonical lowercase name, used in logs and diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            FieldKey::Speed => "speed",
            FieldKey::SpeedUnit => "speedunit",
            FieldKey::CruiseControl => "cruisecontrol",
            FieldKey::CruiseControlSpeed => "cruisecontrolspeed",
            FieldKey::Rpm => "rpm",
            FieldKey::EngineTemp => "enginetemp",
            FieldKey::Gear => "gear",
            FieldKey::AmbientTemp => "ambienttempc",
            FieldKey::Economy => "economy",
            FieldKey::Battery => "battery",
            FieldKey::Range => "range",
            FieldKey::TempUnit => "tempunit",
            FieldKey::ShareLocation => "sharelocation",
            FieldKey::VehicleType => "typeofvehicle",
            FieldKey::CentralScreen => "centralscreen",
            FieldKey::ModeTop => "modetop",
            FieldKey::ModeMid => "modemid",
            FieldKey::ModeBottom => "modebottom",
        }
    }
}

/// Raw or typed value attached to a field update.
///
/// Legacy key-value payloads always carry `Text`; the JSON decoder produces
/// typed variants. Coercion to the target field's type happens in the
/// reducer, with failure meaning "no change".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum FieldValue {
    /// Uninterpreted token or JSON string.
    Text(String),
    /// JSON integer.
    Integer(i64),
    /// JSON fractional number.
    Float(f64),
    /// JSON boolean.
    Boolean(bool),
}

impl FieldValue {
    /// Coerce towards an `i32` field.
    ///
    /// Integers are range-checked, floats truncated, text must parse as a
    /// plain decimal integer.
    pub fn as_i32(&self) -> Option<i32> {
        match self {
            FieldValue::Integer(value) => i32::try_from(*value).ok(),
            FieldValue::Float(value) if value.is_finite() => Some(*value as i32),
            FieldValue::Float(_) => None,
            FieldValue::Text(text) => text.trim().parse::<i32>().ok(),
            FieldValue::Boolean(_) => None,
        }
    }

    /// Coerce towards an `f32` field.
    pub fn as_f32(&self) -> Option<f32> {
        match self {
            FieldValue::Integer(value) => Some(*value as f32),
            FieldValue::Float(value) => Some(*value as f32),
            FieldValue::Text(text) => text.trim().parse::<f32>().ok().filter(|v| v.is_finite()),
            FieldValue::Boolean(_) => None,
        }
    }

    /// Coerce towards an `i64` code (vehicle type, screen ordinal).
    pub fn as_code(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(value) => Some(*value),
            FieldValue::Text(text) => text.trim().parse::<i64>().ok(),
            FieldValue::Float(_) | FieldValue::Boolean(_) => None,
        }
    }

    /// Coerce towards a boolean field.
    ///
    /// Text tokens are accepted only for case-insensitive `true`/`false`;
    /// any other token is rejected rather than defaulted to `false`.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Boolean(value) => Some(*value),
            FieldValue::Text(text) => {
                if text.eq_ignore_ascii_case("true") {
                    Some(true)
                } else if text.eq_ignore_ascii_case("false") {
                    Some(false)
                } else {
                    None
                }
            }
            FieldValue::Integer(_) | FieldValue::Float(_) => None,
        }
    }

    /// First character of a text value, for the gear field.
    pub fn as_char(&self) -> Option<char> {
        match self {
            FieldValue::Text(text) => text.chars().next(),
            _ => None,
        }
    }

    /// Borrow the text value, for string fields.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(text) => Some(text),
            _ => None,
        }
    }
}

/// One (field, value) change request extracted from an inbound payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldUpdate {
    /// Addressed field.
    pub key: FieldKey,
    /// Attached value.
    pub value: FieldValue,
}

impl FieldUpdate {
    /// Construct an update from a key and value.
    pub fn new(key: FieldKey, value: FieldValue) -> Self {
        Self { key, value }
    }

    /// Convenience constructor for a raw text update.
    pub fn text(key: FieldKey, value: impl Into<String>) -> Self {
        Self::new(key, FieldValue::Text(value.into()))
    }
}
