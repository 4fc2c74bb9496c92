//! ---
//! vcb_section: "01-state-binding"
//! vcb_subsection: "module"
//! vcb_type: "source"
//! vcb_scope: "code"
//! vcb_description: "State binding runtime and lifecycle management."
//! vcb_version: "v0.1.0-dev"
//! vcb_owner: "tbd"
//! ---
use vcb_msg::{CentralScreen, ClusterState, FieldKey, FieldUpdate, VehicleType};

/// Outcome of applying one batch of updates to a snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct Reduction {
    /// The resulting snapshot.
    pub next: ClusterState,
    /// Whether any field differs from the input snapshot.
    pub changed: bool,
}

/// Fold a batch of field updates into a snapshot.
///
/// Pure function: no side effects, no I/O. Updates are applied in order, so
/// a key duplicated within one batch resolves to its last occurrence. An
/// update whose value cannot be coerced to the field's type is dropped
/// without disturbing the rest of the batch, and `changed` is only set when
/// a coerced value actually differs from the accumulating snapshot — which
/// makes the reducer idempotent: reducing the same batch against its own
/// result reports `changed = false`.
pub fn reduce(current: &ClusterState, updates: &[FieldUpdate]) -> Reduction {
    let mut next = current.clone();
    let mut changed = false;
    for update in updates {
        changed |= apply(&mut next, update);
    }
    Reduction { next, changed }
}

fn apply(state: &mut ClusterState, update: &FieldUpdate) -> bool {
    let value = &update.value;
    match update.key {
        FieldKey::Speed => assign(&mut state.speed, value.as_i32()),
        FieldKey::SpeedUnit => assign(&mut state.speed_unit, value.as_text().map(str::to_owned)),
        FieldKey::CruiseControl => assign(&mut state.cruise_control, value.as_bool()),
        FieldKey::CruiseControlSpeed => assign(&mut state.cruise_control_speed, value.as_i32()),
        FieldKey::Rpm => assign(&mut state.rpm, value.as_f32()),
        FieldKey::EngineTemp => assign(&mut state.engine_temp, value.as_f32()),
        FieldKey::Gear => assign(&mut state.gear, value.as_char()),
        FieldKey::AmbientTemp => assign(&mut state.ambient_temp_c, value.as_i32()),
        FieldKey::Economy => assign(&mut state.economy, value.as_text().map(str::to_owned)),
        FieldKey::Battery => assign(&mut state.battery, value.as_i32()),
        FieldKey::Range => assign(&mut state.range_remaining, value.as_i32()),
        FieldKey::TempUnit => assign(&mut state.temp_unit, value.as_i32()),
        FieldKey::ShareLocation => assign(&mut state.share_location, value.as_bool()),
        FieldKey::VehicleType => assign(
            &mut state.vehicle_type,
            value.as_code().and_then(VehicleType::from_code),
        ),
        FieldKey::CentralScreen => assign(
            &mut state.central_screen,
            value.as_code().and_then(CentralScreen::from_ordinal),
        ),
        FieldKey::ModeTop => assign(&mut state.mode_top, value.as_text().map(str::to_owned)),
        FieldKey::ModeMid => assign(&mut state.mode_mid, value.as_text().map(str::to_owned)),
        FieldKey::ModeBottom => assign(&mut state.mode_bottom, value.as_text().map(str::to_owned)),
    }
}

/// Install a coerced value, reporting whether the field actually changed.
/// `None` means the coercion failed and the field stays untouched.
fn assign<T: PartialEq>(slot: &mut T, value: Option<T>) -> bool {
    match value {
        Some(value) if *slot != value => {
            *slot = value;
            true
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use vcb_msg::{FieldValue, PayloadCodec};

    use super::*;

    fn decode(payload: &str) -> Vec<FieldUpdate> {
        PayloadCodec::default().decode(payload.as_bytes())
    }

    #[test]
    fn empty_batch_is_a_no_op() {
        let state = ClusterState::default();
        let reduction = reduce(&state, &[]);
        assert_eq!(reduction.next, state);
        assert!(!reduction.changed);
    }

    #[test]
    fn legacy_payload_scenario() {
        let state = ClusterState::default();
        let reduction = reduce(&state, &decode("speed-100,rpm-2200\ngear-D"));
        assert_eq!(reduction.next.speed, 100);
        assert_eq!(reduction.next.rpm, 2200.0);
        assert_eq!(reduction.next.gear, 'D');
        // gear was already 'D'; speed and rpm changed
        assert!(reduction.changed);
    }

    #[test]
    fn json_payload_updates_subset_of_fields() {
        let state = ClusterState {
            battery: 55,
            ..ClusterState::default()
        };
        let reduction = reduce(&state, &decode(r#"{"Speed":42,"CruiseControl":true}"#));
        assert_eq!(reduction.next.speed, 42);
        assert!(reduction.next.cruise_control);
        assert_eq!(reduction.next.battery, 55);
        assert_eq!(reduction.next.economy, state.economy);
        assert!(reduction.changed);
    }

    #[test]
    fn unparseable_value_leaves_field_unchanged() {
        let state = ClusterState::default();
        let reduction = reduce(&state, &decode("speed-abc"));
        assert_eq!(reduction.next.speed, state.speed);
        assert!(!reduction.changed);
    }

    #[test]
    fn bad_update_does_not_abort_the_batch() {
        let state = ClusterState::default();
        let updates = vec![
            FieldUpdate::text(FieldKey::Speed, "abc"),
            FieldUpdate::text(FieldKey::Battery, "73"),
        ];
        let reduction = reduce(&state, &updates);
        assert_eq!(reduction.next.speed, 0);
        assert_eq!(reduction.next.battery, 73);
        assert!(reduction.changed);
    }

    #[test]
    fn same_value_reports_unchanged() {
        let state = ClusterState {
            speed: 50,
            ..ClusterState::default()
        };
        let reduction = reduce(&state, &decode("speed-50"));
        assert!(!reduction.changed);
        assert_eq!(reduction.next, state);
    }

    #[test]
    fn reducer_is_idempotent() {
        let state = ClusterState::default();
        let updates = decode(r#"{"Speed":90,"Gear":"R","Battery":12,"ShareLocation":true}"#);
        let first = reduce(&state, &updates);
        assert!(first.changed);
        let second = reduce(&first.next, &updates);
        assert!(!second.changed);
        assert_eq!(second.next, first.next);
    }

    #[test]
    fn duplicate_keys_last_occurrence_wins() {
        let state = ClusterState::default();
        let reduction = reduce(&state, &decode("speed-10,speed-20"));
        assert_eq!(reduction.next.speed, 20);
    }

    #[test]
    fn gear_takes_first_character_only() {
        let state = ClusterState::default();
        let reduction = reduce(
            &state,
            &[FieldUpdate::text(FieldKey::Gear, "Neutral")],
        );
        assert_eq!(reduction.next.gear, 'N');
    }

    #[test]
    fn vehicle_type_rejects_unknown_codes() {
        let state = ClusterState::default();

        let electric = reduce(&state, &[FieldUpdate::new(FieldKey::VehicleType, FieldValue::Integer(1))]);
        assert_eq!(electric.next.vehicle_type, VehicleType::Electric);

        let unknown = reduce(&state, &[FieldUpdate::new(FieldKey::VehicleType, FieldValue::Integer(7))]);
        assert_eq!(unknown.next.vehicle_type, state.vehicle_type);
        assert!(!unknown.changed);
    }

    #[test]
    fn central_screen_follows_wire_ordinal() {
        let state = ClusterState::default();
        let reduction = reduce(
            &state,
            &[FieldUpdate::new(FieldKey::CentralScreen, FieldValue::Integer(1))],
        );
        assert_eq!(reduction.next.central_screen, CentralScreen::Map);
    }

    #[test]
    fn invalid_boolean_token_is_no_update() {
        let state = ClusterState::default();

        let engaged = reduce(&state, &decode("cruisecontrol-TRUE"));
        assert!(engaged.next.cruise_control);
        assert!(engaged.changed);

        let garbage = reduce(&state, &decode("cruisecontrol-garbage"));
        assert!(!garbage.next.cruise_control);
        assert!(!garbage.changed);
    }

    #[test]
    fn float_fields_accept_signed_fractions() {
        let state = ClusterState::default();
        let reduction = reduce(&state, &decode("enginetemp--3.5"));
        assert_eq!(reduction.next.engine_temp, -3.5);
    }
}
