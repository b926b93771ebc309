//! Property-based tests for the flow engine.

use super::*;
use crate::domain::foundation::{ProviderMessageId, Timestamp};
use chrono::{TimeZone, Utc};
use proptest::prelude::*;
use std::collections::BTreeMap;

// ============================================================================
// Test Helpers
// ============================================================================

fn ctx() -> FlowContext {
    FlowContext {
        doctor_name: "Dra. Ana Souza".to_string(),
        doctor_crm: "CRM-SP 123456".to_string(),
    }
}

fn identity() -> Identity {
    Identity::parse("+551199999999").unwrap()
}

fn at() -> Timestamp {
    Timestamp::from_datetime(Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap())
}

fn msg(body: &str) -> InboundMessage {
    InboundMessage::new(identity(), body, ProviderMessageId::new("SM-prop").unwrap())
        .with_received_at(at())
}

fn state_at(step: FlowStep, slots: BTreeMap<String, String>) -> ConversationState {
    ConversationState {
        identity: identity(),
        step,
        slots,
        updated_at: at(),
        version: 1,
    }
}

fn every_step() -> Vec<FlowStep> {
    let mut steps = vec![FlowStep::Start, FlowStep::AwaitIntent, FlowStep::TerminalError];
    for intent in Intent::all() {
        steps.push(FlowStep::Confirming { intent: *intent });
        steps.push(FlowStep::TerminalSuccess { intent: *intent });
        for slot in intent.slots() {
            steps.push(FlowStep::Collecting { intent: *intent, slot: *slot });
        }
    }
    steps
}

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_free_text() -> impl Strategy<Value = String> {
    "[A-Za-zÀ-ú][A-Za-zÀ-ú0-9 ,./-]{0,60}".prop_map(|s| s.trim_end().to_string())
}

fn arb_date(min_year: i32) -> impl Strategy<Value = String> {
    (min_year..2031, 1u32..=12, 1u32..=28, any::<bool>()).prop_map(|(y, m, d, iso)| {
        if iso {
            format!("{:04}-{:02}-{:02}", y, m, d)
        } else {
            format!("{:02}/{:02}/{:04}", d, m, y)
        }
    })
}

fn arb_time() -> impl Strategy<Value = String> {
    (0u32..24, 0u32..60, 0u8..3).prop_map(|(h, m, style)| match style {
        0 => format!("{:02}:{:02}", h, m),
        1 => format!("{}h{:02}", h, m),
        _ => format!("{}h", h),
    })
}

fn arb_name() -> impl Strategy<Value = String> {
    ("[A-Z][a-z]{1,12}", "[A-Z][a-z]{1,12}").prop_map(|(a, b)| format!("{} {}", a, b))
}

fn arb_prescription_inputs() -> impl Strategy<Value = Vec<String>> {
    (arb_free_text(), arb_date(2000), arb_free_text()).prop_map(|(m, d, i)| vec![m, d, i])
}

fn arb_appointment_inputs() -> impl Strategy<Value = Vec<String>> {
    (arb_name(), arb_date(2025), arb_time(), arb_free_text())
        .prop_map(|(n, d, t, r)| vec![n, d, t, r])
}

fn arb_step() -> impl Strategy<Value = FlowStep> {
    proptest::sample::select(every_step())
}

fn arb_body() -> impl Strategy<Value = String> {
    prop_oneof![
        any::<String>(),
        Just(String::new()),
        Just("sim".to_string()),
        Just("não".to_string()),
        Just("receita".to_string()),
        Just("2".to_string()),
        "[ \t\n]{0,5}",
    ]
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    // Valid inputs in declared order reach CONFIRMING with every slot as provided.
    #[test]
    fn prop_valid_prescription_inputs_reach_confirming(inputs in arb_prescription_inputs()) {
        let mut state = state_at(FlowStep::AwaitIntent, BTreeMap::new());
        state = transition(&state, &msg("receita"), &ctx()).state;

        for input in &inputs {
            state = transition(&state, &msg(input), &ctx()).state;
        }

        prop_assert_eq!(state.step, FlowStep::Confirming { intent: Intent::Prescription });
        for (slot, input) in Intent::Prescription.slots().iter().zip(&inputs) {
            prop_assert_eq!(state.slot(*slot), Some(input.trim()));
        }
    }

    #[test]
    fn prop_valid_appointment_inputs_reach_confirming(inputs in arb_appointment_inputs()) {
        let mut state = state_at(FlowStep::AwaitIntent, BTreeMap::new());
        state = transition(&state, &msg("2"), &ctx()).state;

        for input in &inputs {
            state = transition(&state, &msg(input), &ctx()).state;
        }

        prop_assert_eq!(state.step, FlowStep::Confirming { intent: Intent::Appointment });
        prop_assert_eq!(state.slots.len(), inputs.len());
        for (slot, input) in Intent::Appointment.slots().iter().zip(&inputs) {
            prop_assert_eq!(state.slot(*slot), Some(input.trim()));
        }
    }

    // A rejected value only changes the reply (and the version bookkeeping).
    #[test]
    fn prop_rejected_date_leaves_state_unchanged(
        medications in arb_free_text(),
        garbage in "[a-zA-Z ]{1,20}",
    ) {
        let mut slots = BTreeMap::new();
        slots.insert(Slot::Medications.key().to_string(), medications);
        let step = FlowStep::Collecting { intent: Intent::Prescription, slot: Slot::IssueDate };
        let before = state_at(step, slots);

        let t = transition(&before, &msg(&garbage), &ctx());

        prop_assert_eq!(t.kind, TransitionKind::Rejected);
        prop_assert_eq!(t.state.step, before.step);
        prop_assert_eq!(&t.state.slots, &before.slots);
        prop_assert!(!t.reply.has_commands());
    }

    // Any text in any step yields a reply and advances the version by one.
    #[test]
    fn prop_engine_always_replies(step in arb_step(), body in arb_body()) {
        let before = state_at(step, BTreeMap::new());
        let t = transition(&before, &msg(&body), &ctx());

        prop_assert!(!t.reply.text.is_empty());
        prop_assert_eq!(t.state.version, before.version + 1);
        prop_assert_eq!(t.state.updated_at, at());
        prop_assert_eq!(&t.reply.identity, &before.identity);
    }

    // Commands are only ever emitted on the way into TERMINAL_SUCCESS.
    #[test]
    fn prop_commands_only_on_confirmation(step in arb_step(), body in arb_body()) {
        let before = state_at(step, BTreeMap::new());
        let t = transition(&before, &msg(&body), &ctx());

        if t.reply.has_commands() {
            let is_success = matches!(t.state.step, FlowStep::TerminalSuccess { .. });
            prop_assert!(is_success);
            prop_assert_eq!(t.kind, TransitionKind::Confirmed);
        }
    }

    // Terminal states never carry their slots into the next flow.
    #[test]
    fn prop_terminal_states_clear_slots(body in arb_body(), value in arb_free_text()) {
        let mut slots = BTreeMap::new();
        slots.insert(Slot::Medications.key().to_string(), value);
        let before = state_at(FlowStep::TerminalSuccess { intent: Intent::Prescription }, slots);

        let t = transition(&before, &msg(&body), &ctx());

        prop_assert!(t.state.slots.is_empty());
        prop_assert!(!t.state.step.is_terminal());
    }
}
