//! Flow engine - pure conversation transitions.
//!
//! `transition` takes the current state and one inbound message and returns
//! the next state, the reply, and any action commands. It performs no I/O
//! and never fails: unrecognized input always yields a re-prompt.

use std::collections::BTreeMap;

use crate::domain::clinic::{ActionCommand, NewAppointment, NewPrescription, RecordSource};
use crate::domain::foundation::{StateMachine, ValidationError};

use super::keywords::{self, Confirmation};
use super::validators::{self, parse_date, parse_time};
use super::{prompts, ConversationState, FlowStep, InboundMessage, Intent, OutboundReply, Slot};

/// Clinic data the engine needs to fully populate commands.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlowContext {
    pub doctor_name: String,
    pub doctor_crm: String,
}

/// What kind of step a transition took, for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionKind {
    /// An intent was selected and slot collection began.
    Started,
    /// Input not understood; the same question was asked again.
    Reprompted,
    /// A slot value was accepted.
    Accepted,
    /// A slot value failed validation.
    Rejected,
    /// The user confirmed and commands were emitted.
    Confirmed,
    /// The user declined the summary; collection restarts.
    Restarted,
    /// A finished flow was cleared back to the menu.
    Reset,
}

impl TransitionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransitionKind::Started => "started",
            TransitionKind::Reprompted => "reprompted",
            TransitionKind::Accepted => "accepted",
            TransitionKind::Rejected => "rejected",
            TransitionKind::Confirmed => "confirmed",
            TransitionKind::Restarted => "restarted",
            TransitionKind::Reset => "reset",
        }
    }
}

/// Result of one transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub state: ConversationState,
    pub reply: OutboundReply,
    pub kind: TransitionKind,
}

/// Computes the next state for `inbound`.
pub fn transition(
    state: &ConversationState,
    inbound: &InboundMessage,
    ctx: &FlowContext,
) -> Transition {
    let result = match state.step {
        FlowStep::Start => from_menu(state, inbound, true),
        FlowStep::AwaitIntent => from_menu(state, inbound, false),
        FlowStep::Collecting { intent, slot } => collect(state, inbound, intent, slot),
        FlowStep::Confirming { intent } => confirm(state, inbound, intent, ctx),
        FlowStep::TerminalSuccess { .. } | FlowStep::TerminalError => reset(state, inbound),
    };

    debug_assert!(
        state.step.kind().can_transition_to(&result.state.step.kind()),
        "illegal step change {} -> {}",
        state.step,
        result.state.step
    );
    result
}

/// Reply the current step would show, without advancing.
pub fn prompt_for(state: &ConversationState) -> String {
    match state.step {
        FlowStep::Start | FlowStep::AwaitIntent => prompts::menu(),
        FlowStep::Collecting { slot, .. } => prompts::ask(slot),
        FlowStep::Confirming { intent } => prompts::confirm(intent, &state.slots),
        FlowStep::TerminalSuccess { intent } => prompts::completed(intent),
        FlowStep::TerminalError => prompts::action_failed(),
    }
}

/// Rebuilds the commands of the state's completed intent from its slots.
///
/// # Errors
///
/// Returns `ValidationError` if a required slot is missing or no longer parses.
pub fn commands_for(
    state: &ConversationState,
    ctx: &FlowContext,
) -> Result<Vec<ActionCommand>, ValidationError> {
    let Some(intent) = state.step.intent() else {
        return Ok(Vec::new());
    };

    let required = |slot: Slot| {
        state
            .slot(slot)
            .map(str::to_string)
            .ok_or_else(|| ValidationError::empty_field(slot.key()))
    };
    let date = |slot: Slot| {
        parse_date(&required(slot)?).ok_or_else(|| {
            ValidationError::invalid_format(slot.key(), "stored date no longer parses")
        })
    };
    let client_id = state.identity.client_id();

    let command = match intent {
        Intent::Prescription => ActionCommand::CreatePrescription(NewPrescription {
            client_id,
            medications: required(Slot::Medications)?,
            instructions: required(Slot::Instructions)?,
            issue_date: date(Slot::IssueDate)?,
            doctor_name: ctx.doctor_name.clone(),
            doctor_crm: ctx.doctor_crm.clone(),
            source: RecordSource::Chat,
        }),
        Intent::Appointment => {
            let time = parse_time(&required(Slot::AppointmentTime)?).ok_or_else(|| {
                ValidationError::invalid_format("appointmentTime", "stored time no longer parses")
            })?;
            ActionCommand::CreateAppointment(NewAppointment {
                client_id,
                patient_name: required(Slot::PatientName)?,
                date: date(Slot::AppointmentDate)?,
                time,
                reason: required(Slot::Reason)?,
            })
        }
    };

    Ok(vec![command])
}

fn from_menu(state: &ConversationState, inbound: &InboundMessage, first_contact: bool) -> Transition {
    let greeting = first_contact.then(|| prompts::greeting(inbound.profile_name.as_deref()));
    let with_greeting = |text: String| match &greeting {
        Some(g) => format!("{}\n\n{}", g, text),
        None => text,
    };

    match keywords::match_intent(&inbound.body) {
        Some(intent) => start_intent(state, inbound, intent, with_greeting(prompts::intent_started(intent))),
        None => finish(
            state.advance(FlowStep::AwaitIntent, BTreeMap::new(), inbound.received_at),
            with_greeting(prompts::menu()),
            TransitionKind::Reprompted,
        ),
    }
}

fn start_intent(state: &ConversationState, inbound: &InboundMessage, intent: Intent, text: String) -> Transition {
    let step = FlowStep::Collecting {
        intent,
        slot: intent.first_slot(),
    };
    finish(
        state.advance(step, BTreeMap::new(), inbound.received_at),
        text,
        TransitionKind::Started,
    )
}

fn collect(state: &ConversationState, inbound: &InboundMessage, intent: Intent, slot: Slot) -> Transition {
    let today = inbound.received_at.date();

    match validators::validate_slot(slot, &inbound.body, today) {
        Ok(value) => {
            let mut slots = state.slots.clone();
            slots.insert(slot.key().to_string(), value);

            let (step, text) = match intent.next_slot(slot) {
                Some(next) => (
                    FlowStep::Collecting { intent, slot: next },
                    format!("Anotado!\n{}", prompts::ask(next)),
                ),
                None => (FlowStep::Confirming { intent }, prompts::confirm(intent, &slots)),
            };

            finish(
                state.advance(step, slots, inbound.received_at),
                text,
                TransitionKind::Accepted,
            )
        }
        Err(error) => finish(
            state.advance(state.step, state.slots.clone(), inbound.received_at),
            prompts::rejected(slot, &error),
            TransitionKind::Rejected,
        ),
    }
}

fn confirm(state: &ConversationState, inbound: &InboundMessage, intent: Intent, ctx: &FlowContext) -> Transition {
    match keywords::confirmation(&inbound.body) {
        Confirmation::Yes => {
            let committed = state.advance(
                FlowStep::TerminalSuccess { intent },
                state.slots.clone(),
                inbound.received_at,
            );
            match commands_for(&committed, ctx) {
                Ok(commands) => {
                    let reply = OutboundReply::text(state.identity.clone(), prompts::completed(intent))
                        .with_commands(commands);
                    Transition {
                        state: committed,
                        reply,
                        kind: TransitionKind::Confirmed,
                    }
                }
                // Stored slots are unusable; collect them again.
                Err(_) => restart(state, inbound, intent),
            }
        }
        Confirmation::No => restart(state, inbound, intent),
        Confirmation::Unclear => finish(
            state.advance(state.step, state.slots.clone(), inbound.received_at),
            prompts::confirmation_unclear(intent, &state.slots),
            TransitionKind::Reprompted,
        ),
    }
}

fn restart(state: &ConversationState, inbound: &InboundMessage, intent: Intent) -> Transition {
    let step = FlowStep::Collecting {
        intent,
        slot: intent.first_slot(),
    };
    finish(
        state.advance(step, BTreeMap::new(), inbound.received_at),
        prompts::restarted(intent),
        TransitionKind::Restarted,
    )
}

fn reset(state: &ConversationState, inbound: &InboundMessage) -> Transition {
    match keywords::match_intent(&inbound.body) {
        Some(intent) => start_intent(state, inbound, intent, prompts::intent_started(intent)),
        None => finish(
            state.advance(FlowStep::AwaitIntent, BTreeMap::new(), inbound.received_at),
            prompts::menu(),
            TransitionKind::Reset,
        ),
    }
}

fn finish(state: ConversationState, text: String, kind: TransitionKind) -> Transition {
    let reply = OutboundReply::text(state.identity.clone(), text);
    Transition { state, reply, kind }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::conversation::Identity;
    use crate::domain::foundation::{ProviderMessageId, Timestamp};
    use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};

    fn identity() -> Identity {
        Identity::parse("+551199999999").unwrap()
    }

    fn ctx() -> FlowContext {
        FlowContext {
            doctor_name: "Dra. Ana Souza".to_string(),
            doctor_crm: "CRM-SP 123456".to_string(),
        }
    }

    fn at() -> Timestamp {
        Timestamp::from_datetime(Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap())
    }

    fn msg(body: &str) -> InboundMessage {
        InboundMessage::new(identity(), body, ProviderMessageId::new("SM1").unwrap())
            .with_received_at(at())
    }

    fn state(step: FlowStep) -> ConversationState {
        ConversationState {
            identity: identity(),
            step,
            slots: BTreeMap::new(),
            updated_at: at(),
            version: 3,
        }
    }

    fn run(state: &ConversationState, bodies: &[&str]) -> Transition {
        let mut current = state.clone();
        let mut last = None;
        for body in bodies {
            let t = transition(&current, &msg(body), &ctx());
            current = t.state.clone();
            last = Some(t);
        }
        last.unwrap()
    }

    mod menu {
        use super::*;

        #[test]
        fn first_contact_greets_with_profile_name_and_shows_menu() {
            let inbound = msg("oi").with_profile_name("Maria");
            let t = transition(&state(FlowStep::Start), &inbound, &ctx());

            assert_eq!(t.state.step, FlowStep::AwaitIntent);
            assert_eq!(t.kind, TransitionKind::Reprompted);
            assert!(t.reply.text.contains("Maria"));
            assert!(t.reply.text.contains(Intent::Prescription.label()));
        }

        #[test]
        fn keyword_starts_prescription_and_lists_fields() {
            let t = transition(&state(FlowStep::AwaitIntent), &msg("receita"), &ctx());

            assert_eq!(
                t.state.step,
                FlowStep::Collecting {
                    intent: Intent::Prescription,
                    slot: Slot::Medications
                }
            );
            assert_eq!(t.state.step.tag(), "COLLECTING_MEDICATIONS");
            assert_eq!(t.kind, TransitionKind::Started);
            for slot in Intent::Prescription.slots() {
                assert!(t.reply.text.contains(slot.label()));
            }
        }

        #[test]
        fn keyword_on_first_contact_starts_intent_directly() {
            let t = transition(&state(FlowStep::Start), &msg("Quero marcar consulta"), &ctx());
            assert_eq!(t.state.step.intent(), Some(Intent::Appointment));
        }

        #[test]
        fn empty_body_reprompts_menu() {
            let t = transition(&state(FlowStep::AwaitIntent), &msg("   "), &ctx());
            assert_eq!(t.state.step, FlowStep::AwaitIntent);
            assert_eq!(t.kind, TransitionKind::Reprompted);
            assert!(!t.reply.has_commands());
        }
    }

    mod collecting {
        use super::*;

        #[test]
        fn accepted_medications_advance_to_issue_date() {
            let t = run(
                &state(FlowStep::AwaitIntent),
                &["receita", "Dipirona 500mg de 6 em 6h"],
            );

            assert_eq!(t.state.step.tag(), "COLLECTING_ISSUE_DATE");
            assert_eq!(t.state.slot(Slot::Medications), Some("Dipirona 500mg de 6 em 6h"));
            assert_eq!(t.kind, TransitionKind::Accepted);
        }

        #[test]
        fn invalid_date_keeps_step_and_slots() {
            let before = run(
                &state(FlowStep::AwaitIntent),
                &["receita", "Dipirona 500mg de 6 em 6h"],
            )
            .state;

            let t = transition(&before, &msg("2024-13-40"), &ctx());

            assert_eq!(t.kind, TransitionKind::Rejected);
            assert_eq!(t.state.step, before.step);
            assert_eq!(t.state.slots, before.slots);
            assert!(t.reply.text.contains("AAAA-MM-DD"));
        }

        #[test]
        fn last_slot_moves_to_confirming_with_summary() {
            let t = run(
                &state(FlowStep::AwaitIntent),
                &["1", "Dipirona", "01/06/2024", "Tomar com água"],
            );

            assert_eq!(
                t.state.step,
                FlowStep::Confirming {
                    intent: Intent::Prescription
                }
            );
            assert!(t.reply.text.contains("Dipirona"));
            assert!(t.reply.text.contains("01/06/2024"));
            assert_eq!(t.state.slots.len(), 3);
        }

        #[test]
        fn rejected_value_still_bumps_version() {
            let s = state(FlowStep::Collecting {
                intent: Intent::Appointment,
                slot: Slot::AppointmentTime,
            });
            let t = transition(&s, &msg("de tarde"), &ctx());
            assert_eq!(t.state.version, s.version + 1);
            assert_eq!(t.state.updated_at, at());
        }
    }

    mod confirming {
        use super::*;

        fn confirming_prescription() -> ConversationState {
            run(
                &state(FlowStep::AwaitIntent),
                &["receita", "Dipirona 500mg", "2024-06-01", "Após as refeições"],
            )
            .state
        }

        #[test]
        fn yes_emits_prescription_command() {
            let t = transition(&confirming_prescription(), &msg("Sim"), &ctx());

            assert_eq!(t.kind, TransitionKind::Confirmed);
            assert_eq!(
                t.state.step,
                FlowStep::TerminalSuccess {
                    intent: Intent::Prescription
                }
            );
            assert_eq!(t.state.slots.len(), 3);
            assert_eq!(
                t.reply.commands,
                vec![ActionCommand::CreatePrescription(NewPrescription {
                    client_id: identity().client_id(),
                    medications: "Dipirona 500mg".to_string(),
                    instructions: "Após as refeições".to_string(),
                    issue_date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
                    doctor_name: "Dra. Ana Souza".to_string(),
                    doctor_crm: "CRM-SP 123456".to_string(),
                    source: RecordSource::Chat,
                })]
            );
        }

        #[test]
        fn no_restarts_from_first_slot_and_discards_values() {
            let t = transition(&confirming_prescription(), &msg("não"), &ctx());

            assert_eq!(t.kind, TransitionKind::Restarted);
            assert_eq!(t.state.step.tag(), "COLLECTING_MEDICATIONS");
            assert!(t.state.slots.is_empty());
            assert!(!t.reply.has_commands());
        }

        #[test]
        fn other_text_reasks() {
            let before = confirming_prescription();
            let t = transition(&before, &msg("talvez"), &ctx());

            assert_eq!(t.kind, TransitionKind::Reprompted);
            assert_eq!(t.state.step, before.step);
            assert_eq!(t.state.slots, before.slots);
        }

        #[test]
        fn appointment_yes_emits_appointment_command() {
            let t = run(
                &state(FlowStep::AwaitIntent),
                &["agendar", "Maria Silva", "15/06/2024", "14h30", "Retorno", "ok"],
            );

            match &t.reply.commands[..] {
                [ActionCommand::CreateAppointment(a)] => {
                    assert_eq!(a.patient_name, "Maria Silva");
                    assert_eq!(a.date, NaiveDate::from_ymd_opt(2024, 6, 15).unwrap());
                    assert_eq!(a.time, NaiveTime::from_hms_opt(14, 30, 0).unwrap());
                }
                other => panic!("unexpected commands {:?}", other),
            }
        }

        #[test]
        fn corrupted_slots_restart_instead_of_failing() {
            let mut s = confirming_prescription();
            s.slots.remove("issueDate");

            let t = transition(&s, &msg("sim"), &ctx());

            assert_eq!(t.kind, TransitionKind::Restarted);
            assert!(!t.reply.has_commands());
        }
    }

    mod terminal {
        use super::*;

        #[test]
        fn message_after_success_resets_to_menu() {
            let mut s = state(FlowStep::TerminalSuccess {
                intent: Intent::Prescription,
            });
            s.slots.insert("medications".to_string(), "x".to_string());

            let t = transition(&s, &msg("obrigado"), &ctx());

            assert_eq!(t.kind, TransitionKind::Reset);
            assert_eq!(t.state.step, FlowStep::AwaitIntent);
            assert!(t.state.slots.is_empty());
        }

        #[test]
        fn keyword_after_error_starts_new_flow() {
            let t = transition(&state(FlowStep::TerminalError), &msg("consulta"), &ctx());
            assert_eq!(t.kind, TransitionKind::Started);
            assert_eq!(t.state.step.tag(), "COLLECTING_PATIENT_NAME");
        }
    }

    mod prompts_for_steps {
        use super::*;

        #[test]
        fn prompt_for_collecting_asks_that_slot() {
            let s = state(FlowStep::Collecting {
                intent: Intent::Prescription,
                slot: Slot::IssueDate,
            });
            assert_eq!(prompt_for(&s), prompts::ask(Slot::IssueDate));
        }

        #[test]
        fn prompt_for_start_is_menu() {
            assert_eq!(prompt_for(&state(FlowStep::Start)), prompts::menu());
        }

        #[test]
        fn commands_for_non_flow_state_is_empty() {
            assert_eq!(commands_for(&state(FlowStep::AwaitIntent), &ctx()), Ok(vec![]));
        }
    }
}
