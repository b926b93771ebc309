//! Intents a user can pick from the root menu and the slots each one collects.

use serde::{Deserialize, Serialize};

/// A user-selected goal that determines the slot sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Prescription,
    Appointment,
}

impl Intent {
    /// All intents, in menu order.
    pub fn all() -> &'static [Intent] {
        &[Intent::Prescription, Intent::Appointment]
    }

    /// Slots the intent collects, in the order they are asked.
    pub fn slots(&self) -> &'static [Slot] {
        match self {
            Intent::Prescription => &[Slot::Medications, Slot::IssueDate, Slot::Instructions],
            Intent::Appointment => &[
                Slot::PatientName,
                Slot::AppointmentDate,
                Slot::AppointmentTime,
                Slot::Reason,
            ],
        }
    }

    /// First slot of the intent.
    pub fn first_slot(&self) -> Slot {
        self.slots()[0]
    }

    /// Slot that follows `slot`, or `None` when `slot` is the last one.
    pub fn next_slot(&self, slot: Slot) -> Option<Slot> {
        let slots = self.slots();
        slots
            .iter()
            .position(|s| *s == slot)
            .and_then(|i| slots.get(i + 1))
            .copied()
    }

    /// Folded keywords that select this intent.
    pub fn keywords(&self) -> &'static [&'static str] {
        match self {
            Intent::Prescription => &["receita", "prescricao", "remedio", "medicamento"],
            Intent::Appointment => &["consulta", "agendar", "agendamento", "marcar"],
        }
    }

    /// Menu number that selects this intent.
    pub fn menu_number(&self) -> &'static str {
        match self {
            Intent::Prescription => "1",
            Intent::Appointment => "2",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::Prescription => "prescription",
            Intent::Appointment => "appointment",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Intent::all().iter().copied().find(|i| i.as_str() == s)
    }

    /// Human label used in menus.
    pub fn label(&self) -> &'static str {
        match self {
            Intent::Prescription => "Receita médica",
            Intent::Appointment => "Agendar consulta",
        }
    }
}

/// A single named piece of information an intent must collect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Slot {
    Medications,
    IssueDate,
    Instructions,
    PatientName,
    AppointmentDate,
    AppointmentTime,
    Reason,
}

impl Slot {
    pub fn all() -> &'static [Slot] {
        &[
            Slot::Medications,
            Slot::IssueDate,
            Slot::Instructions,
            Slot::PatientName,
            Slot::AppointmentDate,
            Slot::AppointmentTime,
            Slot::Reason,
        ]
    }

    /// Key under which the accepted value is stored in `slots`.
    pub fn key(&self) -> &'static str {
        match self {
            Slot::Medications => "medications",
            Slot::IssueDate => "issueDate",
            Slot::Instructions => "instructions",
            Slot::PatientName => "patientName",
            Slot::AppointmentDate => "appointmentDate",
            Slot::AppointmentTime => "appointmentTime",
            Slot::Reason => "reason",
        }
    }

    /// Upper-case tag used in step names (`COLLECTING_<TAG>`).
    pub fn tag(&self) -> &'static str {
        match self {
            Slot::Medications => "MEDICATIONS",
            Slot::IssueDate => "ISSUE_DATE",
            Slot::Instructions => "INSTRUCTIONS",
            Slot::PatientName => "PATIENT_NAME",
            Slot::AppointmentDate => "APPOINTMENT_DATE",
            Slot::AppointmentTime => "APPOINTMENT_TIME",
            Slot::Reason => "REASON",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        Slot::all().iter().copied().find(|s| s.tag() == tag)
    }

    /// Label shown to the user when listing required fields.
    pub fn label(&self) -> &'static str {
        match self {
            Slot::Medications => "medicamentos e posologia",
            Slot::IssueDate => "data de emissão",
            Slot::Instructions => "instruções de uso",
            Slot::PatientName => "nome do paciente",
            Slot::AppointmentDate => "data da consulta",
            Slot::AppointmentTime => "horário",
            Slot::Reason => "motivo da consulta",
        }
    }
}
