//! Reply texts shown to the patient.

use std::collections::BTreeMap;

use crate::domain::foundation::ValidationError;

use super::{Intent, Slot};

pub fn greeting(profile_name: Option<&str>) -> String {
    match profile_name {
        Some(name) => format!("Olá, {}! Sou o assistente virtual da clínica.", name),
        None => "Olá! Sou o assistente virtual da clínica.".to_string(),
    }
}

pub fn menu() -> String {
    let mut text = String::from("Como posso ajudar?\n");
    for intent in Intent::all() {
        text.push_str(&format!("{} - {}\n", intent.menu_number(), intent.label()));
    }
    text.push_str("Responda com o número da opção ou escreva o que precisa.");
    text
}

/// Lists the fields the intent needs, then asks for the first one.
pub fn intent_started(intent: Intent) -> String {
    let title = match intent {
        Intent::Prescription => "Vamos preparar sua receita.",
        Intent::Appointment => "Vamos agendar sua consulta.",
    };
    let fields: Vec<String> = intent
        .slots()
        .iter()
        .map(|slot| format!("- {}", slot.label()))
        .collect();

    format!(
        "{} Vou precisar de:\n{}\n\n{}",
        title,
        fields.join("\n"),
        ask(intent.first_slot())
    )
}

/// Question for a single slot.
pub fn ask(slot: Slot) -> String {
    match slot {
        Slot::Medications => "Quais medicamentos e posologia devem constar na receita?",
        Slot::IssueDate => "Qual a data de emissão da receita? (formato AAAA-MM-DD ou DD/MM/AAAA)",
        Slot::Instructions => "Quais as instruções de uso para o paciente?",
        Slot::PatientName => "Qual o nome completo do paciente?",
        Slot::AppointmentDate => "Para qual data deseja a consulta? (formato AAAA-MM-DD ou DD/MM/AAAA)",
        Slot::AppointmentTime => "Qual horário prefere? (formato HH:MM, ex.: 14:30)",
        Slot::Reason => "Qual o motivo da consulta?",
    }
    .to_string()
}

/// Explains the expected format after a rejected value, then asks again.
pub fn rejected(slot: Slot, error: &ValidationError) -> String {
    let hint = match (slot, error) {
        (_, ValidationError::EmptyField { .. }) => "Não recebi nenhuma informação.",
        (Slot::IssueDate, _) => "Data inválida. Use o formato AAAA-MM-DD (ex.: 2024-06-01) ou DD/MM/AAAA.",
        (Slot::AppointmentDate, ValidationError::InvalidFormat { reason, .. })
            if reason.contains("past") =>
        {
            "Essa data já passou. Informe uma data a partir de hoje."
        }
        (Slot::AppointmentDate, _) => "Data inválida. Use o formato AAAA-MM-DD (ex.: 2024-06-15) ou DD/MM/AAAA.",
        (Slot::AppointmentTime, _) => "Horário inválido. Use o formato HH:MM (ex.: 14:30) ou 14h30.",
        (Slot::PatientName, _) => "Nome inválido. Informe o nome completo do paciente.",
        (_, ValidationError::OutOfRange { .. }) => "O texto ficou longo demais. Pode resumir?",
        _ => "Não consegui entender essa informação.",
    };
    format!("{}\n{}", hint, ask(slot))
}

/// Summary of collected values with a confirmation question.
pub fn confirm(intent: Intent, slots: &BTreeMap<String, String>) -> String {
    let lines: Vec<String> = intent
        .slots()
        .iter()
        .map(|slot| {
            let value = slots.get(slot.key()).map(String::as_str).unwrap_or("-");
            format!("• {}: {}", capitalize(slot.label()), value)
        })
        .collect();

    format!(
        "Confira os dados:\n{}\n\n{}",
        lines.join("\n"),
        confirmation_question()
    )
}

pub fn confirmation_question() -> String {
    "Está tudo certo? Responda SIM para confirmar ou NÃO para corrigir.".to_string()
}

pub fn confirmation_unclear(intent: Intent, slots: &BTreeMap<String, String>) -> String {
    format!("Não entendi sua resposta.\n{}", confirm(intent, slots))
}

pub fn restarted(intent: Intent) -> String {
    format!("Sem problemas, vamos recomeçar.\n{}", ask(intent.first_slot()))
}

pub fn completed(intent: Intent) -> String {
    match intent {
        Intent::Prescription => {
            "Receita registrada com sucesso! Ela será enviada após a assinatura do médico."
        }
        Intent::Appointment => "Consulta agendada com sucesso! Até breve.",
    }
    .to_string()
}

/// Generic failure notice. Never includes technical detail.
pub fn action_failed() -> String {
    "Desculpe, não foi possível concluir sua solicitação agora. \
     Por favor, tente novamente em alguns minutos enviando qualquer mensagem."
        .to_string()
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
