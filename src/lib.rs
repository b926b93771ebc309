//! Clinic Assistant - Chat-driven clinic operations
//!
//! Patients talk to the clinic over WhatsApp. A deterministic flow engine
//! walks each conversation through intent selection, field collection and
//! confirmation, then asks for appointments or prescriptions to be created.

pub mod adapters;
pub mod application;
pub mod bootstrap;
pub mod config;
pub mod domain;
pub mod ports;
