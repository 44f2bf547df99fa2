//! BDD step definitions for the status board service

pub mod incident_steps;
pub mod layout_steps;
pub mod loop_steps;
