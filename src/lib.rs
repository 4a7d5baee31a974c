//! Mentavo tutor backend.
//!
//! Assembles GADIE system prompts for a Socratic math tutor, enriches them
//! with the student's stored misconceptions and skill progress, and serves
//! replies over a console channel and a JSON HTTP API.

pub mod comms;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod llm;
pub mod logger;
pub mod profile;
pub mod store;
pub mod tutor;
