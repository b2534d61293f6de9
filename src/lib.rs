//! # arete
//!
//! Progression core for a gamified personal-development tracker.
//!
//! The heart of the crate is pure: a level-curve engine ([`progression`])
//! and a stat-award resolver ([`awards`]), both free of I/O. Around them sit
//! the collaborators: a Postgres data layer with an append-only XP ledger
//! ([`db`]), bearer-token auth ([`auth`]), LLM content generation via
//! rig-core ([`llm`]), and OpenTelemetry observability ([`telemetry`]).

pub mod auth;
pub mod awards;
pub mod config;
pub mod db;
pub mod error;
pub mod llm;
pub mod model;
pub mod progression;
pub mod sweep;
pub mod telemetry;
