//! Grant application span helpers.
//!
//! Provides span creation and level-change recording for XP grants
//! flowing through the ledger write path.

use tracing::Span;
use uuid::Uuid;

/// Start a span for an XP grant application.
///
/// The `grant.level_change` field is declared empty and can be updated
/// via [`record_level_change`].
pub fn start_grant_span(entity_type: &str, entity_id: &Uuid) -> Span {
    tracing::info_span!(
        "grant.apply",
        "grant.entity_type" = entity_type,
        "grant.entity_id" = %entity_id,
        "grant.level_change" = tracing::field::Empty,
    )
}

/// Record a level change event on the given span.
///
/// Emits a tracing `info` event scoped to the span.
pub fn record_level_change(span: &Span, from: u32, to: u32) {
    span.record("grant.level_change", format!("{from}->{to}").as_str());
    span.in_scope(|| {
        tracing::info!(from, to, "level_change");
    });
}
