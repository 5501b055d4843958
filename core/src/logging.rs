//! # Logging Configuration
//!
//! Standardized `tracing` configuration for the planning core. Provides
//! structured logs with filters to reduce noise from the evaluator's
//! per-sequence simulation spans, which fire thousands of times per cycle.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use glidepath_core::logging::init_logging;
//!
//! fn main() {
//!     init_logging();
//!     tracing::info!("planning cycle started");
//! }
//! ```
//!
//! ### Environment configuration
//! ```bash
//! export RUST_LOG=info
//! export RUST_LOG=glidepath_evaluator=debug,glidepath_ledger=warn
//! ```

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Name of the tracing span wrapped around a single sequence simulation in
/// the evaluator. Filtered out of the default subscriber because a batch can
/// contain up to 10,000 sequences.
pub const EVALUATOR_SEQUENCE_SPAN_NAME: &str = "evaluate_sequence";

/// Initializes human-readable logging, filtering noisy per-sequence spans.
pub fn init_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::filter::EnvFilter::builder()
                .with_default_directive(tracing_subscriber::filter::LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .with(tracing_subscriber::fmt::layer())
        .with(NoisySpanFilter)
        .init()
}

/// Initializes JSON logging for log aggregators.
pub fn init_json_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::filter::EnvFilter::builder()
                .with_default_directive(tracing_subscriber::filter::LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .with(tracing_subscriber::fmt::layer().json().flatten_event(true))
        .with(NoisySpanFilter)
        .init()
}

struct NoisySpanFilter;

impl<S> tracing_subscriber::layer::Layer<S> for NoisySpanFilter
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    fn event_enabled(
        &self,
        _: &tracing::Event<'_>,
        ctx: tracing_subscriber::layer::Context<'_, S>,
    ) -> bool {
        match ctx.lookup_current() {
            Some(span) => span.name() != EVALUATOR_SEQUENCE_SPAN_NAME,
            None => true,
        }
    }
}
