pub mod agenda; // Status merge + agenda grouping
pub mod cache; // Last-good agenda cache (on-device)
pub mod config;
pub mod lifecycle; // Create/update/delete + fetch-recompute cycle
pub mod models;
pub mod schedule; // Deterministic occurrence generation
pub mod store; // Remote reminder store boundary

pub use agenda::{build_agenda, merge_status};
pub use cache::{AgendaCache, CacheError, CachedAgenda};
pub use lifecycle::{AgendaSnapshot, ReminderService, SchedulerError};
pub use models::{
    AgendaDay, AgendaItem, FieldViolation, Frequency, IntakeLog, IntakeStatus, Occurrence,
    ReminderDefinition, ReminderStatus, SlotStatus, ValidationError,
};
pub use schedule::{generate, generate_all, DataIntegrityError, DateWindow};
pub use store::{HttpReminderStore, ReminderStore, StoreError};

use tracing_subscriber::EnvFilter;

/// Initialize tracing for binaries embedding the engine.
///
/// Respects `RUST_LOG` when set, otherwise falls back to the crate's
/// default filter.
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);
}
