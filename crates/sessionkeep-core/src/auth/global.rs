//! Process-wide session manager, constructed lazily on first use.
//!
//! Applications that can pass an `AuthSessionManager` around explicitly
//! should do so; this holder exists for front ends that want one shared
//! instance without threading it through every call site.
//!
//! Reads are a single atomic load. Construction is guarded by an async mutex
//! and re-checks the slot after acquiring it, so concurrent first callers all
//! end up with the same instance. `reset_instance` is the teardown hook;
//! handles obtained earlier keep working.

use std::sync::{Arc, OnceLock};

use anyhow::Result;
use arc_swap::ArcSwapOption;
use tokio::sync::Mutex;
use tracing::info;

use crate::config::SessionConfig;

use super::manager::AuthSessionManager;

struct Slot {
    current: ArcSwapOption<AuthSessionManager>,
    init: Mutex<()>,
}

static GLOBAL_MANAGER: OnceLock<Slot> = OnceLock::new();

#[inline]
fn slot() -> &'static Slot {
    GLOBAL_MANAGER.get_or_init(|| Slot {
        current: ArcSwapOption::from(None),
        init: Mutex::new(()),
    })
}

/// Get-or-init the shared manager.
///
/// `config` is only consulted by the call that actually constructs the
/// instance; later calls return the existing one unchanged.
pub async fn get_instance(config: &SessionConfig) -> Result<Arc<AuthSessionManager>> {
    let slot = slot();
    if let Some(existing) = slot.current.load_full() {
        return Ok(existing);
    }

    let _init = slot.init.lock().await;
    if let Some(existing) = slot.current.load_full() {
        return Ok(existing);
    }

    info!("Creating shared session manager");
    let manager = Arc::new(AuthSessionManager::from_config(config).await?);
    slot.current.store(Some(Arc::clone(&manager)));
    Ok(manager)
}

/// The shared manager, if one has been constructed
pub fn try_instance() -> Option<Arc<AuthSessionManager>> {
    slot().current.load_full()
}

/// Drop the shared manager so the next `get_instance` builds a fresh one
pub fn reset_instance() {
    slot().current.store(None);
}
