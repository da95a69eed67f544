// Shared broker-side state
pub mod broker_state;
pub mod notifications;
pub mod order_registry;

// FIX callbacks and the engine-facing facade
pub mod gateway;
pub mod session;

pub use broker_state::BrokerState;
pub use gateway::FixGateway;
pub use notifications::NotificationQueue;
pub use order_registry::OrderRegistry;
pub use session::SessionAdapter;

use std::sync::{Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

// A panic on another thread must not take the session down with it.

pub(crate) fn lock_or_recover<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            tracing::error!("Broker state: Lock poisoned, recovering");
            poisoned.into_inner()
        }
    }
}

pub(crate) fn read_or_recover<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    match lock.read() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

pub(crate) fn write_or_recover<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    match lock.write() {
        Ok(guard) => guard,
        Err(poisoned) => {
            tracing::error!("Broker state: Lock poisoned during write, recovering");
            poisoned.into_inner()
        }
    }
}
