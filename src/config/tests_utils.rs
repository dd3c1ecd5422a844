//! Shared test utilities for config module tests.

use std::sync::Mutex;

/// Mutex to serialize environment variable tests and prevent race conditions.
pub static ENV_MUTEX: Mutex<()> = Mutex::new(());

/// Every variable the config tests may set.
pub const LOKAL_ENV_VARS: &[&str] = &[
    "LOKAL_CONFIG",
    "LOKAL_DATABASE_PATH",
    "LOKAL_EMBEDDING_BACKEND",
    "LOKAL_EMBEDDING_MODEL",
    "LOKAL_MODEL_CACHE",
    "LOKAL_LLM_ENDPOINT",
    "LOKAL_LLM_MODEL",
    "LOKAL_API_KEY_ENV",
    "LOKAL_REQUEST_TIMEOUT_SECS",
    "LOKAL_K_RETRIEVE",
    "LOKAL_K_KEEP",
    "LOKAL_MIN_SIMILARITY",
    "LOKAL_ZERO_CONTEXT_CEILING",
    "LOKAL_TEST_API_KEY",
];

/// Remove every lokal config variable. Call with `ENV_MUTEX` held.
pub fn cleanup_env_vars() {
    for var in LOKAL_ENV_VARS {
        // SAFETY: env tests are serialized by ENV_MUTEX
        unsafe { std::env::remove_var(var) };
    }
}

/// Set a variable. Call with `ENV_MUTEX` held.
pub fn set_env(name: &str, value: &str) {
    // SAFETY: env tests are serialized by ENV_MUTEX
    unsafe { std::env::set_var(name, value) };
}
