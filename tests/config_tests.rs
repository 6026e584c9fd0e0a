/// Configuration integration tests.
///
/// # Safety
///
/// The env override test uses `std::env::set_var` / `remove_var`, which are
/// `unsafe` in Rust 2024 edition. Everything touching `MEDFORM_*` variables
/// lives in one `#[test]` so no other test in this binary reads them
/// concurrently.
use medform::config;
use medform::storage::{FileStorage, LocalStorage};

/// Helper: set an env var (wraps the `unsafe` call).
///
/// # Safety
/// Must only be called from single-threaded test contexts.
unsafe fn set_env(key: &str, val: &str) {
    unsafe { std::env::set_var(key, val) }
}

/// Helper: remove an env var (wraps the `unsafe` call).
///
/// # Safety
/// Must only be called from single-threaded test contexts.
unsafe fn remove_env(key: &str) {
    unsafe { std::env::remove_var(key) }
}

#[test]
fn env_vars_override_every_layer() {
    let storage_path = std::env::temp_dir()
        .join(format!("medform-config-{}", std::process::id()))
        .join("storage.json");

    unsafe { set_env("MEDFORM_BACKEND_URL", "http://10.1.2.3:5000") };
    unsafe { set_env("MEDFORM_WEB_ADDR", "0.0.0.0:8080") };
    unsafe { set_env("MEDFORM_STORAGE_PATH", storage_path.to_str().unwrap()) };
    unsafe { set_env("MEDFORM_LOGGING", "off") };

    let cfg = config::load();
    assert_eq!(cfg.backend.url, "http://10.1.2.3:5000");
    assert_eq!(cfg.web.addr, "0.0.0.0:8080");
    assert_eq!(cfg.storage.path, storage_path.to_str().unwrap());
    assert!(!cfg.logging.enabled);
    assert!(!cfg.logging.predictions_enabled());
    assert!(!cfg.logging.diagnostics_enabled());

    // The configured path is the one storage uses.
    let mut storage = FileStorage::from_config(&cfg.storage).unwrap();
    assert_eq!(storage.path(), storage_path.as_path());
    storage.set_item("theme", "dark").unwrap();
    assert_eq!(storage.get_item("theme").unwrap().as_deref(), Some("dark"));
    let _ = std::fs::remove_dir_all(storage_path.parent().unwrap());

    // Empty backend URL is ignored rather than clearing the value.
    unsafe { set_env("MEDFORM_BACKEND_URL", "") };
    let cfg = config::load();
    assert!(!cfg.backend.url.is_empty());

    unsafe { set_env("MEDFORM_LOGGING", "yes") };
    assert!(config::load().logging.enabled);

    unsafe { remove_env("MEDFORM_BACKEND_URL") };
    unsafe { remove_env("MEDFORM_WEB_ADDR") };
    unsafe { remove_env("MEDFORM_STORAGE_PATH") };
    unsafe { remove_env("MEDFORM_LOGGING") };
}
