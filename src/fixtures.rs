#[cfg(test)]
pub mod test {
    use std::path::Path;
    use std::sync::{Mutex, MutexGuard, PoisonError};

    use serde::{Deserialize, Serialize};

    use crate::accessor::Configuration;
    use crate::file::FileStore;
    use crate::kind::{Bool, Date, Json, Num, Str};
    use crate::memory::{MemoryRegistry, MemoryStore};
    use crate::schema::{Key, Schema};
    use crate::spec::{Defaulted, Optional, Required, bool, date, json, num, str};
    use crate::types::FileFormat;

    #[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
    pub struct WindowState {
        pub width: u32,
        pub height: u32,
    }

    impl Default for WindowState {
        fn default() -> Self {
            Self {
                width: 800,
                height: 600,
            }
        }
    }

    /// One field of every kind and policy.
    #[derive(Debug, Clone)]
    pub struct Settings {
        pub flag: Key<Optional<Bool>>,
        pub count: Key<Optional<Num>>,
        pub retries: Key<Defaulted<Num>>,
        pub token: Key<Required<Str>>,
        pub since: Key<Optional<Date>>,
        pub window: Key<Defaulted<Json<WindowState>>>,
    }

    impl Settings {
        pub fn declare() -> (Schema, Settings) {
            let mut schema = Schema::builder();
            let keys = Settings {
                flag: schema.field("flag", bool().explain("Feature toggle")),
                count: schema.field("count", num()),
                retries: schema.field(
                    "retries",
                    num().default(3.0).explain("How many times to retry"),
                ),
                token: schema.field(
                    "token",
                    str().required().explain("API token from the dashboard"),
                ),
                since: schema.field("since", date()),
                window: schema.field(
                    "window",
                    json::<WindowState>().default(WindowState::default()),
                ),
            };
            let schema = schema.build().expect("fixture schema has unique names");
            (schema, keys)
        }
    }

    /// An accessor over a private in-memory registry.
    pub fn memory_config(name: &str) -> (Configuration<MemoryStore>, Settings) {
        let (schema, keys) = Settings::declare();
        let store = MemoryRegistry::new()
            .namespace(&format!("kvfig-test-{name}"))
            .unwrap();
        (Configuration::new(schema, store), keys)
    }

    /// An accessor over a file store in `dir`.
    pub fn file_config(
        dir: &Path,
        name: &str,
        format: FileFormat,
    ) -> (Configuration<FileStore>, Settings) {
        let (schema, keys) = Settings::declare();
        let store = FileStore::open(dir, name, format).unwrap();
        (Configuration::new(schema, store), keys)
    }

    const SETTINGS_VARS: [&str; 2] = ["KVFIG_DIR", "KVFIG_FORMAT"];

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    /// `KVFIG_*` variables set for the guard's lifetime. Tests holding one
    /// are serialized; every settings variable is cleared on entry and exit.
    pub struct ScopedEnv {
        _lock: MutexGuard<'static, ()>,
    }

    impl ScopedEnv {
        pub fn set(vars: &[(&str, &str)]) -> Self {
            let lock = ENV_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
            // SAFETY: every test touching the environment holds ENV_LOCK.
            unsafe {
                for name in SETTINGS_VARS {
                    std::env::remove_var(name);
                }
                for (name, value) in vars {
                    std::env::set_var(name, value);
                }
            }
            Self { _lock: lock }
        }
    }

    impl Drop for ScopedEnv {
        fn drop(&mut self) {
            // SAFETY: the lock is still held until this guard's fields drop.
            unsafe {
                for name in SETTINGS_VARS {
                    std::env::remove_var(name);
                }
            }
        }
    }

    #[test]
    fn fixture_schema_declares_every_field() {
        let (schema, keys) = Settings::declare();
        assert_eq!(schema.len(), 6);
        assert_eq!(keys.window.name(), "window");
    }
}
