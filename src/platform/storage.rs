//! Key/value persistence
//!
//! Settings and session history are stored as JSON strings under a key.
//! Native builds keep one file per key in a data directory; the browser
//! build uses LocalStorage. Failures are logged and reported as `false` or
//! `None`, never propagated.

use std::cell::RefCell;
use std::collections::HashMap;

pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    /// Returns false if the value could not be written
    fn set(&self, key: &str, value: &str) -> bool;
}

/// In-memory store (tests and storage-less environments)
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: RefCell<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.borrow().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> bool {
        self.values.borrow_mut().insert(key.to_string(), value.to_string());
        true
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub use native::FileStore;

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use std::path::PathBuf;

    use super::KeyValueStore;

    /// Environment variable overriding the data directory
    pub const DATA_DIR_ENV: &str = "NETGUARDIAN_DATA_DIR";

    /// One `<key>.json` file per key
    #[derive(Debug, Clone)]
    pub struct FileStore {
        dir: PathBuf,
    }

    impl FileStore {
        pub fn new(dir: impl Into<PathBuf>) -> Self {
            Self { dir: dir.into() }
        }

        /// `$NETGUARDIAN_DATA_DIR`, or `data/` in the working directory
        pub fn from_env() -> Self {
            let dir = std::env::var_os(DATA_DIR_ENV).map_or_else(|| PathBuf::from("data"), PathBuf::from);
            Self::new(dir)
        }

        fn path(&self, key: &str) -> PathBuf {
            self.dir.join(format!("{key}.json"))
        }
    }

    impl KeyValueStore for FileStore {
        fn get(&self, key: &str) -> Option<String> {
            std::fs::read_to_string(self.path(key)).ok()
        }

        fn set(&self, key: &str, value: &str) -> bool {
            let result = std::fs::create_dir_all(&self.dir).and_then(|_| std::fs::write(self.path(key), value));
            if let Err(e) = &result {
                log::warn!("Could not write {}: {e}", self.path(key).display());
            }
            result.is_ok()
        }
    }
}

#[cfg(target_arch = "wasm32")]
pub use web::LocalStore;

#[cfg(target_arch = "wasm32")]
mod web {
    use super::KeyValueStore;

    /// Browser LocalStorage
    #[derive(Debug, Default, Clone, Copy)]
    pub struct LocalStore;

    fn storage() -> Option<web_sys::Storage> {
        web_sys::window().and_then(|w| w.local_storage().ok()).flatten()
    }

    impl KeyValueStore for LocalStore {
        fn get(&self, key: &str) -> Option<String> {
            storage()?.get_item(key).ok().flatten()
        }

        fn set(&self, key: &str, value: &str) -> bool {
            let Some(storage) = storage() else {
                log::warn!("LocalStorage unavailable");
                return false;
            };
            storage.set_item(key, value).is_ok()
        }
    }
}

/// Default store for the current platform
pub fn platform_store() -> Box<dyn KeyValueStore> {
    #[cfg(target_arch = "wasm32")]
    {
        Box::new(LocalStore)
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        Box::new(FileStore::from_env())
    }
}
