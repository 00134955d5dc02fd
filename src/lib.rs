//! An int-to-string hash map with an opt-in reader/writer lock.
//!
//! ```
//! use nvo_collections::{IntStrMap, SafeIntStrMap};
//!
//! let map: IntStrMap = IntStrMap::new();
//! map.set(1, "a");
//! assert_eq!(map.get_or_set(1, "b"), "a");
//!
//! let shared = std::sync::Arc::new(SafeIntStrMap::new());
//! let writer = {
//!     let shared = shared.clone();
//!     std::thread::spawn(move || shared.set(2, "b"))
//! };
//! writer.join().unwrap();
//! assert_eq!(shared.to_json().unwrap(), r#"{"2":"b"}"#);
//! ```

pub mod concurrent;
pub mod conv;
pub mod error;
pub mod map;

pub use concurrent::{LockMode, Safe, Unsafe, View};
pub use error::{MapError, MapResult};
pub use map::{IntStrMap, IntStrMapBuilder, SafeIntStrMap};
