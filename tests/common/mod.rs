use std::collections::HashMap;

use env_logger::Env;
use nvo_collections::{IntStrMap, LockMode};

#[allow(dead_code)]
pub fn init_logger() {
    let _ = env_logger::Builder::from_env(Env::default().default_filter_or("debug"))
        .is_test(true)
        .try_init();
}

#[allow(dead_code)]
pub fn map_of<M: LockMode>(entries: &[(i64, &str)]) -> IntStrMap<M> {
    entries
        .iter()
        .map(|(key, value)| (*key, value.to_string()))
        .collect()
}

#[allow(dead_code)]
pub fn hash_map_of(entries: &[(i64, &str)]) -> HashMap<i64, String> {
    entries
        .iter()
        .map(|(key, value)| (*key, value.to_string()))
        .collect()
}
