use super::*;
use std::collections::HashMap;
use std::sync::Mutex;
use warden_core::ID;

/// In-memory principals for tests. The map's entry API plays the part
/// of the store's uniqueness constraint.
#[derive(Debug, Default)]
pub struct Memory {
    principals: Mutex<HashMap<String, Principal>>,
}

impl Memory {
    pub fn len(&self) -> usize {
        self.principals.lock().unwrap().len()
    }
}

impl Credentials for Memory {
    async fn find(&self, username: &str) -> Result<Principal, StoreError> {
        self.principals
            .lock()
            .unwrap()
            .get(username)
            .cloned()
            .ok_or(StoreError::NotFound)
    }
    async fn create(&self, username: &str, hashword: &str) -> Result<Principal, StoreError> {
        use std::collections::hash_map::Entry;
        match self.principals.lock().unwrap().entry(username.to_string()) {
            Entry::Occupied(_) => Err(StoreError::Conflict),
            Entry::Vacant(slot) => Ok(slot
                .insert(Principal::new(
                    ID::default(),
                    username.to_string(),
                    hashword.to_string(),
                    std::time::SystemTime::now(),
                ))
                .clone()),
        }
    }
}

/// Store whose every call fails as an unreachable backend would.
#[derive(Debug, Default)]
pub struct Broken;

impl Credentials for Broken {
    async fn find(&self, _: &str) -> Result<Principal, StoreError> {
        Err(StoreError::Backend("connection reset".into()))
    }
    async fn create(&self, _: &str, _: &str) -> Result<Principal, StoreError> {
        Err(StoreError::Backend("connection reset".into()))
    }
}
