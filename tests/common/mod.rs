//! Shared helpers for cohort-based integration tests.

#![allow(dead_code)]

use bytemuck::{Pod, Zeroable};
use kmerdht::{RemoteMode, TableConfig, TableRecord};

/// Record with a caller-chosen hash, so tests can steer keys onto specific
/// ranks and slots.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Pod, Zeroable)]
pub struct TestRecord {
    pub hash: u64,
    pub id: u64,
    pub payload: u64,
}

/// Key of a [`TestRecord`]: the hash plus a discriminator, so distinct keys
/// can collide on the same probe chain.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Pod, Zeroable)]
pub struct TestKey {
    pub hash: u64,
    pub id: u64,
}

impl TableRecord for TestRecord {
    type Key = TestKey;

    fn key(&self) -> TestKey {
        TestKey {
            hash: self.hash,
            id: self.id,
        }
    }

    fn key_hash(key: &TestKey) -> u64 {
        key.hash
    }
}

pub fn rec(hash: u64, id: u64, payload: u64) -> TestRecord {
    TestRecord { hash, id, payload }
}

pub fn key(hash: u64, id: u64) -> TestKey {
    TestKey { hash, id }
}

pub fn config(total_slots: u64, mode: RemoteMode) -> TableConfig {
    TableConfig {
        total_slots,
        remote_mode: mode,
        ..TableConfig::default()
    }
}
