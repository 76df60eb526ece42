use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::Serialize;

const LABEL_PREFIX_CHARS: usize = 10;

/// One outbound-mail credential. `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct MailIdentity {
    key: String,
}

impl MailIdentity {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// First ten characters followed by `...`.
    pub fn label(&self) -> String {
        let prefix: String = self.key.chars().take(LABEL_PREFIX_CHARS).collect();
        format!("{prefix}...")
    }
}

impl fmt::Debug for MailIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("MailIdentity").field(&self.label()).finish()
    }
}

/// A reserved send slot on one identity.
#[derive(Debug, Clone)]
pub struct KeyLease {
    index: usize,
    generation: u64,
    identity: MailIdentity,
}

impl KeyLease {
    pub fn identity(&self) -> &MailIdentity {
        &self.identity
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyUsage {
    pub key: String,
    pub usage: u32,
    pub limit: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeyPoolError {
    #[error("no mail identities configured")]
    Empty,
    #[error("per-identity quota must be greater than zero")]
    ZeroQuota,
}

#[derive(Debug)]
struct Rotation {
    usage: Vec<u32>,
    cursor: usize,
    generation: u64,
}

/// Round-robin pool of mail identities with a fixed per-identity quota.
///
/// Each checkout reserves its slot under the lock, so concurrent dispatches
/// share one view of the counters.
#[derive(Debug)]
pub struct KeyPool {
    identities: Vec<MailIdentity>,
    quota: u32,
    rotation: Mutex<Rotation>,
}

impl KeyPool {
    pub fn new<I, S>(keys: I, quota: u32) -> Result<Self, KeyPoolError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let identities: Vec<MailIdentity> = keys
            .into_iter()
            .map(Into::into)
            .filter(|key: &String| !key.trim().is_empty())
            .map(MailIdentity::new)
            .collect();

        if identities.is_empty() {
            return Err(KeyPoolError::Empty);
        }
        if quota == 0 {
            return Err(KeyPoolError::ZeroQuota);
        }

        let rotation = Rotation {
            usage: vec![0; identities.len()],
            cursor: 0,
            generation: 0,
        };
        Ok(Self {
            identities,
            quota,
            rotation: Mutex::new(rotation),
        })
    }

    /// Reserve one send on the next identity with headroom.
    ///
    /// Identities at quota are skipped; when skipping carries the cursor back
    /// to the first identity every counter resets, so a lease is always found
    /// within one pass over the pool.
    pub fn checkout(&self) -> KeyLease {
        let mut rotation = self.lock();
        let count = self.identities.len();

        loop {
            let index = rotation.cursor;
            rotation.cursor = (index + 1) % count;

            if rotation.usage[index] < self.quota {
                rotation.usage[index] += 1;
                return KeyLease {
                    index,
                    generation: rotation.generation,
                    identity: self.identities[index].clone(),
                };
            }

            if rotation.cursor == 0 {
                rotation.usage.iter_mut().for_each(|usage| *usage = 0);
                rotation.generation += 1;
            }
        }
    }

    /// Report the delivery result; a failed send gives its slot back.
    pub fn settle(&self, lease: &KeyLease, delivered: bool) {
        if delivered {
            return;
        }
        let mut rotation = self.lock();
        if rotation.generation == lease.generation {
            let usage = &mut rotation.usage[lease.index];
            *usage = usage.saturating_sub(1);
        }
    }

    pub fn usage_stats(&self) -> Vec<KeyUsage> {
        let rotation = self.lock();
        self.identities
            .iter()
            .zip(&rotation.usage)
            .map(|(identity, usage)| KeyUsage {
                key: identity.label(),
                usage: *usage,
                limit: self.quota,
            })
            .collect()
    }

    // Counters stay consistent across a panic elsewhere, so a poisoned lock is reused.
    fn lock(&self) -> MutexGuard<'_, Rotation> {
        self.rotation.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
