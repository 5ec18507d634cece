//! Account profiles: a plain keyed upsert.

use super::types::{AccountId, Profile};
use crate::error::{LedgerError, LedgerResult};

#[derive(Debug, Clone, Default)]
pub struct ProfileStore {
    profiles: im::HashMap<AccountId, Profile>,
}

impl ProfileStore {
    /// The stored profile, or the empty one if none was ever set.
    pub fn get(&self, account: &AccountId) -> Profile {
        self.profiles.get(account).cloned().unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    pub fn plan_set(&self, name: &str, bio: &str, avatar_url: &str) -> LedgerResult<Profile> {
        if name.is_empty() {
            return Err(LedgerError::InvalidProfile("name must not be empty"));
        }
        Ok(Profile {
            name: name.to_string(),
            bio: bio.to_string(),
            avatar_url: avatar_url.to_string(),
        })
    }

    pub(crate) fn upsert(&mut self, account: AccountId, profile: Profile) {
        self.profiles.insert(account, profile);
    }

    pub(crate) fn restore(rows: Vec<(AccountId, Profile)>) -> LedgerResult<Self> {
        let mut store = Self::default();
        for (account, profile) in rows {
            if profile.name.is_empty() {
                return Err(LedgerError::Corrupt(format!(
                    "profile of {} has an empty name",
                    account
                )));
            }
            store.upsert(account, profile);
        }
        Ok(store)
    }
}
