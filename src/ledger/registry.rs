//! Channel registry.
//!
//! Channels live in an `im::Vector` indexed by `id - 1`, so the id range is
//! dense by construction: `[1, len]`, no gaps, no reuse.

use super::types::{Amount, Channel, ChannelId};
use crate::error::{LedgerError, LedgerResult};

#[derive(Debug, Clone, Default)]
pub struct ChannelRegistry {
    channels: im::Vector<Channel>,
}

impl ChannelRegistry {
    pub fn total(&self) -> u64 {
        self.channels.len() as u64
    }

    /// Whether `id` falls within `[1, total]`.
    pub fn contains(&self, id: ChannelId) -> bool {
        id.get() >= 1 && id.get() <= self.total()
    }

    pub fn get(&self, id: ChannelId) -> LedgerResult<&Channel> {
        if !self.contains(id) {
            return Err(LedgerError::NotFound(id));
        }
        self.channels
            .get((id.get() - 1) as usize)
            .ok_or(LedgerError::NotFound(id))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Channel> {
        self.channels.iter()
    }

    /// Validate a new channel and assign it the next id without storing it.
    pub fn plan_create(&self, name: &str, price: Amount) -> LedgerResult<Channel> {
        if name.is_empty() {
            return Err(LedgerError::InvalidChannelName);
        }
        let next = self.total().checked_add(1).ok_or(LedgerError::Overflow)?;
        Ok(Channel {
            id: ChannelId(next),
            name: name.to_string(),
            price,
        })
    }

    /// Append a planned channel. Its id must be the next one in sequence.
    pub(crate) fn insert(&mut self, channel: Channel) {
        debug_assert_eq!(channel.id.get(), self.total() + 1);
        self.channels.push_back(channel);
    }

    /// Rebuild from persisted rows, which must form the dense id range.
    pub(crate) fn restore(mut rows: Vec<Channel>) -> LedgerResult<Self> {
        rows.sort_by_key(|c| c.id);
        let mut registry = Self::default();
        for channel in rows {
            if channel.id.get() != registry.total() + 1 {
                return Err(LedgerError::Corrupt(format!(
                    "channel id {} out of sequence (expected {})",
                    channel.id,
                    registry.total() + 1
                )));
            }
            if channel.name.is_empty() {
                return Err(LedgerError::Corrupt(format!(
                    "channel {} has an empty name",
                    channel.id
                )));
            }
            registry.insert(channel);
        }
        Ok(registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry_with(names: &[&str]) -> ChannelRegistry {
        let mut registry = ChannelRegistry::default();
        for name in names {
            let channel = registry.plan_create(name, Amount::new(1)).unwrap();
            registry.insert(channel);
        }
        registry
    }

    #[test]
    fn ids_are_sequential_from_one() {
        let registry = registry_with(&["general", "random", "dev"]);
        assert_eq!(registry.total(), 3);
        let ids: Vec<u64> = registry.iter().map(|c| c.id.get()).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn get_outside_range_is_not_found() {
        let registry = registry_with(&["general"]);
        assert_eq!(registry.get(ChannelId(1)).unwrap().name, "general");
        assert_eq!(
            registry.get(ChannelId(0)),
            Err(LedgerError::NotFound(ChannelId(0)))
        );
        assert_eq!(
            registry.get(ChannelId(2)),
            Err(LedgerError::NotFound(ChannelId(2)))
        );
    }

    #[test]
    fn plan_does_not_mutate() {
        let registry = registry_with(&["general"]);
        let planned = registry.plan_create("random", Amount::ZERO).unwrap();
        assert_eq!(planned.id, ChannelId(2));
        assert_eq!(registry.total(), 1);
    }

    #[test]
    fn empty_name_rejected() {
        let registry = ChannelRegistry::default();
        assert_eq!(
            registry.plan_create("", Amount::new(1)),
            Err(LedgerError::InvalidChannelName)
        );
    }

    #[test]
    fn restore_rejects_gaps() {
        let rows = vec![
            Channel {
                id: ChannelId(1),
                name: "general".into(),
                price: Amount::new(1),
            },
            Channel {
                id: ChannelId(3),
                name: "dev".into(),
                price: Amount::new(1),
            },
        ];
        assert!(matches!(
            ChannelRegistry::restore(rows),
            Err(LedgerError::Corrupt(_))
        ));
    }

    #[test]
    fn restore_sorts_rows() {
        let rows = vec![
            Channel {
                id: ChannelId(2),
                name: "random".into(),
                price: Amount::new(5),
            },
            Channel {
                id: ChannelId(1),
                name: "general".into(),
                price: Amount::new(1),
            },
        ];
        let registry = ChannelRegistry::restore(rows).unwrap();
        assert_eq!(registry.get(ChannelId(2)).unwrap().price, Amount::new(5));
    }
}
