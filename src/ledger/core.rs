// 9.1: the ledger service. all mutable state lives here behind one struct; every
// public operation takes &mut self, runs to completion, and either applies every
// implied state change and transfer or none of them. operations follow
// validate -> mutate -> external transfer ordering throughout.

use std::collections::HashMap;

use super::config::LedgerConfig;
use crate::asset::AssetLedger;
use crate::epoch::EpochStore;
use crate::events::{Event, EventId, EventPayload};
use crate::layer::TradeLayer;
use crate::shares::ShareLedger;
use crate::types::{Address, LayerId, Timestamp};

/// The liquidity ledger: epochs, per-LP shares, trade layers, and the event log,
/// over an external asset ledger `A` holding the pooled funds at `address`.
#[derive(Debug)]
pub struct Ledger<A: AssetLedger> {
    pub(super) config: LedgerConfig,
    /// The pool's own address on the asset ledger.
    pub(super) address: Address,
    pub(super) asset: A,
    pub(super) epochs: EpochStore,
    pub(super) shares: ShareLedger,
    pub(super) layers: HashMap<LayerId, TradeLayer>,
    pub(super) next_layer_id: u64,
    pub(super) events: Vec<Event>,
    pub(super) next_event_id: u64,
    pub(super) current_time: Timestamp,
}

impl<A: AssetLedger> Ledger<A> {
    pub fn new(config: LedgerConfig, address: Address, asset: A) -> Self {
        Self {
            config,
            address,
            asset,
            epochs: EpochStore::new(),
            shares: ShareLedger::new(),
            layers: HashMap::new(),
            next_layer_id: 1,
            events: Vec::new(),
            next_event_id: 1,
            current_time: Timestamp::from_millis(0),
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn asset(&self) -> &A {
        &self.asset
    }

    pub fn asset_mut(&mut self) -> &mut A {
        &mut self.asset
    }

    pub fn set_time(&mut self, timestamp: Timestamp) {
        self.current_time = timestamp;
    }

    pub fn time(&self) -> Timestamp {
        self.current_time
    }

    pub fn advance_time(&mut self, millis: i64) {
        self.current_time = Timestamp::from_millis(self.current_time.as_millis() + millis);
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn recent_events(&self, count: usize) -> &[Event] {
        let start = self.events.len().saturating_sub(count);
        &self.events[start..]
    }

    pub(super) fn emit_event(&mut self, payload: EventPayload) {
        let event = Event::new(EventId(self.next_event_id), self.current_time, payload);
        self.next_event_id += 1;

        if self.config.verbose {
            println!("[Event {}] {:?}", event.id.0, event.payload);
        }

        self.events.push(event);

        if self.events.len() > self.config.max_events {
            let drain_count = self.events.len() - self.config.max_events;
            self.events.drain(0..drain_count);
        }
    }

    pub(super) fn allocate_layer_id(&mut self) -> LayerId {
        let id = LayerId(self.next_layer_id);
        self.next_layer_id += 1;
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::MockAsset;
    use crate::events::EpochCreatedEvent;
    use crate::types::EpochId;

    const POOL: Address = Address(100);

    fn ledger() -> Ledger<MockAsset> {
        Ledger::new(LedgerConfig::default(), POOL, MockAsset::new(POOL))
    }

    #[test]
    fn fresh_ledger_starts_at_epoch_one() {
        let ledger = ledger();
        assert_eq!(ledger.current_epoch_id(), EpochId(1));
        assert_eq!(ledger.total_free_assets(), 0);
        assert!(ledger.events().is_empty());
    }

    #[test]
    fn event_log_is_capped() {
        let mut ledger = Ledger::new(
            LedgerConfig {
                max_events: 3,
                ..LedgerConfig::default()
            },
            POOL,
            MockAsset::new(POOL),
        );

        for i in 1..=5u64 {
            ledger.emit_event(EventPayload::EpochCreated(EpochCreatedEvent {
                epoch_id: EpochId(i),
            }));
        }

        assert_eq!(ledger.events().len(), 3);
        assert_eq!(ledger.events()[0].id, EventId(3));
        assert_eq!(ledger.recent_events(2).len(), 2);
    }

    #[test]
    fn logical_clock_advances() {
        let mut ledger = ledger();
        ledger.set_time(Timestamp::from_millis(1000));
        ledger.advance_time(500);
        assert_eq!(ledger.time().as_millis(), 1500);
    }
}
