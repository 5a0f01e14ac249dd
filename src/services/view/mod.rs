// View binding and input events
// Abstract surface between the grid core and any concrete UI

use std::collections::{BTreeMap, VecDeque};

use chrono::NaiveDate;

use crate::models::grid::TimeGrid;
use crate::models::schedule::ScheduleMeta;
use crate::services::drag::DragOrigin;

/// UI affordances driven by the core. Implementations stay dumb: every
/// state transition the UI can show is expressed through this trait, so
/// the core is testable without a real DOM.
pub trait ViewBinding: Send {
    fn render_grid(&mut self, grid: &TimeGrid, meta: &ScheduleMeta);
    fn set_undo_enabled(&mut self, enabled: bool);
    fn set_redo_enabled(&mut self, enabled: bool);
    fn show_unplaced(&mut self, ids: &[String]);
    fn mark_in_transit(&mut self, entity_id: &str, in_transit: bool);
    fn set_drop_hint(&mut self, slot: Option<usize>);
    fn return_to_panel(&mut self, entity_id: &str);
    fn toast(&mut self, message: &str);
}

/// Binding that swallows every update. Headless and test use.
#[derive(Debug, Default)]
pub struct NullView;

impl ViewBinding for NullView {
    fn render_grid(&mut self, _grid: &TimeGrid, _meta: &ScheduleMeta) {}
    fn set_undo_enabled(&mut self, _enabled: bool) {}
    fn set_redo_enabled(&mut self, _enabled: bool) {}
    fn show_unplaced(&mut self, _ids: &[String]) {}
    fn mark_in_transit(&mut self, _entity_id: &str, _in_transit: bool) {}
    fn set_drop_hint(&mut self, _slot: Option<usize>) {}
    fn return_to_panel(&mut self, _entity_id: &str) {}
    fn toast(&mut self, _message: &str) {}
}

/// One discrete user gesture, decoupled from any real event system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    DragStart { entity_id: String, origin: DragOrigin },
    DragOver { slot: usize },
    DragLeave,
    Drop { slot: usize },
    DragEnd,
    Undo,
    Redo,
    Generate { date: NaiveDate },
}

/// Source of input events the planner can drain.
pub trait EventSource {
    fn next_event(&mut self) -> Option<InputEvent>;
}

impl EventSource for VecDeque<InputEvent> {
    fn next_event(&mut self) -> Option<InputEvent> {
        self.pop_front()
    }
}

/// Identifier of one registered subscriber queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

/// Fan-out hub: producers publish events, subscribers poll their own
/// queue. Unsubscribing drops the queue and any undelivered events.
#[derive(Debug, Default)]
pub struct EventHub {
    next_id: u64,
    queues: BTreeMap<u64, VecDeque<InputEvent>>,
}

impl EventHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self) -> SubscriptionId {
        let id = self.next_id;
        self.next_id += 1;
        self.queues.insert(id, VecDeque::new());
        SubscriptionId(id)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) {
        self.queues.remove(&id.0);
    }

    pub fn subscriber_count(&self) -> usize {
        self.queues.len()
    }

    pub fn publish(&mut self, event: InputEvent) {
        for queue in self.queues.values_mut() {
            queue.push_back(event.clone());
        }
    }

    pub fn poll(&mut self, id: SubscriptionId) -> Option<InputEvent> {
        self.queues.get_mut(&id.0)?.pop_front()
    }

    /// Borrowing adapter so one subscription can feed `EventSource`
    /// consumers.
    pub fn cursor(&mut self, id: SubscriptionId) -> HubCursor<'_> {
        HubCursor { hub: self, id }
    }
}

pub struct HubCursor<'a> {
    hub: &'a mut EventHub,
    id: SubscriptionId,
}

impl EventSource for HubCursor<'_> {
    fn next_event(&mut self) -> Option<InputEvent> {
        self.hub.poll(self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscribers_each_receive_published_events() {
        let mut hub = EventHub::new();
        let a = hub.subscribe();
        let b = hub.subscribe();

        hub.publish(InputEvent::Undo);

        assert_eq!(hub.poll(a), Some(InputEvent::Undo));
        assert_eq!(hub.poll(b), Some(InputEvent::Undo));
        assert_eq!(hub.poll(a), None);
    }

    #[test]
    fn test_unsubscribe_drops_undelivered_events() {
        let mut hub = EventHub::new();
        let id = hub.subscribe();
        hub.publish(InputEvent::Redo);
        hub.unsubscribe(id);

        assert_eq!(hub.subscriber_count(), 0);
        assert_eq!(hub.poll(id), None);
    }

    #[test]
    fn test_events_arrive_in_publish_order() {
        let mut hub = EventHub::new();
        let id = hub.subscribe();
        hub.publish(InputEvent::DragOver { slot: 1 });
        hub.publish(InputEvent::DragLeave);

        let mut cursor = hub.cursor(id);
        assert_eq!(cursor.next_event(), Some(InputEvent::DragOver { slot: 1 }));
        assert_eq!(cursor.next_event(), Some(InputEvent::DragLeave));
        assert_eq!(cursor.next_event(), None);
    }

    #[test]
    fn test_late_subscriber_misses_earlier_events() {
        let mut hub = EventHub::new();
        hub.publish(InputEvent::Undo);
        let id = hub.subscribe();
        assert_eq!(hub.poll(id), None);
    }
}
