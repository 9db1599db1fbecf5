//! Store change events.
//!
//! Every successful store mutation publishes one [`StoreEvent`] on a
//! broadcast channel. Read models subscribe instead of polling flags.

use chrono::NaiveDate;
use serde::Serialize;
use tokio::sync::broadcast;

pub type EventTx = broadcast::Sender<StoreEvent>;
pub type EventRx = broadcast::Receiver<StoreEvent>;

const CAPACITY: usize = 64;

pub fn event_bus() -> (EventTx, EventRx) {
    broadcast::channel(CAPACITY)
}

/// A change applied to the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum StoreEvent {
    CategoryAdded {
        name: String,
    },
    CategoryUpdated {
        old_name: String,
        name: String,
    },
    CategoryDeleted {
        name: String,
        removed_tasks: usize,
    },
    TaskAdded {
        task_id: String,
        category: String,
    },
    TaskUpdated {
        task_id: String,
    },
    TaskDeleted {
        task_id: String,
    },
    TaskToggled {
        task_id: String,
        completed: bool,
    },
    CompletedCleared {
        removed_tasks: usize,
    },
    DayRolledOver {
        closed: NaiveDate,
        date: NaiveDate,
        tasks_completed: u32,
    },
    SortOptionChanged {
        category: String,
    },
    /// The whole store was wiped.
    Cleared,
}
