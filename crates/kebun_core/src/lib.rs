pub mod buckets;
pub mod cache;
pub mod clock;
pub mod model;
pub mod recurrence;
pub mod service;
pub mod store;
pub mod summary;
pub mod todo;

pub use crate::buckets::{group_by_date, TodoBucket, TodoBuckets};
pub use crate::clock::{Clock, FixedClock, SystemClock};
pub use crate::recurrence::{RecurrenceOutcome, RecurrenceScheduler};
pub use crate::service::{KebunService, KebunServiceBuilder, TodoBoard, TodoCompletion};
pub use crate::store::{InMemoryStore, KebunStore, Snapshot, StoreError, StoreResult};
pub use crate::todo::{TodoAggregator, TodoItem, TodoKind};
