use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::todo::TodoItem;

/// Day-granularity position of a todo relative to today, most urgent first.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "camelCase")]
pub enum TodoBucket {
    Overdue,
    Today,
    Tomorrow,
    ThisWeek,
    Later,
}

impl TodoBucket {
    pub const ALL: [TodoBucket; 5] = [
        TodoBucket::Overdue,
        TodoBucket::Today,
        TodoBucket::Tomorrow,
        TodoBucket::ThisWeek,
        TodoBucket::Later,
    ];

    /// The week boundary `today + 7` is inclusive. Anything in the past is
    /// overdue no matter how old.
    pub fn classify(date: NaiveDate, today: NaiveDate) -> Self {
        let tomorrow = today + Duration::days(1);
        let end_of_week = today + Duration::days(7);
        if date < today {
            Self::Overdue
        } else if date == today {
            Self::Today
        } else if date == tomorrow {
            Self::Tomorrow
        } else if date <= end_of_week {
            Self::ThisWeek
        } else {
            Self::Later
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Overdue => "Terlambat",
            Self::Today => "Hari Ini",
            Self::Tomorrow => "Besok",
            Self::ThisWeek => "Minggu Ini",
            Self::Later => "Nanti",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TodoBuckets {
    pub overdue: Vec<TodoItem>,
    pub today: Vec<TodoItem>,
    pub tomorrow: Vec<TodoItem>,
    pub this_week: Vec<TodoItem>,
    pub later: Vec<TodoItem>,
}

impl TodoBuckets {
    pub fn get(&self, bucket: TodoBucket) -> &[TodoItem] {
        match bucket {
            TodoBucket::Overdue => &self.overdue,
            TodoBucket::Today => &self.today,
            TodoBucket::Tomorrow => &self.tomorrow,
            TodoBucket::ThisWeek => &self.this_week,
            TodoBucket::Later => &self.later,
        }
    }

    fn get_mut(&mut self, bucket: TodoBucket) -> &mut Vec<TodoItem> {
        match bucket {
            TodoBucket::Overdue => &mut self.overdue,
            TodoBucket::Today => &mut self.today,
            TodoBucket::Tomorrow => &mut self.tomorrow,
            TodoBucket::ThisWeek => &mut self.this_week,
            TodoBucket::Later => &mut self.later,
        }
    }

    /// Buckets in priority order, paired with their items.
    pub fn iter(&self) -> impl Iterator<Item = (TodoBucket, &[TodoItem])> + '_ {
        TodoBucket::ALL
            .into_iter()
            .map(move |bucket| (bucket, self.get(bucket)))
    }

    pub fn len(&self) -> usize {
        self.iter().map(|(_, items)| items.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Keeps the `limit` most urgent items. Earlier buckets are filled
    /// completely before a later bucket receives anything.
    pub fn truncated(mut self, limit: usize) -> Self {
        let mut remaining = limit;
        for bucket in TodoBucket::ALL {
            let items = self.get_mut(bucket);
            items.truncate(remaining);
            remaining -= items.len();
        }
        self
    }
}

/// Partitions todos, already sorted by date, into buckets relative to `today`.
pub fn group_by_date(items: Vec<TodoItem>, today: NaiveDate) -> TodoBuckets {
    let mut grouped = TodoBuckets::default();
    for item in items {
        let bucket = TodoBucket::classify(item.tanggal.date(), today);
        grouped.get_mut(bucket).push(item);
    }
    grouped
}
