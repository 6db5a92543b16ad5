use std::sync::Arc;
use std::time::Duration;

use anyhow::{Result, anyhow};
use moka::future::Cache;

use crate::assistant::store::AttendanceStore;
use crate::model::student::Student;

/// Process-wide copy of the `students` table used for name matching.
///
/// Entries expire after the configured TTL and can be dropped on demand
/// with [`RosterCache::invalidate`]. Concurrent misses share one load.
#[derive(Clone)]
pub struct RosterCache {
    cache: Cache<(), Arc<Vec<Student>>>,
}

impl RosterCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            cache: Cache::builder().max_capacity(1).time_to_live(ttl).build(),
        }
    }

    /// Cached roster, loading it from `store` on a miss.
    pub async fn get_or_load(&self, store: &dyn AttendanceStore) -> Result<Arc<Vec<Student>>> {
        self.cache
            .try_get_with((), async { store.roster().await.map(Arc::new) })
            .await
            .map_err(|e| anyhow!("Failed to load student roster: {}", e))
    }

    pub async fn invalidate(&self) {
        self.cache.invalidate(&()).await;
    }

    /// Load the roster ahead of the first question.
    pub async fn warmup(&self, store: &dyn AttendanceStore) -> Result<()> {
        let roster = self.get_or_load(store).await?;

        tracing::info!("Roster cache warmup complete: {} students", roster.len());
        Ok(())
    }
}

/// First roster entry whose name appears anywhere in the question,
/// ignoring case.
///
/// Plain substring matching: a short name contained in a longer one
/// ("ANN" in "JOANNA") can match the wrong student.
pub fn find_student<'a>(roster: &'a [Student], question: &str) -> Option<&'a Student> {
    let question = question.to_uppercase();

    roster.iter().find(|s| {
        let name = s.student_name.trim().to_uppercase();
        !name.is_empty() && question.contains(&name)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assistant::test_utils::FakeStore;

    fn roster() -> Vec<Student> {
        vec![
            Student::new("101", "ELON MUSK"),
            Student::new("102", "Bill Gates"),
            Student::new("103", "ADA"),
        ]
    }

    #[test]
    fn matches_names_regardless_of_case() {
        let roster = roster();

        let hit = find_student(&roster, "Was elon musk present today?").unwrap();
        assert_eq!(hit.roll_no, "101");

        let hit = find_student(&roster, "What is BILL GATES' roll number?").unwrap();
        assert_eq!(hit.roll_no, "102");
    }

    #[test]
    fn no_name_in_question() {
        assert!(find_student(&roster(), "who was late yesterday?").is_none());
        assert!(find_student(&[], "Was Elon Musk here?").is_none());
    }

    #[test]
    fn first_roster_entry_wins_on_overlap() {
        let roster = vec![Student::new("1", "ANN"), Student::new("2", "JOANNA")];
        let hit = find_student(&roster, "is joanna here").unwrap();
        assert_eq!(hit.roll_no, "1");
    }

    #[tokio::test]
    async fn loads_once_until_invalidated() {
        let store = FakeStore::new(roster(), vec![]);
        let cache = RosterCache::new(Duration::from_secs(60));

        let first = cache.get_or_load(&store).await.unwrap();
        let second = cache.get_or_load(&store).await.unwrap();
        assert_eq!(first.len(), 3);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(store.roster_loads(), 1);

        cache.invalidate().await;
        cache.get_or_load(&store).await.unwrap();
        assert_eq!(store.roster_loads(), 2);
    }

    #[tokio::test]
    async fn load_failure_is_not_cached() {
        let store = FakeStore::new(roster(), vec![]);
        let cache = RosterCache::new(Duration::from_secs(60));

        store.fail_queries(true);
        assert!(cache.get_or_load(&store).await.is_err());

        store.fail_queries(false);
        assert_eq!(cache.get_or_load(&store).await.unwrap().len(), 3);
    }
}
