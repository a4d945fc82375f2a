pub mod migrations;
pub mod queries;

use std::sync::{Mutex, MutexGuard};

use anyhow::Context;
use chrono::{SubsecRound, Utc};
use rusqlite::Connection;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{parse_status, Booking, BookingStats, BookingStatus, NewBooking};

pub fn init_db(path: &str) -> anyhow::Result<Connection> {
    let conn = Connection::open(path).context("failed to open database")?;

    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")
        .context("failed to set database pragmas")?;

    migrations::run_migrations(&conn)?;

    Ok(conn)
}

/// Durable booking collection.
///
/// Every operation runs under the connection lock for its whole
/// read-modify-write, so operations on the same record never interleave.
pub struct BookingStore {
    conn: Mutex<Connection>,
}

impl BookingStore {
    pub fn open(path: &str) -> anyhow::Result<Self> {
        Ok(Self::new(init_db(path)?))
    }

    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, AppError> {
        self.conn
            .lock()
            .map_err(|_| AppError::StoreUnavailable("database lock poisoned".to_string()))
    }

    /// Validates, normalizes and persists a submission.
    pub fn insert(&self, candidate: &NewBooking) -> Result<Booking, AppError> {
        let valid = candidate.validate()?;

        let db = self.conn()?;

        let now = Utc::now().trunc_subsecs(3);
        let created_at = match queries::latest_created_at(&db)? {
            Some(latest) if latest > now => latest,
            _ => now,
        };

        let booking = Booking {
            id: Uuid::new_v4().to_string(),
            name: valid.name,
            email: valid.email,
            phone: valid.phone,
            service: valid.service,
            date: valid.date,
            time: valid.time,
            notes: valid.notes,
            status: valid.status,
            created_at,
        };
        queries::insert_booking(&db, &booking)?;

        Ok(booking)
    }

    /// All bookings, newest first, optionally restricted to one status.
    pub fn list_all(&self, status_filter: Option<BookingStatus>) -> Result<Vec<Booking>, AppError> {
        let db = self.conn()?;
        Ok(queries::list_bookings(&db, status_filter)?)
    }

    #[cfg(test)]
    pub fn get_by_id(&self, id: &str) -> Result<Booking, AppError> {
        let db = self.conn()?;
        queries::get_booking_by_id(&db, id)?.ok_or_else(|| AppError::NotFound(id.to_string()))
    }

    pub fn delete_by_id(&self, id: &str) -> Result<Booking, AppError> {
        let db = self.conn()?;
        queries::delete_booking(&db, id)?.ok_or_else(|| AppError::NotFound(id.to_string()))
    }

    /// Rewrites only `status`. Any enumerated value may replace any other.
    pub fn update_status(&self, id: &str, new_status: Option<&str>) -> Result<Booking, AppError> {
        let status = parse_status(new_status)?;

        let db = self.conn()?;
        queries::update_booking_status(&db, id, status)?
            .ok_or_else(|| AppError::NotFound(id.to_string()))
    }

    pub fn stats(&self) -> Result<BookingStats, AppError> {
        let db = self.conn()?;
        Ok(queries::get_booking_stats(&db)?)
    }

    pub fn close(self) -> anyhow::Result<()> {
        let conn = self
            .conn
            .into_inner()
            .map_err(|_| anyhow::anyhow!("database lock poisoned"))?;
        conn.close()
            .map_err(|(_, e)| e)
            .context("failed to close database")
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    fn store() -> BookingStore {
        BookingStore::open(":memory:").unwrap()
    }

    fn jane() -> NewBooking {
        NewBooking {
            name: Some("Jane Doe".to_string()),
            email: Some("JANE@X.COM".to_string()),
            phone: Some("555-0100".to_string()),
            service: Some("Consultation".to_string()),
            date: Some("2025-06-01".to_string()),
            time: Some("10:00".to_string()),
            notes: Some(String::new()),
            status: None,
        }
    }

    fn named(name: &str) -> NewBooking {
        NewBooking {
            name: Some(name.to_string()),
            ..jane()
        }
    }

    #[test]
    fn test_insert_then_list() {
        let store = store();
        let mut payload = jane();
        payload.name = Some("  Jane Doe  ".to_string());

        let booking = store.insert(&payload).unwrap();
        assert_eq!(booking.name, "Jane Doe");
        assert_eq!(booking.email, "jane@x.com");
        assert_eq!(booking.status, BookingStatus::Pending);
        assert!(Uuid::parse_str(&booking.id).is_ok());

        let all = store.list_all(None).unwrap();
        assert_eq!(all, vec![booking]);
    }

    #[test]
    fn test_invalid_insert_persists_nothing() {
        let store = store();
        let mut payload = jane();
        payload.time = None;

        let err = store.insert(&payload).unwrap_err();
        assert!(matches!(err, AppError::Validation(ref v) if v.fields() == vec!["time"]));
        assert!(store.list_all(None).unwrap().is_empty());
    }

    #[test]
    fn test_list_is_newest_first() {
        let store = store();
        let first = store.insert(&named("First")).unwrap();
        let second = store.insert(&named("Second")).unwrap();
        let third = store.insert(&named("Third")).unwrap();

        let names: Vec<_> = store
            .list_all(None)
            .unwrap()
            .into_iter()
            .map(|b| b.name)
            .collect();
        assert_eq!(names, vec!["Third", "Second", "First"]);
        assert!(first.created_at <= second.created_at);
        assert!(second.created_at <= third.created_at);
    }

    #[test]
    fn test_created_at_never_goes_backwards() {
        let store = store();
        let future = Utc::now().trunc_subsecs(3) + chrono::Duration::hours(1);
        {
            let db = store.conn().unwrap();
            let mut booking = seeded_booking();
            booking.created_at = future;
            queries::insert_booking(&db, &booking).unwrap();
        }

        let next = store.insert(&jane()).unwrap();
        assert_eq!(next.created_at, future);
        assert_eq!(store.list_all(None).unwrap()[0].id, next.id);
    }

    fn seeded_booking() -> Booking {
        Booking {
            id: "seeded".to_string(),
            name: "Seed".to_string(),
            email: "seed@x.com".to_string(),
            phone: "555-0199".to_string(),
            service: "Consultation".to_string(),
            date: "2025-06-02".to_string(),
            time: "11:00".to_string(),
            notes: String::new(),
            status: BookingStatus::Pending,
            created_at: Utc::now().trunc_subsecs(3),
        }
    }

    #[test]
    fn test_list_filters_by_status() {
        let store = store();
        let a = store.insert(&named("A")).unwrap();
        store.insert(&named("B")).unwrap();
        store.update_status(&a.id, Some("cancelled")).unwrap();

        let cancelled = store.list_all(Some(BookingStatus::Cancelled)).unwrap();
        assert_eq!(cancelled.len(), 1);
        assert_eq!(cancelled[0].id, a.id);
        assert_eq!(store.list_all(Some(BookingStatus::Pending)).unwrap().len(), 1);
        assert!(store
            .list_all(Some(BookingStatus::Completed))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_update_status_changes_only_status() {
        let store = store();
        let before = store.insert(&jane()).unwrap();

        let after = store.update_status(&before.id, Some("completed")).unwrap();
        assert_eq!(after.status, BookingStatus::Completed);
        assert_eq!(
            Booking {
                status: BookingStatus::Pending,
                ..after.clone()
            },
            before
        );
        assert_eq!(store.get_by_id(&before.id).unwrap(), after);
    }

    #[test]
    fn test_update_status_is_permissive() {
        let store = store();
        let booking = store.insert(&jane()).unwrap();

        store.update_status(&booking.id, Some("cancelled")).unwrap();
        let reopened = store.update_status(&booking.id, Some("pending")).unwrap();
        assert_eq!(reopened.status, BookingStatus::Pending);
    }

    #[test]
    fn test_update_status_rejects_unknown_value() {
        let store = store();
        let booking = store.insert(&jane()).unwrap();

        let err = store
            .update_status(&booking.id, Some("not-a-real-status"))
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let err = store.update_status(&booking.id, None).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        assert_eq!(store.get_by_id(&booking.id).unwrap(), booking);
    }

    #[test]
    fn test_update_status_missing_record() {
        let store = store();
        let err = store.update_status("nope", Some("completed")).unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn test_delete_returns_removed_record() {
        let store = store();
        let booking = store.insert(&jane()).unwrap();

        assert_eq!(store.delete_by_id(&booking.id).unwrap(), booking);
        assert!(store.list_all(None).unwrap().is_empty());
        assert!(matches!(
            store.get_by_id(&booking.id),
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn test_delete_missing_leaves_store_untouched() {
        let store = store();
        let kept = store.insert(&jane()).unwrap();

        let err = store.delete_by_id("does-not-exist").unwrap_err();
        assert!(matches!(err, AppError::NotFound(ref id) if id == "does-not-exist"));
        assert_eq!(store.list_all(None).unwrap(), vec![kept]);
    }

    #[test]
    fn test_double_booking_is_allowed() {
        let store = store();
        store.insert(&jane()).unwrap();
        store.insert(&jane()).unwrap();
        assert_eq!(store.list_all(None).unwrap().len(), 2);
    }

    #[test]
    fn test_stats() {
        let store = store();
        let a = store.insert(&named("A")).unwrap();
        let b = store.insert(&named("B")).unwrap();
        store.insert(&named("C")).unwrap();
        store.update_status(&a.id, Some("completed")).unwrap();
        store.update_status(&b.id, Some("cancelled")).unwrap();

        assert_eq!(
            store.stats().unwrap(),
            BookingStats {
                total: 3,
                pending: 1,
                completed: 1,
                cancelled: 1,
            }
        );
    }

    #[test]
    fn test_concurrent_delete_and_update() {
        let store = Arc::new(store());
        let booking = store.insert(&jane()).unwrap();

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                let id = booking.id.clone();
                std::thread::spawn(move || {
                    if i % 2 == 0 {
                        store.delete_by_id(&id).map(|_| "deleted")
                    } else {
                        store.update_status(&id, Some("completed")).map(|_| "updated")
                    }
                })
            })
            .collect();

        let mut deleted = 0;
        for handle in handles {
            match handle.join().unwrap() {
                Ok("deleted") => deleted += 1,
                Ok(_) => {}
                Err(AppError::NotFound(_)) => {}
                Err(e) => panic!("unexpected error: {e}"),
            }
        }

        assert_eq!(deleted, 1);
        assert!(store.list_all(None).unwrap().is_empty());
    }

    #[test]
    fn test_close() {
        let store = store();
        store.insert(&jane()).unwrap();
        store.close().unwrap();
    }
}
