use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension};

use crate::models::{Booking, BookingStats, BookingStatus, FieldError, ValidationError};

const BOOKING_COLUMNS: &str =
    "id, name, email, phone, service, date, time, notes, status, created_at";

/// Fixed-width UTC timestamps sort lexicographically in creation order.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

// ── Bookings ──

pub fn insert_booking(conn: &Connection, booking: &Booking) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO bookings (id, name, email, phone, service, date, time, notes, status, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            booking.id,
            booking.name,
            booking.email,
            booking.phone,
            booking.service,
            booking.date,
            booking.time,
            booking.notes,
            booking.status.as_str(),
            format_timestamp(&booking.created_at),
        ],
    )?;
    Ok(())
}

pub fn latest_created_at(conn: &Connection) -> rusqlite::Result<Option<DateTime<Utc>>> {
    conn.query_row(
        "SELECT created_at FROM bookings ORDER BY created_at DESC LIMIT 1",
        [],
        |row| parse_timestamp(row, 0),
    )
    .optional()
}

/// Newest first; ties on `created_at` fall back to insertion order.
pub fn list_bookings(
    conn: &Connection,
    status_filter: Option<BookingStatus>,
) -> rusqlite::Result<Vec<Booking>> {
    let rows = match status_filter {
        Some(status) => {
            let mut stmt = conn.prepare(&format!(
                "SELECT {BOOKING_COLUMNS} FROM bookings WHERE status = ?1
                 ORDER BY created_at DESC, rowid DESC"
            ))?;
            let rows = stmt.query_map(params![status.as_str()], parse_booking_row)?;
            rows.collect::<rusqlite::Result<Vec<_>>>()?
        }
        None => {
            let mut stmt = conn.prepare(&format!(
                "SELECT {BOOKING_COLUMNS} FROM bookings ORDER BY created_at DESC, rowid DESC"
            ))?;
            let rows = stmt.query_map([], parse_booking_row)?;
            rows.collect::<rusqlite::Result<Vec<_>>>()?
        }
    };
    Ok(rows)
}

#[cfg(test)]
pub fn get_booking_by_id(conn: &Connection, id: &str) -> rusqlite::Result<Option<Booking>> {
    conn.query_row(
        &format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = ?1"),
        params![id],
        parse_booking_row,
    )
    .optional()
}

pub fn delete_booking(conn: &Connection, id: &str) -> rusqlite::Result<Option<Booking>> {
    conn.query_row(
        &format!("DELETE FROM bookings WHERE id = ?1 RETURNING {BOOKING_COLUMNS}"),
        params![id],
        parse_booking_row,
    )
    .optional()
}

pub fn update_booking_status(
    conn: &Connection,
    id: &str,
    status: BookingStatus,
) -> rusqlite::Result<Option<Booking>> {
    conn.query_row(
        &format!("UPDATE bookings SET status = ?1 WHERE id = ?2 RETURNING {BOOKING_COLUMNS}"),
        params![status.as_str(), id],
        parse_booking_row,
    )
    .optional()
}

pub fn get_booking_stats(conn: &Connection) -> rusqlite::Result<BookingStats> {
    let mut stmt = conn.prepare("SELECT status, COUNT(*) FROM bookings GROUP BY status")?;
    let rows = stmt.query_map([], |row| {
        let status: String = row.get(0)?;
        let count: i64 = row.get(1)?;
        Ok((status, count))
    })?;

    let mut stats = BookingStats::default();
    for row in rows {
        let (status, count) = row?;
        match BookingStatus::parse(&status) {
            Some(BookingStatus::Pending) => stats.pending = count,
            Some(BookingStatus::Completed) => stats.completed = count,
            Some(BookingStatus::Cancelled) => stats.cancelled = count,
            None => tracing::warn!(status = %status, "ignoring unknown booking status"),
        }
        stats.total += count;
    }
    Ok(stats)
}

fn parse_timestamp(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn parse_booking_row(row: &rusqlite::Row) -> rusqlite::Result<Booking> {
    let status_str: String = row.get(8)?;
    let status = status_str.parse::<BookingStatus>().map_err(|e: FieldError| {
        let err = ValidationError::from(e);
        rusqlite::Error::FromSqlConversionFailure(8, Type::Text, Box::new(err))
    })?;

    Ok(Booking {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        phone: row.get(3)?,
        service: row.get(4)?,
        date: row.get(5)?,
        time: row.get(6)?,
        notes: row.get(7)?,
        status,
        created_at: parse_timestamp(row, 9)?,
    })
}
