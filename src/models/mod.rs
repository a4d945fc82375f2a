pub mod booking;
pub mod envelope;

pub use booking::{
    parse_status, Booking, BookingStatus, FieldError, NewBooking, ValidatedBooking,
    ValidationError,
};
pub use envelope::{BookingStats, Envelope};
