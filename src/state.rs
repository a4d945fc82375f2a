use crate::db::BookingStore;

pub struct AppState {
    pub store: BookingStore,
}

impl AppState {
    pub fn new(store: BookingStore) -> Self {
        Self { store }
    }
}
