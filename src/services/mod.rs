//! Service layer: the profile store and the adapters around it.
//!
//! Persistence and seed loading feed the store; geocoding feeds the admin
//! form; the map view reads from the store.

pub mod debounce;
pub mod geocoding;
pub mod map_view;
pub mod persistence;
pub mod profile_store;
pub mod seed;

pub use debounce::DebounceSessions;
pub use geocoding::GeocodingClient;
pub use map_view::MapView;
pub use persistence::{JsonFileSlot, ProfileSlot};
pub use profile_store::ProfileStore;
pub use seed::SeedSource;
