//! # profile-atlas
//!
//! A directory of people and entities pinned to a map. The profile store
//! holds the collection, writes it through to a JSON file slot, and tracks
//! which profile is selected. Around it sit the seed loader, a debounced
//! geocoding client for address autocompletion, the map view that turns
//! the store into a scene, and the admin form that stages edits.
//!
//! ## API Surface
//!
//! | Path                  | Module                  |
//! |-----------------------|-------------------------|
//! | `/health`             | [`routes::health`]      |
//! | `/profiles/*`         | [`routes::profiles`]    |
//! | `/selection`          | [`routes::selection`]   |
//! | `/map/*`              | [`routes::map`]         |
//! | `/store/status`       | [`routes::store`]       |
//! | `/geocode/suggest`    | [`routes::geocode`]     |

pub mod api;
pub mod app;
pub mod config;
pub mod domain;
pub mod error;
pub mod logging;
pub mod middleware;
pub mod routes;
pub mod services;
