//! Map view: what to draw, not how.
//!
//! A scene is either one focused profile at street zoom or every filtered
//! profile at world zoom. The rendering surface is keyed: whenever the
//! selection changes (or `reset` is called) the key moves on, telling the
//! renderer to rebuild its map so it actually re-centres. `ready` tracks
//! whether the renderer has painted the current key yet.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::domain::profiles::Profile;
use crate::services::profile_store::StoreView;

pub const DEFAULT_CENTER: LatLng = LatLng {
    latitude: 40.7128,
    longitude: -74.0060,
};
pub const FOCUSED_ZOOM: u8 = 13;
pub const OVERVIEW_ZOOM: u8 = 3;
/// Deepest zoom the tile layers serve.
pub const MAX_ZOOM: u8 = 22;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub latitude: f64,
    pub longitude: f64,
}

impl From<&Profile> for LatLng {
    fn from(p: &Profile) -> Self {
        Self {
            latitude: p.latitude,
            longitude: p.longitude,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MapTheme {
    #[default]
    Light,
    Dark,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TileLayer {
    pub url: &'static str,
    pub attribution: &'static str,
}

impl MapTheme {
    pub fn tiles(self) -> TileLayer {
        match self {
            Self::Light => TileLayer {
                url: "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png",
                attribution: "&copy; <a href=\"https://www.openstreetmap.org/copyright\">OpenStreetMap</a> contributors",
            },
            Self::Dark => TileLayer {
                url: "https://{s}.basemaps.cartocdn.com/dark_all/{z}/{x}/{y}{r}.png",
                attribution: "&copy; <a href=\"https://www.openstreetmap.org/copyright\">OpenStreetMap</a> contributors &copy; <a href=\"https://carto.com/attributions\">CARTO</a>",
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MapMode {
    Focused,
    Overview,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkerColor {
    Blue,
    Red,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Marker {
    pub profile_id: String,
    pub position: LatLng,
    pub color: MarkerColor,
    pub popup: Popup,
}

#[derive(Debug, Clone, Serialize)]
pub struct Popup {
    pub name: String,
    pub address: String,
    pub image: String,
}

impl Marker {
    fn for_profile(profile: &Profile, color: MarkerColor) -> Self {
        Self {
            profile_id: profile.id.clone(),
            position: LatLng::from(profile),
            color,
            popup: Popup {
                name: profile.name.clone(),
                address: profile.address.clone(),
                image: profile.image.clone(),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Legend {
    pub title: &'static str,
    pub summary: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MapScene {
    pub key: u64,
    pub ready: bool,
    pub mode: MapMode,
    pub center: LatLng,
    pub zoom: u8,
    pub markers: Vec<Marker>,
    pub tiles: TileLayer,
    pub legend: Legend,
}

#[derive(Debug, Default)]
struct SurfaceState {
    key: u64,
    ready: bool,
    focused_id: Option<String>,
    viewport: Option<(LatLng, u8)>,
}

impl SurfaceState {
    fn rekey(&mut self) -> u64 {
        self.key += 1;
        self.ready = false;
        self.key
    }
}

#[derive(Debug, Default)]
pub struct MapView {
    surface: Mutex<SurfaceState>,
}

impl MapView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Note the current selection; re-keys the surface when it changed.
    /// Returns true when a re-key happened.
    pub fn sync_selection(&self, selected_id: Option<&str>) -> bool {
        let mut surface = self.surface.lock();
        if surface.focused_id.as_deref() == selected_id {
            return false;
        }
        surface.focused_id = selected_id.map(str::to_string);
        surface.viewport = None;
        let key = surface.rekey();
        tracing::debug!(key, focused = ?selected_id, "Map surface re-keyed");
        true
    }

    /// Re-centre explicitly. Holds until the selection next changes.
    pub fn reset(&self, center: LatLng, zoom: u8) -> u64 {
        let mut surface = self.surface.lock();
        surface.viewport = Some((center, zoom));
        surface.rekey()
    }

    /// The renderer finished its first paint of `key`. Stale keys are ignored.
    pub fn mark_ready(&self, key: u64) -> bool {
        let mut surface = self.surface.lock();
        if surface.key != key {
            return false;
        }
        surface.ready = true;
        true
    }

    pub fn key(&self) -> u64 {
        self.surface.lock().key
    }

    pub fn is_ready(&self) -> bool {
        self.surface.lock().ready
    }

    pub fn render(&self, view: &StoreView, theme: MapTheme) -> MapScene {
        self.sync_selection(view.selected.as_ref().map(|p| p.id.as_str()));
        let surface = self.surface.lock();

        let (mode, center, zoom, markers) = match &view.selected {
            Some(profile) => (
                MapMode::Focused,
                LatLng::from(profile),
                FOCUSED_ZOOM,
                vec![Marker::for_profile(profile, MarkerColor::Red)],
            ),
            None => (
                MapMode::Overview,
                DEFAULT_CENTER,
                OVERVIEW_ZOOM,
                view.profiles
                    .iter()
                    .map(|p| Marker::for_profile(p, MarkerColor::Blue))
                    .collect(),
            ),
        };
        let (center, zoom) = surface.viewport.unwrap_or((center, zoom));

        let count = view.profiles.len();
        let legend = Legend {
            title: match mode {
                MapMode::Focused => "Selected Profile",
                MapMode::Overview => "All Profiles",
            },
            summary: format!(
                "{count} {} on map",
                if count == 1 { "profile" } else { "profiles" }
            ),
        };

        MapScene {
            key: surface.key,
            ready: surface.ready,
            mode,
            center,
            zoom,
            markers,
            tiles: theme.tiles(),
            legend,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::profiles::fixtures::profile;

    fn overview(profiles: Vec<Profile>) -> StoreView {
        StoreView {
            selected: None,
            profiles,
        }
    }

    #[test]
    fn overview_shows_every_filtered_profile_wide() {
        let map = MapView::new();
        let scene = map.render(
            &overview(vec![
                profile("1", "Ann", "a", "x"),
                profile("2", "Ben", "b", "y"),
            ]),
            MapTheme::Light,
        );

        assert_eq!(scene.mode, MapMode::Overview);
        assert_eq!(scene.center, DEFAULT_CENTER);
        assert_eq!(scene.zoom, OVERVIEW_ZOOM);
        assert_eq!(scene.markers.len(), 2);
        assert!(scene.markers.iter().all(|m| m.color == MarkerColor::Blue));
        assert_eq!(scene.legend.title, "All Profiles");
        assert_eq!(scene.legend.summary, "2 profiles on map");
    }

    #[test]
    fn selection_focuses_close_on_one_marker() {
        let map = MapView::new();
        let mut selected = profile("2", "Ben", "b", "y");
        selected.latitude = 51.5;
        selected.longitude = -0.12;

        let scene = map.render(
            &StoreView {
                selected: Some(selected.clone()),
                profiles: vec![profile("1", "Ann", "a", "x"), selected],
            },
            MapTheme::Dark,
        );

        assert_eq!(scene.mode, MapMode::Focused);
        assert_eq!(scene.zoom, FOCUSED_ZOOM);
        assert_eq!(scene.center, LatLng { latitude: 51.5, longitude: -0.12 });
        assert_eq!(scene.markers.len(), 1);
        assert_eq!(scene.markers[0].color, MarkerColor::Red);
        assert_eq!(scene.legend.title, "Selected Profile");
        assert!(scene.tiles.url.contains("dark_all"));
    }

    #[test]
    fn selection_change_rekeys_and_resets_ready() {
        let map = MapView::new();
        let ann = profile("1", "Ann", "a", "x");

        let first = map.render(&overview(vec![ann.clone()]), MapTheme::Light);
        assert!(map.mark_ready(first.key));
        assert!(map.render(&overview(vec![ann.clone()]), MapTheme::Light).ready);

        let focused = map.render(
            &StoreView {
                selected: Some(ann.clone()),
                profiles: vec![ann.clone()],
            },
            MapTheme::Light,
        );
        assert_ne!(focused.key, first.key);
        assert!(!focused.ready);

        // Back to nothing selected: another re-key, wide view again.
        let back = map.render(&overview(vec![ann]), MapTheme::Light);
        assert_ne!(back.key, focused.key);
        assert_eq!(back.mode, MapMode::Overview);
        assert_eq!(back.zoom, OVERVIEW_ZOOM);
    }

    #[test]
    fn stale_ready_signal_is_ignored() {
        let map = MapView::new();
        let old = map.key();
        map.sync_selection(Some("1"));

        assert!(!map.mark_ready(old));
        assert!(!map.is_ready());
    }

    #[test]
    fn reset_overrides_viewport_until_selection_changes() {
        let map = MapView::new();
        let paris = LatLng {
            latitude: 48.8566,
            longitude: 2.3522,
        };
        let key = map.reset(paris, 9);

        let scene = map.render(&overview(Vec::new()), MapTheme::Light);
        assert_eq!(scene.key, key);
        assert_eq!(scene.center, paris);
        assert_eq!(scene.zoom, 9);
        assert_eq!(scene.legend.summary, "0 profiles on map");

        map.sync_selection(Some("1"));
        map.sync_selection(None);
        let scene = map.render(&overview(Vec::new()), MapTheme::Light);
        assert_eq!(scene.center, DEFAULT_CENTER);
    }

    #[test]
    fn single_profile_legend_is_singular() {
        let map = MapView::new();
        let scene = map.render(&overview(vec![profile("1", "Ann", "a", "x")]), MapTheme::Light);
        assert_eq!(scene.legend.summary, "1 profile on map");
    }
}
