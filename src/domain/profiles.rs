//! Profile domain types
//!
//! A profile is a person or entity with a geolocated address. The stored
//! record always carries a full coordinate pair; drafts may not, which is
//! what validation guards against.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ProfileError;

/// Profile entity, the only record that is persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: String,
    pub name: String,
    pub description: String,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub image: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
}

impl Profile {
    /// Check the fields every stored profile must have.
    pub fn validate(&self) -> Result<(), ProfileError> {
        if self.id.trim().is_empty() {
            return Err(ProfileError::validation("Profile id is required"));
        }
        validate_required(&self.name, &self.description, &self.address)?;
        validate_coordinates(Some(self.latitude), Some(self.longitude)).map(|_| ())
    }
}

/// A profile without an id yet: what the admin form produces and what
/// seed records look like before they are accepted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileDraft {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
}

impl ProfileDraft {
    /// Validate and attach an id. Nothing is returned unless the record is
    /// fully geolocated.
    pub fn into_profile(self, id: String) -> Result<Profile, ProfileError> {
        validate_required(&self.name, &self.description, &self.address)?;
        let (latitude, longitude) = validate_coordinates(self.latitude, self.longitude)?;

        Ok(Profile {
            id,
            name: self.name,
            description: self.description,
            address: self.address,
            latitude,
            longitude,
            image: self.image,
            email: non_blank(self.email),
            phone: non_blank(self.phone),
            skills: self.skills,
        })
    }
}

impl From<Profile> for ProfileDraft {
    fn from(p: Profile) -> Self {
        Self {
            name: p.name,
            description: p.description,
            address: p.address,
            latitude: Some(p.latitude),
            longitude: Some(p.longitude),
            image: p.image,
            email: p.email,
            phone: p.phone,
            skills: p.skills,
        }
    }
}

/// Fresh opaque identifier for a new profile.
pub fn new_profile_id() -> String {
    Uuid::new_v4().to_string()
}

pub const MISSING_COORDINATES: &str = "Please select a valid address with coordinates";

fn validate_required(name: &str, description: &str, address: &str) -> Result<(), ProfileError> {
    for (value, field) in [(name, "Name"), (description, "Description"), (address, "Address")] {
        if value.trim().is_empty() {
            return Err(ProfileError::validation(format!("{field} is required")));
        }
    }
    Ok(())
}

/// Both coordinates must be present, finite and within range.
pub fn validate_coordinates(
    latitude: Option<f64>,
    longitude: Option<f64>,
) -> Result<(f64, f64), ProfileError> {
    match (latitude, longitude) {
        (Some(lat), Some(lng)) if lat.is_finite() && lng.is_finite() => {
            if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
                return Err(ProfileError::validation("Coordinates are out of range"));
            }
            Ok((lat, lng))
        }
        _ => Err(ProfileError::validation(MISSING_COORDINATES)),
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

/// Search and location terms for the derived list view.
///
/// Deserializes from `?search=..&location=..` query strings as well as the
/// camelCase names the store uses.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileFilter {
    #[serde(default, alias = "search", alias = "searchTerm")]
    pub search_term: String,
    #[serde(default, alias = "location", alias = "filterLocation")]
    pub filter_location: String,
}

impl ProfileFilter {
    pub fn new(search_term: impl Into<String>, filter_location: impl Into<String>) -> Self {
        Self {
            search_term: search_term.into(),
            filter_location: filter_location.into(),
        }
    }

    pub fn search(term: impl Into<String>) -> Self {
        Self::new(term, "")
    }

    /// True when `profile` passes both predicates. Empty terms match all.
    pub fn matches(&self, profile: &Profile) -> bool {
        Matcher::from(self).matches(profile)
    }

    /// Lazily filter `profiles`, preserving their order.
    pub fn apply<'a, I>(&self, profiles: I) -> impl Iterator<Item = &'a Profile>
    where
        I: IntoIterator<Item = &'a Profile>,
    {
        let matcher = Matcher::from(self);
        profiles.into_iter().filter(move |p| matcher.matches(p))
    }
}

/// Lower-cased terms, computed once per `apply`.
struct Matcher {
    search: String,
    location: String,
}

impl From<&ProfileFilter> for Matcher {
    fn from(filter: &ProfileFilter) -> Self {
        Self {
            search: filter.search_term.to_lowercase(),
            location: filter.filter_location.to_lowercase(),
        }
    }
}

impl Matcher {
    fn matches(&self, profile: &Profile) -> bool {
        let matches_search = self.search.is_empty()
            || profile.name.to_lowercase().contains(&self.search)
            || profile.description.to_lowercase().contains(&self.search);

        let matches_location =
            self.location.is_empty() || profile.address.to_lowercase().contains(&self.location);

        matches_search && matches_location
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn draft(name: &str, description: &str, address: &str) -> ProfileDraft {
        ProfileDraft {
            name: name.to_string(),
            description: description.to_string(),
            address: address.to_string(),
            latitude: Some(10.0),
            longitude: Some(20.0),
            image: "https://example.com/avatar.png".to_string(),
            ..Default::default()
        }
    }

    pub fn profile(id: &str, name: &str, description: &str, address: &str) -> Profile {
        draft(name, description, address)
            .into_profile(id.to_string())
            .expect("fixture is valid")
    }
}
