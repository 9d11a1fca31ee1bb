//! Admin form: staging area for one profile being created or edited.
//!
//! Nothing here is persisted until [`ProfileForm::submit`] hands the
//! validated record to the store.

use crate::domain::profiles::{validate_coordinates, Profile, ProfileDraft};
use crate::error::ProfileError;
use crate::services::geocoding::Suggestion;
use crate::services::profile_store::{Committed, ProfileStore};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit { id: String },
}

#[derive(Debug, Clone)]
pub struct ProfileForm {
    mode: FormMode,
    draft: ProfileDraft,
}

impl ProfileForm {
    pub fn create() -> Self {
        Self {
            mode: FormMode::Create,
            draft: ProfileDraft::default(),
        }
    }

    pub fn edit(profile: &Profile) -> Self {
        Self {
            mode: FormMode::Edit {
                id: profile.id.clone(),
            },
            draft: ProfileDraft::from(profile.clone()),
        }
    }

    /// Build a form from a submitted draft, in the given mode. Skills go
    /// through [`ProfileForm::add_skill`] so blank entries are dropped.
    pub fn from_input(mode: FormMode, mut draft: ProfileDraft) -> Self {
        let skills = std::mem::take(&mut draft.skills);

        let mut form = Self { mode, draft };
        for skill in &skills {
            form.add_skill(skill);
        }
        form
    }

    pub fn mode(&self) -> &FormMode {
        &self.mode
    }

    pub fn draft(&self) -> &ProfileDraft {
        &self.draft
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.draft.name = name.into();
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.draft.description = description.into();
    }

    pub fn set_image(&mut self, image: impl Into<String>) {
        self.draft.image = image.into();
    }

    pub fn set_email(&mut self, email: Option<String>) {
        self.draft.email = email;
    }

    pub fn set_phone(&mut self, phone: Option<String>) {
        self.draft.phone = phone;
    }

    /// Typed address text. Coordinates are left alone; only a picked
    /// suggestion sets them.
    pub fn set_address(&mut self, address: impl Into<String>) {
        self.draft.address = address.into();
    }

    /// Take the label and coordinates of a geocoding suggestion together.
    pub fn apply_suggestion(&mut self, suggestion: &Suggestion) {
        self.draft.address = suggestion.label.clone();
        self.set_coordinates(suggestion.latitude, suggestion.longitude);
    }

    pub fn set_coordinates(&mut self, latitude: f64, longitude: f64) {
        self.draft.latitude = Some(latitude);
        self.draft.longitude = Some(longitude);
    }

    /// Append a trimmed skill. Blank input is ignored; duplicates are kept.
    pub fn add_skill(&mut self, input: &str) -> bool {
        let skill = input.trim();
        if skill.is_empty() {
            return false;
        }
        self.draft.skills.push(skill.to_string());
        true
    }

    /// Remove every skill equal to `skill`.
    pub fn remove_skill(&mut self, skill: &str) {
        self.draft.skills.retain(|s| s != skill);
    }

    pub fn skills(&self) -> &[String] {
        &self.draft.skills
    }

    /// "lat, lng" to six decimals once both coordinates are set.
    pub fn coordinates_label(&self) -> Option<String> {
        match (self.draft.latitude, self.draft.longitude) {
            (Some(lat), Some(lng)) => Some(format!("{lat:.6}, {lng:.6}")),
            _ => None,
        }
    }

    pub fn validate(&self) -> Result<(), ProfileError> {
        validate_coordinates(self.draft.latitude, self.draft.longitude)?;
        if self.draft.image.trim().is_empty() {
            return Err(ProfileError::validation("Image URL is required"));
        }
        // Remaining required fields are checked when the draft becomes a profile.
        self.draft.clone().into_profile(String::new()).map(|_| ())
    }

    /// Validate, then create or replace the profile in `store`. The form is
    /// reset to an empty create form once the store accepts the record.
    pub async fn submit(&mut self, store: &ProfileStore) -> Result<Committed<Profile>, ProfileError> {
        self.validate()?;

        let committed = match &self.mode {
            FormMode::Create => store.add(self.draft.clone()).await?,
            FormMode::Edit { id } => {
                let profile = self.draft.clone().into_profile(id.clone())?;
                store.update(profile).await?
            }
        };

        *self = Self::create();
        Ok(committed)
    }
}
