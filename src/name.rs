use crate::profile::{ProfileError, ProfileLookup};

pub const DEFAULT_NAME: &str = "Guest";

/// Editable candidate name shown above the test
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameField {
    value: String,
}

impl NameField {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn set(&mut self, value: impl Into<String>) {
        self.value = value.into();
    }

    pub fn push(&mut self, c: char) {
        self.value.push(c);
    }

    pub fn pop(&mut self) {
        self.value.pop();
    }

    /// Replace the field with the name of the profile stored under `id`
    pub fn fill_from_profile<S: ProfileLookup + ?Sized>(
        &mut self,
        store: &S,
        id: &str,
    ) -> Result<(), ProfileError> {
        let id = id.trim();
        if id.is_empty() {
            return Err(ProfileError::EmptyId);
        }
        let profile = store
            .get_by_id(id)
            .ok_or_else(|| ProfileError::NotFound(id.to_string()))?;
        log::info!("name pre-filled from profile {}", profile.id);
        self.value = profile.name;
        Ok(())
    }
}

/// Explicit field value if there is one, otherwise "Guest"
pub fn resolve_display_name(field: &NameField) -> String {
    match field.value().trim() {
        "" => DEFAULT_NAME.to_string(),
        name => name.to_string(),
    }
}
