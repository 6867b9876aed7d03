use chrono::Local;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::app_dirs::AppDirs;

pub const ID_PREFIX: &str = "DKT-";

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("Name is required")]
    NameRequired,
    #[error("Enter an ID like DKT-12345")]
    EmptyId,
    #[error("ID not found on this device: {0}")]
    NotFound(String),
    #[error("Expected a JSON array of profiles")]
    NotAnArray,
    #[error("profile store I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// A user record kept on this device only
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub dob: String,
    #[serde(default)]
    pub gender: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

/// Editable fields of a profile
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileInput {
    pub name: String,
    pub email: String,
    pub country: String,
    pub dob: String,
    pub gender: String,
}

impl ProfileInput {
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    fn validated_name(&self) -> Result<String, ProfileError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(ProfileError::NameRequired);
        }
        Ok(name.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportSummary {
    pub received: usize,
    pub added: usize,
    pub skipped: usize,
}

/// The only part of the store the typing test depends on
pub trait ProfileLookup {
    fn get_by_id(&self, id: &str) -> Option<Profile>;
}

fn now_string() -> String {
    Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Profiles persisted as a JSON array in a single file
#[derive(Debug, Clone)]
pub struct FileProfileStore {
    path: PathBuf,
}

impl FileProfileStore {
    pub fn new(dirs: &AppDirs) -> Self {
        Self::with_path(dirs.profiles_path())
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All profiles in insertion order. A missing or unreadable file is
    /// treated as an empty store.
    pub fn load(&self) -> Vec<Profile> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                log::error!("failed reading profiles at {}: {e}", self.path.display());
                return Vec::new();
            }
        };
        match serde_json::from_slice(&bytes) {
            Ok(profiles) => profiles,
            Err(e) => {
                log::error!("failed parsing profiles at {}: {e}", self.path.display());
                Vec::new()
            }
        }
    }

    pub fn save(&self, profiles: &[Profile]) -> Result<(), ProfileError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(profiles)?;
        fs::write(&self.path, data)?;
        Ok(())
    }

    /// A fresh `DKT-XXXXX` id not used by any stored profile
    pub fn generate_id(&self) -> String {
        let existing = self.load();
        let mut rng = rand::thread_rng();
        loop {
            let id = format!("{ID_PREFIX}{}", rng.gen_range(10_000..=99_999));
            if !existing.iter().any(|p| p.id == id) {
                return id;
            }
        }
    }

    pub fn create(&self, input: ProfileInput) -> Result<Profile, ProfileError> {
        let name = input.validated_name()?;
        let id = self.generate_id();
        let now = now_string();
        let profile = Profile {
            id,
            name,
            email: input.email.trim().to_string(),
            country: input.country.trim().to_string(),
            dob: input.dob.trim().to_string(),
            gender: input.gender.trim().to_string(),
            created_at: now.clone(),
            updated_at: now,
        };

        let mut profiles = self.load();
        profiles.push(profile.clone());
        self.save(&profiles)?;
        log::info!("profile {} created", profile.id);
        Ok(profile)
    }

    pub fn update(&self, id: &str, input: ProfileInput) -> Result<Profile, ProfileError> {
        let name = input.validated_name()?;
        let mut profiles = self.load();
        let profile = profiles
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| ProfileError::NotFound(id.to_string()))?;

        profile.name = name;
        profile.email = input.email.trim().to_string();
        profile.country = input.country.trim().to_string();
        profile.dob = input.dob.trim().to_string();
        profile.gender = input.gender.trim().to_string();
        profile.updated_at = now_string();
        let updated = profile.clone();

        self.save(&profiles)?;
        log::info!("profile {id} updated");
        Ok(updated)
    }

    pub fn delete(&self, id: &str) -> Result<(), ProfileError> {
        let mut profiles = self.load();
        let before = profiles.len();
        profiles.retain(|p| p.id != id);
        if profiles.len() == before {
            return Err(ProfileError::NotFound(id.to_string()));
        }
        self.save(&profiles)?;
        log::info!("profile {id} deleted");
        Ok(())
    }

    /// Case-insensitive lookup of a user-entered id
    pub fn lookup(&self, query: &str) -> Result<Profile, ProfileError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ProfileError::EmptyId);
        }
        self.load()
            .into_iter()
            .find(|p| p.id.eq_ignore_ascii_case(query))
            .ok_or_else(|| ProfileError::NotFound(query.to_string()))
    }

    /// Most recently created profile
    pub fn last(&self) -> Option<Profile> {
        self.load().pop()
    }

    /// Newest first
    pub fn list(&self) -> Vec<Profile> {
        let mut profiles = self.load();
        profiles.reverse();
        profiles
    }

    pub fn export_json(&self) -> Result<String, ProfileError> {
        Ok(serde_json::to_string_pretty(&self.load())?)
    }

    /// Merge profiles from a JSON array, keeping existing ids untouched
    pub fn import_json(&self, raw: &str) -> Result<ImportSummary, ProfileError> {
        let value: serde_json::Value = serde_json::from_str(raw.trim())?;
        let entries = match value {
            serde_json::Value::Array(entries) => entries,
            _ => return Err(ProfileError::NotAnArray),
        };

        let mut profiles = self.load();
        let received = entries.len();
        let mut added = 0;
        for mut entry in entries {
            // numeric ids from hand-edited backups are kept as their digits
            if let Some(id) = entry.get_mut("id") {
                if id.is_number() {
                    *id = serde_json::Value::String(id.to_string());
                }
            }
            let candidate = match serde_json::from_value::<Profile>(entry) {
                Ok(p) if !p.id.trim().is_empty() => p,
                _ => continue,
            };
            if profiles.iter().any(|p| p.id == candidate.id) {
                continue;
            }
            profiles.push(candidate);
            added += 1;
        }

        self.save(&profiles)?;
        log::info!("imported {added} of {received} profiles");
        Ok(ImportSummary {
            received,
            added,
            skipped: received - added,
        })
    }

    pub fn clear_all(&self) -> Result<(), ProfileError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

impl ProfileLookup for FileProfileStore {
    fn get_by_id(&self, id: &str) -> Option<Profile> {
        self.load().into_iter().find(|p| p.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use tempfile::{tempdir, TempDir};

    fn store() -> (TempDir, FileProfileStore) {
        let dir = tempdir().unwrap();
        let store = FileProfileStore::with_path(dir.path().join("nested").join("profiles.json"));
        (dir, store)
    }

    fn is_valid_id(id: &str) -> bool {
        id.len() == 9
            && id.starts_with(ID_PREFIX)
            && id[4..].chars().all(|c| c.is_ascii_digit())
            && !id[4..].starts_with('0')
    }

    #[test]
    fn test_empty_store() {
        let (_dir, store) = store();
        assert!(store.load().is_empty());
        assert!(store.last().is_none());
        assert!(store.get_by_id("DKT-12345").is_none());
    }

    #[test]
    fn test_generate_id_format() {
        let (_dir, store) = store();
        for _ in 0..50 {
            let id = store.generate_id();
            assert!(is_valid_id(&id), "{id}");
        }
    }

    #[test]
    fn test_create_and_get_by_id() {
        let (_dir, store) = store();
        let created = store
            .create(ProfileInput {
                name: "  Ada Lovelace ".into(),
                email: "ada@example.com".into(),
                ..ProfileInput::default()
            })
            .unwrap();

        assert!(is_valid_id(&created.id));
        assert_eq!(created.name, "Ada Lovelace");
        assert_eq!(created.created_at, created.updated_at);

        let found = store.get_by_id(&created.id).unwrap();
        assert_eq!(found, created);
        assert!(store.get_by_id(&created.id.to_lowercase()).is_none());
    }

    #[test]
    fn test_create_requires_name() {
        let (_dir, store) = store();
        assert_matches!(
            store.create(ProfileInput::named("   ")),
            Err(ProfileError::NameRequired)
        );
        assert!(store.load().is_empty());
    }

    #[test]
    fn test_ids_are_unique() {
        let (_dir, store) = store();
        let mut ids: Vec<String> = (0..20)
            .map(|i| store.create(ProfileInput::named(&format!("user {i}"))).unwrap().id)
            .collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 20);
    }

    #[test]
    fn test_update_merges_fields() {
        let (_dir, store) = store();
        let created = store.create(ProfileInput::named("Ada")).unwrap();

        let updated = store
            .update(
                &created.id,
                ProfileInput {
                    name: "Ada L.".into(),
                    country: "UK".into(),
                    ..ProfileInput::default()
                },
            )
            .unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.name, "Ada L.");
        assert_eq!(updated.country, "UK");
        assert_eq!(updated.created_at, created.created_at);
        assert_eq!(store.get_by_id(&created.id).unwrap(), updated);
    }

    #[test]
    fn test_update_errors() {
        let (_dir, store) = store();
        let created = store.create(ProfileInput::named("Ada")).unwrap();

        assert_matches!(
            store.update("DKT-00000", ProfileInput::named("x")),
            Err(ProfileError::NotFound(id)) if id == "DKT-00000"
        );
        assert_matches!(
            store.update(&created.id, ProfileInput::named("")),
            Err(ProfileError::NameRequired)
        );
    }

    #[test]
    fn test_delete() {
        let (_dir, store) = store();
        let a = store.create(ProfileInput::named("A")).unwrap();
        let b = store.create(ProfileInput::named("B")).unwrap();

        store.delete(&a.id).unwrap();
        assert!(store.get_by_id(&a.id).is_none());
        assert_eq!(store.load(), vec![b]);
        assert_matches!(store.delete(&a.id), Err(ProfileError::NotFound(_)));
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let (_dir, store) = store();
        let created = store.create(ProfileInput::named("Ada")).unwrap();

        let found = store.lookup(&format!(" {} ", created.id.to_lowercase())).unwrap();
        assert_eq!(found.id, created.id);
        assert_matches!(store.lookup("  "), Err(ProfileError::EmptyId));
        assert_matches!(store.lookup("DKT-00000"), Err(ProfileError::NotFound(_)));
    }

    #[test]
    fn test_list_newest_first_and_last() {
        let (_dir, store) = store();
        let a = store.create(ProfileInput::named("A")).unwrap();
        let b = store.create(ProfileInput::named("B")).unwrap();

        let names: Vec<String> = store.list().into_iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["B", "A"]);
        assert_eq!(store.last().unwrap().id, b.id);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_malformed_file_reads_as_empty() {
        let (_dir, store) = store();
        fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        fs::write(store.path(), "{ not json").unwrap();
        assert!(store.load().is_empty());
    }

    #[test]
    fn test_file_uses_camel_case_keys() {
        let (_dir, store) = store();
        store.create(ProfileInput::named("Ada")).unwrap();
        let raw = fs::read_to_string(store.path()).unwrap();
        assert!(raw.contains("\"createdAt\""));
        assert!(raw.contains("\"updatedAt\""));
    }

    #[test]
    fn test_export_then_import_into_other_store() {
        let (_dir, source) = store();
        source.create(ProfileInput::named("A")).unwrap();
        source.create(ProfileInput::named("B")).unwrap();
        let exported = source.export_json().unwrap();

        let (_dir2, target) = store();
        let summary = target.import_json(&exported).unwrap();
        assert_eq!(
            summary,
            ImportSummary {
                received: 2,
                added: 2,
                skipped: 0
            }
        );
        assert_eq!(target.load(), source.load());
    }

    #[test]
    fn test_import_skips_duplicates_and_entries_without_id() {
        let (_dir, store) = store();
        let existing = store.create(ProfileInput::named("Ada")).unwrap();

        let raw = format!(
            r#"[
                {{ "id": "{}", "name": "Impostor" }},
                {{ "name": "No id" }},
                {{ "id": "", "name": "Blank id" }},
                null,
                {{ "id": "DKT-55555", "name": "Grace" }}
            ]"#,
            existing.id
        );
        let summary = store.import_json(&raw).unwrap();
        assert_eq!(summary.received, 5);
        assert_eq!(summary.added, 1);
        assert_eq!(summary.skipped, 4);

        assert_eq!(store.get_by_id(&existing.id).unwrap().name, "Ada");
        assert_eq!(store.get_by_id("DKT-55555").unwrap().name, "Grace");
    }

    #[test]
    fn test_unreadable_store_loads_empty() {
        let dir = tempdir().unwrap();
        // a directory where the file should be fails with something other than NotFound
        let store = FileProfileStore::with_path(dir.path());
        assert!(store.load().is_empty());
        assert_matches!(store.create(ProfileInput::named("Ada")), Err(ProfileError::Io(_)));
    }

    #[test]
    fn test_import_accepts_numeric_and_nameless_ids() {
        let (_dir, store) = store();
        let raw = r#"[
            { "id": 12345, "name": "Numeric" },
            { "id": "DKT-77777" },
            { "id": true, "name": "Not an id" }
        ]"#;
        let summary = store.import_json(raw).unwrap();
        assert_eq!(summary.added, 2);
        assert_eq!(summary.skipped, 1);

        assert_eq!(store.get_by_id("12345").unwrap().name, "Numeric");
        assert_eq!(store.get_by_id("DKT-77777").unwrap().name, "");
    }

    #[test]
    fn test_import_rejects_non_arrays() {
        let (_dir, store) = store();
        assert_matches!(
            store.import_json(r#"{ "id": "DKT-12345" }"#),
            Err(ProfileError::NotAnArray)
        );
        assert_matches!(store.import_json("nope"), Err(ProfileError::Json(_)));
    }

    #[test]
    fn test_clear_all() {
        let (_dir, store) = store();
        store.create(ProfileInput::named("Ada")).unwrap();
        store.clear_all().unwrap();
        assert!(store.load().is_empty());
        // clearing an empty store is fine
        store.clear_all().unwrap();
    }
}
