//! Per-drive preference persistence
//!
//! Negotiated burn properties are remembered per drive, input kind and disc type
//! under keys of the form `<namespace>/<drive>/<input>_<disc>/<property>`. The
//! temporary directory is global: `<namespace>/tmpdir`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Result, RustBurnError};

use super::flags::BurnFlags;
use super::session::BurnSession;

pub const SPEED_PROPERTY: &str = "speed";
pub const FLAGS_PROPERTY: &str = "flags";

/// Key/value store for preferences. A missing key means "use the computed default".
pub trait PreferenceStore {
    fn get_int(&self, key: &str) -> Option<i64>;
    fn set_int(&mut self, key: &str, value: i64) -> Result<()>;
    fn get_string(&self, key: &str) -> Option<String>;
    /// `None` unsets the key
    fn set_string(&mut self, key: &str, value: Option<&str>) -> Result<()>;
}

impl<T: PreferenceStore + ?Sized> PreferenceStore for &mut T {
    fn get_int(&self, key: &str) -> Option<i64> {
        (**self).get_int(key)
    }

    fn set_int(&mut self, key: &str, value: i64) -> Result<()> {
        (**self).set_int(key, value)
    }

    fn get_string(&self, key: &str) -> Option<String> {
        (**self).get_string(key)
    }

    fn set_string(&mut self, key: &str, value: Option<&str>) -> Result<()> {
        (**self).set_string(key, value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PrefValue {
    Int(i64),
    String(String),
}

/// Replace characters not allowed in a key component
fn sanitize_component(value: &str) -> String {
    value
        .chars()
        .map(|c| if matches!(c, ' ' | '+' | '(' | ')') { '_' } else { c })
        .collect()
}

/// Key of a drive scoped property, or `None` when there is no burner, no medium
/// or no disc type to scope it with
pub fn drive_key(namespace: &str, session: &BurnSession, property: &str) -> Option<String> {
    let burner = session.burner()?;
    let medium = burner.medium.as_ref()?;
    if medium.status.is_empty() || medium.type_string.is_empty() {
        return None;
    }

    Some(format!(
        "{}/{}/{}_{}/{}",
        namespace,
        sanitize_component(&burner.display_name),
        session.input.key_prefix(),
        sanitize_component(&medium.type_string),
        property
    ))
}

pub fn tmpdir_key(namespace: &str) -> String {
    format!("{}/tmpdir", namespace)
}

/// Persist rate, saved flags and temporary directory of `session`.
/// Does nothing when the session has no drive key.
pub fn save_drive_properties<P: PreferenceStore + ?Sized>(
    store: &mut P,
    namespace: &str,
    session: &BurnSession,
) -> Result<()> {
    let Some(speed_key) = drive_key(namespace, session, SPEED_PROPERTY) else {
        return Ok(());
    };
    store.set_int(&speed_key, (session.rate / 1024) as i64)?;

    let Some(flags_key) = drive_key(namespace, session, FLAGS_PROPERTY) else {
        return Ok(());
    };
    let stored = store.get_int(&flags_key).unwrap_or(0) as u32;
    let flags = (stored & !BurnFlags::SAVED.bits()) | (session.flags() & BurnFlags::SAVED).bits();
    store.set_int(&flags_key, flags as i64)?;

    store.set_string(&tmpdir_key(namespace), session.tmpdir.as_deref())?;
    debug!("Saved drive properties under {}", flags_key);
    Ok(())
}

/// In-memory store, used when no preference file is configured
#[derive(Debug, Clone, Default)]
pub struct MemoryPreferences {
    values: BTreeMap<String, PrefValue>,
}

impl MemoryPreferences {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl PreferenceStore for MemoryPreferences {
    fn get_int(&self, key: &str) -> Option<i64> {
        match self.values.get(key) {
            Some(PrefValue::Int(v)) => Some(*v),
            _ => None,
        }
    }

    fn set_int(&mut self, key: &str, value: i64) -> Result<()> {
        self.values.insert(key.to_string(), PrefValue::Int(value));
        Ok(())
    }

    fn get_string(&self, key: &str) -> Option<String> {
        match self.values.get(key) {
            Some(PrefValue::String(v)) => Some(v.clone()),
            _ => None,
        }
    }

    fn set_string(&mut self, key: &str, value: Option<&str>) -> Result<()> {
        match value {
            Some(v) => {
                self.values
                    .insert(key.to_string(), PrefValue::String(v.to_string()));
            }
            None => {
                self.values.remove(key);
            }
        }
        Ok(())
    }
}

/// JSON file store; every change is written through to disk
#[derive(Debug)]
pub struct JsonFilePreferences {
    path: PathBuf,
    inner: MemoryPreferences,
}

impl JsonFilePreferences {
    /// Open `path`, starting empty when the file does not exist yet
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let values = if path.exists() {
            let text = std::fs::read_to_string(&path)?;
            if text.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&text).map_err(|e| {
                    RustBurnError::preferences(format!(
                        "Cannot parse {}: {}",
                        path.display(),
                        e
                    ))
                })?
            }
        } else {
            debug!("Preference file {} not found, starting empty", path.display());
            BTreeMap::new()
        };

        Ok(Self {
            path,
            inner: MemoryPreferences { values },
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let text = serde_json::to_string_pretty(&self.inner.values)?;
        std::fs::write(&self.path, text).map_err(|e| {
            warn!("Failed to write {}: {}", self.path.display(), e);
            RustBurnError::from(e)
        })
    }
}

impl PreferenceStore for JsonFilePreferences {
    fn get_int(&self, key: &str) -> Option<i64> {
        self.inner.get_int(key)
    }

    fn set_int(&mut self, key: &str, value: i64) -> Result<()> {
        self.inner.set_int(key, value)?;
        self.save()
    }

    fn get_string(&self, key: &str) -> Option<String> {
        self.inner.get_string(key)
    }

    fn set_string(&mut self, key: &str, value: Option<&str>) -> Result<()> {
        self.inner.set_string(key, value)?;
        self.save()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::burn::session::{Drive, InputType, Medium, MediumStatus};

    const NS: &str = "/apps/rustburn/drives";

    fn session() -> BurnSession {
        let mut session = BurnSession::new();
        session.burner = Some(Drive {
            id: "sr0".into(),
            display_name: "HL-DT-ST DVD+RW (GSA-H10N)".into(),
            fake: false,
            medium: Some(Medium {
                status: MediumStatus::CD | MediumStatus::BLANK,
                type_string: "CD-R (blank)".into(),
                ..Medium::default()
            }),
        });
        session.input = InputType::Data;
        session
    }

    #[test]
    fn test_drive_key_format() {
        let key = drive_key(NS, &session(), "speed").unwrap();
        assert_eq!(
            key,
            "/apps/rustburn/drives/HL-DT-ST_DVD_RW__GSA-H10N_/data_CD-R__blank_/speed"
        );
    }

    #[test]
    fn test_drive_key_needs_medium() {
        let mut s = session();
        s.burner.as_mut().unwrap().medium.as_mut().unwrap().status = MediumStatus::NONE;
        assert!(drive_key(NS, &s, "speed").is_none());

        s.burner.as_mut().unwrap().medium = None;
        assert!(drive_key(NS, &s, "speed").is_none());

        s.burner = None;
        assert!(drive_key(NS, &s, "speed").is_none());
    }

    #[test]
    fn test_save_masks_flags_and_scales_rate() {
        let mut store = MemoryPreferences::new();
        let mut s = session();
        s.rate = 10 * 1024 * 176;
        s.flags = BurnFlags::EJECT | BurnFlags::DAO | BurnFlags::OVERBURN | BurnFlags::MULTI;
        s.tmpdir = Some("/var/tmp".into());

        let flags_key = drive_key(NS, &s, FLAGS_PROPERTY).unwrap();
        // bits outside the saved mask already in the store are preserved
        store
            .set_int(&flags_key, (BurnFlags::DUMMY | BurnFlags::APPEND).bits() as i64)
            .unwrap();

        save_drive_properties(&mut store, NS, &s).unwrap();

        let speed_key = drive_key(NS, &s, SPEED_PROPERTY).unwrap();
        assert_eq!(store.get_int(&speed_key), Some(1760));
        assert_eq!(
            store.get_int(&flags_key),
            Some((BurnFlags::EJECT | BurnFlags::MULTI | BurnFlags::APPEND).bits() as i64)
        );
        assert_eq!(store.get_string(&tmpdir_key(NS)), Some("/var/tmp".into()));
    }

    #[test]
    fn test_save_without_key_is_noop() {
        let mut store = MemoryPreferences::new();
        let mut s = session();
        s.burner = None;
        save_drive_properties(&mut store, NS, &s).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_json_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("drives.json");

        let mut store = JsonFilePreferences::open(&path).unwrap();
        store.set_int("/a/speed", 42).unwrap();
        store.set_string("/a/tmpdir", Some("/tmp")).unwrap();
        assert!(path.exists());

        let reopened = JsonFilePreferences::open(&path).unwrap();
        assert_eq!(reopened.get_int("/a/speed"), Some(42));
        assert_eq!(reopened.get_string("/a/tmpdir"), Some("/tmp".into()));
        assert_eq!(reopened.get_int("/a/tmpdir"), None);
    }

    #[test]
    fn test_json_file_corrupt_is_error() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "{not json").unwrap();
        let result = JsonFilePreferences::open(file.path());
        assert!(matches!(result, Err(RustBurnError::Preferences(_))));
    }
}
