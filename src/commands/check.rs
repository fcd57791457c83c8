//! Check Command Handler
//!
//! Handles the `check` subcommand: runs the session validity checks on a project
//! file against a capability profile.

use std::cell::Cell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::burn::{
    BurnFlags, BurnSession, CapsProfile, FlagSupport, JsonFilePreferences, MemoryPreferences,
    PreferenceStore, SessionCfg, SessionError, SessionNotice,
};
use crate::config::AppConfig;
use crate::display;
use crate::error::{Result, RustBurnError};
use tracing::{debug, info};

/// Result of validating one project
#[derive(Debug, Clone)]
pub struct CheckReport {
    pub session: BurnSession,
    pub outcome: SessionError,
    pub notice: Option<SessionNotice>,
    pub support: FlagSupport,
    /// Validity notifications received while checking
    pub notifications: usize,
}

pub fn load_project<P: AsRef<Path>>(path: P) -> Result<BurnSession> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)?;
    let invalid = |e: serde_json::Error| {
        RustBurnError::parse(format!("Invalid project {}: {}", path.display(), e))
    };

    let value: serde_json::Value = serde_json::from_str(&text).map_err(invalid)?;
    if !value.is_object() {
        return Err(RustBurnError::parse(format!(
            "Invalid project {}: expected a JSON object",
            path.display()
        )));
    }
    serde_json::from_value(value).map_err(invalid)
}

/// Validate `session`, confirming overburn when `overburn` is set and it is needed
pub fn check_session<P: PreferenceStore>(
    session: BurnSession,
    caps: CapsProfile,
    prefs: P,
    namespace: &str,
    overburn: bool,
) -> CheckReport {
    let mut cfg = SessionCfg::new(session, caps, prefs, namespace);

    let notifications = Rc::new(Cell::new(0usize));
    let counter = notifications.clone();
    cfg.connect_validity_changed(move || counter.set(counter.get() + 1));

    cfg.input_changed();
    if overburn && cfg.get_error() == SessionError::OverburnNecessary {
        info!("Overburn confirmed");
        cfg.add_flags(BurnFlags::OVERBURN);
    }
    debug!("{} validity notification(s)", notifications.get());

    let outcome = cfg.get_error();
    let notice = cfg.notice();
    let support = cfg.support();
    CheckReport {
        session: cfg.into_session(),
        outcome,
        notice,
        support,
        notifications: notifications.get(),
    }
}

pub async fn execute(
    project: PathBuf,
    caps: PathBuf,
    overburn: bool,
    config: &AppConfig,
) -> Result<()> {
    info!("Checking project {} against {}", project.display(), caps.display());

    let session = load_project(&project)?;
    let profile = CapsProfile::load(&caps)?;

    let report = match &config.preferences {
        Some(path) => {
            let prefs = JsonFilePreferences::open(path)?;
            check_session(session, profile, prefs, &config.namespace, overburn)
        }
        None => check_session(
            session,
            profile,
            MemoryPreferences::new(),
            &config.namespace,
            overburn,
        ),
    };

    display::display_check_result(&report.session, report.outcome, report.notice, report.support);

    if report.outcome == SessionError::OverburnNecessary {
        display::display_warning("Run again with --overburn to write past the nominal capacity");
    }

    if !report.outcome.is_valid() {
        return Err(RustBurnError::parameter_validation(format!(
            "Session cannot be burnt: {}",
            report.outcome
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROJECT: &str = r#"{
        "burner": {
            "id": "sr0",
            "display_name": "ACME Writer",
            "medium": {
                "status": "CD | BLANK",
                "type_string": "CD-R",
                "capacity_sectors": 680000,
                "free_space_sectors": 680000,
                "max_write_speed": 7056000
            }
        },
        "input": {"type": "data"},
        "tracks": [{"type": "data"}],
        "tags": {"data_size": 700000}
    }"#;

    fn profile() -> CapsProfile {
        CapsProfile::from_json(r#"{"supported": "EJECT | BURNPROOF | DAO | OVERBURN"}"#).unwrap()
    }

    #[test]
    fn test_check_without_overburn() {
        let session: BurnSession = serde_json::from_str(PROJECT).unwrap();
        let report = check_session(session, profile(), MemoryPreferences::new(), "/t", false);
        assert_eq!(report.outcome, SessionError::OverburnNecessary);
        assert_eq!(report.notifications, 1);
    }

    #[test]
    fn test_check_with_overburn() {
        let session: BurnSession = serde_json::from_str(PROJECT).unwrap();
        let report = check_session(session, profile(), MemoryPreferences::new(), "/t", true);
        assert_eq!(report.outcome, SessionError::Valid);
        assert!(report.session.flags().contains(BurnFlags::OVERBURN | BurnFlags::DAO));
        assert_eq!(report.notifications, 2);
        assert_eq!(report.notice, None);
    }

    #[tokio::test]
    async fn test_execute_with_files() {
        let dir = tempfile::tempdir().unwrap();
        let project = dir.path().join("project.json");
        let caps = dir.path().join("caps.json");
        std::fs::write(&project, PROJECT).unwrap();
        std::fs::write(&caps, r#"{"supported": "EJECT | OVERBURN"}"#).unwrap();

        let config = AppConfig {
            preferences: Some(dir.path().join("drives.json")),
            namespace: "/apps/rustburn/drives".into(),
        };

        let result = execute(project.clone(), caps.clone(), false, &config).await;
        assert!(matches!(result, Err(RustBurnError::ParameterValidation(_))));

        execute(project, caps, true, &config).await.unwrap();
        assert!(dir.path().join("drives.json").exists());
    }

    #[test]
    fn test_bad_project_is_parse_error() {
        let file = tempfile::NamedTempFile::new().unwrap();
        for text in ["[]", "42", "{\"tracks\": ", "{\"tracks\": 5}"] {
            std::fs::write(file.path(), text).unwrap();
            assert!(
                matches!(load_project(file.path()), Err(RustBurnError::Parse(_))),
                "accepted {}",
                text
            );
        }
    }

    #[test]
    fn test_empty_object_project_loads() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "{}").unwrap();
        assert_eq!(load_project(file.path()).unwrap(), BurnSession::default());
    }
}
