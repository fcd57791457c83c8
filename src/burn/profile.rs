//! Table-driven capability backend
//!
//! A `CapsProfile` describes a recorder/backend combination as data: base flag
//! masks, rules that widen or narrow them depending on the flags already set and
//! the loaded medium, and which inputs can be burnt. Profiles are loaded from JSON.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, RustBurnError};

use super::caps::{BurnCaps, FlagSupport};
use super::flags::BurnFlags;
use super::session::{BurnSession, InputKind, InputType, MediumStatus};

/// Adjustment applied when all its conditions hold
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapsRule {
    /// Every one of these flags is set on the session
    #[serde(default)]
    pub when_flags: BurnFlags,
    /// Every one of these bits is set on the burner's medium
    #[serde(default)]
    pub when_media: MediumStatus,
    #[serde(default)]
    pub supported: BurnFlags,
    #[serde(default)]
    pub unsupported: BurnFlags,
    #[serde(default)]
    pub compulsory: BurnFlags,
}

impl CapsRule {
    fn matches(&self, flags: BurnFlags, media: MediumStatus) -> bool {
        flags.contains(self.when_flags) && media.contains(self.when_media)
    }
}

fn default_inputs() -> Vec<InputKind> {
    vec![
        InputKind::Disc,
        InputKind::Data,
        InputKind::Image,
        InputKind::Audio,
    ]
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapsProfile {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub supported: BurnFlags,
    #[serde(default)]
    pub compulsory: BurnFlags,
    #[serde(default)]
    pub rules: Vec<CapsRule>,
    #[serde(default = "default_inputs")]
    pub inputs: Vec<InputKind>,
    /// Audio can be written with CD-TEXT
    #[serde(default)]
    pub cd_text: bool,
    /// Encrypted discs can be read
    #[serde(default)]
    pub protected_discs: bool,
}

impl Default for CapsProfile {
    fn default() -> Self {
        Self {
            name: String::new(),
            supported: BurnFlags::empty(),
            compulsory: BurnFlags::empty(),
            rules: Vec::new(),
            inputs: default_inputs(),
            cd_text: false,
            protected_discs: false,
        }
    }
}

impl CapsProfile {
    pub fn new(supported: BurnFlags, compulsory: BurnFlags) -> Self {
        Self {
            supported: supported | compulsory,
            compulsory,
            ..Self::default()
        }
    }

    pub fn with_rule(mut self, rule: CapsRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text)
            .map_err(|e| RustBurnError::caps(format!("Invalid capability profile: {}", e)))
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let profile = Self::from_json(&text)?;
        debug!(
            "Loaded capability profile '{}' from {}",
            profile.name,
            path.as_ref().display()
        );
        Ok(profile)
    }
}

impl BurnCaps for CapsProfile {
    fn get_flags(&self, session: &BurnSession) -> Result<FlagSupport> {
        let burner = session
            .burner()
            .ok_or_else(|| RustBurnError::caps("No burner set"))?;
        if !self.is_session_supported(session) {
            return Err(RustBurnError::caps(format!(
                "No backend for {} input",
                session.input.key_prefix()
            )));
        }

        let media = burner.medium_status();
        let mut supported = self.supported;
        let mut compulsory = self.compulsory;
        for rule in self.rules.iter().filter(|r| r.matches(session.flags(), media)) {
            supported |= rule.supported;
            supported &= !rule.unsupported;
            compulsory |= rule.compulsory;
        }

        // a compulsory flag is always one that can be set
        Ok(FlagSupport::new(supported | compulsory, compulsory))
    }

    fn is_session_supported(&self, session: &BurnSession) -> bool {
        session.burner().is_some() && self.is_input_supported(session, &session.input)
    }

    fn is_input_supported(&self, session: &BurnSession, input: &InputType) -> bool {
        if session.burner().is_none() || !self.is_track_type_supported(input) {
            return false;
        }
        !(input.has_cd_text() && !self.cd_text)
    }

    fn is_track_type_supported(&self, input: &InputType) -> bool {
        if !self.inputs.contains(&input.kind()) {
            return false;
        }
        match input {
            InputType::Disc { media } if media.contains(MediumStatus::PROTECTED) => {
                self.protected_discs
            }
            _ => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::burn::session::{Drive, Medium};

    fn session_with(status: MediumStatus, input: InputType) -> BurnSession {
        let mut session = BurnSession::new();
        session.burner = Some(Drive {
            id: "sr0".into(),
            display_name: "Writer".into(),
            fake: false,
            medium: Some(Medium {
                status,
                type_string: "CD-RW".into(),
                ..Medium::default()
            }),
        });
        session.input = input;
        session
    }

    #[test]
    fn test_rules_follow_flags_and_media() {
        let profile = CapsProfile::new(
            BurnFlags::DAO | BurnFlags::BLANK_BEFORE_WRITE,
            BurnFlags::empty(),
        )
        .with_rule(CapsRule {
            when_flags: BurnFlags::DAO,
            when_media: MediumStatus::REWRITABLE | MediumStatus::HAS_DATA,
            compulsory: BurnFlags::BLANK_BEFORE_WRITE,
            ..CapsRule::default()
        });

        let mut session = session_with(
            MediumStatus::CD | MediumStatus::REWRITABLE | MediumStatus::HAS_DATA,
            InputType::Data,
        );
        let support = profile.get_flags(&session).unwrap();
        assert!(support.compulsory.is_empty());

        session.add_flags(BurnFlags::DAO);
        let support = profile.get_flags(&session).unwrap();
        assert_eq!(support.compulsory, BurnFlags::BLANK_BEFORE_WRITE);
    }

    #[test]
    fn test_no_burner_is_failure() {
        let profile = CapsProfile::new(BurnFlags::all(), BurnFlags::empty());
        let mut session = BurnSession::new();
        session.input = InputType::Data;
        assert!(profile.get_flags(&session).is_err());
        assert!(!profile.is_session_supported(&session));
    }

    #[test]
    fn test_cd_text_and_protected_inputs() {
        let profile = CapsProfile::default();
        let session = session_with(MediumStatus::CD | MediumStatus::BLANK, InputType::Data);

        assert!(!profile.is_input_supported(&session, &InputType::Audio { cd_text: true }));
        assert!(profile.is_input_supported(&session, &InputType::Audio { cd_text: false }));

        let protected = InputType::Disc {
            media: MediumStatus::DVD | MediumStatus::PROTECTED,
        };
        assert!(!profile.is_track_type_supported(&protected));
    }

    #[test]
    fn test_profile_from_json() {
        let profile = CapsProfile::from_json(
            r#"{
                "name": "cdrecord",
                "supported": "DAO | OVERBURN | EJECT",
                "inputs": ["data", "image"],
                "rules": [{"when_media": "DVD", "unsupported": "OVERBURN"}]
            }"#,
        )
        .unwrap();
        assert_eq!(profile.name, "cdrecord");
        assert!(profile.supported.contains(BurnFlags::OVERBURN));
        assert_eq!(profile.inputs, vec![InputKind::Data, InputKind::Image]);

        let session = session_with(MediumStatus::DVD | MediumStatus::BLANK, InputType::Data);
        let support = profile.get_flags(&session).unwrap();
        assert!(!support.supported.contains(BurnFlags::OVERBURN));
    }

    #[test]
    fn test_invalid_json_is_caps_error() {
        let result = CapsProfile::from_json("{\"supported\": 12");
        assert!(matches!(result, Err(RustBurnError::Caps(_))));
    }
}
