//! Session validity state machine
//!
//! `SessionCfg` owns a burn session and keeps one validity outcome for it. Every
//! change to the input, the output, the backend capabilities or the flags re-runs
//! the whole check sequence; the first failing check decides the outcome. Observers
//! are told once the sequence has finished and pull the state they need.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::caps::{BurnCaps, FlagSupport};
use super::flags::BurnFlags;
use super::negotiate::{negotiate_flags, NegotiationOutcome};
use super::prefs::{self, PreferenceStore, FLAGS_PROPERTY, SPEED_PROPERTY};
use super::session::{BurnSession, Drive, ImageFormat, InputType, MediumStatus, SizeTags, Track};
use super::size::check_size;

/// Outcome of the last validation pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SessionError {
    Valid,
    InsufficientSpace,
    OverburnNecessary,
    NoOutput,
    /// Valid, but audio will be written without CD-TEXT
    NoCdText,
    NoInputMedium,
    NoInputImage,
    UnknownImage,
    DiscProtected,
    NotSupported,
}

impl SessionError {
    /// The session can be burnt as is
    pub fn is_valid(&self) -> bool {
        matches!(self, SessionError::Valid | SessionError::NoCdText)
    }

    pub fn description(&self) -> &'static str {
        match self {
            SessionError::Valid => "Ready to burn",
            SessionError::InsufficientSpace => "Not enough space available on the disc",
            SessionError::OverburnNecessary => {
                "The data does not fit on the disc unless it is overburnt"
            }
            SessionError::NoOutput => "No disc available to write to",
            SessionError::NoCdText => "Audio will be written without CD-TEXT",
            SessionError::NoInputMedium => "No disc available to copy from",
            SessionError::NoInputImage => "No image file was selected",
            SessionError::UnknownImage => "The format of the image could not be detected",
            SessionError::DiscProtected => "The disc to copy is protected",
            SessionError::NotSupported => "The current setup is not supported",
        }
    }
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// Information attached to a valid session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionNotice {
    /// The drive holding the source disc also records the copy
    SameDriveCopy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObserverId(u64);

type Observer = Box<dyn FnMut()>;

pub struct SessionCfg<C: BurnCaps, P: PreferenceStore> {
    session: BurnSession,
    caps: C,
    prefs: P,
    namespace: String,
    support: FlagSupport,
    is_valid: SessionError,
    cd_text_modified: bool,
    configuring: bool,
    disabled: bool,
    observers: Vec<(ObserverId, Observer)>,
    next_observer: u64,
}

impl<C: BurnCaps, P: PreferenceStore> SessionCfg<C, P> {
    /// Wrap `session`. Nothing is validated until the first change notification.
    pub fn new(session: BurnSession, caps: C, prefs: P, namespace: impl Into<String>) -> Self {
        Self {
            session,
            caps,
            prefs,
            namespace: namespace.into(),
            support: FlagSupport::default(),
            is_valid: SessionError::NotSupported,
            cd_text_modified: false,
            configuring: false,
            disabled: false,
            observers: Vec::new(),
            next_observer: 0,
        }
    }

    pub fn session(&self) -> &BurnSession {
        &self.session
    }

    pub fn into_session(self) -> BurnSession {
        self.session
    }

    pub fn caps(&self) -> &C {
        &self.caps
    }

    pub fn prefs(&self) -> &P {
        &self.prefs
    }

    pub fn support(&self) -> FlagSupport {
        self.support
    }

    pub fn cd_text_modified(&self) -> bool {
        self.cd_text_modified
    }

    /// Current outcome; a valid session whose CD-TEXT had to be dropped reports `NoCdText`
    pub fn get_error(&self) -> SessionError {
        if self.is_valid == SessionError::Valid && self.cd_text_modified {
            return SessionError::NoCdText;
        }
        self.is_valid
    }

    pub fn notice(&self) -> Option<SessionNotice> {
        if self.get_error().is_valid() && self.session.same_src_dest_drive() {
            Some(SessionNotice::SameDriveCopy)
        } else {
            None
        }
    }

    /// Stop reacting to input, output and capability changes
    pub fn disable(&mut self) {
        self.disabled = true;
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    pub fn connect_validity_changed<F: FnMut() + 'static>(&mut self, observer: F) -> ObserverId {
        let id = ObserverId(self.next_observer);
        self.next_observer += 1;
        self.observers.push((id, Box::new(observer)));
        id
    }

    pub fn disconnect(&mut self, id: ObserverId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(observer, _)| *observer != id);
        self.observers.len() != before
    }

    pub fn is_supported(&self, flags: BurnFlags) -> bool {
        self.support.supported.contains(flags)
    }

    pub fn is_compulsory(&self, flags: BurnFlags) -> bool {
        self.support.compulsory.contains(flags)
    }

    /// Set `flags` if all of them are supported and not all already set
    pub fn add_flags(&mut self, flags: BurnFlags) {
        if !self.support.supported.contains(flags) {
            debug!("Refusing unsupported flags {:?}", flags);
            return;
        }
        if self.session.flags().contains(flags) {
            return;
        }

        self.session.add_flags(flags);
        self.refresh_support();
        self.save_drive_properties();
        self.update(false, false);
    }

    pub fn remove_flags(&mut self, flags: BurnFlags) {
        self.session.remove_flags(flags);
        self.refresh_support();
        self.save_drive_properties();
        self.update(false, false);
    }

    pub fn set_input_type(&mut self, input: InputType) {
        self.session.input = input;
        self.input_changed();
    }

    pub fn set_tracks(&mut self, tracks: Vec<Track>) {
        self.session.tracks = tracks;
        self.input_changed();
    }

    pub fn set_size_tags(&mut self, tags: SizeTags) {
        self.session.tags = tags;
        self.input_changed();
    }

    pub fn set_burner(&mut self, burner: Option<Drive>) {
        self.session.burner = burner;
        self.output_changed();
    }

    /// Source medium or image changed: reload saved properties and renegotiate
    pub fn input_changed(&mut self) {
        if self.disabled {
            return;
        }
        self.update(true, false);
    }

    /// Burner or its medium changed: reload saved properties and renegotiate
    pub fn output_changed(&mut self) {
        if self.disabled {
            return;
        }
        self.update(true, false);
    }

    /// Installed backends changed: re-check the flags already set
    pub fn caps_changed(&mut self) {
        if self.disabled {
            return;
        }
        self.update(false, true);
    }

    fn refresh_support(&mut self) {
        self.support = self.caps.get_flags(&self.session).unwrap_or_else(|e| {
            debug!("Capability recomputation failed: {}", e);
            FlagSupport::default()
        });
    }

    fn set_validity(&mut self, outcome: SessionError) {
        self.is_valid = outcome;
        debug!("Session validity: {:?}", self.get_error());
        for (_, observer) in self.observers.iter_mut() {
            observer();
        }
    }

    fn save_drive_properties(&mut self) {
        if let Err(e) =
            prefs::save_drive_properties(&mut self.prefs, &self.namespace, &self.session)
        {
            warn!("Failed to save drive properties: {}", e);
        }
    }

    fn negotiate(&mut self, flags: BurnFlags) -> NegotiationOutcome {
        let outcome = negotiate_flags(&self.caps, &mut self.session, flags, &mut self.support);
        if outcome.is_completed() {
            self.save_drive_properties();
        }
        outcome
    }

    /// Load rate, temporary directory and flags saved for this drive and disc,
    /// then negotiate them. `None` when the burner has no medium.
    fn set_drive_properties(&mut self) -> Option<NegotiationOutcome> {
        let burner = self.session.burner()?;
        let medium = burner.medium.as_ref()?;
        if medium.status.is_empty() {
            return None;
        }
        let max_write_speed = medium.max_write_speed;

        let speed = prefs::drive_key(&self.namespace, &self.session, SPEED_PROPERTY)
            .and_then(|key| self.prefs.get_int(&key));
        self.session.rate = match speed {
            Some(speed) => (speed.max(0) as u64).saturating_mul(1024),
            None => max_write_speed,
        };

        self.session.tmpdir = self.prefs.get_string(&prefs::tmpdir_key(&self.namespace));

        let flags_key = prefs::drive_key(&self.namespace, &self.session, FLAGS_PROPERTY)?;
        let saved = self
            .prefs
            .get_int(&flags_key)
            .map(|bits| BurnFlags::from_bits_truncate(bits as u32) & BurnFlags::SAVED);

        let flags = if self.session.same_src_dest_drive() {
            saved.unwrap_or(BurnFlags::EJECT | BurnFlags::BURNPROOF)
                | BurnFlags::BLANK_BEFORE_WRITE
                | BurnFlags::FAST_BLANK
        } else if let Some(saved) = saved {
            saved
        } else {
            let mut defaults = BurnFlags::EJECT | BurnFlags::BURNPROOF;
            if matches!(
                self.session.input,
                InputType::Data | InputType::Disc { .. } | InputType::Image { .. }
            ) {
                defaults |= BurnFlags::NO_TMP_FILES;
            }
            defaults
        };

        Some(self.negotiate(flags))
    }

    /// Re-run negotiation on the flags currently set
    fn check_drive_settings(&mut self) -> NegotiationOutcome {
        let mut flags = self.session.flags();
        if self.session.same_src_dest_drive() {
            flags |= BurnFlags::BLANK_BEFORE_WRITE | BurnFlags::FAST_BLANK;
        }
        self.negotiate(flags)
    }

    /// Input kind changed by the state machine itself
    fn replace_input(&mut self, input: InputType) {
        self.configuring = true;
        self.set_input_type(input);
        self.configuring = false;
    }

    /// Input and output can be handled by some backend. May drop CD-TEXT from an
    /// audio input (or restore it) and record that in `cd_text_modified`.
    fn check_input_output(&mut self, source: &mut InputType) -> bool {
        if self.cd_text_modified {
            // a backend able to write CD-TEXT may have appeared since
            let with_cd_text = source.with_cd_text(true);
            if self.caps.is_input_supported(&self.session, &with_cd_text) {
                self.cd_text_modified = false;
                *source = with_cd_text;
                self.replace_input(source.clone());
                return true;
            }

            *source = source.with_cd_text(false);
            return self.caps.is_input_supported(&self.session, source);
        }

        debug!("Testing media support");
        let supported = self.caps.is_session_supported(&self.session);
        if supported || !source.has_cd_text() {
            return supported;
        }

        let without = source.with_cd_text(false);
        let supported = self.caps.is_input_supported(&self.session, &without);
        debug!("Tested support without CD-TEXT: {}", supported);
        if supported {
            self.cd_text_modified = true;
            *source = without;
            self.replace_input(source.clone());
        }
        supported
    }

    /// Run the check sequence. `update` reloads saved drive properties, `check`
    /// re-checks the flags already set.
    fn update(&mut self, update: bool, check: bool) {
        if self.configuring {
            debug!("Ignoring change while configuring flags");
            return;
        }

        let mut source = self.session.input.clone();
        match &source {
            InputType::None => return self.set_validity(SessionError::NotSupported),
            InputType::Disc { media } if media.is_empty() => {
                return self.set_validity(SessionError::NoInputMedium)
            }
            InputType::Image { format } if *format == ImageFormat::None => {
                let has_uri = self
                    .session
                    .tracks
                    .first()
                    .and_then(Track::image_uri)
                    .is_some();
                let outcome = if has_uri {
                    SessionError::UnknownImage
                } else {
                    SessionError::NoInputImage
                };
                return self.set_validity(outcome);
            }
            _ => {}
        }

        let Some(fake) = self.session.burner().map(|b| b.fake) else {
            return self.set_validity(SessionError::NoOutput);
        };

        if !self.check_input_output(&mut source) {
            let protected = matches!(
                &source,
                InputType::Disc { media } if media.contains(MediumStatus::PROTECTED)
            );
            let outcome = if protected && !self.caps.is_track_type_supported(&source) {
                SessionError::DiscProtected
            } else {
                SessionError::NotSupported
            };
            return self.set_validity(outcome);
        }

        self.configuring = true;
        if fake {
            self.session.remove_flags(BurnFlags::NOT_FOR_FILE_OUTPUT);
        }
        let negotiation = if update {
            self.set_drive_properties()
        } else if check {
            Some(self.check_drive_settings())
        } else {
            None
        };
        self.configuring = false;

        if negotiation == Some(NegotiationOutcome::NotRun) {
            info!("Flag negotiation could not run");
            return self.set_validity(SessionError::NotSupported);
        }

        if self.session.same_src_dest_drive() {
            return self.set_validity(SessionError::Valid);
        }

        let outcome = check_size(&self.session, self.support.supported);
        self.set_validity(outcome);
    }
}
