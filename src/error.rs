use thiserror::Error;

pub type Result<T> = std::result::Result<T, RustBurnError>;

#[derive(Error, Debug)]
pub enum RustBurnError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// OS level pass-through failure (errno on unix, Win32 error code on windows)
    #[error("SCSI transport error (os error {code}): {message}")]
    ScsiTransport { code: i32, message: String },

    /// The drive completed the command with CHECK CONDITION
    #[error("SCSI device reported failure: {0}")]
    ScsiDevice(String),

    #[error("SCSI operation error: {0}")]
    Scsi(String),

    #[error("Unsupported: {0}")]
    Unsupported(String),

    #[error("System error: {0}")]
    System(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Burn capabilities error: {0}")]
    Caps(String),

    #[error("Preference store error: {0}")]
    Preferences(String),

    #[error("Parameter validation error: {0}")]
    ParameterValidation(String),

    #[error("Generic error: {0}")]
    Generic(#[from] anyhow::Error),
}

impl RustBurnError {
    pub fn scsi_transport<T: Into<String>>(code: i32, msg: T) -> Self {
        Self::ScsiTransport {
            code,
            message: msg.into(),
        }
    }

    pub fn scsi_device<T: Into<String>>(msg: T) -> Self {
        Self::ScsiDevice(msg.into())
    }

    pub fn scsi<T: Into<String>>(msg: T) -> Self {
        Self::Scsi(msg.into())
    }

    pub fn unsupported<T: Into<String>>(msg: T) -> Self {
        Self::Unsupported(msg.into())
    }

    pub fn system<T: Into<String>>(msg: T) -> Self {
        Self::System(msg.into())
    }

    pub fn parse<T: Into<String>>(msg: T) -> Self {
        Self::Parse(msg.into())
    }

    pub fn caps<T: Into<String>>(msg: T) -> Self {
        Self::Caps(msg.into())
    }

    pub fn preferences<T: Into<String>>(msg: T) -> Self {
        Self::Preferences(msg.into())
    }

    pub fn parameter_validation<T: Into<String>>(msg: T) -> Self {
        Self::ParameterValidation(msg.into())
    }

    /// True for failures raised by the pass-through layer itself
    /// (OS error or device CHECK CONDITION).
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::ScsiTransport { .. } | Self::ScsiDevice(_))
    }
}
