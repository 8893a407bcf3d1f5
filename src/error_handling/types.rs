use std::fmt;

#[derive(Debug)]
pub enum ConfigError {
    IoError(std::io::Error),
    TomlError(String),
    EmptyDevice,
    InvalidSnapshotLength(i32),
    InvalidReadTimeout,
    InvalidBacklog,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {}", e),
            ConfigError::TomlError(e) => write!(f, "TOML parsing error: {}", e),
            ConfigError::EmptyDevice => write!(f, "Capture device name is empty"),
            ConfigError::InvalidSnapshotLength(n) => {
                write!(f, "Snapshot length must be positive, got {}", n)
            }
            ConfigError::InvalidReadTimeout => write!(f, "Read timeout must be at least 1ms"),
            ConfigError::InvalidBacklog => write!(f, "Subscriber backlog must be at least 1"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::IoError(err)
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::TomlError(err.to_string())
    }
}

#[derive(Debug)]
pub enum CaptureError {
    Open { device: String, reason: String },
    FrameRead(String),
    DeviceList(String),
    StorageError(StoreError),
}

impl fmt::Display for CaptureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureError::Open { device, reason } => {
                write!(f, "Unable to open capture on {}: {}", device, reason)
            }
            CaptureError::FrameRead(e) => write!(f, "Frame read error: {}", e),
            CaptureError::DeviceList(e) => write!(f, "Unable to list capture devices: {}", e),
            CaptureError::StorageError(e) => write!(f, "Capture storage error: {}", e),
        }
    }
}

impl std::error::Error for CaptureError {}

impl From<StoreError> for CaptureError {
    fn from(err: StoreError) -> Self {
        CaptureError::StorageError(err)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    NotFound(u64),
    LockPoisoned,
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::NotFound(id) => write!(f, "Packet {} not found", id),
            StoreError::LockPoisoned => write!(f, "Packet store lock poisoned"),
        }
    }
}

impl std::error::Error for StoreError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    NotFound(u64),
    StorageError(StoreError),
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryError::NotFound(id) => write!(f, "Packet {} does not exist", id),
            QueryError::StorageError(e) => write!(f, "Query storage error: {}", e),
        }
    }
}

impl std::error::Error for QueryError {}

impl From<StoreError> for QueryError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => QueryError::NotFound(id),
            other => QueryError::StorageError(other),
        }
    }
}

#[derive(Debug)]
pub enum WebError {
    ServerStopped(String),
}

impl fmt::Display for WebError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WebError::ServerStopped(e) => write!(f, "Web server stopped: {}", e),
        }
    }
}

impl std::error::Error for WebError {}

#[derive(Debug)]
pub enum ControllerError {
    ConfigurationError(ConfigError),
    CaptureError(CaptureError),
    WebError(WebError),
    TaskFailed(String),
}

impl fmt::Display for ControllerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControllerError::ConfigurationError(e) => write!(f, "Configuration error: {}", e),
            ControllerError::CaptureError(e) => write!(f, "Capture error: {}", e),
            ControllerError::WebError(e) => write!(f, "Web error: {}", e),
            ControllerError::TaskFailed(e) => write!(f, "Task failed: {}", e),
        }
    }
}

impl std::error::Error for ControllerError {}

impl From<ConfigError> for ControllerError {
    fn from(err: ConfigError) -> Self {
        ControllerError::ConfigurationError(err)
    }
}

impl From<CaptureError> for ControllerError {
    fn from(err: CaptureError) -> Self {
        ControllerError::CaptureError(err)
    }
}

impl From<WebError> for ControllerError {
    fn from(err: WebError) -> Self {
        ControllerError::WebError(err)
    }
}
