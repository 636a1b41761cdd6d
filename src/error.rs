use std::fmt;

use thiserror::Error;

/// Cause and optional structured detail carried by every [`Error`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fault {
    pub cause: String,
    pub info: Vec<String>,
}

impl Fault {
    pub fn new(cause: impl Into<String>) -> Self {
        Self {
            cause: cause.into(),
            info: Vec::new(),
        }
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.cause)?;
        if !self.info.is_empty() {
            write!(f, " ({})", self.info.join(", "))?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Assertion,
    Runtime,
    Config,
    Web,
}

impl ErrorKind {
    fn header(self) -> &'static str {
        match self {
            Self::Assertion => "CHECK ERROR",
            Self::Runtime => "RUN-TIME ERROR",
            Self::Config => "CONFIG ERROR",
            Self::Web => "WEB ERROR",
        }
    }
}

/// Library error type for configuration engine operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Internal invariant violated; never expected in correct code.
    #[error("internal check failed: {0}")]
    Assertion(Fault),

    /// Unexpected failure of the environment or host-supplied data.
    #[error("run-time error: {0}")]
    Runtime(Fault),

    /// Expected, user-facing configuration problem.
    #[error("configuration error: {0}")]
    Config(Fault),

    /// A fetched resource was absent or malformed.
    #[error("web error: {0}")]
    Web(Fault),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    pub fn assertion(cause: impl Into<String>) -> Self {
        Self::Assertion(Fault::new(cause))
    }

    pub fn runtime(cause: impl Into<String>) -> Self {
        Self::Runtime(Fault::new(cause))
    }

    pub fn config(cause: impl Into<String>) -> Self {
        Self::Config(Fault::new(cause))
    }

    pub fn web(cause: impl Into<String>) -> Self {
        Self::Web(Fault::new(cause))
    }

    /// Appends one line of structured detail.
    pub fn with_info(mut self, item: impl fmt::Display) -> Self {
        self.fault_mut().info.push(item.to_string());
        self
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Assertion(_) => ErrorKind::Assertion,
            Self::Runtime(_) => ErrorKind::Runtime,
            Self::Config(_) => ErrorKind::Config,
            Self::Web(_) => ErrorKind::Web,
        }
    }

    pub fn fault(&self) -> &Fault {
        match self {
            Self::Assertion(fault)
            | Self::Runtime(fault)
            | Self::Config(fault)
            | Self::Web(fault) => fault,
        }
    }

    fn fault_mut(&mut self) -> &mut Fault {
        match self {
            Self::Assertion(fault)
            | Self::Runtime(fault)
            | Self::Config(fault)
            | Self::Web(fault) => fault,
        }
    }

    pub fn cause(&self) -> &str {
        &self.fault().cause
    }

    /// Assertion and run-time failures abort the operation in progress.
    pub fn is_fatal(&self) -> bool {
        matches!(self.kind(), ErrorKind::Assertion | ErrorKind::Runtime)
    }

    /// Human-readable message: category header, cause, then one line per detail item.
    pub fn text(&self) -> String {
        let fault = self.fault();
        let mut text = format!("{}\n{}\n", self.kind().header(), fault.cause);
        for item in &fault.info {
            text.push_str(item);
            text.push('\n');
        }
        text.trim().to_string()
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::runtime(err.to_string())
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Self::runtime(format!("invalid YAML: {err}"))
    }
}

/// Contract violations reported by the model crate are internal faults.
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::assertion(format!("{err:#}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_combines_header_cause_and_info() {
        let err = Error::config("'Padding' may not be greater than 20")
            .with_info("21")
            .with_info("second line");
        assert_eq!(
            err.text(),
            "CONFIG ERROR\n'Padding' may not be greater than 20\n21\nsecond line"
        );
        assert_eq!(err.kind(), ErrorKind::Config);
        assert!(!err.is_fatal());
    }

    #[test]
    fn io_errors_are_runtime() {
        let err: Error = std::io::Error::other("disk gone").into();
        assert_eq!(err.kind(), ErrorKind::Runtime);
        assert!(err.is_fatal());
        assert_eq!(Error::web("gone").text(), "WEB ERROR\ngone");
    }
}
