/// Application error carrying the process exit code.
///
/// Exit codes:
/// - 2: input/configuration error (missing file, bad flag values)
/// - 3: insufficient data (nothing left to fit after cleaning)
/// - 4: numerical or output failure (rendering/export included)
#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    /// Input or configuration error.
    pub fn input(message: impl Into<String>) -> Self {
        Self::new(2, message)
    }

    /// All points filtered away, or fewer points than free parameters.
    pub fn insufficient_data(message: impl Into<String>) -> Self {
        Self::new(3, message)
    }

    /// Numerical or I/O failure while producing outputs.
    pub fn numerical(message: impl Into<String>) -> Self {
        Self::new(4, message)
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}
