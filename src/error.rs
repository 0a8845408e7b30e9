//! Error types for the soil_colorscan library

use thiserror::Error;

/// Result type alias for soil_colorscan operations
pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Error types for calibration, sampling and classification
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// Image buffer or file could not be decoded into pixels
    #[error("Failed to decode image: {message}")]
    ImageDecode {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Too few chart patches survived the validity bands
    #[error("Insufficient calibration patches: {valid} valid (minimum {required})")]
    InsufficientPatches { valid: usize, required: usize },

    /// Strict mode refuses to correct colors without a committed calibration
    #[error("Calibration required before colors can be corrected")]
    CalibrationRequired,

    /// Key-value store read or write failed
    #[error("Persistence error: {message}")]
    Persistence {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Invalid input parameters
    #[error("Invalid parameter: {parameter} = {value}")]
    InvalidParameter { parameter: String, value: String },

    /// Calibration state machine was driven out of order
    #[error("Cannot {action} while calibration is {from}")]
    InvalidTransition { from: String, action: &'static str },
}

impl AnalysisError {
    /// Create an image decode error with context
    pub fn image_decode<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::ImageDecode {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a persistence error with context
    pub fn persistence<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Persistence {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub(crate) fn invalid_parameter(parameter: &str, value: impl ToString) -> Self {
        Self::InvalidParameter {
            parameter: parameter.to_string(),
            value: value.to_string(),
        }
    }

    /// Check if this error indicates a condition the user can fix by retrying
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            AnalysisError::InsufficientPatches { .. }
                | AnalysisError::CalibrationRequired
                | AnalysisError::ImageDecode { .. }
        )
    }

    /// Get user-friendly error description for application display
    pub fn user_message(&self) -> String {
        match self {
            AnalysisError::ImageDecode { .. } => {
                "Could not read the photo. Please take or choose another picture.".to_string()
            }
            AnalysisError::InsufficientPatches { valid, required } => {
                format!(
                    "Only {} of the chart colors could be measured (at least {} are needed). \
                     Photograph the whole chart under even lighting and try again.",
                    valid, required
                )
            }
            AnalysisError::CalibrationRequired => {
                "Calibrate the camera with the reference chart before measuring soil color."
                    .to_string()
            }
            AnalysisError::Persistence { .. } => {
                "Calibration settings could not be saved or loaded.".to_string()
            }
            _ => "Color analysis failed. Please try again.".to_string(),
        }
    }
}
