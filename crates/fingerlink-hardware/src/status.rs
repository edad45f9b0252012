//! Sensor status codes.
//!
//! The fingerprint sensor answers every command with a one-byte confirmation
//! code. `0x00` means success; everything else is mapped onto [`StatusCode`],
//! which is used as the error side of all sensor operations so the exact
//! code survives up to the reporting layer and the logs.

use serde::{Deserialize, Serialize};

/// Result type alias for sensor operations.
pub type SensorResult<T> = std::result::Result<T, StatusCode>;

/// Raw confirmation code for success.
pub const CODE_OK: u8 = 0x00;

/// Non-success confirmation code returned by the sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, thiserror::Error)]
pub enum StatusCode {
    /// Error while receiving the response packet.
    #[error("PACKET (0x01)")]
    PacketReceive,

    /// No finger on the sensor window.
    #[error("NOFINGER (0x02)")]
    NoFinger,

    /// Image capture failed.
    #[error("IMAGEFAIL (0x03)")]
    ImageFail,

    /// Image too messy to extract features.
    #[error("IMAGEMESS (0x06)")]
    ImageMess,

    /// Not enough feature points in the image.
    #[error("FEATFAIL (0x07)")]
    FeatureFail,

    /// Search or compare did not match.
    #[error("NOMATCH (0x08)")]
    NoMatch,

    /// No template matched in the library search.
    #[error("NOTFOUND (0x09)")]
    NotFound,

    /// The two captures could not be combined into a model.
    #[error("ENROLLMIS (0x0A)")]
    EnrollMismatch,

    /// Slot outside of the template library.
    #[error("BADLOC (0x0B)")]
    BadLocation,

    /// Template deletion failed.
    #[error("DELFAIL (0x10)")]
    DeleteFail,

    /// No valid primary image in the buffer.
    #[error("INVALIDIMG (0x15)")]
    InvalidImage,

    /// Writing to the sensor flash failed.
    #[error("FLASHERR (0x18)")]
    FlashError,

    /// The sensor did not answer in time.
    #[error("TIMEOUT (0xFF)")]
    Timeout,

    /// Any code without a dedicated variant.
    #[error("UNKNOWN (0x{0:02X})")]
    Other(u8),
}

/// Coarse classification of a status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusClass {
    /// No finger, image quality or timeout. Retried locally by the caller.
    Transient,
    /// Communication or flash failure. Surfaced immediately.
    Device,
    /// A well-formed negative answer (no match, mismatch, bad slot).
    Outcome,
}

impl StatusCode {
    /// Map a raw confirmation code to a status.
    ///
    /// Returns `Ok(())` for [`CODE_OK`].
    ///
    /// # Examples
    ///
    /// ```
    /// use fingerlink_hardware::StatusCode;
    ///
    /// assert_eq!(StatusCode::check(0x00), Ok(()));
    /// assert_eq!(StatusCode::check(0x02), Err(StatusCode::NoFinger));
    /// assert_eq!(StatusCode::check(0x42), Err(StatusCode::Other(0x42)));
    /// ```
    pub fn check(code: u8) -> SensorResult<()> {
        match code {
            CODE_OK => Ok(()),
            other => Err(Self::from_code(other)),
        }
    }

    /// Map a non-zero raw code to a status.
    #[must_use]
    pub fn from_code(code: u8) -> Self {
        match code {
            0x01 => Self::PacketReceive,
            0x02 => Self::NoFinger,
            0x03 => Self::ImageFail,
            0x06 => Self::ImageMess,
            0x07 => Self::FeatureFail,
            0x08 => Self::NoMatch,
            0x09 => Self::NotFound,
            0x0A => Self::EnrollMismatch,
            0x0B => Self::BadLocation,
            0x10 => Self::DeleteFail,
            0x15 => Self::InvalidImage,
            0x18 => Self::FlashError,
            0xFF => Self::Timeout,
            other => Self::Other(other),
        }
    }

    /// Raw confirmation code.
    #[must_use]
    pub fn code(&self) -> u8 {
        match self {
            Self::PacketReceive => 0x01,
            Self::NoFinger => 0x02,
            Self::ImageFail => 0x03,
            Self::ImageMess => 0x06,
            Self::FeatureFail => 0x07,
            Self::NoMatch => 0x08,
            Self::NotFound => 0x09,
            Self::EnrollMismatch => 0x0A,
            Self::BadLocation => 0x0B,
            Self::DeleteFail => 0x10,
            Self::InvalidImage => 0x15,
            Self::FlashError => 0x18,
            Self::Timeout => 0xFF,
            Self::Other(code) => *code,
        }
    }

    /// Short mnemonic used in logs and diagnostic screens.
    #[must_use]
    pub fn mnemonic(&self) -> &'static str {
        match self {
            Self::PacketReceive => "PACKET",
            Self::NoFinger => "NOFINGER",
            Self::ImageFail => "IMAGEFAIL",
            Self::ImageMess => "IMAGEMESS",
            Self::FeatureFail => "FEATFAIL",
            Self::NoMatch => "NOMATCH",
            Self::NotFound => "NOTFOUND",
            Self::EnrollMismatch => "ENROLLMIS",
            Self::BadLocation => "BADLOC",
            Self::DeleteFail => "DELFAIL",
            Self::InvalidImage => "INVALIDIMG",
            Self::FlashError => "FLASHERR",
            Self::Timeout => "TIMEOUT",
            Self::Other(_) => "UNKNOWN",
        }
    }

    #[must_use]
    pub fn class(&self) -> StatusClass {
        match self {
            Self::NoFinger
            | Self::ImageFail
            | Self::ImageMess
            | Self::FeatureFail
            | Self::InvalidImage
            | Self::Timeout => StatusClass::Transient,
            Self::NoMatch | Self::NotFound | Self::EnrollMismatch | Self::BadLocation => {
                StatusClass::Outcome
            }
            Self::PacketReceive | Self::DeleteFail | Self::FlashError | Self::Other(_) => {
                StatusClass::Device
            }
        }
    }

    /// Whether a local retry can reasonably succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        self.class() == StatusClass::Transient
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0x01, StatusCode::PacketReceive, "PACKET")]
    #[case(0x02, StatusCode::NoFinger, "NOFINGER")]
    #[case(0x03, StatusCode::ImageFail, "IMAGEFAIL")]
    #[case(0x06, StatusCode::ImageMess, "IMAGEMESS")]
    #[case(0x07, StatusCode::FeatureFail, "FEATFAIL")]
    #[case(0x09, StatusCode::NotFound, "NOTFOUND")]
    #[case(0x0A, StatusCode::EnrollMismatch, "ENROLLMIS")]
    #[case(0x0B, StatusCode::BadLocation, "BADLOC")]
    #[case(0x15, StatusCode::InvalidImage, "INVALIDIMG")]
    #[case(0x18, StatusCode::FlashError, "FLASHERR")]
    #[case(0xFF, StatusCode::Timeout, "TIMEOUT")]
    fn test_code_mapping(#[case] raw: u8, #[case] status: StatusCode, #[case] mnemonic: &str) {
        assert_eq!(StatusCode::from_code(raw), status);
        assert_eq!(status.code(), raw);
        assert_eq!(status.mnemonic(), mnemonic);
    }

    #[test]
    fn test_unknown_code_keeps_raw_value() {
        let status = StatusCode::from_code(0x42);
        assert_eq!(status, StatusCode::Other(0x42));
        assert_eq!(status.code(), 0x42);
        assert_eq!(status.to_string(), "UNKNOWN (0x42)");
    }

    #[test]
    fn test_display_includes_code() {
        assert_eq!(StatusCode::FlashError.to_string(), "FLASHERR (0x18)");
        assert_eq!(StatusCode::NoFinger.to_string(), "NOFINGER (0x02)");
    }

    #[rstest]
    #[case(StatusCode::NoFinger, StatusClass::Transient)]
    #[case(StatusCode::ImageMess, StatusClass::Transient)]
    #[case(StatusCode::Timeout, StatusClass::Transient)]
    #[case(StatusCode::PacketReceive, StatusClass::Device)]
    #[case(StatusCode::FlashError, StatusClass::Device)]
    #[case(StatusCode::NotFound, StatusClass::Outcome)]
    #[case(StatusCode::BadLocation, StatusClass::Outcome)]
    fn test_classification(#[case] status: StatusCode, #[case] class: StatusClass) {
        assert_eq!(status.class(), class);
        assert_eq!(status.is_transient(), class == StatusClass::Transient);
    }
}
