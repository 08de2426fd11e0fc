//! Error types for the packing engine.

use thiserror::Error;

/// Failure modes of [`Packer::pack`](crate::packer::Packer::pack).
///
/// None of them are retryable without changing the input. When
/// `UnfitItemsExist` is returned the bins still hold every item that was
/// packed, and the packer's unfit list holds the rest.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PackError {
    #[error("no bins in packer")]
    NoBins,

    #[error("no items in packer")]
    NoItems,

    /// The largest item exceeds the largest bin, or the items' total volume
    /// exceeds the bins' total volume.
    #[error("invalid bins volume")]
    InvalidBinsVolume,

    #[error("unfit items existing ({count} item(s) could not be placed)")]
    UnfitItemsExist { count: usize },
}

impl PackError {
    /// Stable machine-readable code used in API responses.
    pub fn code(&self) -> &'static str {
        match self {
            PackError::NoBins => "no_bins",
            PackError::NoItems => "no_items",
            PackError::InvalidBinsVolume => "invalid_bins_volume",
            PackError::UnfitItemsExist { .. } => "unfit_items_exist",
        }
    }
}

/// Validation error for item and bin data.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Invalid dimension: {0}")]
    InvalidDimension(String),

    #[error("Invalid weight: {0}")]
    InvalidWeight(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_match_legacy_wording() {
        assert_eq!(PackError::NoBins.to_string(), "no bins in packer");
        assert_eq!(PackError::NoItems.to_string(), "no items in packer");
        assert_eq!(PackError::InvalidBinsVolume.to_string(), "invalid bins volume");
        assert!(
            PackError::UnfitItemsExist { count: 2 }
                .to_string()
                .starts_with("unfit items existing")
        );
    }

    #[test]
    fn codes_are_snake_case() {
        assert_eq!(PackError::UnfitItemsExist { count: 1 }.code(), "unfit_items_exist");
        assert_eq!(PackError::InvalidBinsVolume.code(), "invalid_bins_volume");
    }
}
