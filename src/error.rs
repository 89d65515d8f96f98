//! Error types for the Kryon layout engine

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LayoutError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unknown element: {name}")]
    UnknownElement { name: String },

    #[error("Unknown property: {name}")]
    UnknownProperty { name: String },

    #[error("Unknown property block: {id:#018x}")]
    UnknownBlock { id: u64 },

    #[error("Element '{element}' is missing required block '{block}'")]
    MissingRequiredBlock { element: String, block: String },

    #[error("Invalid value '{value}' for property '{property}': {message}")]
    InvalidValue {
        property: String,
        value: String,
        message: String,
    },

    #[error("Unresolved reference property '{reference}' for '{property}'")]
    UnresolvedReference { property: String, reference: String },

    #[error("Duplicate property block {id:#018x}")]
    DuplicateBlock { id: u64 },

    #[error("Property blocks out of order: {previous:#018x} before {next:#018x}")]
    UnorderedBlocks { previous: u64, next: u64 },

    #[error("Buffer truncated: expected {expected} bytes, found {actual}")]
    Truncated { expected: usize, actual: usize },

    #[error("No behavior registered for element {id:#018x}")]
    MissingBehavior { id: u64 },

    #[error("Mesh needs {vertices} vertices, more than 16-bit indices can address")]
    IndexOverflow { vertices: usize },

    #[error("Registry error: {message}")]
    Registry { message: String },

    #[error("Worker pool error: {message}")]
    Worker { message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    #[error("Invalid format: {message}")]
    InvalidFormat { message: String },
}

pub type Result<T> = std::result::Result<T, LayoutError>;

impl LayoutError {
    pub fn invalid_value(
        property: impl Into<String>,
        value: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            property: property.into(),
            value: value.into(),
            message: message.into(),
        }
    }

    pub fn registry(message: impl Into<String>) -> Self {
        Self::Registry {
            message: message.into(),
        }
    }

    pub fn invalid_format(message: impl Into<String>) -> Self {
        Self::InvalidFormat {
            message: message.into(),
        }
    }

    pub fn unknown_property(name: impl Into<String>) -> Self {
        Self::UnknownProperty { name: name.into() }
    }

    pub fn unknown_element(name: impl Into<String>) -> Self {
        Self::UnknownElement { name: name.into() }
    }

    /// True for errors raised by the producer while authoring buffers, as
    /// opposed to format integrity violations.
    pub fn is_producer_error(&self) -> bool {
        matches!(
            self,
            Self::UnknownElement { .. }
                | Self::UnknownProperty { .. }
                | Self::MissingRequiredBlock { .. }
                | Self::InvalidValue { .. }
                | Self::UnresolvedReference { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = LayoutError::invalid_value("margin", "4qq", "unknown unit 'qq'");
        assert_eq!(
            err.to_string(),
            "Invalid value '4qq' for property 'margin': unknown unit 'qq'"
        );
        assert!(err.is_producer_error());

        let err = LayoutError::DuplicateBlock { id: 0x10 };
        assert_eq!(err.to_string(), "Duplicate property block 0x0000000000000010");
        assert!(!err.is_producer_error());
    }
}
