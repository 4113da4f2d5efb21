use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EncoderError {
    #[error("unknown identifier: '{id}'")]
    UnknownIdentifier { id: String },

    #[error("code {index} out of range for encoder with {cardinality} classes")]
    IndexOutOfRange { index: u32, cardinality: usize },

    #[error("encoder has {cardinality} classes, more than a u32 code can address")]
    TooManyClasses { cardinality: usize },

    #[error("encoder classes are not strictly ascending at position {position}")]
    UnsortedClasses { position: usize },
}
