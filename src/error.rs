use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CounterpointError {
    /// Empty or malformed note sequences handed to the validator.
    ///
    /// Always caller-recoverable; hosts should answer it like a bad request.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A pitch outside the MIDI range 0..=127.
    #[error("Invalid pitch {0}: expected a MIDI note number between 0 and 127")]
    InvalidPitch(i32),

    #[error("Invalid species {0}: expected 1 through 5")]
    InvalidSpecies(i64),

    #[error("MusicXML parse error: {0}")]
    Parse(String),

    #[error("Unknown cantus firmus: {0}")]
    UnknownCantus(String),

    #[error("Invalid key: {0}")]
    InvalidKey(String),
}

pub type Result<T> = std::result::Result<T, CounterpointError>;
