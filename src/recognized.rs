/// A field value that either maps to a variant of `T` or is kept as the raw
/// value read from the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Recognized<T, Raw = u8> {
    Known(T),
    Unknown(Raw),
}

impl<T, Raw> Recognized<T, Raw> {
    /// The raw value, if it had no typed meaning.
    pub fn unknown(&self) -> Option<&Raw> {
        match self {
            Recognized::Known(_) => None,
            Recognized::Unknown(raw) => Some(raw),
        }
    }

    /// The typed value, or `fallback` for an unrecognized raw value.
    pub fn unwrap_or(self, fallback: T) -> T {
        match self {
            Recognized::Known(t) => t,
            Recognized::Unknown(_) => fallback,
        }
    }
}
