use thiserror::Error;

/// Result alias used by every fallible pool operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Plain classification of an [`Error`], handy for `match`/`assert_eq!`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
  NoMemory,
  NoPages,
  MultipleFree,
  BadBoundary,
  CorruptedBlock,
  Config,
}

/// Failures surfaced by [`ObjectAllocator`](crate::ObjectAllocator).
///
/// None of them is retried internally. When one is returned the allocator is
/// left exactly as it was before the call.
#[derive(Error, Debug)]
pub enum Error {
  /// The raw memory source could not hand out `requested` bytes.
  #[error("out of memory: raw allocation of {requested} bytes failed")]
  NoMemory { requested: usize },

  /// The free list is empty and `max_pages` pages already exist.
  #[error("out of pages: all {max_pages} pages are in use")]
  NoPages { max_pages: usize },

  /// The address is already on the free list.
  #[error("object {address:#x} was already freed")]
  MultipleFree { address: usize },

  /// The address is not the start of an object inside a managed page.
  #[error("object {address:#x} is not on a block boundary")]
  BadBoundary { address: usize },

  /// A pad byte around the object no longer holds the pad pattern.
  #[error("block at {address:#x} is corrupted ({side} pad overwritten)")]
  CorruptedBlock { address: usize, side: PadSide },

  #[error(transparent)]
  Config(#[from] ConfigError),
}

/// Which guard region of a block failed verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PadSide {
  Left,
  Right,
}

impl std::fmt::Display for PadSide {
  fn fmt(
    &self,
    f: &mut std::fmt::Formatter<'_>,
  ) -> std::fmt::Result {
    match self {
      PadSide::Left => f.write_str("left"),
      PadSide::Right => f.write_str("right"),
    }
  }
}

/// Rejected configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
  #[error("object size must be positive")]
  ZeroObjectSize,

  #[error("objects per page must be positive")]
  ZeroObjectsPerPage,

  #[error("failed to parse config: {0}")]
  Parse(#[from] toml::de::Error),
}

impl Error {
  pub fn kind(&self) -> ErrorKind {
    match self {
      Error::NoMemory { .. } => ErrorKind::NoMemory,
      Error::NoPages { .. } => ErrorKind::NoPages,
      Error::MultipleFree { .. } => ErrorKind::MultipleFree,
      Error::BadBoundary { .. } => ErrorKind::BadBoundary,
      Error::CorruptedBlock { .. } => ErrorKind::CorruptedBlock,
      Error::Config(_) => ErrorKind::Config,
    }
  }
}
