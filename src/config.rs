use serde::{Deserialize, Serialize};

use crate::{align::WORD, error::ConfigError};

/// Per-block metadata stored in front of each object's pad bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum HeaderBlock {
  #[default]
  None,
  /// `[alloc number: u32][in use: u8]`
  Basic,
  /// `[additional bytes][reuse count: u16][alloc number: u32][in use: u8]`
  Extended { additional: usize },
  /// One word inline; label and flags live in an allocator-owned record.
  External,
}

pub const BASIC_HEADER_SIZE: usize = 4 + 1;
pub const EXTENDED_HEADER_FIXED: usize = 2 + 4 + 1;
pub const EXTERNAL_HEADER_SIZE: usize = WORD;

impl HeaderBlock {
  /// Bytes the header occupies inside every block.
  pub fn size(&self) -> usize {
    match *self {
      HeaderBlock::None => 0,
      HeaderBlock::Basic => BASIC_HEADER_SIZE,
      HeaderBlock::Extended { additional } => additional + EXTENDED_HEADER_FIXED,
      HeaderBlock::External => EXTERNAL_HEADER_SIZE,
    }
  }

  /// Caller-defined bytes at the front of an extended header.
  pub fn additional(&self) -> usize {
    match *self {
      HeaderBlock::Extended { additional } => additional,
      _ => 0,
    }
  }
}

/// Pool configuration.
///
/// Everything is fixed at construction. `left_align` and `inter_align` are
/// filled in by the allocator and ignored on input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
  pub use_fallback_allocator: bool,
  pub objects_per_page: usize,
  pub max_pages: usize,
  pub debug_on: bool,
  pub pad_bytes: usize,
  pub header: HeaderBlock,
  /// `0` and `1` disable alignment.
  pub alignment: usize,
  #[serde(skip)]
  pub left_align: usize,
  #[serde(skip)]
  pub inter_align: usize,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      use_fallback_allocator: false,
      objects_per_page: 4,
      max_pages: 3,
      debug_on: false,
      pad_bytes: 0,
      header: HeaderBlock::None,
      alignment: 0,
      left_align: 0,
      inter_align: 0,
    }
  }
}

impl Config {
  pub fn new() -> Self {
    Self::default()
  }

  /// Parses a configuration from TOML. Missing keys take their defaults.
  ///
  /// ```rust
  /// use objalloc::{Config, HeaderBlock};
  ///
  /// let config = Config::from_toml_str(
  ///   r#"
  ///   objects_per_page = 8
  ///   debug_on = true
  ///
  ///   [header]
  ///   kind = "extended"
  ///   additional = 3
  ///   "#,
  /// )
  /// .unwrap();
  ///
  /// assert_eq!(config.objects_per_page, 8);
  /// assert_eq!(config.header, HeaderBlock::Extended { additional: 3 });
  /// ```
  pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
    Ok(toml::from_str(content)?)
  }

  pub fn with_objects_per_page(
    mut self,
    objects_per_page: usize,
  ) -> Self {
    self.objects_per_page = objects_per_page;
    self
  }

  pub fn with_max_pages(
    mut self,
    max_pages: usize,
  ) -> Self {
    self.max_pages = max_pages;
    self
  }

  pub fn with_debug(
    mut self,
    debug_on: bool,
  ) -> Self {
    self.debug_on = debug_on;
    self
  }

  pub fn with_pad_bytes(
    mut self,
    pad_bytes: usize,
  ) -> Self {
    self.pad_bytes = pad_bytes;
    self
  }

  pub fn with_header(
    mut self,
    header: HeaderBlock,
  ) -> Self {
    self.header = header;
    self
  }

  pub fn with_alignment(
    mut self,
    alignment: usize,
  ) -> Self {
    self.alignment = alignment;
    self
  }

  pub fn with_fallback_allocator(
    mut self,
    use_fallback_allocator: bool,
  ) -> Self {
    self.use_fallback_allocator = use_fallback_allocator;
    self
  }

  pub(crate) fn validate(
    &self,
    object_size: usize,
  ) -> Result<(), ConfigError> {
    if object_size == 0 {
      return Err(ConfigError::ZeroObjectSize);
    }
    if self.objects_per_page == 0 {
      return Err(ConfigError::ZeroObjectsPerPage);
    }
    Ok(())
  }
}
