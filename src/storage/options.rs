/// Options controlling link stream encoding and decoding.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CodecOptions {
    /// Upper bound on links per chain; longer streams are rejected as corrupt.
    pub max_links: Option<usize>,
    /// Whether to run the chain invariant check after a successful load.
    pub verify_after_load: bool,
    /// Whether flower files carry a CRC32 footer.
    pub checksum: bool,
}

impl Default for CodecOptions {
    fn default() -> Self {
        Self {
            max_links: None,
            verify_after_load: true,
            checksum: true,
        }
    }
}

impl CodecOptions {
    /// Creates options with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Limits the number of links accepted per chain.
    pub fn max_links(mut self, limit: usize) -> Self {
        self.max_links = Some(limit);
        self
    }

    /// Enables or disables the post-load invariant check.
    pub fn verify_after_load(mut self, enabled: bool) -> Self {
        self.verify_after_load = enabled;
        self
    }

    /// Enables or disables the flower file checksum footer.
    pub fn checksum(mut self, enabled: bool) -> Self {
        self.checksum = enabled;
        self
    }
}
