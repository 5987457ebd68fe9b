//! Tree walkers between the three value models.
//!
//! [`native`] maps native values to and from the intermediate model and
//! [`jsonable`] does the same for JSON-safe values. Every path goes through
//! the intermediate model.

pub mod jsonable;
pub mod native;

use crate::error::{Error, Result};

/// Default cap on container and tag nesting. Every walker recurses once per
/// level, so this has to fit a 2 MiB thread stack in unoptimized builds.
pub const DEFAULT_MAX_DEPTH: usize = 128;

/// Knobs shared by every conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConversionOptions {
    /// Deepest allowed nesting of containers and tags. Deeper input fails
    /// with [`Error::DepthLimitExceeded`].
    pub max_depth: usize,
}

impl Default for ConversionOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl ConversionOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

/// Nesting counter for one walk.
#[derive(Debug)]
pub(crate) struct Depth {
    current: usize,
    limit: usize,
}

impl Depth {
    pub(crate) fn new(options: &ConversionOptions) -> Self {
        Self {
            current: 0,
            limit: options.max_depth,
        }
    }

    pub(crate) fn enter(&mut self) -> Result<()> {
        if self.current >= self.limit {
            return Err(Error::DepthLimitExceeded { limit: self.limit });
        }
        self.current += 1;
        Ok(())
    }

    pub(crate) fn leave(&mut self) {
        self.current -= 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_overrides_default() {
        assert_eq!(ConversionOptions::default().max_depth, 128);
        assert_eq!(ConversionOptions::new().max_depth(8).max_depth, 8);
    }

    #[test]
    fn depth_counts_levels() {
        let mut depth = Depth::new(&ConversionOptions::new().max_depth(2));
        depth.enter().unwrap();
        depth.enter().unwrap();
        assert!(matches!(
            depth.enter(),
            Err(Error::DepthLimitExceeded { limit: 2 })
        ));
        depth.leave();
        depth.enter().unwrap();
    }
}
