use crate::error::{Error, Result};

#[derive(Clone, Debug)]
pub struct DepthTracker {
    depth: usize,
    max: usize,
}

impl DepthTracker {
    /// Create a new depth tracker that allows up to `max` nested containers.
    pub fn new(max: usize) -> Self {
        Self { depth: 0, max }
    }

    /// Enter a container. Fails if that would nest deeper than allowed.
    pub fn enter(&mut self) -> Result<()> {
        if self.depth >= self.max {
            return Err(Error::DepthLimit { max: self.max });
        }
        self.depth += 1;
        Ok(())
    }

    /// Leave the container most recently entered.
    pub fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    pub fn depth(&self) -> usize {
        self.depth
    }
}
