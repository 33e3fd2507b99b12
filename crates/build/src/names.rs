//! Bounded pools of short replacement identifiers

use crate::error::{PackError, Result};

/// An ordered, finite sequence of replacement names handed out front to back
///
/// The same pool may be threaded through several renaming steps; each step
/// continues where the previous one stopped.
#[derive(Debug, Clone)]
pub struct NamePool {
    label: &'static str,
    names: Vec<String>,
    cursor: usize,
}

impl NamePool {
    pub fn new(label: &'static str, names: Vec<String>) -> Self {
        Self { label, names, cursor: 0 }
    }

    /// `za` through `zz`, shared by exported shader functions and shader-internal identifiers
    pub fn shader() -> Self {
        Self::new("shader", ('a'..='z').map(|c| format!("z{c}")).collect())
    }

    /// `a` through `z`, used for output file names
    pub fn files() -> Self {
        Self::new("files", ('a'..='z').map(String::from).collect())
    }

    pub fn remaining(&self) -> usize {
        self.names.len() - self.cursor
    }

    /// Takes the next `count` names
    ///
    /// # Errors
    /// `NamePoolExhausted` if fewer than `count` names are left. Nothing is consumed in that case.
    pub fn take(&mut self, count: usize) -> Result<Vec<String>> {
        if count > self.remaining() {
            return Err(PackError::NamePoolExhausted {
                pool: self.label,
                requested: count,
                available: self.remaining(),
            });
        }

        let taken = self.names[self.cursor..self.cursor + count].to_vec();
        self.cursor += count;
        Ok(taken)
    }
}
