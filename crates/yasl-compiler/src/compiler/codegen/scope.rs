//! Scope tables mapping variable names to one-byte slots.
//!
//! Globals are numbered upwards from 0 in declaration order. In a function
//! frame, parameters count down from 254 and locals count up from the
//! parameter count, so the two never meet inside the one-byte operand.

use rustc_hash::FxHashMap;

use crate::error::{Error, Result};

/// Highest slot a parameter can take.
pub const TOP_SLOT: u8 = u8::MAX - 1;

/// Which address space a scope allocates in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    /// The module-wide global table
    Global,
    /// One function's call frame
    Local,
}

/// A single frame of names.
#[derive(Debug, Clone)]
pub struct Scope {
    kind: ScopeKind,
    slots: FxHashMap<String, u8>,
    params: usize,
}

impl Scope {
    /// Creates the global frame.
    pub fn global() -> Self {
        Self {
            kind: ScopeKind::Global,
            slots: FxHashMap::default(),
            params: 0,
        }
    }

    /// Creates an empty function frame.
    pub fn local() -> Self {
        Self {
            kind: ScopeKind::Local,
            slots: FxHashMap::default(),
            params: 0,
        }
    }

    /// Returns the kind of this frame.
    pub fn kind(&self) -> ScopeKind {
        self.kind
    }

    /// Declares a variable, returning its slot.
    ///
    /// A name that is already declared keeps its slot.
    pub fn declare(&mut self, name: &str, line: usize) -> Result<u8> {
        if let Some(slot) = self.lookup(name) {
            return Ok(slot);
        }

        let next = self.slots.len();
        let slot = match self.kind {
            ScopeKind::Global => u8::try_from(next).ok(),
            // Locals stop below the lowest parameter slot
            ScopeKind::Local => u8::try_from(next)
                .ok()
                .filter(|&slot| usize::from(slot) < usize::from(TOP_SLOT) + 1 - self.params),
        };

        let slot = slot.ok_or_else(|| Error::SlotOverflow {
            name: name.to_string(),
            line,
        })?;
        self.slots.insert(name.to_string(), slot);
        Ok(slot)
    }

    /// Declares the next parameter of a function frame, returning its slot.
    ///
    /// Parameters must be declared before any local.
    pub fn declare_param(&mut self, name: &str, line: usize) -> Result<u8> {
        if self.contains(name) {
            return Err(Error::DuplicateParameter {
                name: name.to_string(),
                line,
            });
        }

        let slot = u8::try_from(self.params)
            .ok()
            .and_then(|index| TOP_SLOT.checked_sub(index))
            .ok_or_else(|| Error::SlotOverflow {
                name: name.to_string(),
                line,
            })?;
        self.slots.insert(name.to_string(), slot);
        self.params += 1;
        Ok(slot)
    }

    /// Returns the slot of `name`, if declared in this frame.
    pub fn lookup(&self, name: &str) -> Option<u8> {
        self.slots.get(name).copied()
    }

    /// Returns true if `name` is declared in this frame.
    pub fn contains(&self, name: &str) -> bool {
        self.slots.contains_key(name)
    }

    /// Returns the number of names declared in this frame.
    pub fn size(&self) -> usize {
        self.slots.len()
    }

    /// Returns the number of parameters declared in this frame.
    pub fn param_count(&self) -> usize {
        self.params
    }
}
