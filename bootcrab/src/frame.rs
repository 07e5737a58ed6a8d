//! Call frames and their slot layout.
//!
//! A [`FrameDescriptor`] maps symbolic slot names to slot indices. A [`Frame`]
//! is the per-invocation storage built from a layout: one optional value per
//! slot plus the argument vector supplied by the caller.

use crate::value::Value;
use anyhow::{Result, bail};
use std::fmt;

/// Name of the slot holding the caller's stack pointer.
///
/// Shared between the runtime and every frame layout that hosts an init block.
pub const STACK_POINTER_SLOT: &str = "<stack pointer>";

/// Handle to a slot inside frames built from one layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameSlot {
    index: usize,
}

impl FrameSlot {
    pub fn index(&self) -> usize {
        self.index
    }
}

/// Slot lookup capability of a frame layout.
///
/// Implementations must be idempotent: looking up the same name twice yields
/// the same slot.
pub trait FrameLayout: Send + Sync {
    /// Find the slot registered under `name`.
    fn find_slot(&self, name: &str) -> Option<FrameSlot>;

    /// Number of slots a frame with this layout holds.
    fn slot_count(&self) -> usize;
}

/// Immutable ordered list of slot names.
#[derive(Debug, Clone, Default)]
pub struct FrameDescriptor {
    names: Vec<String>,
}

impl FrameDescriptor {
    /// Creates a descriptor with one slot per name, in order.
    ///
    /// # Returns
    /// * `Ok(FrameDescriptor)` - All names are distinct
    /// * `Err(anyhow::Error)` - If a name appears twice
    pub fn new<I, S>(names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut descriptor = FrameDescriptor::default();
        for name in names {
            let name = name.into();
            if descriptor.names.contains(&name) {
                bail!("Duplicate frame slot `{}`", name);
            }
            descriptor.names.push(name);
        }
        Ok(descriptor)
    }

    /// Name of the given slot, if it belongs to this descriptor.
    pub fn slot_name(&self, slot: FrameSlot) -> Option<&str> {
        self.names.get(slot.index).map(String::as_str)
    }
}

impl FrameLayout for FrameDescriptor {
    fn find_slot(&self, name: &str) -> Option<FrameSlot> {
        self.names
            .iter()
            .position(|candidate| candidate == name)
            .map(|index| FrameSlot { index })
    }

    fn slot_count(&self) -> usize {
        self.names.len()
    }
}

/// Per-invocation slot storage and arguments.
///
/// Each slot can either contain a value (Some) or be unset (None).
#[derive(Debug, Clone)]
pub struct Frame {
    slots: Vec<Option<Value>>,
    arguments: Vec<Value>,
}

impl Frame {
    /// Creates a frame with every slot of `layout` unset.
    pub fn new(layout: &dyn FrameLayout, arguments: Vec<Value>) -> Self {
        Self {
            slots: vec![None; layout.slot_count()],
            arguments,
        }
    }

    pub fn arguments(&self) -> &[Value] {
        &self.arguments
    }

    /// Stores `value` into `slot`.
    pub fn set_slot(&mut self, slot: FrameSlot, value: Value) -> Result<()> {
        let Some(entry) = self.slots.get_mut(slot.index) else {
            bail!("Slot index {} out of bounds", slot.index);
        };
        *entry = Some(value);
        Ok(())
    }

    /// Reads the value in `slot`, `None` if the slot was never written.
    pub fn get_slot(&self, slot: FrameSlot) -> Option<&Value> {
        self.slots.get(slot.index).and_then(Option::as_ref)
    }

    /// Iterates over every written slot.
    pub fn written_slots(&self) -> impl Iterator<Item = (FrameSlot, &Value)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, value)| value.as_ref().map(|v| (FrameSlot { index }, v)))
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (index, slot) in self.slots.iter().enumerate() {
            if index > 0 {
                write!(f, ", ")?;
            }
            match slot {
                Some(value) => write!(f, "{value}")?,
                None => write!(f, "_")?,
            }
        }
        write!(f, "]")
    }
}
