//! Expression nodes evaluated against a frame.
//!
//! The runtime only needs the [`ExpressionNode`] capability. The stock nodes
//! here cover what init blocks commonly contain: constants, slot
//! reads/writes and sequences.

use crate::frame::{Frame, FrameSlot};
use crate::value::Value;
use anyhow::{Result, anyhow};
use tracing::debug;

/// A node in an evaluation tree.
pub trait ExpressionNode: Send + Sync {
    /// Evaluate this node against `frame`, producing a value.
    fn execute_generic(&self, frame: &mut Frame) -> Result<Value>;
}

impl<F> ExpressionNode for F
where
    F: Fn(&mut Frame) -> Result<Value> + Send + Sync,
{
    fn execute_generic(&self, frame: &mut Frame) -> Result<Value> {
        self(frame)
    }
}

/// Evaluates to a fixed value.
#[derive(Debug, Clone)]
pub struct ConstantNode {
    value: Value,
}

impl ConstantNode {
    pub fn new(value: Value) -> Self {
        Self { value }
    }
}

impl ExpressionNode for ConstantNode {
    fn execute_generic(&self, _frame: &mut Frame) -> Result<Value> {
        Ok(self.value.clone())
    }
}

/// Reads a slot. Fails if the slot was never written.
#[derive(Debug, Clone, Copy)]
pub struct ReadSlotNode {
    slot: FrameSlot,
}

impl ReadSlotNode {
    pub fn new(slot: FrameSlot) -> Self {
        Self { slot }
    }
}

impl ExpressionNode for ReadSlotNode {
    fn execute_generic(&self, frame: &mut Frame) -> Result<Value> {
        frame
            .get_slot(self.slot)
            .cloned()
            .ok_or_else(|| anyhow!("Uninitialized slot: {}", self.slot.index()))
    }
}

/// Evaluates `value` and stores the result into `slot`.
///
/// Evaluates to the stored value.
pub struct WriteSlotNode {
    slot: FrameSlot,
    value: Box<dyn ExpressionNode>,
}

impl WriteSlotNode {
    pub fn new(slot: FrameSlot, value: impl ExpressionNode + 'static) -> Self {
        Self {
            slot,
            value: Box::new(value),
        }
    }
}

impl ExpressionNode for WriteSlotNode {
    fn execute_generic(&self, frame: &mut Frame) -> Result<Value> {
        let value = self.value.execute_generic(frame)?;
        debug!("Assigning {} to slot {}", value, self.slot.index());
        frame.set_slot(self.slot, value.clone())?;
        Ok(value)
    }
}

/// Evaluates its children in order and evaluates to the last value.
///
/// The first failing child aborts the sequence.
pub struct SequenceNode {
    nodes: Box<[Box<dyn ExpressionNode>]>,
}

impl SequenceNode {
    /// An empty sequence evaluates to the unit value.
    pub fn new(nodes: Vec<Box<dyn ExpressionNode>>) -> Self {
        Self {
            nodes: nodes.into_boxed_slice(),
        }
    }
}

impl ExpressionNode for SequenceNode {
    fn execute_generic(&self, frame: &mut Frame) -> Result<Value> {
        let mut last = Value::unit().clone();
        for node in self.nodes.iter() {
            last = node.execute_generic(frame)?;
        }
        Ok(last)
    }
}
