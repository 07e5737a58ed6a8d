//! Root node for static initializer blocks.
//!
//! An init block is a top-level unit with its own frame: it is evaluated for
//! effect, never composed inside a larger expression. Before running its
//! children it installs the caller's stack pointer (argument 0) into the
//! frame's stack pointer slot.

use crate::error::RuntimeError;
use crate::frame::{Frame, FrameLayout, FrameSlot, STACK_POINTER_SLOT};
use crate::node::ExpressionNode;
use crate::value::Value;
use anyhow::Result;
use std::fmt;
use std::sync::{Arc, OnceLock};
use tracing::debug;

/// A node that can be invoked as a standalone unit with its own frame.
pub trait RootNode {
    fn execute(&self, frame: &mut Frame) -> Result<Value>;
}

/// Runs a fixed, ordered list of expression nodes for effect.
pub struct InitBlock {
    nodes: Box<[Box<dyn ExpressionNode>]>,
    descriptor: Arc<dyn FrameLayout>,
    /// Resolved on first execution and never changed afterwards.
    stack_pointer_slot: OnceLock<FrameSlot>,
}

impl InitBlock {
    /// Creates an init block over `nodes`.
    ///
    /// # Returns
    /// * `Ok(InitBlock)` - At least one node was given
    /// * `Err(anyhow::Error)` - A [`RuntimeError::Configuration`] if `nodes` is empty
    pub fn new(nodes: Vec<Box<dyn ExpressionNode>>, descriptor: Arc<dyn FrameLayout>) -> Result<Self> {
        if nodes.is_empty() {
            return Err(RuntimeError::configuration("init block has no nodes").into());
        }
        Ok(Self {
            nodes: nodes.into_boxed_slice(),
            descriptor,
            stack_pointer_slot: OnceLock::new(),
        })
    }

    /// Number of child nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false; empty blocks are rejected at construction.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Runs the block against `frame`. Same as [`RootNode::execute`].
    pub fn run(&self, frame: &mut Frame) -> Result<Value> {
        self.execute(frame)
    }

    fn stack_pointer_slot(&self) -> Result<FrameSlot> {
        if let Some(slot) = self.stack_pointer_slot.get() {
            return Ok(*slot);
        }
        // A racing thread may resolve the same slot; lookups are pure so either write wins.
        let slot = self.descriptor.find_slot(STACK_POINTER_SLOT).ok_or_else(|| {
            RuntimeError::configuration(format!(
                "frame layout has no `{STACK_POINTER_SLOT}` slot"
            ))
        })?;
        debug!("Resolved stack pointer slot to {}", slot.index());
        Ok(*self.stack_pointer_slot.get_or_init(|| slot))
    }
}

impl RootNode for InitBlock {
    fn execute(&self, frame: &mut Frame) -> Result<Value> {
        let stack_pointer = frame.arguments().first().cloned().ok_or_else(|| {
            RuntimeError::configuration("init block invoked without a stack pointer argument")
        })?;
        let slot = self.stack_pointer_slot()?;
        frame.set_slot(slot, stack_pointer)?;

        for (index, node) in self.nodes.iter().enumerate() {
            debug!("Executing init node {index}");
            node.execute_generic(frame)?;
        }
        Ok(Value::unit().clone())
    }
}

impl fmt::Display for InitBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "static_inits[{}]", self.nodes.len())
    }
}

impl fmt::Debug for InitBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InitBlock")
            .field("nodes", &self.nodes.len())
            .field("stack_pointer_slot", &self.stack_pointer_slot.get())
            .finish()
    }
}
