//! BootCrab runtime support library
//!
//! Two pieces of interpreter runtime support:
//! - [`init_block::InitBlock`]: a root node that runs static initializer
//!   expressions against a frame after installing the caller's stack pointer.
//! - [`platform::executable_path`]: asks the host dynamic loader for the
//!   canonical path of the running executable.

pub mod error;
pub mod frame;
pub mod init_block;
pub mod memory;
pub mod node;
pub mod platform;
pub mod value;

pub use error::RuntimeError;
pub use frame::{Frame, FrameDescriptor, FrameLayout, FrameSlot, STACK_POINTER_SLOT};
pub use init_block::{InitBlock, RootNode};
pub use node::ExpressionNode;
pub use platform::executable_path;
pub use value::Value;
