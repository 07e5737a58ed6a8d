//! Common test utilities and macros
#![allow(dead_code)]

use anyhow::{Result, anyhow};
use bootcrab::platform::{BUFFER_TOO_SMALL, DynamicLoader};
use bootcrab::{
    ExpressionNode, Frame, FrameDescriptor, FrameLayout, FrameSlot, InitBlock, STACK_POINTER_SLOT,
    Value,
};
use std::ffi::{c_char, c_int};
use std::path::PathBuf;
use std::ptr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Slots available to every test node besides the stack pointer.
pub const TEST_SLOTS: [&str; 3] = ["a", "b", "c"];

#[derive(Debug)]
pub enum TestResult {
    Success,
    Error(String),
    ErrorRegex(String),
}

impl PartialEq for TestResult {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (TestResult::Success, TestResult::Success) => true,
            (TestResult::Error(a), TestResult::Error(b)) => a == b,
            (TestResult::ErrorRegex(pattern), TestResult::Error(msg)) => {
                regex::Regex::new(pattern).unwrap().is_match(msg)
            }
            (TestResult::Error(msg), TestResult::ErrorRegex(pattern)) => {
                regex::Regex::new(pattern).unwrap().is_match(msg)
            }
            _ => false,
        }
    }
}

impl TestResult {
    pub fn from_run(result: Result<Value>) -> Self {
        match result {
            Ok(value) if value.is_unit() => TestResult::Success,
            Ok(value) => TestResult::Error(format!("Expected void, found {value}")),
            Err(e) => TestResult::Error(e.to_string()),
        }
    }
}

/// Frame layout that counts how often slots are looked up.
#[derive(Debug)]
pub struct CountingDescriptor {
    inner: FrameDescriptor,
    lookups: AtomicUsize,
}

impl CountingDescriptor {
    pub fn new(names: &[&str]) -> Self {
        Self {
            inner: FrameDescriptor::new(names.iter().copied()).unwrap(),
            lookups: AtomicUsize::new(0),
        }
    }

    /// Layout with the stack pointer slot and [`TEST_SLOTS`].
    pub fn with_stack_pointer() -> Self {
        let mut names = vec![STACK_POINTER_SLOT];
        names.extend(TEST_SLOTS);
        Self::new(&names)
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    pub fn slot(&self, name: &str) -> FrameSlot {
        self.inner.find_slot(name).unwrap()
    }
}

impl FrameLayout for CountingDescriptor {
    fn find_slot(&self, name: &str) -> Option<FrameSlot> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.inner.find_slot(name)
    }

    fn slot_count(&self) -> usize {
        self.inner.slot_count()
    }
}

/// What a [`RecordingNode`] does after recording its index.
#[derive(Debug, Clone)]
pub enum NodeAction {
    Write(&'static str, u64),
    Fail(&'static str),
    Nop,
}

pub fn write(name: &'static str, value: u64) -> NodeAction {
    NodeAction::Write(name, value)
}

pub fn fail(message: &'static str) -> NodeAction {
    NodeAction::Fail(message)
}

pub fn nop() -> NodeAction {
    NodeAction::Nop
}

/// Shared log of node indices in evaluation order.
#[derive(Debug, Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<usize>>>);

impl Journal {
    pub fn record(&self, index: usize) {
        self.0.lock().unwrap().push(index);
    }

    pub fn entries(&self) -> Vec<usize> {
        self.0.lock().unwrap().clone()
    }
}

/// Node that logs its index to a journal, then performs its action.
pub struct RecordingNode {
    index: usize,
    journal: Journal,
    action: NodeAction,
    slot: Option<FrameSlot>,
}

impl ExpressionNode for RecordingNode {
    fn execute_generic(&self, frame: &mut Frame) -> Result<Value> {
        self.journal.record(self.index);
        match &self.action {
            NodeAction::Write(_, value) => {
                let value = Value::from_type(*value);
                frame.set_slot(self.slot.unwrap(), value.clone())?;
                Ok(value)
            }
            NodeAction::Fail(message) => Err(anyhow!("{}", message)),
            NodeAction::Nop => Ok(Value::from_type(self.index as u64)),
        }
    }
}

/// An init block over recording nodes and a counting layout.
pub struct Harness {
    pub layout: Arc<CountingDescriptor>,
    pub journal: Journal,
    pub block: InitBlock,
}

impl Harness {
    pub fn new(actions: Vec<NodeAction>) -> Result<Self> {
        Self::with_layout(actions, CountingDescriptor::with_stack_pointer())
    }

    pub fn with_layout(actions: Vec<NodeAction>, layout: CountingDescriptor) -> Result<Self> {
        let journal = Journal::default();
        let nodes: Vec<Box<dyn ExpressionNode>> = actions
            .into_iter()
            .enumerate()
            .map(|(index, action)| {
                let slot = match &action {
                    NodeAction::Write(name, _) => Some(layout.slot(name)),
                    _ => None,
                };
                Box::new(RecordingNode {
                    index,
                    journal: journal.clone(),
                    action,
                    slot,
                }) as Box<dyn ExpressionNode>
            })
            .collect();
        let layout = Arc::new(layout);
        let block = InitBlock::new(nodes, layout.clone())?;
        Ok(Self {
            layout,
            journal,
            block,
        })
    }

    pub fn new_frame(&self, stack_pointer: u64) -> Frame {
        Frame::new(self.layout.as_ref(), vec![Value::from_type(stack_pointer)])
    }

    /// Runs the block on a fresh frame.
    pub fn run(&self, stack_pointer: u64) -> (TestResult, Frame) {
        let mut frame = self.new_frame(stack_pointer);
        let result = TestResult::from_run(self.block.run(&mut frame));
        (result, frame)
    }

    pub fn slot_value(&self, frame: &Frame, name: &str) -> Option<u64> {
        frame
            .get_slot(self.layout.slot(name))
            .and_then(|value| value.as_type::<u64>())
    }
}

/// Scripted loader answers for one resolution.
#[derive(Debug, Clone)]
pub enum LoaderScript {
    /// Report `size` on the size query, then fail the fetch.
    FailFetch { size: u32 },
    /// Report the size of `path`, then copy it.
    Answer { path: PathBuf },
    /// Pretend a null buffer was big enough.
    SucceedSizeQuery,
}

/// Loader double that follows a script and counts calls.
#[derive(Debug)]
pub struct StubLoader {
    script: LoaderScript,
    calls: AtomicUsize,
}

impl StubLoader {
    pub fn new(script: LoaderScript) -> Self {
        Self {
            script,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl DynamicLoader for StubLoader {
    unsafe fn get_executable_path(&self, buf: *mut c_char, size: &mut u32) -> c_int {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.script {
            LoaderScript::SucceedSizeQuery => 0,
            LoaderScript::FailFetch { size: needed } => {
                *size = *needed;
                BUFFER_TOO_SMALL
            }
            LoaderScript::Answer { path } => {
                let bytes = path.as_os_str().as_encoded_bytes();
                let needed = bytes.len() + 1;
                if buf.is_null() || (*size as usize) < needed {
                    *size = needed as u32;
                    return BUFFER_TOO_SMALL;
                }
                // SAFETY: `buf` holds at least `needed` bytes.
                unsafe {
                    ptr::copy_nonoverlapping(bytes.as_ptr(), buf.cast::<u8>(), bytes.len());
                    *buf.add(bytes.len()) = 0;
                }
                0
            }
        }
    }
}

#[macro_export]
macro_rules! check_init_block {
    ($test_name:ident, nodes=[$($node:expr),* $(,)?], trace=[$($index:expr),*], result=$expected:expr) => {
        #[test]
        fn $test_name() {
            let harness = crate::common::Harness::new(vec![$($node),*]).unwrap();
            let (result, _frame) = harness.run(0xDEADBEEF);
            assert_eq!(result, $expected);
            let expected_trace: Vec<usize> = vec![$($index),*];
            assert_eq!(harness.journal.entries(), expected_trace);
        }
    };
}
