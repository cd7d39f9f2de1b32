//! Stack of tasks currently executing on a thread.
//!
//! Invocation pushes a [`TaskFrame`] and holds a [`StackGuard`] that pops it on
//! every exit path, including unwinding. Collaborators that need to know which
//! task is running read [`TaskStack::top`].
//!
//! A [`TaskStack`] is a cheap handle over shared frames. It is deliberately not
//! `Send`: a stack can only ever be observed from the thread that owns it. Each
//! thread has a default stack ([`TaskStack::current`]); an orchestrator may
//! instead own a stack and pass it to `TaskInstance::call_in`.

use std::{
    cell::RefCell,
    rc::Rc,
    sync::atomic::{AtomicU64, Ordering},
};

use serde::Serialize;

thread_local! {
    static CURRENT_STACK: TaskStack = TaskStack::new();
}

/// Process-unique identifier of a constructed task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TaskId(u64);

impl TaskId {
    pub(crate) fn next() -> Self {
        static NEXT_TASK_ID: AtomicU64 = AtomicU64::new(1);
        Self(NEXT_TASK_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Snapshot describing an executing task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskFrame {
    pub task_id: TaskId,
    pub class_name: String,
    pub name: Option<String>,
    pub step_num: Option<String>,
    pub logger: String,
}

#[derive(Debug, Clone, Default)]
pub struct TaskStack {
    frames: Rc<RefCell<Vec<TaskFrame>>>,
}

impl TaskStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// The calling thread's default stack.
    pub fn current() -> Self {
        CURRENT_STACK.with(Clone::clone)
    }

    /// Push `frame`; it is popped when the returned guard drops.
    pub fn push(&self, frame: TaskFrame) -> StackGuard {
        self.frames.borrow_mut().push(frame);
        StackGuard { stack: self.clone() }
    }

    /// The innermost executing task.
    pub fn top(&self) -> Option<TaskFrame> {
        self.frames.borrow().last().cloned()
    }

    pub fn depth(&self) -> usize {
        self.frames.borrow().len()
    }

    /// Frames from outermost to innermost.
    pub fn frames(&self) -> Vec<TaskFrame> {
        self.frames.borrow().clone()
    }
}

/// Pops the frame pushed by [`TaskStack::push`] when dropped.
#[must_use = "the frame is popped as soon as the guard is dropped"]
#[derive(Debug)]
pub struct StackGuard {
    stack: TaskStack,
}

impl Drop for StackGuard {
    fn drop(&mut self) {
        self.stack.frames.borrow_mut().pop();
    }
}
