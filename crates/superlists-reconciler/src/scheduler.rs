use std::time::Duration;
use superlists_dom::NodeId;

/// Delay before a newly added card is formatted, so the page can finish
/// rendering it first.
pub const CARD_FORMAT_DELAY: Duration = Duration::from_millis(100);

/// One rendering frame at 60 Hz.
pub const FRAME: Duration = Duration::from_millis(16);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskHandle(u64);

/// Work run once after a fixed delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeferredTask {
    FormatCard(NodeId),
}

/// Work run on every frame until it returns [`TaskControl::Stop`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameTask {
    WatchHeight { list: NodeId, last_height: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskControl {
    Continue,
    Stop,
}

/// A deterministic, host-clocked task queue.
///
/// Time only moves when the host calls [`Scheduler::advance`], which keeps
/// the reconciler single-threaded and testable without real timers.
#[derive(Debug, Default)]
pub struct Scheduler {
    now: Duration,
    next_handle: u64,
    deferred: Vec<(TaskHandle, Duration, DeferredTask)>,
    frames: Vec<(TaskHandle, FrameTask)>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn defer(&mut self, delay: Duration, task: DeferredTask) -> TaskHandle {
        let handle = self.next();
        self.deferred.push((handle, self.now + delay, task));
        handle
    }

    pub fn every_frame(&mut self, task: FrameTask) -> TaskHandle {
        let handle = self.next();
        self.frames.push((handle, task));
        handle
    }

    /// Returns whether the task was still pending.
    pub fn cancel(&mut self, handle: TaskHandle) -> bool {
        let before = self.deferred.len() + self.frames.len();
        self.deferred.retain(|(h, _, _)| *h != handle);
        self.frames.retain(|(h, _)| *h != handle);
        before != self.deferred.len() + self.frames.len()
    }

    pub fn is_pending(&self, handle: TaskHandle) -> bool {
        self.deferred.iter().any(|(h, _, _)| *h == handle) || self.frames.iter().any(|(h, _)| *h == handle)
    }

    /// Moves the clock forward and returns the deferred tasks now due, in
    /// due order.
    pub fn advance(&mut self, elapsed: Duration) -> Vec<DeferredTask> {
        self.now += elapsed;
        let now = self.now;
        let mut due: Vec<(TaskHandle, Duration, DeferredTask)> = Vec::new();
        self.deferred.retain(|entry| {
            if entry.1 <= now {
                due.push(*entry);
                false
            } else {
                true
            }
        });
        due.sort_by_key(|(handle, at, _)| (*at, *handle));
        due.into_iter().map(|(_, _, task)| task).collect()
    }

    /// Takes the frame tasks out for running; hand survivors back with
    /// [`Scheduler::restore_frames`].
    pub fn take_frames(&mut self) -> Vec<(TaskHandle, FrameTask)> {
        std::mem::take(&mut self.frames)
    }

    /// Puts surviving frame tasks back ahead of any scheduled while they ran.
    pub fn restore_frames(&mut self, mut survivors: Vec<(TaskHandle, FrameTask)>) {
        survivors.append(&mut self.frames);
        self.frames = survivors;
    }

    pub fn deferred_count(&self) -> usize {
        self.deferred.len()
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn clear(&mut self) {
        self.deferred.clear();
        self.frames.clear();
    }

    fn next(&mut self) -> TaskHandle {
        self.next_handle += 1;
        TaskHandle(self.next_handle)
    }
}
