//! Single-threaded delayed-task scheduler.
//!
//! Time only moves when the owner calls [`Scheduler::advance`]. Tasks are
//! fire-and-forget: there is no cancellation.

use crate::game::{Coord, Outcome, Side};

/// A continuation to run once its delay has elapsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    /// Apply a telegraphed prism attack.
    LandAttack {
        /// Attacking side.
        side: Side,
        /// Attacking prism.
        attacker: Coord,
        /// Tile being hit.
        target: Coord,
    },
    /// Open the tutorial panel.
    OpenTutorial,
    /// Show the win or lose screen.
    ShowOutcome(Outcome),
}

#[derive(Debug, Clone, Copy)]
struct ScheduledTask {
    due: f64,
    seq: u64,
    task: Task,
}

/// Clock plus pending tasks.
#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    now: f64,
    next_seq: u64,
    tasks: Vec<ScheduledTask>,
}

impl Scheduler {
    /// Create an idle scheduler at time zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seconds elapsed since creation.
    #[must_use]
    pub const fn now(&self) -> f64 {
        self.now
    }

    /// Number of tasks waiting to run.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.tasks.len()
    }

    /// Run `task` after `delay` seconds.
    pub fn schedule(&mut self, delay: f32, task: Task) {
        let due = self.now + f64::from(delay.max(0.0));
        self.tasks.push(ScheduledTask {
            due,
            seq: self.next_seq,
            task,
        });
        self.next_seq += 1;
    }

    /// Advance the clock and return the tasks that came due, earliest first.
    /// Tasks due at the same time come out in scheduling order.
    pub fn advance(&mut self, dt: f32) -> Vec<Task> {
        self.now += f64::from(dt.max(0.0));

        let now = self.now;
        let (mut due, waiting): (Vec<_>, Vec<_>) =
            self.tasks.drain(..).partition(|scheduled| scheduled.due <= now);
        self.tasks = waiting;

        due.sort_by(|a, b| a.due.total_cmp(&b.due).then(a.seq.cmp(&b.seq)));
        due.into_iter().map(|scheduled| scheduled.task).collect()
    }

    /// Drop every pending task.
    pub fn clear(&mut self) {
        self.tasks.clear();
    }
}
