use super::scene::EntityId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(pub u64);

/// A single-shot task due at `deadline_seconds` of simulation time.
///
/// `target` names the entity the task acts on. A task whose target is gone by
/// the time it fires must be treated as a no-op by whoever runs it.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledTask<T> {
    pub id: TaskId,
    pub deadline_seconds: f64,
    pub target: Option<EntityId>,
    pub payload: T,
}

impl<T> ScheduledTask<T> {
    pub fn target_is_live(&self, is_alive: impl Fn(EntityId) -> bool) -> bool {
        self.target.map_or(true, is_alive)
    }
}

/// Deadline-ordered queue of single-shot tasks.
///
/// Tasks with equal deadlines fire in scheduling order.
#[derive(Debug, Clone)]
pub struct TaskQueue<T> {
    next_id: u64,
    // Sorted by (deadline, id).
    tasks: Vec<ScheduledTask<T>>,
}

impl<T> Default for TaskQueue<T> {
    fn default() -> Self {
        Self {
            next_id: 0,
            tasks: Vec::new(),
        }
    }
}

impl<T> TaskQueue<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(
        &mut self,
        deadline_seconds: f64,
        target: Option<EntityId>,
        payload: T,
    ) -> TaskId {
        let id = TaskId(self.next_id);
        self.next_id = self.next_id.saturating_add(1);
        let deadline_seconds = if deadline_seconds.is_nan() {
            0.0
        } else {
            deadline_seconds
        };
        let index = self.tasks.partition_point(|task| {
            task.deadline_seconds
                .total_cmp(&deadline_seconds)
                .then(task.id.cmp(&id))
                .is_le()
        });
        self.tasks.insert(
            index,
            ScheduledTask {
                id,
                deadline_seconds,
                target,
                payload,
            },
        );
        id
    }

    pub fn cancel(&mut self, id: TaskId) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|task| task.id != id);
        self.tasks.len() != before
    }

    pub fn cancel_for_target(&mut self, target: EntityId) -> usize {
        let before = self.tasks.len();
        self.tasks.retain(|task| task.target != Some(target));
        before - self.tasks.len()
    }

    /// Drops every task whose target no longer exists. Returns how many were dropped.
    pub fn retain_live_targets(&mut self, is_alive: impl Fn(EntityId) -> bool) -> usize {
        let before = self.tasks.len();
        self.tasks.retain(|task| task.target_is_live(&is_alive));
        before - self.tasks.len()
    }

    pub fn drain_due(&mut self, now_seconds: f64) -> Vec<ScheduledTask<T>> {
        let due_count = self
            .tasks
            .partition_point(|task| task.deadline_seconds <= now_seconds);
        self.tasks.drain(..due_count).collect()
    }

    pub fn next_deadline(&self) -> Option<f64> {
        self.tasks.first().map(|task| task.deadline_seconds)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn clear(&mut self) {
        self.tasks.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drains_in_deadline_order_regardless_of_schedule_order() {
        let mut queue = TaskQueue::new();
        queue.schedule(3.0, None, 'c');
        queue.schedule(1.0, None, 'a');
        queue.schedule(2.0, None, 'b');

        let due = queue.drain_due(10.0);
        let order: Vec<char> = due.iter().map(|task| task.payload).collect();
        assert_eq!(order, vec!['a', 'b', 'c']);
        assert!(queue.is_empty());
    }

    #[test]
    fn equal_deadlines_fire_in_schedule_order() {
        let mut queue = TaskQueue::new();
        queue.schedule(1.0, None, 1);
        queue.schedule(1.0, None, 2);
        queue.schedule(1.0, None, 3);

        let order: Vec<i32> = queue
            .drain_due(1.0)
            .into_iter()
            .map(|task| task.payload)
            .collect();
        assert_eq!(order, vec![1, 2, 3]);
    }

    #[test]
    fn tasks_not_yet_due_stay_queued() {
        let mut queue = TaskQueue::new();
        queue.schedule(5.0, None, ());

        assert!(queue.drain_due(4.999).is_empty());
        assert_eq!(queue.next_deadline(), Some(5.0));
        assert_eq!(queue.drain_due(5.0).len(), 1);
    }

    #[test]
    fn cancel_removes_single_task() {
        let mut queue = TaskQueue::new();
        let keep = queue.schedule(1.0, None, "keep");
        let drop = queue.schedule(1.0, None, "drop");

        assert!(queue.cancel(drop));
        assert!(!queue.cancel(drop));
        let due = queue.drain_due(1.0);
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].id, keep);
    }

    #[test]
    fn cancel_for_target_and_retain_live_targets_drop_stale_tasks() {
        let mut queue = TaskQueue::new();
        queue.schedule(1.0, Some(EntityId(1)), "one");
        queue.schedule(1.0, Some(EntityId(2)), "two");
        queue.schedule(1.0, Some(EntityId(3)), "three");
        queue.schedule(1.0, None, "global");

        assert_eq!(queue.cancel_for_target(EntityId(1)), 1);
        assert_eq!(queue.retain_live_targets(|id| id != EntityId(2)), 1);

        let remaining: Vec<&str> = queue
            .drain_due(1.0)
            .into_iter()
            .map(|task| task.payload)
            .collect();
        assert_eq!(remaining, vec!["three", "global"]);
    }

    #[test]
    fn target_is_live_checks_liveness_only_when_targeted() {
        let mut queue = TaskQueue::new();
        queue.schedule(0.0, Some(EntityId(9)), ());
        queue.schedule(0.0, None, ());
        let due = queue.drain_due(0.0);

        assert!(!due[0].target_is_live(|_| false));
        assert!(due[1].target_is_live(|_| false));
    }

    #[test]
    fn nan_deadline_is_treated_as_immediately_due() {
        let mut queue = TaskQueue::new();
        queue.schedule(f64::NAN, None, ());
        assert_eq!(queue.drain_due(0.0).len(), 1);
    }
}
