//! In-memory registry of in-flight research tasks.
//!
//! Entries are removed as soon as the background work finishes; the durable
//! record is written before deregistration, so a poll that misses the entry
//! finds the outcome in the result store.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::models::{TaskInfo, TaskStatus};

#[derive(Debug, Default)]
pub struct TaskRegistry {
    tasks: RwLock<HashMap<String, TaskInfo>>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a newly launched task as processing.
    pub fn register(&self, request_id: &str) {
        let mut tasks = self.tasks.write().expect("task registry lock");
        tasks.insert(request_id.to_string(), TaskInfo::processing(request_id));
    }

    /// Record the terminal state and drop the entry, returning the final
    /// snapshot. The caller must have persisted the outcome durably first.
    pub fn finish(&self, request_id: &str, error: Option<String>) -> Option<TaskInfo> {
        let mut tasks = self.tasks.write().expect("task registry lock");
        let mut info = tasks.remove(request_id)?;
        info.status = if error.is_some() {
            TaskStatus::Failed
        } else {
            TaskStatus::Completed
        };
        info.error = error;
        Some(info)
    }

    pub fn get(&self, request_id: &str) -> Option<TaskInfo> {
        self.tasks
            .read()
            .expect("task registry lock")
            .get(request_id)
            .cloned()
    }

    pub fn snapshot(&self) -> Vec<TaskInfo> {
        self.tasks
            .read()
            .expect("task registry lock")
            .values()
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.tasks.read().expect("task registry lock").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
