use std::{
    sync::mpsc,
    thread,
};

use super::{
    handle::{
        CancelToken,
        TaskHandle,
    },
    types::TaskResult,
};
use crate::{
    core::preferences::Preferences,
    ingest::MappingStore,
    planner::{
        self,
        ImportPlan,
        ImportRequest,
    },
};

/// Runs plan and import work off the interactive thread. Callers poll the
/// results channel; progress arrives as fractional updates, and either
/// phase can be cancelled cooperatively through the returned handle.
pub struct TaskManager {
    receiver: mpsc::Receiver<TaskResult>,
    sender: mpsc::Sender<TaskResult>,
}

impl Default for TaskManager {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskManager {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::channel();
        Self { receiver, sender }
    }

    pub fn poll_results(&mut self) -> Vec<TaskResult> {
        let mut results = Vec::new();
        while let Ok(result) = self.receiver.try_recv() {
            results.push(result);
        }
        results
    }

    pub fn prepare_plan(
        &self,
        request: ImportRequest,
        prefs: Preferences,
        mappings: MappingStore,
    ) -> TaskHandle {
        let sender = self.sender.clone();
        let token = CancelToken::new();
        let thread_token = token.clone();

        let join_handle = thread::spawn(move || {
            let progress_sender = sender.clone();
            let progress = move |fraction: f32, message: &str| {
                let _ = progress_sender
                    .send(TaskResult::Progress { fraction, message: message.to_string() });
            };

            let result = planner::prepare_plan(
                &request,
                &prefs,
                &mappings,
                Some(&progress),
                Some(&thread_token),
            )
            .map_err(|e| e.to_string());

            let _ = sender.send(TaskResult::PlanReady(result));
        });

        TaskHandle::new(token, join_handle)
    }

    pub fn perform_import(&self, plan: ImportPlan, prefs: Preferences) -> TaskHandle {
        let sender = self.sender.clone();
        let token = CancelToken::new();
        let thread_token = token.clone();

        let join_handle = thread::spawn(move || {
            let progress_sender = sender.clone();
            let progress = move |fraction: f32, message: &str| {
                let _ = progress_sender
                    .send(TaskResult::Progress { fraction, message: message.to_string() });
            };

            let result =
                planner::perform_import(&plan, &prefs, Some(&progress), Some(&thread_token))
                    .map_err(|e| e.to_string());

            let _ = sender.send(TaskResult::ImportFinished(result));
        });

        TaskHandle::new(token, join_handle)
    }
}

#[cfg(test)]
mod tests {
    use std::{
        fs,
        time::Duration,
    };

    use super::*;

    #[test]
    fn plan_task_reports_progress_and_result() {
        let dir = tempfile::tempdir().unwrap();
        let vault = dir.path().join("vault");
        fs::create_dir_all(&vault).unwrap();
        let csv = dir.path().join("vocab.csv");
        fs::write(&csv, "Word,Phonetic,Translation,Date\napple,,苹果,2026-2-9\n").unwrap();

        let mut manager = TaskManager::new();
        let handle = manager.prepare_plan(
            ImportRequest {
                vault_root: vault,
                vocabulary_csv: Some(csv),
                sentence_csv: None,
            },
            Preferences::default(),
            MappingStore::default(),
        );

        let mut plan = None;
        for _ in 0..200 {
            for result in manager.poll_results() {
                if let TaskResult::PlanReady(outcome) = result {
                    plan = Some(outcome.expect("plan should succeed"));
                }
            }
            if plan.is_some() {
                break;
            }
            std::thread::sleep(Duration::from_millis(10));
        }

        let plan = plan.expect("plan task did not finish");
        assert_eq!(plan.total_new_vocab(), 1);
        assert!(!handle.is_cancelled());
    }
}
