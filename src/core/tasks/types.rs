use crate::planner::{
    ImportPlan,
    ImportSummary,
};

#[derive(Debug, Clone)]
pub enum TaskResult {
    PlanReady(Result<ImportPlan, String>),
    ImportFinished(Result<ImportSummary, String>),
    Progress { fraction: f32, message: String },
}

impl TaskResult {
    pub fn task_type(&self) -> &'static str {
        match self {
            TaskResult::PlanReady(_) => "plan_ready",
            TaskResult::ImportFinished(_) => "import_finished",
            TaskResult::Progress { .. } => "progress",
        }
    }
}
