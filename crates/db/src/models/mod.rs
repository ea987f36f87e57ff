pub mod role;
pub mod task;
pub mod task_assignee;
pub mod task_comment;
pub mod task_dependency;
pub mod user;
