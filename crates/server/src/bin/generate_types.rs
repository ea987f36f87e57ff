use std::{env, fs, path::PathBuf};

use ts_rs::TS;

fn generate_types_content() -> String {
    let header = "// This file was generated by `cargo run --bin generate_types`. Do not edit.";
    let decls = [
        db::models::role::Role::decl(),
        db::models::role::Permission::decl(),
        db::models::user::User::decl(),
        db::models::user::UserSummary::decl(),
        db::models::task::TaskStatus::decl(),
        db::models::task::Task::decl(),
        db::models::task::UpdateTask::decl(),
        db::models::task::TaskDetails::decl(),
        db::models::task::StatusCount::decl(),
        db::models::task::PriorityCount::decl(),
        db::models::task_dependency::TaskRef::decl(),
        db::models::task_comment::TaskComment::decl(),
        services::services::auth::Principal::decl(),
        services::services::tasks::NewTask::decl(),
        services::services::tasks::TaskPlan::decl(),
        services::services::users::Registration::decl(),
        services::services::users::NewUser::decl(),
        services::services::dashboard::TaskStats::decl(),
        services::services::dashboard::Dashboard::decl(),
        server::routes::auth::LoginRequest::decl(),
        server::routes::auth::LoginResponse::decl(),
        server::routes::users::PromoteUser::decl(),
        server::routes::tasks::DependenciesBody::decl(),
        server::routes::tasks::AssignedUsersBody::decl(),
        server::routes::tasks::AssignUserBody::decl(),
        server::routes::tasks::ObjectivesBody::decl(),
        server::routes::tasks::StatusBody::decl(),
        server::routes::tasks::CommentBody::decl(),
        utils::response::ApiResponse::<()>::decl(),
    ];

    let body = decls
        .into_iter()
        .map(|decl| format!("export {}", decl.trim_start_matches("export ")))
        .collect::<Vec<_>>()
        .join("\n\n");
    format!("{header}\n\n{body}\n")
}

fn main() {
    let out_dir = env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("shared"));
    let out_file = out_dir.join("types.ts");

    if let Err(err) = fs::create_dir_all(&out_dir) {
        eprintln!("failed to create {}: {err}", out_dir.display());
        std::process::exit(1);
    }
    if let Err(err) = fs::write(&out_file, generate_types_content()) {
        eprintln!("failed to write {}: {err}", out_file.display());
        std::process::exit(1);
    }
    println!("wrote {}", out_file.display());
}
