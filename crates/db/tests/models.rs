use db::{
    DBService,
    models::{
        role::Role,
        task::{CreateTask, Task, TaskFilter, TaskStatus},
        task_assignee::TaskAssignee,
        task_comment::TaskComment,
        task_dependency::TaskDependency,
        user::{CreateUser, User},
    },
};
use tempfile::TempDir;
use uuid::Uuid;

async fn setup() -> (DBService, TempDir) {
    let dir = tempfile::tempdir().expect("tempdir");
    let url = format!("sqlite://{}", dir.path().join("test.sqlite").to_string_lossy());
    let db = DBService::new(&url).await.expect("database");
    (db, dir)
}

async fn create_user(db: &DBService, name: &str, role: Role) -> User {
    User::create(
        &db.pool,
        &CreateUser {
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            password_hash: "not-a-real-hash".to_string(),
            role,
        },
        Uuid::new_v4(),
    )
    .await
    .expect("create user")
}

async fn create_task(db: &DBService, title: &str, description: Option<&str>) -> Task {
    Task::create(
        &db.pool,
        &CreateTask {
            title: title.to_string(),
            description: description.map(str::to_string),
            priority: None,
            assigned_to: None,
            start_date: None,
            due_date: None,
        },
        Uuid::new_v4(),
    )
    .await
    .expect("create task")
}

#[tokio::test]
async fn roles_are_seeded_once() {
    let (db, _dir) = setup().await;
    Role::seed(&db.pool).await.expect("second seed is a no-op");

    let names = Role::find_all_names(&db.pool).await.unwrap();
    assert_eq!(names, vec!["admin", "manager", "user"]);
}

#[tokio::test]
async fn new_tasks_get_defaults() {
    let (db, _dir) = setup().await;
    let task = create_task(&db, "Write report", None).await;

    assert_eq!(task.status, TaskStatus::Pending);
    assert_eq!(task.priority, 3);
    assert_eq!(task.objectives_text, "");
    assert!(task.assigned_to.is_none());
}

#[tokio::test]
async fn filter_matches_title_or_description_case_insensitively() {
    let (db, _dir) = setup().await;
    create_task(&db, "Quarterly REPORT", None).await;
    create_task(&db, "Fix login", Some("the report page crashes")).await;
    create_task(&db, "Unrelated", None).await;

    let filter = TaskFilter {
        search: Some("report".to_string()),
        ..Default::default()
    };
    let found = Task::find_filtered(&db.pool, &filter).await.unwrap();
    assert_eq!(found.len(), 2);

    let literal = TaskFilter {
        search: Some("%".to_string()),
        ..Default::default()
    };
    assert!(Task::find_filtered(&db.pool, &literal).await.unwrap().is_empty());
}

#[tokio::test]
async fn search_matches_non_ascii_text_in_any_case() {
    let (db, _dir) = setup().await;
    let review = create_task(&db, "Überprüfung", None).await;
    let closure = create_task(&db, "Plain", Some("Straße sperren")).await;

    for (term, expected) in [
        ("überprüfung", review.id),
        ("ÜBERPRÜFUNG", review.id),
        ("STRAßE", closure.id),
    ] {
        let filter = TaskFilter {
            search: Some(term.to_string()),
            ..Default::default()
        };
        let found = Task::find_filtered(&db.pool, &filter).await.unwrap();
        assert_eq!(found.len(), 1, "{term}");
        assert_eq!(found[0].id, expected, "{term}");
    }
}

#[tokio::test]
async fn member_filter_covers_owner_and_workers() {
    let (db, _dir) = setup().await;
    let worker = create_user(&db, "Wendy", Role::User).await;
    let owned = Task::create(
        &db.pool,
        &CreateTask {
            title: "Owned".to_string(),
            description: None,
            priority: Some(1),
            assigned_to: Some(worker.id),
            start_date: None,
            due_date: None,
        },
        Uuid::new_v4(),
    )
    .await
    .unwrap();
    let attached = create_task(&db, "Attached", None).await;
    create_task(&db, "Someone else's", None).await;
    TaskAssignee::add(&db.pool, attached.id, worker.id).await.unwrap();

    let filter = TaskFilter {
        member: Some(worker.id),
        ..Default::default()
    };
    let mut ids: Vec<Uuid> = Task::find_filtered(&db.pool, &filter)
        .await
        .unwrap()
        .into_iter()
        .map(|t| t.id)
        .collect();
    ids.sort();
    let mut expected = vec![owned.id, attached.id];
    expected.sort();
    assert_eq!(ids, expected);
}

#[tokio::test]
async fn deleting_a_task_removes_edges_pointing_at_it() {
    let (db, _dir) = setup().await;
    let a = create_task(&db, "A", None).await;
    let b = create_task(&db, "B", None).await;

    let mut conn = db.pool.acquire().await.unwrap();
    TaskDependency::replace_for_task(&mut conn, b.id, &[a.id]).await.unwrap();
    drop(conn);

    assert_eq!(Task::delete(&db.pool, a.id).await.unwrap(), 1);
    let remaining = TaskDependency::find_ids_for_task(&db.pool, b.id).await.unwrap();
    assert!(remaining.is_empty());
}

#[tokio::test]
async fn deleting_an_author_keeps_the_comment() {
    let (db, _dir) = setup().await;
    let author = create_user(&db, "Carl", Role::User).await;
    let task = create_task(&db, "Discuss", None).await;

    let comment = TaskComment::create(&db.pool, task.id, author.id, "looks good", Uuid::new_v4())
        .await
        .unwrap();
    assert_eq!(comment.author_name.as_deref(), Some("Carl"));

    User::delete(&db.pool, author.id).await.unwrap();
    let comments = TaskComment::find_for_task(&db.pool, task.id).await.unwrap();
    assert_eq!(comments.len(), 1);
    assert!(comments[0].author_id.is_none());
    assert_eq!(comments[0].text, "looks good");
}
