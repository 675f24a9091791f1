//! Tests for SqliteTaskRepository and SqliteRecurringTaskRepository.

use crate::db::{
    Database, DbError, Frequency, Page, Priority, RecurringTask, RecurringTaskQuery,
    RecurringTaskRepository, SqliteDatabase, Task, TaskQuery, TaskRepository, TaskStatus,
};

async fn setup_db() -> SqliteDatabase {
    let db = SqliteDatabase::in_memory()
        .await
        .expect("Failed to create in-memory database");
    db.migrate().await.expect("Migration should succeed");
    db
}

fn make_task(title: &str) -> Task {
    Task {
        id: String::new(),
        task_id: String::new(),
        title: title.to_string(),
        description: None,
        status: TaskStatus::Pending,
        priority: Priority::Medium,
        assigned_to: None,
        contact_id: None,
        due_date: None,
        created_at: String::new(),
        updated_at: String::new(),
        completed_at: None,
    }
}

fn make_recurring(title: &str, start: &str) -> RecurringTask {
    RecurringTask {
        id: String::new(),
        task_id: String::new(),
        title: title.to_string(),
        description: None,
        frequency: Frequency::Weekly,
        priority: Priority::Low,
        assigned_to: None,
        start_date: start.to_string(),
        end_date: None,
        next_due_date: None,
        is_active: true,
        created_at: String::new(),
        updated_at: String::new(),
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn task_ids_are_sequential() {
    let db = setup_db().await;
    let tasks = db.tasks();

    let first = tasks.create(&make_task("First")).await.expect("create");
    let second = tasks.create(&make_task("Second")).await.expect("create");

    assert_eq!(first.task_id, "TASK-0001");
    assert_eq!(second.task_id, "TASK-0002");
    assert_eq!(first.id.len(), 8);
}

#[tokio::test(flavor = "multi_thread")]
async fn task_ids_continue_after_delete() {
    let db = setup_db().await;
    let tasks = db.tasks();

    tasks.create(&make_task("One")).await.expect("create");
    let two = tasks.create(&make_task("Two")).await.expect("create");
    tasks.create(&make_task("Three")).await.expect("create");
    tasks.delete(&two.task_id).await.expect("delete");

    let four = tasks.create(&make_task("Four")).await.expect("create");
    assert_eq!(four.task_id, "TASK-0004");
}

#[tokio::test(flavor = "multi_thread")]
async fn task_get_accepts_either_id_form() {
    let db = setup_db().await;
    let tasks = db.tasks();

    let created = tasks.create(&make_task("Lookup")).await.expect("create");

    let by_id = tasks.get(&created.id).await.expect("get by id");
    let by_human = tasks.get(&created.task_id).await.expect("get by task_id");
    assert_eq!(by_id, by_human);
}

#[tokio::test(flavor = "multi_thread")]
async fn task_rejects_blank_title() {
    let db = setup_db().await;
    let result = db.tasks().create(&make_task("   ")).await;
    assert!(matches!(result, Err(DbError::Validation { .. })));
}

#[tokio::test(flavor = "multi_thread")]
async fn task_completion_stamps_and_clears_completed_at() {
    let db = setup_db().await;
    let tasks = db.tasks();

    let mut task = tasks.create(&make_task("Finish")).await.expect("create");
    assert!(task.completed_at.is_none());

    task.status = TaskStatus::Completed;
    let done = tasks.update(&task).await.expect("update");
    assert!(done.completed_at.is_some());

    let mut reopened = done.clone();
    reopened.status = TaskStatus::InProgress;
    let reopened = tasks.update(&reopened).await.expect("update");
    assert!(reopened.completed_at.is_none());
}

#[tokio::test(flavor = "multi_thread")]
async fn task_list_filters_and_counts() {
    let db = setup_db().await;
    let tasks = db.tasks();

    for i in 0..5 {
        let mut task = make_task(&format!("Call client {}", i));
        if i % 2 == 0 {
            task.priority = Priority::High;
            task.due_date = Some(format!("2025-03-0{}", i + 1));
        }
        tasks.create(&task).await.expect("create");
    }

    let high = tasks
        .list(&TaskQuery {
            priority: Some(Priority::High),
            ..Default::default()
        })
        .await
        .expect("list");
    assert_eq!(high.total, 3);
    assert!(high.items.iter().all(|t| t.priority == Priority::High));

    let ranged = tasks
        .list(&TaskQuery {
            due_from: Some("2025-03-02".to_string()),
            due_to: Some("2025-03-05".to_string()),
            ..Default::default()
        })
        .await
        .expect("list");
    assert_eq!(ranged.total, 2);

    let paged = tasks
        .list(&TaskQuery {
            page: Page {
                limit: Some(2),
                offset: Some(1),
            },
            ..Default::default()
        })
        .await
        .expect("list");
    assert_eq!(paged.items.len(), 2);
    assert_eq!(paged.total, 5);
    assert_eq!(paged.limit, 2);
    assert_eq!(paged.offset, 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn task_search_matches_title_and_description() {
    let db = setup_db().await;
    let tasks = db.tasks();

    tasks.create(&make_task("Send quote")).await.expect("create");
    let mut described = make_task("Follow up");
    described.description = Some("Discuss the QUOTE revision".to_string());
    tasks.create(&described).await.expect("create");
    tasks.create(&make_task("Unrelated")).await.expect("create");

    let found = tasks
        .list(&TaskQuery {
            search: Some("quote".to_string()),
            ..Default::default()
        })
        .await
        .expect("list");
    assert_eq!(found.total, 2);
}

#[tokio::test(flavor = "multi_thread")]
async fn task_delete_missing_is_not_found() {
    let db = setup_db().await;
    let result = db.tasks().delete("TASK-9999").await;
    assert!(matches!(result, Err(DbError::NotFound { .. })));
}

#[tokio::test(flavor = "multi_thread")]
async fn task_unknown_assignee_violates_constraint() {
    let db = setup_db().await;
    let mut task = make_task("Orphan");
    task.assigned_to = Some("nobody00".to_string());

    let result = db.tasks().create(&task).await;
    assert!(matches!(result, Err(DbError::Constraint { .. })));
}

#[tokio::test(flavor = "multi_thread")]
async fn recurring_task_defaults_next_due_to_start() {
    let db = setup_db().await;
    let recurring = db.recurring_tasks();

    let created = recurring
        .create(&make_recurring("Weekly review", "2025-04-07"))
        .await
        .expect("create");

    assert_eq!(created.task_id, "RTASK-0001");
    assert_eq!(created.next_due_date.as_deref(), Some("2025-04-07"));

    let fetched = recurring.get(&created.task_id).await.expect("get");
    assert_eq!(fetched.frequency, Frequency::Weekly);
    assert!(fetched.is_active);
}

#[tokio::test(flavor = "multi_thread")]
async fn recurring_task_rejects_end_before_start() {
    let db = setup_db().await;
    let mut task = make_recurring("Backwards", "2025-05-01");
    task.end_date = Some("2025-04-01".to_string());

    let result = db.recurring_tasks().create(&task).await;
    assert!(matches!(result, Err(DbError::Validation { .. })));
}

#[tokio::test(flavor = "multi_thread")]
async fn recurring_task_filters_by_active_flag() {
    let db = setup_db().await;
    let recurring = db.recurring_tasks();

    let mut paused = recurring
        .create(&make_recurring("Paused", "2025-01-01"))
        .await
        .expect("create");
    recurring
        .create(&make_recurring("Running", "2025-01-01"))
        .await
        .expect("create");

    paused.is_active = false;
    recurring.update(&paused).await.expect("update");

    let active = recurring
        .list(&RecurringTaskQuery {
            is_active: Some(true),
            ..Default::default()
        })
        .await
        .expect("list");
    assert_eq!(active.total, 1);
    assert_eq!(active.items[0].title, "Running");
}
