use quiz_core::model::{
    ImageRef, Level, LevelId, ProgressStatus, Question, QuestionId, UserId,
};
use quiz_core::time::fixed_now;
use storage::repository::{LevelRepository, ProgressRepository};
use storage::sqlite::SqliteRepository;

fn build_question(id: u64, image: Option<ImageRef>) -> Question {
    Question::new(
        QuestionId::new(id),
        format!("Prompt {id}"),
        image,
        vec!["Menu".into(), "Bill".into(), "Receipt".into()],
        "Bill",
    )
    .unwrap()
}

fn build_level(id: u64, ordinal: u32, questions: Vec<Question>) -> Level {
    Level::new(
        LevelId::new(id),
        ordinal,
        format!("Level {ordinal}"),
        questions,
        fixed_now(),
    )
    .unwrap()
}

#[tokio::test]
async fn sqlite_roundtrips_level_with_questions_and_options() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_levels?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    let image = ImageRef::from_url("https://cdn.example.com/cafe.png").unwrap();
    let level = build_level(
        1,
        1,
        vec![build_question(1, Some(image)), build_question(2, None)],
    );
    repo.upsert_level(&level).await.unwrap();

    let fetched = repo.get_level(1).await.unwrap().expect("level stored");
    assert_eq!(fetched.title(), "Level 1");
    assert_eq!(fetched.question_count(), 2);

    let first = &fetched.questions()[0];
    assert_eq!(first.id(), QuestionId::new(1));
    assert_eq!(first.options(), ["Menu", "Bill", "Receipt"]);
    assert_eq!(first.correct_answer(), "Bill");
    assert!(first.image().is_some());
    assert!(fetched.questions()[1].image().is_none());
}

#[tokio::test]
async fn sqlite_upsert_replaces_question_set() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_replace?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    let level = build_level(1, 1, vec![build_question(1, None), build_question(2, None)]);
    repo.upsert_level(&level).await.unwrap();

    let trimmed = build_level(1, 1, vec![build_question(3, None)]);
    repo.upsert_level(&trimmed).await.unwrap();

    let fetched = repo.get_level(1).await.unwrap().expect("level stored");
    assert_eq!(fetched.question_count(), 1);
    assert_eq!(fetched.questions()[0].id(), QuestionId::new(3));
}

#[tokio::test]
async fn sqlite_lists_levels_by_ordinal() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_list?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    repo.upsert_level(&build_level(2, 2, vec![build_question(21, None)]))
        .await
        .unwrap();
    repo.upsert_level(&build_level(1, 1, vec![build_question(11, None)]))
        .await
        .unwrap();

    let levels = repo.list_levels(10).await.unwrap();
    let ordinals: Vec<u32> = levels.iter().map(Level::ordinal).collect();
    assert_eq!(ordinals, vec![1, 2]);
}

#[tokio::test]
async fn sqlite_progress_upsert_is_monotonic() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_progress?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    let user = UserId::random();
    repo.record_progress(user, 1, ProgressStatus::Completed, 5)
        .await
        .unwrap();
    // A later failed attempt must neither downgrade status nor lower score.
    repo.record_progress(user, 1, ProgressStatus::Unlocked, 0)
        .await
        .unwrap();

    let record = repo.get_progress(user, 1).await.unwrap().unwrap();
    assert_eq!(record.status, ProgressStatus::Completed);
    assert_eq!(record.high_score, 5);

    repo.record_progress(user, 1, ProgressStatus::Completed, 7)
        .await
        .unwrap();
    let record = repo.get_progress(user, 1).await.unwrap().unwrap();
    assert_eq!(record.high_score, 7);
}

#[tokio::test]
async fn sqlite_progress_listing_is_per_user_and_ordered() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_progress_list?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    let alice = UserId::random();
    let bob = UserId::random();

    repo.record_progress(alice, 2, ProgressStatus::Unlocked, 0)
        .await
        .unwrap();
    repo.record_progress(alice, 1, ProgressStatus::Completed, 4)
        .await
        .unwrap();
    repo.record_progress(bob, 1, ProgressStatus::Unlocked, 0)
        .await
        .unwrap();

    let records = repo.list_progress(alice).await.unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].level_ordinal, 1);
    assert_eq!(records[1].level_ordinal, 2);
    assert!(repo.get_progress(bob, 2).await.unwrap().is_none());
}
