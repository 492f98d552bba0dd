use quiz_core::model::{PassRatio, PlayerId, QuestionDraft, QuestionId, QuizProgress};
use quiz_core::time::fixed_now;
use quiz_core::{PoolSize, QuestionSelector};
use rand::SeedableRng;
use rand::rngs::StdRng;
use storage::repository::{ProgressRepository, QuestionRepository, StorageError};
use storage::sqlite::SqliteRepository;

fn draft(n: u64) -> QuestionDraft {
    QuestionDraft {
        prompt: format!("Question {n}?"),
        choices: vec!["A".into(), "B".into(), "C".into()],
        correct_choice: 2,
        reference: Some(format!("Psalm {n}:1")),
    }
}

async fn connect(name: &str) -> SqliteRepository {
    let url = format!("sqlite:file:{name}?mode=memory&cache=shared");
    let repo = SqliteRepository::connect(&url).await.expect("connect");
    repo.migrate().await.expect("migrate");
    repo
}

#[tokio::test]
async fn sqlite_assigns_ids_and_fetches_in_request_order() {
    let repo = connect("memdb_questions").await;
    for n in 1..=4 {
        let question = repo.insert_question(draft(n)).await.unwrap();
        assert_eq!(question.id(), QuestionId::new(n));
    }
    assert_eq!(repo.count_questions().await.unwrap(), 4);

    let fetched = repo
        .get_questions(&[QuestionId::new(3), QuestionId::new(1)])
        .await
        .unwrap();
    assert_eq!(fetched[0].prompt(), "Question 3?");
    assert_eq!(fetched[0].choices().len(), 3);
    assert_eq!(fetched[0].reference(), Some("Psalm 3:1"));
    assert_eq!(fetched[1].id(), QuestionId::new(1));

    let err = repo
        .get_questions(&[QuestionId::new(99)])
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::NotFound));
}

#[tokio::test]
async fn sqlite_migrations_are_idempotent() {
    let repo = connect("memdb_migrate_twice").await;
    repo.migrate().await.expect("second migrate");
    assert_eq!(repo.count_questions().await.unwrap(), 0);
}

#[tokio::test]
async fn sqlite_progress_round_trip_and_retake() {
    let repo = connect("memdb_progress").await;
    for n in 1..=10 {
        repo.insert_question(draft(n)).await.unwrap();
    }

    let player = PlayerId::new(3);
    assert!(repo.get_progress(player).await.unwrap().is_none());

    let selector = QuestionSelector::new(PoolSize::new(10).unwrap());
    let mut rng = StdRng::seed_from_u64(11);
    let mut progress = QuizProgress::start(player, fixed_now());

    let first = selector.select(progress.used(), 4, &mut rng).unwrap();
    progress.apply_selection(&first, fixed_now()).unwrap();
    let questions = repo.get_questions(&first.selected).await.unwrap();
    let answers: Vec<(QuestionId, usize)> = first.selected.iter().map(|id| (*id, 2)).collect();
    progress
        .grade(&answers, &questions, PassRatio::default(), fixed_now())
        .unwrap();

    let second = selector.select(progress.used(), 3, &mut rng).unwrap();
    progress.apply_selection(&second, fixed_now()).unwrap();
    repo.save_progress(&progress).await.unwrap();

    let loaded = repo.get_progress(player).await.unwrap().expect("saved");
    assert_eq!(loaded, progress);
    assert_eq!(loaded.used().len(), 7);
    assert_eq!(loaded.levels()[0].correct(), Some(4));
    assert_eq!(loaded.levels()[1].questions(), second.selected.as_slice());
    assert_eq!(loaded.levels()[1].requested(), 3);
    assert!(loaded.pending_level().is_some());

    let mut retaken = loaded;
    retaken.reset(fixed_now());
    repo.save_progress(&retaken).await.unwrap();

    let loaded = repo.get_progress(player).await.unwrap().expect("saved");
    assert!(loaded.used().is_empty());
    assert!(loaded.levels().is_empty());
    assert_eq!(loaded.attempts(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn sqlite_concurrent_inserts_get_dense_ids() {
    let dir = tempfile::tempdir().expect("tempdir");
    let url = format!(
        "sqlite://{}?mode=rwc",
        dir.path().join("quiz.sqlite3").display()
    );
    let repo = SqliteRepository::connect(&url).await.expect("connect");
    repo.migrate().await.expect("migrate");

    let handles: Vec<_> = (1..=20)
        .map(|n| {
            let repo = repo.clone();
            tokio::spawn(async move { repo.insert_question(draft(n)).await })
        })
        .collect();

    let mut ids = Vec::new();
    for handle in handles {
        ids.push(handle.await.expect("join").expect("insert").id());
    }
    ids.sort();
    assert_eq!(ids, (1..=20).map(QuestionId::new).collect::<Vec<_>>());
    assert_eq!(repo.count_questions().await.unwrap(), 20);
}
