use chrono::{TimeZone, Utc};
use essaylab_core::db::open_db;
use essaylab_core::{
    Clock, EssayBackup, FixedClock, ParticipantId, SessionService, SessionServiceError,
    SqliteSessionRepository,
};
use std::sync::{Arc, Barrier};
use std::thread;

const SUBMITTERS: usize = 4;

#[test]
fn exactly_one_of_many_concurrent_submissions_wins() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("app.db");
    let clock: Arc<dyn Clock> = Arc::new(FixedClock::new(
        Utc.with_ymd_and_hms(2025, 9, 11, 16, 0, 0).unwrap(),
    ));

    let session_id = {
        let mut conn = open_db(&db_path).unwrap();
        let mut service = SessionService::new(
            SqliteSessionRepository::new(&mut conn),
            clock.clone(),
            EssayBackup::disabled(),
        );
        let participant = ParticipantId::normalize("racer").unwrap();
        service.start_session(&participant).unwrap().session_id
    };

    let barrier = Arc::new(Barrier::new(SUBMITTERS));
    let handles: Vec<_> = (0..SUBMITTERS)
        .map(|index| {
            let barrier = barrier.clone();
            let clock = clock.clone();
            let db_path = db_path.clone();
            let session_id = session_id.to_string();
            thread::spawn(move || {
                let mut conn = open_db(&db_path).unwrap();
                let service = SessionService::new(
                    SqliteSessionRepository::new(&mut conn),
                    clock,
                    EssayBackup::disabled(),
                );
                barrier.wait();
                service
                    .submit_essay(&session_id, Some(&format!("essay from writer {index}")))
                    .map(|submitted| (index, submitted))
            })
        })
        .collect();

    let results: Vec<_> = handles
        .into_iter()
        .map(|handle| handle.join().unwrap())
        .collect();

    let winners: Vec<usize> = results
        .iter()
        .filter_map(|result| result.as_ref().ok().map(|(index, _)| *index))
        .collect();
    assert_eq!(winners.len(), 1, "results: {results:?}");
    for result in &results {
        if let Err(err) = result {
            assert!(
                matches!(err, SessionServiceError::AlreadySubmitted(id) if *id == session_id),
                "unexpected error: {err:?}"
            );
        }
    }

    let mut conn = open_db(&db_path).unwrap();
    let service = SessionService::new(
        SqliteSessionRepository::new(&mut conn),
        clock,
        EssayBackup::disabled(),
    );
    let stored = service.get_session(session_id).unwrap().unwrap();
    assert_eq!(
        stored.essay_text,
        format!("essay from writer {}", winners[0])
    );
}
