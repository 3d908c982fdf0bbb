use chrono::{Duration, TimeZone, Utc};
use essaylab_core::db::open_db_in_memory;
use essaylab_core::{
    DemographicsInput, DemographicsService, DemographicsServiceError, FixedClock, ParticipantId,
    ParticipantRegistry, SqliteDemographicsRepository, SqliteParticipantRepository,
};
use std::sync::Arc;

fn complete_input(asurite: &str) -> DemographicsInput {
    DemographicsInput {
        asurite: Some(asurite.to_string()),
        gender: Some("Man".to_string()),
        age: Some("25-34".to_string()),
        race_ethnicity: Some("Hispanic_Origin=Yes; Race=White".to_string()),
        major: Some("Linguistics".to_string()),
        major_category: Some("Humanities".to_string()),
        language_background: Some("English only".to_string()),
        ..DemographicsInput::default()
    }
}

fn demographics_count(conn: &rusqlite::Connection) -> i64 {
    conn.query_row("SELECT COUNT(*) FROM demographics;", [], |row| row.get(0))
        .unwrap()
}

#[test]
fn save_creates_participant_and_record() {
    let mut conn = open_db_in_memory().unwrap();
    let now = Utc.with_ymd_and_hms(2025, 9, 11, 9, 0, 0).unwrap();
    let clock = Arc::new(FixedClock::new(now));
    let mut service =
        DemographicsService::new(SqliteDemographicsRepository::new(&mut conn), clock.clone());

    let mut input = complete_input(" JDoe ");
    input.program_use_only = Some(true);
    let saved = service.save_demographics(&input).unwrap();

    assert_eq!(saved.participant.id.as_str(), "jdoe");
    assert!(saved.participant.program_use_only);
    assert_eq!(saved.record.major, "Linguistics");
    assert!(saved.record.program_use_only);
    assert_eq!(saved.record.created_at, now);
    assert_eq!(saved.record.updated_at, now);

    let exported = serde_json::to_value(&saved.record).unwrap();
    assert_eq!(exported["participant_id"], "jdoe");
    assert_eq!(exported["program_use_only"], true);

    let participant = ParticipantId::normalize("jdoe").unwrap();
    assert_eq!(
        service.get_demographics(&participant).unwrap(),
        Some(saved.record)
    );
}

#[test]
fn saving_again_replaces_fields_and_keeps_one_row() {
    let mut conn = open_db_in_memory().unwrap();
    let start = Utc.with_ymd_and_hms(2025, 9, 11, 9, 0, 0).unwrap();
    let clock = Arc::new(FixedClock::new(start));
    {
        let mut service =
            DemographicsService::new(SqliteDemographicsRepository::new(&mut conn), clock.clone());
        let first = service.save_demographics(&complete_input("jdoe")).unwrap();

        clock.advance(Duration::minutes(5));
        let mut revised = complete_input("JDOE");
        revised.major = Some("Computer Science".to_string());
        revised.major_category = Some("STEM".to_string());
        let second = service.save_demographics(&revised).unwrap();

        assert_eq!(second.record.id, first.record.id);
        assert_eq!(second.record.major, "Computer Science");
        assert_eq!(second.record.created_at, start);
        assert_eq!(second.record.updated_at, start + Duration::minutes(5));
    }
    assert_eq!(demographics_count(&conn), 1);
}

#[test]
fn invalid_answers_write_nothing() {
    let mut conn = open_db_in_memory().unwrap();
    let clock = Arc::new(FixedClock::new(Utc::now()));
    {
        let mut service =
            DemographicsService::new(SqliteDemographicsRepository::new(&mut conn), clock);
        let mut input = complete_input("jdoe");
        input.gender = Some("   ".to_string());
        let err = service.save_demographics(&input).unwrap_err();
        match err {
            DemographicsServiceError::Validation(errors) => {
                assert_eq!(errors, vec!["Q2 (Gender) is required.".to_string()]);
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    assert_eq!(demographics_count(&conn), 0);
    let participants: i64 = conn
        .query_row("SELECT COUNT(*) FROM participants;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(participants, 0);
}

#[test]
fn omitted_consent_keeps_registry_value() {
    let mut conn = open_db_in_memory().unwrap();
    let clock = Arc::new(FixedClock::new(Utc::now()));
    let participant = ParticipantId::normalize("jdoe").unwrap();
    {
        let registry =
            ParticipantRegistry::new(SqliteParticipantRepository::new(&conn), clock.clone());
        registry.ensure_participant(&participant, Some(true)).unwrap();
    }

    let mut service =
        DemographicsService::new(SqliteDemographicsRepository::new(&mut conn), clock.clone());
    let saved = service.save_demographics(&complete_input("jdoe")).unwrap();
    assert!(saved.participant.program_use_only);
    assert!(saved.record.program_use_only);

    let mut withdrawn = complete_input("jdoe");
    withdrawn.program_use_only = Some(false);
    let saved = service.save_demographics(&withdrawn).unwrap();
    assert!(!saved.participant.program_use_only);
}
