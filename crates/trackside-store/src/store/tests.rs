use super::TrackStore;
use crate::error::Error;
use crate::types::RaceStatus;

async fn test_store() -> TrackStore {
    TrackStore::in_memory().await.unwrap()
}

#[tokio::test]
async fn test_create_and_get_team() {
    let store = test_store().await;
    let team = store.create_team("Red Rockets", None).await.unwrap();

    let got = store.get_team(team.id).await.unwrap();
    assert_eq!(got.name, "Red Rockets");
    assert_eq!(got.beacon_mac, None);
}

#[tokio::test]
async fn test_create_team_with_beacon() {
    let store = test_store().await;
    let team = store
        .create_team("Blue Bolts", Some("AA:BB:CC:DD:EE:FF"))
        .await
        .unwrap();
    assert_eq!(team.beacon_mac.as_deref(), Some("AA:BB:CC:DD:EE:FF"));
}

#[tokio::test]
async fn test_duplicate_team_name_conflict() {
    let store = test_store().await;
    store.create_team("Red Rockets", None).await.unwrap();

    let err = store.create_team("Red Rockets", None).await.unwrap_err();
    assert!(matches!(err, Error::Conflict(_)));
}

#[tokio::test]
async fn test_get_missing_team_not_found() {
    let store = test_store().await;
    let err = store.get_team(99).await.unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[tokio::test]
async fn test_list_teams_ordered() {
    let store = test_store().await;
    store.create_team("alpha", None).await.unwrap();
    store.create_team("bravo", None).await.unwrap();

    let teams = store.list_teams().await.unwrap();
    assert_eq!(teams.len(), 2);
    assert_eq!(teams[0].name, "alpha");
    assert_eq!(teams[1].name, "bravo");
}

#[tokio::test]
async fn test_update_team() {
    let store = test_store().await;
    let team = store.create_team("old name", None).await.unwrap();

    let updated = store
        .update_team(team.id, Some("new name"), Some("11:22:33:44:55:66"))
        .await
        .unwrap();
    assert_eq!(updated.name, "new name");
    assert_eq!(updated.beacon_mac.as_deref(), Some("11:22:33:44:55:66"));

    // None fields stay untouched
    let untouched = store.update_team(team.id, None, None).await.unwrap();
    assert_eq!(untouched.name, "new name");
    assert_eq!(untouched.beacon_mac.as_deref(), Some("11:22:33:44:55:66"));
}

#[tokio::test]
async fn test_update_team_duplicate_name_conflict() {
    let store = test_store().await;
    store.create_team("taken", None).await.unwrap();
    let team = store.create_team("other", None).await.unwrap();

    let err = store
        .update_team(team.id, Some("taken"), None)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Conflict(_)));
}

#[tokio::test]
async fn test_update_team_own_name_is_ok() {
    let store = test_store().await;
    let team = store.create_team("stable", None).await.unwrap();

    let updated = store
        .update_team(team.id, Some("stable"), None)
        .await
        .unwrap();
    assert_eq!(updated.name, "stable");
}

#[tokio::test]
async fn test_delete_team() {
    let store = test_store().await;
    let team = store.create_team("doomed", None).await.unwrap();

    store.delete_team(team.id).await.unwrap();
    assert!(matches!(
        store.get_team(team.id).await.unwrap_err(),
        Error::NotFound(_)
    ));
    // Deleting again is NotFound
    assert!(matches!(
        store.delete_team(team.id).await.unwrap_err(),
        Error::NotFound(_)
    ));
}

#[tokio::test]
async fn test_delete_team_removes_race_assignment() {
    let store = test_store().await;
    let team = store.create_team("leaver", None).await.unwrap();
    let race = store.create_race("Heat 1", 30, &[team.id]).await.unwrap();
    assert_eq!(race.teams.len(), 1);

    store.delete_team(team.id).await.unwrap();

    let race = store.get_race(race.id).await.unwrap();
    assert!(race.teams.is_empty());
}

#[tokio::test]
async fn test_assign_beacon() {
    let store = test_store().await;
    let team = store.create_team("tagged", None).await.unwrap();

    let updated = store
        .assign_beacon(team.id, "DE:AD:BE:EF:00:01")
        .await
        .unwrap();
    assert_eq!(updated.beacon_mac.as_deref(), Some("DE:AD:BE:EF:00:01"));
}

#[tokio::test]
async fn test_team_summaries() {
    let store = test_store().await;
    let team = store
        .create_team("summarized", Some("AA:00:00:00:00:01"))
        .await
        .unwrap();

    let summaries = store.list_team_summaries().await.unwrap();
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].id, team.id);
    assert_eq!(summaries[0].name, "summarized");
}

#[tokio::test]
async fn test_create_race_with_teams() {
    let store = test_store().await;
    let a = store.create_team("a", None).await.unwrap();
    let b = store.create_team("b", None).await.unwrap();

    let race = store
        .create_race("Qualifying", 45, &[a.id, b.id])
        .await
        .unwrap();
    assert_eq!(race.name, "Qualifying");
    assert_eq!(race.duration_minutes, 45);
    assert_eq!(race.status, RaceStatus::Planned);
    assert!(race.started_at.is_none());
    assert!(race.ended_at.is_none());
    assert_eq!(race.teams.len(), 2);
    assert_eq!(race.teams[0].name, "a");
    assert_eq!(race.teams[1].name, "b");
}

#[tokio::test]
async fn test_create_race_unknown_team() {
    let store = test_store().await;
    let team = store.create_team("real", None).await.unwrap();

    let err = store
        .create_race("Ghost race", 30, &[team.id, 404, 405])
        .await
        .unwrap_err();
    match err {
        Error::NotFound(msg) => assert!(msg.contains("unknown team ids")),
        other => panic!("expected NotFound, got {other:?}"),
    }
}

#[tokio::test]
async fn test_list_races_newest_first() {
    let store = test_store().await;
    let first = store.create_race("first", 30, &[]).await.unwrap();
    let second = store.create_race("second", 30, &[]).await.unwrap();

    let races = store.list_races().await.unwrap();
    assert_eq!(races.len(), 2);
    assert_eq!(races[0].id, second.id);
    assert_eq!(races[1].id, first.id);
}

#[tokio::test]
async fn test_race_lifecycle() {
    let store = test_store().await;
    let race = store.create_race("Final", 60, &[]).await.unwrap();

    let running = store.start_race(race.id).await.unwrap();
    assert_eq!(running.status, RaceStatus::Running);
    let first_start = running.started_at.unwrap();

    let paused = store.pause_race(race.id).await.unwrap();
    assert_eq!(paused.status, RaceStatus::Paused);

    // Resume keeps the original start timestamp
    let resumed = store.start_race(race.id).await.unwrap();
    assert_eq!(resumed.status, RaceStatus::Running);
    assert_eq!(resumed.started_at.unwrap(), first_start);

    let finished = store.stop_race(race.id).await.unwrap();
    assert_eq!(finished.status, RaceStatus::Finished);
    assert!(finished.ended_at.is_some());
}

#[tokio::test]
async fn test_stop_paused_race() {
    let store = test_store().await;
    let race = store.create_race("cut short", 30, &[]).await.unwrap();
    store.start_race(race.id).await.unwrap();
    store.pause_race(race.id).await.unwrap();

    let finished = store.stop_race(race.id).await.unwrap();
    assert_eq!(finished.status, RaceStatus::Finished);
}

#[tokio::test]
async fn test_start_finished_race_conflict() {
    let store = test_store().await;
    let race = store.create_race("done", 30, &[]).await.unwrap();
    store.start_race(race.id).await.unwrap();
    store.stop_race(race.id).await.unwrap();

    let err = store.start_race(race.id).await.unwrap_err();
    assert!(matches!(err, Error::Conflict(_)));
}

#[tokio::test]
async fn test_pause_not_running_conflict() {
    let store = test_store().await;
    let race = store.create_race("idle", 30, &[]).await.unwrap();

    let err = store.pause_race(race.id).await.unwrap_err();
    assert!(matches!(err, Error::Conflict(_)));
}

#[tokio::test]
async fn test_stop_planned_race_conflict() {
    let store = test_store().await;
    let race = store.create_race("never ran", 30, &[]).await.unwrap();

    let err = store.stop_race(race.id).await.unwrap_err();
    assert!(matches!(err, Error::Conflict(_)));
}

#[tokio::test]
async fn test_update_race() {
    let store = test_store().await;
    let race = store.create_race("draft", 30, &[]).await.unwrap();

    let updated = store
        .update_race(race.id, Some("Grand Final"), Some(90))
        .await
        .unwrap();
    assert_eq!(updated.name, "Grand Final");
    assert_eq!(updated.duration_minutes, 90);

    let untouched = store.update_race(race.id, None, None).await.unwrap();
    assert_eq!(untouched.name, "Grand Final");
    assert_eq!(untouched.duration_minutes, 90);
}

#[tokio::test]
async fn test_delete_race() {
    let store = test_store().await;
    let team = store.create_team("stays", None).await.unwrap();
    let race = store.create_race("gone", 30, &[team.id]).await.unwrap();

    store.delete_race(race.id).await.unwrap();
    assert!(matches!(
        store.get_race(race.id).await.unwrap_err(),
        Error::NotFound(_)
    ));
    // Team itself survives
    assert!(store.get_team(team.id).await.is_ok());
}

#[tokio::test]
async fn test_counts() {
    let store = test_store().await;
    assert_eq!(store.team_count().await.unwrap(), 0);
    assert_eq!(store.race_count().await.unwrap(), 0);

    store.create_team("one", None).await.unwrap();
    store.create_race("r", 30, &[]).await.unwrap();
    assert_eq!(store.team_count().await.unwrap(), 1);
    assert_eq!(store.race_count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_ping() {
    let store = test_store().await;
    store.ping().await.unwrap();
}

#[tokio::test]
async fn test_from_path_creates_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("track.db");

    let store = TrackStore::from_path(&path).await.unwrap();
    store.create_team("persisted", None).await.unwrap();
    assert!(path.exists());

    let teams = store.list_teams().await.unwrap();
    assert_eq!(teams.len(), 1);
}
