use userstore_core::db::open_db_in_memory;
use userstore_core::{
    NewUser, RecordStore, SqliteRecordBackend, StoreError, UserService, UserServiceError,
};

fn new_user(username: &str, firstname: Option<&str>, lastname: Option<&str>) -> NewUser {
    NewUser {
        username: username.to_string(),
        firstname: firstname.map(str::to_string),
        lastname: lastname.map(str::to_string),
    }
}

#[test]
fn create_and_get_user_roundtrip() {
    let conn = open_db_in_memory().unwrap();
    let service = UserService::new(RecordStore::new(
        SqliteRecordBackend::try_new(&conn).unwrap(),
    ));

    let created = service
        .create(&new_user("alice", Some("Alice"), Some("Smith")))
        .unwrap();
    assert_eq!(created.username, "alice");
    assert_eq!(created.firstname.as_deref(), Some("Alice"));
    assert_eq!(created.lastname.as_deref(), Some("Smith"));

    assert_eq!(service.get("alice").unwrap(), created);
}

#[test]
fn duplicate_username_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let service = UserService::new(RecordStore::new(
        SqliteRecordBackend::try_new(&conn).unwrap(),
    ));

    service
        .create(&new_user("alice", Some("Alice"), None))
        .unwrap();
    let err = service
        .create(&new_user("alice", Some("Other"), None))
        .unwrap_err();

    assert!(matches!(err, UserServiceError::AlreadyExists(ref name) if name == "alice"));
    assert!(err.to_string().contains("user already exists"));
    assert_eq!(
        service.get("alice").unwrap().firstname.as_deref(),
        Some("Alice")
    );
}

#[test]
fn missing_username_is_wrong_parameters() {
    let conn = open_db_in_memory().unwrap();
    let service = UserService::new(RecordStore::new(
        SqliteRecordBackend::try_new(&conn).unwrap(),
    ));

    let err = service.create(&new_user("", Some("Nobody"), None)).unwrap_err();
    assert!(matches!(err, UserServiceError::MissingUsername));
    assert!(matches!(
        service.get("").unwrap_err(),
        UserServiceError::MissingUsername
    ));
}

#[test]
fn unknown_user_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let service = UserService::new(RecordStore::new(
        SqliteRecordBackend::try_new(&conn).unwrap(),
    ));

    let err = service.get("ghost").unwrap_err();
    assert!(matches!(err, UserServiceError::NotFound(ref name) if name == "ghost"));
}

#[test]
fn user_service_stores_only_named_fields() {
    let conn = open_db_in_memory().unwrap();
    let service = UserService::new(RecordStore::new(
        SqliteRecordBackend::try_new(&conn).unwrap(),
    ));

    let request: NewUser = serde_json::from_str(
        r#"{"username":"bob","firstname":"Bob","email":"bob@example.com"}"#,
    )
    .unwrap();
    service.create(&request).unwrap();

    let record = service.store().get("bob").unwrap();
    assert_eq!(record.fields.len(), 1);
    assert_eq!(record.field("firstname"), Some("Bob"));
}

#[test]
fn user_created_through_generic_store_is_readable() {
    let conn = open_db_in_memory().unwrap();
    let service = UserService::new(RecordStore::new(
        SqliteRecordBackend::try_new(&conn).unwrap(),
    ));
    let mut fields = userstore_core::Fields::new();
    fields.insert("lastname".to_string(), "Jones".to_string());
    service.store().create_if_absent("erin", fields).unwrap();

    let user = service.get("erin").unwrap();
    let json = serde_json::to_value(&user).unwrap();
    assert_eq!(
        json,
        serde_json::json!({"username": "erin", "lastname": "Jones"})
    );
    assert!(matches!(
        service.store().get("frank"),
        Err(StoreError::NotFound(_))
    ));
}
