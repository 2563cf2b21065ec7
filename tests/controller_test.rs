//! Integration tests for the controller façade
//!
//! Create, read, update, upsert, archive and delete against an in-memory
//! SQLite database, one unit of work per call.

mod common;

use common::*;
use recordhaus::prelude::*;

#[tokio::test]
async fn create_returns_the_generated_id() {
    let store = setup_store().await;
    let ctrl = persons(&store);

    let first = create_thiago(&ctrl).await;
    let second = create_person(&ctrl, "987654321", "Ada Lovelace", "1815-12-10").await;

    assert_eq!(first, RecordId::Numeric(1));
    assert_eq!(second, RecordId::Numeric(2));
}

#[tokio::test]
async fn create_can_return_the_stored_object() {
    let store = setup_store().await;
    let ctrl = persons(&store);

    let saved = ctrl
        .create(
            &json!({
                "tax_id": "123456789",
                "name": "Thiago Martin",
                "birth_date": "1990-01-01",
            }),
            Returning::Object,
        )
        .await
        .unwrap();

    let object = saved.object().expect("object returned");
    assert_eq!(object["id"], json!(1));
    assert_eq!(object["name"], json!("Thiago Martin"));
    assert_eq!(object["birth_date"], json!("1990-01-01"));
    assert_eq!(object["nickname"], Value::Null);
    assert_eq!(object["archived"], json!(false));
    assert_eq!(object["created_at"], object["updated_at"]);
    assert!(!object.contains_key("addresses"));
}

#[tokio::test]
async fn get_by_composite_selector() {
    let store = setup_store().await;
    let ctrl = persons(&store);
    let id = create_thiago(&ctrl).await;

    let selector = Selector::parallel(["id", "archived"], [json!(id), json!(false)]);
    let person = ctrl.get(&selector, &JoinSpec::new()).await.unwrap();
    assert_eq!(person["name"], json!("Thiago Martin"));

    let selector = Selector::parallel(["id", "archived"], [json!(id)]);
    let err = ctrl.get(&selector, &JoinSpec::new()).await.unwrap_err();
    assert_eq!(err.to_string(), "Selector has 2 field(s) but 1 value(s)");
}

#[tokio::test]
async fn get_of_a_missing_record_is_empty() {
    let store = setup_store().await;
    let ctrl = persons(&store);

    let person = ctrl.get(&Selector::new("id", 42), &JoinSpec::new()).await.unwrap();
    assert!(person.is_empty());
}

#[tokio::test]
async fn update_overwrites_only_supplied_fields() {
    let store = setup_store().await;
    let ctrl = persons(&store);
    let id = create_thiago(&ctrl).await;

    let saved = ctrl
        .update(
            &Selector::new("id", id),
            &json!({"name": "Thiago Martins", "nickname": null}),
            Returning::Id,
        )
        .await
        .unwrap();
    assert_eq!(saved, Saved::Id(id));

    let person = ctrl.get(&Selector::new("id", id), &JoinSpec::new()).await.unwrap();
    assert_eq!(person["name"], json!("Thiago Martins"));
    assert_eq!(person["nickname"], json!("nick-123456789"));

    let created: DateTime<Utc> = serde_json::from_value(person["created_at"].clone()).unwrap();
    let updated: DateTime<Utc> = serde_json::from_value(person["updated_at"].clone()).unwrap();
    assert!(updated >= created);
}

#[tokio::test]
async fn update_of_a_missing_record_is_not_found() {
    let store = setup_store().await;
    let ctrl = persons(&store);

    let err = ctrl
        .update(&Selector::new("id", 99), &json!({"name": "Nobody"}), Returning::Id)
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.to_string(), "PersonModel not found with id = 99");
}

#[tokio::test]
async fn update_cannot_move_the_primary_key() {
    let store = setup_store().await;
    let ctrl = persons(&store);
    let id = create_thiago(&ctrl).await;

    let err = ctrl
        .update(&Selector::new("id", id), &json!({"id": 7}), Returning::Id)
        .await
        .unwrap_err();
    assert_eq!(err, DaoError::Argument("The primary key of PersonModel cannot be changed".to_string()));
}

#[tokio::test]
async fn upsert_creates_then_updates() {
    let store = setup_store().await;
    let ctrl = persons(&store);
    create_thiago(&ctrl).await;

    let saved = ctrl
        .upsert(
            &Selector::new("name", "Thiago Martin"),
            &json!({"tax_id": "0123456789", "birth_date": "2002-01-01"}),
            Returning::Id,
        )
        .await
        .unwrap();
    let id = saved.id().unwrap();
    assert_eq!(id, RecordId::Numeric(1));

    let person = ctrl.get(&Selector::new("id", id), &JoinSpec::new()).await.unwrap();
    assert_eq!(person["tax_id"], json!("0123456789"));
    assert_eq!(person["birth_date"], json!("2002-01-01"));

    let saved = ctrl
        .upsert(
            &Selector::new("name", "Grace Hopper"),
            &json!({"tax_id": "555", "name": "Grace Hopper", "birth_date": "1906-12-09"}),
            Returning::Object,
        )
        .await
        .unwrap();
    let object = saved.object().unwrap();
    assert_eq!(object["id"], json!(2));
    assert_eq!(object["name"], json!("Grace Hopper"));
}

#[tokio::test]
async fn archive_flags_every_match() {
    let store = setup_store().await;
    let ctrl = persons(&store);
    let id = create_thiago(&ctrl).await;

    let selector = Selector::parallel(["id", "archived"], [json!(id), json!(false)]);
    ctrl.archive(&selector).await.unwrap();

    let person = ctrl.get(&Selector::new("id", id), &JoinSpec::new()).await.unwrap();
    assert_eq!(person["archived"], json!(true));

    let err = ctrl.archive(&selector).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn delete_removes_the_record() {
    let store = setup_store().await;
    let ctrl = persons(&store);
    let id = create_thiago(&ctrl).await;

    ctrl.delete(&Selector::new("id", id)).await.unwrap();
    let person = ctrl.get(&Selector::new("id", id), &JoinSpec::new()).await.unwrap();
    assert!(person.is_empty());

    let err = ctrl.delete(&Selector::new("id", id)).await.unwrap_err();
    assert_eq!(err.to_string(), "PersonModel not found with id = 1");
}

#[tokio::test]
async fn duplicate_unique_value_is_reported_and_rolled_back() {
    let store = setup_store().await;
    let ctrl = persons(&store);
    create_thiago(&ctrl).await;

    let err = ctrl
        .create(
            &json!({"tax_id": "123456789", "name": "Impostor", "birth_date": "1990-01-01"}),
            Returning::Id,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DaoError::DuplicateKey { .. }));
    assert_eq!(
        err.to_string(),
        "Error creating PersonModel. Duplicate entry: tax_id = 123456789."
    );

    let view = ctrl
        .list(&FilterSpec::new(), &OrderSpec::new(), &JoinSpec::new(), ListMode::All)
        .await
        .unwrap();
    assert_eq!(names(view.records()), vec!["Thiago Martin"]);
}

#[tokio::test]
async fn duplicate_on_update_names_the_action() {
    let store = setup_store().await;
    let ctrl = persons(&store);
    create_thiago(&ctrl).await;
    let other = create_person(&ctrl, "222", "Ada Lovelace", "1815-12-10").await;

    let err = ctrl
        .update(&Selector::new("id", other), &json!({"tax_id": "123456789"}), Returning::Id)
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Error updating PersonModel. Duplicate entry: tax_id = 123456789."
    );
}

#[tokio::test]
async fn malformed_payloads_are_argument_errors() {
    let store = setup_store().await;
    let ctrl = persons(&store);

    let err = ctrl
        .create(&json!({"tax_id": "1", "name": "X", "birth_date": "1990-01-01", "age": 3}), Returning::Id)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "PersonModel has no field named 'age'");

    let err = ctrl
        .create(&json!({"tax_id": "1", "name": "X", "birth_date": "someday"}), Returning::Id)
        .await
        .unwrap_err();
    assert!(matches!(err, DaoError::Argument(_)));
}

#[tokio::test]
async fn missing_required_column_is_a_persistence_error() {
    let store = setup_store().await;
    let ctrl = persons(&store);

    let err = ctrl
        .create(&json!({"tax_id": "1", "birth_date": "1990-01-01"}), Returning::Id)
        .await
        .unwrap_err();
    assert!(matches!(err, DaoError::Persistence { action: "creating", .. }));
    assert!(err.to_string().ends_with("when creating PersonModel in the database."));
}

#[tokio::test]
async fn typed_payloads_are_accepted() {
    #[derive(Serialize)]
    struct NewPerson<'a> {
        tax_id: &'a str,
        name: &'a str,
        birth_date: NaiveDate,
    }

    let store = setup_store().await;
    let ctrl = persons(&store);
    let payload = NewPerson {
        tax_id: "321",
        name: "Typed",
        birth_date: NaiveDate::from_ymd_opt(2000, 2, 29).unwrap(),
    };

    let saved = ctrl.create(&payload, Returning::Object).await.unwrap();
    assert_eq!(saved.object().unwrap()["birth_date"], json!("2000-02-29"));
}

#[tokio::test]
async fn uuid_keys_are_generated_client_side() {
    let store = setup_store().await;
    let ctrl = users(&store);

    let saved = ctrl
        .create(&json!({"email": "a@example.com"}), Returning::Id)
        .await
        .unwrap();
    let id = saved.id().unwrap();
    assert!(id.as_uuid().is_some());

    let user = ctrl.get(&Selector::new("id", id), &JoinSpec::new()).await.unwrap();
    assert_eq!(user["email"], json!("a@example.com"));
    assert_eq!(user["id"], json!(id.to_string()));

    let chosen = Uuid::new_v4();
    let saved = ctrl
        .create(&json!({"id": chosen, "email": "b@example.com"}), Returning::Object)
        .await
        .unwrap();
    assert_eq!(saved.object().unwrap()["id"], json!(chosen.to_string()));
}

#[tokio::test]
async fn enumerations_and_json_columns_round_trip() {
    let store = setup_store().await;
    let ctrl = tasks(&store);

    let saved = ctrl
        .create(
            &json!({"title": "Write docs", "status": "Open", "metadata": {"labels": ["docs"]}}),
            Returning::Object,
        )
        .await
        .unwrap();
    let task = saved.object().unwrap();
    assert_eq!(task["status"], json!("Open"));
    assert_eq!(task["metadata"], json!({"labels": ["docs"]}));
    assert!(!task.contains_key("archived"));

    ctrl.update(&Selector::new("title", "Write docs"), &json!({"status": "Done"}), Returning::Id)
        .await
        .unwrap();
    let view = ctrl
        .list(
            &FilterSpec::new().equals("status", "Done"),
            &OrderSpec::new(),
            &JoinSpec::new(),
            ListMode::All,
        )
        .await
        .unwrap();
    assert_eq!(view.records().len(), 1);

    let err = ctrl.archive(&Selector::new("title", "Write docs")).await.unwrap_err();
    assert_eq!(err.to_string(), "TaskModel does not support archiving");
}

#[tokio::test]
async fn duplicate_during_upsert_names_the_upsert() {
    let store = setup_store().await;
    let ctrl = persons(&store);
    create_thiago(&ctrl).await;
    let other = create_person(&ctrl, "222", "Ada Lovelace", "1815-12-10").await;

    let err = ctrl
        .upsert(
            &Selector::new("name", "Impostor"),
            &json!({"tax_id": "123456789", "name": "Impostor", "birth_date": "1990-01-01"}),
            Returning::Id,
        )
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Error upserting PersonModel. Duplicate entry: tax_id = 123456789."
    );

    let err = ctrl
        .upsert(&Selector::new("id", other), &json!({"tax_id": "123456789"}), Returning::Id)
        .await
        .unwrap_err();
    assert!(matches!(err, DaoError::DuplicateKey { action: "upserting", .. }));
}

#[tokio::test]
async fn malformed_json_column_fails_to_decode() {
    let store = setup_store().await;
    let DbPool::Sqlite(pool) = store.pool() else {
        panic!("test store is sqlite");
    };
    sqlx::query(
        "INSERT INTO tasks (title, status, metadata, created_at, updated_at)
         VALUES ('Broken', 'Open', '{not json', '2024-01-01T00:00:00+00:00', '2024-01-01T00:00:00+00:00')",
    )
    .execute(pool)
    .await
    .unwrap();

    let err = tasks(&store)
        .get(&Selector::new("title", "Broken"), &JoinSpec::new())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DaoError::Persistence { action: "reading", ref message, .. } if message.contains("tasks.metadata")
    ));
}
