//! End-to-end tests against a real SQLite database file.
//!
//! Each test gets its own temporary database, creates the tables it needs
//! through the schema layer and drives them through the repository.

#![cfg(feature = "sqlite")]

mod common;

use chrono::Local;
use serde_json::json;

use common::{sqlite_db, Post};
use sqlbridge::core::{CanonicalColumnType, TableColumn};
use sqlbridge::repository::is_valid_guid;
use sqlbridge::schema;
use sqlbridge::{CompiledStatement, Entity, Query, Record, Repository, SqlValue};

async fn posts_repository(db: &sqlbridge::Database) -> Repository<Post> {
    schema::create_table(db, Post::TABLE_NAME, &Post::table_columns())
        .await
        .expect("create Posts");
    Repository::new(db.clone())
}

// =============================================================================
// Schema
// =============================================================================

#[tokio::test]
async fn test_create_table_and_read_columns_back() {
    let fixture = sqlite_db();
    let db = &fixture.db;
    posts_repository(db).await;

    let columns = schema::get_table_columns(db, "Posts").await.unwrap();
    let names: Vec<&str> = columns.iter().map(|c| c.attribute_name.as_str()).collect();
    assert_eq!(
        names,
        ["Id", "Guid", "LastModifiedDate", "Title", "Hits", "Published", "Extend"]
    );

    let id = &columns[0];
    assert!(id.is_identity);
    assert!(id.is_primary_key);
    assert_eq!(id.data_type, CanonicalColumnType::Integer);

    let title = &columns[3];
    assert_eq!(title.data_type, CanonicalColumnType::VarChar);
    assert_eq!(title.data_length, 200);
    assert!(!title.is_identity);

    assert_eq!(columns[5].data_type, CanonicalColumnType::Boolean);
    assert_eq!(columns[6].data_type, CanonicalColumnType::Text);

    let tables = schema::get_table_names(db).await.unwrap();
    assert!(tables.iter().any(|t| t == "Posts"));
}

#[tokio::test]
async fn test_unknown_table_has_no_columns() {
    let fixture = sqlite_db();
    let columns = schema::get_table_columns(&fixture.db, "Nowhere").await.unwrap();
    assert!(columns.is_empty());
}

#[tokio::test]
async fn test_table_existence() {
    let fixture = sqlite_db();
    let db = &fixture.db;
    posts_repository(db).await;

    assert!(schema::is_table_exists(db, "Posts").await);
    assert!(!schema::is_table_exists(db, "Comments").await);
    assert!(!schema::is_table_exists(db, "bad name; --").await);
}

#[tokio::test]
async fn test_alter_table_adds_and_drops() {
    let fixture = sqlite_db();
    let db = &fixture.db;
    let initial = vec![
        TableColumn::identity(),
        TableColumn::varchar("Name", 100),
        TableColumn::new("Obsolete", CanonicalColumnType::Text),
    ];
    schema::create_table(db, "Items", &initial).await.unwrap();

    let requested = vec![
        TableColumn::identity(),
        TableColumn::varchar("name", 100),
        TableColumn::new("Notes", CanonicalColumnType::Text),
        TableColumn::new("Score", CanonicalColumnType::Integer),
    ];
    let ran = schema::alter_table(db, "Items", &requested, &["Obsolete".to_string()])
        .await
        .unwrap();
    assert_eq!(ran.len(), 3);

    let names: Vec<String> = schema::get_table_columns(db, "Items")
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.attribute_name)
        .collect();
    assert_eq!(names, ["Id", "Name", "Notes", "Score"]);

    // Running it again is a no-op
    let ran = schema::alter_table(db, "Items", &requested, &["Obsolete".to_string()])
        .await
        .unwrap();
    assert!(ran.is_empty());
}

#[tokio::test]
async fn test_add_identity_column_when_missing() {
    let fixture = sqlite_db();
    let db = &fixture.db;
    let mut columns = vec![TableColumn::varchar("Name", 50)];
    schema::create_table(db, "Legacy", &columns).await.unwrap();
    for name in ["first", "second"] {
        let row = CompiledStatement::raw(
            db.dialect(),
            "INSERT INTO \"Legacy\" (\"Name\") VALUES (?)",
            vec![SqlValue::from(name)],
        );
        db.execute(&row).await.unwrap();
    }

    let name = schema::add_identity_column_if_not_exists(db, "Legacy", &mut columns)
        .await
        .unwrap();
    assert_eq!(name, "Id");
    assert_eq!(columns.len(), 2);
    assert!(columns[0].is_identity);

    let live = schema::get_table_columns(db, "Legacy").await.unwrap();
    assert!(live.iter().any(|c| c.is_named("Id") && c.is_identity));

    // Existing rows are numbered in insertion order and new rows get ids
    let legacy: Repository<Record> = Repository::with_table(db.clone(), "Legacy", columns.clone());
    let rows = legacy.get_all(Query::new().order_by("Id")).await.unwrap();
    let ids: Vec<i64> = rows.iter().map(|r| r.base.id).collect();
    assert_eq!(ids, [1, 2]);
    assert_eq!(rows[0].get("Name"), Some(&SqlValue::from("first")));

    let id = legacy
        .insert(&mut Record::new().with("Name", "third"))
        .await
        .unwrap();
    assert_eq!(id, 3);

    // Already present: nothing changes
    let name = schema::add_identity_column_if_not_exists(db, "Legacy", &mut columns)
        .await
        .unwrap();
    assert_eq!(name, "Id");
    assert_eq!(columns.len(), 2);
}

#[tokio::test]
async fn test_create_index_and_drop_table() {
    let fixture = sqlite_db();
    let db = &fixture.db;
    posts_repository(db).await;

    schema::create_index(db, "Posts", "IX_Posts_Title", &["Title", "Hits DESC"])
        .await
        .unwrap();
    let index = CompiledStatement::raw(
        db.dialect(),
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'index' AND name = ?",
        vec![SqlValue::from("IX_Posts_Title")],
    );
    let count = db.query_scalar(&index).await.unwrap();
    assert_eq!(count.and_then(|v| v.as_i64()), Some(1));

    assert!(schema::create_index(db, "Missing", "IX_Missing_Title", &["Title"])
        .await
        .is_err());

    schema::drop_table(db, "Posts").await.unwrap();
    assert!(!schema::is_table_exists(db, "Posts").await);
}

// =============================================================================
// Repository reads and writes
// =============================================================================

#[tokio::test]
async fn test_insert_then_get() {
    let fixture = sqlite_db();
    let posts = posts_repository(&fixture.db).await;

    let before = Local::now().naive_local();
    let mut post = Post::new("Hello", 3);
    post.published = true;
    post.base.extend.insert("color".to_string(), json!("red"));
    let id = posts.insert(&mut post).await.unwrap();

    assert!(id > 0);
    assert_eq!(post.base.id, id);
    assert!(is_valid_guid(&post.base.guid));

    let loaded = posts.get(id).await.unwrap().expect("inserted row");
    assert_eq!(loaded.title, "Hello");
    assert_eq!(loaded.hits, 3);
    assert!(loaded.published);
    assert_eq!(loaded.base.guid, post.base.guid);
    assert_eq!(loaded.base.extend.get("color"), Some(&json!("red")));

    let stamped = loaded.base.last_modified_date.expect("timestamp");
    assert!((stamped - before).num_seconds().abs() < 5);

    let by_guid = posts.get_by_guid(&post.base.guid).await.unwrap();
    assert_eq!(by_guid.map(|p| p.base.id), Some(id));
}

#[tokio::test]
async fn test_invalid_keys_skip_the_database() {
    let fixture = sqlite_db();
    let posts = posts_repository(&fixture.db).await;
    let compiled = fixture.db.compile_count();

    assert!(posts.get(0).await.unwrap().is_none());
    assert!(posts.get(-1).await.unwrap().is_none());
    assert!(posts.get_by_guid("bad").await.unwrap().is_none());
    assert!(!posts.exists_id(0).await.unwrap());
    assert!(!posts.exists_guid("").await.unwrap());
    assert_eq!(posts.delete(-5).await.unwrap(), 0);

    assert_eq!(fixture.db.compile_count(), compiled);
}

#[tokio::test]
async fn test_update_entity() {
    let fixture = sqlite_db();
    let posts = posts_repository(&fixture.db).await;

    let mut post = Post::new("Draft", 0);
    let id = posts.insert(&mut post).await.unwrap();
    let guid = post.base.guid.clone();

    post.title = "Final".to_string();
    post.published = true;
    assert_eq!(posts.update(&mut post).await.unwrap(), 1);

    let loaded = posts.get(id).await.unwrap().unwrap();
    assert_eq!(loaded.title, "Final");
    assert!(loaded.published);
    assert_eq!(loaded.base.guid, guid);

    let mut unsaved = Post::new("Nope", 0);
    let err = posts.update(&mut unsaved).await.unwrap_err();
    assert!(err.is_configuration());
}

#[tokio::test]
async fn test_update_all_and_counters() {
    let fixture = sqlite_db();
    let posts = posts_repository(&fixture.db).await;

    let mut first = Post::new("a", 1);
    let mut second = Post::new("b", 10);
    let ids = posts
        .bulk_insert(std::slice::from_mut(&mut first))
        .await
        .unwrap();
    posts.insert(&mut second).await.unwrap();
    assert_eq!(ids, vec![first.base.id]);

    let changed = posts
        .update_all(Query::new().where_in("Id", [first.base.id, second.base.id]).set("Published", true))
        .await
        .unwrap();
    assert_eq!(changed, 2);
    assert_eq!(posts.count(Query::new().where_eq("Published", true)).await.unwrap(), 2);

    posts
        .increment_all(Query::eq("Id", first.base.id), "Hits", 4)
        .await
        .unwrap();
    posts
        .decrement_all(Query::eq("Id", second.base.id), "Hits", 3)
        .await
        .unwrap();

    let first = posts.get(first.base.id).await.unwrap().unwrap();
    let second = posts.get(second.base.id).await.unwrap().unwrap();
    assert_eq!(first.hits, 5);
    assert_eq!(second.hits, 7);
    assert!(first.base.last_modified_date.is_some());
}

#[tokio::test]
async fn test_aggregates() {
    let fixture = sqlite_db();
    let posts = posts_repository(&fixture.db).await;
    let hits = || Query::new().select(["Hits"]);

    assert_eq!(posts.count(Query::new()).await.unwrap(), 0);
    assert_eq!(posts.sum(hits()).await.unwrap(), 0);
    assert_eq!(posts.max(hits()).await.unwrap(), None);
    assert!(!posts.exists(Query::new()).await.unwrap());

    for (title, n) in [("x", 2), ("y", 9), ("z", 4)] {
        posts.insert(&mut Post::new(title, n)).await.unwrap();
    }

    assert_eq!(posts.count(Query::new()).await.unwrap(), 3);
    assert_eq!(posts.sum(hits()).await.unwrap(), 15);
    assert_eq!(posts.max(hits()).await.unwrap(), Some(9));
    assert!(posts.exists(Query::new().where_eq("Title", "y")).await.unwrap());
    assert!(!posts.exists(Query::new().where_eq("Title", "w")).await.unwrap());

    // Sum needs exactly one selected column
    let err = posts.sum(Query::new()).await.unwrap_err();
    assert!(err.is_configuration());
}

#[tokio::test]
async fn test_paging_and_values() {
    let fixture = sqlite_db();
    let posts = posts_repository(&fixture.db).await;
    for n in 1..=5 {
        posts
            .insert(&mut Post::new(&format!("post {}", n), n))
            .await
            .unwrap();
    }

    let page = posts
        .get_all(Query::new().order_by_desc("Hits").offset(1).limit(2))
        .await
        .unwrap();
    let hits: Vec<i64> = page.iter().map(|p| p.hits).collect();
    assert_eq!(hits, vec![4, 3]);

    let titles = posts
        .get_values(Query::new().select(["Title"]).where_op("Hits", sqlbridge::Operator::Gt, 3).order_by("Hits"))
        .await
        .unwrap();
    assert_eq!(titles, vec![SqlValue::from("post 4"), SqlValue::from("post 5")]);

    let top = posts
        .get_value(Query::new().select(["Title"]).order_by_desc("Hits"))
        .await
        .unwrap();
    assert_eq!(top, Some(SqlValue::from("post 5")));
}

#[tokio::test]
async fn test_delete() {
    let fixture = sqlite_db();
    let posts = posts_repository(&fixture.db).await;
    let mut keep = Post::new("keep", 1);
    let mut gone = Post::new("gone", 2);
    posts.insert(&mut keep).await.unwrap();
    posts.insert(&mut gone).await.unwrap();

    assert_eq!(posts.delete(gone.base.id).await.unwrap(), 1);
    assert!(posts.get(gone.base.id).await.unwrap().is_none());
    assert!(posts.exists_id(keep.base.id).await.unwrap());

    assert_eq!(posts.delete_all(Query::new()).await.unwrap(), 1);
    assert_eq!(posts.count(Query::new()).await.unwrap(), 0);
}

// =============================================================================
// Guid backfill and generic records
// =============================================================================

#[tokio::test]
async fn test_missing_guid_is_backfilled_on_read() {
    let fixture = sqlite_db();
    let db = &fixture.db;
    let posts = posts_repository(db).await;

    let raw = CompiledStatement::raw(
        db.dialect(),
        "INSERT INTO \"Posts\" (\"Title\", \"Hits\", \"Published\") VALUES (?, ?, ?)",
        vec![SqlValue::from("raw"), SqlValue::from(1), SqlValue::from(false)],
    );
    db.execute(&raw).await.unwrap();
    let id = posts
        .get_value(Query::new().select(["Id"]).where_eq("Title", "raw"))
        .await
        .unwrap()
        .and_then(|v| v.as_i64())
        .unwrap();

    let loaded = posts.get(id).await.unwrap().unwrap();
    assert!(is_valid_guid(&loaded.base.guid));
    assert!(loaded.base.last_modified_date.is_some());

    let stored = posts
        .get_value(Query::new().select(["Guid"]).where_eq("Id", id))
        .await
        .unwrap();
    assert_eq!(stored, Some(SqlValue::from(loaded.base.guid.as_str())));

    // A second read keeps the stored Guid
    let again = posts.get(id).await.unwrap().unwrap();
    assert_eq!(again.base.guid, loaded.base.guid);
}

#[tokio::test]
async fn test_copy_rows_between_tables_with_records() {
    let fixture = sqlite_db();
    let db = &fixture.db;
    let posts = posts_repository(db).await;
    for (title, n) in [("one", 1), ("two", 2)] {
        posts.insert(&mut Post::new(title, n)).await.unwrap();
    }

    let columns = schema::get_table_columns(db, "Posts").await.unwrap();
    schema::create_table(db, "PostsArchive", &columns).await.unwrap();

    let source: Repository<Record> = Repository::with_table(db.clone(), "Posts", columns.clone());
    let target: Repository<Record> = Repository::with_table(db.clone(), "PostsArchive", columns);

    let mut rows = source.get_all(Query::new().order_by("Id")).await.unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].get("title"), Some(&SqlValue::from("one")));
    for row in rows.iter_mut() {
        row.base.id = 0;
    }
    target.bulk_insert(&mut rows).await.unwrap();

    let copied = target
        .get_values(Query::new().select(["Hits"]).order_by("Id"))
        .await
        .unwrap();
    assert_eq!(copied, vec![SqlValue::I64(1), SqlValue::I64(2)]);
}
