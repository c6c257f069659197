//! Integration tests for the record store.

use scdb_core::{
    Cardinality, Database, Error, FieldDef, FieldKind, ScalarKind, ScanResult, SchemaError,
    ValidationError, Value,
};

fn blog_db() -> Database {
    let mut db = Database::new();
    db.register_enum("Title", [("Mr", 1), ("Mrs", 2), ("Dr", 3)])
        .unwrap();
    db.register_table(
        "User",
        [
            FieldDef::new("id", FieldKind::integer()).primary_key(),
            FieldDef::new("name", FieldKind::string_max(50)),
            FieldDef::optional("title", FieldKind::enumeration("Title")),
            FieldDef::optional("lucky", FieldKind::array(ScalarKind::Integer, Some(5))),
        ],
    )
    .unwrap();
    db.register_table(
        "Group",
        [
            FieldDef::new("id", FieldKind::integer()).primary_key(),
            FieldDef::new("name", FieldKind::string()),
            FieldDef::optional("members", FieldKind::many_to_many("User")),
        ],
    )
    .unwrap();
    db
}

fn add_user(db: &mut Database, id: i64, name: &str) {
    db.insert("User", [("id", Value::from(id)), ("name", Value::from(name))])
        .unwrap();
}

#[test]
fn test_scan_collapses_by_match_count() {
    let mut db = blog_db();
    add_user(&mut db, 1, "Alice");
    add_user(&mut db, 2, "Bob");
    add_user(&mut db, 3, "Bob");

    match db.scan("User", [("id", Value::from(1))]).unwrap() {
        ScanResult::One(record) => assert_eq!(record.get("name"), Some(&Value::from("Alice"))),
        other => panic!("expected a single record, got {other:?}"),
    }

    match db.scan("User", [("name", Value::from("Bob"))]).unwrap() {
        ScanResult::Many(records) => {
            let ids: Vec<_> = records.iter().map(|r| r.get("id").cloned()).collect();
            assert_eq!(ids, vec![Some(Value::Integer(2)), Some(Value::Integer(3))]);
        }
        other => panic!("expected many records, got {other:?}"),
    }

    assert_eq!(
        db.scan("User", [("name", Value::from("Zed"))]).unwrap(),
        ScanResult::None
    );
}

#[test]
fn test_scan_unknown_table() {
    let db = blog_db();
    let result = db.scan("Ghost", [("id", Value::from(1))]);
    assert!(matches!(
        result,
        Err(Error::Schema(SchemaError::UnknownTable(_)))
    ));
}

#[test]
fn test_all_preserves_insertion_order() {
    let mut db = blog_db();
    for (id, name) in [(5, "E"), (1, "A"), (3, "C")] {
        add_user(&mut db, id, name);
    }
    let ids: Vec<_> = db
        .all("User")
        .unwrap()
        .iter()
        .filter_map(|r| r.get("id").and_then(Value::as_i64))
        .collect();
    assert_eq!(ids, vec![5, 1, 3]);
}

#[test]
fn test_array_bounds() {
    let mut db = blog_db();
    let five = Value::from(vec![1i64, 2, 3, 4, 5]);
    let record = db
        .insert(
            "User",
            [
                ("id", Value::from(1)),
                ("name", Value::from("A")),
                ("lucky", five.clone()),
            ],
        )
        .unwrap();
    assert_eq!(record.get("lucky"), Some(&five));

    let err = db
        .insert(
            "User",
            [
                ("id", Value::from(2)),
                ("name", Value::from("B")),
                ("lucky", Value::from(vec![1i64, 2, 3, 4, 5, 6])),
            ],
        )
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Validation {
            source: ValidationError::Length { max: 5, actual: 6 },
            ..
        }
    ));
}

#[test]
fn test_enum_membership() {
    let mut db = blog_db();
    db.insert(
        "User",
        [
            ("id", Value::from(1)),
            ("name", Value::from("A")),
            ("title", Value::from(1)),
        ],
    )
    .unwrap();

    let err = db
        .insert(
            "User",
            [
                ("id", Value::from(2)),
                ("name", Value::from("B")),
                ("title", Value::from(4)),
            ],
        )
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Validation {
            source: ValidationError::EnumMembership { .. },
            ..
        }
    ));
}

#[test]
fn test_many_to_many_join_and_replace() {
    let mut db = blog_db();
    add_user(&mut db, 1, "user1");
    add_user(&mut db, 2, "user2");

    db.insert(
        "Group",
        [
            ("id", Value::from(1)),
            ("name", Value::from("admins")),
            ("members", Value::from(vec![1i64, 2])),
        ],
    )
    .unwrap();

    let names: Vec<_> = db
        .related("Group", 1, "User")
        .unwrap()
        .into_iter()
        .filter_map(|r| r.get("name").cloned())
        .collect();
    assert_eq!(names, vec![Value::from("user1"), Value::from("user2")]);

    db.insert(
        "Group",
        [
            ("id", Value::from(1)),
            ("name", Value::from("admins")),
            ("members", Value::from(vec![1i64])),
        ],
    )
    .unwrap();

    let names: Vec<_> = db
        .related("Group", 1, "User")
        .unwrap()
        .into_iter()
        .filter_map(|r| r.get("name").cloned())
        .collect();
    assert_eq!(names, vec![Value::from("user1")]);

    let join = db.relations().join("Group_User").unwrap();
    assert_eq!(join.len(), 1);
}

#[test]
fn test_reregistering_table_is_rejected() {
    let mut db = blog_db();
    add_user(&mut db, 1, "A");

    let err = db
        .register_table("User", [FieldDef::new("id", FieldKind::integer())])
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Schema(SchemaError::DuplicateTableRegistration(_))
    ));
    assert_eq!(db.all("User").unwrap().len(), 1);
}

#[test]
fn test_ambiguous_join_rejected() {
    let mut db = blog_db();
    let err = db
        .register_table(
            "Team",
            [
                FieldDef::new("leads", FieldKind::many_to_many("User")),
                FieldDef::new("members", FieldKind::many_to_many("User")),
            ],
        )
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Schema(SchemaError::AmbiguousJoin { .. })
    ));
}

#[test]
fn test_string_keyed_relations() {
    let mut db = Database::new();
    db.register_table(
        "Country",
        [
            FieldDef::new("code", FieldKind::string_max(2)).primary_key(),
            FieldDef::new("name", FieldKind::string()),
        ],
    )
    .unwrap();
    db.register_table(
        "City",
        [
            FieldDef::new("name", FieldKind::string()),
            FieldDef::new(
                "country",
                FieldKind::relation("Country", Cardinality::OneToMany),
            ),
        ],
    )
    .unwrap();

    db.insert(
        "Country",
        [("code", Value::from("FR")), ("name", Value::from("France"))],
    )
    .unwrap();
    let city = db
        .insert(
            "City",
            [("name", Value::from("Lyon")), ("country", Value::from("FR"))],
        )
        .unwrap()
        .clone();

    let country = db.resolve(&city, "country").unwrap().unwrap();
    assert_eq!(country.get("name"), Some(&Value::from("France")));
    assert!(db.find("Country", "DE").unwrap().is_none());
}

#[test]
fn test_scan_canonicalizes_criteria() {
    let mut db = Database::new();
    db.register_table(
        "Event",
        [
            FieldDef::new("name", FieldKind::string()),
            FieldDef::new("on", FieldKind::Date),
        ],
    )
    .unwrap();
    db.insert(
        "Event",
        [("name", Value::from("launch")), ("on", Value::from("2024-09-25"))],
    )
    .unwrap();

    let hit = db.scan("Event", [("on", Value::from("2024-09-25"))]).unwrap();
    assert_eq!(hit.len(), 1);

    let miss = db.scan("Event", [("on", Value::from("not a date"))]).unwrap();
    assert!(miss.is_none());
}

#[test]
fn test_primary_key_zero_is_its_own_identity() {
    let mut db = Database::new();
    let err = db
        .register_table(
            "User",
            [
                FieldDef::optional("id", FieldKind::integer()).primary_key(),
                FieldDef::new("name", FieldKind::string()),
            ],
        )
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Schema(SchemaError::InvalidPrimaryKey { .. })
    ));
    assert!(db.table("User").is_none());

    db.register_table(
        "User",
        [
            FieldDef::new("id", FieldKind::integer()).primary_key(),
            FieldDef::new("name", FieldKind::string()),
        ],
    )
    .unwrap();
    add_user(&mut db, 5, "first");
    add_user(&mut db, 0, "zero");

    let found = db.find("User", 0).unwrap().unwrap();
    assert_eq!(found.get("name"), Some(&Value::from("zero")));
    assert!(db
        .insert("User", [("id", Value::Null), ("name", Value::from("ghost"))])
        .is_err());
}
