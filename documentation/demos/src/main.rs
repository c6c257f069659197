//! SCDB blog walkthrough.
//!
//! Builds a small blog store (users, tags, posts, groups), saves it to a
//! `.scdb` file, reloads it and prints what came back.
//!
//! Run with `RUST_LOG=scdb_core=debug` to see registration and insert events.

use scdb_core::{
    Cardinality, Database, FieldDef, FieldKind, PayloadTransform, ScalarKind, ScanResult,
    TransformError, Value,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Demo-only payload scrambler. Not encryption.
struct Scramble(u8);

impl PayloadTransform for Scramble {
    fn seal(&self, payload: Vec<u8>) -> Result<Vec<u8>, TransformError> {
        Ok(payload.into_iter().map(|b| b ^ self.0).collect())
    }

    fn open(&self, sealed: Vec<u8>) -> Result<Vec<u8>, TransformError> {
        self.seal(sealed)
    }
}

fn build_blog() -> Result<Database, scdb_core::Error> {
    let mut db = Database::new();

    db.register_enum("Title", [("Mr", 1), ("Mrs", 2), ("Dr", 3)])?;

    db.register_table(
        "User",
        [
            FieldDef::new("id", FieldKind::integer()).primary_key(),
            FieldDef::new("name", FieldKind::string_max(32)),
            FieldDef::optional("title", FieldKind::enumeration("Title")),
            FieldDef::new("join_date", FieldKind::Date),
            FieldDef::new("join_time", FieldKind::Time),
            FieldDef::optional("last_login", FieldKind::DateTime),
            FieldDef::new(
                "previous_usernames",
                FieldKind::array(ScalarKind::String, Some(5)),
            )
            .with_default(Value::Array(Vec::new())),
        ],
    )?;
    db.register_table(
        "Tag",
        [
            FieldDef::new("id", FieldKind::integer()).primary_key(),
            FieldDef::new("name", FieldKind::string()).unique(),
        ],
    )?;
    db.register_table(
        "Post",
        [
            FieldDef::new("id", FieldKind::integer()).primary_key(),
            FieldDef::new("title", FieldKind::string()),
            FieldDef::new("content", FieldKind::string()),
            FieldDef::new(
                "creator",
                FieldKind::relation("User", Cardinality::OneToMany),
            ),
            FieldDef::optional("tags", FieldKind::many_to_many("Tag")),
        ],
    )?;
    db.register_table(
        "Group",
        [
            FieldDef::new("id", FieldKind::integer()).primary_key(),
            FieldDef::new("name", FieldKind::string()),
            FieldDef::optional("members", FieldKind::many_to_many("User")),
        ],
    )?;

    db.insert(
        "User",
        [
            ("id", Value::from(1)),
            ("name", Value::from("okzyrox")),
            ("title", Value::from(1)),
            ("join_date", Value::from("2024-09-25")),
            ("join_time", Value::from("14:35:00")),
            ("last_login", Value::from("2024-09-25T14:35:00")),
            (
                "previous_usernames",
                Value::from(vec!["okzyrox1", "okzyrox2", "okzyrox3"]),
            ),
        ],
    )?;
    db.insert(
        "User",
        [
            ("id", Value::from(2)),
            ("name", Value::from("okzyrox2")),
            ("join_date", Value::from("2024-10-01")),
            ("join_time", Value::from("09:00:00")),
        ],
    )?;

    db.insert_many(
        "Tag",
        [(1, "Programming"), (2, "Epic"), (3, "SCSL")]
            .into_iter()
            .map(|(id, name)| [("id", Value::from(id)), ("name", Value::from(name))]),
    )?;

    db.insert(
        "Post",
        [
            ("id", Value::from(1)),
            ("title", Value::from("My First Post")),
            ("content", Value::from("This is a post about programming")),
            ("creator", Value::from(1)),
            ("tags", Value::from(vec![1i64, 3])),
        ],
    )?;
    db.insert(
        "Post",
        [
            ("id", Value::from(2)),
            ("title", Value::from("SCSL is Epic")),
            ("content", Value::from("I love using SCSL for database management")),
            ("creator", Value::from(2)),
            ("tags", Value::from(vec![2i64, 3])),
        ],
    )?;

    db.insert(
        "Group",
        [
            ("id", Value::from(1)),
            ("name", Value::from("editors")),
            ("members", Value::from(vec![1i64, 2])),
        ],
    )?;

    Ok(db)
}

fn print_db(db: &Database) -> Result<(), scdb_core::Error> {
    for table in db.catalog().tables() {
        println!("== {} ==", table.name);
        for record in db.all(&table.name)? {
            println!("  {record}");
        }
    }

    println!();
    for post in db.all("Post")? {
        let creator = db
            .resolve(post, "creator")?
            .and_then(|u| u.get("name"))
            .map(ToString::to_string)
            .unwrap_or_else(|| "?".to_string());
        let id = post.get("id").and_then(Value::as_i64).unwrap_or_default();
        let tags: Vec<String> = db
            .related("Post", id, "Tag")?
            .into_iter()
            .filter_map(|t| t.get("name").map(ToString::to_string))
            .collect();
        println!("post {id} by {creator}, tags [{}]", tags.join(", "));
    }

    let members = db.related("Group", 1, "User")?.len();
    println!("group 1 has {members} members");

    match db.scan("Post", [("creator", Value::from(1))])? {
        ScanResult::None => println!("user 1 has no posts"),
        ScanResult::One(post) => println!("user 1 wrote: {post}"),
        ScanResult::Many(posts) => println!("user 1 wrote {} posts", posts.len()),
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "scdb_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let db = build_blog()?;

    let dir = std::env::temp_dir();
    let plain = dir.join("blog.scdb");
    let sealed = dir.join("blog.sealed.scdb");
    let key = Scramble(0xA7);

    db.save_to_file(&plain, None)?;
    db.save_to_file(&sealed, Some(&key))?;
    tracing::info!(plain = %plain.display(), sealed = %sealed.display(), "saved blog");

    let config = scdb_core::CodecConfig::default();
    let reloaded = Database::load_from_file(&plain, None, &config)?;
    let unsealed = Database::load_from_file(&sealed, Some(&key), &config)?;

    print_db(&reloaded)?;

    let same = db
        .catalog()
        .table_names()
        .into_iter()
        .all(|t| reloaded.all(t).ok() == unsealed.all(t).ok());
    println!("plain and sealed copies agree: {same}");

    Ok(())
}
