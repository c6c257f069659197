//! Test data generation for benchmarks.
//!
//! Generators are seeded so every run sees the same data.

use rand::distributions::Alphanumeric;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use scdb_core::{Database, Error, FieldDef, FieldKind, ScalarKind, Value};

/// Scale factor for benchmark data generation.
#[derive(Clone, Copy, Debug, Default)]
pub enum Scale {
    /// 10 records per table, for quick iteration.
    Tiny,
    /// 1,000 records per table.
    #[default]
    Small,
    /// 10,000 records per table.
    Medium,
    /// 100,000 records per table.
    Large,
}

impl Scale {
    /// Records per table at this scale.
    pub fn count(&self) -> usize {
        match self {
            Scale::Tiny => 10,
            Scale::Small => 1_000,
            Scale::Medium => 10_000,
            Scale::Large => 100_000,
        }
    }
}

/// User record data.
pub struct UserData {
    pub id: i64,
    pub name: String,
    pub age: i64,
}

/// Post record data.
pub struct PostData {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub creator: i64,
    pub tags: Vec<String>,
}

fn random_string(rng: &mut StdRng, len: usize) -> String {
    (0..len)
        .map(|_| rng.sample(Alphanumeric) as char)
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// Generate users with sequential ids starting at 1.
pub fn generate_users(count: usize) -> Vec<UserData> {
    const SEED: u64 = 12345;
    let mut rng = StdRng::seed_from_u64(SEED);

    (1..=count as i64)
        .map(|id| UserData {
            id,
            name: format!("User {id}"),
            age: rng.gen_range(18..90),
        })
        .collect()
}

/// Generate posts with `content_len` random characters each, spread across
/// `user_count` creators.
pub fn generate_posts(count: usize, content_len: usize, user_count: usize) -> Vec<PostData> {
    const SEED: u64 = 54321;
    let mut rng = StdRng::seed_from_u64(SEED);
    let users = user_count.max(1) as i64;

    (1..=count as i64)
        .map(|id| PostData {
            id,
            title: format!("Post {id}"),
            content: random_string(&mut rng, content_len),
            creator: (id - 1) % users + 1,
            tags: (0..rng.gen_range(0..=3))
                .map(|_| random_string(&mut rng, 6))
                .collect(),
        })
        .collect()
}

/// Register the benchmark schema: users, posts referencing users, and
/// groups joining users many-to-many.
pub fn register_schema(db: &mut Database) -> Result<(), Error> {
    db.register_table(
        "User",
        [
            FieldDef::new("id", FieldKind::integer()).primary_key(),
            FieldDef::new("name", FieldKind::string()),
            FieldDef::new("age", FieldKind::integer_range(0, 150)),
        ],
    )?;
    db.register_table(
        "Post",
        [
            FieldDef::new("id", FieldKind::integer()).primary_key(),
            FieldDef::new("title", FieldKind::string()),
            FieldDef::new("content", FieldKind::string()),
            FieldDef::new("creator", FieldKind::foreign_key("User")),
            FieldDef::new("tags", FieldKind::array(ScalarKind::String, Some(5))),
        ],
    )?;
    db.register_table(
        "Group",
        [
            FieldDef::new("id", FieldKind::integer()).primary_key(),
            FieldDef::optional("members", FieldKind::many_to_many("User")),
        ],
    )?;
    Ok(())
}

/// Field values for a user.
pub fn user_fields(user: &UserData) -> Vec<(&'static str, Value)> {
    vec![
        ("id", Value::Integer(user.id)),
        ("name", Value::String(user.name.clone())),
        ("age", Value::Integer(user.age)),
    ]
}

/// Field values for a post.
pub fn post_fields(post: &PostData) -> Vec<(&'static str, Value)> {
    vec![
        ("id", Value::Integer(post.id)),
        ("title", Value::String(post.title.clone())),
        ("content", Value::String(post.content.clone())),
        ("creator", Value::Integer(post.creator)),
        ("tags", Value::from(post.tags.clone())),
    ]
}

/// Build a database holding `users` users and `posts` posts, plus one group
/// per ten users.
pub fn populated_db(users: usize, posts: usize, content_len: usize) -> Result<Database, Error> {
    let mut db = Database::new();
    register_schema(&mut db)?;

    let user_data = generate_users(users);
    db.insert_many("User", user_data.iter().map(user_fields))?;
    db.insert_many(
        "Post",
        generate_posts(posts, content_len, users)
            .iter()
            .map(post_fields),
    )?;

    for (i, chunk) in user_data.chunks(10).enumerate() {
        let members: Vec<i64> = chunk.iter().map(|u| u.id).collect();
        db.insert(
            "Group",
            [
                ("id", Value::Integer(i as i64 + 1)),
                ("members", Value::from(members)),
            ],
        )?;
    }
    Ok(db)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generators_are_deterministic() {
        let a = generate_posts(20, 25, 5);
        let b = generate_posts(20, 25, 5);
        assert!(a.iter().zip(&b).all(|(x, y)| x.content == y.content));
        assert!(a.iter().all(|p| p.content.len() == 25));
        assert!(a.iter().all(|p| (1..=5).contains(&p.creator)));
    }

    #[test]
    fn test_populated_db() {
        let db = populated_db(25, 40, 25).unwrap();
        assert_eq!(db.all("User").unwrap().len(), 25);
        assert_eq!(db.all("Post").unwrap().len(), 40);
        assert_eq!(db.all("Group").unwrap().len(), 3);
        assert_eq!(db.related("Group", 3, "User").unwrap().len(), 5);
    }
}
