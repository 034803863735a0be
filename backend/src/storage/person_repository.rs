//! Person storage: document CRUD plus the edge-mutation primitives the
//! graph service builds on.
//!
//! The id-list set-adds are single guarded `json_insert` statements, so they
//! are atomic per row and idempotent: adding an id that is already present
//! leaves the row as-is. The pulls run only inside the delete transaction
//! and use read-modify-write under its lock. Mutating a neighbor that does
//! not exist is a no-op, the document-store behavior of an update matching
//! zero documents.

use anyhow::Result;
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqliteConnection};

use crate::domain::models::person::Person;
use crate::storage::db::DbConnection;

/// Which parent pointer an edge mutation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParentColumn {
    Father,
    Mother,
}

impl ParentColumn {
    fn as_sql(self) -> &'static str {
        match self {
            ParentColumn::Father => "father_id",
            ParentColumn::Mother => "mother_id",
        }
    }
}

/// Which id-list column an edge mutation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IdListColumn {
    Spouses,
    Children,
}

impl IdListColumn {
    fn as_sql(self) -> &'static str {
        match self {
            IdListColumn::Spouses => "spouse_ids",
            IdListColumn::Children => "children_ids",
        }
    }
}

#[derive(Clone)]
pub struct PersonRepository {
    db: DbConnection,
}

impl PersonRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    pub async fn insert(&self, person: &Person) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO persons (
                id, name, alias, name_normalized, alias_normalized, gender,
                birth_date, birth_year_can_chi, death_date, death_year_can_chi,
                image_url, father_id, mother_id, spouse_ids, children_ids,
                created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&person.id)
        .bind(&person.name)
        .bind(&person.alias)
        .bind(&person.name_normalized)
        .bind(&person.alias_normalized)
        .bind(&person.gender)
        .bind(person.birth_date)
        .bind(&person.birth_year_can_chi)
        .bind(person.death_date)
        .bind(&person.death_year_can_chi)
        .bind(&person.image_url)
        .bind(&person.father_id)
        .bind(&person.mother_id)
        .bind(serde_json::to_string(&person.spouse_ids)?)
        .bind(serde_json::to_string(&person.children_ids)?)
        .bind(person.created_at)
        .bind(person.updated_at)
        .execute(self.db.pool())
        .await?;
        Ok(())
    }

    pub async fn get_by_id(&self, id: &str) -> Result<Option<Person>> {
        let row = sqlx::query("SELECT * FROM persons WHERE id = ?")
            .bind(id)
            .fetch_optional(self.db.pool())
            .await?;
        row.as_ref().map(row_to_person).transpose()
    }

    /// Full-document replace; the caller supplies the complete desired state.
    pub async fn replace(&self, person: &Person) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE persons SET
                name = ?, alias = ?, name_normalized = ?, alias_normalized = ?,
                gender = ?, birth_date = ?, birth_year_can_chi = ?,
                death_date = ?, death_year_can_chi = ?, image_url = ?,
                father_id = ?, mother_id = ?, spouse_ids = ?, children_ids = ?,
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&person.name)
        .bind(&person.alias)
        .bind(&person.name_normalized)
        .bind(&person.alias_normalized)
        .bind(&person.gender)
        .bind(person.birth_date)
        .bind(&person.birth_year_can_chi)
        .bind(person.death_date)
        .bind(&person.death_year_can_chi)
        .bind(&person.image_url)
        .bind(&person.father_id)
        .bind(&person.mother_id)
        .bind(serde_json::to_string(&person.spouse_ids)?)
        .bind(serde_json::to_string(&person.children_ids)?)
        .bind(person.updated_at)
        .bind(&person.id)
        .execute(self.db.pool())
        .await?;
        Ok(())
    }

    /// Case/accent-insensitive substring search over normalized name and
    /// alias, newest first.
    pub async fn search_by_name_or_alias(
        &self,
        normalized_keyword: &str,
        limit: i64,
    ) -> Result<Vec<Person>> {
        let pattern = format!("%{}%", normalized_keyword);
        let rows = sqlx::query(
            r#"
            SELECT * FROM persons
            WHERE name_normalized LIKE ? OR alias_normalized LIKE ?
            ORDER BY created_at DESC
            LIMIT ?
            "#,
        )
        .bind(&pattern)
        .bind(&pattern)
        .bind(limit)
        .fetch_all(self.db.pool())
        .await?;
        rows.iter().map(row_to_person).collect()
    }

    /// Everyone whose father or mother pointer references `parent_id`.
    pub async fn children_of(&self, parent_id: &str) -> Result<Vec<Person>> {
        let rows = sqlx::query("SELECT * FROM persons WHERE father_id = ? OR mother_id = ?")
            .bind(parent_id)
            .bind(parent_id)
            .fetch_all(self.db.pool())
            .await?;
        rows.iter().map(row_to_person).collect()
    }

    pub async fn by_ids(&self, ids: &[String]) -> Result<Vec<Person>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT * FROM persons WHERE id IN (");
        let mut sep = qb.separated(", ");
        for id in ids {
            sep.push_bind(id.clone());
        }
        qb.push(")");
        let rows = qb.build().fetch_all(self.db.pool()).await?;
        rows.iter().map(row_to_person).collect()
    }

    /// Idempotent set-add of `child_id` into the parent's children list.
    pub async fn add_child_edge(&self, parent_id: &str, child_id: &str) -> Result<()> {
        let mut conn = self.db.pool().acquire().await?;
        add_to_id_list(&mut conn, parent_id, IdListColumn::Children, child_id).await
    }

    /// Idempotent set-add of `person_id` into the spouse's spouse list.
    pub async fn add_spouse_edge(&self, spouse_id: &str, person_id: &str) -> Result<()> {
        let mut conn = self.db.pool().acquire().await?;
        add_to_id_list(&mut conn, spouse_id, IdListColumn::Spouses, person_id).await
    }

    /// Point a child's father or mother reference at `parent_id`.
    pub async fn set_parent(
        &self,
        child_id: &str,
        column: ParentColumn,
        parent_id: &str,
    ) -> Result<()> {
        let sql = format!("UPDATE persons SET {} = ? WHERE id = ?", column.as_sql());
        sqlx::query(&sql)
            .bind(parent_id)
            .bind(child_id)
            .execute(self.db.pool())
            .await?;
        Ok(())
    }

    /// Cascading delete: sever every inbound and outbound edge of `person`
    /// and remove the document, all in one transaction. Either every effect
    /// commits or none is visible.
    pub async fn delete_cascade(&self, person: &Person) -> Result<()> {
        let mut tx = self.db.pool().begin().await?;

        // Drop this person from the parents' children lists.
        if let Some(father_id) = &person.father_id {
            pull_from_id_list(&mut tx, father_id, IdListColumn::Children, &person.id).await?;
        }
        if let Some(mother_id) = &person.mother_id {
            pull_from_id_list(&mut tx, mother_id, IdListColumn::Children, &person.id).await?;
        }

        // Drop this person from every spouse's spouse list.
        for spouse_id in &person.spouse_ids {
            pull_from_id_list(&mut tx, spouse_id, IdListColumn::Spouses, &person.id).await?;
        }

        // Clear the matching parent pointer on every child. A gender outside
        // male/female clears nothing; the children keep a dangling reference.
        if !person.children_ids.is_empty() {
            let column = if person.is_male() {
                Some(ParentColumn::Father)
            } else if person.is_female() {
                Some(ParentColumn::Mother)
            } else {
                None
            };
            if let Some(column) = column {
                let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE persons SET ");
                qb.push(column.as_sql());
                qb.push(" = NULL WHERE id IN (");
                let mut sep = qb.separated(", ");
                for child_id in &person.children_ids {
                    sep.push_bind(child_id.clone());
                }
                qb.push(")");
                qb.build().execute(&mut *tx).await?;
            }
        }

        sqlx::query("DELETE FROM persons WHERE id = ?")
            .bind(&person.id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}

async fn add_to_id_list(
    conn: &mut SqliteConnection,
    owner_id: &str,
    column: IdListColumn,
    value: &str,
) -> Result<()> {
    // One statement, so concurrent writers cannot interleave and drop an
    // edge; the NOT EXISTS guard keeps the add idempotent.
    let sql = format!(
        "UPDATE persons SET {col} = json_insert({col}, '$[#]', ?) \
         WHERE id = ? \
         AND NOT EXISTS (SELECT 1 FROM json_each({col}) WHERE json_each.value = ?)",
        col = column.as_sql()
    );
    sqlx::query(&sql)
        .bind(value)
        .bind(owner_id)
        .bind(value)
        .execute(conn)
        .await?;
    Ok(())
}

async fn pull_from_id_list(
    conn: &mut SqliteConnection,
    owner_id: &str,
    column: IdListColumn,
    value: &str,
) -> Result<()> {
    let sql = format!("SELECT {} FROM persons WHERE id = ?", column.as_sql());
    let row = sqlx::query(&sql)
        .bind(owner_id)
        .fetch_optional(&mut *conn)
        .await?;
    let Some(row) = row else {
        return Ok(());
    };
    let raw: String = row.try_get(0)?;
    let mut ids: Vec<String> = serde_json::from_str(&raw)?;
    let before = ids.len();
    ids.retain(|id| id != value);
    if ids.len() == before {
        return Ok(());
    }
    write_id_list(conn, owner_id, column, &ids).await
}

async fn write_id_list(
    conn: &mut SqliteConnection,
    owner_id: &str,
    column: IdListColumn,
    ids: &[String],
) -> Result<()> {
    let sql = format!("UPDATE persons SET {} = ? WHERE id = ?", column.as_sql());
    sqlx::query(&sql)
        .bind(serde_json::to_string(ids)?)
        .bind(owner_id)
        .execute(conn)
        .await?;
    Ok(())
}

fn row_to_person(row: &SqliteRow) -> Result<Person> {
    let spouse_ids: Vec<String> = serde_json::from_str(&row.try_get::<String, _>("spouse_ids")?)?;
    let children_ids: Vec<String> =
        serde_json::from_str(&row.try_get::<String, _>("children_ids")?)?;
    Ok(Person {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        alias: row.try_get("alias")?,
        name_normalized: row.try_get("name_normalized")?,
        alias_normalized: row.try_get("alias_normalized")?,
        gender: row.try_get("gender")?,
        birth_date: row.try_get("birth_date")?,
        birth_year_can_chi: row.try_get("birth_year_can_chi")?,
        death_date: row.try_get("death_date")?,
        death_year_can_chi: row.try_get("death_year_can_chi")?,
        image_url: row.try_get("image_url")?,
        father_id: row.try_get("father_id")?,
        mother_id: row.try_get("mother_id")?,
        spouse_ids,
        children_ids,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::person::GENDER_MALE;
    use crate::storage::DbConnection;
    use chrono::Utc;

    fn person(id: &str) -> Person {
        let now = Utc::now();
        Person {
            id: id.to_string(),
            name: "Nguyễn Văn A".to_string(),
            alias: None,
            name_normalized: "nguyen van a".to_string(),
            alias_normalized: None,
            gender: GENDER_MALE.to_string(),
            birth_date: None,
            birth_year_can_chi: None,
            death_date: None,
            death_year_can_chi: None,
            image_url: None,
            father_id: None,
            mother_id: None,
            spouse_ids: Vec::new(),
            children_ids: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    async fn repository() -> PersonRepository {
        let db = DbConnection::init_test().await.expect("init test db");
        PersonRepository::new(db)
    }

    #[tokio::test]
    async fn add_child_edge_is_idempotent() {
        let repository = repository().await;
        repository.insert(&person("a")).await.unwrap();

        repository.add_child_edge("a", "b").await.unwrap();
        repository.add_child_edge("a", "b").await.unwrap();
        repository.add_child_edge("a", "c").await.unwrap();

        let stored = repository.get_by_id("a").await.unwrap().unwrap();
        assert_eq!(stored.children_ids, vec!["b".to_string(), "c".to_string()]);
    }

    #[tokio::test]
    async fn edge_add_to_missing_owner_is_a_noop() {
        let repository = repository().await;
        repository.add_spouse_edge("missing", "x").await.unwrap();
        assert!(repository.get_by_id("missing").await.unwrap().is_none());
    }
}
