use sqlx::SqlitePool;

use crate::error::Result;
use crate::models::ExerciseTemplate;

pub struct TemplateRepository {
    pool: SqlitePool,
}

#[derive(sqlx::FromRow)]
struct TemplateRow {
    uuid: String,
    title: String,
    category: String,
    primary_muscle_group: String,
    secondary_muscle_groups: String,
    is_custom: bool,
}

impl TemplateRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn existing_uuids(&self) -> Result<Vec<String>> {
        let rows: Vec<(String,)> = sqlx::query_as("SELECT uuid FROM exercise_templates")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(|(uuid,)| uuid).collect())
    }

    pub async fn insert_all(&self, templates: &[ExerciseTemplate]) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        for template in templates {
            insert_template(&mut tx, template).await?;
        }
        tx.commit().await?;
        Ok(())
    }

    pub async fn replace_all(&self, templates: &[ExerciseTemplate]) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM exercise_templates")
            .execute(&mut *tx)
            .await?;
        for template in templates {
            insert_template(&mut tx, template).await?;
        }
        tx.commit().await?;
        Ok(())
    }

    pub async fn list(&self) -> Result<Vec<ExerciseTemplate>> {
        let rows: Vec<TemplateRow> =
            sqlx::query_as("SELECT * FROM exercise_templates ORDER BY title")
                .fetch_all(&self.pool)
                .await?;

        Ok(rows
            .into_iter()
            .map(|row| ExerciseTemplate {
                uuid: row.uuid,
                title: row.title,
                category: row.category,
                primary_muscle_group: row.primary_muscle_group,
                secondary_muscle_groups: serde_json::from_str(&row.secondary_muscle_groups)
                    .unwrap_or_default(),
                is_custom: row.is_custom,
            })
            .collect())
    }
}

async fn insert_template(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    template: &ExerciseTemplate,
) -> Result<()> {
    let muscle_groups = serde_json::to_string(&template.secondary_muscle_groups)
        .unwrap_or_else(|_| "[]".to_string());
    sqlx::query(
        r#"
        INSERT INTO exercise_templates (uuid, title, category, primary_muscle_group,
                                        secondary_muscle_groups, is_custom)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&template.uuid)
    .bind(&template.title)
    .bind(&template.category)
    .bind(&template.primary_muscle_group)
    .bind(&muscle_groups)
    .bind(template.is_custom)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_db;
    use tempfile::TempDir;

    async fn setup() -> (TemplateRepository, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let pool = init_db(&temp_dir.path().join("test.db")).await.unwrap();
        (TemplateRepository::new(pool), temp_dir)
    }

    fn template(uuid: &str, title: &str) -> ExerciseTemplate {
        ExerciseTemplate {
            uuid: uuid.to_string(),
            title: title.to_string(),
            category: "weight_reps".to_string(),
            primary_muscle_group: "chest".to_string(),
            secondary_muscle_groups: vec!["triceps".to_string()],
            is_custom: false,
        }
    }

    #[tokio::test]
    async fn test_insert_and_list() {
        let (repo, _dir) = setup().await;
        repo.insert_all(&[template("79D0BB3A", "Bench Press (Barbell)")])
            .await
            .unwrap();

        let templates = repo.list().await.unwrap();
        assert_eq!(templates.len(), 1);
        assert_eq!(templates[0].title, "Bench Press (Barbell)");
        assert_eq!(templates[0].secondary_muscle_groups, vec!["triceps"]);
    }

    #[tokio::test]
    async fn test_existing_uuids() {
        let (repo, _dir) = setup().await;
        repo.insert_all(&[template("A1", "A"), template("B2", "B")])
            .await
            .unwrap();

        let mut uuids = repo.existing_uuids().await.unwrap();
        uuids.sort();
        assert_eq!(uuids, vec!["A1".to_string(), "B2".to_string()]);
    }
}
