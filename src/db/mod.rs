use std::collections::HashMap;

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Postgres, Row, Transaction};

use crate::config::Config;
use crate::error::{ProjectError, Result};
use crate::models::{Company, LoggedHours, Project, ProjectWithCompany, Tag};

const FOREIGN_KEY_VIOLATION: &str = "23503";

const PROJECT_COLUMNS: &str = r#"
    p.id,
    p.company_id,
    p.title,
    p.start_date,
    p.end_date,
    p.estimated_design,
    p.actual_design,
    p.estimated_development,
    p.actual_development,
    p.estimated_testing,
    p.actual_testing
"#;

/// Database connection pool
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new Database instance with a connection pool
    pub async fn new(config: &Config) -> Result<Self> {
        Self::connect(config.database_url()).await
    }

    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;

        Ok(Self { pool })
    }

    /// Get a reference to the connection pool
    pub fn get_pool(&self) -> &PgPool {
        &self.pool
    }

    /// Apply the embedded schema migrations that have not run yet
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(self.get_pool()).await?;
        tracing::info!("database migrations applied");
        Ok(())
    }

    // Tag operations
    pub async fn list_tags(&self) -> Result<Vec<Tag>> {
        let rows = sqlx::query("SELECT id, name, color FROM tags ORDER BY name ASC, id ASC")
            .fetch_all(self.get_pool())
            .await?;

        rows.iter().map(tag_from_row).collect()
    }

    pub async fn get_tag(&self, id: i32) -> Result<Tag> {
        let row = sqlx::query("SELECT id, name, color FROM tags WHERE id = $1")
            .bind(id)
            .fetch_optional(self.get_pool())
            .await?
            .ok_or(ProjectError::NotFound { entity: "tag", id })?;

        tag_from_row(&row)
    }

    pub async fn create_tag(&self, tag: &Tag) -> Result<Tag> {
        tag.validate()?;

        let id: i32 = sqlx::query_scalar("INSERT INTO tags (name, color) VALUES ($1, $2) RETURNING id")
            .bind(&tag.name)
            .bind(tag.color.as_str())
            .fetch_one(self.get_pool())
            .await?;

        tracing::info!(tag_id = id, name = %tag.name, "tag created");
        Ok(Tag { id, ..tag.clone() })
    }

    pub async fn update_tag(&self, tag: &Tag) -> Result<()> {
        tag.validate()?;

        let result = sqlx::query("UPDATE tags SET name = $1, color = $2 WHERE id = $3")
            .bind(&tag.name)
            .bind(tag.color.as_str())
            .bind(tag.id)
            .execute(self.get_pool())
            .await?;

        if result.rows_affected() == 0 {
            return Err(ProjectError::NotFound { entity: "tag", id: tag.id });
        }
        Ok(())
    }

    /// Delete a tag; its company associations go with it.
    pub async fn delete_tag(&self, id: i32) -> Result<()> {
        let result = sqlx::query("DELETE FROM tags WHERE id = $1")
            .bind(id)
            .execute(self.get_pool())
            .await?;

        if result.rows_affected() == 0 {
            return Err(ProjectError::NotFound { entity: "tag", id });
        }
        tracing::info!(tag_id = id, "tag deleted");
        Ok(())
    }

    // Company operations
    pub async fn list_companies(&self) -> Result<Vec<Company>> {
        let rows = sqlx::query("SELECT id, name FROM companies ORDER BY name ASC, id ASC")
            .fetch_all(self.get_pool())
            .await?;

        let ids: Vec<i32> = rows.iter().map(|row| row.try_get("id")).collect::<sqlx::Result<_>>()?;
        let mut tags = self.tags_by_company(&ids).await?;

        rows.iter()
            .map(|row| -> Result<Company> {
                let id: i32 = row.try_get("id")?;
                Ok(Company {
                    id,
                    name: row.try_get("name")?,
                    tags: tags.remove(&id).unwrap_or_default(),
                })
            })
            .collect()
    }

    pub async fn get_company(&self, id: i32) -> Result<Company> {
        let row = sqlx::query("SELECT id, name FROM companies WHERE id = $1")
            .bind(id)
            .fetch_optional(self.get_pool())
            .await?
            .ok_or(ProjectError::NotFound { entity: "company", id })?;

        let mut tags = self.tags_by_company(&[id]).await?;

        Ok(Company {
            id,
            name: row.try_get("name")?,
            tags: tags.remove(&id).unwrap_or_default(),
        })
    }

    /// Insert a company and link it to the tags listed on it (by id).
    pub async fn create_company(&self, company: &Company) -> Result<Company> {
        company.validate()?;

        let mut tx = self.pool.begin().await?;

        let id: i32 = sqlx::query_scalar("INSERT INTO companies (name) VALUES ($1) RETURNING id")
            .bind(&company.name)
            .fetch_one(&mut *tx)
            .await?;

        replace_company_tags(&mut tx, id, &company.tag_ids()).await?;

        tx.commit().await?;

        tracing::info!(company_id = id, name = %company.name, "company created");
        self.get_company(id).await
    }

    /// Update the name and replace the tag set of an existing company.
    pub async fn update_company(&self, company: &Company) -> Result<()> {
        company.validate()?;

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query("UPDATE companies SET name = $1 WHERE id = $2")
            .bind(&company.name)
            .bind(company.id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ProjectError::NotFound { entity: "company", id: company.id });
        }

        replace_company_tags(&mut tx, company.id, &company.tag_ids()).await?;

        tx.commit().await?;

        Ok(())
    }

    /// Delete a company. Refused while any project still belongs to it.
    pub async fn delete_company(&self, id: i32) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        // Lock the row so no project can be attached while we decide
        let exists = sqlx::query("SELECT id FROM companies WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            return Err(ProjectError::NotFound { entity: "company", id });
        }

        let project_count = count_projects(&mut *tx, id).await?;
        if project_count > 0 {
            tracing::warn!(company_id = id, project_count, "refusing to delete protected company");
            return Err(ProjectError::ProtectedCompany { company_id: id, project_count });
        }

        let deleted = sqlx::query("DELETE FROM companies WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await;

        match deleted {
            Ok(_) => {}
            Err(err) if is_foreign_key_violation(&err) => {
                drop(tx);
                let project_count = count_projects(self.get_pool(), id).await?;
                return Err(ProjectError::ProtectedCompany { company_id: id, project_count });
            }
            Err(err) => return Err(err.into()),
        }

        tx.commit().await?;

        tracing::info!(company_id = id, "company deleted");
        Ok(())
    }

    async fn tags_by_company(&self, company_ids: &[i32]) -> Result<HashMap<i32, Vec<Tag>>> {
        let mut by_company: HashMap<i32, Vec<Tag>> = HashMap::new();
        if company_ids.is_empty() {
            return Ok(by_company);
        }

        let rows = sqlx::query(
            r#"
            SELECT ct.company_id, t.id, t.name, t.color
            FROM company_tags ct
            JOIN tags t ON t.id = ct.tag_id
            WHERE ct.company_id = ANY($1)
            ORDER BY t.name ASC, t.id ASC
            "#,
        )
        .bind(company_ids)
        .fetch_all(self.get_pool())
        .await?;

        for row in &rows {
            let company_id: i32 = row.try_get("company_id")?;
            by_company.entry(company_id).or_default().push(tag_from_row(row)?);
        }

        Ok(by_company)
    }

    // Project operations
    pub async fn get_project(&self, id: i32) -> Result<Project> {
        let query = format!("SELECT {} FROM projects p WHERE p.id = $1", PROJECT_COLUMNS);
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(self.get_pool())
            .await?
            .ok_or(ProjectError::NotFound { entity: "project", id })?;

        project_from_row(&row)
    }

    pub async fn create_project(&self, project: &Project) -> Result<Project> {
        project.validate()?;

        let inserted = sqlx::query_scalar(
            r#"
            INSERT INTO projects (
                company_id, title, start_date, end_date,
                estimated_design, actual_design,
                estimated_development, actual_development,
                estimated_testing, actual_testing
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING id
            "#,
        )
        .bind(project.company_id)
        .bind(&project.title)
        .bind(project.start_date)
        .bind(project.end_date)
        .bind(project.estimated_design)
        .bind(&project.actual_design)
        .bind(project.estimated_development)
        .bind(&project.actual_development)
        .bind(project.estimated_testing)
        .bind(&project.actual_testing)
        .fetch_one(self.get_pool())
        .await;

        let id: i32 = match inserted {
            Ok(id) => id,
            Err(err) if is_foreign_key_violation(&err) => {
                return Err(ProjectError::NotFound { entity: "company", id: project.company_id });
            }
            Err(err) => return Err(err.into()),
        };

        tracing::info!(project_id = id, title = %project.title, "project created");
        Ok(Project { id, ..project.clone() })
    }

    pub async fn update_project(&self, project: &Project) -> Result<()> {
        project.validate()?;

        let result = sqlx::query(
            r#"
            UPDATE projects
            SET company_id = $1, title = $2, start_date = $3, end_date = $4,
                estimated_design = $5, actual_design = $6,
                estimated_development = $7, actual_development = $8,
                estimated_testing = $9, actual_testing = $10
            WHERE id = $11
            "#,
        )
        .bind(project.company_id)
        .bind(&project.title)
        .bind(project.start_date)
        .bind(project.end_date)
        .bind(project.estimated_design)
        .bind(&project.actual_design)
        .bind(project.estimated_development)
        .bind(&project.actual_development)
        .bind(project.estimated_testing)
        .bind(&project.actual_testing)
        .bind(project.id)
        .execute(self.get_pool())
        .await;

        match result {
            Ok(result) if result.rows_affected() == 0 => {
                Err(ProjectError::NotFound { entity: "project", id: project.id })
            }
            Ok(_) => Ok(()),
            Err(err) if is_foreign_key_violation(&err) => {
                Err(ProjectError::NotFound { entity: "company", id: project.company_id })
            }
            Err(err) => Err(err.into()),
        }
    }

    pub async fn delete_project(&self, id: i32) -> Result<()> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(self.get_pool())
            .await?;

        if result.rows_affected() == 0 {
            return Err(ProjectError::NotFound { entity: "project", id });
        }
        tracing::info!(project_id = id, "project deleted");
        Ok(())
    }

    /// Add logged hours to a project's actuals and return the stored result.
    pub async fn log_hours(&self, id: i32, hours: &LoggedHours) -> Result<Project> {
        let mut tx = self.pool.begin().await?;

        let query = format!("SELECT {} FROM projects p WHERE p.id = $1 FOR UPDATE", PROJECT_COLUMNS);
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(ProjectError::NotFound { entity: "project", id })?;

        let mut project = project_from_row(&row)?;
        project.log_hours(hours)?;

        sqlx::query(
            r#"
            UPDATE projects
            SET actual_design = $1, actual_development = $2, actual_testing = $3
            WHERE id = $4
            "#,
        )
        .bind(&project.actual_design)
        .bind(&project.actual_development)
        .bind(&project.actual_testing)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(project_id = id, total_actual = %project.total_actual_hours(), "hours logged");
        Ok(project)
    }

    /// Every project with its company (and the company's tags) loaded up
    /// front, one query per relation.
    pub async fn fetch_projects(&self) -> Result<Vec<ProjectWithCompany>> {
        let query = format!(
            "SELECT {}, c.name AS company_name FROM projects p JOIN companies c ON c.id = p.company_id ORDER BY p.id ASC",
            PROJECT_COLUMNS
        );
        let rows = sqlx::query(&query).fetch_all(self.get_pool()).await?;

        self.attach_companies(&rows).await
    }

    pub async fn fetch_project(&self, id: i32) -> Result<ProjectWithCompany> {
        let query = format!(
            "SELECT {}, c.name AS company_name FROM projects p JOIN companies c ON c.id = p.company_id WHERE p.id = $1",
            PROJECT_COLUMNS
        );
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(self.get_pool())
            .await?
            .ok_or(ProjectError::NotFound { entity: "project", id })?;

        let mut found = self.attach_companies(std::slice::from_ref(&row)).await?;
        found.pop().ok_or(ProjectError::NotFound { entity: "project", id })
    }

    async fn attach_companies(&self, rows: &[PgRow]) -> Result<Vec<ProjectWithCompany>> {
        let mut company_ids: Vec<i32> = rows
            .iter()
            .map(|row| row.try_get("company_id"))
            .collect::<sqlx::Result<_>>()?;
        company_ids.sort_unstable();
        company_ids.dedup();

        let tags = self.tags_by_company(&company_ids).await?;

        rows.iter()
            .map(|row| -> Result<ProjectWithCompany> {
                let project = project_from_row(row)?;
                let company = Company {
                    id: project.company_id,
                    name: row.try_get("company_name")?,
                    tags: tags.get(&project.company_id).cloned().unwrap_or_default(),
                };
                Ok(ProjectWithCompany { project, company })
            })
            .collect()
    }
}

async fn count_projects<'e, E>(executor: E, company_id: i32) -> Result<i64>
where
    E: sqlx::PgExecutor<'e>,
{
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM projects WHERE company_id = $1")
        .bind(company_id)
        .fetch_one(executor)
        .await?;
    Ok(count)
}

async fn replace_company_tags(tx: &mut Transaction<'_, Postgres>, company_id: i32, tag_ids: &[i32]) -> Result<()> {
    sqlx::query("DELETE FROM company_tags WHERE company_id = $1")
        .bind(company_id)
        .execute(&mut **tx)
        .await?;

    for &tag_id in tag_ids {
        let inserted = sqlx::query(
            "INSERT INTO company_tags (company_id, tag_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(company_id)
        .bind(tag_id)
        .execute(&mut **tx)
        .await;

        match inserted {
            Ok(_) => {}
            Err(err) if is_foreign_key_violation(&err) => {
                return Err(ProjectError::NotFound { entity: "tag", id: tag_id });
            }
            Err(err) => return Err(err.into()),
        }
    }

    Ok(())
}

fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().as_deref() == Some(FOREIGN_KEY_VIOLATION),
        _ => false,
    }
}

fn tag_from_row(row: &PgRow) -> Result<Tag> {
    let color: String = row.try_get("color")?;
    Ok(Tag {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        color: color.parse()?,
    })
}

fn project_from_row(row: &PgRow) -> Result<Project> {
    Ok(Project {
        id: row.try_get("id")?,
        company_id: row.try_get("company_id")?,
        title: row.try_get("title")?,
        start_date: row.try_get::<Option<NaiveDate>, _>("start_date")?,
        end_date: row.try_get::<Option<NaiveDate>, _>("end_date")?,
        estimated_design: row.try_get("estimated_design")?,
        actual_design: row.try_get::<BigDecimal, _>("actual_design")?,
        estimated_development: row.try_get("estimated_development")?,
        actual_development: row.try_get::<BigDecimal, _>("actual_development")?,
        estimated_testing: row.try_get("estimated_testing")?,
        actual_testing: row.try_get::<BigDecimal, _>("actual_testing")?,
    })
}

/// Initialize the database connection pool
pub async fn init(config: &Config) -> Result<Database> {
    let db = Database::new(config).await?;
    tracing::info!("database connection established");

    if config.run_migrations {
        db.migrate().await?;
    }

    Ok(db)
}
