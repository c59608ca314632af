//! SQLite persistence for the normalized tables and chunks.

use std::path::Path;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::info;

use crate::chunking::Chunk;
use crate::errors::AppError;
use crate::matching::{normalize_skill, SkillRecord};
use crate::models::{CompanyRow, ListingRow, ResumeRow};

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS listings (
        listing_id TEXT PRIMARY KEY,
        title TEXT,
        company_id TEXT,
        company_name TEXT,
        location_city TEXT,
        location_state TEXT,
        location_country TEXT,
        skills TEXT,
        stipend_min_inr INTEGER,
        stipend_max_inr INTEGER,
        duration_weeks INTEGER,
        mode TEXT,
        category TEXT,
        description TEXT,
        application_url TEXT,
        posted_date TEXT,
        source TEXT
    )",
    "CREATE TABLE IF NOT EXISTS companies (
        company_id TEXT PRIMARY KEY,
        company_name TEXT,
        industry TEXT,
        headquarters_city TEXT,
        headquarters_country TEXT,
        company_url TEXT,
        size_bucket TEXT,
        source TEXT
    )",
    "CREATE TABLE IF NOT EXISTS skills (
        skill_id TEXT PRIMARY KEY,
        skill_name TEXT,
        skill_normalized TEXT,
        skill_category TEXT,
        aliases TEXT
    )",
    "CREATE TABLE IF NOT EXISTS resumes (
        user_id TEXT PRIMARY KEY,
        name TEXT,
        education TEXT,
        experience_years REAL,
        skills TEXT,
        projects TEXT,
        raw_resume_text TEXT,
        source TEXT
    )",
    "CREATE TABLE IF NOT EXISTS chunks (
        chunk_id TEXT PRIMARY KEY,
        source_type TEXT,
        source_id TEXT,
        chunk_index INTEGER,
        text TEXT,
        tokens_estimate INTEGER,
        top_skills TEXT,
        location_city TEXT,
        location_state TEXT,
        location_country TEXT,
        posted_date TEXT,
        source TEXT
    )",
];

/// Creates (if needed) and connects to the run's SQLite database.
pub async fn create_pool(db_path: &Path) -> Result<SqlitePool, AppError> {
    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;
    info!("SQLite pool established at {}", db_path.display());
    Ok(pool)
}

pub async fn create_tables(pool: &SqlitePool) -> Result<(), AppError> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }
    Ok(())
}

pub async fn insert_listings(pool: &SqlitePool, listings: &[ListingRow]) -> Result<(), AppError> {
    for listing in listings {
        sqlx::query(
            "INSERT OR REPLACE INTO listings (listing_id, title, company_id, company_name, \
             location_city, location_state, location_country, skills, stipend_min_inr, \
             stipend_max_inr, duration_weeks, mode, category, description, application_url, \
             posted_date, source) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&listing.listing_id)
        .bind(&listing.title)
        .bind(&listing.company_id)
        .bind(&listing.company_name)
        .bind(&listing.location_city)
        .bind(&listing.location_state)
        .bind(&listing.location_country)
        .bind(serde_json::to_string(&listing.skills)?)
        .bind(listing.stipend_min_inr)
        .bind(listing.stipend_max_inr)
        .bind(listing.duration_weeks)
        .bind(&listing.mode)
        .bind(&listing.category)
        .bind(&listing.description)
        .bind(&listing.application_url)
        .bind(&listing.posted_date)
        .bind(&listing.source)
        .execute(pool)
        .await?;
    }
    Ok(())
}

pub async fn insert_companies(pool: &SqlitePool, companies: &[CompanyRow]) -> Result<(), AppError> {
    for company in companies {
        sqlx::query(
            "INSERT OR REPLACE INTO companies (company_id, company_name, industry, \
             headquarters_city, headquarters_country, company_url, size_bucket, source) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&company.company_id)
        .bind(&company.company_name)
        .bind(&company.industry)
        .bind(&company.headquarters_city)
        .bind(&company.headquarters_country)
        .bind(&company.company_url)
        .bind(&company.size_bucket)
        .bind(&company.source)
        .execute(pool)
        .await?;
    }
    Ok(())
}

pub async fn insert_skills(pool: &SqlitePool, skills: &[SkillRecord]) -> Result<(), AppError> {
    for skill in skills {
        sqlx::query(
            "INSERT OR REPLACE INTO skills (skill_id, skill_name, skill_normalized, \
             skill_category, aliases) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&skill.skill_id)
        .bind(&skill.skill_name)
        .bind(normalize_skill(&skill.skill_name))
        .bind(&skill.skill_category)
        .bind(serde_json::to_string(&skill.aliases)?)
        .execute(pool)
        .await?;
    }
    Ok(())
}

pub async fn insert_resumes(pool: &SqlitePool, resumes: &[ResumeRow]) -> Result<(), AppError> {
    for resume in resumes {
        sqlx::query(
            "INSERT OR REPLACE INTO resumes (user_id, name, education, experience_years, \
             skills, projects, raw_resume_text, source) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&resume.user_id)
        .bind(&resume.name)
        .bind(serde_json::to_string(&resume.education)?)
        .bind(resume.experience_years)
        .bind(serde_json::to_string(&resume.skills)?)
        .bind(&resume.projects)
        .bind(&resume.raw_resume_text)
        .bind(&resume.source)
        .execute(pool)
        .await?;
    }
    Ok(())
}

pub async fn insert_chunks(pool: &SqlitePool, chunks: &[Chunk]) -> Result<(), AppError> {
    for chunk in chunks {
        sqlx::query(
            "INSERT OR REPLACE INTO chunks (chunk_id, source_type, source_id, chunk_index, \
             text, tokens_estimate, top_skills, location_city, location_state, \
             location_country, posted_date, source) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&chunk.chunk_id)
        .bind(chunk.source_type.as_str())
        .bind(&chunk.source_id)
        .bind(chunk.chunk_index)
        .bind(&chunk.text)
        .bind(chunk.tokens_estimate)
        .bind(serde_json::to_string(&chunk.top_skills)?)
        .bind(&chunk.location_city)
        .bind(&chunk.location_state)
        .bind(&chunk.location_country)
        .bind(&chunk.posted_date)
        .bind(&chunk.source)
        .execute(pool)
        .await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_pool() -> (tempfile::TempDir, SqlitePool) {
        let dir = tempfile::tempdir().unwrap();
        let pool = create_pool(&dir.path().join("test.sqlite")).await.unwrap();
        create_tables(&pool).await.unwrap();
        (dir, pool)
    }

    fn listing(id: &str) -> ListingRow {
        ListingRow {
            listing_id: id.to_string(),
            title: "Backend Intern".into(),
            company_id: None,
            company_name: "Acme".into(),
            location_city: Some("Pune".into()),
            location_state: Some("Maharashtra".into()),
            location_country: Some("India".into()),
            skills: vec!["Python".into()],
            stipend_min_inr: Some(10_000),
            stipend_max_inr: Some(15_000),
            duration_weeks: Some(12),
            mode: None,
            category: None,
            description: "Build APIs".into(),
            application_url: None,
            posted_date: None,
            source: Some("unit-test".into()),
        }
    }

    #[tokio::test]
    async fn test_insert_listings_is_idempotent() {
        let (_dir, pool) = test_pool().await;
        insert_listings(&pool, &[listing("L1")]).await.unwrap();
        insert_listings(&pool, &[listing("L1")]).await.unwrap();

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM listings")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_skills_store_normalized_name() {
        let (_dir, pool) = test_pool().await;
        insert_skills(
            &pool,
            &[SkillRecord {
                skill_id: "s1".into(),
                skill_name: "Machine-Learning".into(),
                skill_category: None,
                aliases: vec!["ml".into()],
            }],
        )
        .await
        .unwrap();

        let normalized: String =
            sqlx::query_scalar("SELECT skill_normalized FROM skills WHERE skill_id = 's1'")
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(normalized, "machine learning");
    }
}
