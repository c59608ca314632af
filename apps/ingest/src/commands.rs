//! Pipeline stage implementations behind the CLI subcommands.
//!
//! Each stage reads what the previous one wrote under the data directory,
//! so stages can be re-run independently. Normalized tables are written as
//! CSV for downstream consumers plus canonical JSON sidecars that the
//! later stages read back (list-valued columns never round-trip through
//! CSV cells).

use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use crate::chunking::{chunk_text, Chunk, ChunkOptions, SourceType};
use crate::config::Config;
use crate::db;
use crate::download::{download_dataset, DatasetKind, DATASETS};
use crate::embeddings::EmbeddingsClient;
use crate::errors::AppError;
use crate::loaders::load_structured_files;
use crate::matching::{SkillMapper, SkillRecord};
use crate::models::{CompanyRow, ListingRow, ResumeRow};
use crate::normalize::companies::normalize_companies;
use crate::normalize::listings::{dedupe_listings, normalize_listings};
use crate::normalize::resumes::normalize_resumes;
use crate::normalize::skills::normalize_skills;
use crate::normalize::GenericRow;
use crate::report::{write_report, DatasetStats, IngestState};
use crate::routes::build_router;
use crate::state::AppState;
use crate::vectorstore::{QueryFilter, VectorRecord, VectorStore};

/// CLI filter shorthands mapped onto chunk metadata keys.
const FILTER_ALIASES: &[(&str, &str)] = &[
    ("country", "location_country"),
    ("state", "location_state"),
    ("city", "location_city"),
];

pub async fn run_download(config: &Config) -> Result<(), AppError> {
    config.ensure_dirs()?;
    for dataset in DATASETS {
        download_dataset(config, dataset).await?;
    }
    info!("Download step complete");
    Ok(())
}

pub fn run_clean(config: &Config) -> Result<(), AppError> {
    config.ensure_dirs()?;
    let mut state = IngestState::default();

    let mut listing_rows: Vec<GenericRow> = Vec::new();
    let mut skill_rows: Vec<GenericRow> = Vec::new();
    let mut company_rows: Vec<GenericRow> = Vec::new();
    let mut resume_rows: Vec<GenericRow> = Vec::new();

    for dataset in DATASETS {
        let rows = load_structured_files(&config.raw_dir().join(dataset.alias));
        state.datasets.insert(
            dataset.alias.to_string(),
            DatasetStats {
                rows_read: rows.len() as u64,
                rows_ingested: rows.len() as u64,
                duplicates: 0,
            },
        );
        match dataset.kind {
            DatasetKind::Listings => listing_rows.extend(rows),
            DatasetKind::Skills => skill_rows.extend(rows),
            DatasetKind::Companies => company_rows.extend(rows),
            DatasetKind::Resumes => resume_rows.extend(rows),
        }
    }

    let skills = normalize_skills(&skill_rows);
    let mapper = SkillMapper::new(skills.clone());

    let normalization = normalize_listings(&listing_rows, &mapper);
    let (listings, duplicates) = dedupe_listings(normalization.listings);
    state.parse_failures = normalization.failures;
    state.listing_duplicates = duplicates;
    state.skill_mappings = normalization.mapping_samples;
    state.location_samples = normalization.location_samples;

    let companies = normalize_companies(&company_rows);
    let resumes = normalize_resumes(&resume_rows);

    let clean = config.clean_dir();
    write_csv(
        &clean.join("skills.csv"),
        &["skill_id", "skill_name", "skill_category", "aliases"],
        skills.iter().map(skill_csv_record),
    )?;
    write_json(&clean.join("skills.json"), &skills)?;
    write_csv(
        &clean.join("companies.csv"),
        CompanyRow::CSV_HEADER,
        companies.iter().map(CompanyRow::csv_record),
    )?;
    write_json(&clean.join("companies.json"), &companies)?;
    write_csv(
        &clean.join("resumes.csv"),
        ResumeRow::CSV_HEADER,
        resumes.iter().map(ResumeRow::csv_record),
    )?;
    write_json(&clean.join("resumes.json"), &resumes)?;
    write_csv(
        &clean.join("listings.csv"),
        ListingRow::CSV_HEADER,
        listings.iter().map(ListingRow::csv_record),
    )?;
    write_json(&clean.join("listings.json"), &listings)?;

    let chunks = build_chunks(&listings, &resumes, &mapper);
    write_csv(
        &clean.join("chunks.csv"),
        CHUNK_CSV_HEADER,
        chunks.iter().map(chunk_csv_record),
    )?;
    write_json(&clean.join("chunks.json"), &chunks)?;

    state.sample_listings = listings.iter().take(20).cloned().collect();
    state.save(&config.reports_dir())?;

    info!(
        "Clean step complete: {} listings ({} duplicates dropped), {} resumes, {} chunks",
        listings.len(),
        duplicates,
        resumes.len(),
        chunks.len()
    );
    Ok(())
}

pub async fn run_embed(config: &Config) -> Result<(), AppError> {
    config.ensure_dirs()?;
    let chunks: Vec<Chunk> = read_json(&config.clean_dir().join("chunks.json"))?
        .ok_or_else(|| AppError::NotFound("chunks.json missing; run clean first".to_string()))?;

    let client = EmbeddingsClient::from_config(config);
    let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
    let results = client.embed(&texts).await;

    let records: Vec<VectorRecord> = chunks
        .iter()
        .zip(results)
        .map(|(chunk, result)| {
            let metadata = match serde_json::to_value(chunk) {
                Ok(Value::Object(map)) => map,
                _ => serde_json::Map::new(),
            };
            VectorRecord {
                chunk_id: chunk.chunk_id.clone(),
                vector: result.vector,
                metadata,
            }
        })
        .collect();

    let store = VectorStore::new(&config.vector_dir());
    store.save(&records)?;
    info!("Embed step complete: {} vectors stored", records.len());
    Ok(())
}

pub async fn run_load_db(config: &Config) -> Result<(), AppError> {
    config.ensure_dirs()?;
    let pool = db::create_pool(&config.db_path()).await?;
    db::create_tables(&pool).await?;

    let clean = config.clean_dir();
    if let Some(listings) = read_json::<Vec<ListingRow>>(&clean.join("listings.json"))? {
        db::insert_listings(&pool, &listings).await?;
    }
    if let Some(companies) = read_json::<Vec<CompanyRow>>(&clean.join("companies.json"))? {
        db::insert_companies(&pool, &companies).await?;
    }
    if let Some(skills) = read_json::<Vec<SkillRecord>>(&clean.join("skills.json"))? {
        db::insert_skills(&pool, &skills).await?;
    }
    if let Some(resumes) = read_json::<Vec<ResumeRow>>(&clean.join("resumes.json"))? {
        db::insert_resumes(&pool, &resumes).await?;
    }
    if let Some(chunks) = read_json::<Vec<Chunk>>(&clean.join("chunks.json"))? {
        db::insert_chunks(&pool, &chunks).await?;
    }

    info!("SQLite load complete");
    Ok(())
}

pub fn run_report(config: &Config) -> Result<(), AppError> {
    config.ensure_dirs()?;
    let state = IngestState::load(&config.reports_dir())?;
    let path = write_report(&config.reports_dir(), &state)?;
    info!("Report written to {}", path.display());
    Ok(())
}

pub async fn run_query(
    config: &Config,
    text: &str,
    top_k: usize,
    filter_arg: Option<&str>,
) -> Result<(), AppError> {
    let filter = filter_arg.map(parse_filter_arg).unwrap_or_default();

    let client = EmbeddingsClient::from_config(config);
    let mut embedded = client.embed(std::slice::from_ref(&text.to_string())).await;
    let query = embedded.remove(0);

    let store = VectorStore::new(&config.vector_dir());
    let hits = store.query(
        &query.vector,
        top_k,
        (!filter.is_empty()).then_some(&filter),
    )?;

    println!("{}", serde_json::to_string_pretty(&hits)?);
    Ok(())
}

pub async fn run_serve(config: &Config, port: u16) -> Result<(), AppError> {
    let state = AppState {
        embeddings: EmbeddingsClient::from_config(config),
        store: Arc::new(VectorStore::new(&config.vector_dir())),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_chunks(
    listings: &[ListingRow],
    resumes: &[ResumeRow],
    mapper: &SkillMapper,
) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    for listing in listings {
        let opts = ChunkOptions {
            location_city: listing.location_city.clone(),
            location_state: listing.location_state.clone(),
            location_country: listing.location_country.clone(),
            posted_date: listing.posted_date.clone(),
            source: listing.source.clone(),
        };
        chunks.extend(chunk_text(
            &listing.description,
            SourceType::Listing,
            &listing.listing_id,
            Some(mapper),
            &opts,
        ));
    }
    for resume in resumes {
        chunks.extend(chunk_text(
            &resume.raw_resume_text,
            SourceType::Resume,
            &resume.user_id,
            Some(mapper),
            &ChunkOptions::default(),
        ));
    }
    chunks
}

/// Parses "k=v,k=v" CLI filters, translating shorthand keys.
fn parse_filter_arg(arg: &str) -> QueryFilter {
    let mut filter = QueryFilter::new();
    for pair in arg.split(',') {
        let Some((key, value)) = pair.split_once('=') else {
            continue;
        };
        let key = key.trim();
        let value = value.trim();
        if key.is_empty() || value.is_empty() {
            continue;
        }
        let key = FILTER_ALIASES
            .iter()
            .find(|(alias, _)| *alias == key)
            .map(|(_, target)| *target)
            .unwrap_or(key);
        filter.insert(key.to_string(), value.to_string());
    }
    filter
}

const CHUNK_CSV_HEADER: &[&str] = &[
    "chunk_id",
    "source_type",
    "source_id",
    "chunk_index",
    "text",
    "tokens_estimate",
    "top_skills",
    "location_city",
    "location_state",
    "location_country",
    "posted_date",
    "source",
];

fn chunk_csv_record(chunk: &Chunk) -> Vec<String> {
    vec![
        chunk.chunk_id.clone(),
        chunk.source_type.as_str().to_string(),
        chunk.source_id.clone(),
        chunk.chunk_index.to_string(),
        chunk.text.clone(),
        chunk.tokens_estimate.to_string(),
        serde_json::to_string(&chunk.top_skills).unwrap_or_else(|_| "[]".to_string()),
        chunk.location_city.clone().unwrap_or_default(),
        chunk.location_state.clone().unwrap_or_default(),
        chunk.location_country.clone().unwrap_or_default(),
        chunk.posted_date.clone().unwrap_or_default(),
        chunk.source.clone().unwrap_or_default(),
    ]
}

fn skill_csv_record(skill: &SkillRecord) -> Vec<String> {
    vec![
        skill.skill_id.clone(),
        skill.skill_name.clone(),
        skill.skill_category.clone().unwrap_or_default(),
        serde_json::to_string(&skill.aliases).unwrap_or_else(|_| "[]".to_string()),
    ]
}

fn write_csv<I>(path: &Path, header: &[&str], records: I) -> Result<(), AppError>
where
    I: IntoIterator<Item = Vec<String>>,
{
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(header)?;
    for record in records {
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), AppError> {
    fs::write(path, serde_json::to_string_pretty(value)?)?;
    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, AppError> {
    if !path.exists() {
        return Ok(None);
    }
    let text = fs::read_to_string(path)?;
    Ok(Some(serde_json::from_str(&text)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_arg_aliases_and_passthrough() {
        let filter = parse_filter_arg("country=India, mode=online,source_type=listing");
        assert_eq!(filter.get("location_country").map(String::as_str), Some("India"));
        assert_eq!(filter.get("mode").map(String::as_str), Some("online"));
        assert_eq!(filter.get("source_type").map(String::as_str), Some("listing"));
    }

    #[test]
    fn test_filter_arg_skips_malformed_pairs() {
        let filter = parse_filter_arg("nonsense,=x,city=");
        assert!(filter.is_empty());
    }

    #[test]
    fn test_build_chunks_covers_listings_and_resumes() {
        let mapper = SkillMapper::new(vec![]);
        let listing = ListingRow {
            listing_id: "L1".into(),
            title: "Intern".into(),
            company_id: None,
            company_name: "Acme".into(),
            location_city: Some("Pune".into()),
            location_state: Some("Maharashtra".into()),
            location_country: Some("India".into()),
            skills: vec![],
            stipend_min_inr: None,
            stipend_max_inr: None,
            duration_weeks: None,
            mode: None,
            category: None,
            description: "Work on backend services.".into(),
            application_url: None,
            posted_date: None,
            source: Some("unit".into()),
        };
        let resume = ResumeRow {
            user_id: "U1".into(),
            name: "Asha".into(),
            education: vec![],
            experience_years: None,
            skills: vec![],
            projects: None,
            raw_resume_text: "Built dashboards with Python.".into(),
            source: None,
        };

        let chunks = build_chunks(&[listing], &[resume], &mapper);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].chunk_id, "L1-0");
        assert_eq!(chunks[0].location_city.as_deref(), Some("Pune"));
        assert_eq!(chunks[1].chunk_id, "U1-0");
        assert_eq!(chunks[1].source_type, SourceType::Resume);
    }
}
