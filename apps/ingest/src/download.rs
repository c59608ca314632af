//! Dataset acquisition: Kaggle CLI downloads with retry and a bundled
//! sample fallback, so an offline or credential-less run still produces a
//! working (if small) corpus.

use std::fs;
use std::path::PathBuf;

use tokio::process::Command;
use tracing::{info, warn};

use crate::config::Config;
use crate::embeddings::Backoff;
use crate::errors::AppError;

const MAX_ATTEMPTS: u32 = 3;

/// What a dataset contributes to the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetKind {
    Listings,
    Skills,
    Companies,
    Resumes,
}

impl DatasetKind {
    /// Bundled sample shipped for offline runs.
    pub fn sample_file(&self) -> &'static str {
        match self {
            DatasetKind::Listings => "listings_sample.csv",
            DatasetKind::Skills => "skills_sample.csv",
            DatasetKind::Companies => "companies_sample.csv",
            DatasetKind::Resumes => "resumes_sample.csv",
        }
    }
}

/// One upstream dataset.
#[derive(Debug, Clone, Copy)]
pub struct DatasetSpec {
    pub slug: &'static str,
    pub alias: &'static str,
    pub kind: DatasetKind,
}

/// Every dataset an ingestion run pulls, in processing order.
pub const DATASETS: &[DatasetSpec] = &[
    DatasetSpec {
        slug: "arnavpp/internshala-internship-dataset",
        alias: "internshala",
        kind: DatasetKind::Listings,
    },
    DatasetSpec {
        slug: "sujaykapadnis/job-listings-from-naukricom",
        alias: "naukri-job",
        kind: DatasetKind::Listings,
    },
    DatasetSpec {
        slug: "asaniczka/linkedin-job-postings",
        alias: "linkedin-job",
        kind: DatasetKind::Listings,
    },
    DatasetSpec {
        slug: "promptcloudhq/us-uk-india-jobs",
        alias: "promptcloud-job",
        kind: DatasetKind::Listings,
    },
    DatasetSpec {
        slug: "ankurzing/scraped-skill-data",
        alias: "skill-scrape",
        kind: DatasetKind::Skills,
    },
    DatasetSpec {
        slug: "mahmoudalshami/linkedin-skills",
        alias: "linkedin-skills",
        kind: DatasetKind::Skills,
    },
    DatasetSpec {
        slug: "muhammadnayeem/skills-dataset",
        alias: "skills-dataset",
        kind: DatasetKind::Skills,
    },
    DatasetSpec {
        slug: "gauravduttakiit/resume-dataset",
        alias: "resume-gaurav",
        kind: DatasetKind::Resumes,
    },
    DatasetSpec {
        slug: "snehaanbhawal/resume-dataset-job-title-annotations",
        alias: "resume-annotated",
        kind: DatasetKind::Resumes,
    },
    DatasetSpec {
        slug: "mahimasingla09/profiles-data-datasets",
        alias: "profiles",
        kind: DatasetKind::Resumes,
    },
    DatasetSpec {
        slug: "saurabhshahane/job-descriptions-dataset",
        alias: "job-descriptions",
        kind: DatasetKind::Listings,
    },
    DatasetSpec {
        slug: "promptcloudhq/jobs-on-naukricom",
        alias: "naukri-descriptions",
        kind: DatasetKind::Listings,
    },
    DatasetSpec {
        slug: "kapastor/2020-student-salary-survey",
        alias: "salary",
        kind: DatasetKind::Listings,
    },
    DatasetSpec {
        slug: "peopledatalabssf/companies-dataset",
        alias: "companies",
        kind: DatasetKind::Companies,
    },
];

/// Downloads one dataset into `raw/<alias>/`. Without credentials, or
/// after exhausting retries, copies the bundled sample instead.
pub async fn download_dataset(config: &Config, dataset: &DatasetSpec) -> Result<(), AppError> {
    let dest = dataset_dir(config, dataset);
    fs::create_dir_all(&dest)?;

    let (Some(username), Some(key)) = (&config.kaggle_username, &config.kaggle_key) else {
        warn!(
            "Kaggle credentials missing; using bundled sample for {}",
            dataset.alias
        );
        return copy_sample(config, dataset);
    };

    let backoff = Backoff::default();
    for attempt in 1..=MAX_ATTEMPTS {
        info!("Downloading {} (attempt {attempt})", dataset.slug);
        let status = Command::new("kaggle")
            .args(["datasets", "download", "-d", dataset.slug, "-p"])
            .arg(&dest)
            .args(["--force", "--unzip"])
            .env("KAGGLE_USERNAME", username)
            .env("KAGGLE_KEY", key)
            .status()
            .await;

        match status {
            Ok(code) if code.success() => return Ok(()),
            Ok(code) => warn!("kaggle exited with {code} for {}", dataset.slug),
            Err(e) => warn!("Failed to launch kaggle CLI: {e}"),
        }
        if attempt < MAX_ATTEMPTS {
            tokio::time::sleep(backoff.delay_for(attempt)).await;
        }
    }

    warn!("Giving up on {}; copying bundled sample", dataset.alias);
    copy_sample(config, dataset)
}

fn dataset_dir(config: &Config, dataset: &DatasetSpec) -> PathBuf {
    config.raw_dir().join(dataset.alias)
}

fn copy_sample(config: &Config, dataset: &DatasetSpec) -> Result<(), AppError> {
    let sample = config.samples_dir().join(dataset.kind.sample_file());
    if !sample.exists() {
        return Err(AppError::Download(format!(
            "no bundled sample for {} at {}",
            dataset.alias,
            sample.display()
        )));
    }
    let dest_dir = dataset_dir(config, dataset);
    fs::create_dir_all(&dest_dir)?;
    fs::copy(&sample, dest_dir.join(dataset.kind.sample_file()))?;
    warn!("Fell back to bundled sample for {}", dataset.alias);
    Ok(())
}
