//! Export of the cleaned table as train/dev/test JSON Lines.
//!
//! Each line is `{"text": ..., "cats": {"label": 0|1, ...}}`. Labels that
//! are constant over the whole table carry no signal and are dropped.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::api::logs::{log_info, log_info_indent, log_success};
use crate::classifier::split::shuffled_indices;
use crate::error::{TrainError, TrainResult};
use crate::models::{Dataset, TextColumn};
use crate::store::{DatasetStore, DEFAULT_TABLE};

#[derive(Debug, Clone)]
pub struct CorpusOptions {
    pub table: String,
    pub seed: u64,
    /// Fraction of rows in the train set; the rest is halved into dev/test.
    pub split: f64,
    pub text_column: TextColumn,
}

impl Default for CorpusOptions {
    fn default() -> Self {
        Self {
            table: DEFAULT_TABLE.to_string(),
            seed: 42,
            split: 0.75,
            text_column: TextColumn::Message,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CorpusSummary {
    pub train: usize,
    pub dev: usize,
    pub test: usize,
    pub labels: Vec<String>,
    pub dropped_labels: Vec<String>,
    pub files: Vec<PathBuf>,
}

#[derive(Serialize)]
struct CorpusRecord<'a> {
    text: &'a str,
    cats: BTreeMap<&'a str, u8>,
}

/// Split boundaries `(train_end, dev_end)` for `n` rows.
pub fn split_bounds(n: usize, split: f64) -> (usize, usize) {
    let train_end = ((split.clamp(0.0, 1.0) * n as f64) as usize).min(n);
    let dev_end = train_end + (n - train_end) / 2;
    (train_end, dev_end)
}

/// Write `train.jsonl`, `dev.jsonl` and `test.jsonl` into `out_dir`.
pub fn export_corpus(
    dataset: &Dataset,
    out_dir: &Path,
    options: &CorpusOptions,
) -> TrainResult<CorpusSummary> {
    if dataset.is_empty() {
        return Err(TrainError::NotEnoughRows("dataset is empty".into()));
    }

    let constant = dataset.constant_labels();
    let kept: Vec<usize> = (0..dataset.labels.len())
        .filter(|j| !constant.contains(j))
        .collect();
    let dropped_labels: Vec<String> = constant.iter().map(|&j| dataset.labels[j].clone()).collect();

    let order = shuffled_indices(dataset.len(), options.seed);
    let (train_end, dev_end) = split_bounds(order.len(), options.split);

    fs::create_dir_all(out_dir)?;
    let mut files = Vec::with_capacity(3);
    for (name, range) in [
        ("train", 0..train_end),
        ("dev", train_end..dev_end),
        ("test", dev_end..order.len()),
    ] {
        let path = out_dir.join(format!("{}.jsonl", name));
        let mut writer = BufWriter::new(File::create(&path)?);
        for &i in &order[range] {
            let record = &dataset.records[i];
            let line = CorpusRecord {
                text: record.text(options.text_column),
                cats: kept
                    .iter()
                    .map(|&j| (dataset.labels[j].as_str(), record.labels[j]))
                    .collect(),
            };
            serde_json::to_writer(&mut writer, &line)?;
            writer.write_all(b"\n")?;
        }
        writer.flush()?;
        files.push(path);
    }

    Ok(CorpusSummary {
        train: train_end,
        dev: dev_end - train_end,
        test: order.len() - dev_end,
        labels: kept.iter().map(|&j| dataset.labels[j].clone()).collect(),
        dropped_labels,
        files,
    })
}

/// Load the table and export it.
pub async fn run_corpus(
    database: &Path,
    out_dir: &Path,
    options: &CorpusOptions,
) -> TrainResult<CorpusSummary> {
    log_info("Loading data...");
    log_info_indent(format!("DATABASE: {}", database.display()), 1);
    let store = DatasetStore::open(database, &options.table).await?;
    let dataset = store.load().await?;
    store.close().await;

    let summary = export_corpus(&dataset, out_dir, options)?;
    if !summary.dropped_labels.is_empty() {
        log_info_indent(
            format!("Dropped constant labels: {}", summary.dropped_labels.join(", ")),
            1,
        );
    }
    log_success(format!(
        "Corpus written to {} (train {}, dev {}, test {})",
        out_dir.display(),
        summary.train,
        summary.dev,
        summary.test
    ));
    Ok(summary)
}
