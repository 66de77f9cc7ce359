//! Resolution run driver.
//!
//! Groups input rows by address (one retrieval per distinct address), drives
//! the orchestrator strictly sequentially, fans the retrieval result out to
//! every row sharing the address, and flushes outcomes to the sink after
//! each address so an interrupted run loses at most the address in flight.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::models::{AddressRow, Config, FailureRecord, SuccessRecord};
use crate::pipeline::matcher::nearest;
use crate::pipeline::orchestrator::{Orchestrator, Retrieval};
use crate::services::{PageFetcher, ProxyRotator};
use crate::storage::ResultSink;

/// Summary of one resolution run.
#[derive(Debug)]
pub struct RunStats {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Distinct addresses retrieved
    pub addresses: usize,
    /// Input rows processed
    pub rows: usize,
    /// Input rows that produced at least one success row
    pub matched_rows: usize,
    /// Success rows written (fan-out can exceed the input row count)
    pub success_rows: usize,
    /// Failure rows written
    pub failure_rows: usize,
    /// Sessions opened over the whole run
    pub sessions: usize,
}

impl RunStats {
    /// Share of input rows that resolved, in whole percent.
    pub fn success_percent(&self) -> usize {
        if self.rows == 0 {
            return 0;
        }
        self.matched_rows * 100 / self.rows
    }
}

/// Run the resolver over the given input rows.
pub async fn run_resolver<F: PageFetcher, S: ResultSink>(
    config: Arc<Config>,
    rows: Vec<AddressRow>,
    fetcher: F,
    sink: &mut S,
) -> Result<RunStats> {
    let start_time = Utc::now();
    let rotator = ProxyRotator::new(config.proxies.clone())?;
    let mut orchestrator = Orchestrator::new(Arc::clone(&config), fetcher, rotator);

    let total_rows = rows.len();
    let groups = group_by_address(rows);
    let total_addresses = groups.len();
    log::info!("Resolving {total_addresses} addresses ({total_rows} rows)");

    let mut matched_rows = 0usize;
    let mut success_rows = 0usize;
    let mut failure_rows = 0usize;

    for (idx, (address, group)) in groups.into_iter().enumerate() {
        log::info!("[{}/{}] {}", idx + 1, total_addresses, address);

        let retrieval = orchestrator.resolve(&address).await?;
        log::info!("  found {} entrances", retrieval.entrances.len());

        let mut successes = Vec::new();
        let mut failures = Vec::new();
        for row in &group {
            match fan_out_row(row, &retrieval, &config) {
                Ok(rows_for_input) => {
                    matched_rows += 1;
                    successes.extend(rows_for_input);
                }
                Err(failure) => failures.push(failure),
            }
        }

        success_rows += successes.len();
        failure_rows += failures.len();
        sink.record_successes(&successes).await?;
        sink.record_failures(&failures).await?;
    }

    let stats = RunStats {
        start_time,
        end_time: Utc::now(),
        addresses: total_addresses,
        rows: total_rows,
        matched_rows,
        success_rows,
        failure_rows,
        sessions: orchestrator.sessions_opened(),
    };

    log::info!(
        "Done: {}/{} rows resolved ({}%), {} success rows, {} failure rows, {} sessions",
        stats.matched_rows,
        stats.rows,
        stats.success_percent(),
        stats.success_rows,
        stats.failure_rows,
        stats.sessions,
    );

    Ok(stats)
}

/// Group rows by address preserving first-seen address order.
fn group_by_address(rows: Vec<AddressRow>) -> Vec<(String, Vec<AddressRow>)> {
    let mut groups: Vec<(String, Vec<AddressRow>)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for row in rows {
        match index.get(&row.address) {
            Some(&i) => groups[i].1.push(row),
            None => {
                index.insert(row.address.clone(), groups.len());
                let address = row.address.clone();
                groups.push((address, vec![row]));
            }
        }
    }
    groups
}

/// Apply one retrieval to one input row.
///
/// Rows with reference coordinates take the nearest entrance within the
/// threshold; rows without get a copy of every extracted entrance.
fn fan_out_row(
    row: &AddressRow,
    retrieval: &Retrieval,
    config: &Config,
) -> std::result::Result<Vec<SuccessRecord>, FailureRecord> {
    match row.ref_coords() {
        Some((ref_lat, ref_lon)) => nearest(
            ref_lat,
            ref_lon,
            &retrieval.entrances,
            config.matcher.max_distance_m,
        )
        .map(|matched| {
            vec![SuccessRecord {
                id: row.id.clone(),
                address: row.address.clone(),
                porch: row_porch(row, &matched.entrance.porch),
                lat: matched.entrance.lat,
                lon: matched.entrance.lon,
                azimuth: matched.entrance.azimuth,
                source: config.output.source_label.clone(),
            }]
        })
        .ok_or_else(|| failure_record(row, retrieval)),
        None if retrieval.entrances.is_empty() => Err(failure_record(row, retrieval)),
        None => Ok(retrieval
            .entrances
            .iter()
            .map(|entrance| SuccessRecord {
                id: row.id.clone(),
                address: row.address.clone(),
                porch: entrance.porch.clone(),
                lat: entrance.lat,
                lon: entrance.lon,
                azimuth: entrance.azimuth,
                source: config.output.source_label.clone(),
            })
            .collect()),
    }
}

/// The input row's own sub-unit label wins over the entrance label.
fn row_porch(row: &AddressRow, entrance_porch: &str) -> String {
    match &row.porch {
        Some(porch) if !porch.trim().is_empty() => porch.clone(),
        _ => entrance_porch.to_string(),
    }
}

fn failure_record(row: &AddressRow, retrieval: &Retrieval) -> FailureRecord {
    FailureRecord {
        id: row.id.clone(),
        address: row.address.clone(),
        search_url: retrieval.search_url.clone(),
        result_url: retrieval.final_url.clone(),
        raw_document: retrieval.document.clone(),
        recorded_at: Utc::now(),
    }
}
