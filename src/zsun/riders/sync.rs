use std::fs;
use std::path::Path;

use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::zsun::riders::config::SyncConfig;
use crate::zsun::riders::diff::{self, SheetDiff};
use crate::zsun::riders::error::Result;
use crate::zsun::riders::io::destination::Destination;
use crate::zsun::riders::io::payload::{self, RawPayload};
use crate::zsun::riders::io::transport::Transport;
use crate::zsun::riders::model::fields::FIELD_TABLE_VERSION;
use crate::zsun::riders::model::{CellValue, column_headers};
use crate::zsun::riders::normalize;
use crate::zsun::riders::repository::{LoadReport, RiderRepository};

/// Counters describing one ingest-then-sync cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SyncReport {
    pub loaded: usize,
    pub skipped: usize,
    pub compacted: usize,
    pub rows_scanned: usize,
    pub rows_matched: usize,
    pub blocks_written: usize,
}

/// Fetches payload text through the transport and classifies its shape.
#[instrument(level = "info", skip_all)]
pub fn fetch_payload<T: Transport + ?Sized>(transport: &T) -> Result<RawPayload> {
    let text = transport.fetch()?;
    let payload = payload::parse_payload(&text)?;
    info!(entries = payload.len(), "payload parsed");
    Ok(payload)
}

/// Rebuilds the repository from a freshly fetched payload.
#[instrument(level = "info", skip_all)]
pub fn refresh_repository<T: Transport + ?Sized>(
    repository: &mut RiderRepository,
    transport: &T,
) -> Result<LoadReport> {
    let payload = fetch_payload(transport)?;
    repository.load(&payload)
}

/// Overwrites every destination row whose key names a rider, one range
/// write per contiguous block. Rows without a matching rider are left as
/// they are.
#[instrument(
    level = "info",
    skip_all,
    fields(header_row = config.header_row, row_limit = config.row_limit)
)]
pub fn sync_to_destination<D: Destination + ?Sized>(
    repository: &RiderRepository,
    destination: &mut D,
    config: &SyncConfig,
) -> Result<SheetDiff> {
    if destination.get_all_rows(1)?.is_empty() {
        if config.header_row == 1 {
            destination.append_header_row(&column_headers())?;
            destination.flush()?;
            info!("destination was empty, header row written");
        } else {
            warn!("destination is empty, nothing to update");
        }
        return Ok(SheetDiff::default());
    }

    let first_row = config.first_data_row();
    let rows = destination.get_all_rows(first_row)?;
    let diff = diff::diff_blocks(repository, &rows, first_row, config.row_limit);

    for block in &diff.blocks {
        debug!(start_row = block.start_row, end_row = block.end_row(), "writing block");
        destination.write_contiguous_rows(block.start_row, &block.rows)?;
    }
    destination.flush()?;

    info!(
        rows_matched = diff.rows_matched,
        block_count = diff.blocks.len(),
        "destination updated"
    );
    Ok(diff)
}

/// Writes a header row and every rider, sorted by display name, as one
/// contiguous block below the last used row. Returns the number of riders
/// written.
#[instrument(level = "info", skip_all)]
pub fn dump_to_destination<D: Destination + ?Sized>(
    repository: &RiderRepository,
    destination: &mut D,
) -> Result<usize> {
    destination.append_header_row(&column_headers())?;
    let header_row = u32::try_from(destination.get_all_rows(1)?.len()).unwrap_or(u32::MAX);

    let rows: Vec<Vec<CellValue>> = repository
        .all_sorted_by_display_name()
        .into_iter()
        .map(|rider| rider.to_row())
        .collect();
    if !rows.is_empty() {
        destination.write_contiguous_rows(header_row.saturating_add(1), &rows)?;
    }
    destination.flush()?;

    info!(rider_count = rows.len(), header_row, "riders dumped");
    Ok(rows.len())
}

/// Writes the repository as normalized JSON keyed by identifier.
#[instrument(level = "info", skip_all, fields(output = %output.display()))]
pub fn export_json(repository: &RiderRepository, output: &Path) -> Result<()> {
    let json = normalize::serialize_entities(repository.all_sorted_by_display_name());
    let json_string = serde_json::to_string_pretty(&json)?;
    fs::write(output, json_string)?;
    info!(
        rider_count = repository.count(),
        field_table_version = FIELD_TABLE_VERSION,
        "normalized riders exported"
    );
    Ok(())
}

/// One full cycle: fetch, load, optionally compact to `retain`, then
/// update the destination in place.
#[instrument(level = "info", skip_all, fields(sheet = %config.sheet_name))]
pub fn run_sync<T, D>(
    transport: &T,
    destination: &mut D,
    config: &SyncConfig,
    retain: Option<&Value>,
) -> Result<SyncReport>
where
    T: Transport + ?Sized,
    D: Destination + ?Sized,
{
    let mut repository = RiderRepository::new();
    let load = refresh_repository(&mut repository, transport)?;
    let compacted = retain
        .map(|ids| repository.compact_to_subset_value(ids))
        .unwrap_or(0);

    let diff = sync_to_destination(&repository, destination, config)?;

    Ok(SyncReport {
        loaded: load.loaded,
        skipped: load.skipped,
        compacted,
        rows_scanned: diff.rows_scanned,
        rows_matched: diff.rows_matched,
        blocks_written: diff.blocks.len(),
    })
}
