//! Inventory and usage lookups, and the report that ties them together.

pub mod analysis;
pub mod entities;
pub mod error;

use std::io::Write;

use anyhow::{Context, Result};
use futures::{stream, StreamExt};
use tracing::{debug, error, info, instrument, warn};

use crate::{
    api::{
        xml::{parse_serial_numbers, parse_usage_records},
        ManagementApi,
    },
    config::{AuditConfig, UsageWindow},
    utils::time::{date_to_query_name, format_duration},
};

use analysis::{summarize_device, Partition};
use entities::{UsageLookup, UsageRecord};
use error::LookupError;

const SEPARATOR_WIDTH: usize = 50;

/// Serial numbers of computers that have the target application installed, sorted and without
/// duplicates. A non-success status is fatal for the whole report.
#[instrument(skip_all, fields(application = %config.target_app))]
pub async fn lookup_inventory(
    api: &impl ManagementApi,
    config: &AuditConfig,
) -> Result<Vec<String>> {
    let response = api.computers_with_application(&config.target_app).await?;
    if !response.is_success() {
        error!("Inventory request failed with status {}", response.status);
        return Err(LookupError::InventoryStatus(response.status).into());
    }

    let serial_numbers = parse_serial_numbers(&response.body)?;
    info!("Found {} computers", serial_numbers.len());
    Ok(serial_numbers)
}

/// Usage of the target application on one computer during `window`.
#[instrument(skip(api, config, window))]
pub async fn lookup_usage(
    api: &impl ManagementApi,
    config: &AuditConfig,
    window: &UsageWindow,
    serial_number: &str,
) -> Result<UsageLookup> {
    let response = api.application_usage(serial_number, window).await?;
    if !response.is_success() {
        warn!("Usage request failed with status {}", response.status);
        return Ok(UsageLookup::RequestFailed(response.status));
    }

    let records = parse_usage_records(&response.body, serial_number, &config.target_app)
        .with_context(|| format!("Failed to parse usage of {serial_number}"))?;
    debug!("Found {} usage records", records.len());
    Ok(records.into())
}

/// Runs the whole report, writing it into `out` as it goes. Devices are printed in serial number
/// order even when several lookups are in flight. An error stops the report, whatever was
/// already written stays.
pub async fn run_audit(
    api: &impl ManagementApi,
    config: &AuditConfig,
    window: &UsageWindow,
    out: &mut impl Write,
) -> Result<Partition> {
    writeln!(
        out,
        "Finding usage data for '{}' over the last {} days ({} - {})",
        config.target_app,
        window.days,
        date_to_query_name(window.start),
        date_to_query_name(window.end)
    )?;

    let installed = lookup_inventory(api, config).await?;

    let mut with_usage = vec![];
    let mut failed = vec![];
    {
        let mut lookups = stream::iter(installed.iter())
            .map(|serial_number| async move {
                let lookup = lookup_usage(api, config, window, serial_number).await;
                (serial_number, lookup)
            })
            .buffered(config.concurrency);

        while let Some((serial_number, lookup)) = lookups.next().await {
            match lookup? {
                UsageLookup::Found(records) => {
                    write_records(out, serial_number, &records)?;
                    with_usage.push(serial_number.clone());
                }
                UsageLookup::EmptyWindow => writeln!(
                    out,
                    "No usage data found for serial number {} and the application {} over the last {} days.",
                    serial_number, config.target_app, window.days
                )?,
                UsageLookup::RequestFailed(status) => {
                    writeln!(
                        out,
                        "Usage request for serial number {serial_number} failed with status {status}."
                    )?;
                    failed.push(serial_number.clone());
                }
            }
        }
    }

    let partition = Partition::new(installed, with_usage, failed);
    write_summary(out, config, &partition)?;
    Ok(partition)
}

/// Top level of the report. Errors don't escape: they end the report with a single `Error:`
/// line. Only a broken `out` is returned to the caller.
pub async fn report(
    api: &impl ManagementApi,
    config: &AuditConfig,
    window: &UsageWindow,
    out: &mut impl Write,
) -> std::io::Result<()> {
    match run_audit(api, config, window, &mut *out).await {
        Ok(partition) => {
            info!(
                "Report finished: {} installed, {} with usage",
                partition.installed.len(),
                partition.with_usage.len()
            );
            Ok(())
        }
        Err(e) => {
            error!("Report stopped {e:?}");
            writeln!(out, "Error: {e:#}")
        }
    }
}

fn write_records(out: &mut impl Write, serial_number: &str, records: &[UsageRecord]) -> Result<()> {
    writeln!(out, "{}", serde_json::to_string_pretty(records)?)?;
    match summarize_device(records) {
        Some(summary) => writeln!(
            out,
            "{serial_number}: used on {} days, {} in foreground, opened {} times",
            summary.active_days,
            format_duration(summary.foreground),
            summary.opens
        )?,
        None => warn!("Usage totals of {serial_number} are out of range, leaving them out"),
    }
    writeln!(out, "{}", "=".repeat(SEPARATOR_WIDTH))?;
    Ok(())
}

fn write_summary(out: &mut impl Write, config: &AuditConfig, partition: &Partition) -> Result<()> {
    let app = &config.target_app;
    writeln!(
        out,
        "Number of machines with '{app}' installed: {}",
        partition.installed.len()
    )?;
    writeln!(
        out,
        "Serial numbers with '{app}' installed and usage data ({} machines):",
        partition.with_usage.len()
    )?;
    writeln!(out, "{}", serde_json::to_string(&partition.with_usage)?)?;
    writeln!(
        out,
        "Serial numbers with '{app}' installed but no usage data ({} machines):",
        partition.without_usage.len()
    )?;
    writeln!(out, "{}", serde_json::to_string(&partition.without_usage)?)?;

    if let Some(share) = partition.usage_share() {
        writeln!(out, "Share of machines actively using '{app}': {share}")?;
    }
    if !partition.failed.is_empty() {
        writeln!(
            out,
            "Serial numbers whose usage request failed, counted above as no usage data ({} machines):",
            partition.failed.len()
        )?;
        writeln!(out, "{}", serde_json::to_string(&partition.failed)?)?;
    }
    Ok(())
}
