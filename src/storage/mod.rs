//! Results persistence module

use anyhow::Result;
use polars::prelude::*;
use serde::Serialize;
use serde_json::{json, to_string_pretty};
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use crate::cluster::ClusterAssignment;
use crate::config::AnalysisConfig;
use crate::pipeline::AnalysisOutput;

/// Save analysis results to the specified directory
pub fn save_results(output: &AnalysisOutput, config: &AnalysisConfig, output_dir: &str) -> Result<()> {
    log::info!("Saving results to {}", output_dir);

    // Ensure output directory exists
    fs::create_dir_all(output_dir)?;

    save_assignments(&output.assignments, output_dir)?;
    save_summary(output, config, output_dir)?;

    save_json(&output.observed, output_dir, "counts.json")?;
    save_json(&output.ratios, output_dir, "ratios.json")?;
    save_json(&output.sample, output_dir, "null_counts.json")?;
    save_json(&output.comparison, output_dir, "comparison.json")?;
    if let Some(ref densities) = output.area_densities {
        save_json(densities, output_dir, "area_densities.json")?;
    }

    log::info!("Results saved successfully");

    Ok(())
}

/// Write the observation table enriched with its community
pub fn save_assignments(assignments: &[ClusterAssignment], output_dir: &str) -> Result<()> {
    log::info!("Saving {} cluster assignments", assignments.len());

    let mut df = df!(
        "id" => assignments.iter().map(|a| a.id).collect::<Vec<u32>>(),
        "x" => assignments.iter().map(|a| a.x).collect::<Vec<f64>>(),
        "y" => assignments.iter().map(|a| a.y).collect::<Vec<f64>>(),
        "label" => assignments.iter().map(|a| a.label.0).collect::<Vec<u32>>(),
        "cluster" => assignments.iter().map(|a| a.cluster_id).collect::<Vec<u32>>(),
    )?;

    let path = Path::new(output_dir).join("clusters.csv");
    let mut file = File::create(path)?;
    CsvWriter::new(&mut file).include_header(true).finish(&mut df)?;

    Ok(())
}

/// Save run parameters and headline statistics
fn save_summary(output: &AnalysisOutput, config: &AnalysisConfig, output_dir: &str) -> Result<()> {
    log::info!("Saving summary information");

    let path = Path::new(output_dir).join("summary.json");
    let mut file = File::create(path)?;

    let significant: Vec<_> = output
        .comparison
        .significant(0.05)
        .map(|c| {
            json!({
                "community": c.community_id,
                "label": c.label,
                "observed_ratio": c.observed_ratio,
                "p_two_sided": c.test.p_two_sided,
            })
        })
        .collect();

    let summary = json!({
        "config": config,
        "observation_count": output.assignments.len(),
        "communities": output.communities,
        "labels": output.labels,
        "observations_per_community": output.ratios.community_totals,
        "reference_ratios": output.ratios.reference,
        "degenerate_cells": output.comparison.cells.iter().filter(|c| c.degenerate).count(),
        "significant_cells": significant,
    });

    file.write_all(to_string_pretty(&summary)?.as_bytes())?;

    Ok(())
}

fn save_json<T: Serialize + ?Sized>(value: &T, output_dir: &str, name: &str) -> Result<()> {
    log::debug!("Writing {}", name);

    let path = Path::new(output_dir).join(name);
    let mut file = File::create(path)?;
    file.write_all(to_string_pretty(value)?.as_bytes())?;

    Ok(())
}
