//! CLI Command Implementations
//!
//! Implements the actual logic for each CLI command.

use std::path::Path;

use log::info;

use crate::catalog::initialize;
use crate::config::ExtensionConfig;
use crate::error::Result;
use crate::file::{NwbIo, SoundSeries};
use crate::mock::mock_nwb_file;
use crate::model::TransducerLink;
use crate::spec::generate as generate_spec;

/// Regenerate the schema files into the repository spec directory.
pub fn generate(config: &ExtensionConfig) -> Result<()> {
    let output_dir = config.output_dir();
    info!("Generating {} into {}", config.namespace.name, output_dir.display());

    let exported = generate_spec(config.namespace.clone(), output_dir)?;

    println!("Namespace: {}", exported.namespace_path.display());
    println!("Extensions: {}", exported.extensions_path.display());
    Ok(())
}

/// Locate and load the namespace, then list every bound type.
pub fn inspect(config: &ExtensionConfig) -> Result<()> {
    let (catalog, types) = initialize(config)?;

    for name in catalog.namespace_names() {
        if let Some(loaded) = catalog.namespace(name) {
            println!("Namespace: {} {}", loaded.entry.name, loaded.entry.version);
            if let Some(path) = &loaded.path {
                println!("  Loaded from: {}", path.display());
            }
        }
    }

    println!("Types:");
    for descriptor in types.iter() {
        println!(
            "  {} ({}) extends {}",
            descriptor.name,
            descriptor.namespace,
            descriptor.parent.as_deref().unwrap_or("-")
        );
    }
    if let Some(unit) = types.default_unit() {
        println!("Default waveform unit: {}", unit);
    }
    Ok(())
}

/// Write the mock file to `output`.
pub fn mock(output: &Path) -> Result<()> {
    info!("Writing mock file: {}", output.display());

    let file = mock_nwb_file()?;
    NwbIo::default().write(output, &file)?;

    println!("Mock file written: {}", output.display());
    Ok(())
}

fn describe_link(series: &SoundSeries) -> String {
    match series.transducer() {
        Some((TransducerLink::Device(name), _)) => format!(" -> device {}", name),
        Some((TransducerLink::Region(region), _)) => format!(
            " -> {} rows {:?} of {}",
            region.name(),
            region.indices(),
            region.table_name()
        ),
        None => String::new(),
    }
}

/// Print a summary of a file's records.
pub fn show(path: &Path) -> Result<()> {
    info!("Reading: {}", path.display());

    let (file, catalog) = NwbIo::default().read_with_namespaces(path)?;

    println!("File: {}", path.display());
    println!("Identifier: {}", file.identifier());
    println!("Session: {}", file.session_description());
    println!("Started: {}", file.session_start_time());
    println!("Namespaces: {}", catalog.namespace_names().join(", "));

    println!("Devices:");
    for device in file.devices() {
        println!("  {} ({})", device.name(), device.kind().type_name());
    }

    if let Some(meta) = file.lab_meta_data() {
        println!("Lab metadata: {}", meta.name());
        if let Some(table) = meta.microphone_table() {
            println!("  {}: {} rows", table.name(), table.len());
        }
        if let Some(table) = meta.speaker_table() {
            println!("  {}: {} rows", table.name(), table.len());
        }
    }

    println!("Series:");
    for (container, series) in file.all_series() {
        let waveform = series.waveform();
        println!(
            "  {}/{} [{}] {:?} {} @ {} Hz, {:.3} s, unit {}{}",
            container,
            series.name(),
            series.neurodata_type(),
            waveform.data().dims(),
            waveform.data().dtype(),
            waveform.rate(),
            waveform.duration(),
            waveform.unit(),
            describe_link(series)
        );
    }
    Ok(())
}
