use crate::config::Config;
use crate::orchestrator::SimulationInput;
use crate::topology_parser::{parse_topology, parse_topology_file};
use color_eyre::eyre::{Context, Result};
use log::info;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Load and parse configuration from a YAML file
pub fn load_config(config_path: &Path) -> Result<Config> {
    info!("Loading configuration from: {:?}", config_path);

    let file = File::open(config_path)
        .wrap_err_with(|| format!("Failed to open configuration file '{}'", config_path.display()))?;

    let config: Config = serde_yaml::from_reader(file)
        .wrap_err_with(|| format!("Failed to parse configuration file '{}'", config_path.display()))?;

    config.validate()?;

    info!(
        "Configuration has {} bridges, {} segments, {} transfers",
        config.bridges.len(),
        config.segments.len(),
        config.transfers.len()
    );
    Ok(config)
}

/// Load a text-format topology from a file, or from `reader` when no path is given
pub fn load_text_input<R: Read>(path: Option<&Path>, mut reader: R) -> Result<SimulationInput> {
    match path {
        Some(path) => {
            info!("Loading topology from: {:?}", path);
            parse_topology_file(path)
        }
        None => {
            info!("Reading topology from standard input");
            let mut content = String::new();
            reader
                .read_to_string(&mut content)
                .wrap_err("Failed to read topology from standard input")?;
            Ok(parse_topology(&content)?)
        }
    }
}
