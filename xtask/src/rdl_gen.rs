// Licensed under the Apache-2.0 license

//! Generate register offset artifacts from an elaborated address map.

use anyhow::{Context, Result};
use log::info;
use mcu_registers_offsets::{emit, AddrTree, Dialect, FilterConfig, Flattener, NameConfig};
use std::fs;
use std::path::{Path, PathBuf};

pub(crate) struct GenerateArgs {
    pub input: PathBuf,
    pub dialects: Vec<Dialect>,
    pub output_dir: PathBuf,
    pub alignment: Option<u64>,
    pub strip_suffixes: Vec<String>,
    pub strip_prefixes: Vec<String>,
    pub qualify_array_members: bool,
    pub exclude_names: Vec<String>,
}

pub(crate) fn parse_dialect(s: &str) -> Result<Dialect, String> {
    s.parse().map_err(|e| format!("{e}"))
}

/// Flatten the tree once and write one artifact per requested dialect.
///
/// Every artifact is rendered before the first one is written.
pub(crate) fn generate(args: &GenerateArgs) -> Result<Vec<PathBuf>> {
    info!("Generating register offsets from: {}", args.input.display());

    let mut tree = AddrTree::from_file(&args.input)
        .with_context(|| format!("Failed to load {}", args.input.display()))?;
    if let Some(alignment) = args.alignment {
        tree.set_alignment(alignment);
    }
    info!("Addrmap: {}, alignment: {}", tree.name(), tree.alignment());

    let mut name_config = NameConfig::none().qualify_array_members(args.qualify_array_members);
    for suffix in &args.strip_suffixes {
        name_config = name_config.add_suffix(suffix);
    }
    for prefix in &args.strip_prefixes {
        name_config = name_config.add_prefix(prefix);
    }

    let mut filter_config = FilterConfig::new();
    for name in &args.exclude_names {
        filter_config = filter_config.exclude_name(name);
    }

    let map = Flattener::new(&tree, &filter_config)?.run()?;

    let dialects = if args.dialects.is_empty() {
        Dialect::ALL.to_vec()
    } else {
        args.dialects.clone()
    };
    let name = name_config.transform(&map.name);

    let mut artifacts = vec![];
    for dialect in dialects {
        let code = emit(&map, dialect, &name_config)
            .with_context(|| format!("Failed to render {dialect}"))?;
        artifacts.push((args.output_dir.join(dialect.file_name(&name)), code));
    }

    let mut written = vec![];
    for (path, code) in artifacts {
        write_artifact(&path, &code)?;
        info!("Output written to: {}", path.display());
        written.push(path);
    }
    Ok(written)
}

fn write_artifact(path: &Path, code: &str) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;
    }
    fs::write(path, code).with_context(|| format!("Failed to write {}", path.display()))
}
