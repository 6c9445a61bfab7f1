// Licensed under the Apache-2.0 license

//! Configuration for name transformations and register filtering.
//!
//! [`NameConfig`] controls how the root display name is turned into the
//! namespace / package / file name of an artifact, and whether the flat
//! hardware-description dialects qualify array members with the array name.
//!
//! [`FilterConfig`] controls which register names are never emitted. The
//! reserved sentinel [`RESERVED_NAME`] is excluded by default.

/// Register name marking reserved address space ("reserved for future use").
pub const RESERVED_NAME: &str = "RFU";

/// Configuration for name transformations during emission.
///
/// # Example
///
/// ```
/// use mcu_registers_offsets::config::NameConfig;
///
/// let config = NameConfig::none();
/// assert_eq!(config.transform("dma_csr"), "dma_csr");
///
/// let config = NameConfig::none()
///     .add_suffix("_csr")
///     .add_prefix("soc_");
/// assert_eq!(config.transform("soc_dma_CSR"), "dma");
/// ```
#[derive(Clone, Debug, Default)]
pub struct NameConfig {
    /// Suffixes to strip from the display name (case-insensitive, checked in order).
    pub strip_suffixes: Vec<String>,

    /// Prefixes to strip from the display name (case-insensitive, checked in order).
    pub strip_prefixes: Vec<String>,

    /// Prefix array member constants with the array path in dialects that
    /// place every constant in one flat scope (SystemVerilog, VHDL).
    ///
    /// For example, register `DATA` in array `CH`:
    /// - `false` (default): `DATA`
    /// - `true`: `CH_DATA`
    pub qualify_array_members: bool,
}

impl NameConfig {
    /// Create a NameConfig that performs no transformations.
    pub fn none() -> Self {
        Self::default()
    }

    /// Add a suffix to strip (case-insensitive).
    pub fn add_suffix(mut self, suffix: &str) -> Self {
        self.strip_suffixes.push(suffix.to_string());
        self
    }

    /// Add a prefix to strip (case-insensitive).
    pub fn add_prefix(mut self, prefix: &str) -> Self {
        self.strip_prefixes.push(prefix.to_string());
        self
    }

    /// Set whether flat dialects qualify array members with the array path.
    pub fn qualify_array_members(mut self, qualify: bool) -> Self {
        self.qualify_array_members = qualify;
        self
    }

    /// Apply name transformations to the given display name.
    ///
    /// Strips matching prefixes first, then suffixes.
    /// Matching is case-insensitive but preserves the case of the remaining characters.
    pub fn transform(&self, name: &str) -> String {
        let mut result = name.to_string();

        for prefix in &self.strip_prefixes {
            if result.len() > prefix.len()
                && result.to_lowercase().starts_with(&prefix.to_lowercase())
            {
                if let Some(rest) = result.get(prefix.len()..) {
                    result = rest.to_string();
                }
            }
        }

        // Strip suffixes repeatedly until none match
        loop {
            let lower_result = result.to_lowercase();
            let matched = self.strip_suffixes.iter().find(|suffix| {
                lower_result.ends_with(&suffix.to_lowercase()) && result.len() > suffix.len()
            });
            match matched.and_then(|suffix| result.get(..result.len() - suffix.len())) {
                Some(rest) => result = rest.to_string(),
                None => break,
            }
        }

        result
    }

    /// Name of a register constant declared inside the array at `path`.
    pub fn member_name(&self, path: &[&str], name: &str) -> String {
        if self.qualify_array_members && !path.is_empty() {
            format!("{}_{}", path.join("_"), name)
        } else {
            name.to_string()
        }
    }
}

/// Configuration for filtering which registers are emitted.
///
/// Excluded registers still occupy address space: the flattener marks them
/// as visited, it just never names them.
///
/// # Example
///
/// ```
/// use mcu_registers_offsets::config::FilterConfig;
///
/// let config = FilterConfig::new().exclude_name("SPARE");
/// assert!(config.is_excluded("RFU"));
/// assert!(config.is_excluded("SPARE"));
/// assert!(!config.is_excluded("rfu"));
/// ```
#[derive(Clone, Debug)]
pub struct FilterConfig {
    /// Register names that are never emitted (exact match).
    pub exclude_names: Vec<String>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl FilterConfig {
    /// Create a FilterConfig that excludes only the reserved sentinel.
    pub fn new() -> Self {
        Self {
            exclude_names: vec![RESERVED_NAME.to_string()],
        }
    }

    /// Create a FilterConfig that emits every register, reserved ones included.
    pub fn none() -> Self {
        Self {
            exclude_names: vec![],
        }
    }

    /// Exclude registers with this exact name.
    pub fn exclude_name(mut self, name: &str) -> Self {
        self.exclude_names.push(name.to_string());
        self
    }

    /// Returns true if a register with this name must not be emitted.
    pub fn is_excluded(&self, name: &str) -> bool {
        self.exclude_names.iter().any(|n| n == name)
    }
}
