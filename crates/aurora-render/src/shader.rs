//! Shader module loading with keyword-driven variants.
//!
//! Keywords in [`ShaderGlobals`](crate::globals::ShaderGlobals) act as
//! compile switches: [`preprocess_source`] strips `#ifdef`-guarded WGSL
//! blocks against the enabled set before the module reaches the device, and
//! [`ShaderLibrary`] caches each compiled variant under a qualified name.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use log::{debug, info};
use thiserror::Error;
use wgpu::{ShaderModuleDescriptor, ShaderSource};

use crate::globals::ShaderGlobals;

/// Error types for shader loading operations.
#[derive(Debug, Error)]
pub enum ShaderError {
    #[error("unbalanced preprocessor directive at line {line}")]
    UnbalancedDirective { line: usize },

    #[error("shader '{name}' not found in library")]
    NotLoaded { name: String },
}

/// Strip `#ifdef`/`#ifndef`/`#else`/`#endif` blocks against an enabled set.
///
/// Directives must start the line (leading whitespace allowed) and nest
/// arbitrarily. Directive lines themselves never reach the output.
pub fn preprocess_source(
    source: &str,
    enabled: &BTreeSet<String>,
) -> Result<String, ShaderError> {
    let mut output = String::with_capacity(source.len());
    // One entry per open directive: (branch active, #else already seen).
    let mut stack: Vec<(bool, bool)> = Vec::new();

    for (number, line) in source.lines().enumerate() {
        let trimmed = line.trim_start();
        if let Some(name) = trimmed.strip_prefix("#ifdef ") {
            stack.push((enabled.contains(name.trim()), false));
        } else if let Some(name) = trimmed.strip_prefix("#ifndef ") {
            stack.push((!enabled.contains(name.trim()), false));
        } else if trimmed == "#else" {
            match stack.last_mut() {
                Some((active, seen_else)) if !*seen_else => {
                    *active = !*active;
                    *seen_else = true;
                }
                _ => return Err(ShaderError::UnbalancedDirective { line: number + 1 }),
            }
        } else if trimmed == "#endif" {
            if stack.pop().is_none() {
                return Err(ShaderError::UnbalancedDirective { line: number + 1 });
            }
        } else if stack.iter().all(|(active, _)| *active) {
            output.push_str(line);
            output.push('\n');
        }
    }

    if !stack.is_empty() {
        return Err(ShaderError::UnbalancedDirective {
            line: source.lines().count(),
        });
    }
    Ok(output)
}

fn variant_name(name: &str, keywords: &BTreeSet<String>) -> String {
    if keywords.is_empty() {
        name.to_string()
    } else {
        let mut qualified = String::from(name);
        for keyword in keywords {
            qualified.push('+');
            qualified.push_str(keyword);
        }
        qualified
    }
}

/// Central registry for compiled shader modules.
#[derive(Default)]
pub struct ShaderLibrary {
    modules: HashMap<String, Arc<wgpu::ShaderModule>>,
}

impl ShaderLibrary {
    /// Create a new empty shader library.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a shader from a WGSL source string.
    pub fn load_from_source(
        &mut self,
        device: &wgpu::Device,
        name: &str,
        source: &str,
    ) -> Result<Arc<wgpu::ShaderModule>, ShaderError> {
        debug!("Loading shader '{}' from source", name);

        let module = device.create_shader_module(ShaderModuleDescriptor {
            label: Some(name),
            source: ShaderSource::Wgsl(source.into()),
        });

        let arc_module = Arc::new(module);
        let replaced = self
            .modules
            .insert(name.to_string(), arc_module.clone())
            .is_some();

        if replaced {
            info!("Replaced shader '{}'", name);
        } else {
            info!("Loaded shader '{}'", name);
        }

        Ok(arc_module)
    }

    /// Compile the variant of `source` selected by the currently enabled
    /// keywords, caching it under a keyword-qualified name.
    pub fn load_variant(
        &mut self,
        device: &wgpu::Device,
        name: &str,
        source: &str,
        globals: &ShaderGlobals,
    ) -> Result<Arc<wgpu::ShaderModule>, ShaderError> {
        let keywords = globals.enabled_keywords();
        let qualified = variant_name(name, keywords);
        if let Some(module) = self.modules.get(&qualified) {
            return Ok(module.clone());
        }
        let processed = preprocess_source(source, keywords)?;
        self.load_from_source(device, &qualified, &processed)
    }

    /// Get a previously loaded shader by (variant-qualified) name.
    pub fn get(&self, name: &str) -> Result<Arc<wgpu::ShaderModule>, ShaderError> {
        self.modules
            .get(name)
            .cloned()
            .ok_or_else(|| ShaderError::NotLoaded {
                name: name.to_string(),
            })
    }
}
