//! Output format negotiation.
//!
//! A coverage declares the format names it can be delivered in. Clients
//! rarely spell them the same way: "image/tiff", "GeoTIFF" and "geotiff"
//! all mean the same encoder. The [`FormatNegotiator`] maps whatever the
//! client asked for onto one of the declared names.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;
use wcs_common::{CoverageDescriptor, WcsError};

use crate::error::Result;

/// An output encoder known to the service.
///
/// Encoding itself happens downstream; here an encoder only answers which
/// names it goes by.
pub trait CoverageEncoder: Send + Sync {
    /// Canonical format name, e.g. "GeoTIFF".
    fn name(&self) -> &str;

    /// MIME type of the encoded output.
    fn mime_type(&self) -> &str;

    /// Other names clients use for this format.
    fn aliases(&self) -> &[&'static str];

    /// Check whether a requested format name refers to this encoder.
    fn can_produce(&self, requested: &str) -> bool {
        let requested = requested.trim();
        self.name().eq_ignore_ascii_case(requested)
            || self.mime_type().eq_ignore_ascii_case(requested)
            || self
                .aliases()
                .iter()
                .any(|alias| alias.eq_ignore_ascii_case(requested))
    }
}

/// Encoder described by fixed names.
#[derive(Debug, Clone)]
pub struct StaticEncoder {
    name: &'static str,
    mime_type: &'static str,
    aliases: &'static [&'static str],
}

impl StaticEncoder {
    pub const fn new(
        name: &'static str,
        mime_type: &'static str,
        aliases: &'static [&'static str],
    ) -> Self {
        Self {
            name,
            mime_type,
            aliases,
        }
    }
}

impl CoverageEncoder for StaticEncoder {
    fn name(&self) -> &str {
        self.name
    }

    fn mime_type(&self) -> &str {
        self.mime_type
    }

    fn aliases(&self) -> &[&'static str] {
        self.aliases
    }
}

const DEFAULT_ENCODERS: [StaticEncoder; 6] = [
    StaticEncoder::new(
        "GeoTIFF",
        "image/tiff",
        &["image/geotiff", "geotiff", "tiff", "image/tiff;subtype=\"geotiff\""],
    ),
    StaticEncoder::new("ArcGrid", "text/plain", &["application/arcgrid", "arcgrid", "asc"]),
    StaticEncoder::new("PNG", "image/png", &["png"]),
    StaticEncoder::new("JPEG", "image/jpeg", &["jpeg", "jpg"]),
    StaticEncoder::new("GIF", "image/gif", &["gif"]),
    StaticEncoder::new("NetCDF", "application/x-netcdf", &["netcdf", "nc"]),
];

/// Lookup table of encoders, immutable once shared.
pub struct EncoderRegistry {
    encoders: Vec<Arc<dyn CoverageEncoder>>,
}

impl EncoderRegistry {
    /// A registry with no encoders.
    pub fn empty() -> Self {
        Self {
            encoders: Vec::new(),
        }
    }

    /// Add an encoder. Earlier registrations win on lookups.
    pub fn register(&mut self, encoder: Arc<dyn CoverageEncoder>) {
        self.encoders.push(encoder);
    }

    /// Find the encoder producing `format` (name, MIME type or alias).
    pub fn find(&self, format: &str) -> Option<Arc<dyn CoverageEncoder>> {
        self.encoders.iter().find(|e| e.can_produce(format)).cloned()
    }

    pub fn len(&self) -> usize {
        self.encoders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.encoders.is_empty()
    }
}

impl Default for EncoderRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        for encoder in DEFAULT_ENCODERS {
            registry.register(Arc::new(encoder));
        }
        registry
    }
}

impl std::fmt::Debug for EncoderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.encoders.iter().map(|e| e.name()))
            .finish()
    }
}

/// Result of format negotiation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedFormat {
    /// The coverage's declared format name that matched.
    pub declared: String,
    /// Canonical name of the encoder, when one is registered.
    pub encoder: Option<String>,
    pub mime_type: Option<String>,
}

/// Resolves a requested output format against declared formats.
#[derive(Debug, Clone)]
pub struct FormatNegotiator {
    registry: Arc<EncoderRegistry>,
}

impl Default for FormatNegotiator {
    fn default() -> Self {
        Self::new(Arc::new(EncoderRegistry::default()))
    }
}

impl FormatNegotiator {
    pub fn new(registry: Arc<EncoderRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &EncoderRegistry {
        &self.registry
    }

    /// Resolve `requested` against a coverage's declared and native formats.
    pub fn resolve(
        &self,
        descriptor: &CoverageDescriptor,
        requested: &str,
    ) -> Result<ResolvedFormat> {
        self.resolve_among(&descriptor.format_candidates(), requested)
    }

    /// Resolve `requested` against an explicit candidate list.
    ///
    /// An exact (case-insensitive) name match wins; otherwise the first
    /// candidate whose encoder can produce the requested name.
    pub fn resolve_among(&self, candidates: &[&str], requested: &str) -> Result<ResolvedFormat> {
        let requested = requested.trim();
        if requested.is_empty() {
            return Err(WcsError::invalid("format", "an output format is required"));
        }

        if let Some(declared) = candidates
            .iter()
            .find(|c| c.eq_ignore_ascii_case(requested))
        {
            return Ok(self.resolved(declared, self.registry.find(declared)));
        }

        for declared in candidates {
            if let Some(encoder) = self.registry.find(declared) {
                if encoder.can_produce(requested) {
                    debug!(
                        requested = %requested,
                        declared = %declared,
                        "Format matched through encoder alias"
                    );
                    return Ok(self.resolved(declared, Some(encoder)));
                }
            }
        }

        Err(WcsError::invalid(
            "format",
            format!(
                "format '{}' is not supported, expected one of: {}",
                requested,
                candidates.join(", ")
            ),
        ))
    }

    fn resolved(
        &self,
        declared: &str,
        encoder: Option<Arc<dyn CoverageEncoder>>,
    ) -> ResolvedFormat {
        ResolvedFormat {
            declared: declared.to_string(),
            encoder: encoder.as_ref().map(|e| e.name().to_string()),
            mime_type: encoder.as_ref().map(|e| e.mime_type().to_string()),
        }
    }
}
