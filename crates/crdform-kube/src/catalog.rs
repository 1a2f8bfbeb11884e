//! CRDs embedded in the binary

use crdform_core::{CrdParser, CrdSchema};

use crate::error::Result;

/// Embedded CRD manifests, keyed by CRD name
pub const BUILTIN_CRDS: &[(&str, &str)] = &[
    (
        "certificates.cert-manager.io",
        include_str!("../crds/certificates.cert-manager.io.yaml"),
    ),
    (
        "clusterissuers.cert-manager.io",
        include_str!("../crds/clusterissuers.cert-manager.io.yaml"),
    ),
    (
        "servicemonitors.monitoring.coreos.com",
        include_str!("../crds/servicemonitors.monitoring.coreos.com.yaml"),
    ),
    (
        "applications.argoproj.io",
        include_str!("../crds/applications.argoproj.io.yaml"),
    ),
];

/// Parse every embedded CRD
pub fn builtin_crds() -> Result<Vec<CrdSchema>> {
    BUILTIN_CRDS
        .iter()
        .map(|(_, yaml)| Ok(CrdParser::parse(yaml)?))
        .collect()
}
