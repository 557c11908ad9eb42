// Curve Export - Writes the baked animation curves as a JSON document
// Consumed by a host-side importer that recreates the keyframes on real scene objects

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::motion::{AnimationHost, SceneHost};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// One curve: keyframes as `[frame, value]` pairs sorted by frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportedCurve {
    pub object: String,

    /// Canonical data path, e.g. `rotation_euler[0]`
    pub data_path: String,

    pub keyframes: Vec<[f64; 2]>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurveExport {
    pub frame_rate: f64,
    pub curves: Vec<ExportedCurve>,
}

impl CurveExport {
    pub fn keyframe_count(&self) -> usize {
        self.curves.iter().map(|c| c.keyframes.len()).sum()
    }
}

/// Snapshot every curve in the host, ordered by object then data path
pub fn export_curves(host: &SceneHost) -> CurveExport {
    let curves = host
        .curves()
        .map(|curve| ExportedCurve {
            object: curve.object.clone(),
            data_path: curve.property.to_string(),
            keyframes: curve.keyframes.iter().map(|&(f, v)| [f, v]).collect(),
        })
        .collect();

    CurveExport {
        frame_rate: host.frame_rate(),
        curves,
    }
}

/// Write the export as pretty-printed JSON
pub fn write_curves(export: &CurveExport, path: &Path) -> Result<(), ExportError> {
    let json = serde_json::to_string_pretty(export)?;
    std::fs::write(path, json)?;

    log::info!(
        "Wrote {} curves ({} keyframes) to {}",
        export.curves.len(),
        export.keyframe_count(),
        path.display()
    );
    Ok(())
}
