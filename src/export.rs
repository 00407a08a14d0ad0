//! Report download to disk.

use crate::backend::Backend;
use crate::model::{ReportFormat, WorkflowId};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// `workscan-report-<id>.<ext>` in the current directory.
pub fn default_report_path(id: &WorkflowId, format: ReportFormat) -> PathBuf {
    PathBuf::from(format!("workscan-report-{id}.{}", format.extension()))
}

/// Download the report for `id` and write it to `output`, or the default path when `None`.
/// Returns the path written and the number of bytes.
pub async fn export_report(
    backend: &dyn Backend,
    id: &WorkflowId,
    format: ReportFormat,
    output: Option<&Path>,
) -> Result<(PathBuf, usize)> {
    let bytes = backend
        .export_report(id, format)
        .await
        .with_context(|| format!("download {} report for {id}", format.extension()))?;
    let path = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| default_report_path(id, format));
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("create {}", parent.display()))?;
    }
    tokio::fs::write(&path, &bytes)
        .await
        .with_context(|| format!("write {}", path.display()))?;
    tracing::info!(bytes = bytes.len(), "report written to {}", path.display());
    Ok((path, bytes.len()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_name_uses_id_and_extension() {
        assert_eq!(
            default_report_path(&WorkflowId::Int(42), ReportFormat::Pdf),
            PathBuf::from("workscan-report-42.pdf")
        );
        assert_eq!(
            default_report_path(&WorkflowId::Str("abc".into()), ReportFormat::Docx),
            PathBuf::from("workscan-report-abc.docx")
        );
    }
}
