//! CSV report sink - one file per (handle, window) pair

use super::ReportRow;
use crate::windows::AnalysisWindow;
use std::path::{Path, PathBuf};

pub fn report_filename(handle: &str, window: AnalysisWindow) -> String {
    format!("{}_crypto_performance_{}days.csv", handle, window.days())
}

/// Write assembled rows to `<output_dir>/<handle>_crypto_performance_<N>days.csv`.
///
/// Called only after assembly produced at least one row, so a fatal
/// pipeline error never leaves a partial artifact behind.
pub fn write_report(
    output_dir: &Path,
    handle: &str,
    window: AnalysisWindow,
    rows: &[ReportRow],
) -> Result<PathBuf, csv::Error> {
    let path = output_dir.join(report_filename(handle, window));
    let mut writer = csv::Writer::from_path(&path)?;

    let labels = window.kind().forward_labels();
    writer.write_record([
        "Influencer",
        "Token",
        "CA",
        "Post Time",
        "Price @Post",
        labels[0],
        labels[1],
        labels[2],
        "% Change",
    ])?;

    for row in rows {
        writer.write_record([
            row.influencer.clone(),
            row.token.clone(),
            row.contract_address.clone(),
            row.post_time.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            row.price_at_post.to_string(),
            row.forward_prices[0].to_string(),
            row.forward_prices[1].to_string(),
            row.forward_prices[2].to_string(),
            row.percent_change.to_string(),
        ])?;
    }

    writer.flush()?;
    log::info!("📝 Report written: {}", path.display());
    Ok(path)
}
