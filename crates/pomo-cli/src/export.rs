//! Markdown export with a generation-metadata footer.

use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};

use crate::essay::Essay;

/// Current date as YYYY-MM-DD straight off the Unix clock (no external
/// chrono dep -- simple calendar math is enough for a footer).
pub fn today_string() -> String {
    let days = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| (d.as_secs() / 86_400) as i64)
        .unwrap_or(0);
    let (year, month, day) = civil_from_days(days);
    format!("{year:04}-{month:02}-{day:02}")
}

/// Days since the Unix epoch to a civil (year, month, day).
fn civil_from_days(days: i64) -> (i64, u32, u32) {
    let z = days + 719_468;
    let era = if z >= 0 { z } else { z - 146_096 } / 146_097;
    let doe = z - era * 146_097;
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let mut year = yoe + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let month = if mp < 10 { mp + 3 } else { mp - 9 } as u32;
    if month <= 2 {
        year += 1;
    }
    (year, month, day)
}

/// Write the essay to a Markdown file, appending a metadata footer so a
/// reader can reproduce the exact run.
pub fn write_markdown(essay: &Essay, path: &Path, generated_at: &str) -> Result<()> {
    let mut out = essay.markdown.clone();
    out.push_str("\n---\n\n");
    out.push_str(&format!(
        "*Generated with seed {} under the theme \"{}\" on {}.*\n",
        essay.seed, essay.theme, generated_at
    ));

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
    }
    std::fs::write(path, out).with_context(|| format!("failed to write {}", path.display()))
}
