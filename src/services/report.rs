//! Result file assembly
//!
//! Output mirrors the template layout: every category header in template
//! order, followed by one `name,url` line per kept URL.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::path::Path;

use tracing::info;

use crate::errors::{AppError, AppResult};
use crate::sources::template::{ChannelTemplate, GENRE_MARKER};
use crate::utils::{ChannelKey, normalize};

/// Ranked URLs per channel key
pub type RankedChannels = HashMap<ChannelKey, Vec<String>>;

/// Render the report text.
///
/// Channels without ranked URLs are left out; category headers are always
/// written.
pub fn assemble(template: &ChannelTemplate, ranked: &RankedChannels) -> String {
    let mut output = String::new();

    for category in template.categories() {
        let _ = writeln!(output, "{},{GENRE_MARKER}", category.name);
        for channel in &category.channels {
            let Some(urls) = ranked.get(&normalize(&channel.name)) else {
                continue;
            };
            for url in urls {
                let _ = writeln!(output, "{},{url}", channel.name);
            }
        }
    }

    output
}

/// Overwrite `path` with the report.
pub async fn write_report(path: &Path, report: &str) -> AppResult<()> {
    tokio::fs::write(path, report)
        .await
        .map_err(|source| AppError::ReportWrite {
            path: path.to_path_buf(),
            source,
        })?;
    info!(
        "Wrote {} lines to {}",
        report.lines().count(),
        path.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template() -> ChannelTemplate {
        ChannelTemplate::parse([
            "央视频道,#genre#",
            "CCTV-1",
            "CCTV-5",
            "卫视频道,#genre#",
            "湖南卫视",
            "Empty,#genre#",
        ])
        .unwrap()
    }

    #[test]
    fn test_assemble_follows_template_order() {
        let mut ranked = RankedChannels::new();
        ranked.insert(normalize("CCTV-5"), vec!["http://fast".into(), "http://slow".into()]);
        ranked.insert(normalize("湖南卫视"), vec!["http://hn".into()]);
        ranked.insert(normalize("CCTV-1"), Vec::new());

        let report = assemble(&template(), &ranked);
        assert_eq!(
            report,
            "央视频道,#genre#\n\
             CCTV-5,http://fast\n\
             CCTV-5,http://slow\n\
             卫视频道,#genre#\n\
             湖南卫视,http://hn\n\
             Empty,#genre#\n"
        );
    }

    #[test]
    fn test_assemble_without_results_keeps_headers() {
        let report = assemble(&template(), &RankedChannels::new());
        assert_eq!(report, "央视频道,#genre#\n卫视频道,#genre#\nEmpty,#genre#\n");
    }

    #[test]
    fn test_lookup_uses_normalized_template_name() {
        let template = ChannelTemplate::parse(["央视,#genre#", "CCTV5"]).unwrap();
        let mut ranked = RankedChannels::new();
        ranked.insert(normalize("CCTV 5"), vec!["http://x".into()]);
        assert_eq!(assemble(&template, &ranked), "央视,#genre#\nCCTV5,http://x\n");
    }

    #[tokio::test]
    async fn test_write_report_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("result.txt");
        write_report(&path, "old contents that are longer\n").await.unwrap();
        write_report(&path, "A,#genre#\n").await.unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "A,#genre#\n");
    }
}
