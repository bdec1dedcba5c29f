//! Output folder resolution.

use courtbatch_core::{OutputLayout, RunConfig};
use courtbatch_opendal::{Location, REMOTE_SCHEME};
use jiff::Timestamp;
use jiff::tz::TimeZone;

use crate::Result;

/// Returns the current UTC date as `YYYY-MM-DD`.
pub fn date_tag() -> String {
    Timestamp::now().to_zoned(TimeZone::UTC).date().to_string()
}

/// Returns the folder a run writes to.
///
/// An explicit output folder wins. Otherwise the folder is
/// `results/<dataset>/<tag>`, under the input's bucket when the input is
/// remote and under the data directory when it is local. `default_tag` is
/// used when the configuration has no tag.
pub fn resolve_output_folder(config: &RunConfig, default_tag: &str) -> Result<String> {
    if let Some(folder) = &config.output_folder {
        return Ok(folder.trim_end_matches('/').to_owned());
    }

    let base = match Location::parse(&config.input)? {
        Location::Remote { bucket, .. } => format!("{REMOTE_SCHEME}{bucket}"),
        Location::Local { .. } => String::new(),
    };
    let tag = config.tag.as_deref().unwrap_or(default_tag);

    Ok(OutputLayout::default_folder(
        &base,
        config.dataset_name(),
        tag,
    ))
}

#[cfg(test)]
mod tests {
    use courtbatch_core::Flavor;

    use super::*;

    #[test]
    fn remote_input_defaults_under_its_bucket() {
        let config = RunConfig::new(Flavor::CourtSummary, "s3://courts/inputs/arrests.json");
        assert_eq!(
            resolve_output_folder(&config, "2024-05-01").unwrap(),
            "s3://courts/results/arrests/2024-05-01"
        );
    }

    #[test]
    fn local_input_defaults_under_data_dir() {
        let mut config = RunConfig::new(Flavor::CourtSummary, "inputs/arrests.json");
        config.tag = Some("rerun".to_owned());
        assert_eq!(
            resolve_output_folder(&config, "2024-05-01").unwrap(),
            "results/arrests/rerun"
        );
    }

    #[test]
    fn explicit_folder_wins() {
        let config = RunConfig::new(Flavor::CourtSummary, "s3://courts/inputs/arrests.json")
            .with_output_folder("s3://courts/custom/");
        assert_eq!(
            resolve_output_folder(&config, "2024-05-01").unwrap(),
            "s3://courts/custom"
        );
    }

    #[test]
    fn date_tag_is_iso_date() {
        let tag = date_tag();
        assert_eq!(tag.len(), 10);
        assert_eq!(tag.as_bytes()[4], b'-');
        assert_eq!(tag.as_bytes()[7], b'-');
    }
}
