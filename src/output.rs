use std::io::{self, Write};

use serde::Serialize;

use crate::domain::{Asset, Holder};
use crate::grouping::{EditionGroup, TierGroup};
use crate::pipeline::{ProgressEvent, ProgressSink};

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_assets(assets: &[Asset]) -> io::Result<()> {
        Self::print_json(&assets)
    }

    pub fn print_holders(holders: &[Holder]) -> io::Result<()> {
        Self::print_json(&holders)
    }

    pub fn print_tier_groups(groups: &[TierGroup]) -> io::Result<()> {
        Self::print_json(&groups)
    }

    pub fn print_edition_groups(groups: &[EditionGroup]) -> io::Result<()> {
        Self::print_json(&groups)
    }

    fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}

impl ProgressSink for JsonOutput {
    fn event(&self, _event: ProgressEvent) {}
}

/// Human-readable progress lines on stderr, leaving stdout to the JSON
/// payload.
pub struct StderrProgress;

impl ProgressSink for StderrProgress {
    fn event(&self, event: ProgressEvent) {
        eprintln!("[{:>3}%] {}", event.percent, event.message);
    }
}
