//! HTTP Archive (HAR) input
//!
//! HAR files are recognised by the detector so callers get a clear error
//! instead of a misdetection, but conversion is not implemented.

use crate::importer::{FormatParser, ImportResult, ParserId};
use apiport_common::{ApiportError, Result};

/// Registry entry for HAR files
pub struct HarFormat;

impl FormatParser for HarFormat {
    fn id(&self) -> ParserId {
        ParserId::Har
    }

    fn parse(&self, _text: &str) -> Result<ImportResult> {
        Err(ApiportError::UnsupportedFeature(
            "HAR import is not yet supported".to_string(),
        ))
    }
}
