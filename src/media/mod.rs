/// Hero image handling
///
/// This module handles:
/// - Downscaling selected images and embedding them as data URIs
/// - Deriving the preview shown under the image field

pub mod ingest;
pub mod preview;
