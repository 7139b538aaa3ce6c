//! Shared constants for payload keys, file naming and defaults.

/// Wire key for the latitude string of a raw record
pub const LATITUDE_KEY: &str = "lat";

/// Wire key for the longitude string of a raw record
pub const LONGITUDE_KEY: &str = "lon";

/// Wire key for the numeric value of a series point
pub const VALUE_KEY: &str = "value";

/// Default number of points averaged into one chart point
pub const DEFAULT_SAMPLING_INTERVAL: usize = 10;

/// Extension of payload files picked up by discovery
pub const PAYLOAD_EXTENSION: &str = "json";

/// Suffix appended to the input stem for normalized output
pub const GEOJSON_SUFFIX: &str = "geojson";

/// Suffix appended to the input stem for sampled output
pub const SAMPLED_SUFFIX: &str = "sampled.json";

/// Directory and file name of the user configuration
pub const CONFIG_DIR_NAME: &str = "aquamon";
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Environment filter target used by logging setup
pub const LOG_TARGET: &str = "aquamon_processor";
