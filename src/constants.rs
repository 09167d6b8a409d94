/// Endpoint and artifact locations shared across the pipeline stages.
pub const APOD_API_URL: &str = "https://api.nasa.gov/planetary/apod";

pub const CONFIG_FILE: &str = "config.toml";

// Artifact layout under the data directory
pub const RAW_SUBDIR: &str = "raw";
pub const STAGED_SUBDIR: &str = "staged";
pub const RAW_ARTIFACT: &str = "nasa_data.json";
pub const STAGED_ARTIFACT: &str = "nasa_data_staged.csv";

// Environment variable names. The API key is accepted under either name.
pub const NASA_API_KEY_ENV: &str = "NASA_API_KEY";
pub const NASA_API_KEY_ALIAS_ENV: &str = "api_key";
pub const LIBSQL_URL_ENV: &str = "LIBSQL_URL";
pub const LIBSQL_AUTH_TOKEN_ENV: &str = "LIBSQL_AUTH_TOKEN";

// Tunable defaults, overridable via config.toml
pub const DEFAULT_LOOKBACK_DAYS: u32 = 8;
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_BATCH_SIZE: usize = 20;
pub const DEFAULT_BATCH_DELAY_MS: u64 = 500;
