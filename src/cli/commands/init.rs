//! Init command implementation
//!
//! This module implements the `init` command for generating a sample
//! configuration file.

use clap::Args;
use std::fs;
use std::path::Path;

/// Sample configuration written by `resend init`
pub const SAMPLE_CONFIG: &str = r#"# resend configuration file
# Retrieval from the message search index and controlled replay

[application]
# Log level (trace, debug, info, warn, error)
log_level = "info"

[search]
# Search URL including the index pattern
url = "https://search.example.org:9200/messages-*/_search"

# Authorization header is "<auth_scheme> <token>"
auth_scheme = "Bearer"
# token = "${RESEND_SEARCH_TOKEN}"

# Scroll keep-alive and page size
keep_alive = "5m"
page_size = 1000
timeout_seconds = 60
tls_verify = true

# Timestamp field used for the time range and sort order
timestamp_field = "@timestamp"

# Filter matching: "exact" (term on <field>.keyword) or "analyzed" (match_phrase)
match_mode = "exact"

# Field the query action groups by
group_field = "ScenarioName"

[replay]
batch_size = 10
batch_delay_ms = 1000
pause_poll_ms = 250
timeout_seconds = 30
tls_verify = true

# Fixed marker sent in the source-host header
source_host = "resend"

# Record fields
payload_field = "Payload"
message_id_field = "MessageId"
provenance_field = "Provenance"

# Process state for records without a provenance document
fallback_state = "Resent"

[replay.headers]
provenance = "X-Provenance"
business_keys = "X-Business-Keys"
source_host = "X-Source-Host"
message_id = "X-Message-Id"
group_id = "X-Group-Id"
group_sequence = "X-Group-Sequence"

# Replay targets by name
[targets]
ie-test = "https://ie-test.example.org:8443/replay"
# ie-prod = "https://ie-prod.example.org:8443/replay"

[logging]
local_enabled = false
local_path = "logs"
# daily, hourly or never
local_rotation = "daily"
"#;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path where to create the configuration file
    #[arg(short, long, default_value = "resend.toml")]
    pub output: String,

    /// Overwrite existing file
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    /// Execute the init command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(output = %self.output, "Initializing configuration file");

        if Path::new(&self.output).exists() && !self.force {
            println!("Configuration file already exists: {}", self.output);
            println!("   Use --force to overwrite");
            return Ok(2);
        }

        match fs::write(&self.output, SAMPLE_CONFIG) {
            Ok(()) => {
                println!("Configuration file created: {}", self.output);
                println!();
                println!("Next steps:");
                println!("  1. Edit {} with your search URL and targets", self.output);
                println!("  2. Put RESEND_SEARCH_TOKEN in a .env file and uncomment the token line");
                println!("  3. Validate configuration: resend validate-config");
                println!(
                    "  4. Dry run: resend replay --from <T> --to <T> --filter F=V --action test --target <name>"
                );
                Ok(0)
            }
            Err(e) => {
                println!("Failed to write configuration file");
                println!("   Error: {e}");
                Ok(5)
            }
        }
    }
}
