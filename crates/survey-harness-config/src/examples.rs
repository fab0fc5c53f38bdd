// crates/survey-harness-config/src/examples.rs
// ============================================================================
// Module: Config Examples
// Description: Canonical example configuration payload.
// Purpose: Starting point for operators writing survey-harness.toml.
// Dependencies: std
// ============================================================================

//! ## Overview
//! A complete example `survey-harness.toml`. The payload is static and is
//! parsed by the test suite so it stays valid as the model evolves.

/// Returns a canonical example `survey-harness.toml` configuration.
#[must_use]
pub fn config_toml_example() -> String {
    String::from(
        r#"[store]
type = "sqlite"
# path = "survey-harness.sqlite3"
busy_timeout_ms = 5000
journal_mode = "wal"
sync_mode = "full"

[generate]
participants = 100
seed = 42

[generate.schema]
completion_rate = 0.9

[[generate.schema.questions]]
name = "age"
kind = "integer"
min = 18
max = 80

[[generate.schema.questions]]
name = "gender"
kind = "choice"
options = ["female", "male", "non_binary", "prefer_not_to_say"]

[[generate.schema.questions]]
name = "comment"
kind = "text"
words = ["clear", "long", "helpful"]
optional = true

[export]
data_dir = "data"
data_file = "test.csv"

[audit]
enabled = true
# path = "survey-harness.audit.jsonl"
"#,
    )
}
