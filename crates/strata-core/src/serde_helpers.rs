//! Shared serde default functions.

pub fn default_migrations_path() -> String {
    ".".to_string()
}

pub fn default_version_table() -> String {
    "public.schema_version".to_string()
}

pub fn default_application_name() -> String {
    "strata".to_string()
}
