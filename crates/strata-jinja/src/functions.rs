//! Template functions: env(), log(), error(), from_json() and to_json(),
//! plus conversion of YAML config data into template data.

use minijinja::value::Value;
use minijinja::Error;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Values exposed to templates as top-level variables
pub type Data = serde_json::Map<String, serde_json::Value>;

/// Convert the `data:` section of strata.yml into template data
pub fn data_from_yaml(values: &BTreeMap<String, serde_yaml::Value>) -> Data {
    values
        .iter()
        .map(|(k, v)| (k.clone(), yaml_to_json(v)))
        .collect()
}

/// Convert serde_yaml::Value to serde_json::Value. Non-string mapping keys
/// are dropped.
pub(crate) fn yaml_to_json(yaml: &serde_yaml::Value) -> serde_json::Value {
    match yaml {
        serde_yaml::Value::Null => serde_json::Value::Null,
        serde_yaml::Value::Bool(b) => serde_json::Value::Bool(*b),
        serde_yaml::Value::Number(n) => convert_yaml_number(n),
        serde_yaml::Value::String(s) => serde_json::Value::String(s.clone()),
        serde_yaml::Value::Sequence(seq) => {
            serde_json::Value::Array(seq.iter().map(yaml_to_json).collect())
        }
        serde_yaml::Value::Mapping(map) => serde_json::Value::Object(
            map.iter()
                .filter_map(|(k, v)| k.as_str().map(|key| (key.to_string(), yaml_to_json(v))))
                .collect(),
        ),
        serde_yaml::Value::Tagged(tagged) => yaml_to_json(&tagged.value),
    }
}

fn convert_yaml_number(n: &serde_yaml::Number) -> serde_json::Value {
    if let Some(i) = n.as_i64() {
        return serde_json::Value::Number(i.into());
    }
    if let Some(f) = n.as_f64() {
        return match serde_json::Number::from_f64(f) {
            Some(num) => serde_json::Value::Number(num),
            None => {
                log::warn!("YAML number {} is NaN or Infinity; converting to null", f);
                serde_json::Value::Null
            }
        };
    }
    serde_json::Value::Null
}

fn invalid_operation(message: String) -> Error {
    Error::new(minijinja::ErrorKind::InvalidOperation, message)
}

/// Create the `env(name, default?)` function to read environment variables.
///
/// ```jinja
/// {{ env("PGHOST") }}
/// {{ env("APP_ROLE", "app") }}
/// ```
pub(crate) fn make_env_fn(
) -> impl Fn(&str, Option<Value>) -> Result<String, Error> + Send + Sync + Clone + 'static {
    |name: &str, default: Option<Value>| match std::env::var(name) {
        Ok(val) => Ok(val),
        Err(_) => match default {
            Some(d) => Ok(d.as_str().map(String::from).unwrap_or_else(|| d.to_string())),
            None => Err(invalid_operation(format!(
                "environment variable '{name}' is not set and no default provided"
            ))),
        },
    }
}

/// Create the `log(msg)` function. Writes through the log facade and renders
/// nothing.
pub(crate) fn make_log_fn() -> impl Fn(&str) -> String + Send + Sync + Clone + 'static {
    |msg: &str| {
        log::info!("[template] {}", msg);
        String::new()
    }
}

/// Create the `error(msg)` function that aborts rendering.
///
/// ```jinja
/// {% if not schema %}{{ error("schema is required") }}{% endif %}
/// ```
pub(crate) fn make_error_fn(
) -> impl Fn(&str) -> Result<String, Error> + Send + Sync + Clone + 'static {
    |msg: &str| Err(invalid_operation(msg.to_string()))
}

/// Create the `from_json(str)` function.
pub(crate) fn make_from_json_fn(
) -> impl Fn(&str) -> Result<Value, Error> + Send + Sync + Clone + 'static {
    |s: &str| {
        serde_json::from_str::<serde_json::Value>(s)
            .map(|parsed| Value::from_serialize(&parsed))
            .map_err(|e| invalid_operation(format!("from_json parse error: {e}")))
    }
}

/// Create the `to_json(value)` function. Also registered as a filter.
pub(crate) fn make_to_json_fn(
) -> impl Fn(Value) -> Result<String, Error> + Send + Sync + Clone + 'static {
    |val: Value| {
        serde_json::to_string(&val)
            .map_err(|e| invalid_operation(format!("to_json serialization error: {e}")))
    }
}

/// Create the `install_snapshot(id)` function. Renders the pre-evaluated
/// SQL of the code package snapshot stored under `snapshots/<id>`.
///
/// ```jinja
/// {{ install_snapshot("004") }}
/// ```
pub(crate) fn make_install_snapshot_fn(
    snapshots: Arc<BTreeMap<String, String>>,
) -> impl Fn(&str) -> Result<String, Error> + Send + Sync + Clone + 'static {
    move |id: &str| {
        snapshots.get(id).cloned().ok_or_else(|| {
            invalid_operation(format!(
                "snapshot '{id}' not found; expected a code package in snapshots/{id}"
            ))
        })
    }
}

#[cfg(test)]
#[path = "functions_test.rs"]
mod tests;
