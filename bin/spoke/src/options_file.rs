//! Loading of YAML option files.
//!
//! Both flat and nested layouts are accepted:
//!
//! ```yaml
//! execution.checkpointing.interval: 10 s
//! execution:
//!   checkpointing:
//!     mode: AT_LEAST_ONCE
//! ```

use anyhow::{bail, Context, Result};
use serde_yaml::Value;
use std::collections::HashMap;
use std::path::Path;

pub fn load(path: &Path) -> Result<HashMap<String, String>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    parse(&text).with_context(|| format!("Failed to parse {}", path.display()))
}

pub fn parse(text: &str) -> Result<HashMap<String, String>> {
    let mut out = HashMap::new();
    if text.trim().is_empty() {
        return Ok(out);
    }
    match serde_yaml::from_str::<Value>(text)? {
        Value::Null => {}
        value @ Value::Mapping(_) => flatten("", &value, &mut out)?,
        _ => bail!("expected a mapping at the top level"),
    }
    Ok(out)
}

fn flatten(prefix: &str, value: &Value, out: &mut HashMap<String, String>) -> Result<()> {
    match value {
        Value::Mapping(map) => {
            for (key, value) in map {
                let key = scalar(key).with_context(|| format!("invalid key under `{prefix}`"))?;
                let path = if prefix.is_empty() {
                    key
                } else {
                    format!("{prefix}.{key}")
                };
                flatten(&path, value, out)?;
            }
        }
        other => {
            let value = scalar(other).with_context(|| format!("invalid value for `{prefix}`"))?;
            out.insert(prefix.to_string(), value);
        }
    }
    Ok(())
}

fn scalar(value: &Value) -> Result<String> {
    Ok(match value {
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        _ => bail!("expected a string, number or boolean"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_and_nested() {
        let options = parse(
            "execution.checkpointing.interval: 10 s\n\
             execution:\n  checkpointing:\n    mode: AT_LEAST_ONCE\n    max-concurrent-checkpoints: 2\n    unaligned: false\n",
        )
        .unwrap();

        assert_eq!(options["execution.checkpointing.interval"], "10 s");
        assert_eq!(options["execution.checkpointing.mode"], "AT_LEAST_ONCE");
        assert_eq!(options["execution.checkpointing.max-concurrent-checkpoints"], "2");
        assert_eq!(options["execution.checkpointing.unaligned"], "false");
    }

    #[test]
    fn test_empty_file() {
        assert!(parse("").unwrap().is_empty());
    }

    #[test]
    fn test_rejects_lists() {
        assert!(parse("- a\n- b\n").is_err());
        assert!(parse("execution.checkpointing.interval: [1, 2]\n").is_err());
    }
}
