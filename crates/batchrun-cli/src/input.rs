//! Loading work-item lists from files, stdin and the command line.

use std::io::Read;
use std::path::Path;

use batchrun_core::{CoreError, WorkItem, WorkItemSet};
use serde::Deserialize;

use crate::error::CliError;

/// One entry of a JSON item list: a bare id or a full item.
#[derive(Deserialize)]
#[serde(untagged)]
enum ItemSpec {
    Id(String),
    Item(WorkItem),
}

/// Parse an item list.
///
/// A document starting with `[` is a JSON array of ids or
/// `{"id": .., "metadata": {..}}` objects. Anything else is one id per
/// line, with blank lines and `#` comments ignored.
pub fn parse_items(text: &str) -> Result<Vec<WorkItem>, CoreError> {
    let trimmed = text.trim_start();
    if trimmed.starts_with('[') {
        let specs: Vec<ItemSpec> = serde_json::from_str(trimmed)
            .map_err(|e| CoreError::InvalidInput(format!("bad JSON item list: {}", e)))?;
        return Ok(specs
            .into_iter()
            .map(|spec| match spec {
                ItemSpec::Id(id) => WorkItem::new(id),
                ItemSpec::Item(item) => item,
            })
            .collect());
    }

    Ok(text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(WorkItem::new)
        .collect())
}

/// Build the work-item set from an optional file (`-` for stdin) followed
/// by inline ids.
pub fn load_items(file: Option<&Path>, inline: &[String]) -> Result<WorkItemSet, CliError> {
    let mut items = match file {
        Some(path) if path == Path::new("-") => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .map_err(|source| CliError::Read {
                    path: "<stdin>".to_string(),
                    source,
                })?;
            parse_items(&text)?
        }
        Some(path) => {
            let text = std::fs::read_to_string(path).map_err(|source| CliError::Read {
                path: path.display().to_string(),
                source,
            })?;
            parse_items(&text)?
        }
        None => Vec::new(),
    };

    items.extend(inline.iter().map(|id| WorkItem::new(id.as_str())));
    Ok(WorkItemSet::new(items)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_lines() {
        let items = parse_items("# services\napi\n\n  web  \n# end\nworker\n").unwrap();
        let ids: Vec<&str> = items.iter().map(|i| i.id().as_str()).collect();
        assert_eq!(ids, vec!["api", "web", "worker"]);
    }

    #[test]
    fn test_parse_json_mixed_entries() {
        let items =
            parse_items(r#"["api", {"id": "db", "metadata": {"suite": "integration"}}]"#).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].id().as_str(), "api");
        assert_eq!(items[1].meta("suite"), Some("integration"));
    }

    #[test]
    fn test_parse_bad_json_is_invalid_input() {
        let result = parse_items("[\"api\", ");
        assert!(matches!(result, Err(CoreError::InvalidInput(_))));
    }

    #[test]
    fn test_inline_duplicates_rejected() {
        let result = load_items(None, &["a".to_string(), "a".to_string()]);
        assert!(matches!(
            result,
            Err(CliError::Core(CoreError::DuplicateItem(_)))
        ));
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let result = load_items(Some(Path::new("/nonexistent/batchrun/items.txt")), &[]);
        assert!(matches!(result, Err(CliError::Read { .. })));
    }
}
