use std::fmt::Display;

use serde::de::DeserializeOwned;

/// JSON decode error that shows where in the (pretty printed) document
/// decoding failed.
#[derive(Debug, thiserror::Error)]
pub struct PrettyJsonError {
    #[source]
    source: serde_json::Error,
    pretty: Option<(usize, usize, String)>,
}

impl PrettyJsonError {
    pub fn pretty_json(&self) -> Option<&str> {
        self.pretty.as_ref().map(|(_, _, json)| json.as_str())
    }
}

impl Display for PrettyJsonError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{}", &self.source)?;

        if let Some((line, col, pretty)) = &self.pretty {
            for (line_num, line_str) in pretty.lines().enumerate() {
                if line.abs_diff(line_num) < 5 {
                    writeln!(f, "{:>4} {line_str}", line_num + 1)?;
                }
                if *line == line_num {
                    writeln!(f, "     {}^", "-".repeat(col.saturating_sub(1)))?;
                }
            }
        }

        Ok(())
    }
}

pub fn json_decode<T: DeserializeOwned>(json: impl AsRef<[u8]>) -> Result<T, PrettyJsonError> {
    let json = json.as_ref();
    serde_json::from_slice(json).map_err(|source| {
        PrettyJsonError {
            source,
            pretty: pretty_print::<T>(json),
        }
    })
}

// re-decodes the pretty printed document to get a useful line/column. only
// works if the document is valid JSON, but doesn't match `T`.
fn pretty_print<T: DeserializeOwned>(json: &[u8]) -> Option<(usize, usize, String)> {
    let value: serde_json::Value = serde_json::from_slice(json).ok()?;
    let pretty = serde_json::to_string_pretty(&value).ok()?;
    let error = serde_json::from_str::<T>(&pretty).err()?;
    Some((
        error.line().saturating_sub(1),
        error.column().saturating_sub(1),
        pretty,
    ))
}
