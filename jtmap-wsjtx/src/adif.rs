//! Minimal ADIF (`.adi`) reader and writer
//!
//! Only what's needed for the `LoggedADIF` message: the header (everything up
//! to `<eoh>`) is skipped and the first record is returned.
//!
//! <https://adif.org/316/ADIF_316.htm#ADI_File_Format>

use std::{
    collections::BTreeMap,
    fmt::Display,
};

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum AdifError {
    #[error("unterminated ADIF tag at offset {offset}")]
    UnterminatedTag { offset: usize },
    #[error("invalid length in ADIF tag <{tag}>")]
    InvalidLength { tag: String },
    #[error("ADIF field {name} is shorter than its declared length {length}")]
    TruncatedField { name: String, length: usize },
    #[error("ADIF record has no fields")]
    EmptyRecord,
}

/// One ADIF record. Field names are case-insensitive and stored lowercase.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AdifRecord {
    fields: BTreeMap<String, String>,
}

impl AdifRecord {
    pub fn insert(&mut self, name: &str, value: impl Into<String>) {
        self.fields.insert(name.to_ascii_lowercase(), value.into());
    }

    pub fn with(mut self, name: &str, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    /// Returns the field's value, treating empty values as absent.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Display for AdifRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (name, value) in self.iter() {
            write!(f, "<{name}:{}>{value} ", value.chars().count())?;
        }
        write!(f, "<eor>")
    }
}

/// Reads the first record from an ADIF document.
pub fn read_first_record(adif: &str) -> Result<AdifRecord, AdifError> {
    let mut record = AdifRecord::default();
    let mut rest = adif;

    // a header is free text up to <eoh> and may contain stray '<'
    if !adif.starts_with('<') {
        if let Some(end) = adif.to_ascii_lowercase().find("<eoh>") {
            rest = &adif[end + "<eoh>".len()..];
        }
    }

    while let Some(start) = rest.find('<') {
        let offset = adif.len() - rest.len() + start;
        let after_open = &rest[start + 1..];
        let end = after_open
            .find('>')
            .ok_or(AdifError::UnterminatedTag { offset })?;
        let tag = &after_open[..end];
        let data = &after_open[end + 1..];

        // <name:length[:type]>
        let mut parts = tag.splitn(3, ':');
        let name = parts.next().unwrap_or_default().trim();

        match parts.next() {
            None => {
                rest = data;
                if name.eq_ignore_ascii_case("eoh") {
                    // everything so far was the header
                    record = AdifRecord::default();
                }
                else if name.eq_ignore_ascii_case("eor") {
                    break;
                }
            }
            Some(length) => {
                let length: usize =
                    length.trim().parse().map_err(|_| {
                        AdifError::InvalidLength {
                            tag: tag.to_owned(),
                        }
                    })?;
                let (value, remaining) = split_chars(data, length).ok_or_else(|| {
                    AdifError::TruncatedField {
                        name: name.to_owned(),
                        length,
                    }
                })?;
                record.insert(name, value);
                rest = remaining;
            }
        }
    }

    if record.is_empty() {
        Err(AdifError::EmptyRecord)
    }
    else {
        Ok(record)
    }
}

/// Splits after `n` characters, or returns `None` if `s` is shorter.
fn split_chars(s: &str, n: usize) -> Option<(&str, &str)> {
    let index = s
        .char_indices()
        .map(|(index, _)| index)
        .chain(std::iter::once(s.len()))
        .nth(n)?;
    Some(s.split_at(index))
}
