use crate::error::IngestError;

/// Repairs OCR damage in a numbering token: drops whitespace and maps the letter glyphs
/// `I` and `O` to the digits they stand for. Structure is left untouched.
pub fn normalize_number(raw: &str) -> String {
    raw.chars()
        .filter(|ch| !ch.is_whitespace())
        .map(|ch| match ch {
            'I' => '1',
            'O' => '0',
            other => other,
        })
        .collect()
}

/// Splits a `major.minor` compound such as a subsection number. When the raw token carries
/// no `.`, whitespace is taken as the separator ("3 5" reads as 3.5).
pub fn split_compound(raw: &str) -> Result<(u32, u32), IngestError> {
    let canonical = if raw.contains('.') {
        normalize_number(raw)
    } else {
        normalize_number(&raw.split_whitespace().collect::<Vec<&str>>().join("."))
    };

    let malformed = || IngestError::MalformedCompoundNumber {
        raw: raw.to_string(),
    };

    let mut parts = canonical.split('.');
    let (Some(major), Some(minor), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(malformed());
    };

    let major = major.parse::<u32>().map_err(|_| malformed())?;
    let minor = minor.parse::<u32>().map_err(|_| malformed())?;
    Ok((major, minor))
}

/// Address of an element inside a subsection file. A number already prefixed with the
/// file's own `section.subsection.` keeps only the remainder.
pub fn element_number(raw: &str, section: u32, subsection: u32) -> String {
    let normalized = normalize_number(raw);
    let trimmed = normalized.trim_matches('.');
    let prefix = format!("{section}.{subsection}.");

    match trimmed.strip_prefix(&prefix) {
        Some(rest) if !rest.is_empty() => rest.to_string(),
        _ => trimmed.to_string(),
    }
}

/// A fully qualified `section.subsection.number` reference, as used by LINK markers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualifiedNumber {
    pub section: u32,
    pub subsection: u32,
    pub number: String,
}

pub fn split_qualified(raw: &str) -> Result<QualifiedNumber, IngestError> {
    let normalized = normalize_number(raw);
    let malformed = || IngestError::MalformedCompoundNumber {
        raw: raw.to_string(),
    };

    let parts = normalized.trim_matches('.').split('.').collect::<Vec<&str>>();
    if parts.len() < 3 || parts.iter().any(|part| part.is_empty()) {
        return Err(malformed());
    }

    let section = parts[0].parse::<u32>().map_err(|_| malformed())?;
    let subsection = parts[1].parse::<u32>().map_err(|_| malformed())?;

    Ok(QualifiedNumber {
        section,
        subsection,
        number: parts[2..].join("."),
    })
}
