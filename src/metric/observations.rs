// Observation file parsing
//
// One metric value per line. Blank lines and `#` comments are skipped;
// values may also be comma or whitespace separated on a single line.

use anyhow::{Context, Result};
use std::path::Path;

/// Parse metric observations from text
///
/// # Example
/// ```
/// use peekbias::metric::parse_observations;
///
/// let values = parse_observations("# revenue per user\n1.5\n2.0, 2.5\n\n3\n").unwrap();
/// assert_eq!(values, vec![1.5, 2.0, 2.5, 3.0]);
/// ```
pub fn parse_observations(text: &str) -> Result<Vec<f32>> {
    let mut values = Vec::new();

    for (index, line) in text.lines().enumerate() {
        let line = line.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }

        for token in line
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|t| !t.is_empty())
        {
            let value: f32 = token
                .parse()
                .with_context(|| format!("line {}: invalid number '{}'", index + 1, token))?;
            if !value.is_finite() {
                anyhow::bail!("line {}: non-finite value '{}'", index + 1, token);
            }
            values.push(value);
        }
    }

    Ok(values)
}

/// Read and parse an observation file
pub fn read_observations(path: &Path) -> Result<Vec<f32>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read observations from {}", path.display()))?;
    let values = parse_observations(&text)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    tracing::debug!("Read {} observations from {}", values.len(), path.display());
    Ok(values)
}
