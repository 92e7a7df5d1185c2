use crate::types::{ActionParameter, PossibleAction};

use super::{ListingParser, ParseError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Columns {
    id: usize,
    description: usize,
    parameters: Option<usize>,
    category: Option<usize>,
}

impl Default for Columns {
    fn default() -> Self {
        Self {
            id: 0,
            description: 1,
            parameters: Some(2),
            category: Some(3),
        }
    }
}

impl Columns {
    fn from_header(cells: &[&str]) -> Result<Self, ParseError> {
        let find = |names: &[&str]| {
            cells
                .iter()
                .position(|cell| names.iter().any(|name| cell.eq_ignore_ascii_case(name)))
        };
        Ok(Self {
            id: 0,
            description: find(&["description", "desc"]).ok_or(ParseError::MissingColumn {
                column: "description",
            })?,
            parameters: find(&["parameters", "params"]),
            category: find(&["category"]),
        })
    }
}

/// Parser for pipe-delimited listings, with or without a markdown header:
///
/// ```text
/// | ID | Description  | Parameters     | Category |
/// |----|--------------|----------------|----------|
/// | I1 | Search items | query: string  | Search   |
/// ```
///
/// Without a header the columns are read as id, description, parameters,
/// category; only the first two are required.
#[derive(Debug, Clone, Copy, Default)]
pub struct TableListingParser;

impl ListingParser for TableListingParser {
    fn parse(&self, text: &str) -> Result<Vec<PossibleAction>, ParseError> {
        let mut columns: Option<Columns> = None;
        let mut actions = Vec::new();

        for (index, raw) in text.lines().enumerate() {
            let line = index + 1;
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                continue;
            }

            let cells = split_row(trimmed);
            if is_separator(&cells) {
                continue;
            }
            if columns.is_none() && actions.is_empty() && cells[0].eq_ignore_ascii_case("id") {
                columns = Some(Columns::from_header(&cells)?);
                continue;
            }

            let layout = columns.unwrap_or_default();
            actions.push(parse_row(&cells, layout, line)?);
        }

        if actions.is_empty() {
            return Err(ParseError::NoRows);
        }
        Ok(actions)
    }
}

fn split_row(line: &str) -> Vec<&str> {
    let line = line.strip_prefix('|').unwrap_or(line);
    let line = line.strip_suffix('|').unwrap_or(line);
    line.split('|').map(str::trim).collect()
}

fn is_separator(cells: &[&str]) -> bool {
    cells.iter().all(|cell| {
        !cell.is_empty() && cell.contains('-') && cell.chars().all(|c| c == '-' || c == ':')
    })
}

fn parse_row(cells: &[&str], columns: Columns, line: usize) -> Result<PossibleAction, ParseError> {
    if cells.len() < 2 {
        return Err(ParseError::MalformedRow {
            line,
            reason: "expected at least an id and a description".to_string(),
        });
    }

    let cell = |index: Option<usize>| index.and_then(|i| cells.get(i)).copied().unwrap_or("");

    let id = cell(Some(columns.id));
    if id.is_empty() {
        return Err(ParseError::MalformedRow {
            line,
            reason: "empty action id".to_string(),
        });
    }
    let description = cell(Some(columns.description));
    if description.is_empty() {
        return Err(ParseError::MalformedRow {
            line,
            reason: format!("empty description for action {id}"),
        });
    }

    let params = parse_parameters(cell(columns.parameters), line)?;
    Ok(PossibleAction::new(id, description, cell(columns.category)).with_params(params))
}

/// Parse `name: type[v1, v2] = default` entries separated by `;`.
fn parse_parameters(cell: &str, line: usize) -> Result<Vec<ActionParameter>, ParseError> {
    if cell.is_empty() || cell == "-" || cell.eq_ignore_ascii_case("none") {
        return Ok(Vec::new());
    }

    cell.split(';')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| parse_parameter(entry, line))
        .collect()
}

fn parse_parameter(entry: &str, line: usize) -> Result<ActionParameter, ParseError> {
    let malformed = || ParseError::MalformedParameter {
        line,
        value: entry.to_string(),
    };

    let (name, rest) = entry.split_once(':').ok_or_else(malformed)?;
    let name = name.trim();
    if name.is_empty() {
        return Err(malformed());
    }

    let (type_part, default) = match rest.split_once('=') {
        Some((type_part, default)) => (type_part.trim(), Some(default.trim().to_string())),
        None => (rest.trim(), None),
    };

    let (param_type, values) = match type_part.split_once('[') {
        Some((param_type, values)) => {
            let values = values.strip_suffix(']').ok_or_else(malformed)?;
            let values = values
                .split(',')
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_string)
                .collect();
            (param_type.trim(), values)
        }
        None => (type_part, Vec::new()),
    };
    if param_type.is_empty() {
        return Err(malformed());
    }

    Ok(ActionParameter {
        name: name.to_string(),
        param_type: param_type.to_string(),
        default: default.filter(|value| !value.is_empty()),
        values,
    })
}
