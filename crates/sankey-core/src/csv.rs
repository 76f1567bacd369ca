//! `source,target,value` CSV import.
//!
//! Produces a two-category, one-value [`DataView`] so command line and test inputs go
//! through the same builder path as host data. Fields follow RFC 4180 quoting (`""` escapes a
//! quote inside a quoted field). An optional first record `source,target,value`
//! (case-insensitive) is treated as a header. Unparsable values become `null` and are later
//! dropped by the graph builder.

use crate::data_view::{CategoricalData, CategoryColumn, DataView, ValueColumn};
use crate::{Error, Result};
use serde_json::Value;

pub fn data_view_from_csv(text: &str) -> Result<DataView> {
    let records = parse_csv_records(text)?;

    let mut sources = Vec::with_capacity(records.len());
    let mut targets = Vec::with_capacity(records.len());
    let mut values = Vec::with_capacity(records.len());

    for (i, (source, target, value)) in records.into_iter().enumerate() {
        if i == 0 && is_header(&source, &target, &value) {
            continue;
        }
        sources.push(Value::String(source.trim().to_string()));
        targets.push(Value::String(target.trim().to_string()));
        values.push(parse_float_json(&value));
    }

    Ok(DataView {
        metadata: Default::default(),
        categorical: Some(CategoricalData {
            categories: vec![
                CategoryColumn::new("source", sources),
                CategoryColumn::new("target", targets),
            ],
            values: vec![ValueColumn::new("value", None, values)],
        }),
    })
}

fn is_header(source: &str, target: &str, value: &str) -> bool {
    source.trim().eq_ignore_ascii_case("source")
        && target.trim().eq_ignore_ascii_case("target")
        && value.trim().eq_ignore_ascii_case("value")
}

fn parse_float_json(s: &str) -> Value {
    let t = s.trim();
    if !t.contains(['.', 'e', 'E']) {
        if let Ok(i) = t.parse::<i64>() {
            return Value::Number(i.into());
        }
    }

    let v = t.parse::<f64>().unwrap_or(f64::NAN);
    if !v.is_finite() {
        return Value::Null;
    }

    let Some(n) = serde_json::Number::from_f64(v) else {
        return Value::Null;
    };
    Value::Number(n)
}

fn parse_csv_records(input: &str) -> Result<Vec<(String, String, String)>> {
    let mut p = CsvParser::new(input);
    let mut records = Vec::new();
    p.consume_blank_lines();
    while !p.eof() {
        let record = records.len() + 1;
        let err = |message: String| Error::Csv { record, message };

        let source = p.parse_field().map_err(err)?;
        p.consume_char(',').map_err(err)?;
        let target = p.parse_field().map_err(err)?;
        p.consume_char(',').map_err(err)?;
        let value = p.parse_field().map_err(err)?;

        if p.try_consume_newline() {
            p.consume_blank_lines();
        } else if !p.eof() {
            return Err(err("expected end of record".to_string()));
        }

        records.push((source, target, value));
    }
    Ok(records)
}

struct CsvParser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> CsvParser<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek_char(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn consume_char(&mut self, ch: char) -> std::result::Result<(), String> {
        if self.rest().starts_with(ch) {
            self.pos += ch.len_utf8();
            Ok(())
        } else {
            Err(format!("expected '{ch}'"))
        }
    }

    /// Skips empty and whitespace-only lines.
    fn consume_blank_lines(&mut self) {
        loop {
            let rest = self.rest();
            let line_end = rest.find(['\n', '\r']).unwrap_or(rest.len());
            if !rest[..line_end].trim().is_empty() {
                return;
            }
            self.pos += line_end;
            if !self.try_consume_newline() {
                return;
            }
        }
    }

    fn try_consume_newline(&mut self) -> bool {
        match self.peek_char() {
            Some('\n') => {
                self.pos += 1;
                true
            }
            Some('\r') => {
                self.pos += 1;
                if self.peek_char() == Some('\n') {
                    self.pos += 1;
                }
                true
            }
            _ => false,
        }
    }

    fn parse_field(&mut self) -> std::result::Result<String, String> {
        let leading = self.rest().len() - self.rest().trim_start_matches([' ', '\t']).len();
        if self.rest()[leading..].starts_with('"') {
            self.pos += leading;
            let out = self.parse_quoted_field()?;
            let trailing =
                self.rest().len() - self.rest().trim_start_matches([' ', '\t']).len();
            self.pos += trailing;
            return Ok(out);
        }
        match self.peek_char() {
            Some('\n' | '\r') | None => Ok(String::new()),
            _ => self.parse_unquoted_field(),
        }
    }

    fn parse_unquoted_field(&mut self) -> std::result::Result<String, String> {
        let mut out = String::new();
        while let Some(ch) = self.peek_char() {
            if ch == ',' || ch == '\n' || ch == '\r' {
                break;
            }
            out.push(ch);
            self.pos += ch.len_utf8();
        }
        Ok(out)
    }

    fn parse_quoted_field(&mut self) -> std::result::Result<String, String> {
        self.consume_char('"')?;
        let mut out = String::new();
        while let Some(ch) = self.peek_char() {
            self.pos += ch.len_utf8();
            if ch == '"' {
                if self.peek_char() == Some('"') {
                    self.pos += 1;
                    out.push('"');
                    continue;
                }
                return Ok(out);
            }
            out.push(ch);
        }
        Err("unterminated quoted field".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn columns(view: &DataView) -> (Vec<Value>, Vec<Value>, Vec<Value>) {
        let c = view.categorical.as_ref().unwrap();
        (
            c.categories[0].values.clone(),
            c.categories[1].values.clone(),
            c.values[0].values.clone(),
        )
    }

    #[test]
    fn parses_plain_and_quoted_records() {
        let view = data_view_from_csv(
            "source,target,value\n\
             Agricultural 'waste',Bio-conversion,124.729\r\n\
             \n\
             \"\"\"Biomass imports\"\"\",Solid,35\n\
             \"District heating\",\"Heating and cooling, commercial\",22.505\n",
        )
        .unwrap();
        let (sources, targets, values) = columns(&view);
        assert_eq!(
            sources,
            vec![
                json!("Agricultural 'waste'"),
                json!("\"Biomass imports\""),
                json!("District heating"),
            ]
        );
        assert_eq!(targets[2], json!("Heating and cooling, commercial"));
        assert_eq!(values, vec![json!(124.729), json!(35), json!(22.505)]);
    }

    #[test]
    fn unparsable_values_become_null() {
        let view = data_view_from_csv("A,B,\nA,C,n/a\nA,D,1e400\n").unwrap();
        let (_, _, values) = columns(&view);
        assert_eq!(values, vec![Value::Null, Value::Null, Value::Null]);
    }

    #[test]
    fn malformed_records_report_their_position() {
        let err = data_view_from_csv("A,B,1\nA,B\n").unwrap_err();
        assert_eq!(err.to_string(), "CSV error (record 2): expected ','");

        let err = data_view_from_csv("\"A,B,1\n").unwrap_err();
        assert_eq!(
            err.to_string(),
            "CSV error (record 1): unterminated quoted field"
        );

        let err = data_view_from_csv("A,B,1,2\n").unwrap_err();
        assert_eq!(err.to_string(), "CSV error (record 1): expected end of record");
    }
}
