//! Column schemas and the type codec registry.
//!
//! A table's columns are declared with a compact spec string
//! (`"name:type,name:type"`, separators `,` or space, type defaulting to
//! `string`). Each type tag names a codec pair in the process-wide
//! registry; the codec is looked up once at parse time and bound into the
//! column, so re-registering a tag never affects already-built tables.

use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use sheetdb_common::{Cell, Money, SerialDate, Value};

use crate::error::SheetError;

pub type DecodeFn = Arc<dyn Fn(&Cell) -> Value + Send + Sync>;
pub type EncodeFn = Arc<dyn Fn(&Value) -> Cell + Send + Sync>;

/// A paired decode/encode function set bound to a type tag.
///
/// Both directions are pure and total: a raw cell that does not match the
/// declared type decodes to [`Value::Empty`] rather than failing.
#[derive(Clone)]
pub struct TypeCodec {
    pub from_sheet: DecodeFn,
    pub to_sheet: EncodeFn,
}

impl TypeCodec {
    pub fn new<D, E>(from_sheet: D, to_sheet: E) -> Self
    where
        D: Fn(&Cell) -> Value + Send + Sync + 'static,
        E: Fn(&Value) -> Cell + Send + Sync + 'static,
    {
        TypeCodec {
            from_sheet: Arc::new(from_sheet),
            to_sheet: Arc::new(to_sheet),
        }
    }
}

static REGISTRY: Lazy<RwLock<FxHashMap<String, TypeCodec>>> =
    Lazy::new(|| RwLock::new(builtin_codecs()));

/// Register a codec under a type tag, process-wide. Must happen before
/// any table using the tag is constructed; tables built earlier keep the
/// codec they bound at parse time.
pub fn register_type(tag: impl Into<String>, codec: TypeCodec) {
    REGISTRY.write().insert(tag.into(), codec);
}

fn lookup_type(tag: &str) -> Option<TypeCodec> {
    REGISTRY.read().get(tag).cloned()
}

fn builtin_codecs() -> FxHashMap<String, TypeCodec> {
    let mut map = FxHashMap::default();
    map.insert(
        "string".to_string(),
        TypeCodec::new(
            |cell| match cell {
                c if c.is_blank() => Value::Empty,
                Cell::Text(s) => Value::Text(s.clone()),
                other => Value::Text(other.to_string()),
            },
            |value| match value {
                Value::Empty => Cell::Empty,
                other => Cell::from(other.to_string()),
            },
        ),
    );
    map.insert(
        "number".to_string(),
        TypeCodec::new(
            |cell| match cell {
                Cell::Number(n) => Value::Number(*n),
                Cell::Text(s) => match s.trim().parse::<f64>() {
                    Ok(n) => Value::Number(n),
                    Err(_) => Value::Empty,
                },
                Cell::Empty => Value::Empty,
            },
            |value| match value {
                Value::Number(n) => Cell::Number(*n),
                Value::Money(m) => Cell::Number(m.to_f64()),
                _ => Cell::Empty,
            },
        ),
    );
    map.insert(
        "date".to_string(),
        TypeCodec::new(
            |cell| match cell.as_number() {
                Some(n) => Value::Date(SerialDate::new(n).to_naive()),
                None => Value::Empty,
            },
            |value| match value {
                Value::Date(d) => Cell::Number(SerialDate::from_naive(*d).serial()),
                _ => Cell::Empty,
            },
        ),
    );
    map.insert(
        "money".to_string(),
        TypeCodec::new(
            |cell| match cell {
                Cell::Number(n) => Value::Money(Money::from_f64(*n)),
                Cell::Text(s) => match s.trim().parse::<f64>() {
                    Ok(n) => Value::Money(Money::from_f64(n)),
                    Err(_) => Value::Empty,
                },
                Cell::Empty => Value::Empty,
            },
            |value| match value {
                Value::Money(m) => Cell::Number(m.to_f64()),
                Value::Number(n) => Cell::Number(*n),
                _ => Cell::Empty,
            },
        ),
    );
    map
}

/// One parsed column: name, declared type tag, and the codec bound at
/// parse time. Immutable after construction.
#[derive(Clone)]
pub struct Column {
    pub name: String,
    pub type_tag: String,
    codec: TypeCodec,
}

impl Column {
    pub fn from_sheet(&self, cell: &Cell) -> Value {
        (self.codec.from_sheet)(cell)
    }

    pub fn to_sheet(&self, value: &Value) -> Cell {
        (self.codec.to_sheet)(value)
    }
}

impl std::fmt::Debug for Column {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Column")
            .field("name", &self.name)
            .field("type_tag", &self.type_tag)
            .finish_non_exhaustive()
    }
}

/// Split a comma/space separated column list.
pub(crate) fn split_list(spec: &str) -> impl Iterator<Item = &str> {
    spec.split([',', ' ']).filter(|tok| !tok.is_empty())
}

/// Parse a column spec string, binding codecs. Fails fast on an empty
/// spec, a nameless column or an unregistered type tag.
pub fn parse_columns(spec: &str) -> Result<Vec<Column>, SheetError> {
    let mut columns = Vec::new();
    for token in split_list(spec) {
        let (name, tag) = match token.split_once(':') {
            Some((name, tag)) => (name, tag),
            None => (token, "string"),
        };
        if name.is_empty() {
            return Err(SheetError::Schema(format!("column `{token}` has no name")));
        }
        let codec = lookup_type(tag).ok_or_else(|| SheetError::UnknownType {
            column: name.to_string(),
            tag: tag.to_string(),
        })?;
        columns.push(Column {
            name: name.to_string(),
            type_tag: tag.to_string(),
            codec,
        });
    }
    if columns.is_empty() {
        return Err(SheetError::Schema("empty column spec".to_string()));
    }
    Ok(columns)
}

/// Declarative description of one table: the remote sheet (tab) name, the
/// column spec, and the optional sort and unique column lists.
#[derive(Clone, Debug, Default)]
pub struct TableDef {
    pub sheet: String,
    pub cols: String,
    pub sort: Option<String>,
    pub unique: Option<String>,
}

impl TableDef {
    pub fn new(sheet: impl Into<String>, cols: impl Into<String>) -> Self {
        TableDef {
            sheet: sheet.into(),
            cols: cols.into(),
            sort: None,
            unique: None,
        }
    }

    /// Columns to order by on save, comma/space separated; each later
    /// column breaks ties of the previous.
    pub fn sort(mut self, cols: impl Into<String>) -> Self {
        self.sort = Some(cols.into());
        self
    }

    /// Columns whose pipe-joined values define row identity; duplicate
    /// rows collapse last-write-wins on save.
    pub fn unique(mut self, cols: impl Into<String>) -> Self {
        self.unique = Some(cols.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_names_and_default_type() {
        let cols = parse_columns("ticker,name notes:string,qty:number").unwrap();
        assert_eq!(cols.len(), 4);
        assert_eq!(cols[0].name, "ticker");
        assert_eq!(cols[0].type_tag, "string");
        assert_eq!(cols[3].type_tag, "number");
    }

    #[test]
    fn rejects_unknown_type_and_empty_spec() {
        assert!(matches!(
            parse_columns("qty:float"),
            Err(SheetError::UnknownType { .. })
        ));
        assert!(matches!(parse_columns(""), Err(SheetError::Schema(_))));
        assert!(matches!(parse_columns(":number"), Err(SheetError::Schema(_))));
    }

    #[test]
    fn string_codec() {
        let cols = parse_columns("notes").unwrap();
        let col = &cols[0];
        assert_eq!(col.from_sheet(&Cell::Empty), Value::Empty);
        assert_eq!(col.from_sheet(&Cell::from("hi")), Value::Text("hi".into()));
        assert_eq!(col.from_sheet(&Cell::Number(5.0)), Value::Text("5".into()));
        assert_eq!(col.to_sheet(&Value::Empty), Cell::Empty);
        assert_eq!(col.to_sheet(&Value::from("hi")), Cell::Text("hi".into()));
    }

    #[test]
    fn number_codec_is_total_over_junk() {
        let cols = parse_columns("qty:number").unwrap();
        let col = &cols[0];
        assert_eq!(col.from_sheet(&Cell::Number(2.5)), Value::Number(2.5));
        assert_eq!(col.from_sheet(&Cell::from(" 3 ")), Value::Number(3.0));
        assert_eq!(col.from_sheet(&Cell::from("n/a")), Value::Empty);
    }

    #[test]
    fn date_codec_round_trips_serials() {
        let cols = parse_columns("when:date").unwrap();
        let col = &cols[0];
        let decoded = col.from_sheet(&Cell::Number(45_047.25));
        let encoded = col.to_sheet(&decoded);
        assert_eq!(encoded, Cell::Number(45_047.25));
    }

    #[test]
    fn money_codec_rounds_to_two_places() {
        let cols = parse_columns("cost:money").unwrap();
        let col = &cols[0];
        let decoded = col.from_sheet(&Cell::from("12.345"));
        assert_eq!(decoded, Value::Money(Money::from_f64(12.35)));
        assert_eq!(col.to_sheet(&decoded), Cell::Number(12.35));
    }

    #[test]
    fn registered_types_are_available_to_later_parses() {
        register_type(
            "flag",
            TypeCodec::new(
                |cell| match cell.as_number() {
                    Some(n) => Value::Number(if n != 0.0 { 1.0 } else { 0.0 }),
                    None => Value::Empty,
                },
                |value| match value.as_number() {
                    Some(n) => Cell::Number(n),
                    None => Cell::Empty,
                },
            ),
        );
        let cols = parse_columns("active:flag").unwrap();
        let col = &cols[0];
        assert_eq!(col.from_sheet(&Cell::Number(7.0)), Value::Number(1.0));
    }
}
