//! Human-readable rendering.
//!
//! `{}` puts a whole tree on one line. `{:#}` breaks containers across lines, indenting two spaces
//! per level.

use std::fmt::{self, Write};

use crate::value::{Array, Object, Value};

impl<'a> fmt::Display for Value<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let indent = if f.alternate() { Some(0) } else { None };
        write_value(f, self, indent)
    }
}

impl<'a> fmt::Display for Array<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let indent = if f.alternate() { Some(0) } else { None };
        write_array(f, self, indent)
    }
}

impl<'a> fmt::Display for Object<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let indent = if f.alternate() { Some(0) } else { None };
        write_object(f, self, indent)
    }
}

fn write_value(f: &mut fmt::Formatter, value: &Value, indent: Option<usize>) -> fmt::Result {
    match value {
        Value::I8(v) => write!(f, "{}", v),
        Value::I16(v) => write!(f, "{}", v),
        Value::I32(v) => write!(f, "{}", v),
        Value::I64(v) => write!(f, "{}", v),
        Value::U8(v) => write!(f, "{}", v),
        Value::U16(v) => write!(f, "{}", v),
        Value::U32(v) => write!(f, "{}", v),
        Value::U64(v) => write!(f, "{}", v),
        Value::F32(v) => write!(f, "{}", v),
        Value::F64(v) => write!(f, "{}", v),
        Value::Bool(v) => write!(f, "{}", v),
        Value::Str(v) => write!(f, "{:?}", String::from_utf8_lossy(v)),
        Value::Bytes(v) => {
            f.write_str("<Buffer")?;
            for byte in v.iter() {
                write!(f, " {:02x}", byte)?;
            }
            f.write_char('>')
        }
        Value::Date(v) => write!(f, "date({})", v),
        Value::Array(v) => write_array(f, v, indent),
        Value::Object(v) => write_object(f, v, indent),
        Value::Null => f.write_str("null"),
    }
}

fn write_array(f: &mut fmt::Formatter, array: &Array, indent: Option<usize>) -> fmt::Result {
    write_container(f, ('[', ']'), array.iter().map(|elem| (None, elem)), indent)
}

fn write_object(f: &mut fmt::Formatter, object: &Object, indent: Option<usize>) -> fmt::Result {
    write_container(
        f,
        ('{', '}'),
        object.iter().map(|pair| (Some(&pair.key[..]), &pair.value)),
        indent,
    )
}

fn write_container<'v, 'a: 'v, I>(
    f: &mut fmt::Formatter,
    (open, close): (char, char),
    entries: I,
    indent: Option<usize>,
) -> fmt::Result
where
    I: ExactSizeIterator<Item = (Option<&'v [u8]>, &'v Value<'a>)>,
{
    if entries.len() == 0 {
        f.write_char(open)?;
        return f.write_char(close);
    }
    f.write_char(open)?;
    for (i, (key, value)) in entries.enumerate() {
        if i > 0 {
            f.write_char(',')?;
        }
        match indent {
            Some(level) => {
                f.write_char('\n')?;
                pad(f, level + 1)?;
            }
            None if i > 0 => f.write_char(' ')?,
            None => (),
        }
        if let Some(key) = key {
            write!(f, "{:?}: ", String::from_utf8_lossy(key))?;
        }
        write_value(f, value, indent.map(|level| level + 1))?;
    }
    if let Some(level) = indent {
        f.write_char('\n')?;
        pad(f, level)?;
    }
    f.write_char(close)
}

fn pad(f: &mut fmt::Formatter, level: usize) -> fmt::Result {
    for _ in 0..level {
        f.write_str("  ")?;
    }
    Ok(())
}
