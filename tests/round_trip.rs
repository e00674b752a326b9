use std::io::Cursor;

use bson_lite::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn decode_both(data: &[u8]) -> Value<'static> {
    let mut cursor = 0;
    let from_buf = from_slice(data, &mut cursor).unwrap();
    assert_eq!(cursor, data.len(), "slice decode should consume the whole encoding");
    let from_stream = from_reader(data).unwrap();
    assert_eq!(from_buf, from_stream, "both decode paths should agree");
    from_buf
}

fn round_trip(value: &Value) {
    let enc = to_vec(value).unwrap();
    assert_eq!(enc.len(), value.encoded_len());
    let dec = decode_both(&enc);
    assert_eq!(&dec, value);
    assert_eq!(to_vec(&dec).unwrap(), enc, "re-encoding should be byte-identical");
}

fn random_string<R: Rng>(rng: &mut R) -> String {
    const WORDS: [&str; 8] = ["", "a", "name", "Alice", "is_student", "ünïcødé", "0", "key with spaces"];
    WORDS[rng.gen_range(0..WORDS.len())].to_string()
}

fn random_value<R: Rng>(rng: &mut R, depth: usize) -> Value<'static> {
    let kinds = if depth == 0 { 15 } else { 17 };
    match rng.gen_range(0..kinds) {
        0 => Value::I8(rng.gen()),
        1 => Value::I16(rng.gen()),
        2 => Value::I32(rng.gen()),
        3 => Value::I64(rng.gen()),
        4 => Value::U8(rng.gen()),
        5 => Value::U16(rng.gen()),
        6 => Value::U32(rng.gen()),
        7 => Value::U64(rng.gen()),
        8 => Value::F32(rng.gen()),
        9 => Value::F64(rng.gen()),
        10 => Value::Bool(rng.gen()),
        11 => Value::Null,
        12 => Value::Date(rng.gen()),
        13 => Value::string(random_string(rng)),
        14 => {
            let len = rng.gen_range(0..16);
            Value::byte_buf((0..len).map(|_| rng.gen()).collect())
        }
        15 => {
            let len = rng.gen_range(0..6);
            Value::array_owned((0..len).map(|_| random_value(rng, depth - 1)).collect())
        }
        _ => {
            let len = rng.gen_range(0..6);
            Value::object_owned(
                (0..len)
                    .map(|_| Pair::new(random_string(rng), random_value(rng, depth - 1)))
                    .collect(),
            )
        }
    }
}

#[test]
fn every_scalar() {
    let scalars = [
        Value::I8(i8::MIN),
        Value::I16(-300),
        Value::I32(i32::MAX),
        Value::I64(-1),
        Value::U8(u8::MAX),
        Value::U16(0xbeef),
        Value::U32(0),
        Value::U64(u64::MAX),
        Value::F32(-0.5),
        Value::F64(std::f64::consts::PI),
        Value::Bool(true),
        Value::Bool(false),
        Value::Null,
        Value::Date(1_700_000_000_000),
    ];
    for value in scalars.iter() {
        round_trip(value);
    }
}

#[test]
fn empty_payloads() {
    round_trip(&Value::str(""));
    round_trip(&Value::bytes(&[]));
    round_trip(&Value::array(&[]));
    round_trip(&Value::object(&[]));
}

#[test]
fn sample_document_bytes() {
    let pairs = [
        Pair::new("name", "Alice"),
        Pair::new("age", 20i32),
        Pair::new("is_student", true),
    ];
    let doc = Value::object(&pairs);
    let enc = to_vec(&doc).unwrap();

    let mut expected = vec![Marker::Object as u8, 3, 0, 0, 0, 45, 0, 0, 0];
    expected.extend_from_slice(&[Marker::String as u8, Marker::I32 as u8, Marker::True as u8]);
    expected.extend_from_slice(&[4, 0, 0, 0]);
    expected.extend_from_slice(b"name");
    expected.extend_from_slice(&[5, 0, 0, 0]);
    expected.extend_from_slice(b"Alice");
    expected.extend_from_slice(&[3, 0, 0, 0]);
    expected.extend_from_slice(b"age");
    expected.extend_from_slice(&[20, 0, 0, 0]);
    expected.extend_from_slice(&[10, 0, 0, 0]);
    expected.extend_from_slice(b"is_student");
    assert_eq!(enc, expected);
    assert_eq!(enc.len(), 54);

    let dec = decode_both(&enc);
    let obj = dec.as_object().unwrap();
    assert_eq!(obj.len(), 3);
    assert_eq!(obj["name"].as_str(), Some("Alice"));
    assert_eq!(obj["age"], Value::I32(20));
    assert_eq!(obj["is_student"].as_bool(), Some(true));
}

#[test]
fn two_byte_blob() {
    let data = [0x00u8, 0x01];
    let enc = to_vec(&Value::bytes(&data)).unwrap();
    assert_eq!(enc, vec![14, 2, 0, 0, 0, 0, 1]);
    let dec = decode_both(&enc);
    assert_eq!(dec.as_slice(), Some(&data[..]));
    assert_eq!(dec.to_string(), "<Buffer 00 01>");
}

#[test]
fn nested_three_deep() {
    let leaf = [Value::str("leaf"), Value::F32(1.25)];
    let middle = [Pair::new("leaves", Value::array(&leaf)), Pair::new("when", Value::date(5))];
    let top = [Value::object(&middle), Value::U8(3), Value::object(&[])];
    let doc = Value::array(&top);
    round_trip(&doc);

    let enc = to_vec(&doc).unwrap();
    let dec = decode_both(&enc);
    assert_eq!(dec.resolve_size(), doc.resolve_size());
    let arr = dec.as_array().unwrap();
    assert_eq!(arr[0].get("leaves").unwrap().as_array().unwrap()[0].as_str(), Some("leaf"));
}

#[test]
fn random_trees() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    for _ in 0..300 {
        let value = random_value(&mut rng, 4);
        round_trip(&value);
    }
}

#[test]
fn mixed_ownership_tree() {
    let key = String::from("owned key");
    let view = [1u8, 2, 3];
    let doc = Value::object_owned(vec![
        Pair::new(key.as_str(), Value::bytes(&view)),
        Pair::new(String::from("k2"), Value::string("owned")),
        Pair::new("k3", Value::array_owned(vec![Value::str("view"), Value::Null])),
    ]);
    round_trip(&doc);
    let owned = doc.clone().into_owned();
    assert_eq!(owned, doc);
}

#[test]
fn stream_of_documents() {
    let docs = [Value::str("first"), Value::array_owned(vec![Value::U32(2)]), Value::Null];
    let mut stream = Vec::new();
    for doc in docs.iter() {
        to_writer(&mut stream, doc).unwrap();
    }

    let mut reader = Cursor::new(&stream);
    for doc in docs.iter() {
        assert_eq!(&from_reader(&mut reader).unwrap(), doc);
    }
    assert!(from_reader(&mut reader).unwrap_err().is_io());

    let mut cursor = 0;
    for doc in docs.iter() {
        assert_eq!(&from_slice(&stream, &mut cursor).unwrap(), doc);
    }
    assert_eq!(cursor, stream.len());
}

#[test]
fn through_json() {
    let json = r#"{"list":[1,2.5,"three",null],"flag":false,"nested":{"k":"v"}}"#;
    let value: Value<'static> = serde_json::from_str(json).unwrap();
    let dec = decode_both(&to_vec(&value).unwrap());
    assert_eq!(serde_json::to_string(&dec).unwrap(), json);
}

#[test]
fn mutation_after_resolve() {
    let mut doc = Value::array_owned(vec![Value::U8(1)]);
    let first = to_vec(&doc).unwrap();
    let arr = doc.as_array_mut().unwrap();
    arr.push("more");
    arr.invalidate_size();
    let second = to_vec(&doc).unwrap();
    assert!(second.len() > first.len());
    assert_eq!(decode_both(&second), doc);
}
