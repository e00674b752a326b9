use std::error::Error;
use std::fs::{self, File};
use std::io::BufReader;

use bson_lite::{from_reader, release, to_writer, Pair, Value};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(true)
        .init();

    let bytes = [0u8, 1];
    println!("{}", Value::bytes(&bytes));

    // Everything here borrows from the stack; nothing is copied until decode
    let pairs = [
        Pair::new("name", "Alice"),
        Pair::new("age", 20i32),
        Pair::new("is_student", true),
    ];
    let document = Value::object(&pairs);
    println!("{:#}", document);

    let path = std::env::temp_dir().join("sample_document.bson");
    to_writer(File::create(&path)?, &document)?;
    info!(path = %path.display(), len = document.encoded_len(), "wrote document");

    let loaded = from_reader(BufReader::new(File::open(&path)?))?;
    println!("{:#}", loaded);
    assert_eq!(loaded, document);

    let freed = release(loaded);
    info!(freed, "released loaded document");
    fs::remove_file(&path)?;
    Ok(())
}
