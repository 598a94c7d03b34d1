use std::env;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

const LOCALES_DIR: &str = "locales";
const FALLBACK_LOCALE: &str = "en";

fn main() {
    println!("cargo:rerun-if-changed={LOCALES_DIR}");

    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").expect("manifest dir"));
    let locales_dir = manifest_dir.join(LOCALES_DIR);
    let mut locales = read_locales(&locales_dir);
    locales.sort_by(|left, right| left.tag.cmp(&right.tag));

    let default_locale = locales
        .iter()
        .find(|locale| locale.is_default)
        .map(|locale| locale.tag.clone())
        .unwrap_or_else(|| FALLBACK_LOCALE.to_string());

    let mut out = String::new();
    writeln!(out, "pub const DEFAULT_LOCALE: &str = {default_locale:?};").expect("write");
    writeln!(out, "pub static LOCALES: &[(&str, &[(&str, &str)])] = &[").expect("write");
    for locale in &locales {
        writeln!(out, "    ({:?}, &[", locale.tag).expect("write");
        for (key, value) in &locale.entries {
            writeln!(out, "        ({key:?}, {value:?}),").expect("write");
        }
        writeln!(out, "    ]),").expect("write");
    }
    writeln!(out, "];").expect("write");

    let out_dir = PathBuf::from(env::var("OUT_DIR").expect("out dir"));
    fs::write(out_dir.join("calmform_messages_generated.rs"), out)
        .expect("write generated message catalog");
}

struct LocaleFile {
    tag: String,
    is_default: bool,
    entries: Vec<(String, String)>,
}

fn read_locales(dir: &Path) -> Vec<LocaleFile> {
    let Ok(read_dir) = fs::read_dir(dir) else {
        return Vec::new();
    };

    let mut locales = Vec::new();
    for entry in read_dir.flatten() {
        let path = entry.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some("toml") {
            continue;
        }
        let Some(tag) = path.file_stem().and_then(|stem| stem.to_str()) else {
            continue;
        };
        println!("cargo:rerun-if-changed={}", path.display());

        let text = fs::read_to_string(&path)
            .unwrap_or_else(|error| panic!("read {}: {error}", path.display()));
        let table = toml::from_str::<toml::Table>(&text)
            .unwrap_or_else(|error| panic!("parse {}: {error}", path.display()));

        let is_default = matches!(
            table.get("default_locale"),
            Some(toml::Value::Boolean(true))
        );
        let mut entries = Vec::new();
        flatten("", &table, &mut entries);
        entries.sort();

        locales.push(LocaleFile {
            tag: tag.to_string(),
            is_default,
            entries,
        });
    }
    locales
}

fn flatten(prefix: &str, table: &toml::Table, out: &mut Vec<(String, String)>) {
    for (key, value) in table {
        let full_key = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match value {
            toml::Value::String(text) => out.push((full_key, text.clone())),
            toml::Value::Table(nested) => flatten(&full_key, nested, out),
            _ => {}
        }
    }
}
