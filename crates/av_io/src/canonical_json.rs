//! Canonical JSON utilities (av_io)
//! - Objects: keys in **insertion order** (the order the producer wrote them)
//! - Arrays: order preserved (caller is responsible for stable ordering)
//! - Numbers: integers verbatim; floats in ECMAScript `Number#toString` form
//!   (`50`, not `50.0`; `1e+21`; `1e-7`), non-finite as `null`
//! - Strings: escaped exactly as `JSON.stringify` does
//! - Output: compact (no extra spaces, no trailing newline)
//! - Atomic write: temp file in same dir + fsync(temp) + rename; fsync(dir) on Unix
//!
//! The bytes produced here are what the seal hashes, and the seal is checked by
//! verifiers written in other languages. They must match `JSON.stringify`
//! byte for byte.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::{Number, Value};

use crate::{IoError, IoResult};

/// Convert a serde_json `Value` to canonical JSON bytes (compact, no trailing newline).
pub fn to_canonical_json_bytes(v: &Value) -> Vec<u8> {
    let mut out = Vec::with_capacity(256);
    write_canonical_value(v, &mut out);
    out
}

/// Serialize any value through `serde_json::Value` into canonical bytes.
/// Struct fields keep declaration order.
pub fn to_canonical_bytes<T: Serialize>(value: &T) -> Result<Vec<u8>, serde_json::Error> {
    let v = serde_json::to_value(value)?;
    Ok(to_canonical_json_bytes(&v))
}

fn write_canonical_value(v: &Value, out: &mut Vec<u8>) {
    match v {
        Value::Null => out.extend_from_slice(b"null"),
        Value::Bool(b) => {
            if *b {
                out.extend_from_slice(b"true");
            } else {
                out.extend_from_slice(b"false");
            }
        }
        Value::Number(n) => out.extend_from_slice(number_text(n).as_bytes()),
        Value::String(s) => write_string(s, out),
        Value::Array(arr) => {
            out.push(b'[');
            let mut first = true;
            for elem in arr {
                if !first {
                    out.push(b',');
                }
                first = false;
                write_canonical_value(elem, out);
            }
            out.push(b']');
        }
        Value::Object(map) => {
            out.push(b'{');
            let mut first = true;
            for (k, val) in map {
                if !first {
                    out.push(b',');
                }
                first = false;
                write_string(k, out);
                out.push(b':');
                write_canonical_value(val, out);
            }
            out.push(b'}');
        }
    }
}

/// JSON string literal. serde_json's escaping (`\"`, `\\`, `\b\f\n\r\t`,
/// `\u00XX` lowercase for other controls, everything else raw UTF-8) is the
/// same set `JSON.stringify` uses for well-formed strings.
fn write_string(s: &str, out: &mut Vec<u8>) {
    // Serializing a &str into a Vec<u8> has no failure mode.
    if serde_json::to_writer(&mut *out, s).is_err() {
        out.extend_from_slice(b"null");
    }
}

fn number_text(n: &Number) -> String {
    if let Some(u) = n.as_u64() {
        u.to_string()
    } else if let Some(i) = n.as_i64() {
        i.to_string()
    } else {
        n.as_f64().map_or_else(|| "null".to_string(), js_number_text)
    }
}

/// Render an `f64` the way ECMAScript `Number.prototype.toString()` does.
///
/// Digits come from serde_json's float writer (Ryu): the shortest string that
/// round-trips, and on a tie between two such strings the closer one, then the
/// even one. Only the layout differs from `Number#toString` and is rebuilt here.
pub fn js_number_text(x: f64) -> String {
    if !x.is_finite() {
        return "null".to_string();
    }
    if x == 0.0 {
        return "0".to_string();
    }
    if x < 0.0 {
        return format!("-{}", js_number_text(-x));
    }

    let shortest = serde_json::to_string(&x).unwrap_or_else(|_| format!("{x:e}"));
    let (digits, n) = decimal_digits(&shortest);
    let k = digits.len() as i32;

    // value = 0.d1d2...dk × 10^n
    if k <= n && n <= 21 {
        let mut s = digits;
        s.extend(std::iter::repeat('0').take((n - k) as usize));
        s
    } else if 0 < n && n <= 21 {
        let (int, frac) = digits.split_at(n as usize);
        format!("{int}.{frac}")
    } else if -6 < n && n <= 0 {
        format!("0.{}{digits}", "0".repeat((-n) as usize))
    } else {
        let e = n - 1;
        let sign = if e >= 0 { '+' } else { '-' };
        let (lead, rest) = digits.split_at(1);
        if rest.is_empty() {
            format!("{lead}e{sign}{}", e.abs())
        } else {
            format!("{lead}.{rest}e{sign}{}", e.abs())
        }
    }
}

/// Split a positive decimal literal (`123.45`, `1.5e-7`, `1e21`) into its
/// significant digits and the exponent `n` of `0.digits × 10^n`.
fn decimal_digits(lit: &str) -> (String, i32) {
    let (mantissa, exp) = match lit.split_once(|c| c == 'e' || c == 'E') {
        Some((m, e)) => (m, e.trim_start_matches('+').parse::<i32>().unwrap_or(0)),
        None => (lit, 0),
    };
    let (int, frac) = mantissa.split_once('.').unwrap_or((mantissa, ""));

    let mut point = int.len() as i32 + exp;
    let all: String = int.chars().chain(frac.chars()).collect();
    let lead = all.len() - all.trim_start_matches('0').len();
    point -= lead as i32;
    let digits = all[lead..].trim_end_matches('0').to_string();
    (digits, point)
}

/// Write canonical JSON to `path` atomically (with safe cross-device fallback).
pub fn write_canonical_file(path: &Path, v: &Value) -> IoResult<()> {
    write_atomic(path, &to_canonical_json_bytes(v))
        .map_err(|e| IoError::Write(format!("{}: {e}", path.display())))
}

fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        Some(_) => PathBuf::from("."),
        None => return Err(io::Error::new(io::ErrorKind::InvalidInput, "path has no parent")),
    };
    fs::create_dir_all(&parent)?;

    // Unique temp next to the destination (same directory).
    let tmp = make_unique_tmp_path(path);
    let mut tf = OpenOptions::new().write(true).create_new(true).open(&tmp)?;
    tf.write_all(bytes)?;
    tf.sync_all()?;
    drop(tf);

    match fs::rename(&tmp, path) {
        Ok(()) => {
            let _ = fsync_dir(&parent);
            Ok(())
        }
        Err(_) => {
            // Fallback: write directly to the target (cross-device rename).
            let res: io::Result<()> = (|| {
                let mut f = OpenOptions::new().write(true).create(true).truncate(true).open(path)?;
                f.write_all(bytes)?;
                f.sync_all()
            })();
            let _ = fs::remove_file(&tmp);
            res?;
            let _ = fsync_dir(&parent);
            Ok(())
        }
    }
}

/// Create a unique temp path next to `target`: "<filename>.<pid>.<counter>.tmp"
fn make_unique_tmp_path(target: &Path) -> PathBuf {
    use std::sync::atomic::{AtomicU64, Ordering};

    static COUNTER: AtomicU64 = AtomicU64::new(0);

    let pid = std::process::id();
    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    let fname = target.file_name().and_then(|s| s.to_str()).unwrap_or("file");
    let tmp_name = format!("{fname}.{pid}.{n}.tmp");

    match target.parent() {
        Some(dir) => dir.join(tmp_name),
        None => PathBuf::from(tmp_name),
    }
}

#[cfg(unix)]
fn fsync_dir(dir: &Path) -> io::Result<()> {
    let df = OpenOptions::new().read(true).open(dir)?;
    df.sync_all()
}

#[cfg(not(unix))]
#[inline]
fn fsync_dir(_dir: &Path) -> io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn canon(v: &Value) -> String {
        String::from_utf8(to_canonical_json_bytes(v)).unwrap()
    }

    #[test]
    fn objects_keep_insertion_order_arrays_preserved() {
        let v = json!({
            "v": 1,
            "b": { "y": 1, "x": 2 },
            "arr": [ {"k": 2, "j": 1}, 3, "z" ]
        });
        assert_eq!(canon(&v), r#"{"v":1,"b":{"y":1,"x":2},"arr":[{"k":2,"j":1},3,"z"]}"#);
    }

    #[test]
    fn no_trailing_newline() {
        let bytes = to_canonical_json_bytes(&json!({"a": 1}));
        assert!(!bytes.ends_with(b"\n"), "must not end with newline");
    }

    #[test]
    fn floats_render_like_ecmascript() {
        let cases: &[(f64, &str)] = &[
            (50.0, "50"),
            (87.5, "87.5"),
            (66.7, "66.7"),
            (0.1, "0.1"),
            (100.0, "100"),
            (-0.0, "0"),
            (-12.25, "-12.25"),
            (0.000001, "0.000001"),
            (1e-7, "1e-7"),
            (1.5e-7, "1.5e-7"),
            (1e21, "1e+21"),
            (1.2345e22, "1.2345e+22"),
            (123456789012345680000.0, "123456789012345680000"),
            (2.0f64.powi(53), "9007199254740992"),
            (1.0 / 3.0, "0.3333333333333333"),
        ];
        for (x, want) in cases {
            assert_eq!(js_number_text(*x), *want, "formatting {x:?}");
        }
        assert_eq!(js_number_text(f64::NAN), "null");
        assert_eq!(js_number_text(f64::INFINITY), "null");
    }

    #[test]
    fn float_values_inside_documents() {
        assert_eq!(canon(&json!({"p": 50.0, "q": 3, "r": -4})), r#"{"p":50,"q":3,"r":-4}"#);
    }

    #[test]
    fn strings_escape_like_json_stringify() {
        let v = json!(["quote\" back\\ nl\n tab\t", "\u{0001}", "é ✓ \u{2028}"]);
        assert_eq!(canon(&v), "[\"quote\\\" back\\\\ nl\\n tab\\t\",\"\\u0001\",\"é ✓ \u{2028}\"]");
    }

    #[test]
    fn struct_fields_keep_declaration_order() {
        #[derive(Serialize)]
        struct T {
            zeta: u32,
            alpha: Option<u32>,
        }
        let bytes = to_canonical_bytes(&T { zeta: 1, alpha: None }).unwrap();
        assert_eq!(bytes, br#"{"zeta":1,"alpha":null}"#);
    }

    #[test]
    fn atomic_write_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("result.json");
        write_canonical_file(&path, &json!({"b": 2, "a": 1})).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), r#"{"b":2,"a":1}"#);

        // Overwrite in place, no temp files left behind.
        write_canonical_file(&path, &json!({"c": 3})).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), r#"{"c":3}"#);
        let leftovers = fs::read_dir(path.parent().unwrap()).unwrap().count();
        assert_eq!(leftovers, 1);
    }
}

#[cfg(test)]
mod number_tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numbers_use_ecmascript_text() {
        let cases: [(f64, &str); 12] = [
            (50.0, "50"),
            (66.7, "66.7"),
            (0.1, "0.1"),
            (-2.5, "-2.5"),
            (1e21, "1e+21"),
            (123456789012345680000.0, "123456789012345680000"),
            (1e-7, "1e-7"),
            (0.000001, "0.000001"),
            (1.5e-10, "1.5e-10"),
            (5e-324, "5e-324"),
            (f64::MAX, "1.7976931348623157e+308"),
            (-0.0, "0"),
        ];
        for (x, want) in cases {
            assert_eq!(js_number_text(x), want, "{x:e}");
        }
    }

    #[test]
    fn equidistant_shortest_digits_pick_the_even_one() {
        // Exactly 1658206780088562.25: `.2` and `.3` both round-trip.
        assert_eq!(js_number_text(1658206780088562.25), "1658206780088562.2");
    }

    #[test]
    fn compact_output_keeps_insertion_order() {
        let v = json!({"z": 1, "a": [true, null, 75.0], "s": "q\"\u{1}"});
        assert_eq!(
            String::from_utf8(to_canonical_json_bytes(&v)).unwrap(),
            r#"{"z":1,"a":[true,null,75],"s":"q\"\u0001"}"#
        );
    }
}
